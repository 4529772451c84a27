//! Versioning strategies for record-page reconstruction.
//!
//! Every commit serializes only a *delta* of each touched page. A
//! [`Versioning`] strategy defines the other half of that bargain: which
//! prior fragments a reader fetches ([`Versioning::fetch_plan`]), how the
//! fragments fold back into one complete page
//! ([`Versioning::combine_for_read`]), and which entries the writer must
//! persist next so every revision inside the window stays reconstructible
//! ([`Versioning::combine_for_modify`]).
//!
//! All folds walk fragments newest-first with first-writer-wins semantics:
//! the first value installed under a key is kept, and a fold stops once
//! the output page reaches its entry capacity. Record entries and
//! page-reference entries form disjoint keyspaces and fold independently.
//!
//! The strategies trade read amplification against write amplification:
//!
//! | Strategy          | Fragments read    | Written per commit            |
//! |-------------------|-------------------|-------------------------------|
//! | `Full`            | 1                 | whole page                    |
//! | `Differential`    | ≤ 2               | all changes since full dump   |
//! | `Incremental`     | ≤ w               | changed keys (+ periodic dump)|
//! | `SlidingSnapshot` | ≤ w               | changed keys + rescued keys   |

use serde::{Deserialize, Serialize};

use verso_common::error::{VersoError, VersoResult};
use verso_common::types::Revision;

use crate::page::{
    EntryKind, KeyValuePage, PageContainer, PageReference, RecordEntries, ReferenceEntries,
};
use crate::trx::PageReadTrx;

/// The closed family of page-versioning strategies.
///
/// The selection is immutable per database: fragments written under one
/// strategy are only reconstructible under the same strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Versioning {
    /// Dump the complete page on every commit.
    ///
    /// Zero read amplification, maximal write amplification; a reader
    /// needs exactly one fragment.
    Full,
    /// Write all changes since the last full dump; every `w`-th revision
    /// writes a full dump.
    ///
    /// A reader needs at most two fragments: the latest delta and the
    /// last full dump.
    Differential,
    /// Write only the keys changed in each revision; every `w`-th commit
    /// writes a full redundant dump that bounds the reconstruction chain.
    Incremental,
    /// Write the keys changed in each revision plus the keys the sliding
    /// window is about to drop.
    ///
    /// No periodic full dump: each commit rescues exactly the entries
    /// whose only surviving copy sits in the fragment that ages out of
    /// the window at this commit.
    SlidingSnapshot,
}

impl Versioning {
    /// Returns the revision roots whose fragments must be loaded to
    /// reconstruct a page at `previous_revision`, ordered newest-first.
    ///
    /// `revs_to_restore` is the window `w` configured at database
    /// creation (`w >= 1`).
    pub fn fetch_plan(&self, previous_revision: Revision, revs_to_restore: u32) -> Vec<Revision> {
        debug_assert!(revs_to_restore >= 1);
        match self {
            Self::Full => vec![previous_revision],
            Self::Differential => {
                let last_full_dump = previous_revision.align_down(revs_to_restore);
                if last_full_dump == previous_revision {
                    vec![previous_revision]
                } else {
                    vec![previous_revision, last_full_dump]
                }
            }
            Self::Incremental | Self::SlidingSnapshot => {
                let newest = previous_revision.as_u32();
                let oldest = newest.saturating_sub(revs_to_restore - 1);
                (oldest..=newest).rev().map(Revision::new).collect()
            }
        }
    }

    /// Folds `fragments` (in [`Versioning::fetch_plan`] order) into a
    /// single page suitable for reading.
    ///
    /// The result is marked dirty iff more than one fragment contributed.
    /// `_trx` is the transaction context carried through to page
    /// factories; the fold itself never consults it.
    pub fn combine_for_read<K, V, T>(
        &self,
        fragments: Vec<KeyValuePage<K, V>>,
        revs_to_restore: u32,
        _trx: &T,
    ) -> VersoResult<KeyValuePage<K, V>>
    where
        K: Ord + Clone,
        V: Clone,
        T: PageReadTrx,
    {
        self.validate_fragments(&fragments, revs_to_restore)?;
        match self {
            Self::Full => {
                let mut fragments = fragments;
                fragments
                    .pop()
                    .ok_or_else(|| VersoError::invariant("full versioning expects one fragment"))
            }
            Self::Differential | Self::Incremental | Self::SlidingSnapshot => {
                let newest = &fragments[0];
                let mut page = newest.new_sibling(newest.previous_reference());
                if fragments.len() > 1 {
                    page.set_dirty(true);
                }
                for fragment in &fragments {
                    if page.is_full() {
                        break;
                    }
                    if !fold_missing::<K, V, RecordEntries>(&mut page, fragment) {
                        fold_missing::<K, V, ReferenceEntries>(&mut page, fragment);
                    }
                }
                Ok(page)
            }
        }
    }

    /// Folds `fragments` into a [`PageContainer`]: the complete page for
    /// reading and the page holding the entries that must be persisted as
    /// the next on-disk fragment.
    ///
    /// Both output pages carry `back_ref` as their previous reference.
    /// The owning write transaction applies its own changes to both pages
    /// afterwards; this fold only pre-seeds what the strategy requires for
    /// older revisions to stay reconstructible.
    pub fn combine_for_modify<K, V, T>(
        &self,
        fragments: &[KeyValuePage<K, V>],
        revs_to_restore: u32,
        trx: &T,
        back_ref: PageReference,
    ) -> VersoResult<PageContainer<K, V>>
    where
        K: Ord + Clone,
        V: Clone,
        T: PageReadTrx,
    {
        self.validate_fragments(fragments, revs_to_restore)?;
        let newest = &fragments[0];
        let mut complete = newest.new_sibling(Some(back_ref));
        let mut modified = newest.new_sibling(Some(back_ref));

        match self {
            Self::Full => {
                fold_missing::<K, V, RecordEntries>(&mut complete, newest);
                fold_missing::<K, V, ReferenceEntries>(&mut complete, newest);
                fold_missing::<K, V, RecordEntries>(&mut modified, newest);
                fold_missing::<K, V, ReferenceEntries>(&mut modified, newest);
            }
            Self::Differential => {
                let full_dump = fragments.get(1).unwrap_or(newest);
                let is_full_dump = trx.revision().is_multiple_of(revs_to_restore);

                // The latest delta holds everything changed since the last
                // full dump, so the next delta starts from it.
                fold_missing::<K, V, RecordEntries>(&mut complete, newest);
                fold_missing::<K, V, ReferenceEntries>(&mut complete, newest);
                fold_missing::<K, V, RecordEntries>(&mut modified, newest);
                fold_missing::<K, V, ReferenceEntries>(&mut modified, newest);

                if !complete.is_full()
                    && !differential_fill::<K, V, RecordEntries>(
                        &mut complete,
                        &mut modified,
                        full_dump,
                        is_full_dump,
                    )
                {
                    differential_fill::<K, V, ReferenceEntries>(
                        &mut complete,
                        &mut modified,
                        full_dump,
                        is_full_dump,
                    );
                }
            }
            Self::Incremental => {
                let is_full_dump = fragments.len() == revs_to_restore as usize;
                let mut filled = false;
                for fragment in fragments {
                    if filled {
                        break;
                    }
                    filled = incremental_fill::<K, V, RecordEntries>(
                        &mut complete,
                        &mut modified,
                        fragment,
                        is_full_dump,
                    );
                    if !filled {
                        filled = incremental_fill::<K, V, ReferenceEntries>(
                            &mut complete,
                            &mut modified,
                            fragment,
                            is_full_dump,
                        );
                    }
                }
            }
            Self::SlidingSnapshot => {
                // Tracks the page as reconstructed from every fragment that
                // stays inside the window after this commit.
                let mut reconstructed = newest.new_sibling(Some(back_ref));
                let count = fragments.len();
                let mut filled = false;
                for (index, fragment) in fragments.iter().enumerate() {
                    if filled {
                        break;
                    }
                    let evicting =
                        index == count - 1 && count == revs_to_restore as usize;
                    filled = sliding_fill::<K, V, RecordEntries>(
                        &mut complete,
                        &mut modified,
                        &mut reconstructed,
                        fragment,
                        evicting,
                    );
                    if !filled {
                        filled = sliding_fill::<K, V, ReferenceEntries>(
                            &mut complete,
                            &mut modified,
                            &mut reconstructed,
                            fragment,
                            evicting,
                        );
                    }
                }
            }
        }

        Ok(PageContainer::new(complete, modified))
    }

    /// Checks the fragment list against this strategy's preconditions.
    fn validate_fragments<K, V>(
        &self,
        fragments: &[KeyValuePage<K, V>],
        revs_to_restore: u32,
    ) -> VersoResult<()>
    where
        K: Ord + Clone,
        V: Clone,
    {
        let Some(first) = fragments.first() else {
            return Err(VersoError::invariant("fragment list must not be empty"));
        };
        let max = match self {
            Self::Full => 1,
            Self::Differential => 2,
            Self::Incremental | Self::SlidingSnapshot => revs_to_restore as usize,
        };
        if fragments.len() > max {
            return Err(VersoError::invariant(format!(
                "{:?} versioning accepts at most {} fragments, got {}",
                self,
                max,
                fragments.len()
            )));
        }
        let page_key = first.page_key();
        if fragments
            .iter()
            .any(|fragment| fragment.page_key() != page_key)
        {
            return Err(VersoError::invariant(format!(
                "all fragments must belong to page {}",
                page_key
            )));
        }
        Ok(())
    }
}

/// First-writer-wins fold of one keyspace of `fragment` into `out`,
/// bounded by the output capacity. Returns true once `out` is full.
fn fold_missing<K, V, E>(out: &mut KeyValuePage<K, V>, fragment: &KeyValuePage<K, V>) -> bool
where
    K: Ord + Clone,
    V: Clone,
    E: EntryKind<K, V>,
{
    for (key, value) in E::entries(fragment) {
        if out.is_full() {
            return true;
        }
        if !E::entries(out).contains_key(key) {
            E::entries_mut(out).insert(key.clone(), value.clone());
        }
    }
    out.is_full()
}

/// Differential modify fold: fill `complete` from the full dump, and fill
/// `modified` as well when this commit itself writes a full dump.
fn differential_fill<K, V, E>(
    complete: &mut KeyValuePage<K, V>,
    modified: &mut KeyValuePage<K, V>,
    full_dump: &KeyValuePage<K, V>,
    is_full_dump: bool,
) -> bool
where
    K: Ord + Clone,
    V: Clone,
    E: EntryKind<K, V>,
{
    for (key, value) in E::entries(full_dump) {
        if complete.is_full() {
            return true;
        }
        if !E::entries(complete).contains_key(key) {
            E::entries_mut(complete).insert(key.clone(), value.clone());
        }
        if is_full_dump && !E::entries(modified).contains_key(key) {
            E::entries_mut(modified).insert(key.clone(), value.clone());
        }
    }
    complete.is_full()
}

/// Incremental modify fold: install missing keys into `complete`, and
/// mirror them into `modified` when this commit writes the full dump.
fn incremental_fill<K, V, E>(
    complete: &mut KeyValuePage<K, V>,
    modified: &mut KeyValuePage<K, V>,
    fragment: &KeyValuePage<K, V>,
    is_full_dump: bool,
) -> bool
where
    K: Ord + Clone,
    V: Clone,
    E: EntryKind<K, V>,
{
    for (key, value) in E::entries(fragment) {
        if complete.is_full() {
            return true;
        }
        if !E::entries(complete).contains_key(key) {
            E::entries_mut(complete).insert(key.clone(), value.clone());
            if is_full_dump {
                E::entries_mut(modified).insert(key.clone(), value.clone());
            }
        }
    }
    complete.is_full()
}

/// Sliding-snapshot modify fold.
///
/// Fragments that stay inside the window fold into `reconstructed`; when
/// `evicting` (the fragment ages out of the window at this commit), every
/// key of the fragment not recoverable from `reconstructed` is rescued
/// into `modified`.
fn sliding_fill<K, V, E>(
    complete: &mut KeyValuePage<K, V>,
    modified: &mut KeyValuePage<K, V>,
    reconstructed: &mut KeyValuePage<K, V>,
    fragment: &KeyValuePage<K, V>,
    evicting: bool,
) -> bool
where
    K: Ord + Clone,
    V: Clone,
    E: EntryKind<K, V>,
{
    for (key, value) in E::entries(fragment) {
        if complete.is_full() {
            return true;
        }
        if !evicting && !E::entries(reconstructed).contains_key(key) {
            E::entries_mut(reconstructed).insert(key.clone(), value.clone());
        }
        if !E::entries(complete).contains_key(key) {
            E::entries_mut(complete).insert(key.clone(), value.clone());
        }
        if evicting && !E::entries(reconstructed).contains_key(key) {
            E::entries_mut(modified).insert(key.clone(), value.clone());
        }
    }
    complete.is_full()
}
