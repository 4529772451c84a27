//! File-backed persistent second tier.
//!
//! Spilled page containers land in one partition per `(revision,
//! log_type)` pair, as an append-only framed file with an in-memory offset
//! index:
//!
//! ```text
//! <base>/<log_type>_r<revision>/data.log
//!
//! +--------+------+----------+------+----------+
//! | Magic  | Kind | PageKey  | Len  | Payload  |
//! | (4)    | (1)  | (8)      | (4)  | (Len)    |
//! +--------+------+----------+------+----------+
//! ```
//!
//! The payload is the bincode encoding of the stored value; a tombstone
//! frame (`Len == 0`) marks a removal. The last frame for a key wins, so
//! reopening a partition replays the file front to back to rebuild the
//! index.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use bytes::{Buf, BufMut, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use verso_common::error::{VersoError, VersoResult};
use verso_common::types::{PageKey, Revision};

use crate::Cache;

/// Magic number prefixing every frame.
const FRAME_MAGIC: u32 = 0x5653_4C47; // "VSLG"

/// Size of a frame header (magic + kind + page key + payload length).
const FRAME_HEADER_SIZE: usize = 4 + 1 + 8 + 4;

/// Frame kind: the payload replaces the value stored under the key.
const KIND_PUT: u8 = 1;

/// Frame kind: the value stored under the key is removed.
const KIND_TOMBSTONE: u8 = 2;

/// A persistent `PageKey → V` store, used as the spill target of the
/// transaction log's RAM tier.
pub struct PersistentCache<V> {
    /// Partition directory.
    dir: PathBuf,
    /// Open data file; `None` once closed.
    file: Option<File>,
    /// Byte offset and payload length of the live frame per key.
    index: HashMap<PageKey, (u64, u32)>,
    /// Offset the next frame is appended at.
    write_offset: u64,
    /// Whether every write is synced to disk immediately.
    sync_writes: bool,
    _value: PhantomData<fn() -> V>,
}

impl<V> PersistentCache<V>
where
    V: Serialize + DeserializeOwned,
{
    /// Opens (or creates) the partition for `(revision, log_type)` under
    /// `base`, replaying any existing data file.
    pub fn open(
        base: impl AsRef<Path>,
        revision: Revision,
        log_type: &str,
        sync_writes: bool,
    ) -> VersoResult<Self> {
        let dir = base
            .as_ref()
            .join(format!("{}_r{}", log_type, revision.as_u32()));
        fs::create_dir_all(&dir)?;

        let path = dir.join("data.log");
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        let (index, write_offset) = Self::replay(&mut file)?;
        debug!(
            partition = %dir.display(),
            entries = index.len(),
            "opened transaction-log partition"
        );

        Ok(Self {
            dir,
            file: Some(file),
            index,
            write_offset,
            sync_writes,
            _value: PhantomData,
        })
    }

    /// Returns the partition directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if no live entries exist.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Checks whether a live entry exists for `key`, without I/O.
    pub fn contains(&self, key: &PageKey) -> bool {
        self.index.contains_key(key)
    }

    /// Rebuilds the offset index from the data file. A torn frame at the
    /// tail is discarded.
    fn replay(file: &mut File) -> VersoResult<(HashMap<PageKey, (u64, u32)>, u64)> {
        let mut data = Vec::new();
        file.seek(SeekFrom::Start(0))?;
        file.read_to_end(&mut data)?;

        let mut index = HashMap::new();
        let mut pos = 0usize;
        while data.len() - pos >= FRAME_HEADER_SIZE {
            let mut header = &data[pos..pos + FRAME_HEADER_SIZE];
            let magic = header.get_u32_le();
            if magic != FRAME_MAGIC {
                return Err(VersoError::deserialization(format!(
                    "bad frame magic {magic:#010x} at offset {pos}"
                )));
            }
            let kind = header.get_u8();
            let key = PageKey::new(header.get_u64_le());
            let len = header.get_u32_le() as usize;

            if data.len() - pos - FRAME_HEADER_SIZE < len {
                // Torn tail from an interrupted append.
                warn!(offset = pos, "discarding torn frame at end of data file");
                break;
            }

            match kind {
                KIND_PUT => {
                    let payload_offset = (pos + FRAME_HEADER_SIZE) as u64;
                    index.insert(key, (payload_offset, len as u32));
                }
                KIND_TOMBSTONE => {
                    index.remove(&key);
                }
                other => {
                    return Err(VersoError::deserialization(format!(
                        "unknown frame kind {other} at offset {pos}"
                    )));
                }
            }
            pos += FRAME_HEADER_SIZE + len;
        }

        file.set_len(pos as u64)?;
        Ok((index, pos as u64))
    }

    fn file_mut(&mut self) -> VersoResult<&mut File> {
        self.file.as_mut().ok_or(VersoError::Closed)
    }

    /// Appends one frame at the write offset.
    fn append(&mut self, kind: u8, key: PageKey, payload: &[u8]) -> VersoResult<u64> {
        let mut frame = BytesMut::with_capacity(FRAME_HEADER_SIZE + payload.len());
        frame.put_u32_le(FRAME_MAGIC);
        frame.put_u8(kind);
        frame.put_u64_le(key.as_u64());
        frame.put_u32_le(payload.len() as u32);
        frame.put_slice(payload);

        let offset = self.write_offset;
        let sync_writes = self.sync_writes;
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&frame)?;
        if sync_writes {
            file.sync_data()?;
        }
        self.write_offset = offset + frame.len() as u64;
        Ok(offset + FRAME_HEADER_SIZE as u64)
    }
}

impl<V> Cache<PageKey, V> for PersistentCache<V>
where
    V: Serialize + DeserializeOwned,
{
    fn get(&mut self, key: &PageKey) -> VersoResult<Option<V>> {
        let Some(&(offset, len)) = self.index.get(key) else {
            return Ok(None);
        };
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(offset))?;
        let mut payload = vec![0u8; len as usize];
        file.read_exact(&mut payload)?;
        let value = bincode::deserialize(&payload)
            .map_err(|e| VersoError::deserialization(e.to_string()))?;
        Ok(Some(value))
    }

    fn put(&mut self, key: PageKey, value: V) -> VersoResult<()> {
        let payload =
            bincode::serialize(&value).map_err(|e| VersoError::serialization(e.to_string()))?;
        let payload_offset = self.append(KIND_PUT, key, &payload)?;
        self.index.insert(key, (payload_offset, payload.len() as u32));
        Ok(())
    }

    fn remove(&mut self, key: &PageKey) -> VersoResult<()> {
        if self.index.remove(key).is_some() {
            self.append(KIND_TOMBSTONE, *key, &[])?;
        }
        Ok(())
    }

    fn clear(&mut self) -> VersoResult<()> {
        let file = self.file_mut()?;
        file.set_len(0)?;
        self.write_offset = 0;
        self.index.clear();
        Ok(())
    }

    fn close(&mut self) -> VersoResult<()> {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }
        Ok(())
    }
}
