//! Persistent key-value store (the "shelf") backing the inventory cache.
//!
//! One shelf file holds every cached inventory plus the global name index,
//! as opaque bincode values under string keys. The whole map is loaded at
//! open time; mutations stay in memory until the handle is released, at
//! which point a full snapshot is written to a temporary file, synced, and
//! renamed over the store path. There is no transaction log: a crash
//! mid-release leaves the previous snapshot intact.
//!
//! The shelf assumes a single-process, single-writer discipline. It does
//! no file locking; callers wanting concurrency must serialize all writers
//! through one owner of the handle.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{DocdexError, Result};

const SHELF_MAGIC: &[u8; 4] = b"DXSH";
const SHELF_FORMAT_VERSION: u32 = 1;

/// An on-disk associative store mapping string keys to opaque byte values.
#[derive(Debug)]
pub struct Shelf {
    path: PathBuf,
    entries: BTreeMap<String, Vec<u8>>,
    dirty: bool,
}

impl Shelf {
    /// Open the shelf at `path`, loading all entries. A missing file is an
    /// empty shelf; a present but unreadable file is an error.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            read_snapshot(&path)?
        } else {
            BTreeMap::new()
        };
        debug!("opened shelf {} ({} entries)", path.display(), entries.len());

        Ok(Shelf {
            path,
            entries,
            dirty: false,
        })
    }

    /// Raw bytes stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Store raw bytes under `key`, replacing any previous value.
    pub fn set(&mut self, key: &str, value: Vec<u8>) {
        self.entries.insert(key.to_string(), value);
        self.dirty = true;
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterate over all entries in key order. The sequence is finite and
    /// tied to this handle; a fresh handle yields a fresh sequence.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Iterate over all keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the shelf holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode the value under `key` with bincode. Absent keys are `None`;
    /// undecodable values are a serialization error.
    pub fn get_value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(bytes) => bincode::deserialize(bytes)
                .map(Some)
                .map_err(|e| DocdexError::serialization(format!("decode of {key:?} failed: {e}"))),
        }
    }

    /// Encode `value` with bincode and store it under `key`.
    pub fn set_value<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let bytes = bincode::serialize(value)
            .map_err(|e| DocdexError::serialization(format!("encode of {key:?} failed: {e}")))?;
        self.set(key, bytes);
        Ok(())
    }

    /// Release the handle, durably flushing pending writes. A handle with
    /// no pending writes leaves the on-disk snapshot untouched.
    pub fn close(mut self) -> Result<()> {
        if self.dirty {
            write_snapshot(&self.path, &self.entries)?;
            self.dirty = false;
        }
        Ok(())
    }
}

impl Drop for Shelf {
    fn drop(&mut self) {
        // Best effort for handles dropped without close(); errors here
        // have nowhere to propagate.
        if self.dirty {
            if let Err(e) = write_snapshot(&self.path, &self.entries) {
                warn!("shelf flush on drop failed for {}: {e}", self.path.display());
            }
            self.dirty = false;
        }
    }
}

/// A scoped shelf handle: either freshly opened and released at scope
/// exit, or borrowed from a caller who retains ownership of release.
/// This is the unit-of-work boundary for composing several store
/// operations into one open; it is not a transaction.
#[derive(Debug)]
pub enum ShelfScope<'a> {
    /// Handle opened for this scope; `release` closes it.
    Owned(Shelf),
    /// Handle borrowed from an enclosing scope; `release` is a no-op.
    Borrowed(&'a mut Shelf),
}

impl ShelfScope<'_> {
    /// Open a new owned scope over the shelf at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<ShelfScope<'static>> {
        Ok(ShelfScope::Owned(Shelf::open(path)?))
    }

    /// Release the scope. An owned handle is closed and flushed; a
    /// borrowed handle is left to its owner.
    pub fn release(self) -> Result<()> {
        match self {
            ShelfScope::Owned(shelf) => shelf.close(),
            ShelfScope::Borrowed(_) => Ok(()),
        }
    }
}

impl<'a> From<&'a mut Shelf> for ShelfScope<'a> {
    fn from(shelf: &'a mut Shelf) -> Self {
        ShelfScope::Borrowed(shelf)
    }
}

impl Deref for ShelfScope<'_> {
    type Target = Shelf;

    fn deref(&self) -> &Shelf {
        match self {
            ShelfScope::Owned(shelf) => shelf,
            ShelfScope::Borrowed(shelf) => shelf,
        }
    }
}

impl DerefMut for ShelfScope<'_> {
    fn deref_mut(&mut self) -> &mut Shelf {
        match self {
            ShelfScope::Owned(shelf) => shelf,
            ShelfScope::Borrowed(shelf) => shelf,
        }
    }
}

fn read_snapshot(path: &Path) -> Result<BTreeMap<String, Vec<u8>>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != SHELF_MAGIC {
        return Err(DocdexError::storage(format!(
            "bad magic in {}",
            path.display()
        )));
    }

    let format_version = reader.read_u32::<LittleEndian>()?;
    if format_version != SHELF_FORMAT_VERSION {
        return Err(DocdexError::storage(format!(
            "unsupported shelf format version {format_version}"
        )));
    }

    let count = reader.read_u32::<LittleEndian>()?;
    let mut entries = BTreeMap::new();
    for _ in 0..count {
        let key_len = reader.read_u32::<LittleEndian>()? as usize;
        let mut key = vec![0u8; key_len];
        reader.read_exact(&mut key)?;
        let key = String::from_utf8(key)
            .map_err(|_| DocdexError::storage("non-UTF-8 key in shelf".to_string()))?;

        let value_len = reader.read_u32::<LittleEndian>()? as usize;
        let mut value = vec![0u8; value_len];
        reader.read_exact(&mut value)?;

        let expected = reader.read_u32::<LittleEndian>()?;
        let actual = crc32fast::hash(&value);
        if expected != actual {
            return Err(DocdexError::storage(format!(
                "checksum mismatch for key {key:?}"
            )));
        }

        entries.insert(key, value);
    }

    Ok(entries)
}

fn write_snapshot(path: &Path, entries: &BTreeMap<String, Vec<u8>>) -> Result<()> {
    let tmp_path = temp_path(path);
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(SHELF_MAGIC)?;
        writer.write_u32::<LittleEndian>(SHELF_FORMAT_VERSION)?;
        writer.write_u32::<LittleEndian>(entries.len() as u32)?;
        for (key, value) in entries {
            writer.write_u32::<LittleEndian>(key.len() as u32)?;
            writer.write_all(key.as_bytes())?;
            writer.write_u32::<LittleEndian>(value.len() as u32)?;
            writer.write_all(value)?;
            writer.write_u32::<LittleEndian>(crc32fast::hash(value))?;
        }

        writer.flush()?;
        writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
    }

    std::fs::rename(&tmp_path, path)?;
    debug!("flushed shelf snapshot to {}", path.display());
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "shelf".to_string());
    name.push_str(".tmp");
    path.with_file_name(name)
}
