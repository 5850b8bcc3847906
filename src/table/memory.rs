//! In-memory sorted tables.
//!
//! A [`MemoryTable`] holds the same `(InternalKey, payload)` entries a table
//! file would, sorted by internal key, without any on-disk format.
//! A [`MemoryStore`] registers tables by file number and serves them to a
//! [`TableCache`](super::TableCache).

use std::collections::HashMap;
use std::ops::Bound;
use std::sync::Arc;

use bytes::Bytes;
use crossbeam_skiplist::SkipMap;
use parking_lot::RwLock;

use super::{Table, TableIterator, TableLoader};
use crate::error::{Error, Result};
use crate::key::{InternalKey, ValueType};
use crate::version::FileMetaData;

/// Per-entry bookkeeping overhead counted by [`MemoryTable::approximate_size`].
const ENTRY_OVERHEAD: usize = 16;

/// An immutable-once-shared sorted table held in memory.
///
/// # Example
///
/// ```rust
/// use strata::table::MemoryTable;
///
/// let mut table = MemoryTable::new();
/// table.put(b"apple", 3, b"red");
/// table.delete(b"apple", 5);
///
/// let meta = table.file_meta(1).unwrap();
/// assert_eq!(meta.smallest().sequence(), 5);
/// ```
#[derive(Debug, Default)]
pub struct MemoryTable {
    data: SkipMap<InternalKey, Bytes>,
    size: usize,
}

impl MemoryTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry under an explicit internal key.
    pub fn insert(&mut self, key: InternalKey, value: impl Into<Bytes>) {
        let value = value.into();
        self.size += key.encoded_size() + value.len() + ENTRY_OVERHEAD;
        self.data.insert(key, value);
    }

    /// Inserts a value for `user_key` written at `sequence`.
    pub fn put(&mut self, user_key: &[u8], sequence: u64, value: &[u8]) {
        self.insert(
            InternalKey::new(user_key.to_vec(), sequence, ValueType::Value),
            Bytes::copy_from_slice(value),
        );
    }

    /// Inserts a tombstone for `user_key` written at `sequence`.
    pub fn delete(&mut self, user_key: &[u8], sequence: u64) {
        self.insert(
            InternalKey::new(user_key.to_vec(), sequence, ValueType::Deletion),
            Bytes::new(),
        );
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the approximate size of the table in bytes.
    pub fn approximate_size(&self) -> usize {
        self.size
    }

    /// Returns the smallest internal key.
    pub fn smallest(&self) -> Option<InternalKey> {
        self.data.front().map(|entry| entry.key().clone())
    }

    /// Returns the largest internal key.
    pub fn largest(&self) -> Option<InternalKey> {
        self.data.back().map(|entry| entry.key().clone())
    }

    /// Describes this table as file `number`. Returns None for an empty table.
    pub fn file_meta(&self, number: u64) -> Option<FileMetaData> {
        Some(FileMetaData::new(
            number,
            self.size as u64,
            self.smallest()?,
            self.largest()?,
        ))
    }
}

impl Table for MemoryTable {
    fn iter(self: Arc<Self>) -> Box<dyn TableIterator> {
        Box::new(MemoryTableIterator::new(self))
    }
}

/// Cursor over a [`MemoryTable`]. Unpositioned until the first seek.
#[derive(Debug)]
pub struct MemoryTableIterator {
    table: Arc<MemoryTable>,
    cursor: Option<InternalKey>,
}

impl MemoryTableIterator {
    /// Creates an unpositioned iterator over `table`.
    pub fn new(table: Arc<MemoryTable>) -> Self {
        Self {
            table,
            cursor: None,
        }
    }
}

impl TableIterator for MemoryTableIterator {
    fn seek_to_first(&mut self) -> Result<()> {
        self.cursor = self.table.data.front().map(|entry| entry.key().clone());
        Ok(())
    }

    fn seek(&mut self, target: &InternalKey) -> Result<()> {
        self.cursor = self
            .table
            .data
            .lower_bound(Bound::Included(target))
            .map(|entry| entry.key().clone());
        Ok(())
    }

    fn has_next(&self) -> bool {
        self.cursor.is_some()
    }

    fn next_entry(&mut self) -> Result<Option<(Bytes, Bytes)>> {
        let Some(key) = self.cursor.take() else {
            return Ok(None);
        };

        let value = self
            .table
            .data
            .get(&key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                Error::internal(format!("entry {:?} vanished from memory table", key))
            })?;
        self.cursor = self
            .table
            .data
            .lower_bound(Bound::Excluded(&key))
            .map(|entry| entry.key().clone());

        Ok(Some((Bytes::from(key.encode()), value)))
    }
}

/// Registry of in-memory tables keyed by file number.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<u64, Arc<MemoryTable>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `table` as file `number` and returns its metadata.
    ///
    /// Returns None (and registers nothing) for an empty table.
    pub fn insert(&self, number: u64, table: MemoryTable) -> Option<FileMetaData> {
        let meta = table.file_meta(number)?;
        self.tables.write().insert(number, Arc::new(table));
        Some(meta)
    }

    /// Removes file `number`.
    pub fn remove(&self, number: u64) -> Option<Arc<MemoryTable>> {
        self.tables.write().remove(&number)
    }

    /// Returns the table registered as file `number`.
    pub fn get(&self, number: u64) -> Option<Arc<MemoryTable>> {
        self.tables.read().get(&number).cloned()
    }

    /// Returns the number of registered tables.
    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    /// Returns true if no tables are registered.
    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }
}

impl TableLoader for MemoryStore {
    type Table = MemoryTable;

    fn load(&self, file: &FileMetaData) -> Result<Arc<MemoryTable>> {
        self.get(file.number())
            .ok_or_else(|| Error::not_found(format!("table {:06}", file.number())))
    }
}
