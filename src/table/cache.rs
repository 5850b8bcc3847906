//! Table cache: a [`TableAccess`] that shares open tables between readers.

use std::sync::atomic::{AtomicU64, Ordering};

use super::{HandleCache, Table, TableAccess, TableIterator, TableLoader};
use crate::error::Result;
use crate::version::FileMetaData;

/// Counters for table cache activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCacheStats {
    /// Number of tables opened through the loader
    pub loads: u64,
    /// Number of iterators served from an already open table
    pub hits: u64,
}

impl TableCacheStats {
    /// Total iterators opened.
    pub fn iterators(&self) -> u64 {
        self.loads + self.hits
    }
}

/// Opens tables through a [`TableLoader`] and shares each open table among
/// all iterators over it.
///
/// A table stays open while any iterator (or other holder) references it.
pub struct TableCache<L: TableLoader> {
    loader: L,
    handles: HandleCache<L::Table>,
    loads: AtomicU64,
    hits: AtomicU64,
}

impl<L: TableLoader> TableCache<L> {
    /// Creates a table cache over `loader`.
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            handles: HandleCache::new(),
            loads: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    /// Returns the underlying loader.
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Drops entries for tables nobody holds anymore.
    pub fn purge(&self) -> usize {
        self.handles.purge()
    }

    /// Number of tables currently open.
    pub fn open_tables(&self) -> usize {
        self.handles.live_count()
    }

    /// Returns a snapshot of the cache counters.
    pub fn stats(&self) -> TableCacheStats {
        TableCacheStats {
            loads: self.loads.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
        }
    }
}

impl<L: TableLoader> TableAccess for TableCache<L> {
    fn new_iterator(&self, file: &FileMetaData) -> Result<Box<dyn TableIterator>> {
        let (table, hit) = self.handles.get_or_try_insert_with(file.number(), || {
            log::debug!("Opening table {:06}", file.number());
            self.loader.load(file)
        })?;

        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.loads.fetch_add(1, Ordering::Relaxed);
        }
        Ok(table.iter())
    }

    fn evict(&self, file_number: u64) {
        if self.handles.remove(file_number) {
            log::debug!("Evicted table {:06}", file_number);
        }
    }
}
