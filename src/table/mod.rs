//! Table access: how the level index reads sorted table files.
//!
//! The level index never decodes table blocks itself. It asks a
//! [`TableAccess`] for an iterator over a file and seeks it. Keys come back
//! in their encoded form so that damaged entries surface as
//! [`Error::Corruption`](crate::Error::Corruption) at the point of use.
//!
//! - [`TableCache`]: a [`TableAccess`] that shares open tables through a
//!   [`HandleCache`]
//! - [`MemoryTable`] / [`MemoryStore`]: an in-memory table set, used where no
//!   on-disk format is wanted

mod cache;
mod handle_cache;
mod memory;

pub use cache::{TableCache, TableCacheStats};
pub use handle_cache::HandleCache;
pub use memory::{MemoryStore, MemoryTable, MemoryTableIterator};

use std::sync::Arc;

use bytes::Bytes;

use crate::error::Result;
use crate::key::InternalKey;
use crate::version::FileMetaData;

/// A forward cursor over `(encoded internal key, payload)` pairs in
/// ascending internal-key order.
pub trait TableIterator: Send {
    /// Positions at the first entry.
    fn seek_to_first(&mut self) -> Result<()>;

    /// Positions at the first entry whose key is `>= target`.
    fn seek(&mut self, target: &InternalKey) -> Result<()>;

    /// Returns true if [`next_entry`](Self::next_entry) will yield an entry.
    fn has_next(&self) -> bool;

    /// Returns the entry at the cursor and advances past it.
    fn next_entry(&mut self) -> Result<Option<(Bytes, Bytes)>>;
}

/// Opens iterators over table files.
///
/// Implementations must tolerate many short-lived iterators opened
/// concurrently over the same file.
pub trait TableAccess: Send + Sync {
    /// Opens an iterator over the entries of `file`.
    fn new_iterator(&self, file: &FileMetaData) -> Result<Box<dyn TableIterator>>;

    /// Forgets any open state kept for a file that left the live set.
    /// Iterators already handed out stay valid.
    fn evict(&self, _file_number: u64) {}
}

/// An open, immutable table.
pub trait Table: Send + Sync + 'static {
    /// Creates an iterator that keeps the table alive while it exists.
    fn iter(self: Arc<Self>) -> Box<dyn TableIterator>;
}

/// Opens tables for a [`TableCache`].
pub trait TableLoader: Send + Sync {
    /// The table type produced.
    type Table: Table;

    /// Opens the table backing `file`.
    fn load(&self, file: &FileMetaData) -> Result<Arc<Self::Table>>;
}

impl<L: TableLoader + ?Sized> TableLoader for Arc<L> {
    type Table = L::Table;

    fn load(&self, file: &FileMetaData) -> Result<Arc<Self::Table>> {
        (**self).load(file)
    }
}
