//! # Strata - Level Index and Point Lookups for an LSM-Tree
//!
//! Strata holds the per-level file index of a Log-Structured Merge-Tree and
//! answers point lookups against it. It decides which table files may hold a
//! key, searches them in the right order, and reports read costs that drive
//! seek-triggered compaction.
//!
//! ## Architecture
//!
//! - **Keys**: [`InternalKey`] orders versions of a user key newest first;
//!   [`LookupKey`] is a read at a snapshot
//! - **Levels**: [`Level`] indexes the files of one level and looks keys up
//!   in them
//! - **Versions**: [`Version`] stacks the levels, applies [`VersionEdit`]s and
//!   tracks compaction pressure
//! - **Tables**: [`table::TableAccess`] is how files are read; a
//!   [`table::TableCache`] shares open tables between readers
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use strata::table::{MemoryStore, MemoryTable, TableCache};
//! use strata::{LookupKey, Options, ReadStats, Version, VersionEdit};
//!
//! # fn main() -> Result<(), strata::Error> {
//! let store = Arc::new(MemoryStore::new());
//! let mut table = MemoryTable::new();
//! table.put(b"key1", 1, b"value1");
//! table.delete(b"key2", 2);
//! let meta = store.insert(1, table).unwrap();
//!
//! let version = Version::new(Options::default(), Arc::new(TableCache::new(Arc::clone(&store))))?;
//! let version = version.apply(&[VersionEdit::add(1, &meta)])?;
//!
//! let mut stats = ReadStats::new();
//! let found = version.get(&LookupKey::new(b"key1".to_vec(), 10), &mut stats)?;
//! assert_eq!(found.and_then(|r| r.into_value()).as_deref(), Some(&b"value1"[..]));
//!
//! let deleted = version.get(&LookupKey::new(b"key2".to_vec(), 10), &mut stats)?;
//! assert!(deleted.unwrap().is_deleted());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Module declarations
pub mod config;
pub mod error;
pub mod key;
pub mod table;
pub mod version;

// Re-exports
pub use config::Options;
pub use error::{Error, Result};
pub use key::{InternalKey, LookupKey, LookupResult, ValueType, MAX_SEQUENCE_NUMBER};
pub use version::{
    FileMetaData, Level, LevelIterator, NewFile, ReadStats, SeekCompaction, Version, VersionEdit,
};
