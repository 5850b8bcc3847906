//! Version edits: file additions and deletions between versions.

use serde::{Deserialize, Serialize};

use super::FileMetaData;
use crate::error::Result;
use crate::key::InternalKey;

/// A file added by an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFile {
    /// File number identifier
    pub number: u64,
    /// Size of the file in bytes
    pub file_size: u64,
    /// Smallest internal key in the file
    pub smallest: InternalKey,
    /// Largest internal key in the file
    pub largest: InternalKey,
}

impl NewFile {
    /// Describes an existing file.
    pub fn from_meta(meta: &FileMetaData) -> Self {
        Self {
            number: meta.number(),
            file_size: meta.file_size(),
            smallest: meta.smallest().clone(),
            largest: meta.largest().clone(),
        }
    }

    pub(crate) fn to_meta(&self, allowed_seeks: u64) -> FileMetaData {
        let meta = FileMetaData::new(
            self.number,
            self.file_size,
            self.smallest.clone(),
            self.largest.clone(),
        );
        meta.set_allowed_seeks(allowed_seeks);
        meta
    }
}

/// A single change to the set of live files.
///
/// A batch of edits is applied atomically by
/// [`Version::apply`](crate::Version::apply).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionEdit {
    /// Add a new table file
    AddFile {
        /// Level where the file is added
        level: u32,
        /// The file
        file: NewFile,
    },
    /// Delete a table file
    DeleteFile {
        /// Level where the file is located
        level: u32,
        /// File number to delete
        file_number: u64,
    },
}

impl VersionEdit {
    /// Creates an edit adding `meta` to `level`.
    pub fn add(level: u32, meta: &FileMetaData) -> Self {
        VersionEdit::AddFile {
            level,
            file: NewFile::from_meta(meta),
        }
    }

    /// Creates an edit deleting `file_number` from `level`.
    pub fn delete(level: u32, file_number: u64) -> Self {
        VersionEdit::DeleteFile { level, file_number }
    }

    /// Returns the level this edit touches.
    pub fn level(&self) -> u32 {
        match self {
            VersionEdit::AddFile { level, .. } | VersionEdit::DeleteFile { level, .. } => *level,
        }
    }

    /// Encodes a batch of edits for the manifest.
    pub fn encode_batch(edits: &[VersionEdit]) -> Result<Vec<u8>> {
        Ok(bincode::serialize(edits)?)
    }

    /// Decodes a batch produced by [`encode_batch`](Self::encode_batch).
    pub fn decode_batch(data: &[u8]) -> Result<Vec<VersionEdit>> {
        Ok(bincode::deserialize(data)?)
    }
}
