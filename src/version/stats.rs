//! Per-lookup read statistics.

use std::sync::Arc;

use super::FileMetaData;

/// Read-cost telemetry produced by a lookup.
///
/// `seek_file` names the file to charge when a lookup had to open more than
/// one file: it is always the *first* file opened. It is set at most once per
/// lookup and cleared at the start of every lookup on a non-empty level.
#[derive(Debug, Clone, Default)]
pub struct ReadStats {
    seek_file: Option<Arc<FileMetaData>>,
    seek_file_level: Option<u32>,
    first_file_read: Option<(Arc<FileMetaData>, u32)>,
}

impl ReadStats {
    /// Creates empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears everything recorded by a previous lookup.
    pub fn clear(&mut self) {
        self.seek_file = None;
        self.seek_file_level = None;
        self.first_file_read = None;
    }

    /// The file to charge for an extra seek, if any.
    pub fn seek_file(&self) -> Option<&Arc<FileMetaData>> {
        self.seek_file.as_ref()
    }

    /// The level of [`seek_file`](Self::seek_file).
    pub fn seek_file_level(&self) -> Option<u32> {
        self.seek_file_level
    }

    /// The first file opened by the lookup and its level.
    pub fn first_file_read(&self) -> Option<(&Arc<FileMetaData>, u32)> {
        self.first_file_read.as_ref().map(|(file, level)| (file, *level))
    }

    /// Returns true if a file has been charged.
    pub fn is_charged(&self) -> bool {
        self.seek_file.is_some()
    }

    /// Charges `file` at `level` unless a file is already charged.
    pub(crate) fn charge(&mut self, file: &Arc<FileMetaData>, level: u32) {
        if self.seek_file.is_none() {
            self.seek_file = Some(Arc::clone(file));
            self.seek_file_level = Some(level);
        }
    }

    pub(crate) fn record_read(&mut self, file: &Arc<FileMetaData>, level: u32) {
        if self.first_file_read.is_none() {
            self.first_file_read = Some((Arc::clone(file), level));
        }
    }
}
