//! Versions: the set of table files visible at a point in time.
//!
//! A [`Version`] owns one [`Level`] per level number and is immutable once
//! built. It answers point reads by asking each level in turn, newest first,
//! and turns the [`ReadStats`] of a read into seek-compaction pressure.
//!
//! New versions are derived from old ones by applying [`VersionEdit`]s; the
//! old version stays valid for readers that still hold it.

mod edit;
mod file_meta;
mod level;
mod level_iter;
mod stats;

pub use edit::{NewFile, VersionEdit};
pub use file_meta::FileMetaData;
pub use level::Level;
pub use level_iter::LevelIterator;
pub use stats::ReadStats;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Options;
use crate::error::{Error, Result};
use crate::key::{LookupKey, LookupResult};
use crate::table::TableAccess;

/// A file whose seek allowance ran out, with its level.
#[derive(Debug, Clone)]
pub struct SeekCompaction {
    /// The file to compact
    pub file: Arc<FileMetaData>,
    /// Level of the file
    pub level: u32,
}

/// An immutable snapshot of the files of every level.
pub struct Version {
    options: Arc<Options>,
    table: Arc<dyn TableAccess>,
    levels: Vec<Level>,
    file_to_compact: Mutex<Option<SeekCompaction>>,
}

impl Version {
    /// Creates an empty version.
    pub fn new(options: Options, table: Arc<dyn TableAccess>) -> Result<Self> {
        options.validate()?;
        let levels = (0..options.num_levels)
            .map(|n| Level::new(n as u32, Vec::new(), Arc::clone(&table)))
            .collect();
        Ok(Self {
            options: Arc::new(options),
            table,
            levels,
            file_to_compact: Mutex::new(None),
        })
    }

    /// Returns the options this version was built with.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Returns all levels, level 0 first.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Returns one level.
    pub fn level(&self, level: u32) -> Option<&Level> {
        self.levels.get(level as usize)
    }

    /// Returns the number of levels.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Get the total number of files
    pub fn num_files(&self) -> usize {
        self.levels.iter().map(Level::len).sum()
    }

    /// Get the total size of all files
    pub fn total_size(&self) -> u64 {
        self.levels.iter().map(Level::total_size).sum()
    }

    /// Looks up `key` in every level, newest first, stopping at the first
    /// definitive result.
    ///
    /// `stats` is cleared and then charges the first file read if the lookup
    /// had to open more than one file, whether in one level or across levels.
    /// Pass it to [`update_stats`](Self::update_stats) afterwards.
    pub fn get(&self, key: &LookupKey, stats: &mut ReadStats) -> Result<Option<LookupResult>> {
        stats.clear();
        let mut level_stats = ReadStats::new();

        for level in &self.levels {
            let result = level.get(key, &mut level_stats)?;

            if let Some((file, level_number)) = level_stats.first_file_read() {
                if let Some((first, first_level)) = stats.first_file_read() {
                    let (first, first_level) = (Arc::clone(first), first_level);
                    stats.charge(&first, first_level);
                } else {
                    stats.record_read(file, level_number);
                    if let (Some(seek_file), Some(seek_level)) =
                        (level_stats.seek_file(), level_stats.seek_file_level())
                    {
                        stats.charge(seek_file, seek_level);
                    }
                }
            }
            level_stats.clear();

            if result.is_some() {
                return Ok(result);
            }
        }

        Ok(None)
    }

    /// Charges the file named by `stats` for one unproductive seek.
    ///
    /// Returns true if this exhausted the file's allowance and it is now the
    /// pending seek compaction.
    pub fn update_stats(&self, stats: &ReadStats) -> bool {
        let (Some(file), Some(level)) = (stats.seek_file(), stats.seek_file_level()) else {
            return false;
        };
        if !file.charge_seek() {
            return false;
        }

        let mut pending = self.file_to_compact.lock();
        if pending.is_some() {
            return false;
        }
        log::debug!(
            "File {:06} at level {} ran out of seeks, scheduling compaction",
            file.number(),
            level
        );
        *pending = Some(SeekCompaction {
            file: Arc::clone(file),
            level,
        });
        true
    }

    /// Returns the pending seek compaction, if any.
    pub fn file_to_compact(&self) -> Option<SeekCompaction> {
        self.file_to_compact.lock().clone()
    }

    /// Returns the level most in need of compaction and its score.
    ///
    /// Level 0 scores by file count against `level0_compaction_trigger`, other
    /// levels by bytes against `max_bytes_for_level`. The last level is never
    /// a compaction source. A score of 1.0 or more means compaction is due.
    pub fn compaction_score(&self) -> (u32, f64) {
        let mut best = (0, 0.0);
        for level in &self.levels[..self.levels.len() - 1] {
            let n = level.level_number();
            let score = if n == 0 {
                level.len() as f64 / self.options.level0_compaction_trigger as f64
            } else {
                level.total_size() as f64 / self.options.max_bytes_for_level(n as usize) as f64
            };
            if score > best.1 {
                best = (n, score);
            }
        }
        best
    }

    /// Returns true if a size or seek triggered compaction is due.
    pub fn needs_compaction(&self) -> bool {
        self.compaction_score().1 >= 1.0 || self.file_to_compact.lock().is_some()
    }

    /// Returns true if some file in `level` overlaps `[smallest, largest]`.
    pub fn overlap_in_level(&self, level: u32, smallest: &[u8], largest: &[u8]) -> bool {
        self.level(level).is_some_and(|l| l.some_file_overlaps_range(smallest, largest))
    }

    /// Returns the files of `level` overlapping `[begin, end]` (open when None).
    pub fn overlapping_inputs(
        &self,
        level: u32,
        begin: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Vec<Arc<FileMetaData>> {
        self.level(level)
            .map(|l| l.overlapping_files(begin, end))
            .unwrap_or_default()
    }

    /// Chooses the level for a freshly flushed table covering
    /// `[smallest, largest]`.
    ///
    /// The table is pushed below level 0 while it overlaps nothing in the next
    /// level and its overlap with the level after that stays small, up to
    /// `max_mem_compact_level`.
    pub fn pick_level_for_memtable_output(&self, smallest: &[u8], largest: &[u8]) -> u32 {
        let mut level = 0u32;
        if self.overlap_in_level(0, smallest, largest) {
            return level;
        }

        let max_level = self.options.max_mem_compact_level as u32;
        while level < max_level {
            if self.overlap_in_level(level + 1, smallest, largest) {
                break;
            }
            if ((level + 2) as usize) < self.num_levels() {
                let grandparent_bytes: u64 = self
                    .overlapping_inputs(level + 2, Some(smallest), Some(largest))
                    .iter()
                    .map(|file| file.file_size())
                    .sum();
                if grandparent_bytes > self.options.max_grandparent_overlap_bytes() {
                    break;
                }
            }
            level += 1;
        }
        level
    }

    /// Builds the successor version by applying `edits` as one batch.
    ///
    /// Deleted files are dropped, added files are appended, and every level
    /// above 0 is ordered by smallest key. The result is checked before it is
    /// returned: a batch that would leave overlapping files in a level above 0
    /// fails with [`Error::InvalidState`] and this version stays current.
    ///
    /// Once the new version is built, files deleted by the batch and not
    /// re-added elsewhere are evicted from the table access layer.
    pub fn apply(&self, edits: &[VersionEdit]) -> Result<Version> {
        let mut deleted = HashSet::new();
        for edit in edits {
            if edit.level() as usize >= self.num_levels() {
                return Err(Error::invalid_argument(format!(
                    "edit targets level {} but there are only {} levels",
                    edit.level(),
                    self.num_levels()
                )));
            }
            if let VersionEdit::DeleteFile { level, file_number } = edit {
                deleted.insert((*level, *file_number));
            }
        }

        let mut levels = Vec::with_capacity(self.levels.len());
        for current in &self.levels {
            let n = current.level_number();
            let mut files: Vec<Arc<FileMetaData>> = current
                .files()
                .iter()
                .filter(|file| !deleted.contains(&(n, file.number())))
                .cloned()
                .collect();
            for edit in edits {
                if let VersionEdit::AddFile { level, file } = edit {
                    if *level == n {
                        let allowed = self.options.allowed_seeks_for(file.file_size);
                        files.push(Arc::new(file.to_meta(allowed)));
                    }
                }
            }
            if n > 0 {
                files.sort_by(|a, b| a.smallest().cmp(b.smallest()));
            }

            let mut next = Level::new(
                n,
                Vec::with_capacity(files.len()),
                Arc::clone(&self.table),
            );
            for file in files {
                next.add_file(file);
            }
            next.check_invariants()?;
            levels.push(next);
        }

        let version = Version {
            options: Arc::clone(&self.options),
            table: Arc::clone(&self.table),
            levels,
            file_to_compact: Mutex::new(None),
        };
        log::info!(
            "Applied {} version edits: {}",
            edits.len(),
            version.level_summary()
        );

        let readded: HashSet<u64> = edits
            .iter()
            .filter_map(|edit| match edit {
                VersionEdit::AddFile { file, .. } => Some(file.number),
                VersionEdit::DeleteFile { .. } => None,
            })
            .collect();
        for &(_, file_number) in &deleted {
            if !readded.contains(&file_number) {
                self.table.evict(file_number);
            }
        }
        Ok(version)
    }

    /// One-line summary of file counts per level, e.g. `files[ 2 1 0 0 0 0 0 ]`.
    pub fn level_summary(&self) -> String {
        let counts: Vec<String> = self.levels.iter().map(|l| l.len().to_string()).collect();
        format!("files[ {} ]", counts.join(" "))
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Version").field("levels", &self.levels).finish()
    }
}
