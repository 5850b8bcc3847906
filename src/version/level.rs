//! One level of the LSM tree: its files, point lookup and range overlap.
//!
//! ## Structure
//!
//! - Level 0: files come straight from memtable flushes. Their key ranges may
//!   overlap and the list is not sorted by range.
//! - Level 1+: files are sorted by `smallest` and pairwise disjoint, so the
//!   single file that may hold a key is found by binary search on `largest`.
//!
//! The level-N invariant is assumed by lookups, not checked. Version
//! construction verifies it once with [`Level::check_invariants`] before a
//! level is published.

use std::fmt;
use std::sync::Arc;

use super::{FileMetaData, LevelIterator, ReadStats};
use crate::error::{Error, Result};
use crate::key::{InternalKey, LookupKey, LookupResult, ValueType};
use crate::table::TableAccess;

/// The files of one level and the lookups over them.
///
/// A level is built with [`Level::add_file`] while it is exclusively owned and
/// is read-only once shared: `add_file` needs `&mut self`, every read needs
/// only `&self`, and lookups take no locks.
pub struct Level {
    level_number: u32,
    files: Vec<Arc<FileMetaData>>,
    table: Arc<dyn TableAccess>,
}

impl Level {
    /// Creates a level from `files`, kept in the given order.
    pub fn new(
        level_number: u32,
        files: Vec<Arc<FileMetaData>>,
        table: Arc<dyn TableAccess>,
    ) -> Self {
        Self {
            level_number,
            files,
            table,
        }
    }

    /// Returns the level number (0 is the newest level).
    pub fn level_number(&self) -> u32 {
        self.level_number
    }

    /// Returns the files of this level.
    pub fn files(&self) -> &[Arc<FileMetaData>] {
        &self.files
    }

    /// Returns the number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if the level holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Returns the total size of all files in bytes.
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|file| file.file_size()).sum()
    }

    /// Appends a file. No sorting and no overlap validation is done here.
    pub fn add_file(&mut self, file: impl Into<Arc<FileMetaData>>) {
        self.files.push(file.into());
    }

    /// Looks up the newest entry for `key` visible at its snapshot.
    ///
    /// Returns `Ok(None)` when this level has no definitive answer and the
    /// caller must continue with the next older level. `stats` is cleared
    /// first (unless the level is empty) and then names the first file opened
    /// if more than one file had to be opened.
    pub fn get(&self, key: &LookupKey, stats: &mut ReadStats) -> Result<Option<LookupResult>> {
        if self.files.is_empty() {
            return Ok(None);
        }
        stats.clear();

        let candidates: Vec<&Arc<FileMetaData>> = if self.level_number == 0 {
            // Newest first: a higher file number is always a later write.
            let mut overlapping: Vec<_> = self
                .files
                .iter()
                .filter(|file| file.contains_user_key(key.user_key()))
                .collect();
            overlapping.sort_unstable_by(|a, b| b.number().cmp(&a.number()));
            overlapping
        } else {
            let index = self.find_file(key.internal_key());
            match self.files.get(index) {
                Some(file) if key.user_key() >= file.smallest().user_key() => vec![file],
                _ => return Ok(None),
            }
        };

        let mut last_file_read: Option<&Arc<FileMetaData>> = None;
        for file in candidates {
            if let Some(previous) = last_file_read {
                if !stats.is_charged() {
                    // More than one seek for this read: charge the first file.
                    log::trace!(
                        "Charging file {:06} at level {} for an extra seek",
                        previous.number(),
                        self.level_number
                    );
                    stats.charge(previous, self.level_number);
                }
            }
            last_file_read = Some(file);
            stats.record_read(file, self.level_number);

            if let Some(result) = self.search_file(file, key)? {
                return Ok(Some(result));
            }
        }

        Ok(None)
    }

    /// Seeks one file for `key` and interprets the entry found.
    fn search_file(&self, file: &FileMetaData, key: &LookupKey) -> Result<Option<LookupResult>> {
        let mut iter = self.table.new_iterator(file)?;
        iter.seek(key.internal_key())?;
        if !iter.has_next() {
            return Ok(None);
        }

        let Some((raw_key, value)) = iter.next_entry()? else {
            return Ok(None);
        };
        let internal_key = decode_entry_key(&raw_key, file.number())?;
        if internal_key.user_key() != key.user_key() {
            return Ok(None);
        }

        Ok(Some(match internal_key.value_type() {
            ValueType::Deletion => LookupResult::deleted(key.clone()),
            ValueType::Value => LookupResult::found(key.clone(), value),
        }))
    }

    /// Index of the first file whose `largest` is `>= target`, or `len()` if
    /// there is none.
    ///
    /// Only meaningful on a sorted, disjoint level (level > 0).
    pub fn find_file(&self, target: &InternalKey) -> usize {
        find_file(&self.files, target)
    }

    /// Returns true if some file may hold a user key in `[smallest, largest]`
    /// (both inclusive).
    pub fn some_file_overlaps_range(&self, smallest: &[u8], largest: &[u8]) -> bool {
        if self.level_number == 0 {
            return self
                .files
                .iter()
                .any(|file| file.overlaps_user_range(Some(smallest), Some(largest)));
        }

        let index = self.find_file(&InternalKey::max_for(smallest));
        self.files
            .get(index)
            .is_some_and(|file| largest >= file.smallest().user_key())
    }

    /// Returns every file whose user-key range intersects `[begin, end]`.
    ///
    /// `None` bounds are open. On level 0 the range grows to cover each
    /// overlapping file completely, so the result also holds every level-0
    /// file overlapping the files already chosen.
    pub fn overlapping_files(
        &self,
        begin: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Vec<Arc<FileMetaData>> {
        let mut user_begin = begin.map(<[u8]>::to_vec);
        let mut user_end = end.map(<[u8]>::to_vec);
        let mut inputs = Vec::new();

        let mut i = 0;
        while i < self.files.len() {
            let file = &self.files[i];
            i += 1;
            if !file.overlaps_user_range(user_begin.as_deref(), user_end.as_deref()) {
                continue;
            }
            inputs.push(Arc::clone(file));

            if self.level_number == 0 {
                let file_start = file.smallest().user_key();
                let file_limit = file.largest().user_key();
                if user_begin.as_deref().is_some_and(|b| file_start < b) {
                    user_begin = Some(file_start.to_vec());
                    inputs.clear();
                    i = 0;
                } else if user_end.as_deref().is_some_and(|e| file_limit > e) {
                    user_end = Some(file_limit.to_vec());
                    inputs.clear();
                    i = 0;
                }
            }
        }

        inputs
    }

    /// Verifies the structural invariants of this level.
    ///
    /// Every file needs `smallest <= largest`; on level 1+ files must also be
    /// sorted and must not overlap.
    pub fn check_invariants(&self) -> Result<()> {
        for file in &self.files {
            if file.smallest() > file.largest() {
                return Err(Error::invalid_state(format!(
                    "level {}: file {:06} has smallest {:?} > largest {:?}",
                    self.level_number,
                    file.number(),
                    file.smallest(),
                    file.largest()
                )));
            }
        }

        if self.level_number > 0 {
            for pair in self.files.windows(2) {
                if pair[0].largest() >= pair[1].smallest() {
                    return Err(Error::invalid_state(format!(
                        "level {}: file {:06} overlaps or precedes file {:06}",
                        self.level_number,
                        pair[1].number(),
                        pair[0].number()
                    )));
                }
            }
        }

        Ok(())
    }

    /// Returns a lazy iterator over all entries of this level, concatenating
    /// the files in list order.
    pub fn iter(&self) -> LevelIterator {
        LevelIterator::new(Arc::clone(&self.table), self.files.clone())
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Level")
            .field("level_number", &self.level_number)
            .field(
                "files",
                &self.files.iter().map(|file| file.number()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level(level_number={}, files=[", self.level_number)?;
        for (i, file) in self.files.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", file)?;
        }
        write!(f, "])")
    }
}

/// Binary search for the first file whose `largest` is `>= target`.
pub(crate) fn find_file(files: &[Arc<FileMetaData>], target: &InternalKey) -> usize {
    files.partition_point(|file| file.largest() < target)
}

/// Decodes a key read back from a table, reporting damage as corruption.
pub(crate) fn decode_entry_key(raw: &[u8], file_number: u64) -> Result<InternalKey> {
    InternalKey::decode(raw).ok_or_else(|| {
        let detail = if raw.len() < 9 {
            format!("{}-byte key is shorter than the 9-byte trailer", raw.len())
        } else {
            format!("unknown record kind {}", raw[raw.len() - 1])
        };
        log::error!("Corrupt entry in table {:06}: {}", file_number, detail);
        Error::corruption(format!("table {:06}: {}", file_number, detail))
    })
}
