//! Concatenating iterator over the files of a level.

use std::sync::Arc;

use bytes::Bytes;

use super::level::{decode_entry_key, find_file};
use super::FileMetaData;
use crate::error::{Error, Result};
use crate::key::InternalKey;
use crate::table::{TableAccess, TableIterator};

/// Lazily walks every entry of a level by chaining per-file iterators in file
/// order.
///
/// Files are opened one at a time, only when the walk reaches them; files
/// without entries are skipped. On a level 1+ the output is in ascending
/// internal-key order. On level 0 it is merely file-by-file.
///
/// A file that cannot be opened does not end the walk: its error is returned
/// once, in file order, and the walk continues with the next file.
///
/// As an [`Iterator`] it starts from the first entry and yields decoded keys.
/// Call [`seek_to_first`](TableIterator::seek_to_first) to restart.
pub struct LevelIterator {
    table: Arc<dyn TableAccess>,
    files: Vec<Arc<FileMetaData>>,
    index: usize,
    /// Iterator over `files[index]`; only set while it has entries left.
    current: Option<Box<dyn TableIterator>>,
    /// Open failure not yet reported, and the file to resume from.
    failed: Option<(Error, usize)>,
    positioned: bool,
}

impl LevelIterator {
    pub(crate) fn new(table: Arc<dyn TableAccess>, files: Vec<Arc<FileMetaData>>) -> Self {
        Self {
            table,
            files,
            index: 0,
            current: None,
            failed: None,
            positioned: false,
        }
    }

    /// The file the cursor is in, or None when exhausted.
    pub fn current_file(&self) -> Option<&Arc<FileMetaData>> {
        self.current.as_ref().and(self.files.get(self.index))
    }

    /// Positions at the first entry of file `index` at or after `target`
    /// (or its first entry), moving on past files with nothing left.
    fn position(&mut self, mut index: usize, mut target: Option<&InternalKey>) {
        self.current = None;
        self.failed = None;

        while let Some(file) = self.files.get(index) {
            self.index = index;
            let opened = self.table.new_iterator(file).and_then(|mut iter| {
                match target {
                    Some(target) => iter.seek(target)?,
                    None => iter.seek_to_first()?,
                }
                Ok(iter)
            });

            match opened {
                Ok(iter) if iter.has_next() => {
                    self.current = Some(iter);
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("Skipping table {:06} in level scan: {}", file.number(), e);
                    self.failed = Some((e, index + 1));
                    return;
                }
            }
            index += 1;
            target = None;
        }
        self.index = self.files.len();
    }

    /// Takes the next entry along with the number of the file it came from.
    fn next_with_file(&mut self) -> Result<Option<(u64, Bytes, Bytes)>> {
        if let Some((e, resume)) = self.failed.take() {
            self.position(resume, None);
            return Err(e);
        }

        let Some(iter) = self.current.as_mut() else {
            return Ok(None);
        };
        let file_number = self.files[self.index].number();
        let entry = iter.next_entry()?;
        if !iter.has_next() {
            self.position(self.index + 1, None);
        }

        Ok(entry.map(|(key, value)| (file_number, key, value)))
    }
}

impl TableIterator for LevelIterator {
    fn seek_to_first(&mut self) -> Result<()> {
        self.positioned = true;
        self.position(0, None);
        Ok(())
    }

    /// Open failures met while positioning are reported by the next call to
    /// [`next_entry`](TableIterator::next_entry).
    fn seek(&mut self, target: &InternalKey) -> Result<()> {
        self.positioned = true;
        let index = find_file(&self.files, target);
        self.position(index, Some(target));
        Ok(())
    }

    fn has_next(&self) -> bool {
        self.failed.is_some() || self.current.is_some()
    }

    fn next_entry(&mut self) -> Result<Option<(Bytes, Bytes)>> {
        Ok(self.next_with_file()?.map(|(_, key, value)| (key, value)))
    }
}

impl Iterator for LevelIterator {
    type Item = Result<(InternalKey, Bytes)>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.positioned {
            self.positioned = true;
            self.position(0, None);
        }

        match self.next_with_file() {
            Ok(Some((file_number, raw_key, value))) => {
                Some(decode_entry_key(&raw_key, file_number).map(|key| (key, value)))
            }
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
