//! Table file descriptors.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::config::Options;
use crate::key::InternalKey;

/// Metadata for one sorted table file.
///
/// Everything except the seek allowance is fixed once the file is added to a
/// level. The allowance is charged by the read path (see
/// [`Version::update_stats`](crate::Version::update_stats)); the level index
/// itself only reports which file to charge.
#[derive(Debug)]
pub struct FileMetaData {
    /// File number identifier
    number: u64,
    /// Size of the file in bytes
    file_size: u64,
    /// Smallest internal key in the file (inclusive)
    smallest: InternalKey,
    /// Largest internal key in the file (inclusive)
    largest: InternalKey,
    /// Remaining unproductive seeks before the file asks for compaction
    allowed_seeks: AtomicI64,
}

impl FileMetaData {
    /// Creates metadata for a table file, with the default seek allowance for
    /// its size.
    pub fn new(number: u64, file_size: u64, smallest: InternalKey, largest: InternalKey) -> Self {
        let allowed = Options::default().allowed_seeks_for(file_size);
        Self {
            number,
            file_size,
            smallest,
            largest,
            allowed_seeks: AtomicI64::new(saturating_i64(allowed)),
        }
    }

    /// Returns the file number.
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Returns the file size in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Returns the smallest internal key.
    pub fn smallest(&self) -> &InternalKey {
        &self.smallest
    }

    /// Returns the largest internal key.
    pub fn largest(&self) -> &InternalKey {
        &self.largest
    }

    /// Returns true if `user_key` lies within `[smallest, largest]` by user key.
    pub fn contains_user_key(&self, user_key: &[u8]) -> bool {
        user_key >= self.smallest.user_key() && user_key <= self.largest.user_key()
    }

    /// Returns true if the user-key range of this file intersects `[lo, hi]`.
    ///
    /// `None` bounds are open.
    pub fn overlaps_user_range(&self, lo: Option<&[u8]>, hi: Option<&[u8]>) -> bool {
        let after_hi = hi.is_some_and(|hi| self.smallest.user_key() > hi);
        let before_lo = lo.is_some_and(|lo| self.largest.user_key() < lo);
        !(after_hi || before_lo)
    }

    /// Returns the remaining seek allowance. May be negative once exhausted.
    pub fn allowed_seeks(&self) -> i64 {
        self.allowed_seeks.load(Ordering::Acquire)
    }

    /// Resets the seek allowance.
    pub fn set_allowed_seeks(&self, allowed: u64) {
        self.allowed_seeks.store(saturating_i64(allowed), Ordering::Release);
    }

    /// Charges one unproductive seek. Returns true if the allowance is used up.
    pub fn charge_seek(&self) -> bool {
        self.allowed_seeks.fetch_sub(1, Ordering::AcqRel) - 1 <= 0
    }
}

impl fmt::Display for FileMetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:06} [{:?} .. {:?}] {}B",
            self.number, self.smallest, self.largest, self.file_size
        )
    }
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::ValueType;
    use std::sync::Arc;
    use std::thread;

    fn meta(lo: &str, hi: &str) -> FileMetaData {
        FileMetaData::new(
            1,
            1024,
            InternalKey::new(lo.as_bytes().to_vec(), 10, ValueType::Value),
            InternalKey::new(hi.as_bytes().to_vec(), 5, ValueType::Value),
        )
    }

    #[test]
    fn test_contains_user_key_inclusive() {
        let f = meta("b", "d");
        assert!(!f.contains_user_key(b"a"));
        assert!(f.contains_user_key(b"b"));
        assert!(f.contains_user_key(b"c"));
        assert!(f.contains_user_key(b"d"));
        assert!(!f.contains_user_key(b"e"));
    }

    #[test]
    fn test_overlaps_user_range() {
        let f = meta("m", "p");
        assert!(f.overlaps_user_range(Some(b"a"), Some(b"m")));
        assert!(f.overlaps_user_range(Some(b"p"), Some(b"z")));
        assert!(!f.overlaps_user_range(Some(b"q"), Some(b"z")));
        assert!(!f.overlaps_user_range(None, Some(b"l")));
        assert!(f.overlaps_user_range(None, None));
    }

    #[test]
    fn test_default_allowed_seeks() {
        assert_eq!(meta("a", "b").allowed_seeks(), 100);
    }

    #[test]
    fn test_charge_seek_until_exhausted() {
        let f = meta("a", "b");
        f.set_allowed_seeks(3);
        assert!(!f.charge_seek());
        assert!(!f.charge_seek());
        assert!(f.charge_seek());
        assert_eq!(f.allowed_seeks(), 0);
        // Further charges keep reporting exhaustion.
        assert!(f.charge_seek());
    }

    #[test]
    fn test_concurrent_charges_are_not_lost() {
        let f = Arc::new(meta("a", "b"));
        f.set_allowed_seeks(1000);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let f = Arc::clone(&f);
                thread::spawn(move || {
                    for _ in 0..100 {
                        f.charge_seek();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(f.allowed_seeks(), 200);
    }
}
