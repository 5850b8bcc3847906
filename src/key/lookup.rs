//! Lookup request and response types.

use bytes::Bytes;

use super::{InternalKey, ValueType, MAX_SEQUENCE_NUMBER};

/// A point read: "the newest value for `user_key` visible at or before
/// `sequence`".
///
/// The seek key is `(user_key, sequence, Value)`, which sorts before any
/// stored entry of `user_key` with a sequence at or below the snapshot and
/// after every entry newer than it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupKey {
    key: InternalKey,
}

impl LookupKey {
    /// Creates a lookup for `user_key` as of snapshot `sequence`.
    ///
    /// A snapshot above [`MAX_SEQUENCE_NUMBER`] reads the latest state and is
    /// stored as `MAX_SEQUENCE_NUMBER`.
    pub fn new(user_key: impl Into<Vec<u8>>, sequence: u64) -> Self {
        let sequence = sequence.min(MAX_SEQUENCE_NUMBER);
        Self {
            key: InternalKey::new(user_key, sequence, ValueType::Value),
        }
    }

    /// Returns the user key being looked up.
    pub fn user_key(&self) -> &[u8] {
        self.key.user_key()
    }

    /// Returns the snapshot sequence number.
    pub fn sequence(&self) -> u64 {
        self.key.sequence()
    }

    /// Returns the internal key used to seek table iterators.
    pub fn internal_key(&self) -> &InternalKey {
        &self.key
    }
}

/// A definitive answer to a [`LookupKey`].
///
/// Both variants stop the search: a caller must not consult older levels
/// after receiving either one. Absence is expressed as `None` by the
/// operations that return this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    /// The newest visible entry is a value.
    Found {
        /// The request this answers.
        key: LookupKey,
        /// The stored payload.
        value: Bytes,
    },
    /// The newest visible entry is a tombstone.
    Deleted {
        /// The request this answers.
        key: LookupKey,
    },
}

impl LookupResult {
    /// Creates a `Found` result.
    pub fn found(key: LookupKey, value: Bytes) -> Self {
        LookupResult::Found { key, value }
    }

    /// Creates a `Deleted` result.
    pub fn deleted(key: LookupKey) -> Self {
        LookupResult::Deleted { key }
    }

    /// Returns the request this result answers.
    pub fn key(&self) -> &LookupKey {
        match self {
            LookupResult::Found { key, .. } | LookupResult::Deleted { key } => key,
        }
    }

    /// Returns the payload, or None for a tombstone.
    pub fn value(&self) -> Option<&Bytes> {
        match self {
            LookupResult::Found { value, .. } => Some(value),
            LookupResult::Deleted { .. } => None,
        }
    }

    /// Returns true if the key was deleted.
    pub fn is_deleted(&self) -> bool {
        matches!(self, LookupResult::Deleted { .. })
    }

    /// Converts into the payload, dropping the request.
    pub fn into_value(self) -> Option<Bytes> {
        match self {
            LookupResult::Found { value, .. } => Some(value),
            LookupResult::Deleted { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_key_seek_target() {
        let key = LookupKey::new(b"apple".to_vec(), 7);
        assert_eq!(key.user_key(), b"apple");
        assert_eq!(key.sequence(), 7);
        assert_eq!(key.internal_key().value_type(), ValueType::Value);

        // Entries newer than the snapshot sort before the seek key, older ones after.
        let newer = InternalKey::new(b"apple".to_vec(), 10, ValueType::Value);
        let older = InternalKey::new(b"apple".to_vec(), 5, ValueType::Deletion);
        let same_seq_tombstone = InternalKey::new(b"apple".to_vec(), 7, ValueType::Deletion);
        assert!(&newer < key.internal_key());
        assert!(key.internal_key() < &older);
        assert!(key.internal_key() < &same_seq_tombstone);
    }

    #[test]
    fn test_snapshot_above_max_reads_latest() {
        let key = LookupKey::new(b"k".to_vec(), u64::MAX);
        assert_eq!(key.sequence(), MAX_SEQUENCE_NUMBER);

        let newest = InternalKey::new(b"k".to_vec(), MAX_SEQUENCE_NUMBER - 1, ValueType::Value);
        assert!(key.internal_key() < &newest);
    }

    #[test]
    fn test_lookup_result_accessors() {
        let key = LookupKey::new(b"k".to_vec(), 1);
        let found = LookupResult::found(key, Bytes::from_static(b"v"));
        assert!(!found.is_deleted());
        assert_eq!(found.value().map(|v| &v[..]), Some(&b"v"[..]));
        assert_eq!(found.key().user_key(), b"k");

        let deleted = LookupResult::deleted(LookupKey::new(b"k".to_vec(), 1));
        assert!(deleted.is_deleted());
        assert!(deleted.into_value().is_none());
    }
}
