//! # Internal Key Format
//!
//! Every stored entry is addressed by an internal key: the user key tagged
//! with the sequence number of the write and the kind of record.
//!
//! ## Format
//!
//! ```text
//! InternalKey:
//!   [user_key: bytes] [sequence: u64 LE] [type: u8]
//! ```
//!
//! ## Ordering
//!
//! InternalKeys are ordered by:
//! 1. user_key (ascending)
//! 2. sequence (descending - newer first)
//! 3. type (descending - Value before Deletion)

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Largest sequence number a write may carry (56 bits).
pub const MAX_SEQUENCE_NUMBER: u64 = (1 << 56) - 1;

/// Encoded size of the sequence and type trailer.
const TRAILER_SIZE: usize = 9;

/// The kind of record stored under an internal key.
///
/// - `Value`: A normal key-value pair
/// - `Deletion`: A tombstone marking that a key has been deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// A tombstone indicating the key has been deleted
    Deletion = 0,

    /// A normal value
    Value = 1,
}

impl ValueType {
    /// Converts a u8 to a ValueType.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ValueType::Deletion),
            1 => Some(ValueType::Value),
            _ => None,
        }
    }

    /// Converts the ValueType to a u8.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Composite key `(user_key, sequence, value_type)` ordering all stored
/// versions of all keys.
///
/// For one user key, the entry with the highest sequence sorts first, so a
/// forward seek to `(user_key, snapshot, Value)` lands on the newest version
/// visible at `snapshot`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InternalKey {
    user_key: Vec<u8>,
    sequence: u64,
    value_type: ValueType,
}

impl InternalKey {
    /// Creates a new InternalKey.
    ///
    /// ```rust
    /// use strata::{InternalKey, ValueType};
    ///
    /// let key = InternalKey::new(b"user_key".to_vec(), 42, ValueType::Value);
    /// assert_eq!(key.sequence(), 42);
    /// ```
    ///
    /// Sequences above [`MAX_SEQUENCE_NUMBER`] are clamped to it, so no key
    /// ever sorts before [`InternalKey::max_for`] of its user key.
    pub fn new(user_key: impl Into<Vec<u8>>, sequence: u64, value_type: ValueType) -> Self {
        Self {
            user_key: user_key.into(),
            sequence: sequence.min(MAX_SEQUENCE_NUMBER),
            value_type,
        }
    }

    /// The key that sorts before every real entry for `user_key`.
    pub fn max_for(user_key: impl Into<Vec<u8>>) -> Self {
        Self::new(user_key, MAX_SEQUENCE_NUMBER, ValueType::Value)
    }

    /// Returns the user key.
    pub fn user_key(&self) -> &[u8] {
        &self.user_key
    }

    /// Returns the sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the value type.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Encodes the InternalKey into bytes.
    ///
    /// Format: [user_key][sequence: 8 bytes][type: 1 byte]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_size());
        buf.extend_from_slice(&self.user_key);
        buf.extend_from_slice(&self.sequence.to_le_bytes());
        buf.push(self.value_type.as_u8());
        buf
    }

    /// Decodes an InternalKey from bytes.
    ///
    /// Returns None if the data is too short or the value type is unknown.
    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() < TRAILER_SIZE {
            return None;
        }

        let user_key_len = data.len() - TRAILER_SIZE;
        let sequence_bytes: [u8; 8] = data[user_key_len..user_key_len + 8].try_into().ok()?;
        let sequence = u64::from_le_bytes(sequence_bytes);
        let value_type = ValueType::from_u8(data[user_key_len + 8])?;

        Some(Self {
            user_key: data[..user_key_len].to_vec(),
            sequence,
            value_type,
        })
    }

    /// Returns the total encoded size of this InternalKey.
    pub fn encoded_size(&self) -> usize {
        self.user_key.len() + TRAILER_SIZE
    }
}

impl PartialOrd for InternalKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InternalKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.user_key
            .cmp(&other.user_key)
            .then_with(|| other.sequence.cmp(&self.sequence))
            .then_with(|| other.value_type.cmp(&self.value_type))
    }
}

impl fmt::Debug for InternalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' @ {} : {:?}",
            String::from_utf8_lossy(&self.user_key),
            self.sequence,
            self.value_type
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_conversion() {
        assert_eq!(ValueType::Deletion.as_u8(), 0);
        assert_eq!(ValueType::Value.as_u8(), 1);

        assert_eq!(ValueType::from_u8(0), Some(ValueType::Deletion));
        assert_eq!(ValueType::from_u8(1), Some(ValueType::Value));
        assert_eq!(ValueType::from_u8(2), None);
    }

    #[test]
    fn test_internal_key_encode_decode() {
        let original = InternalKey::new(b"test_key".to_vec(), 12345, ValueType::Deletion);
        let decoded = InternalKey::decode(&original.encode()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_internal_key_decode_empty_user_key() {
        let key = InternalKey::new(Vec::new(), 7, ValueType::Value);
        let decoded = InternalKey::decode(&key.encode()).unwrap();
        assert!(decoded.user_key().is_empty());
        assert_eq!(decoded.sequence(), 7);
    }

    #[test]
    fn test_internal_key_decode_invalid() {
        // Too short
        assert!(InternalKey::decode(&[1, 2, 3]).is_none());

        // Invalid value type
        let mut buf = b"key".to_vec();
        buf.extend_from_slice(&42u64.to_le_bytes());
        buf.push(99);
        assert!(InternalKey::decode(&buf).is_none());
    }

    #[test]
    fn test_internal_key_ordering_by_sequence() {
        let newer = InternalKey::new(b"key".to_vec(), 100, ValueType::Value);
        let older = InternalKey::new(b"key".to_vec(), 50, ValueType::Value);

        // Higher sequence should come first (descending order)
        assert!(newer < older);
    }

    #[test]
    fn test_internal_key_ordering_by_type() {
        let value_key = InternalKey::new(b"key".to_vec(), 100, ValueType::Value);
        let delete_key = InternalKey::new(b"key".to_vec(), 100, ValueType::Deletion);

        assert!(value_key < delete_key);
    }

    #[test]
    fn test_internal_key_complete_ordering() {
        let mut keys = [
            InternalKey::new(b"key2".to_vec(), 100, ValueType::Value),
            InternalKey::new(b"key1".to_vec(), 50, ValueType::Value),
            InternalKey::new(b"key1".to_vec(), 100, ValueType::Deletion),
            InternalKey::new(b"key1".to_vec(), 100, ValueType::Value),
            InternalKey::new(b"key1".to_vec(), 150, ValueType::Value),
        ];

        keys.sort();

        let order: Vec<(&[u8], u64, ValueType)> =
            keys.iter().map(|k| (k.user_key(), k.sequence(), k.value_type())).collect();
        assert_eq!(
            order,
            vec![
                (&b"key1"[..], 150, ValueType::Value),
                (&b"key1"[..], 100, ValueType::Value),
                (&b"key1"[..], 100, ValueType::Deletion),
                (&b"key1"[..], 50, ValueType::Value),
                (&b"key2"[..], 100, ValueType::Value),
            ]
        );
    }

    #[test]
    fn test_max_for_sorts_first() {
        let target = InternalKey::max_for(b"k".to_vec());
        let newest = InternalKey::new(b"k".to_vec(), MAX_SEQUENCE_NUMBER - 1, ValueType::Value);
        let smaller_user_key = InternalKey::new(b"j".to_vec(), 0, ValueType::Deletion);

        assert!(target < newest);
        assert!(smaller_user_key < target);
    }

    #[test]
    fn test_sequence_clamped_to_max() {
        let key = InternalKey::new(b"k".to_vec(), u64::MAX, ValueType::Value);
        assert_eq!(key.sequence(), MAX_SEQUENCE_NUMBER);
        assert_eq!(key, InternalKey::max_for(b"k".to_vec()));
        assert!(!(key < InternalKey::max_for(b"k".to_vec())));
    }

    #[test]
    fn test_encoded_size() {
        let key = InternalKey::new(b"test".to_vec(), 100, ValueType::Value);
        assert_eq!(key.encoded_size(), 4 + 8 + 1);
        assert_eq!(key.encode().len(), key.encoded_size());
    }
}
