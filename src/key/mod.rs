//! Keys exchanged between the read path and the level index.
//!
//! - [`InternalKey`]: the stored form, `(user_key, sequence, type)`
//! - [`LookupKey`]: a read request, `(user_key, snapshot)`
//! - [`LookupResult`]: a definitive answer for a request

mod internal_key;
mod lookup;

pub use internal_key::{InternalKey, ValueType, MAX_SEQUENCE_NUMBER};
pub use lookup::{LookupKey, LookupResult};
