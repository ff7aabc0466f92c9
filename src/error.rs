//! Error types for schema construction and the record codec.
//!
//! Schema errors are raised while a schema is built and never deferred to
//! read/write time. Codec errors abort the whole call; the record being
//! decoded is left partially populated and should be discarded.

use std::io;

use thiserror::Error;

/// Errors raised by schema construction, decoding and encoding.
#[derive(Error, Debug)]
pub enum Error {
    // Schema construction
    /// Invalid declaration (zero repeat count, duplicate field name, ...)
    #[error("invalid schema `{schema}`: {reason}")]
    Schema {
        /// Name of the schema being built
        schema: String,
        /// What is wrong with the declaration
        reason: String,
    },

    /// A schema contains, directly or through nested records, a field of its own type
    #[error("schema `{schema}` recursively contains itself through field `{field}`")]
    RecursiveSchema {
        /// Name of the schema being built
        schema: String,
        /// Field through which the cycle was found
        field: String,
    },

    // Decoding
    /// The byte source ran out before a field's full width was read
    #[error("short read in field `{field}`: expected {expected} bytes, got {actual}")]
    ShortRead {
        /// Field being decoded
        field: String,
        /// Width of the field in bytes
        expected: usize,
        /// Bytes actually available
        actual: usize,
    },

    /// A buffer decoded as a whole record is longer than the record
    #[error("buffer length does not match schema `{schema}`: expected {expected} bytes, got {actual}")]
    TrailingBytes {
        /// Name of the schema
        schema: String,
        /// Size of the schema in bytes
        expected: usize,
        /// Length of the buffer
        actual: usize,
    },

    // Encoding
    /// A stored value does not match the declared shape or range of its field
    #[error("cannot encode field `{field}`: {reason}")]
    EncodeMismatch {
        /// Field being encoded
        field: String,
        /// Why the value does not fit
        reason: String,
    },

    /// A field has no value on the record
    #[error("field `{field}` has no value")]
    MissingValue {
        /// Field without a value
        field: String,
    },

    // Record access
    /// No field with this name is declared in the schema
    #[error("schema `{schema}` has no field `{field}`")]
    UnknownField {
        /// Name of the schema
        schema: String,
        /// Requested field name
        field: String,
    },

    /// Positional assignment received more values than the schema has fields
    #[error("schema `{schema}` has {expected} fields, got {actual} values")]
    TooManyValues {
        /// Name of the schema
        schema: String,
        /// Number of declared fields
        expected: usize,
        /// Number of values supplied
        actual: usize,
    },

    /// A decoded value cannot be converted into a typed struct field
    #[error("cannot convert field `{field}` into {expected}")]
    Convert {
        /// Field being converted
        field: String,
        /// Target Rust type
        expected: &'static str,
    },

    /// Underlying I/O failure other than end of input
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn schema(schema: &str, reason: impl Into<String>) -> Self {
        Error::Schema {
            schema: schema.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn mismatch(field: &str, reason: impl Into<String>) -> Self {
        Error::EncodeMismatch {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }

    /// Whether this error means the input was malformed (truncated).
    #[must_use]
    pub fn is_short_read(&self) -> bool {
        matches!(self, Error::ShortRead { .. })
    }
}

/// Convenient Result type alias for codec operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_field() {
        let err = Error::ShortRead {
            field: "magic".into(),
            expected: 4,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "short read in field `magic`: expected 4 bytes, got 1"
        );
        assert!(err.is_short_read());

        let err = Error::mismatch("b", "expected 2 values, got 3");
        assert_eq!(
            err.to_string(),
            "cannot encode field `b`: expected 2 values, got 3"
        );
        assert!(!err.is_short_read());
    }

    #[test]
    fn io_errors_convert() {
        let err: Error = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
