//! Primitive wire types.

use std::fmt;

/// One primitive wire representation.
///
/// Type                 |   Width   |   Rust type   |   Format
/// ----                 |   -----   |   ---------   |   ------
/// `Bool`               |   1       |   `bool`      |   '?'
/// `Char`               |   1       |   `i8`        |   'b'
/// `UnsignedChar`       |   1       |   `u8`        |   'B'
/// `Short`              |   2       |   `i16`       |   'h'
/// `UnsignedShort`      |   2       |   `u16`       |   'H'
/// `Int`                |   4       |   `i32`       |   'i'
/// `UnsignedInt`        |   4       |   `u32`       |   'I'
/// `LongLong`           |   8       |   `i64`       |   'q'
/// `UnsignedLongLong`   |   8       |   `u64`       |   'Q'
/// `Float`              |   4       |   `f32`       |   'f'
/// `Double`             |   8       |   `f64`       |   'd'
/// `String`             |   n       |   `Vec<u8>`   |   's'
///
/// For `String` the declaration's repeat count is the buffer length, not an
/// array arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    Char,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    LongLong,
    UnsignedLongLong,
    Float,
    Double,
    String,
}

impl FieldType {
    /// Encoded width of one element in bytes.
    #[must_use]
    pub fn element_width(self) -> usize {
        match self {
            FieldType::Bool
            | FieldType::Char
            | FieldType::UnsignedChar
            | FieldType::String => 1,
            FieldType::Short | FieldType::UnsignedShort => 2,
            FieldType::Int | FieldType::UnsignedInt | FieldType::Float => 4,
            FieldType::LongLong | FieldType::UnsignedLongLong | FieldType::Double => 8,
        }
    }

    /// Encoded width of a field of this type declared with `count`.
    ///
    /// # Panics
    ///
    /// On overflow; see [`checked_width`](FieldType::checked_width).
    #[must_use]
    pub fn width(self, count: usize) -> usize {
        self.element_width() * count
    }

    /// [`width`](FieldType::width), or `None` if it overflows `usize`.
    #[must_use]
    pub fn checked_width(self, count: usize) -> Option<usize> {
        self.element_width().checked_mul(count)
    }

    #[must_use]
    pub fn format_char(self) -> char {
        match self {
            FieldType::Bool => '?',
            FieldType::Char => 'b',
            FieldType::UnsignedChar => 'B',
            FieldType::Short => 'h',
            FieldType::UnsignedShort => 'H',
            FieldType::Int => 'i',
            FieldType::UnsignedInt => 'I',
            FieldType::LongLong => 'q',
            FieldType::UnsignedLongLong => 'Q',
            FieldType::Float => 'f',
            FieldType::Double => 'd',
            FieldType::String => 's',
        }
    }

    #[must_use]
    pub fn is_string(self) -> bool {
        self == FieldType::String
    }

    #[must_use]
    pub fn is_integer(self) -> bool {
        !matches!(
            self,
            FieldType::Bool | FieldType::Float | FieldType::Double | FieldType::String
        )
    }

    /// Decode-time transform of a raw buffer.
    ///
    /// Strings are cut at the first zero byte; every other type is left as is.
    #[must_use]
    pub fn transform(self, raw: &[u8]) -> &[u8] {
        if !self.is_string() {
            return raw;
        }
        match raw.iter().position(|&b| b == 0) {
            Some(end) => &raw[..end],
            None => raw,
        }
    }

    /// Name used in diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::Char => "char",
            FieldType::UnsignedChar => "unsigned char",
            FieldType::Short => "short",
            FieldType::UnsignedShort => "unsigned short",
            FieldType::Int => "int",
            FieldType::UnsignedInt => "unsigned int",
            FieldType::LongLong => "long long",
            FieldType::UnsignedLongLong => "unsigned long long",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::String => "string",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths() {
        assert_eq!(FieldType::Bool.width(1), 1);
        assert_eq!(FieldType::Short.width(1), 2);
        assert_eq!(FieldType::UnsignedShort.width(2), 4);
        assert_eq!(FieldType::Int.width(3), 12);
        assert_eq!(FieldType::Float.width(1), 4);
        assert_eq!(FieldType::UnsignedLongLong.width(1), 8);
        assert_eq!(FieldType::Double.width(2), 16);
        // The count of a string is its buffer length
        assert_eq!(FieldType::String.width(10), 10);
        assert_eq!(FieldType::Double.checked_width(usize::MAX / 4), None);
        assert_eq!(FieldType::String.checked_width(usize::MAX), Some(usize::MAX));
    }

    #[test]
    fn string_is_cut_at_first_zero() {
        let raw = [0x68, 0x65, 0x6C, 0x6C, 0x6F, 0x00, 0x01, 0x01];
        assert_eq!(FieldType::String.transform(&raw), b"hello");
        assert_eq!(FieldType::String.transform(b"abcd"), b"abcd");
        assert_eq!(FieldType::String.transform(&[0, 1, 2]), b"");
    }

    #[test]
    fn numbers_are_not_transformed() {
        let raw = [0x00, 0x2A, 0x00, 0x00];
        assert_eq!(FieldType::Int.transform(&raw), &raw);
    }

    #[test]
    fn format_chars() {
        let all = [
            FieldType::Bool,
            FieldType::Char,
            FieldType::UnsignedChar,
            FieldType::Short,
            FieldType::UnsignedShort,
            FieldType::Int,
            FieldType::UnsignedInt,
            FieldType::LongLong,
            FieldType::UnsignedLongLong,
            FieldType::Float,
            FieldType::Double,
            FieldType::String,
        ];
        let chars: String = all.iter().map(|t| t.format_char()).collect();
        assert_eq!(chars, "?bBhHiIqQfds");
    }
}
