//! Byte order and codec configuration.

use std::fmt;

/// Byte order applied to every multi-byte primitive of a read or write.
///
/// Character   |   Endianness
/// ---------   |   ----------
/// '<'         |   little-endian
/// '>'         |   big-endian
///
/// Little-endian is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Endian {
    /// Least significant byte first
    #[default]
    Little,
    /// Most significant byte first
    Big,
}

impl Endian {
    /// Byte order of the target platform.
    pub const NATIVE: Endian = if cfg!(target_endian = "little") {
        Endian::Little
    } else {
        Endian::Big
    };

    /// Network byte order (= big-endian).
    pub const NETWORK: Endian = Endian::Big;

    /// The `struct` format prefix for this byte order.
    #[must_use]
    pub fn format_char(self) -> char {
        match self {
            Endian::Little => '<',
            Endian::Big => '>',
        }
    }
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endian::Little => f.write_str("little-endian"),
            Endian::Big => f.write_str("big-endian"),
        }
    }
}

/// How a fixed-length string value is checked when encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringMode {
    /// A value shorter than the buffer is zero padded; longer is rejected
    #[default]
    Padded,
    /// The value must fill the buffer exactly
    Exact,
}

/// Options for a single read or write call.
///
/// Every read/write takes `impl Into<CodecOptions>`, so a bare [`Endian`]
/// can be passed when the other defaults are fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodecOptions {
    /// Byte order at the start of the call
    pub endian: Endian,
    /// String length policy on encode
    pub strings: StringMode,
}

impl CodecOptions {
    /// Default options: little-endian, padded strings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the byte order.
    #[must_use]
    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    /// Replace the string policy.
    #[must_use]
    pub fn with_strings(mut self, strings: StringMode) -> Self {
        self.strings = strings;
        self
    }
}

impl From<Endian> for CodecOptions {
    fn from(endian: Endian) -> Self {
        CodecOptions::default().with_endian(endian)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = CodecOptions::default();
        assert_eq!(options.endian, Endian::Little);
        assert_eq!(options.strings, StringMode::Padded);
        assert_eq!(Endian::NETWORK, Endian::Big);
    }

    #[test]
    fn native_endian() {
        if cfg!(target_endian = "little") {
            assert_eq!(Endian::NATIVE, Endian::Little);
        } else {
            assert_eq!(Endian::NATIVE, Endian::Big);
        }
    }

    #[test]
    fn from_endian() {
        let options: CodecOptions = Endian::Big.into();
        assert_eq!(options.endian, Endian::Big);
        assert_eq!(options.strings, StringMode::Padded);
        assert_eq!(
            options.with_strings(StringMode::Exact).strings,
            StringMode::Exact
        );
    }
}
