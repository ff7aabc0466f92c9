//! Declare the layout of fixed-format binary records field by field, then read byte streams into
//! records and write records back to bytes (inspired by Python's `struct` library).
//!
//!
//! # Installation
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! cstruct = "0.1"
//! ```
//!
//! # Examples
//!
//! A schema is built once, in declaration order, and shared by every record of that type:
//!
//! ```rust
//! # fn foo() -> cstruct::Result<()> {
//! use cstruct::{Endian, FieldType, Record, Schema, Value};
//!
//! // One `i32` and two `u16`
//! let schema = Schema::builder("TestStruct")
//!     .int("a")?
//!     .array("b", FieldType::UnsignedShort, 2)?
//!     .build()?;
//! assert_eq!(schema.format(Endian::Little), "<i2H");
//!
//! let mut record = Record::new(schema.clone());
//! record.set([Value::from(42), Value::from(vec![Value::U16(1), Value::U16(2)])])?;
//! let buf = record.to_bytes(Endian::Little)?;
//! assert_eq!(buf, vec![0x2A, 0, 0, 0, 1, 0, 2, 0]);
//!
//! let decoded = Record::from_bytes(schema, &buf, Endian::Little)?;
//! assert_eq!(decoded, record);
//! # Ok(())
//! # }
//! # fn main() {
//!     # foo().unwrap();
//! # }
//! ```
//!
//! Plain structs can declare their layout at compile time with `#[derive(Struct)]`
//! (enabled by the default `derive` feature). Field order is wire order:
//!
//! ```rust
//! # #[cfg(feature = "derive")]
//! # fn foo() -> cstruct::Result<()> {
//! use cstruct::{Endian, Struct};
//!
//! #[derive(Debug, PartialEq, Struct)]
//! struct Header {
//!     magic: u32,
//!     flags: [u8; 2],
//!     #[cstruct(string = 8)]
//!     name: String,
//! }
//!
//! let header = Header { magic: 0xCAFE_F00D, flags: [1, 2], name: "demo".into() };
//! let buf = header.to_bytes(Endian::Big)?;
//! assert_eq!(buf, b"\xCA\xFE\xF0\x0D\x01\x02demo\0\0\0\0");
//! assert_eq!(Header::from_bytes(&buf, Endian::Big)?, header);
//! # Ok(())
//! # }
//! # fn main() {
//!     # #[cfg(feature = "derive")]
//!     # foo().unwrap();
//! # }
//! ```
//!
//! It's useful to use `read` and `write` with types that implement `Read` or `Write`, such as
//! files or sockets.
//!
//! # Byte Order
//!
//! Byte order is an explicit argument of every read and write; little-endian is the default.
//!
//! Value                |   Endianness
//! -----                |   ----------
//! `Endian::Little`     |   little-endian
//! `Endian::Big`        |   big-endian
//! `Endian::NATIVE`     |   native (target endian)
//! `Endian::NETWORK`    |   network (= big-endian)
//!
//! A [`ReadHook`] may change the byte order between two fields of the same read; the change
//! applies to every following field, nested records included.
//!
//! # Field Types
//!
//! Type                 |   Value           |   Format
//! ----                 |   -----           |   ------
//! `Bool`               |   `bool`          |   '?'
//! `Char`               |   `i8`            |   'b'
//! `UnsignedChar`       |   `u8`            |   'B'
//! `Short`              |   `i16`           |   'h'
//! `UnsignedShort`      |   `u16`           |   'H'
//! `Int`                |   `i32`           |   'i'
//! `UnsignedInt`        |   `u32`           |   'I'
//! `LongLong`           |   `i64`           |   'q'
//! `UnsignedLongLong`   |   `u64`           |   'Q'
//! `Float`              |   `f32`           |   'f'
//! `Double`             |   `f64`           |   'd'
//! `String`             |   `Vec<u8>`       |   's'
//!
//! * Any field may be declared with a repeat count. A count of one holds a bare value; a larger
//! count holds a `Value::Array` of exactly that many values.
//! * The repeat count of a `String` is its buffer length, and a string always holds a single
//! `Value::Bytes`. On read the buffer is cut at its first zero byte. On write a shorter value
//! is zero padded (or rejected with `StringMode::Exact`).
//! * A field may hold a nested record; a repeat count of N holds N independent records.
//! * There is no alignment or padding between fields. A record always encodes to exactly
//! `Schema::size()` bytes.
//! * Reading past the end of the input is `Error::ShortRead`; nothing is zero filled.

mod codec;
mod error;
mod hook;
mod options;
mod record;
mod schema;
mod typed;
mod types;
mod value;

pub use error::{Error, Result};
pub use hook::{hook_fn, FieldRef, FnHook, NoopHook, ReadHook};
pub use options::{CodecOptions, Endian, StringMode};
pub use record::Record;
pub use schema::{FieldDecl, FieldKind, Schema, SchemaBuilder};
pub use typed::{Element, Field, Struct, Text};
#[doc(hidden)]
pub use typed::{derived_schema, DeclareFn};
pub use types::FieldType;
pub use value::Value;

#[cfg(feature = "derive")]
#[doc(hidden)]
pub use cstruct_macro_impl::Struct;
