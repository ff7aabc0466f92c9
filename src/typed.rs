//! Plain Rust structs as records.
//!
//! [`Struct`] is normally implemented with `#[derive(Struct)]`; [`Field`]
//! maps each Rust field type onto a declaration and a [`Value`].

use std::any::type_name;
use std::cell::RefCell;
use std::io::{Read, Write};
use std::sync::{Arc, OnceLock};

use crate::error::{Error, Result};
use crate::options::CodecOptions;
use crate::record::Record;
use crate::schema::{Schema, SchemaBuilder};
use crate::types::FieldType;
use crate::value::Value;

/// A Rust type with a fixed record layout.
pub trait Struct: Sized {
    /// The type's schema, built on first use.
    fn schema() -> Result<Arc<Schema>>;

    /// Copy the fields into a dynamic [`Record`].
    fn to_record(&self) -> Result<Record>;

    /// Build the type from a fully populated [`Record`].
    fn from_record(record: &Record) -> Result<Self>;

    /// Decode one value from `reader`.
    fn read_from<R: Read + ?Sized>(reader: &mut R, options: impl Into<CodecOptions>) -> Result<Self> {
        let record = Record::from_reader(Self::schema()?, reader, options)?;
        Self::from_record(&record)
    }

    /// Encode into `writer`.
    fn write_to<W: Write + ?Sized>(&self, writer: &mut W, options: impl Into<CodecOptions>) -> Result<()> {
        self.to_record()?.write(writer, options)
    }

    /// Decode from a buffer holding exactly one value.
    fn from_bytes(bytes: impl AsRef<[u8]>, options: impl Into<CodecOptions>) -> Result<Self> {
        let record = Record::from_bytes(Self::schema()?, bytes, options)?;
        Self::from_record(&record)
    }

    fn to_bytes(&self, options: impl Into<CodecOptions>) -> Result<Vec<u8>> {
        self.to_record()?.to_bytes(options)
    }
}

/// A Rust type usable as a field of a [`Struct`].
pub trait Field: Sized {
    /// Declare a field of this type, repeated `count` times.
    fn declare(builder: &mut SchemaBuilder, name: &str, count: usize) -> Result<()>;

    fn to_value(&self) -> Result<Value>;

    fn from_value(field: &str, value: &Value) -> Result<Self>;
}

/// Types that can be repeated as `[T; N]`: primitives and derived structs.
pub trait Element: Field {}

/// Types that can hold a fixed-length string field (`#[cstruct(string = N)]`).
pub trait Text: Sized {
    fn to_text(&self) -> Value;

    fn from_text(field: &str, value: &Value) -> Result<Self>;
}

/// Declares one field of a derived type under the given name.
#[doc(hidden)]
pub type DeclareFn = fn(&mut SchemaBuilder, &str) -> Result<()>;

thread_local! {
    // Derived types whose schema is being built on this thread, innermost
    // last, with the field being declared.
    static BUILDING: RefCell<Vec<(&'static str, &'static str)>> = const { RefCell::new(Vec::new()) };
}

/// Pops the innermost entry of `BUILDING`, also on unwind.
struct Building;

impl Drop for Building {
    fn drop(&mut self) {
        BUILDING.with(|stack| stack.borrow_mut().pop());
    }
}

/// Schema of a derived type, built on first use and cached in `cache`.
///
/// A type that reaches its own schema while declaring its fields is
/// `Error::RecursiveSchema`, and nothing is cached.
#[doc(hidden)]
pub fn derived_schema(
    cache: &OnceLock<Arc<Schema>>,
    name: &'static str,
    fields: &[(&'static str, DeclareFn)],
) -> Result<Arc<Schema>> {
    if let Some(schema) = cache.get() {
        return Ok(Arc::clone(schema));
    }
    let cycle = BUILDING.with(|stack| {
        stack
            .borrow()
            .iter()
            .find(|(building, _)| *building == name)
            .map(|&(_, field)| field)
    });
    if let Some(field) = cycle {
        return Err(Error::RecursiveSchema {
            schema: name.to_owned(),
            field: field.to_owned(),
        });
    }

    BUILDING.with(|stack| stack.borrow_mut().push((name, "")));
    let _building = Building;
    let mut builder = Schema::builder(name);
    for &(field, declare) in fields {
        BUILDING.with(|stack| {
            if let Some(top) = stack.borrow_mut().last_mut() {
                top.1 = field;
            }
        });
        declare(&mut builder, field)?;
    }
    let schema = builder.build()?;
    Ok(Arc::clone(cache.get_or_init(|| schema)))
}

fn convert<T>(field: &str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| Error::Convert {
        field: field.to_owned(),
        expected: type_name::<T>(),
    })
}

macro_rules! integer_field {
    ($($ty:ty => $field_type:ident, $variant:ident;)*) => {
        $(
            impl Field for $ty {
                fn declare(builder: &mut SchemaBuilder, name: &str, count: usize) -> Result<()> {
                    builder.push(name, FieldType::$field_type, count).map(|_| ())
                }

                fn to_value(&self) -> Result<Value> {
                    Ok(Value::$variant(*self))
                }

                fn from_value(field: &str, value: &Value) -> Result<Self> {
                    convert(field, value.as_i128().and_then(|v| <$ty>::try_from(v).ok()))
                }
            }

            impl Element for $ty {}
        )*
    };
}

integer_field! {
    i8 => Char, I8;
    u8 => UnsignedChar, U8;
    i16 => Short, I16;
    u16 => UnsignedShort, U16;
    i32 => Int, I32;
    u32 => UnsignedInt, U32;
    i64 => LongLong, I64;
    u64 => UnsignedLongLong, U64;
}

impl Field for bool {
    fn declare(builder: &mut SchemaBuilder, name: &str, count: usize) -> Result<()> {
        builder.push(name, FieldType::Bool, count).map(|_| ())
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Bool(*self))
    }

    fn from_value(field: &str, value: &Value) -> Result<Self> {
        convert(field, value.as_bool())
    }
}

impl Element for bool {}

impl Field for f32 {
    fn declare(builder: &mut SchemaBuilder, name: &str, count: usize) -> Result<()> {
        builder.push(name, FieldType::Float, count).map(|_| ())
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::F32(*self))
    }

    fn from_value(field: &str, value: &Value) -> Result<Self> {
        let v = match *value {
            Value::F32(v) => Some(v),
            #[allow(clippy::cast_possible_truncation)]
            Value::F64(v) => Some(v as f32).filter(|n| !(v.is_finite() && n.is_infinite())),
            _ => None,
        };
        convert(field, v)
    }
}

impl Element for f32 {}

impl Field for f64 {
    fn declare(builder: &mut SchemaBuilder, name: &str, count: usize) -> Result<()> {
        builder.push(name, FieldType::Double, count).map(|_| ())
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::F64(*self))
    }

    fn from_value(field: &str, value: &Value) -> Result<Self> {
        convert(field, value.as_f64())
    }
}

impl Element for f64 {}

impl<T: Element, const N: usize> Field for [T; N] {
    fn declare(builder: &mut SchemaBuilder, name: &str, _count: usize) -> Result<()> {
        T::declare(builder, name, N)
    }

    fn to_value(&self) -> Result<Value> {
        if N == 1 {
            return self[0].to_value();
        }
        let items = self.iter().map(Field::to_value).collect::<Result<Vec<_>>>()?;
        Ok(Value::Array(items))
    }

    fn from_value(field: &str, value: &Value) -> Result<Self> {
        let items: Vec<T> = match value {
            // A count of one is stored as a bare value
            single if N == 1 => vec![T::from_value(field, single)?],
            Value::Array(items) if items.len() == N => items
                .iter()
                .map(|item| T::from_value(field, item))
                .collect::<Result<_>>()?,
            _ => return convert(field, None),
        };
        convert(field, items.try_into().ok())
    }
}

impl Text for Vec<u8> {
    fn to_text(&self) -> Value {
        Value::Bytes(self.clone())
    }

    fn from_text(field: &str, value: &Value) -> Result<Self> {
        convert(field, value.as_bytes().map(<[u8]>::to_vec))
    }
}

impl Text for String {
    fn to_text(&self) -> Value {
        Value::Bytes(self.as_bytes().to_vec())
    }

    fn from_text(field: &str, value: &Value) -> Result<Self> {
        convert(field, value.as_str().map(str::to_owned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_convert_when_in_range() {
        assert_eq!(u8::from_value("a", &Value::I32(200)).unwrap(), 200);
        assert!(matches!(
            u8::from_value("a", &Value::I32(300)),
            Err(Error::Convert { expected: "u8", .. })
        ));
        assert!(i32::from_value("a", &Value::Bool(true)).is_err());
    }

    #[test]
    fn arrays_of_one_are_bare() {
        let one = [7u16];
        assert_eq!(one.to_value().unwrap(), Value::U16(7));
        assert_eq!(<[u16; 1]>::from_value("a", &Value::U16(7)).unwrap(), [7]);

        let two = [1u16, 2];
        let value = two.to_value().unwrap();
        assert_eq!(value, Value::Array(vec![Value::U16(1), Value::U16(2)]));
        assert_eq!(<[u16; 2]>::from_value("a", &value).unwrap(), two);
        assert!(<[u16; 3]>::from_value("a", &value).is_err());
    }

    #[test]
    fn arrays_declare_their_length() {
        let mut builder = Schema::builder("Arrays");
        <[i32; 3]>::declare(&mut builder, "a", 1).unwrap();
        let schema = builder.build().unwrap();
        assert_eq!(schema.field("a").map(|d| d.count()), Some(3));
        assert_eq!(schema.size(), 12);
    }

    #[test]
    fn f32_rejects_out_of_range_f64() {
        assert_eq!(f32::from_value("a", &Value::F64(0.5)).unwrap(), 0.5);
        assert_eq!(f32::from_value("a", &Value::F64(f64::INFINITY)).unwrap(), f32::INFINITY);
        assert!(matches!(
            f32::from_value("a", &Value::F64(1.0e300)),
            Err(Error::Convert { ref field, expected: "f32" }) if field == "a"
        ));
    }

    #[test]
    fn derived_schema_is_cached() {
        static CACHE: OnceLock<Arc<Schema>> = OnceLock::new();
        let fields: [(&'static str, DeclareFn); 2] = [
            ("a", |b: &mut SchemaBuilder, n: &str| b.int(n).map(|_| ())),
            ("b", |b: &mut SchemaBuilder, n: &str| b.string(n, 4).map(|_| ())),
        ];
        let first = derived_schema(&CACHE, "Cached", &fields).unwrap();
        let second = derived_schema(&CACHE, "Cached", &[]).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.size(), 8);
    }

    #[test]
    fn derived_schema_detects_self_reference() {
        static CACHE: OnceLock<Arc<Schema>> = OnceLock::new();

        fn declare_value(builder: &mut SchemaBuilder, name: &str) -> Result<()> {
            builder.uchar(name).map(|_| ())
        }

        fn declare_self(builder: &mut SchemaBuilder, name: &str) -> Result<()> {
            let fields: [(&'static str, DeclareFn); 2] =
                [("value", declare_value), ("next", declare_self)];
            let schema = derived_schema(&CACHE, "Loop", &fields)?;
            builder.record(name, schema, 1).map(|_| ())
        }

        let mut builder = Schema::builder("Outer");
        let err = declare_self(&mut builder, "inner").unwrap_err();
        assert!(matches!(
            err,
            Error::RecursiveSchema { ref schema, ref field } if schema == "Loop" && field == "next"
        ));
        assert!(CACHE.get().is_none());
        BUILDING.with(|stack| assert!(stack.borrow().is_empty()));
    }

    #[test]
    fn text() {
        assert_eq!(String::from_text("s", &Value::from("abc")).unwrap(), "abc");
        assert!(String::from_text("s", &Value::Bytes(vec![0xFF])).is_err());
        assert_eq!(Vec::<u8>::from_text("s", &Value::Bytes(vec![0xFF])).unwrap(), [0xFF]);
        assert_eq!("hi".to_owned().to_text(), Value::from("hi"));
    }
}
