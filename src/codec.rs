//! The record codec: decodes byte streams into records and back.
//!
//! Fields are processed one at a time in wire order. Primitive fields are
//! read as exactly `width` bytes and decoded element by element with
//! `byteorder`; nested records recurse with the same reader/writer and byte
//! order.

use std::io::{Cursor, Read, Write};
use std::sync::Arc;

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use tracing::trace;

use crate::error::{Error, Result};
use crate::hook::{FieldRef, ReadHook};
use crate::options::{CodecOptions, Endian, StringMode};
use crate::record::Record;
use crate::schema::{FieldDecl, FieldKind};
use crate::types::FieldType;
use crate::value::Value;

/// Decode every field of `record` from `reader`.
///
/// `endian` is read again for each field, after the hook ran, so a hook
/// can switch byte order between fields.
pub(crate) fn read_record<R, H>(
    record: &mut Record,
    reader: &mut R,
    endian: &mut Endian,
    hook: &mut H,
    depth: usize,
) -> Result<()>
where
    R: Read + ?Sized,
    H: ReadHook + ?Sized,
{
    let schema = Arc::clone(record.schema());
    for (position, (name, decl)) in schema.fields().iter().enumerate() {
        let field = FieldRef {
            schema: &schema,
            name,
            decl,
            depth,
        };
        hook.before_field(&field, endian)?;

        let value = match decl.kind() {
            FieldKind::Record(nested) => {
                let mut items = (0..decl.count())
                    .map(|_| {
                        let mut item = Record::new(Arc::clone(nested));
                        read_record(&mut item, &mut *reader, &mut *endian, &mut *hook, depth + 1)?;
                        Ok(Value::Record(item))
                    })
                    .collect::<Result<Vec<_>>>()?;
                if decl.is_scalar() {
                    items.swap_remove(0)
                } else {
                    Value::Array(items)
                }
            }
            FieldKind::Primitive(ty) => {
                let raw = read_field(reader, name, decl.width())?;
                trace!(field = %name, width = raw.len(), %endian, "decoding field");
                decode_primitive(*ty, decl, &raw, *endian)?
            }
        };
        record.put(position, value);
    }
    Ok(())
}

/// Read exactly `width` bytes, reporting how many arrived on a short read.
///
/// The buffer grows with the input rather than the declared width.
fn read_field<R: Read + ?Sized>(reader: &mut R, field: &str, width: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    // `read_to_end` retries `Interrupted`
    (&mut *reader).take(width as u64).read_to_end(&mut buf)?;
    if buf.len() < width {
        return Err(Error::ShortRead {
            field: field.to_owned(),
            expected: width,
            actual: buf.len(),
        });
    }
    Ok(buf)
}

fn decode_primitive(ty: FieldType, decl: &FieldDecl, raw: &[u8], endian: Endian) -> Result<Value> {
    if ty.is_string() {
        return Ok(Value::Bytes(ty.transform(raw).to_vec()));
    }

    let mut rdr = Cursor::new(raw);
    let mut values = (0..decl.count())
        .map(|_| match endian {
            Endian::Little => decode_element::<LittleEndian>(ty, &mut rdr),
            Endian::Big => decode_element::<BigEndian>(ty, &mut rdr),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(if decl.is_scalar() {
        values.swap_remove(0)
    } else {
        Value::Array(values)
    })
}

fn decode_element<B: ByteOrder>(ty: FieldType, rdr: &mut Cursor<&[u8]>) -> Result<Value> {
    Ok(match ty {
        FieldType::Bool => Value::Bool(rdr.read_u8()? != 0), // 0 is false
        FieldType::Char => Value::I8(rdr.read_i8()?),
        FieldType::UnsignedChar => Value::U8(rdr.read_u8()?),
        FieldType::Short => Value::I16(rdr.read_i16::<B>()?),
        FieldType::UnsignedShort => Value::U16(rdr.read_u16::<B>()?),
        FieldType::Int => Value::I32(rdr.read_i32::<B>()?),
        FieldType::UnsignedInt => Value::U32(rdr.read_u32::<B>()?),
        FieldType::LongLong => Value::I64(rdr.read_i64::<B>()?),
        FieldType::UnsignedLongLong => Value::U64(rdr.read_u64::<B>()?),
        FieldType::Float => Value::F32(rdr.read_f32::<B>()?),
        FieldType::Double => Value::F64(rdr.read_f64::<B>()?),
        FieldType::String => Value::Bytes(vec![rdr.read_u8()?]),
    })
}

/// Encode `record` into `writer` with a single write.
///
/// Nothing reaches `writer` unless every field encodes.
pub(crate) fn write_record<W>(record: &Record, writer: &mut W, options: &CodecOptions) -> Result<()>
where
    W: Write + ?Sized,
{
    let mut buf = Vec::with_capacity(record.schema().size());
    encode_record(record, &mut buf, options)?;
    writer.write_all(&buf)?;
    Ok(())
}

/// Append every field of `record` to `out`.
pub(crate) fn encode_record(record: &Record, out: &mut Vec<u8>, options: &CodecOptions) -> Result<()> {
    let schema = record.schema();
    for (position, (name, decl)) in schema.fields().iter().enumerate() {
        let value = record
            .value_at(position)
            .ok_or_else(|| Error::MissingValue {
                field: name.clone(),
            })?;

        match decl.kind() {
            FieldKind::Record(nested) => {
                let items = match value {
                    Value::Array(items) => items.as_slice(),
                    other => std::slice::from_ref(other),
                };
                if items.len() != decl.count() {
                    return Err(Error::mismatch(
                        name,
                        format!("expected {} records, got {}", decl.count(), items.len()),
                    ));
                }
                for item in items {
                    match item {
                        Value::Record(inner)
                            if Arc::ptr_eq(inner.schema(), nested) || inner.schema() == nested =>
                        {
                            encode_record(inner, out, options)?;
                        }
                        other => {
                            return Err(Error::mismatch(
                                name,
                                format!("expected a `{}` record, got {}", nested.name(), describe(other)),
                            ))
                        }
                    }
                }
            }
            FieldKind::Primitive(ty) => {
                let buf = match options.endian {
                    Endian::Little => encode_primitive::<LittleEndian>(*ty, name, decl, value, options)?,
                    Endian::Big => encode_primitive::<BigEndian>(*ty, name, decl, value, options)?,
                };
                trace!(field = %name, width = buf.len(), endian = %options.endian, "encoding field");
                out.extend_from_slice(&buf);
            }
        }
    }
    Ok(())
}

fn encode_primitive<B: ByteOrder>(
    ty: FieldType,
    field: &str,
    decl: &FieldDecl,
    value: &Value,
    options: &CodecOptions,
) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(decl.width());
    if ty.is_string() {
        encode_string(field, decl.count(), value, options.strings, &mut buf)?;
        return Ok(buf);
    }

    match value {
        Value::Array(items) if decl.count() > 1 => {
            if items.len() != decl.count() {
                return Err(Error::mismatch(
                    field,
                    format!("expected {} values, got {}", decl.count(), items.len()),
                ));
            }
            for item in items {
                encode_element::<B>(ty, field, item, &mut buf)?;
            }
        }
        Value::Array(items) => {
            return Err(Error::mismatch(
                field,
                format!("expected a single {ty}, got an array of {}", items.len()),
            ))
        }
        scalar if decl.count() > 1 => {
            return Err(Error::mismatch(
                field,
                format!("expected {} values, got a single {}", decl.count(), scalar.kind()),
            ))
        }
        scalar => encode_element::<B>(ty, field, scalar, &mut buf)?,
    }
    Ok(buf)
}

fn encode_string(
    field: &str,
    len: usize,
    value: &Value,
    mode: StringMode,
    buf: &mut Vec<u8>,
) -> Result<()> {
    let bytes = value
        .as_bytes()
        .ok_or_else(|| Error::mismatch(field, format!("expected string, got {}", describe(value))))?;
    let fits = match mode {
        StringMode::Padded => bytes.len() <= len,
        StringMode::Exact => bytes.len() == len,
    };
    if !fits {
        return Err(Error::mismatch(
            field,
            format!("string of {} bytes does not fit a {len}-byte buffer", bytes.len()),
        ));
    }
    buf.extend_from_slice(bytes);
    // The rest of the buffer is filled with zeros
    buf.resize(len, 0);
    Ok(())
}

fn encode_element<B: ByteOrder>(ty: FieldType, field: &str, value: &Value, buf: &mut Vec<u8>) -> Result<()> {
    match ty {
        FieldType::Bool => {
            let v = value.as_bool().ok_or_else(|| wrong_type(field, ty, value))?;
            buf.write_u8(u8::from(v))?;
        }
        FieldType::Char => buf.write_i8(integer(field, ty, value)?)?,
        FieldType::UnsignedChar => buf.write_u8(integer(field, ty, value)?)?,
        FieldType::Short => buf.write_i16::<B>(integer(field, ty, value)?)?,
        FieldType::UnsignedShort => buf.write_u16::<B>(integer(field, ty, value)?)?,
        FieldType::Int => buf.write_i32::<B>(integer(field, ty, value)?)?,
        FieldType::UnsignedInt => buf.write_u32::<B>(integer(field, ty, value)?)?,
        FieldType::LongLong => buf.write_i64::<B>(integer(field, ty, value)?)?,
        FieldType::UnsignedLongLong => buf.write_u64::<B>(integer(field, ty, value)?)?,
        FieldType::Float => {
            let v = value.as_f64().ok_or_else(|| wrong_type(field, ty, value))?;
            #[allow(clippy::cast_possible_truncation)]
            let narrowed = v as f32;
            if v.is_finite() && narrowed.is_infinite() {
                return Err(Error::mismatch(field, format!("{v} is out of range for {ty}")));
            }
            buf.write_f32::<B>(narrowed)?;
        }
        FieldType::Double => {
            let v = value.as_f64().ok_or_else(|| wrong_type(field, ty, value))?;
            buf.write_f64::<B>(v)?;
        }
        FieldType::String => return Err(wrong_type(field, ty, value)),
    }
    Ok(())
}

/// Any integer value converted to the field's width, if it fits.
fn integer<T: TryFrom<i128>>(field: &str, ty: FieldType, value: &Value) -> Result<T> {
    let v = value.as_i128().ok_or_else(|| wrong_type(field, ty, value))?;
    T::try_from(v).map_err(|_| Error::mismatch(field, format!("{v} is out of range for {ty}")))
}

fn wrong_type(field: &str, ty: FieldType, value: &Value) -> Error {
    Error::mismatch(field, format!("expected {ty}, got {}", describe(value)))
}

fn describe(value: &Value) -> String {
    match value {
        Value::Record(record) => format!("a `{}` record", record.schema().name()),
        other => other.kind().to_owned(),
    }
}
