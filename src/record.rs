//! Record instances: one value slot per declared field.

use std::io::{Cursor, Read, Write};
use std::sync::Arc;

use crate::codec;
use crate::error::{Error, Result};
use crate::hook::{NoopHook, ReadHook};
use crate::options::CodecOptions;
use crate::schema::Schema;
use crate::value::Value;

/// A live record conforming to a [`Schema`].
///
/// Values are populated by assignment ([`set`](Record::set),
/// [`set_field`](Record::set_field)) or by decoding
/// ([`read`](Record::read)), and serialized with [`write`](Record::write).
/// The codec keeps no reference to a record after a call returns.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: Arc<Schema>,
    values: Vec<Option<Value>>,
}

impl Record {
    /// An empty record: every field unset.
    #[must_use]
    pub fn new(schema: Arc<Schema>) -> Self {
        let values = vec![None; schema.len()];
        Self { schema, values }
    }

    /// Decode a new record from `reader`.
    pub fn from_reader<R: Read + ?Sized>(
        schema: Arc<Schema>,
        reader: &mut R,
        options: impl Into<CodecOptions>,
    ) -> Result<Self> {
        let mut record = Self::new(schema);
        record.read(reader, options)?;
        Ok(record)
    }

    /// Decode a new record from a buffer holding exactly one record.
    ///
    /// # Errors
    ///
    /// `Error::ShortRead` if the buffer is too short, `Error::TrailingBytes`
    /// if it is longer than the schema.
    pub fn from_bytes(
        schema: Arc<Schema>,
        bytes: impl AsRef<[u8]>,
        options: impl Into<CodecOptions>,
    ) -> Result<Self> {
        let bytes = bytes.as_ref();
        if bytes.len() > schema.size() {
            return Err(Error::TrailingBytes {
                schema: schema.name().to_owned(),
                expected: schema.size(),
                actual: bytes.len(),
            });
        }
        Self::from_reader(schema, &mut Cursor::new(bytes), options)
    }

    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Assign values positionally, in wire order.
    ///
    /// Fewer values than fields leaves the remaining fields untouched.
    ///
    /// # Errors
    ///
    /// Returns `Error::TooManyValues` (and assigns nothing) if there are more
    /// values than fields.
    pub fn set<I, V>(&mut self, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.len() > self.values.len() {
            return Err(Error::TooManyValues {
                schema: self.schema.name().to_owned(),
                expected: self.values.len(),
                actual: values.len(),
            });
        }
        for (slot, value) in self.values.iter_mut().zip(values) {
            *slot = Some(value);
        }
        Ok(self)
    }

    /// Assign one field by name.
    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let position = self.position(name)?;
        self.values[position] = Some(value.into());
        Ok(self)
    }

    /// Builder-style [`set_field`](Record::set_field).
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Result<Self> {
        self.set_field(name, value)?;
        Ok(self)
    }

    /// Value of a field, `None` if unknown or unset.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema
            .position(name)
            .and_then(|position| self.values[position].as_ref())
    }

    /// Value of a field.
    ///
    /// # Errors
    ///
    /// `Error::UnknownField` or `Error::MissingValue`.
    pub fn value(&self, name: &str) -> Result<&Value> {
        let position = self.position(name)?;
        self.values[position]
            .as_ref()
            .ok_or_else(|| Error::MissingValue {
                field: name.to_owned(),
            })
    }

    /// Remove and return a field's value.
    pub fn take(&mut self, name: &str) -> Result<Option<Value>> {
        let position = self.position(name)?;
        Ok(self.values[position].take())
    }

    /// Fields and their values in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.schema.names().zip(self.values.iter().map(Option::as_ref))
    }

    /// Whether every field has a value.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }

    /// Decode this record in place from `reader`.
    pub fn read<R: Read + ?Sized>(
        &mut self,
        reader: &mut R,
        options: impl Into<CodecOptions>,
    ) -> Result<&mut Self> {
        self.read_with(reader, options, &mut NoopHook)
    }

    /// Decode this record in place, calling `hook` before every field.
    ///
    /// On error the record is left partially populated.
    pub fn read_with<R, H>(
        &mut self,
        reader: &mut R,
        options: impl Into<CodecOptions>,
        hook: &mut H,
    ) -> Result<&mut Self>
    where
        R: Read + ?Sized,
        H: ReadHook + ?Sized,
    {
        let mut endian = options.into().endian;
        codec::read_record(self, reader, &mut endian, hook, 0)?;
        Ok(self)
    }

    /// Encode this record into `writer`.
    ///
    /// Exactly [`Schema::size`] bytes are written on success, and nothing
    /// on error.
    pub fn write<W: Write + ?Sized>(&self, writer: &mut W, options: impl Into<CodecOptions>) -> Result<()> {
        codec::write_record(self, writer, &options.into())
    }

    /// Encode this record into a new buffer.
    pub fn to_bytes(&self, options: impl Into<CodecOptions>) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.schema.size());
        codec::encode_record(self, &mut buf, &options.into())?;
        Ok(buf)
    }

    pub(crate) fn value_at(&self, position: usize) -> Option<&Value> {
        self.values.get(position).and_then(Option::as_ref)
    }

    pub(crate) fn put(&mut self, position: usize, value: Value) {
        self.values[position] = Some(value);
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.schema.position(name).ok_or_else(|| Error::UnknownField {
            schema: self.schema.name().to_owned(),
            field: name.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Endian;
    use crate::schema::SchemaBuilder;
    use crate::types::FieldType;

    fn schema() -> Arc<Schema> {
        Schema::builder("TestStruct")
            .int("a")
            .and_then(|b| b.array("b", FieldType::UnsignedShort, 2))
            .and_then(SchemaBuilder::build)
            .unwrap()
    }

    #[test]
    fn positional_set() {
        let mut record = Record::new(schema());
        record
            .set([Value::from(42), Value::from(vec![Value::U16(1), Value::U16(2)])])
            .unwrap();
        assert_eq!(record.get("a"), Some(&Value::I32(42)));
        assert!(record.is_complete());
    }

    #[test]
    fn partial_set_and_excess() {
        let mut record = Record::new(schema());
        record.set([42]).unwrap();
        assert!(!record.is_complete());
        assert!(matches!(record.value("b"), Err(Error::MissingValue { .. })));

        let err = record.set([1, 2, 3]).unwrap_err();
        assert!(matches!(err, Error::TooManyValues { expected: 2, actual: 3, .. }));
        // nothing assigned on error
        assert_eq!(record.get("a"), Some(&Value::I32(42)));
    }

    #[test]
    fn unknown_fields() {
        let mut record = Record::new(schema());
        assert!(matches!(record.set_field("zzz", 1), Err(Error::UnknownField { .. })));
        assert!(record.get("zzz").is_none());
        assert!(matches!(record.take("zzz"), Err(Error::UnknownField { .. })));
    }

    #[test]
    fn iteration_follows_wire_order() {
        let record = Record::new(schema()).with("b", vec![Value::U16(1), Value::U16(2)]).unwrap();
        let names: Vec<(&str, bool)> = record.iter().map(|(n, v)| (n, v.is_some())).collect();
        assert_eq!(names, [("a", false), ("b", true)]);
    }

    #[test]
    fn from_bytes_checks_length() {
        let bytes = [0x2Au8, 0, 0, 0, 1, 0, 2, 0];
        let record = Record::from_bytes(schema(), bytes, Endian::Little).unwrap();
        assert_eq!(record.to_bytes(Endian::Little).unwrap(), bytes);

        let err = Record::from_bytes(schema(), [0u8; 9], Endian::Little).unwrap_err();
        assert!(matches!(err, Error::TrailingBytes { expected: 8, actual: 9, .. }));
        let err = Record::from_bytes(schema(), [0u8; 7], Endian::Little).unwrap_err();
        assert!(err.is_short_read());
    }

    #[test]
    fn take_unsets() {
        let mut record = Record::new(schema());
        record.set_field("a", 7).unwrap();
        assert_eq!(record.take("a").unwrap(), Some(Value::I32(7)));
        assert_eq!(record.get("a"), None);
    }
}
