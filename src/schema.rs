//! Field declarations and record schemas.
//!
//! A [`Schema`] is the ordered list of named [`FieldDecl`]s that make up a
//! record type's wire layout. Schemas are built once through a
//! [`SchemaBuilder`] and shared as `Arc<Schema>` afterwards; they are never
//! mutated after [`SchemaBuilder::build`].
//!
//! Wire order is declaration order. Every call to
//! [`SchemaBuilder::declare`] (or one of its shorthands) takes the next
//! index from a counter owned by that builder, and `build` sorts the fields
//! by that index. The order in which declarations are attached to names does
//! not matter:
//!
//! ```rust
//! # fn main() -> cstruct::Result<()> {
//! use cstruct::{FieldKind, FieldType, Schema};
//!
//! let mut builder = Schema::builder("Header");
//! let magic = builder.declare(FieldKind::Primitive(FieldType::UnsignedInt), 1)?;
//! let flags = builder.declare(FieldKind::Primitive(FieldType::UnsignedShort), 1)?;
//! builder.field("flags", flags)?.field("magic", magic)?;
//! let schema = builder.build()?;
//!
//! let names: Vec<&str> = schema.names().collect();
//! assert_eq!(names, ["magic", "flags"]);
//! assert_eq!(schema.size(), 6);
//! # Ok(())
//! # }
//! ```

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::options::Endian;
use crate::types::FieldType;

/// What a field holds: a primitive or a nested record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Primitive(FieldType),
    Record(Arc<Schema>),
}

impl From<FieldType> for FieldKind {
    fn from(ty: FieldType) -> Self {
        FieldKind::Primitive(ty)
    }
}

impl From<Arc<Schema>> for FieldKind {
    fn from(schema: Arc<Schema>) -> Self {
        FieldKind::Record(schema)
    }
}

/// One schema entry: a kind, a repeat count and a wire-order index.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    kind: FieldKind,
    count: usize,
    index: usize,
}

impl FieldDecl {
    #[must_use]
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Repeat count, always at least one. For strings this is the buffer length.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Position in the declaring builder's sequence.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The primitive type, `None` for nested records.
    #[must_use]
    pub fn field_type(&self) -> Option<FieldType> {
        match self.kind {
            FieldKind::Primitive(ty) => Some(ty),
            FieldKind::Record(_) => None,
        }
    }

    /// The nested schema, `None` for primitives.
    #[must_use]
    pub fn schema(&self) -> Option<&Arc<Schema>> {
        match &self.kind {
            FieldKind::Record(schema) => Some(schema),
            FieldKind::Primitive(_) => None,
        }
    }

    /// Whether the field holds a bare value rather than an array.
    ///
    /// True for a count of one, and always for strings: their count is a
    /// buffer length, not an arity.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.count == 1 || self.field_type().is_some_and(FieldType::is_string)
    }

    /// Encoded width of the whole field in bytes.
    #[must_use]
    pub fn width(&self) -> usize {
        match &self.kind {
            FieldKind::Primitive(ty) => ty.width(self.count),
            FieldKind::Record(schema) => schema.size() * self.count,
        }
    }
}

/// Ordered, immutable wire layout of one record type.
#[derive(Debug, PartialEq)]
pub struct Schema {
    name: String,
    fields: Vec<(String, FieldDecl)>,
    size: usize,
}

impl Schema {
    /// Start declaring the fields of the record type `name`.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// Record type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in wire order.
    #[must_use]
    pub fn fields(&self) -> &[(String, FieldDecl)] {
        &self.fields
    }

    /// Field names in wire order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.position(name).map(|i| &self.fields[i].1)
    }

    /// Position of a field in wire order.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|(n, _)| n == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Total encoded width in bytes, nested records included.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Layout in `struct` format notation, e.g. `"<i2H8s"`.
    ///
    /// Nested records are expanded inline, once per repetition. The byte
    /// order prefix reflects `endian`.
    #[must_use]
    pub fn format(&self, endian: Endian) -> String {
        let mut out = String::new();
        out.push(endian.format_char());
        self.write_format(&mut out);
        out
    }

    fn write_format(&self, out: &mut String) {
        for (_, decl) in &self.fields {
            match decl.kind() {
                FieldKind::Primitive(ty) => {
                    if decl.count() != 1 {
                        let _ = write!(out, "{}", decl.count());
                    }
                    out.push(ty.format_char());
                }
                FieldKind::Record(schema) => {
                    for _ in 0..decl.count() {
                        schema.write_format(out);
                    }
                }
            }
        }
    }
}

/// Collects the field declarations of one record type.
///
/// The declaration counter is local to the builder, so independently
/// declared schemas never compete for indices.
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    next_index: usize,
    fields: Vec<(String, FieldDecl)>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            next_index: 0,
            fields: Vec::new(),
        }
    }

    /// Create a declaration, assigning it the next index.
    ///
    /// # Errors
    ///
    /// Returns `Error::Schema` if `count` is zero or the field's width
    /// overflows `usize`.
    pub fn declare(&mut self, kind: impl Into<FieldKind>, count: usize) -> Result<FieldDecl> {
        if count == 0 {
            return Err(Error::schema(&self.name, "repeat count must be at least 1"));
        }
        let kind = kind.into();
        let width = match &kind {
            FieldKind::Primitive(ty) => ty.checked_width(count),
            FieldKind::Record(schema) => schema.size().checked_mul(count),
        };
        if width.is_none() {
            return Err(Error::schema(&self.name, "field width overflows usize"));
        }
        let decl = FieldDecl {
            kind,
            count,
            index: self.next_index,
        };
        self.next_index += 1;
        Ok(decl)
    }

    /// Attach a declaration made by this builder to a field name.
    ///
    /// # Errors
    ///
    /// Returns `Error::Schema` if the name is taken or the declaration came
    /// from another builder.
    pub fn field(&mut self, name: impl Into<String>, decl: FieldDecl) -> Result<&mut Self> {
        let name = name.into();
        if self.fields.iter().any(|(n, _)| *n == name) {
            return Err(Error::schema(
                &self.name,
                format!("field `{name}` is declared twice"),
            ));
        }
        if decl.index >= self.next_index || self.fields.iter().any(|(_, d)| d.index == decl.index)
        {
            return Err(Error::schema(
                &self.name,
                format!("declaration of field `{name}` was not made by this builder"),
            ));
        }
        self.fields.push((name, decl));
        Ok(self)
    }

    /// Declare a field and attach it in one step.
    pub fn push(
        &mut self,
        name: impl Into<String>,
        kind: impl Into<FieldKind>,
        count: usize,
    ) -> Result<&mut Self> {
        let decl = self.declare(kind, count)?;
        self.field(name, decl)
    }

    /// Copy the fields of a parent record type ahead of this type's own.
    ///
    /// Inherited fields keep their relative order and take fresh indices
    /// from this builder, so they precede every field declared afterwards.
    pub fn inherit(&mut self, parent: &Schema) -> Result<&mut Self> {
        for (name, decl) in parent.fields() {
            self.push(name.clone(), decl.kind.clone(), decl.count)?;
        }
        Ok(self)
    }

    pub fn bool(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        self.push(name, FieldType::Bool, 1)
    }

    pub fn char(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        self.push(name, FieldType::Char, 1)
    }

    pub fn uchar(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        self.push(name, FieldType::UnsignedChar, 1)
    }

    pub fn short(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        self.push(name, FieldType::Short, 1)
    }

    pub fn ushort(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        self.push(name, FieldType::UnsignedShort, 1)
    }

    pub fn int(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        self.push(name, FieldType::Int, 1)
    }

    pub fn uint(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        self.push(name, FieldType::UnsignedInt, 1)
    }

    pub fn longlong(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        self.push(name, FieldType::LongLong, 1)
    }

    pub fn ulonglong(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        self.push(name, FieldType::UnsignedLongLong, 1)
    }

    pub fn float(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        self.push(name, FieldType::Float, 1)
    }

    pub fn double(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        self.push(name, FieldType::Double, 1)
    }

    /// `count` consecutive values of a primitive type.
    pub fn array(&mut self, name: impl Into<String>, ty: FieldType, count: usize) -> Result<&mut Self> {
        self.push(name, ty, count)
    }

    /// Fixed-length string of `len` bytes.
    pub fn string(&mut self, name: impl Into<String>, len: usize) -> Result<&mut Self> {
        self.push(name, FieldType::String, len)
    }

    /// `count` nested records of type `schema`.
    pub fn record(
        &mut self,
        name: impl Into<String>,
        schema: Arc<Schema>,
        count: usize,
    ) -> Result<&mut Self> {
        self.push(name, schema, count)
    }

    /// Finish the schema.
    ///
    /// Fields are sorted by declaration index and the builder's counter is
    /// reset, leaving the builder empty. Nested records can only refer to
    /// schemas that are already built, so the result is always acyclic.
    ///
    /// # Errors
    ///
    /// Returns `Error::Schema` if the total width overflows `usize`. Nothing
    /// is built on error.
    pub fn build(&mut self) -> Result<Arc<Schema>> {
        let mut fields = std::mem::take(&mut self.fields);
        self.next_index = 0;

        fields.sort_by_key(|(_, decl)| decl.index);
        let size = fields
            .iter()
            .try_fold(0usize, |size, (_, decl)| size.checked_add(decl.width()))
            .ok_or_else(|| Error::schema(&self.name, "schema width overflows usize"))?;
        let schema = Schema {
            name: self.name.clone(),
            fields,
            size,
        };
        debug!(
            schema = %schema.name,
            fields = schema.len(),
            size = schema.size,
            "built record schema"
        );
        Ok(Arc::new(schema))
    }
}
