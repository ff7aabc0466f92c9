//! Customization point invoked before each field is decoded.

use crate::error::Result;
use crate::options::Endian;
use crate::schema::{FieldDecl, Schema};

/// The field about to be decoded.
#[derive(Debug, Clone, Copy)]
pub struct FieldRef<'a> {
    /// Schema that declares the field
    pub schema: &'a Schema,
    /// Field name
    pub name: &'a str,
    /// Field declaration
    pub decl: &'a FieldDecl,
    /// Nesting level, zero for the top-level record
    pub depth: usize,
}

/// Called once before every field of a read, nested records included.
///
/// The hook value carries whatever external state a format needs. It may
/// change the byte order; the change applies from the field about to be
/// decoded onwards, for the rest of the call.
pub trait ReadHook {
    /// # Errors
    ///
    /// Any error aborts the read.
    fn before_field(&mut self, field: &FieldRef<'_>, endian: &mut Endian) -> Result<()>;
}

/// Hook that does nothing, used by [`Record::read`](crate::Record::read).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl ReadHook for NoopHook {
    fn before_field(&mut self, _field: &FieldRef<'_>, _endian: &mut Endian) -> Result<()> {
        Ok(())
    }
}

/// Hook backed by a closure, see [`hook_fn`].
#[derive(Debug, Clone, Copy)]
pub struct FnHook<F>(F);

/// Wrap a closure as a [`ReadHook`].
pub fn hook_fn<F>(f: F) -> FnHook<F>
where
    F: FnMut(&FieldRef<'_>, &mut Endian) -> Result<()>,
{
    FnHook(f)
}

impl<F> ReadHook for FnHook<F>
where
    F: FnMut(&FieldRef<'_>, &mut Endian) -> Result<()>,
{
    fn before_field(&mut self, field: &FieldRef<'_>, endian: &mut Endian) -> Result<()> {
        (self.0)(field, endian)
    }
}
