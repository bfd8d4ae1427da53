//! Depth-first traversal of config records.
//!
//! Every phase (binding, validation, population, defaults) is a
//! [`FieldVisitor`] driven by [`walk`]. Fields are visited in declaration
//! order; nested records are entered recursively and only leaves reach the
//! visitor.

use crate::error::Result;
use crate::key::{join_key, resolve_key};
use crate::schema::{Config, FieldMut, FieldRef, FieldSchema};
use crate::setting::Slot;

pub trait FieldVisitor {
    fn visit(&mut self, key: &str, field: &FieldSchema, slot: &mut dyn Slot) -> Result<()>;
}

impl<F> FieldVisitor for F
where
    F: FnMut(&str, &FieldSchema, &mut dyn Slot) -> Result<()>,
{
    fn visit(&mut self, key: &str, field: &FieldSchema, slot: &mut dyn Slot) -> Result<()> {
        self(key, field, slot)
    }
}

/// The full key of a field under `root`, or `None` if the field is not walked.
fn field_key(root: &str, field: &FieldSchema) -> Option<String> {
    if !field.exported {
        return None;
    }
    let resolved = resolve_key(field);
    if resolved.skip {
        return None;
    }
    Some(join_key(root, &resolved.segment))
}

/// Visit every leaf of `record`, stopping at the first error.
pub fn walk(root: &str, record: &mut dyn Config, visitor: &mut dyn FieldVisitor) -> Result<()> {
    for (index, field) in record.fields().iter().enumerate() {
        let Some(key) = field_key(root, field) else {
            continue;
        };
        match record.field_mut(index) {
            Some(FieldMut::Record(child)) => walk(&key, child, visitor)?,
            Some(FieldMut::Leaf(slot)) => visitor.visit(&key, field, slot)?,
            None => {}
        }
    }
    Ok(())
}

/// Read-only counterpart of [`walk`].
pub fn walk_ref(root: &str, record: &dyn Config, visit: &mut dyn FnMut(&str, &FieldSchema, &dyn Slot)) {
    for (index, field) in record.fields().iter().enumerate() {
        let Some(key) = field_key(root, field) else {
            continue;
        };
        match record.field_ref(index) {
            Some(FieldRef::Record(child)) => walk_ref(&key, child, visit),
            Some(FieldRef::Leaf(slot)) => visit(&key, field, slot),
            None => {}
        }
    }
}
