//! Runtime description of a config record, generated by `#[derive(Config)]`.

use crate::setting::Slot;

/// The six attribute values a field may declare.
///
/// Unset attributes are `None`. Values are kept verbatim; the key modifier
/// (`"name,squash"`) is interpreted by [`resolve_key`](crate::resolve_key).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tags {
    pub key: Option<&'static str>,
    pub default: Option<&'static str>,
    pub flag: Option<&'static str>,
    pub env: Option<&'static str>,
    pub required: Option<&'static str>,
    pub validation: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A typed setting, reachable as a [`Slot`].
    Leaf,
    /// A nested record, walked recursively.
    Record,
    /// Declared but never accessed (private or skipped fields).
    Opaque,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub tags: Tags,
    pub kind: FieldKind,
    /// The field embeds its record anonymously; it is squashed into the parent.
    pub embedded: bool,
    pub exported: bool,
}

impl FieldSchema {
    /// Only the exact text `"true"` marks a field required.
    pub fn is_required(&self) -> bool {
        self.tags.required == Some("true")
    }
}

pub enum FieldMut<'a> {
    Leaf(&'a mut dyn Slot),
    Record(&'a mut dyn Config),
}

pub enum FieldRef<'a> {
    Leaf(&'a dyn Slot),
    Record(&'a dyn Config),
}

/// A record whose fields can be bound, loaded and validated.
///
/// Implemented by `#[derive(Config)]`; indices passed to [`field_mut`] and
/// [`field_ref`] refer to positions in [`fields`]. Opaque fields return `None`.
///
/// [`field_mut`]: Config::field_mut
/// [`field_ref`]: Config::field_ref
/// [`fields`]: Config::fields
pub trait Config {
    fn fields(&self) -> &'static [FieldSchema];
    fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_>>;
    fn field_ref(&self, index: usize) -> Option<FieldRef<'_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(required: Option<&'static str>) -> FieldSchema {
        FieldSchema {
            name: "port",
            tags: Tags {
                required,
                ..Tags::default()
            },
            kind: FieldKind::Leaf,
            embedded: false,
            exported: true,
        }
    }

    #[test]
    fn required_needs_exact_true() {
        assert!(field(Some("true")).is_required());
        assert!(!field(Some("True")).is_required());
        assert!(!field(Some("fasle")).is_required());
        assert!(!field(None).is_required());
    }
}
