//! Turning field declarations into dotted config keys.

use crate::schema::{FieldKind, FieldSchema};

/// Key text that excludes a field from every phase.
pub const SKIP_KEY: &str = "-";
/// Key modifier that flattens a nested record into its parent.
pub const SQUASH: &str = "squash";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    /// This field's own segment; empty when squashed.
    pub segment: String,
    pub squash: bool,
    pub skip: bool,
}

/// Work out the key segment a field contributes.
///
/// Records embedded anonymously, or keyed with `"<name>,squash"`, contribute an
/// empty segment. An undeclared key falls back to the lower-cased field name.
pub fn resolve_key(field: &FieldSchema) -> ResolvedKey {
    let raw = field.tags.key.unwrap_or("");
    let mut parts = raw.split(',');
    let name = parts.next().unwrap_or("");
    let squash =
        (field.embedded && field.kind == FieldKind::Record) || parts.next() == Some(SQUASH);

    let segment = if squash {
        String::new()
    } else if name.is_empty() {
        field.name.to_lowercase()
    } else {
        name.to_string()
    };
    let skip = segment == SKIP_KEY;

    ResolvedKey {
        segment,
        squash,
        skip,
    }
}

/// Join a parent key and a child segment. Empty parts are dropped.
pub fn join_key(parent: &str, segment: &str) -> String {
    match (parent.is_empty(), segment.is_empty()) {
        (true, _) => segment.to_string(),
        (false, true) => parent.to_string(),
        (false, false) => format!("{parent}.{segment}"),
    }
}
