//! Listing a populated record's values.

use std::fmt;

use crate::schema::{Config, FieldSchema};
use crate::setting::Slot;
use crate::value::Value;
use crate::walk::walk_ref;

/// Every walked key of a record with its current value, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub entries: Vec<(String, Value)>,
}

impl Listing {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{key}: {value}")?;
        }
        Ok(())
    }
}

/// Collect the current value of every leaf in `config`.
pub fn list_values(config: &dyn Config) -> Listing {
    let mut entries = Vec::new();
    walk_ref("", config, &mut |key: &str, _: &FieldSchema, slot: &dyn Slot| {
        entries.push((key.to_string(), slot.current()));
    });
    Listing { entries }
}
