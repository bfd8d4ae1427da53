//! Decoding the resolved store into a record.

use crate::error::{ConfigError, Result};
use crate::schema::FieldSchema;
use crate::setting::Slot;
use crate::store::Store;
use crate::walk::FieldVisitor;

/// Assigns each leaf the store's effective value for its key. Leaves with no
/// value anywhere keep whatever they held before.
pub(crate) struct Populator<'a, S: Store> {
    store: &'a S,
}

impl<'a, S: Store> Populator<'a, S> {
    pub(crate) fn new(store: &'a S) -> Self {
        Self { store }
    }
}

impl<S: Store> FieldVisitor for Populator<'_, S> {
    fn visit(&mut self, key: &str, _field: &FieldSchema, slot: &mut dyn Slot) -> Result<()> {
        let Some(value) = self.store.get(key) else {
            return Ok(());
        };
        slot.assign(&value).map_err(|source| ConfigError::Decode {
            key: key.to_string(),
            source,
        })
    }
}
