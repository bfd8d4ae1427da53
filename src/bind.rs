//! Binding a record's declared sources into a [`Store`].

use std::collections::HashSet;

use crate::error::{ConfigError, Result};
use crate::flags::{Flag, FlagSet};
use crate::schema::FieldSchema;
use crate::setting::Slot;
use crate::store::Store;
use crate::value::Value;
use crate::walk::FieldVisitor;

/// Registers defaults, env bindings and flag bindings for each leaf, in that
/// order. Two leaves resolving to the same key are rejected.
pub(crate) struct SourceBinder<'a, S: Store> {
    store: &'a mut S,
    flags: &'a mut FlagSet,
    /// When the flag registry was supplied by the caller, flags must already
    /// exist in it. Otherwise they are defined on demand.
    external_flags: bool,
    seen: HashSet<String>,
}

impl<'a, S: Store> SourceBinder<'a, S> {
    pub(crate) fn new(store: &'a mut S, flags: &'a mut FlagSet, external_flags: bool) -> Self {
        Self {
            store,
            flags,
            external_flags,
            seen: HashSet::new(),
        }
    }

    fn resolve_flag(&mut self, key: &str, name: &str) -> Result<Flag> {
        if !self.external_flags {
            self.flags.define(name, "", name);
        }
        self.flags
            .lookup(name)
            .cloned()
            .ok_or_else(|| ConfigError::FlagNotDefined {
                key: key.to_string(),
                flag: name.to_string(),
            })
    }
}

impl<S: Store> FieldVisitor for SourceBinder<'_, S> {
    fn visit(&mut self, key: &str, field: &FieldSchema, _slot: &mut dyn Slot) -> Result<()> {
        if !self.seen.insert(key.to_lowercase()) {
            return Err(ConfigError::DuplicateKey(key.to_string()));
        }

        if let Some(default) = field.tags.default.filter(|d| !d.is_empty()) {
            self.store.set_default(key, Value::String(default.to_string()));
        }
        if let Some(env) = field.tags.env.filter(|e| !e.is_empty()) {
            self.store.bind_env(key, &env.to_uppercase())?;
        }
        if let Some(name) = field.tags.flag.filter(|f| !f.is_empty()) {
            let flag = self.resolve_flag(key, name)?;
            self.store.bind_flag(key, &flag)?;
        }
        Ok(())
    }
}

/// Defines every flag a record declares, so arguments can be parsed before
/// loading.
pub(crate) struct FlagDeclarer<'a> {
    pub(crate) flags: &'a mut FlagSet,
}

impl FieldVisitor for FlagDeclarer<'_> {
    fn visit(&mut self, _key: &str, field: &FieldSchema, _slot: &mut dyn Slot) -> Result<()> {
        if let Some(name) = field.tags.flag.filter(|f| !f.is_empty()) {
            self.flags.define(name, "", name);
        }
        Ok(())
    }
}
