//! A minimal string-valued flag registry.
//!
//! Fields carrying a `flag` attribute are bound to entries of a [`FlagSet`].
//! A flag only overrides file and env values once it has been explicitly set
//! (by [`FlagSet::set`], or by a clap parse through `FlagSet::from_arg_matches`);
//! until then its non-empty default acts as the lowest layer.

use std::collections::BTreeMap;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    name: String,
    usage: String,
    default: String,
    value: Option<String>,
}

impl Flag {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn default_value(&self) -> &str {
        &self.default
    }

    /// The set value, or the default if the flag was never set.
    pub fn value(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.default)
    }

    pub fn is_changed(&self) -> bool {
        self.value.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    flags: BTreeMap<String, Flag>,
}

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a flag. Redefining an existing name keeps the first definition.
    pub fn define(
        &mut self,
        name: impl Into<String>,
        default: impl Into<String>,
        usage: impl Into<String>,
    ) -> &Flag {
        let name = name.into();
        self.flags.entry(name.clone()).or_insert_with(|| Flag {
            name,
            usage: usage.into(),
            default: default.into(),
            value: None,
        })
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let flag = self
            .flags
            .get_mut(name)
            .ok_or_else(|| ConfigError::UnknownFlag(name.to_string()))?;
        flag.value = Some(value.into());
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Flag> {
        self.flags.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.values()
    }
}
