//! Clap adapter for tagconf.
//!
//! Compiled only with the `clap` Cargo feature (on by default). It turns a
//! clap parse result into a [`FlagSet`], which a
//! [`ConfigReaderBuilder::flag_registry`](crate::ConfigReaderBuilder::flag_registry)
//! then binds against. Nothing else in the crate depends on clap.
//!
//! ```ignore
//! #[derive(Parser)]
//! struct Cli {
//!     #[arg(long)]
//!     port: Option<u16>,
//! }
//!
//! let matches = Cli::command().get_matches();
//! let flags = FlagSet::from_arg_matches(&matches)?;
//! let mut reader = ConfigReader::builder().flag_registry(flags).build();
//! ```

use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::error::{ConfigError, Result};
use crate::flags::FlagSet;

impl FlagSet {
    /// Build a registry from every top-level argument clap saw.
    ///
    /// Values clap filled in from `default_value` become flag defaults, so a
    /// config file still overrides them. Values from the command line (or
    /// clap's own `env` support) count as changed. Multi-valued arguments are
    /// recorded as a JSON array.
    pub fn from_arg_matches(matches: &ArgMatches) -> Result<FlagSet> {
        let mut flags = FlagSet::new();
        for id in matches.ids() {
            let name = id.as_str();
            let Ok(Some(raw)) = matches.try_get_raw(name) else {
                continue;
            };
            let values: Vec<String> = raw.map(|v| v.to_string_lossy().into_owned()).collect();
            let value = match values.as_slice() {
                [single] => single.clone(),
                _ => serde_json::to_string(&values)
                    .map_err(|e| ConfigError::SerializeError(e.to_string()))?,
            };

            if matches.value_source(name) == Some(ValueSource::DefaultValue) {
                flags.define(name, value, "");
            } else {
                flags.define(name, "", "");
                flags.set(name, value)?;
            }
        }
        Ok(flags)
    }
}
