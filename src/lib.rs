//! Attribute-driven, layered configuration for Rust services. Describe a
//! record with `#[conf(...)]` attributes, point at a config name, and load.
//!
//! Tagconf fills a struct from config files, environment variables, command
//! line flags and declared defaults. Each field says where its value may come
//! from and what it must satisfy; the reader does the rest.
//!
//! ```ignore
//! #[derive(Config, Default)]
//! struct Service {
//!     #[conf(default = "8080", env = "port", flag = "port", validation = "range:[1, 65535]")]
//!     port: u16,
//!     #[conf(nested)]
//!     db: Database,
//! }
//!
//! #[derive(Config, Default)]
//! struct Database {
//!     #[conf(required)]
//!     url: String,
//! }
//!
//! let service: Service = ConfigReader::new().load()?;
//! ```
//!
//! That call reads `./config.{json,toml,yaml,yml}`, merges `config_dev` and
//! `config_local` over it, lets `APP_PORT` or `--port` win, checks that
//! `db.url` came from somewhere, validates the port range and populates the
//! struct.
//!
//! # Field attributes
//!
//! | Attribute | Meaning |
//! |-----------|---------|
//! | `key = "name"` | Key segment. Defaults to the lower-cased field name. `"-"` skips the field. `"name,squash"` flattens a nested record into its parent. |
//! | `default = "literal"` | Lowest-priority value, parsed like any text value. |
//! | `env = "name"` | Bind `PREFIX_NAME` (upper-cased) to the key. |
//! | `flag = "name"` | Bind `--name` to the key. |
//! | `required` | The key must resolve in some layer. Only `"true"` counts. |
//! | `validation = "rule"` | `in:[a, b, c]` or `range:[lo, hi)` style bounds. |
//! | `nested` / `embed` | The field is a record. `embed` also squashes it. |
//!
//! Private fields and fields keyed `"-"` are never read or written.
//!
//! # Layer precedence
//!
//! ```text
//! flag default          --name default when nothing else is set
//!        ↑ overridden by
//! declared default      #[conf(default = ...)]
//!        ↑ overridden by
//! config files          config.<ext> < config_<env>.<ext> < config_local.<ext>
//!        ↑ overridden by
//! automatic env         PREFIX_SECTION_KEY
//!        ↑ overridden by
//! bound env             #[conf(env = ...)]
//!        ↑ overridden by
//! changed flag          --name value
//! ```
//!
//! The `<env>` layer is named by the `APP_ENV` variable and falls back to
//! `dev`. Missing override layers are skipped; a missing base file is an
//! error. Keys match case-insensitively and empty env values count as unset.
//!
//! # Value conversion
//!
//! Every source may hand over text, so each supported type parses it:
//! integers and floats at their exact width, `bool` in the usual spellings,
//! [`Duration`](std::time::Duration) in Go syntax (`1h30m`, `250ms`) or as
//! the `{secs, nanos}` map serde writes, `Vec<T>` from JSON text or a
//! comma-separated list (`APP_HOSTS=a,b`), and `HashMap<String, T>` from
//! JSON text. Implement [`Setting`]
//! (or derive it on a newtype) to add your own.
//!
//! # Testing
//!
//! [`MemFs`] and a `HashMap<String, String>` environment make the whole
//! pipeline deterministic:
//!
//! ```ignore
//! let fs = MemFs::new();
//! fs.insert("/etc/app/config.yaml", "port: 9000\n");
//! let mut reader = ConfigReader::builder()
//!     .config_paths(vec!["/etc/app".into()])
//!     .filesystem(fs)
//!     .env_source(HashMap::new())
//!     .build();
//! ```
//!
//! # Clap adapter
//!
//! With the `clap` feature (on by default), [`FlagSet::from_arg_matches`]
//! turns a clap parse result into a flag registry.
//!
//! # Error handling
//!
//! All fallible operations return [`ConfigError`]. See the [`error`] module.

extern crate self as tagconf;

pub mod duration;
pub mod error;
pub mod types;

mod bind;
#[cfg(feature = "clap")]
mod cli;
mod defaults;
mod dump;
mod env;
mod file;
mod flags;
mod key;
mod loader;
mod merge;
mod ops;
mod populate;
mod reader;
mod rule;
mod schema;
mod setting;
mod store;
mod validate;
mod value;
mod walk;

#[cfg(test)]
mod fixtures;

pub use defaults::load_defaults;
pub use dump::{DUMP_EXTENSIONS, dump_config};
pub use env::{EnvSource, ProcessEnv};
pub use error::{ConfigError, Result};
pub use file::{FileSystem, MemFs, OsFs};
pub use flags::{Flag, FlagSet};
pub use key::{ResolvedKey, SKIP_KEY, SQUASH, join_key, resolve_key};
pub use loader::{DEFAULT_ENV_SUFFIX, LOCAL_SUFFIX};
pub use ops::{Listing, list_values};
pub use reader::{
    ConfigReader, ConfigReaderBuilder, DEFAULT_CONFIG_NAME, DEFAULT_ENV_NAME, DEFAULT_ENV_PREFIX,
};
pub use rule::{BadLiteral, ValidationRule};
pub use schema::{Config, FieldKind, FieldMut, FieldRef, FieldSchema, Tags};
pub use setting::{DecodeError, Setting, Slot, ValueKind};
pub use store::{LayeredStore, Store};
pub use tagconf_derive::{Config, Setting};
pub use types::Format;
pub use validate::check_rule;
pub use value::{Mapping, Value};
pub use walk::{FieldVisitor, walk, walk_ref};
