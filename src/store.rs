//! The key/value store that sources are bound into and values are read from.
//!
//! [`Store`] is the seam between the record-walking phases and wherever
//! values actually live. [`LayeredStore`] is the standard implementation:
//!
//! ```text
//! explicitly set flag          highest
//! bound env var (PREFIX_NAME)
//! automatic env (PREFIX_KEY)
//! config file tree
//! registered default
//! non-empty flag default       lowest
//! ```
//!
//! Keys are case-insensitive. Empty environment variables count as unset.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::env::{EnvSource, ProcessEnv, env_var_name};
use crate::error::{ConfigError, Result};
use crate::file::{FileSystem, OsFs, find_config_file, load_document};
use crate::flags::Flag;
use crate::merge::deep_merge;
use crate::setting::Setting;
use crate::types::Format;
use crate::value::{Mapping, Value, leaf_keys, lookup};

pub trait Store {
    /// The effective value for `key`, or `None` if no layer provides one.
    fn get(&self, key: &str) -> Option<Value>;

    fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Decode the effective value for `key` into `T`.
    fn get_as<T: Setting>(&self, key: &str) -> Result<Option<T>>
    where
        Self: Sized,
    {
        self.get(key)
            .map(|value| {
                T::decode(&value).map_err(|source| ConfigError::Decode {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    fn get_string(&self, key: &str) -> Result<Option<String>>
    where
        Self: Sized,
    {
        self.get_as(key)
    }

    fn get_i64(&self, key: &str) -> Result<Option<i64>>
    where
        Self: Sized,
    {
        self.get_as(key)
    }

    fn get_u64(&self, key: &str) -> Result<Option<u64>>
    where
        Self: Sized,
    {
        self.get_as(key)
    }

    fn get_f64(&self, key: &str) -> Result<Option<f64>>
    where
        Self: Sized,
    {
        self.get_as(key)
    }

    fn get_bool(&self, key: &str) -> Result<Option<bool>>
    where
        Self: Sized,
    {
        self.get_as(key)
    }

    fn get_duration(&self, key: &str) -> Result<Option<Duration>>
    where
        Self: Sized,
    {
        self.get_as(key)
    }

    fn set_default(&mut self, key: &str, value: Value);

    /// Bind `key` to an environment variable. `name` is un-prefixed; the
    /// store applies its own prefix.
    fn bind_env(&mut self, key: &str, name: &str) -> Result<()>;

    fn bind_flag(&mut self, key: &str, flag: &Flag) -> Result<()>;

    fn add_config_path(&mut self, path: &Path);

    /// Replace the file tree with the file named `name` found on the search
    /// paths. Returns the path read.
    fn read_named(&mut self, name: &str) -> Result<PathBuf>;

    /// Merge the file named `name` over the current file tree.
    fn merge_named(&mut self, name: &str) -> Result<PathBuf>;

    /// Replace the file tree with a document read from `reader`.
    fn read_from(&mut self, reader: &mut dyn Read, format: Format) -> Result<()>;
}

pub struct LayeredStore {
    fs: Arc<dyn FileSystem>,
    env: Arc<dyn EnvSource>,
    env_prefix: String,
    automatic_env: bool,
    config_paths: Vec<PathBuf>,
    tree: Mapping,
    defaults: BTreeMap<String, Value>,
    env_bindings: BTreeMap<String, String>,
    flag_bindings: BTreeMap<String, Flag>,
}

impl Default for LayeredStore {
    fn default() -> Self {
        Self::new(Arc::new(OsFs), Arc::new(ProcessEnv))
    }
}

impl LayeredStore {
    pub fn new(fs: Arc<dyn FileSystem>, env: Arc<dyn EnvSource>) -> Self {
        Self {
            fs,
            env,
            env_prefix: crate::reader::DEFAULT_ENV_PREFIX.to_string(),
            automatic_env: true,
            config_paths: Vec::new(),
            tree: Mapping::new(),
            defaults: BTreeMap::new(),
            env_bindings: BTreeMap::new(),
            flag_bindings: BTreeMap::new(),
        }
    }

    pub fn set_env_prefix(&mut self, prefix: impl Into<String>) {
        self.env_prefix = prefix.into();
    }

    pub fn env_prefix(&self) -> &str {
        &self.env_prefix
    }

    /// Consult `PREFIX_KEY` for every key, bound or not.
    pub fn set_automatic_env(&mut self, enabled: bool) {
        self.automatic_env = enabled;
    }

    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    /// The loaded file tree.
    pub fn tree(&self) -> &Mapping {
        &self.tree
    }

    /// Every key known to the store: file leaves, defaults and bindings.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = leaf_keys(&self.tree)
            .into_iter()
            .map(|k| k.to_lowercase())
            .chain(self.defaults.keys().cloned())
            .chain(self.env_bindings.keys().cloned())
            .chain(self.flag_bindings.keys().cloned())
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// Drop everything loaded or bound, keeping filesystem, env and prefix.
    pub fn reset(&mut self) {
        self.config_paths.clear();
        self.tree.clear();
        self.defaults.clear();
        self.env_bindings.clear();
        self.flag_bindings.clear();
    }

    fn env_value(&self, name: &str) -> Option<String> {
        self.env.var(name).filter(|v| !v.is_empty())
    }

    fn locate(&self, name: &str) -> Result<PathBuf> {
        find_config_file(self.fs.as_ref(), &self.config_paths, name).ok_or_else(|| {
            ConfigError::FileNotFound {
                name: name.to_string(),
                paths: self.config_paths.clone(),
            }
        })
    }
}

fn require_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(ConfigError::InvalidBinding {
            key: key.to_string(),
            reason: "empty key".into(),
        });
    }
    Ok(())
}

impl Store for LayeredStore {
    fn get(&self, key: &str) -> Option<Value> {
        let key = key.to_lowercase();

        if let Some(flag) = self.flag_bindings.get(&key)
            && flag.is_changed()
        {
            return Some(Value::String(flag.value().to_string()));
        }
        if let Some(name) = self.env_bindings.get(&key)
            && let Some(value) = self.env_value(name)
        {
            return Some(Value::String(value));
        }
        if self.automatic_env
            && let Some(value) = self.env_value(&env_var_name(&self.env_prefix, &key))
        {
            return Some(Value::String(value));
        }
        if let Some(value) = lookup(&self.tree, &key).filter(|v| !v.is_null()) {
            return Some(value.clone());
        }
        if let Some(value) = self.defaults.get(&key) {
            return Some(value.clone());
        }
        self.flag_bindings
            .get(&key)
            .filter(|flag| !flag.default_value().is_empty())
            .map(|flag| Value::String(flag.default_value().to_string()))
    }

    fn set_default(&mut self, key: &str, value: Value) {
        self.defaults.insert(key.to_lowercase(), value);
    }

    fn bind_env(&mut self, key: &str, name: &str) -> Result<()> {
        require_key(key)?;
        if name.is_empty() {
            return Err(ConfigError::InvalidBinding {
                key: key.to_string(),
                reason: "empty environment variable name".into(),
            });
        }
        let var = env_var_name(&self.env_prefix, name);
        log::trace!("binding '{key}' to env var {var}");
        self.env_bindings.insert(key.to_lowercase(), var);
        Ok(())
    }

    fn bind_flag(&mut self, key: &str, flag: &Flag) -> Result<()> {
        require_key(key)?;
        log::trace!("binding '{key}' to flag --{}", flag.name());
        self.flag_bindings.insert(key.to_lowercase(), flag.clone());
        Ok(())
    }

    fn add_config_path(&mut self, path: &Path) {
        if !self.config_paths.iter().any(|p| p == path) {
            self.config_paths.push(path.to_path_buf());
        }
    }

    fn read_named(&mut self, name: &str) -> Result<PathBuf> {
        let path = self.locate(name)?;
        self.tree = load_document(self.fs.as_ref(), &path)?;
        log::debug!("read config file {}", path.display());
        Ok(path)
    }

    fn merge_named(&mut self, name: &str) -> Result<PathBuf> {
        let path = self.locate(name)?;
        let overlay = load_document(self.fs.as_ref(), &path)?;
        self.tree = deep_merge(std::mem::take(&mut self.tree), overlay);
        log::debug!("merged config file {}", path.display());
        Ok(path)
    }

    fn read_from(&mut self, reader: &mut dyn Read, format: Format) -> Result<()> {
        let origin = PathBuf::from("<reader>");
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|source| ConfigError::IoError {
                path: origin.clone(),
                source,
            })?;
        self.tree = format.parse(&content, &origin)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::MemFs;
    use crate::fixtures::test::env;
    use crate::flags::FlagSet;

    fn store_with(fs: &MemFs, vars: &[(&str, &str)]) -> LayeredStore {
        let mut store = LayeredStore::new(Arc::new(fs.clone()), Arc::new(env(vars)));
        store.add_config_path(Path::new("/etc/app"));
        store
    }

    fn flag(set: &mut FlagSet, name: &str, default: &str) -> Flag {
        set.define(name, default, "").clone()
    }

    #[test]
    fn file_value_decodes() {
        let fs = MemFs::new();
        fs.insert("/etc/app/config.yaml", "server:\n  port: 80\n");
        let mut store = store_with(&fs, &[]);
        store.read_named("config").unwrap();
        assert_eq!(store.get_u64("server.port").unwrap(), Some(80));
        assert_eq!(store.get_string("server.port").unwrap().as_deref(), Some("80"));
        assert_eq!(store.get("server.missing"), None);
    }

    #[test]
    fn precedence_flag_env_file_default() {
        let fs = MemFs::new();
        fs.insert("/etc/app/config.json", r#"{"k": "file"}"#);
        let mut flags = FlagSet::new();
        let f = flag(&mut flags, "k", "flagdefault");

        let mut store = store_with(&fs, &[("APP_K", "env")]);
        store.set_default("k", Value::from("default"));
        store.read_named("config").unwrap();
        store.bind_env("k", "K").unwrap();
        store.bind_flag("k", &f).unwrap();
        assert_eq!(store.get("k"), Some(Value::from("env")));

        flags.set("k", "flag").unwrap();
        store.bind_flag("k", flags.lookup("k").unwrap()).unwrap();
        assert_eq!(store.get("k"), Some(Value::from("flag")));
    }

    #[test]
    fn file_beats_default_and_flag_default() {
        let fs = MemFs::new();
        fs.insert("/etc/app/config.json", r#"{"k": "file"}"#);
        let mut flags = FlagSet::new();
        let mut store = store_with(&fs, &[]);
        store.bind_flag("k", &flag(&mut flags, "k", "fd")).unwrap();
        store.set_default("k", Value::from("default"));
        assert_eq!(store.get("k"), Some(Value::from("default")));
        store.read_named("config").unwrap();
        assert_eq!(store.get("k"), Some(Value::from("file")));
    }

    #[test]
    fn flag_default_is_last_resort() {
        let mut flags = FlagSet::new();
        let mut store = store_with(&MemFs::new(), &[]);
        store.bind_flag("a", &flag(&mut flags, "a", "fd")).unwrap();
        store.bind_flag("b", &flag(&mut flags, "b", "")).unwrap();
        assert_eq!(store.get("a"), Some(Value::from("fd")));
        assert_eq!(store.get("b"), None);
    }

    #[test]
    fn empty_env_is_unset() {
        let mut store = store_with(&MemFs::new(), &[("APP_K", "")]);
        store.set_default("k", Value::from("default"));
        store.bind_env("k", "K").unwrap();
        assert_eq!(store.get("k"), Some(Value::from("default")));
    }

    #[test]
    fn explicit_env_binding_is_prefixed() {
        let mut store = store_with(&MemFs::new(), &[("APP_DB_URL", "pg://")]);
        store.set_automatic_env(false);
        store.bind_env("database.url", "DB_URL").unwrap();
        assert_eq!(store.get_string("database.url").unwrap().as_deref(), Some("pg://"));
    }

    #[test]
    fn automatic_env_uses_key_path() {
        let mut store = store_with(&MemFs::new(), &[("APP_DATABASE_URL", "pg://")]);
        assert_eq!(store.get("database.url"), Some(Value::from("pg://")));
        store.set_automatic_env(false);
        assert_eq!(store.get("database.url"), None);
    }

    #[test]
    fn keys_are_case_insensitive() {
        let fs = MemFs::new();
        fs.insert("/etc/app/config.json", r#"{"Server": {"Port": 80}}"#);
        let mut store = store_with(&fs, &[]);
        store.read_named("config").unwrap();
        store.set_default("Timeout", Value::from("1s"));
        assert_eq!(store.get_i64("server.port").unwrap(), Some(80));
        assert_eq!(
            store.get_duration("timeout").unwrap(),
            Some(Duration::from_secs(1))
        );
    }

    #[test]
    fn missing_named_file_is_distinct_error() {
        let mut store = store_with(&MemFs::new(), &[]);
        let err = store.read_named("config").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { name, .. } if name == "config"));
    }

    #[test]
    fn merge_named_overlays_tree() {
        let fs = MemFs::new();
        fs.insert("/etc/app/config.json", r#"{"a": 1, "b": {"c": 2, "d": 3}}"#);
        fs.insert("/etc/app/config_dev.yaml", "b:\n  c: 20\n");
        let mut store = store_with(&fs, &[]);
        store.read_named("config").unwrap();
        store.merge_named("config_dev").unwrap();
        assert_eq!(store.get_i64("a").unwrap(), Some(1));
        assert_eq!(store.get_i64("b.c").unwrap(), Some(20));
        assert_eq!(store.get_i64("b.d").unwrap(), Some(3));
    }

    #[test]
    fn read_from_reader() {
        let mut store = store_with(&MemFs::new(), &[]);
        let mut input = "k = \"v\"\n".as_bytes();
        store.read_from(&mut input, Format::Toml).unwrap();
        assert_eq!(store.get("k"), Some(Value::from("v")));
    }

    #[test]
    fn decode_error_names_key() {
        let mut store = store_with(&MemFs::new(), &[]);
        store.set_default("port", Value::from("eighty"));
        let err = store.get_u64("port").unwrap_err();
        assert!(err.to_string().contains("'port'"), "got: {err}");
    }

    #[test]
    fn empty_bindings_rejected() {
        let mut store = store_with(&MemFs::new(), &[]);
        assert!(matches!(
            store.bind_env("", "X"),
            Err(ConfigError::InvalidBinding { .. })
        ));
        assert!(matches!(
            store.bind_env("k", ""),
            Err(ConfigError::InvalidBinding { .. })
        ));
    }

    #[test]
    fn config_paths_deduplicated() {
        let mut store = store_with(&MemFs::new(), &[]);
        store.add_config_path(Path::new("/etc/app"));
        assert_eq!(store.config_paths(), &[PathBuf::from("/etc/app")]);
    }

    #[test]
    fn keys_and_reset() {
        let fs = MemFs::new();
        fs.insert("/etc/app/config.json", r#"{"a": {"b": 1}}"#);
        let mut store = store_with(&fs, &[]);
        store.read_named("config").unwrap();
        store.set_default("z", Value::from("1"));
        assert_eq!(store.keys(), vec!["a.b", "z"]);
        store.reset();
        assert!(store.keys().is_empty());
        assert!(store.config_paths().is_empty());
    }
}
