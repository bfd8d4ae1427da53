use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::bind::{FlagDeclarer, SourceBinder};
use crate::dump;
use crate::env::{EnvSource, ProcessEnv, env_key};
use crate::error::{ConfigError, Result};
use crate::file::{FileSystem, OsFs};
use crate::flags::FlagSet;
use crate::loader::{LoadPlan, load_layers};
use crate::populate::Populator;
use crate::schema::Config;
use crate::store::{LayeredStore, Store};
use crate::types::Format;
use crate::validate::Validator;
use crate::walk::walk;

pub const DEFAULT_CONFIG_NAME: &str = "config";
pub const DEFAULT_ENV_PREFIX: &str = "APP";
pub const DEFAULT_ENV_NAME: &str = "APP_ENV";

fn default_paths() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}

/// Point `plan` at an explicit file: its directory is moved to the front of
/// the search paths (ahead of paths added earlier) and its stem becomes the
/// config name.
fn apply_config_file(plan: &mut LoadPlan, path: &Path) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        plan.config_name = stem.to_string();
    }
    plan.config_paths.retain(|p| p != dir);
    plan.config_paths.insert(0, dir.to_path_buf());
}

/// Builder for a [`ConfigReader`].
///
/// Every setting has a default, so `ConfigReader::builder().build()` reads
/// `./config.{json,toml,yaml,yml}`, merges `config_dev` and `config_local`
/// over it, and consults `APP_*` environment variables.
pub struct ConfigReaderBuilder {
    config_name: Option<String>,
    config_paths: Option<Vec<PathBuf>>,
    config_file: Option<PathBuf>,
    allow_merge: bool,
    env_name: Option<String>,
    env_prefix: Option<String>,
    automatic_env: bool,
    fs: Option<Arc<dyn FileSystem>>,
    env: Option<Arc<dyn EnvSource>>,
    flags: Option<FlagSet>,
}

impl Default for ConfigReaderBuilder {
    fn default() -> Self {
        Self {
            config_name: None,
            config_paths: None,
            config_file: None,
            allow_merge: true,
            env_name: None,
            env_prefix: None,
            automatic_env: true,
            fs: None,
            env: None,
            flags: None,
        }
    }
}

impl ConfigReaderBuilder {
    /// Read a specific file: sets the config name from its stem and searches
    /// its directory before any other path.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Base file name without extension (default: `"config"`).
    pub fn config_name(mut self, name: &str) -> Self {
        self.config_name = Some(name.to_string());
        self
    }

    /// Replace the search paths entirely (default: `["."]`).
    pub fn config_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.config_paths = Some(paths);
        self
    }

    /// Append a search path. Earlier paths are searched first.
    pub fn add_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_paths
            .get_or_insert_with(default_paths)
            .push(path.into());
        self
    }

    /// Append the platform config directory for `app_name` (XDG on Linux,
    /// `~/Library/Application Support` on macOS). Skipped if there is none.
    pub fn add_platform_path(self, app_name: &str) -> Self {
        match directories::ProjectDirs::from("", "", app_name) {
            Some(dirs) => self.add_config_path(dirs.config_dir()),
            None => {
                log::warn!("no platform config directory for '{app_name}'");
                self
            }
        }
    }

    /// Toggle the `<name>_<env>` and `<name>_local` override layers (default: on).
    pub fn allow_merge(mut self, allow: bool) -> Self {
        self.allow_merge = allow;
        self
    }

    /// The variable naming the override environment (default: `APP_ENV`).
    pub fn env_name(mut self, name: &str) -> Self {
        self.env_name = Some(name.to_string());
        self
    }

    /// Prefix for every environment lookup (default: `APP`).
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Consult `PREFIX_KEY` for every key, not only explicit `env` bindings
    /// (default: on).
    pub fn automatic_env(mut self, enabled: bool) -> Self {
        self.automatic_env = enabled;
        self
    }

    pub fn filesystem(mut self, fs: impl FileSystem + 'static) -> Self {
        self.fs = Some(Arc::new(fs));
        self
    }

    pub fn env_source(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Some(Arc::new(env));
        self
    }

    /// Bind flags against this registry instead of defining them on demand.
    /// Every `flag` attribute must then name a flag already in the set.
    pub fn flag_registry(mut self, flags: FlagSet) -> Self {
        self.flags = Some(flags);
        self
    }

    fn effective_env_name(&self) -> String {
        env_key(self.env_name.as_deref().unwrap_or(DEFAULT_ENV_NAME))
    }

    fn effective_env_prefix(&self) -> String {
        self.env_prefix
            .clone()
            .unwrap_or_else(|| DEFAULT_ENV_PREFIX.to_string())
    }

    fn effective_plan(&self) -> LoadPlan {
        let mut plan = LoadPlan {
            config_name: self
                .config_name
                .clone()
                .unwrap_or_else(|| DEFAULT_CONFIG_NAME.to_string()),
            config_paths: self.config_paths.clone().unwrap_or_else(default_paths),
            allow_merge: self.allow_merge,
            env_name: self.effective_env_name(),
        };
        if let Some(file) = &self.config_file {
            apply_config_file(&mut plan, file);
        }
        plan
    }

    fn effective_fs(&self) -> Arc<dyn FileSystem> {
        self.fs.clone().unwrap_or_else(|| Arc::new(OsFs))
    }

    fn effective_env(&self) -> Arc<dyn EnvSource> {
        self.env.clone().unwrap_or_else(|| Arc::new(ProcessEnv))
    }

    /// Build a reader over a [`LayeredStore`] sharing this builder's
    /// filesystem and environment.
    pub fn build(self) -> ConfigReader<LayeredStore> {
        let mut store = LayeredStore::new(self.effective_fs(), self.effective_env());
        store.set_env_prefix(self.effective_env_prefix());
        store.set_automatic_env(self.automatic_env);
        self.build_with_store(store)
    }

    /// Build a reader over a caller-supplied store. Prefix and automatic-env
    /// settings are the store's own concern and are not applied.
    pub fn build_with_store<S: Store>(self, store: S) -> ConfigReader<S> {
        let plan = self.effective_plan();
        let fs = self.effective_fs();
        let env = self.effective_env();
        let external_flags = self.flags.is_some();
        ConfigReader {
            store,
            plan,
            fs,
            env,
            flags: self.flags.unwrap_or_default(),
            external_flags,
        }
    }
}

/// Loads config records from files, environment, flags and defaults.
///
/// Each load runs four phases over the record:
///
/// 1. **Bind** every field's default, env and flag into the store.
/// 2. **Load** the base file and its override layers.
/// 3. **Check** required fields and validation rules.
/// 4. **Populate** the record from the store.
///
/// Any error stops the load; the record may then be partially filled.
pub struct ConfigReader<S: Store = LayeredStore> {
    store: S,
    plan: LoadPlan,
    fs: Arc<dyn FileSystem>,
    env: Arc<dyn EnvSource>,
    flags: FlagSet,
    external_flags: bool,
}

impl ConfigReader {
    pub fn builder() -> ConfigReaderBuilder {
        ConfigReaderBuilder::default()
    }

    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Log every key the store knows with its effective value.
    pub fn log_settings(&self) {
        for key in self.store.keys() {
            if let Some(value) = self.store.get(&key) {
                log::debug!("{key} = {value}");
            }
        }
    }
}

impl Default for ConfigReader {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Store> ConfigReader<S> {
    /// A reader with default options over `store`.
    pub fn with_store(store: S) -> Self {
        ConfigReaderBuilder::default().build_with_store(store)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> &mut FlagSet {
        &mut self.flags
    }

    pub fn config_name(&self) -> &str {
        &self.plan.config_name
    }

    pub fn config_paths(&self) -> &[PathBuf] {
        &self.plan.config_paths
    }

    pub fn allows_merge(&self) -> bool {
        self.plan.allow_merge
    }

    pub fn env_name(&self) -> &str {
        &self.plan.env_name
    }

    /// Read `path` on the next load. Its directory is searched before every
    /// existing path, not after them, and its stem replaces the config name.
    pub fn set_config_file(&mut self, path: impl AsRef<Path>) {
        apply_config_file(&mut self.plan, path.as_ref());
    }

    pub fn set_config_name(&mut self, name: &str) {
        self.plan.config_name = name.to_string();
    }

    pub fn set_config_paths(&mut self, paths: Vec<PathBuf>) {
        self.plan.config_paths = paths;
    }

    pub fn add_config_path(&mut self, path: impl Into<PathBuf>) {
        self.plan.config_paths.push(path.into());
    }

    pub fn set_allow_merge(&mut self, allow: bool) {
        self.plan.allow_merge = allow;
    }

    pub fn set_env_name(&mut self, name: &str) {
        self.plan.env_name = env_key(name);
    }

    /// Define every flag `config` declares in this reader's registry, so
    /// values can be set on [`ConfigReader::flags_mut`] before loading.
    pub fn declare_flags(&mut self, config: &mut dyn Config) -> Result<()> {
        walk("", config, &mut FlagDeclarer { flags: &mut self.flags })
    }

    /// Run the full pipeline into `config`.
    pub fn load_into(&mut self, config: &mut dyn Config) -> Result<()> {
        self.bind(config)?;
        let loaded = load_layers(&mut self.store, &self.plan, self.env.as_ref())?;
        log::debug!("loaded {} config file(s) for '{}'", loaded.len(), self.plan.config_name);
        self.check_and_populate(config)
    }

    /// Load into a fresh `T::default()`.
    pub fn load<T: Config + Default>(&mut self) -> Result<T> {
        let mut config = T::default();
        self.load_into(&mut config)?;
        Ok(config)
    }

    /// Point the reader at `path` (see [`ConfigReaderBuilder::config_file`])
    /// and load.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>, config: &mut dyn Config) -> Result<()> {
        self.set_config_file(path);
        self.load_into(config)
    }

    /// Load from a document read from `reader` instead of searching for files.
    /// Override layers do not apply.
    pub fn read_config(
        &mut self,
        mut reader: impl Read,
        format: Format,
        config: &mut dyn Config,
    ) -> Result<()> {
        self.bind(config)?;
        self.store.read_from(&mut reader, format)?;
        self.check_and_populate(config)
    }

    /// Load exactly one file, with its format taken from the extension.
    pub fn read_from_file(&mut self, path: impl AsRef<Path>, config: &mut dyn Config) -> Result<()> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let content = self
            .fs
            .read_to_string(path)
            .map_err(|source| ConfigError::IoError {
                path: path.to_path_buf(),
                source,
            })?;
        self.read_config(content.as_bytes(), format, config)
    }

    /// Write `config` to a new file through this reader's filesystem.
    /// See [`dump_config`](crate::dump_config).
    pub fn dump_config<T: Serialize + ?Sized>(
        &self,
        path: impl AsRef<Path>,
        config: Option<&T>,
    ) -> Result<()> {
        dump::dump_config(self.fs.as_ref(), path.as_ref(), config)
    }

    fn bind(&mut self, config: &mut dyn Config) -> Result<()> {
        log::debug!("binding sources for '{}'", self.plan.config_name);
        let mut binder = SourceBinder::new(&mut self.store, &mut self.flags, self.external_flags);
        walk("", config, &mut binder)
    }

    fn check_and_populate(&mut self, config: &mut dyn Config) -> Result<()> {
        walk("", config, &mut Validator::new(&self.store))?;
        walk("", config, &mut Populator::new(&self.store))?;
        log::debug!("populated '{}'", self.plan.config_name);
        Ok(())
    }
}
