//! Reading the base config file and its override layers into a store.
//!
//! For a config name `config` the layers are, lowest to highest:
//!
//! ```text
//! config.<ext>           mandatory
//! config_<env>.<ext>     <env> from the env-name variable, "dev" when unset
//! config_local.<ext>
//! ```
//!
//! Override layers are optional; a missing one is skipped. Any other error
//! from any layer aborts the load.

use std::path::PathBuf;

use crate::env::EnvSource;
use crate::error::{ConfigError, Result};
use crate::store::Store;

/// Suffix used when the env-name variable is unset or empty.
pub const DEFAULT_ENV_SUFFIX: &str = "dev";
pub const LOCAL_SUFFIX: &str = "local";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadPlan {
    pub(crate) config_name: String,
    pub(crate) config_paths: Vec<PathBuf>,
    pub(crate) allow_merge: bool,
    pub(crate) env_name: String,
}

impl LoadPlan {
    /// Names of the override layers, in merge order.
    pub(crate) fn override_names(&self, env: &dyn EnvSource) -> Vec<String> {
        let suffix = env
            .var(&self.env_name)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_ENV_SUFFIX.to_string());
        vec![
            format!("{}_{suffix}", self.config_name),
            format!("{}_{LOCAL_SUFFIX}", self.config_name),
        ]
    }
}

/// Load every layer of `plan` into `store`. Returns the files read, in order.
pub(crate) fn load_layers<S: Store>(
    store: &mut S,
    plan: &LoadPlan,
    env: &dyn EnvSource,
) -> Result<Vec<PathBuf>> {
    for path in &plan.config_paths {
        store.add_config_path(path);
    }

    let mut loaded = vec![store.read_named(&plan.config_name)?];
    if !plan.allow_merge {
        return Ok(loaded);
    }

    for name in plan.override_names(env) {
        match store.merge_named(&name) {
            Ok(path) => loaded.push(path),
            Err(ConfigError::FileNotFound { .. }) => {
                log::debug!("no '{name}' override layer found; skipping");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(loaded)
}
