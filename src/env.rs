use std::collections::HashMap;

/// Where environment variables are read from.
///
/// [`ProcessEnv`] reads the real process environment; a `HashMap<String, String>`
/// works as a fixed environment for tests and embedding.
pub trait EnvSource: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Normalize a name for the environment: upper-cased, with `.` replaced by `_`.
pub fn env_key(name: &str) -> String {
    name.replace('.', "_").to_uppercase()
}

/// The variable consulted for `name` under `prefix`, e.g. `APP_DATABASE_URL`
/// for `database.url` under `APP`. An empty prefix adds nothing.
pub fn env_var_name(prefix: &str, name: &str) -> String {
    let name = env_key(name);
    if prefix.is_empty() {
        name
    } else {
        format!("{}_{name}", env_key(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_key() {
        assert_eq!(env_var_name("APP", "host"), "APP_HOST");
    }

    #[test]
    fn nested_key_uses_underscores() {
        assert_eq!(env_var_name("APP", "database.url"), "APP_DATABASE_URL");
    }

    #[test]
    fn prefix_is_normalized() {
        assert_eq!(env_var_name("my.app", "k"), "MY_APP_K");
    }

    #[test]
    fn empty_prefix() {
        assert_eq!(env_var_name("", "k"), "K");
    }

    #[test]
    fn map_source() {
        let env: HashMap<String, String> = [("APP_K".to_string(), "v".to_string())].into();
        assert_eq!(env.var("APP_K").as_deref(), Some("v"));
        assert_eq!(env.var("APP_X"), None);
    }
}
