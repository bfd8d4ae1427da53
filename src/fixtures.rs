#[cfg(test)]
pub mod test {
    use std::collections::{BTreeMap, HashMap};
    use std::io::Read;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    use serde::Serialize;

    use crate::error::{ConfigError, Result};
    use crate::file::MemFs;
    use crate::flags::Flag;
    use crate::store::{LayeredStore, Store};
    use crate::types::Format;
    use crate::value::Value;
    use crate::{Config, Setting};

    pub fn env(vars: &[(&str, &str)]) -> HashMap<String, String> {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    pub fn memory_store(fs: &MemFs, vars: &HashMap<String, String>) -> LayeredStore {
        LayeredStore::new(Arc::new(fs.clone()), Arc::new(vars.clone()))
    }

    // -- Nesting ----------------------------------------------------------------

    #[derive(Config, Serialize, Debug, Default, PartialEq)]
    pub struct Layered {
        pub name: String,
        #[conf(nested)]
        pub server: Server,
    }

    #[derive(Config, Serialize, Debug, Default, PartialEq)]
    pub struct Server {
        #[conf(default = "localhost")]
        pub host: String,
        #[conf(default = "8080")]
        pub port: u16,
        #[conf(nested)]
        pub tls: Tls,
    }

    #[derive(Config, Serialize, Debug, Default, PartialEq)]
    pub struct Tls {
        pub cert: String,
    }

    // -- Squashing --------------------------------------------------------------

    #[derive(Config, Debug, Default)]
    pub struct Base {
        pub k: String,
        #[conf(default = "kv")]
        pub kk: String,
    }

    #[derive(Config, Debug, Default)]
    pub struct Extra {
        pub sq: String,
    }

    #[derive(Config, Debug, Default)]
    pub struct Embedding {
        #[conf(embed)]
        pub base: Base,
        #[conf(key = "extra,squash")]
        pub extra: Extra,
        pub own: String,
    }

    // -- Fields that are never walked -------------------------------------------

    #[derive(Config, Debug, Default)]
    pub struct Hidden {
        pub visible: String,
        #[allow(dead_code)]
        hidden: String,
        #[conf(key = "-")]
        pub internal: String,
    }

    #[derive(Config, Debug, Default)]
    pub struct Guarded {
        pub visible: String,
        #[conf(key = "-", required, validation = "in:[never]")]
        pub scratch: String,
    }

    #[derive(Config, Debug, Default)]
    pub struct Credentials {
        #[conf(required)]
        pub token: String,
    }

    #[derive(Config, Debug, Default)]
    pub struct Client {
        #[conf(embed)]
        pub credentials: Credentials,
        pub endpoint: String,
    }

    // -- Source bindings --------------------------------------------------------

    #[derive(Config, Debug, Default)]
    pub struct Sourced {
        #[conf(default = "v", env = "k", flag = "kflag")]
        pub k: String,
        #[conf(nested)]
        pub nested: Listen,
    }

    #[derive(Config, Debug, Default)]
    pub struct Listen {
        #[conf(default = "8080", flag = "port")]
        pub port: u16,
    }

    #[derive(Config, Debug, Default)]
    pub struct Duplicated {
        pub k: String,
        #[conf(key = "k")]
        pub other: String,
    }

    /// A small service record exercising every source and both rule kinds.
    #[derive(Config, Serialize, Debug, Default)]
    pub struct Service {
        #[conf(default = "localhost")]
        pub host: String,
        #[conf(default = "8080", env = "port", flag = "port")]
        pub port: u16,
        #[conf(default = "5s", validation = "range:[1s, 1m]")]
        pub timeout: Duration,
        #[conf(default = "dev", validation = "in:[dev, prod]")]
        pub mode: String,
    }

    #[derive(Config, Debug, Default)]
    pub struct Required {
        #[conf(nested)]
        pub db: Database,
    }

    #[derive(Config, Debug, Default)]
    pub struct Database {
        #[conf(required)]
        pub url: String,
        #[conf(required = "fasle")]
        pub user: String,
    }

    #[derive(Config, Debug, Default)]
    pub struct Lists {
        #[conf(flag = "names")]
        pub names: Vec<String>,
        pub ports: Vec<u16>,
    }

    // -- Every supported kind ---------------------------------------------------

    #[derive(Setting, Debug, Default, PartialEq)]
    pub struct Alias(pub i32);

    #[derive(Config, Debug, Default)]
    pub struct AllKinds {
        #[conf(default = "true")]
        pub flag: bool,
        #[conf(default = "-8")]
        pub i8: i8,
        #[conf(default = "-333")]
        pub i16: i16,
        #[conf(default = "-32")]
        pub i32: i32,
        #[conf(default = "-64")]
        pub i64: i64,
        #[conf(default = "8")]
        pub u8: u8,
        #[conf(default = "16")]
        pub u16: u16,
        #[conf(default = "32")]
        pub u32: u32,
        #[conf(default = "64")]
        pub u64: u64,
        #[conf(default = "1.32")]
        pub f32: f32,
        #[conf(default = "2.64")]
        pub f64: f64,
        #[conf(default = "hello")]
        pub text: String,
        #[conf(default = "86400s")]
        pub dur: Duration,
        #[conf(default = "-7")]
        pub alias: Alias,
        #[conf(default = r#"["s1","s2"]"#)]
        pub list: Vec<String>,
        #[conf(default = r#"{"k1":1}"#)]
        pub map: HashMap<String, i32>,
    }

    #[derive(Config, Debug, Default)]
    pub struct BadDefault {
        #[conf(default = "lots")]
        pub count: u8,
    }

    // -- A store that records what it was asked to do -----------------------------

    #[derive(Debug, Default)]
    pub struct RecordingStore {
        pub calls: Vec<String>,
        pub values: BTreeMap<String, Value>,
    }

    impl Store for RecordingStore {
        fn get(&self, key: &str) -> Option<Value> {
            self.values.get(key).cloned()
        }

        fn set_default(&mut self, key: &str, value: Value) {
            self.calls.push(format!("default {key}={value}"));
        }

        fn bind_env(&mut self, key: &str, name: &str) -> Result<()> {
            self.calls.push(format!("env {key}={name}"));
            Ok(())
        }

        fn bind_flag(&mut self, key: &str, flag: &Flag) -> Result<()> {
            self.calls.push(format!("flag {key}=--{}", flag.name()));
            Ok(())
        }

        fn add_config_path(&mut self, path: &Path) {
            self.calls.push(format!("path {}", path.display()));
        }

        fn read_named(&mut self, name: &str) -> Result<PathBuf> {
            self.calls.push(format!("read {name}"));
            Ok(PathBuf::from(name))
        }

        fn merge_named(&mut self, name: &str) -> Result<PathBuf> {
            self.calls.push(format!("merge {name}"));
            Err(ConfigError::FileNotFound {
                name: name.to_string(),
                paths: Vec::new(),
            })
        }

        fn read_from(&mut self, reader: &mut dyn Read, format: Format) -> Result<()> {
            let mut content = String::new();
            reader
                .read_to_string(&mut content)
                .map_err(|source| ConfigError::IoError {
                    path: PathBuf::from("<reader>"),
                    source,
                })?;
            self.values = format.parse(&content, Path::new("<reader>"))?;
            self.calls.push("read reader".to_string());
            Ok(())
        }
    }
}
