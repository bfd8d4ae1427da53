//! Configuration records for the tagconf demo application.
//!
//! With the default prefix `APP`, every key is also reachable through the
//! environment:
//!
//! | Env var                   | Config key           |
//! |---------------------------|----------------------|
//! | `APP_NAME`                | `name`               |
//! | `APP_SERVER_HOST`         | `server.host`        |
//! | `APP_PORT` (bound)        | `server.port`        |
//! | `APP_SERVER_TIMEOUT`      | `server.timeout`     |
//! | `APP_DISPLAY_COLOR`       | `display.color`      |

use std::time::Duration;

use serde::Serialize;
use tagconf::Config;

#[derive(Config, Serialize, Debug, Default)]
pub struct DemoConfig {
    /// Application name shown in the banner.
    #[conf(default = "tagconf-demo")]
    pub name: String,

    #[conf(nested)]
    pub server: ServerConfig,

    #[conf(nested)]
    pub display: DisplayConfig,

    /// Upstream credentials. Never read from any source.
    #[conf(key = "-")]
    #[serde(skip)]
    pub token: String,
}

#[derive(Config, Serialize, Debug, Default)]
pub struct ServerConfig {
    #[conf(default = "127.0.0.1", flag = "host")]
    pub host: String,

    #[conf(default = "3000", env = "port", flag = "port", validation = "range:[1, 65535]")]
    pub port: u16,

    #[conf(default = "30s", validation = "range:(0s, 5m]")]
    #[serde(with = "duration_text")]
    pub timeout: Duration,

    /// Upstream database; must come from a file, env or flag.
    #[conf(required, flag = "database-url")]
    pub database_url: String,
}

#[derive(Config, Serialize, Debug, Default)]
pub struct DisplayConfig {
    #[conf(default = "yellow", flag = "color", validation = "in:[red, green, yellow, blue]")]
    pub color: String,

    #[conf(default = r#"["banner","summary"]"#)]
    pub sections: Vec<String>,
}

mod duration_text {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&tagconf::duration::format(*value))
    }
}
