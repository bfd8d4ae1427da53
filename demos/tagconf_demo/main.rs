//! # tagconf demo application
//!
//! A sample CLI that loads [`DemoConfig`](config::DemoConfig) through every
//! layer tagconf supports. It exists to exercise the library by hand.
//!
//! ## Running
//!
//! ```sh
//! echo 'server: {database_url: "postgres://localhost/demo"}' > config.yaml
//! cargo run --example tagconf_demo -- show
//! RUST_LOG=debug APP_ENV=prod cargo run --example tagconf_demo -- --port 9000 show
//! cargo run --example tagconf_demo -- dump out.json
//! ```
//!
//! | Feature                 | How to exercise it                                          |
//! |-------------------------|-------------------------------------------------------------|
//! | Declared defaults       | `show` with a config file holding only `database_url`       |
//! | Override layers         | Add `config_dev.yaml` or `config_local.yaml`                |
//! | Env selection           | `APP_ENV=prod` reads `config_prod.*` instead of `config_dev.*` |
//! | Bound env var           | `APP_PORT=9999 ... show`                                    |
//! | Automatic env var       | `APP_DISPLAY_COLOR=red ... show`                            |
//! | Flag override           | `... --color blue show`                                     |
//! | Validation              | `... --color purple show` fails                             |
//! | Required field          | Remove `database_url` from every layer                      |

mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use tagconf::{ConfigReader, FlagSet, list_values};

use config::DemoConfig;

/// tagconf demo: loads a layered config and prints it.
#[derive(Parser, Debug)]
#[command(name = "tagconf-demo")]
struct Cli {
    /// Directory to search for config files (repeatable).
    #[arg(long = "config-path", global = true)]
    config_paths: Vec<PathBuf>,

    #[arg(long, global = true)]
    host: Option<String>,

    #[arg(long, global = true)]
    port: Option<u16>,

    #[arg(long, global = true)]
    color: Option<String>,

    #[arg(id = "database-url", long = "database-url", global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every resolved key.
    Show,
    /// Write the resolved config to a new json or yaml file.
    Dump { path: PathBuf },
}

fn run() -> tagconf::Result<()> {
    let matches = Cli::command().get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };
    let mut flags = FlagSet::from_arg_matches(&matches)?;
    for name in ["host", "port", "color", "database-url"] {
        flags.define(name, "", name);
    }

    let mut builder = ConfigReader::builder()
        .add_platform_path("tagconf-demo")
        .flag_registry(flags);
    for path in &cli.config_paths {
        builder = builder.add_config_path(path);
    }
    let mut reader = builder.build();
    let config: DemoConfig = reader.load()?;
    reader.log_settings();

    match cli.command {
        Command::Show => {
            println!("{} on {}:{}", config.name, config.server.host, config.server.port);
            println!("{}", list_values(&config));
        }
        Command::Dump { path } => {
            reader.dump_config(&path, Some(&config))?;
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
