//! `dbmigrate`: inspect a directory of schema migrations.
//!
//! ```bash
//! dbmigrate check                 # load ./migrations and report problems
//! dbmigrate list db/migrations    # dependency order
//! dbmigrate show 2009-01-01-users
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use dbmigrate_config::{AppConfig, ConfigLoader, LogConfig, LogFormat};
use dbmigrate_store::{MigrationMap, load_migrations};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod report;

#[derive(Parser)]
#[command(name = "dbmigrate")]
#[command(about = "Load and inspect file-based schema migrations", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to dbmigrate.toml / dbmigrate.yaml in the current directory)
    #[arg(short, long, global = true, env = "DBMIGRATE_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format, overriding the config file
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every migration and report whether the set is consistent
    Check {
        /// Migrations directory (defaults to the configured one)
        dir: Option<PathBuf>,
    },

    /// List migrations with dependencies before dependents
    List {
        /// Migrations directory (defaults to the configured one)
        dir: Option<PathBuf>,
    },

    /// Print one migration and the migrations that require it
    Show {
        /// Migration ID (its file name)
        id: String,

        /// Migrations directory (defaults to the configured one)
        dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(format) = cli.log_format {
        config.log.format = format.into();
    }
    init_logging(&config.log);
    debug!("using migrations directory {}", config.migrations.directory.display());

    match cli.command {
        Commands::Check { dir } => {
            let dir = dir.unwrap_or(config.migrations.directory);
            let map = load(&dir)?;
            println!("{}", report::summary(&dir, &map));
        }
        Commands::List { dir } => {
            let dir = dir.unwrap_or(config.migrations.directory);
            let map = load(&dir)?;
            for migration in map.dependency_order() {
                println!("{}", report::list_line(migration));
            }
        }
        Commands::Show { id, dir } => {
            let dir = dir.unwrap_or(config.migrations.directory);
            let map = load(&dir)?;
            let Some(migration) = map.get(&id) else {
                bail!("no migration named `{id}` in {}", dir.display());
            };
            print!("{}", report::details(migration, &map.dependents_of(&id)));
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => ConfigLoader::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => ConfigLoader::discover(Path::new(".")).context("failed to load config"),
    }
}

fn load(dir: &Path) -> Result<MigrationMap> {
    load_migrations(dir).with_context(|| format!("failed to load migrations from {}", dir.display()))
}

/// Logs go to stderr; `RUST_LOG` takes precedence over the configured level.
fn init_logging(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match log.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
