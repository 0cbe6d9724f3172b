use std::path::{Path, PathBuf};

use dbmigrate_common::{Error, Result};
use tracing::{debug, info};

use crate::model::AppConfig;

/// File names looked up by [`ConfigLoader::discover`], in priority order.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["dbmigrate.toml", "dbmigrate.yaml", "dbmigrate.yml"];

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a config file, choosing the format from its extension. A relative
    /// migrations directory is taken relative to the file.
    pub fn load(path: &Path) -> Result<AppConfig> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let mut config: AppConfig = match ext {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .map_err(|e| Error::Config(format!("YAML parse error in {}: {e}", path.display())))?,
            "toml" => toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("TOML parse error in {}: {e}", path.display())))?,
            other => {
                return Err(Error::Config(format!(
                    "unsupported config extension: {other}"
                )));
            }
        };

        if config.migrations.directory.is_relative() {
            if let Some(base) = path.parent() {
                config.migrations.directory = base.join(&config.migrations.directory);
            }
        }

        info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load the first known config file in `dir`, or fall back to defaults
    /// rooted at `dir`.
    pub fn discover(dir: &Path) -> Result<AppConfig> {
        match Self::find(dir) {
            Some(path) => Self::load(&path),
            None => {
                debug!("no config file in {}, using defaults", dir.display());
                let mut config = AppConfig::default();
                config.migrations.directory = dir.join(&config.migrations.directory);
                Ok(config)
            }
        }
    }

    fn find(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::model::LogFormat;

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbmigrate.toml");
        fs::write(
            &path,
            "[migrations]\ndirectory = \"db/migrations\"\n\n[log]\nlevel = \"debug\"\nformat = \"json\"\n",
        )
        .unwrap();

        let config = ConfigLoader::load(&path).unwrap();
        assert_eq!(config.migrations.directory, dir.path().join("db/migrations"));
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn loads_yaml_with_defaults_for_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbmigrate.yaml");
        fs::write(&path, "log:\n  level: warn\n").unwrap();

        let config = ConfigLoader::load(&path).unwrap();
        assert_eq!(config.migrations.directory, dir.path().join("migrations"));
        assert_eq!(config.log.level, "warn");
        assert_eq!(config.log.format, LogFormat::Pretty);
    }

    #[test]
    fn absolute_directories_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("elsewhere");
        let path = dir.path().join("dbmigrate.yml");
        fs::write(&path, format!("migrations:\n  directory: {}\n", target.display())).unwrap();

        let config = ConfigLoader::load(&path).unwrap();
        assert_eq!(config.migrations.directory, target);
    }

    #[test]
    fn rejects_unknown_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbmigrate.ini");
        fs::write(&path, "directory=migrations").unwrap();

        let err = ConfigLoader::load(&path).unwrap_err();
        assert_eq!(err.to_string(), "configuration error: unsupported config extension: ini");
    }

    #[test]
    fn reports_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbmigrate.toml");
        fs::write(&path, "[migrations\n").unwrap();

        let err = ConfigLoader::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{err}");
    }

    #[test]
    fn discover_prefers_toml_and_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::discover(dir.path()).unwrap();
        assert_eq!(config.migrations.directory, dir.path().join("migrations"));

        fs::write(dir.path().join("dbmigrate.yml"), "log:\n  level: error\n").unwrap();
        fs::write(dir.path().join("dbmigrate.toml"), "[log]\nlevel = \"trace\"\n").unwrap();
        let config = ConfigLoader::discover(dir.path()).unwrap();
        assert_eq!(config.log.level, "trace");
    }
}
