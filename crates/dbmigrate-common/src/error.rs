use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("could not parse migration {} (line {line}): {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Depends field missing in migration {}", .path.display())]
    MissingDepends { path: PathBuf },

    #[error("could not parse Depends field in migration {}: invalid dependency `{token}`", .path.display())]
    MalformedDepends { path: PathBuf, token: String },

    #[error("unrecognized field `{field}` in migration `{}`", .path.display())]
    UnrecognizedField { field: String, path: PathBuf },

    #[error("could not parse timestamp `{value}` in migration {}", .path.display())]
    Timestamp { path: PathBuf, value: String },

    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot derive a migration id from {}", .path.display())]
    InvalidFileName { path: PathBuf },

    #[error("migration `{id}` depends on `{dependency}`, but {} does not exist", .path.display())]
    MissingDependency {
        id: String,
        dependency: String,
        path: PathBuf,
    },

    #[error("dependency cycle detected: {}", .chain.join(" -> "))]
    DependencyCycle { chain: Vec<String> },

    #[error("migration `{id}` depends on `{dependency}`, which was not loaded")]
    UnresolvedDependency { id: String, dependency: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
