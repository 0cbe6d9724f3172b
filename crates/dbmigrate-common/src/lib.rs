pub mod error;
pub mod migration;

pub use error::{Error, Result};
pub use migration::{Migration, MigrationId};
