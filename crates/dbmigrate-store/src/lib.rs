//! Filesystem migration store: parses migration files and loads a directory
//! of them into a dependency-resolved [`MigrationMap`].

pub mod fields;
pub mod loader;
pub mod map;
pub mod projection;
pub mod serialize;

pub use fields::{Field, ParsedFields, parse_migration_text};
pub use loader::{MigrationLoader, load_migrations};
pub use map::MigrationMap;
pub use serialize::serialize_migration;
