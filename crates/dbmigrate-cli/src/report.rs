use std::path::Path;

use dbmigrate_common::Migration;
use dbmigrate_store::MigrationMap;
use dbmigrate_store::projection::format_timestamp;
use dbmigrate_store::serialize_migration;

pub fn summary(dir: &Path, map: &MigrationMap) -> String {
    let count = map.len();
    format!(
        "{count} migration{} loaded from {}",
        if count == 1 { "" } else { "s" },
        dir.display()
    )
}

/// `<id>  <created>  <deps>` for `dbmigrate list`.
pub fn list_line(m: &Migration) -> String {
    let deps = m.dependency_ids().collect::<Vec<_>>();
    let deps = if deps.is_empty() {
        "-".to_string()
    } else {
        deps.join(", ")
    };
    format!("{}  {}  {deps}", m.id, format_timestamp(&m.created))
}

/// The migration in file form followed by its reverse dependencies.
pub fn details(m: &Migration, dependents: &[&str]) -> String {
    let mut out = format!("# {}\n", m.id);
    out.push_str(&serialize_migration(m));
    out.push('\n');
    if dependents.is_empty() {
        out.push_str("Required by: none\n");
    } else {
        out.push_str(&format!("Required by: {}\n", dependents.join(", ")));
    }
    out
}
