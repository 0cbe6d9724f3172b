use dbmigrate_common::Migration;

use crate::fields::{DEPENDS_FIELD, Field, render_fields};
use crate::projection::format_timestamp;

/// Canonical file form of a migration.
pub fn serialize_migration(m: &Migration) -> String {
    let mut fields = Vec::with_capacity(5);

    if let Some(description) = &m.description {
        fields.push(Field::new("Description", description.as_str()));
    }
    fields.push(Field::new("Created", format_timestamp(&m.created)));
    fields.push(Field::new(
        DEPENDS_FIELD,
        m.dependency_ids().collect::<Vec<_>>().join(" "),
    ));
    fields.push(Field::new("Apply", m.apply.as_str()));
    if let Some(revert) = &m.revert {
        fields.push(Field::new("Revert", revert.as_str()));
    }

    render_fields(&fields)
}
