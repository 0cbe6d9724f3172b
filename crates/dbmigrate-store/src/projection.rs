use std::path::Path;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use dbmigrate_common::{Error, Migration, Result};
use regex::Regex;

use crate::fields::{DEPENDS_FIELD, Field};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const TIMESTAMP_ZONE: &str = " UTC";

// chrono skips whitespace and zero padding on its own, so pin the exact
// shape before handing the text over.
static TIMESTAMP_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}(\.[0-9]+)? UTC$")
        .expect("timestamp pattern is valid")
});

/// Rejected field value. Only `Created` can fail today.
#[derive(Debug)]
enum FieldValueError {
    Timestamp(String),
}

type FieldSetter = fn(Migration, &str) -> std::result::Result<Migration, FieldValueError>;

/// Every field a migration file may contain. A name missing from this table
/// is rejected.
const FIELD_SETTERS: &[(&str, FieldSetter)] = &[
    ("Created", set_created),
    ("Description", set_description),
    ("Apply", set_apply),
    ("Revert", set_revert),
    (DEPENDS_FIELD, keep),
];

fn set_created(m: Migration, value: &str) -> std::result::Result<Migration, FieldValueError> {
    let created =
        parse_timestamp(value).ok_or_else(|| FieldValueError::Timestamp(value.to_string()))?;
    Ok(Migration { created, ..m })
}

fn set_description(m: Migration, value: &str) -> std::result::Result<Migration, FieldValueError> {
    Ok(Migration {
        description: Some(value.to_string()),
        ..m
    })
}

fn set_apply(m: Migration, value: &str) -> std::result::Result<Migration, FieldValueError> {
    Ok(Migration {
        apply: value.to_string(),
        ..m
    })
}

fn set_revert(m: Migration, value: &str) -> std::result::Result<Migration, FieldValueError> {
    Ok(Migration {
        revert: Some(value.to_string()),
        ..m
    })
}

// Dependencies are wired by the loader once they have been loaded.
fn keep(m: Migration, _value: &str) -> std::result::Result<Migration, FieldValueError> {
    Ok(m)
}

/// Fold `fields` onto a default migration in file order, then stamp it with
/// `id`. Later occurrences of a field overwrite earlier ones.
pub fn project_fields(path: &Path, id: &str, fields: &[Field]) -> Result<Migration> {
    let mut migration = Migration::default();

    for field in fields {
        let setter = FIELD_SETTERS
            .iter()
            .find(|(name, _)| *name == field.name)
            .map(|(_, setter)| *setter)
            .ok_or_else(|| Error::UnrecognizedField {
                field: field.name.clone(),
                path: path.to_path_buf(),
            })?;

        migration = setter(migration, &field.value).map_err(|e| match e {
            FieldValueError::Timestamp(value) => Error::Timestamp {
                path: path.to_path_buf(),
                value,
            },
        })?;
    }

    migration.id = id.to_string();
    Ok(migration)
}

/// Parse the canonical timestamp text, e.g. `2009-01-01 00:00:00 UTC` or
/// `2009-01-01 00:00:00.25 UTC`.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if !TIMESTAMP_SHAPE.is_match(value) {
        return None;
    }
    let naive = value.strip_suffix(TIMESTAMP_ZONE)?;
    NaiveDateTime::parse_from_str(naive, TIMESTAMP_FORMAT)
        .ok()
        .map(|dt| dt.and_utc())
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    format!("{}{TIMESTAMP_ZONE}", ts.format(TIMESTAMP_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn path() -> &'static Path {
        Path::new("migrations/m1")
    }

    #[test]
    fn projects_recognized_fields() {
        let fields = vec![
            Field::new("Description", "users table"),
            Field::new("Created", "2009-01-01 00:00:00 UTC"),
            Field::new("Depends", "base"),
            Field::new("Apply", "CREATE TABLE x;"),
            Field::new("Revert", "DROP TABLE x;"),
        ];
        let m = project_fields(path(), "m1", &fields).unwrap();

        assert_eq!(m.id, "m1");
        assert_eq!(m.created, Utc.with_ymd_and_hms(2009, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(m.description.as_deref(), Some("users table"));
        assert_eq!(m.apply, "CREATE TABLE x;");
        assert_eq!(m.revert.as_deref(), Some("DROP TABLE x;"));
        assert!(m.dependencies.is_empty());
    }

    #[test]
    fn missing_optional_fields_keep_defaults() {
        let m = project_fields(path(), "m1", &[Field::new("Depends", "")]).unwrap();
        assert_eq!(m, Migration::new("m1"));
    }

    #[test]
    fn later_fields_win() {
        let fields = vec![Field::new("Apply", "first"), Field::new("Apply", "second")];
        let m = project_fields(path(), "m1", &fields).unwrap();
        assert_eq!(m.apply, "second");
    }

    #[test]
    fn rejects_unknown_fields() {
        let fields = vec![Field::new("Apply", "SELECT 1;"), Field::new("Foo", "x")];
        let err = project_fields(path(), "m1", &fields).unwrap_err();
        match err {
            Error::UnrecognizedField { field, .. } => assert_eq!(field, "Foo"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn field_names_are_case_sensitive() {
        let err = project_fields(path(), "m1", &[Field::new("depends", "")]).unwrap_err();
        assert!(matches!(err, Error::UnrecognizedField { .. }), "{err}");
    }

    #[test]
    fn rejects_bad_timestamps() {
        for value in [
            "yesterday",
            "2009-01-01 00:00:00",
            "2009-01-01 00:00:00 UTC trailing",
            "2009-13-01 00:00:00 UTC",
            "2009-01-0100:00:00 UTC",
            "2009-1-1 0:0:0 UTC",
            "2009-01-01  00:00:00 UTC",
            "2009-01-01 00:00:00  UTC",
            "2009-01-01 00:00:00. UTC",
            "2009-01-01T00:00:00 UTC",
        ] {
            let err = project_fields(path(), "m1", &[Field::new("Created", value)]).unwrap_err();
            assert!(matches!(err, Error::Timestamp { .. }), "{value}: {err}");
        }
    }

    #[test]
    fn canonical_timestamps_ignore_surrounding_whitespace() {
        let expected = Utc.with_ymd_and_hms(2009, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("  2009-01-01 00:00:00 UTC\t"), Some(expected));
    }

    #[test]
    fn timestamps_with_fractions_round_trip() {
        let ts = parse_timestamp("2012-06-30 23:59:59.125 UTC").unwrap();
        assert_eq!(ts.timestamp_subsec_millis(), 125);
        assert_eq!(parse_timestamp(&format_timestamp(&ts)), Some(ts));

        let whole = Utc.with_ymd_and_hms(2009, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(&whole), "2009-01-01 00:00:00 UTC");
    }
}
