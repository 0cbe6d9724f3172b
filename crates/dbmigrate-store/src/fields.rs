//! Line-oriented field format used by migration files.
//!
//! ```text
//! Description: add the users table
//! Created: 2009-01-01 00:00:00 UTC
//! Depends: base
//! Apply: CREATE TABLE users (
//!   id INTEGER PRIMARY KEY);
//! ```
//!
//! A field starts at column 0 with `Name:`; lines that begin with spaces or
//! tabs continue the previous field and are joined onto its value with a
//! single space.

use std::path::Path;
use std::sync::LazyLock;

use dbmigrate_common::{Error, MigrationId, Result};
use regex::Regex;

/// Name of the field listing a migration's prerequisites.
pub const DEPENDS_FIELD: &str = "Depends";

// ASCII only, like field names.
static DEPENDENCY_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._-]+$").expect("dependency id pattern is valid")
});

/// A single `(name, value)` pair in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Result of parsing one migration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFields {
    /// Every field in file order, duplicates included.
    pub fields: Vec<Field>,
    /// Dependency IDs taken from the `Depends` field, in declared order.
    pub depends: Vec<MigrationId>,
}

/// Parse the full text of a migration file.
///
/// `path` is only used for diagnostics.
pub fn parse_migration_text(path: &Path, text: &str) -> Result<ParsedFields> {
    let fields = parse_fields(path, text)?;

    let depends_value = fields
        .iter()
        .rev()
        .find(|f| f.name == DEPENDS_FIELD)
        .map(|f| f.value.as_str())
        .ok_or_else(|| Error::MissingDepends {
            path: path.to_path_buf(),
        })?;
    let depends = parse_depends(path, depends_value)?;

    Ok(ParsedFields { fields, depends })
}

/// Tokenize `text` into fields. The whole input must match; a line that is
/// neither a field header nor a continuation fails the parse.
pub fn parse_fields(path: &Path, text: &str) -> Result<Vec<Field>> {
    let mut fields: Vec<Field> = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;

        if line.starts_with([' ', '\t']) {
            let Some(current) = fields.last_mut() else {
                return Err(parse_error(
                    path,
                    line_no,
                    "continuation line before the first field",
                ));
            };
            current.value.push(' ');
            current.value.push_str(line.trim_start_matches([' ', '\t']));
            continue;
        }

        let (name, rest) = split_header(line)
            .map_err(|message| parse_error(path, line_no, message))?;
        fields.push(Field::new(name, rest.trim_start_matches([' ', '\t'])));
    }

    Ok(fields)
}

/// Split a `Name: value` header line into its name and the text after the
/// colon. Names are ASCII letters, digits and `-`; non-ASCII letters are
/// rejected on purpose.
fn split_header(line: &str) -> std::result::Result<(&str, &str), String> {
    let name_len = line
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(line.len());

    if name_len == 0 {
        return Err(match line.chars().next() {
            None => "expected a field, found an empty line".to_string(),
            Some(c) => format!("expected a field name, found `{c}`"),
        });
    }

    let (name, rest) = line.split_at(name_len);
    match rest.strip_prefix(':') {
        Some(value) => Ok((name, value)),
        None => Err(format!("expected `:` after field name `{name}`")),
    }
}

fn parse_error(path: &Path, line: usize, message: impl Into<String>) -> Error {
    Error::Parse {
        path: path.to_path_buf(),
        line,
        message: message.into(),
    }
}

/// Split a `Depends` value into dependency IDs.
pub fn parse_depends(path: &Path, value: &str) -> Result<Vec<MigrationId>> {
    value
        .split_whitespace()
        .map(|token| {
            if DEPENDENCY_ID.is_match(token) {
                Ok(token.to_string())
            } else {
                Err(Error::MalformedDepends {
                    path: path.to_path_buf(),
                    token: token.to_string(),
                })
            }
        })
        .collect()
}

/// Render fields back into the file format. Embedded newlines become
/// continuation lines.
pub fn render_fields(fields: &[Field]) -> String {
    let mut out = String::new();
    for field in fields {
        out.push_str(&field.name);
        out.push(':');
        push_value(&mut out, &field.value);
    }
    out
}

fn push_value(out: &mut String, value: &str) {
    let mut rest = value;
    if !rest.starts_with([' ', '\t']) {
        let (first, after) = split_segment(rest);
        if !first.is_empty() {
            out.push(' ');
            out.push_str(first);
        }
        rest = after;
    }
    out.push('\n');

    // Each continuation line is read back as a space followed by its text,
    // so consume one joining space per emitted line.
    while !rest.is_empty() {
        let joined = match rest.strip_prefix(' ') {
            Some(joined) => joined,
            None => rest.trim_start_matches([' ', '\t']),
        };
        let (segment, after) = if joined.starts_with(' ') {
            ("", joined)
        } else {
            split_segment(joined)
        };
        out.push_str("  ");
        out.push_str(segment);
        out.push('\n');
        rest = after;
    }
}

/// Text up to the next newline, and what follows it with the next line's
/// indentation removed.
fn split_segment(s: &str) -> (&str, &str) {
    match s.split_once('\n') {
        Some((line, after)) => (
            line.trim_end_matches('\r'),
            after.trim_start_matches([' ', '\t']),
        ),
        None => (s, ""),
    }
}
