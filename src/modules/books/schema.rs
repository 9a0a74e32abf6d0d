//! Declarative payload validation for the Books module.
//!
//! The shape of a book is declared once in [`BOOK_SCHEMA`] and evaluated by
//! [`validate`], a pure function over the raw payload. Type matching is
//! exact: a numeric string where an integer is expected, or a boolean where
//! a string is expected, is a violation. No coercion.

use std::fmt;

use serde_json::{Map, Value};
use time::OffsetDateTime;

use super::models::Book;

/// Primitive kind a field must carry in the payload.
#[derive(Debug, Clone, Copy)]
enum FieldKind {
    Text,
    Integer,
}

/// Semantic constraint applied after the kind check passes.
#[derive(Debug, Clone, Copy)]
enum Check {
    None,
    NonEmpty,
    Url,
    Min(i32),
    NotAfterCurrentYear,
}

struct FieldSpec {
    name: &'static str,
    kind: FieldKind,
    check: Check,
}

/// The declared shape of a book payload: all eight fields are required.
const BOOK_SCHEMA: &[FieldSpec] = &[
    FieldSpec {
        name: "isbn",
        kind: FieldKind::Text,
        check: Check::NonEmpty,
    },
    FieldSpec {
        name: "amazon_url",
        kind: FieldKind::Text,
        check: Check::Url,
    },
    FieldSpec {
        name: "author",
        kind: FieldKind::Text,
        check: Check::NonEmpty,
    },
    FieldSpec {
        name: "language",
        kind: FieldKind::Text,
        check: Check::NonEmpty,
    },
    FieldSpec {
        name: "pages",
        kind: FieldKind::Integer,
        check: Check::Min(1),
    },
    FieldSpec {
        name: "publisher",
        kind: FieldKind::Text,
        check: Check::NonEmpty,
    },
    FieldSpec {
        name: "title",
        kind: FieldKind::Text,
        check: Check::NonEmpty,
    },
    FieldSpec {
        name: "year",
        kind: FieldKind::Integer,
        check: Check::NotAfterCurrentYear,
    },
];

/// Which write operation the payload is validated for.
///
/// Both modes require the full field set today; the mode stays in the
/// signature so create and update can diverge without touching call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    Create,
    Update,
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: &'static str,
    pub reason: String,
}

impl Violation {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Join a violation list into the single aggregated error message.
pub fn describe(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validate a raw payload against [`BOOK_SCHEMA`].
///
/// Returns the typed record on success (unknown keys dropped) or the
/// complete list of violations, never just the first one.
pub fn validate(payload: &Value, _mode: ValidationMode) -> Result<Book, Vec<Violation>> {
    let Some(object) = payload.as_object() else {
        return Err(vec![Violation::new("payload", "expected a JSON object")]);
    };

    let mut violations = Vec::new();
    let mut normalized = Map::with_capacity(BOOK_SCHEMA.len());

    for spec in BOOK_SCHEMA {
        match check_field(spec, object.get(spec.name)) {
            Ok(value) => {
                normalized.insert(spec.name.to_string(), value);
            }
            Err(violation) => violations.push(violation),
        }
    }

    if !violations.is_empty() {
        return Err(violations);
    }

    // Unreachable in practice: every field above was checked against the
    // exact kind the model expects.
    serde_json::from_value(Value::Object(normalized))
        .map_err(|err| vec![Violation::new("payload", err.to_string())])
}

fn check_field(spec: &FieldSpec, value: Option<&Value>) -> Result<Value, Violation> {
    let Some(value) = value else {
        return Err(Violation::new(spec.name, "is required"));
    };

    match spec.kind {
        FieldKind::Text => {
            let Some(text) = value.as_str() else {
                return Err(Violation::new(spec.name, "expected a string"));
            };

            match spec.check {
                Check::NonEmpty if text.is_empty() => {
                    Err(Violation::new(spec.name, "cannot be empty"))
                }
                Check::Url if url::Url::parse(text).is_err() => {
                    Err(Violation::new(spec.name, "must be a valid URL"))
                }
                _ => Ok(value.clone()),
            }
        }
        FieldKind::Integer => {
            // as_i64 is None for booleans, floats, and strings; the i32
            // bound keeps the value inside the column type.
            let Some(number) = value.as_i64().and_then(|n| i32::try_from(n).ok()) else {
                return Err(Violation::new(spec.name, "expected an integer"));
            };

            match spec.check {
                Check::Min(min) if number < min => {
                    Err(Violation::new(spec.name, format!("must be at least {min}")))
                }
                Check::NotAfterCurrentYear => {
                    let current = OffsetDateTime::now_utc().year();
                    if number > current {
                        Err(Violation::new(
                            spec.name,
                            format!("cannot be later than {current}"),
                        ))
                    } else {
                        Ok(value.clone())
                    }
                }
                _ => Ok(value.clone()),
            }
        }
    }
}
