//! Canonical cell values and substring matching.
//!
//! Source columns arrive in several physical shapes: scalars, native list
//! vectors, and strings that may themselves encode a JSON list. Everything
//! funnels into [`CanonicalValue`], an explicit tagged union produced at the
//! table-adapter boundary, so downstream filtering and display never inspect
//! value shapes at runtime.

use serde_json::Value;

/// The normalized representation of a single cell.
///
/// Table and paging consumers always see the collapsed form: an empty
/// extraction is [`CanonicalValue::Absent`], a single value is
/// [`CanonicalValue::One`], and two or more values are
/// [`CanonicalValue::Many`]. The metacatalogue facet columns bypass the
/// collapse via [`normalize_facet`] and always stay sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalValue {
    /// No value (null source cell, or a list with no usable elements).
    Absent,
    /// Exactly one value.
    One(String),
    /// Two or more values.
    Many(Vec<String>),
}

impl CanonicalValue {
    /// Case-insensitive substring match against this value.
    ///
    /// A sequence matches if any element matches; `Absent` never matches.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        match self {
            Self::Absent => false,
            Self::One(value) => value.to_lowercase().contains(&needle),
            Self::Many(values) => values.iter().any(|v| v.to_lowercase().contains(&needle)),
        }
    }

    /// Renders the collapsed JSON shape: null, a string, or an array of
    /// strings.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Absent => Value::Null,
            Self::One(value) => Value::String(value.clone()),
            Self::Many(values) => {
                Value::Array(values.iter().cloned().map(Value::String).collect())
            }
        }
    }

    /// Iterates the contained values (zero, one, or many).
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Self::Absent => &[],
            Self::One(value) => std::slice::from_ref(value),
            Self::Many(values) => values.as_slice(),
        };
        slice.iter().map(String::as_str)
    }
}

/// Stringifies a JSON scalar. Nulls yield `None`; non-string scalars render
/// without quoting; nested structures render as their JSON text.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn collect_sequence(items: &[Value]) -> Vec<String> {
    items.iter().filter_map(scalar_to_string).collect()
}

/// Extracts a raw cell into an always-sequence form (no collapse).
///
/// Used for the metacatalogue facet columns, which remain sequences even
/// when they hold a single element.
///
/// A string cell that parses as a JSON array is treated as that array. A
/// string that parses as any other JSON value, or fails to parse, is kept
/// verbatim as a single element; numeric-looking strings therefore stay
/// intact. This coercion is deliberate policy, not an error path.
#[must_use]
pub fn normalize_facet(raw: &Value) -> Vec<String> {
    match raw {
        Value::Null => Vec::new(),
        Value::Array(items) => collect_sequence(items),
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Array(items)) => collect_sequence(&items),
            _ => vec![encoded.clone()],
        },
        other => vec![other.to_string()],
    }
}

/// Normalizes a raw cell of unknown shape into its canonical collapsed form.
#[must_use]
pub fn normalize_field(raw: &Value) -> CanonicalValue {
    let mut values = normalize_facet(raw);
    match values.len() {
        0 => CanonicalValue::Absent,
        1 => CanonicalValue::One(values.remove(0)),
        _ => CanonicalValue::Many(values),
    }
}
