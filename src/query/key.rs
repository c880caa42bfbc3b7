//! Search keys: which field of each element a query is compared against
//!
//! A [`SearchKey`] names one or more [`FieldPath`]s. Elements expose their
//! fields through [`Searchable`], which is implemented for JSON values and
//! string maps and is easy to implement for application structs.

use super::fast_lowercase::Needle;
use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// A dotted path to a field, e.g. `profile.email`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse a dotted path. Rejects empty paths and empty segments.
    pub fn parse(path: &str) -> Result<Self> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(Error::InvalidFieldPath {
                path: path.to_string(),
            });
        }
        Ok(Self { segments })
    }

    /// A single-segment path taken verbatim, dots included.
    pub fn flat(name: impl Into<String>) -> Self {
        Self {
            segments: vec![name.into()],
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// The field name when the path has exactly one segment.
    pub fn as_flat(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}

impl FromStr for FieldPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// The field (or fields) each element is searched on.
///
/// With several fields an element is retained when any of them matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchKey {
    fields: Vec<FieldPath>,
}

impl SearchKey {
    /// Search on a single top-level field.
    pub fn field(name: impl Into<String>) -> Self {
        Self::path(FieldPath::flat(name))
    }

    pub fn path(path: FieldPath) -> Self {
        Self { fields: vec![path] }
    }

    pub fn any_of(paths: impl IntoIterator<Item = FieldPath>) -> Self {
        Self {
            fields: paths.into_iter().collect(),
        }
    }

    /// Parse each entry as a dotted [`FieldPath`].
    pub fn parse_all<I, S>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields = paths
            .into_iter()
            .map(|p| FieldPath::parse(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FieldPath] {
        &self.fields
    }

    /// Whether `item` is retained for `needle`.
    ///
    /// An empty needle retains every element, including ones whose field is absent.
    pub fn matches<T: Searchable + ?Sized>(&self, item: &T, needle: &Needle) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.fields.iter().any(|path| {
            item.field_text(path)
                .is_some_and(|text| needle.matches(&text))
        })
    }
}

impl fmt::Display for SearchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{field}")?;
        }
        Ok(())
    }
}

/// Elements that expose their fields as text for searching.
///
/// Return `None` for a missing or null field; such elements only survive an empty query.
///
/// ```
/// use debounced_search::{FieldPath, Searchable};
/// use std::borrow::Cow;
///
/// struct User {
///     id: u32,
///     username: String,
/// }
///
/// impl Searchable for User {
///     fn field_text(&self, path: &FieldPath) -> Option<Cow<'_, str>> {
///         match path.as_flat()? {
///             "id" => Some(Cow::Owned(self.id.to_string())),
///             "username" => Some(Cow::Borrowed(self.username.as_str())),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Searchable {
    fn field_text(&self, path: &FieldPath) -> Option<Cow<'_, str>>;
}

impl<T: Searchable + ?Sized> Searchable for &T {
    fn field_text(&self, path: &FieldPath) -> Option<Cow<'_, str>> {
        (**self).field_text(path)
    }
}

impl Searchable for Value {
    fn field_text(&self, path: &FieldPath) -> Option<Cow<'_, str>> {
        let mut node = self;
        for segment in path.segments() {
            node = child(node, segment)?;
        }
        json_text(node)
    }
}

impl Searchable for Map<String, Value> {
    fn field_text(&self, path: &FieldPath) -> Option<Cow<'_, str>> {
        let mut segments = path.segments();
        let mut node = self.get(segments.next()?)?;
        for segment in segments {
            node = child(node, segment)?;
        }
        json_text(node)
    }
}

impl Searchable for HashMap<String, String> {
    fn field_text(&self, path: &FieldPath) -> Option<Cow<'_, str>> {
        self.get(path.as_flat()?).map(|s| Cow::Borrowed(s.as_str()))
    }
}

impl Searchable for BTreeMap<String, String> {
    fn field_text(&self, path: &FieldPath) -> Option<Cow<'_, str>> {
        self.get(path.as_flat()?).map(|s| Cow::Borrowed(s.as_str()))
    }
}

fn child<'a>(node: &'a Value, segment: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
        _ => None,
    }
}

/// Text form of a JSON value: strings verbatim, scalars via display,
/// arrays comma-joined, objects as compact JSON, null as absent.
pub fn json_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Bool(true) => Some(Cow::Borrowed("true")),
        Value::Bool(false) => Some(Cow::Borrowed("false")),
        // integers keep their exact digits; floats print like JS, so 1.0 is "1"
        Value::Number(n) if n.is_f64() => n.as_f64().map(|f| Cow::Owned(f.to_string())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Array(items) => {
            let parts: Vec<Cow<'_, str>> = items
                .iter()
                .map(|v| json_text(v).unwrap_or(Cow::Borrowed("")))
                .collect();
            Some(Cow::Owned(parts.join(",")))
        }
        Value::Object(_) => Some(Cow::Owned(value.to_string())),
    }
}
