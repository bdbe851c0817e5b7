//! Structured frontmatter values and the codec that reads and writes them.

use chrono::NaiveDate;
use serde_yaml::{Mapping, Value};

use crate::date_utils::format_date;
use crate::error::{RealCalError, RealCalResult};

/// A decoded frontmatter value.
///
/// Maps keep the order in which keys appeared in the header, so encoding a
/// value we built ourselves reproduces the intended field order.
#[derive(Debug, Clone, PartialEq)]
pub enum Metadata {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// A native date, for codecs that resolve timestamps themselves.
    Date(NaiveDate),
    List(Vec<Metadata>),
    Map(Vec<(String, Metadata)>),
}

impl Metadata {
    /// Look up a key in a map value.
    pub fn get(&self, key: &str) -> Option<&Metadata> {
        match self {
            Metadata::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Whether this value is a present, non-empty value.
    pub fn is_truthy(&self) -> bool {
        match self {
            Metadata::Null => false,
            Metadata::Bool(b) => *b,
            Metadata::Number(n) => *n != 0.0 && !n.is_nan(),
            Metadata::String(s) => !s.is_empty(),
            Metadata::Date(_) | Metadata::List(_) | Metadata::Map(_) => true,
        }
    }

    /// Render a scalar the way it would read in the header.
    pub fn to_plain_string(&self) -> Option<String> {
        match self {
            Metadata::Bool(b) => Some(b.to_string()),
            Metadata::Number(n) => Some(format_number(*n)),
            Metadata::String(s) => Some(s.clone()),
            Metadata::Date(d) => Some(format_date(*d)),
            Metadata::Null | Metadata::List(_) | Metadata::Map(_) => None,
        }
    }

    /// Whether a tags value carries `tag`.
    ///
    /// Lists match element-wise; a scalar string is split on commas and
    /// whitespace. A leading `#` on a tag is ignored. Matching is by whole
    /// tag, not substring, so `events` does not carry `event`.
    pub fn contains_tag(&self, tag: &str) -> bool {
        match self {
            Metadata::String(s) => s
                .split(|c: char| c == ',' || c.is_whitespace())
                .any(|t| t.trim_start_matches('#') == tag),
            Metadata::List(items) => items.iter().any(|item| item.contains_tag(tag)),
            _ => false,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Parser and serializer for the header block of a note.
pub trait MetadataCodec: Send + Sync {
    fn decode(&self, text: &str) -> RealCalResult<Metadata>;

    fn encode(&self, value: &Metadata) -> RealCalResult<String>;
}

/// YAML frontmatter codec backed by `serde_yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl MetadataCodec for YamlCodec {
    fn decode(&self, text: &str) -> RealCalResult<Metadata> {
        let value: Value =
            serde_yaml::from_str(text).map_err(|e| RealCalError::Metadata(e.to_string()))?;
        Ok(from_yaml(value))
    }

    fn encode(&self, value: &Metadata) -> RealCalResult<String> {
        serde_yaml::to_string(&to_yaml(value)).map_err(|e| RealCalError::Metadata(e.to_string()))
    }
}

fn from_yaml(value: Value) -> Metadata {
    match value {
        Value::Null => Metadata::Null,
        Value::Bool(b) => Metadata::Bool(b),
        Value::Number(n) => n.as_f64().map(Metadata::Number).unwrap_or(Metadata::Null),
        Value::String(s) => Metadata::String(s),
        Value::Sequence(items) => Metadata::List(items.into_iter().map(from_yaml).collect()),
        Value::Mapping(map) => Metadata::Map(
            map.into_iter()
                .filter_map(|(k, v)| Some((key_string(k)?, from_yaml(v))))
                .collect(),
        ),
        Value::Tagged(tagged) => from_yaml(tagged.value),
    }
}

fn key_string(key: Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn to_yaml(value: &Metadata) -> Value {
    match value {
        Metadata::Null => Value::Null,
        Metadata::Bool(b) => Value::Bool(*b),
        Metadata::Number(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                Value::Number((*n as i64).into())
            } else {
                Value::Number((*n).into())
            }
        }
        Metadata::String(s) => Value::String(s.clone()),
        Metadata::Date(d) => Value::String(format_date(*d)),
        Metadata::List(items) => Value::Sequence(items.iter().map(to_yaml).collect()),
        Metadata::Map(entries) => {
            let mut map = Mapping::new();
            for (k, v) in entries {
                map.insert(Value::String(k.clone()), to_yaml(v));
            }
            Value::Mapping(map)
        }
    }
}
