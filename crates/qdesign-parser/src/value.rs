use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A component option or variable value, before or after parsing.
///
/// Integers and floats are kept apart so parsing a number hands back the same kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Seq(Vec<ParamValue>),
    Map(IndexMap<String, ParamValue>),
}

impl ParamValue {
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&IndexMap<String, ParamValue>> {
        match self {
            ParamValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Reads a two-element numeric sequence as an `[x, y]` coordinate.
    #[must_use]
    pub fn as_xy(&self) -> Option<[f64; 2]> {
        match self {
            ParamValue::Seq(items) if items.len() == 2 => {
                Some([items[0].as_f64()?, items[1].as_f64()?])
            }
            _ => None,
        }
    }

    /// Every string reachable from this value, in document order.
    #[must_use]
    pub fn strings(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_strings(self, &mut out);
        out
    }

    /// Replaces every string equal to `from`, however deeply nested. Returns the count.
    pub fn replace_strings(&mut self, from: &str, to: &str) -> usize {
        match self {
            ParamValue::String(s) if s == from => {
                *s = to.to_string();
                1
            }
            ParamValue::Seq(items) => items.iter_mut().map(|v| v.replace_strings(from, to)).sum(),
            ParamValue::Map(m) => m.values_mut().map(|v| v.replace_strings(from, to)).sum(),
            _ => 0,
        }
    }

    #[must_use]
    pub fn to_json_compact_string(&self) -> String {
        // IndexMap serialization keeps insertion order, so the output is stable.
        serde_json::to_string(self).unwrap_or_else(|_| "null".to_string())
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, Error> {
        serde_yaml::from_str(s).map_err(|e| Error::Yaml(e.to_string()))
    }
}

fn collect_strings<'a>(value: &'a ParamValue, out: &mut Vec<&'a str>) {
    match value {
        ParamValue::String(s) => out.push(s),
        ParamValue::Seq(items) => items.iter().for_each(|v| collect_strings(v, out)),
        ParamValue::Map(m) => m.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Null => f.write_str("null"),
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::String(s) => f.write_str(s),
            ParamValue::Seq(_) | ParamValue::Map(_) => f.write_str(&self.to_json_compact_string()),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(i64::from(v))
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::String(v)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(v: Vec<T>) -> Self {
        ParamValue::Seq(v.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, ParamValue>> for ParamValue {
    fn from(v: IndexMap<String, ParamValue>) -> Self {
        ParamValue::Map(v)
    }
}
