//! Parsed configuration tree
//!
//! Both the JSON and the YAML parser produce this tree. It is only used
//! during resolution: the tree is validated and converted into the typed
//! `ResolvedConfig` once, and never consulted again.

use indexmap::IndexMap;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// A generic parsed configuration value
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum Value {
    /// Null value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Unsigned integer too large for `Integer`
    UInteger(u64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Sequence of values
    Sequence(Vec<Value>),
    /// Mapping of string keys to values
    Mapping(IndexMap<String, Value>),
}

impl Value {
    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is a mapping
    pub fn is_mapping(&self) -> bool {
        matches!(self, Value::Mapping(_))
    }

    /// Get as i64 if this is an Integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as mapping if this is a Mapping
    pub fn as_mapping(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Look up a key if this is a Mapping
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Returns the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) | Value::UInteger(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    /// Coerce a scalar to a string; `path` names the value in errors
    ///
    /// Null becomes the empty string. Sequences and mappings are rejected.
    pub fn coerce_string(&self, path: &str) -> Result<String> {
        match self {
            Value::Null => Ok(String::new()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Integer(i) => Ok(i.to_string()),
            Value::UInteger(u) => Ok(u.to_string()),
            Value::Float(f) => Ok(f.to_string()),
            Value::String(s) => Ok(s.clone()),
            _ => Err(Error::invalid_value(path, "string", self.type_name())),
        }
    }

    /// Coerce to an integer, accepting numeric strings
    pub fn coerce_i64(&self, path: &str) -> Result<i64> {
        match self {
            Value::Integer(i) => Ok(*i),
            Value::UInteger(u) => Err(Error::invalid_value(
                path,
                "integer",
                format!("out of range integer ({})", u),
            )),
            Value::String(s) => s.trim().parse().map_err(|_| {
                Error::invalid_value(path, "integer", format!("string (\"{}\")", s))
            }),
            _ => Err(Error::invalid_value(path, "integer", self.type_name())),
        }
    }

    /// Flatten a mapping of scalars into a string map
    ///
    /// Null is treated as an empty mapping, so `node: ~` in YAML behaves
    /// like an absent section.
    pub fn coerce_string_map(&self, path: &str) -> Result<IndexMap<String, String>> {
        match self {
            Value::Null => Ok(IndexMap::new()),
            Value::Mapping(map) => map
                .iter()
                .map(|(k, v)| -> Result<(String, String)> {
                    Ok((k.clone(), v.coerce_string(&format!("{}.{}", path, k))?))
                })
                .collect(),
            _ => Err(Error::invalid_value(path, "mapping", self.type_name())),
        }
    }

    /// Key form of a scalar; YAML allows `1: one` or `true: yes`
    fn into_key(self) -> std::result::Result<String, String> {
        if matches!(self, Value::Sequence(_) | Value::Mapping(_)) {
            return Err(format!(
                "mapping keys must be scalars, got {}",
                self.type_name()
            ));
        }
        match self {
            Value::String(s) => Ok(s),
            scalar => Ok(scalar.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::UInteger(u) => write!(f, "{}", u),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Sequence(seq) => {
                write!(f, "[")?;
                for (i, v) in seq.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Mapping(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a configuration value")
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> std::result::Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> std::result::Result<Value, E> {
        Ok(Value::Integer(i))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> std::result::Result<Value, E> {
        Ok(i64::try_from(u).map_or(Value::UInteger(u), Value::Integer))
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> std::result::Result<Value, E> {
        Ok(Value::Float(f))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> std::result::Result<Value, E> {
        Ok(Value::String(s.to_owned()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> std::result::Result<Value, E> {
        Ok(Value::String(s))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Sequence(items))
    }

    fn visit_map<A>(self, mut access: A) -> std::result::Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = IndexMap::new();
        while let Some(key) = access.next_key::<Value>()? {
            let key = key.into_key().map_err(de::Error::custom)?;
            let value = access.next_value()?;
            map.insert(key, value);
        }
        Ok(Value::Mapping(map))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}
