// Sorter parameters
// Fixed per-sorter tables of defaults + descriptions, and validated user overrides

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use std::fmt;

use crate::error::{Result, SorterError};

/// A scalar parameter value
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::Str(_) => "string",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, ParamValue::Int(_) | ParamValue::Float(_))
    }

    /// Parse the textual form produced by `Display`
    pub fn parse(text: &str) -> ParamValue {
        match text {
            "True" => return ParamValue::Bool(true),
            "False" => return ParamValue::Bool(false),
            _ => {}
        }
        if let Ok(v) = text.parse::<i64>() {
            return ParamValue::Int(v);
        }
        if let Ok(v) = text.parse::<f64>() {
            return ParamValue::Float(v);
        }
        ParamValue::Str(text.to_string())
    }
}

/// Render a float so it always reads back as a float ("30000.0", not "30000")
pub fn format_float(value: f64) -> String {
    format!("{:?}", value)
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(true) => write!(f, "True"),
            ParamValue::Bool(false) => write!(f, "False"),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", format_float(*v)),
            ParamValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ParamValue::Bool(v) => serializer.serialize_bool(*v),
            ParamValue::Int(v) => serializer.serialize_i64(*v),
            ParamValue::Float(v) => serializer.serialize_f64(*v),
            ParamValue::Str(s) => serializer.serialize_str(s),
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
        ParamValue::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

/// Compile-time default for a table entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamDefault {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(&'static str),
}

impl ParamDefault {
    pub fn value(&self) -> ParamValue {
        match *self {
            ParamDefault::Bool(v) => ParamValue::Bool(v),
            ParamDefault::Int(v) => ParamValue::Int(v),
            ParamDefault::Float(v) => ParamValue::Float(v),
            ParamDefault::Str(v) => ParamValue::Str(v.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub default: ParamDefault,
    pub description: &'static str,
}

/// Ordered name -> value mapping
///
/// Keeps insertion order so generated parameter files are stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSet {
    entries: Vec<(String, ParamValue)>,
}

impl ParamSet {
    pub fn new() -> Self {
        ParamSet::default()
    }

    /// Insert or replace; replacing keeps the original position
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, ParamValue)> for ParamSet {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        let mut set = ParamSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

impl Serialize for ParamSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ParamSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ParamSetVisitor;

        impl<'de> Visitor<'de> for ParamSetVisitor {
            type Value = ParamSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a map of parameter names to scalar values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<ParamSet, A::Error> {
                let mut set = ParamSet::new();
                while let Some((name, value)) = access.next_entry::<String, ParamValue>()? {
                    set.insert(name, value);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(ParamSetVisitor)
    }
}

/// A sorter's fixed parameter table
#[derive(Debug, Clone, Copy)]
pub struct ParamTable {
    specs: &'static [ParamSpec],
}

impl ParamTable {
    pub const fn new(specs: &'static [ParamSpec]) -> Self {
        ParamTable { specs }
    }

    pub fn specs(&self) -> &'static [ParamSpec] {
        self.specs
    }

    pub fn get(&self, name: &str) -> Option<&'static ParamSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn description(&self, name: &str) -> Option<&'static str> {
        self.get(name).map(|s| s.description)
    }

    pub fn defaults(&self) -> ParamSet {
        self.specs
            .iter()
            .map(|s| (s.name.to_string(), s.default.value()))
            .collect()
    }

    /// Parse one `key=value` text value, keeping string parameters as strings
    ///
    /// Names outside the table fall back to `ParamValue::parse`.
    pub fn parse_value(&self, name: &str, text: &str) -> ParamValue {
        match self.get(name).map(|s| s.default) {
            Some(ParamDefault::Str(_)) => ParamValue::Str(text.to_string()),
            _ => ParamValue::parse(text),
        }
    }

    /// Defaults with `overrides` applied on top
    ///
    /// Unknown names are rejected. Numbers may replace numbers (int or float);
    /// booleans and strings must keep their type. Strings must fit on one line.
    pub fn merge(&self, overrides: &ParamSet) -> Result<ParamSet> {
        let mut merged = self.defaults();
        for (name, value) in overrides.iter() {
            let spec = self.get(name).ok_or_else(|| SorterError::InvalidParameter {
                name: name.to_string(),
                reason: "unknown parameter".to_string(),
            })?;

            let default = spec.default.value();
            let compatible = (default.is_numeric() && value.is_numeric())
                || std::mem::discriminant(&default) == std::mem::discriminant(value);
            if !compatible {
                return Err(SorterError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!(
                        "expected {}, got {}",
                        default.type_name(),
                        value.type_name()
                    ),
                });
            }

            if let ParamValue::Str(s) = value {
                if s.contains(['\n', '\r']) {
                    return Err(SorterError::InvalidParameter {
                        name: name.to_string(),
                        reason: "value must not contain line breaks".to_string(),
                    });
                }
            }

            merged.insert(name, value.clone());
        }
        Ok(merged)
    }
}
