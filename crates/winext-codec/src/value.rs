//! Attribute values produced by decoding and consumed by encoding.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Decoded attributes keyed by name. Ordered so output is stable.
pub type AttributeMap = BTreeMap<String, AttributeValue>;

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            Self::Boolean(v) => Some(if *v { 1.0 } else { 0.0 }),
            Self::String(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Float(v) => Some(*v as i64),
            Self::Boolean(v) => Some(*v as i64),
            Self::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
        }
    }

    /// Parse a command-line style value: `true`/`false`, integer, float,
    /// anything else is kept as a string.
    pub fn parse_loose(text: &str) -> Self {
        let trimmed = text.trim();
        match trimmed {
            "true" | "on" => return Self::Boolean(true),
            "false" | "off" => return Self::Boolean(false),
            _ => {}
        }
        if let Ok(v) = trimmed.parse::<i64>() {
            return Self::Integer(v);
        }
        if let Ok(v) = trimmed.parse::<f64>() {
            if v.is_finite() {
                return Self::Float(v);
            }
        }
        Self::String(trimmed.to_string())
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{}", v),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_loose() {
        assert_eq!(AttributeValue::parse_loose("on"), AttributeValue::Boolean(true));
        assert_eq!(AttributeValue::parse_loose("42"), AttributeValue::Integer(42));
        assert_eq!(AttributeValue::parse_loose("25.5"), AttributeValue::Float(25.5));
        assert_eq!(
            AttributeValue::parse_loose("abc"),
            AttributeValue::String("abc".to_string())
        );
    }

    #[test]
    fn test_untagged_json() {
        let mut map = AttributeMap::new();
        map.insert("temperature".into(), AttributeValue::Float(25.0));
        map.insert("smokeAlarm".into(), AttributeValue::Boolean(true));
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["temperature"], serde_json::json!(25.0));
        assert_eq!(json["smokeAlarm"], serde_json::json!(true));
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(AttributeValue::Boolean(true).as_f64(), Some(1.0));
        assert_eq!(AttributeValue::Float(2.9).as_i64(), Some(2));
        assert_eq!(AttributeValue::from("x").as_f64(), None);
    }
}
