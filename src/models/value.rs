//! Typed attribute values.
//!
//! Interchange documents carry attribute values as text (GraphML) or as JSON
//! scalars (GraphSON). [`AttributeType`] describes a declared primitive type and
//! [`AttributeValue`] holds a coerced value.

use crate::{Error, Result};
use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;

/// Declared primitive type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttributeType {
    /// UTF-8 text.
    #[default]
    String,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit float.
    Float,
    /// Boolean.
    Boolean,
    /// Ordered list of values.
    List,
}

impl AttributeType {
    /// Returns all attribute types.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::String,
            Self::Integer,
            Self::Float,
            Self::Boolean,
            Self::List,
        ]
    }

    /// Returns the canonical name used by writers.
    ///
    /// Integers are written as `long` and floats as `double` so that `i64` and
    /// `f64` values survive a round trip through other implementations.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "long",
            Self::Float => "double",
            Self::Boolean => "boolean",
            Self::List => "list",
        }
    }

    /// Parses a type name from either interchange format.
    ///
    /// Returns `None` if the name is not recognized.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "string" => Some(Self::String),
            "int" | "integer" | "long" => Some(Self::Integer),
            "float" | "double" => Some(Self::Float),
            "boolean" | "bool" => Some(Self::Boolean),
            "list" => Some(Self::List),
            _ => None,
        }
    }

    /// Returns the type-appropriate default used for empty values.
    #[must_use]
    pub const fn default_value(&self) -> AttributeValue {
        match self {
            Self::String => AttributeValue::String(String::new()),
            Self::Integer => AttributeValue::Integer(0),
            Self::Float => AttributeValue::Float(0.0),
            Self::Boolean => AttributeValue::Boolean(false),
            Self::List => AttributeValue::List(Vec::new()),
        }
    }

    /// Coerces textual content to a value of this type.
    ///
    /// Empty (or whitespace-only, for non-string types) text yields the type
    /// default. Strings are taken verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the text does not parse as this type.
    pub fn coerce(&self, text: &str) -> Result<AttributeValue> {
        if matches!(self, Self::String) {
            return Ok(AttributeValue::String(text.to_string()));
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(self.default_value());
        }

        match self {
            Self::String => Ok(AttributeValue::String(text.to_string())),
            Self::Integer => trimmed
                .parse::<i64>()
                .map(AttributeValue::Integer)
                .map_err(|e| Error::parse(format!("invalid integer '{trimmed}': {e}"))),
            Self::Float => trimmed
                .parse::<f64>()
                .map(AttributeValue::Float)
                .map_err(|e| Error::parse(format!("invalid float '{trimmed}': {e}"))),
            Self::Boolean => match trimmed.to_lowercase().as_str() {
                "true" | "1" => Ok(AttributeValue::Boolean(true)),
                "false" | "0" => Ok(AttributeValue::Boolean(false)),
                _ => Err(Error::parse(format!("invalid boolean '{trimmed}'"))),
            },
            Self::List => {
                let json: Value = serde_json::from_str(trimmed)
                    .map_err(|e| Error::parse(format!("invalid list '{trimmed}': {e}")))?;
                match AttributeValue::from_json(&json)? {
                    Some(list @ AttributeValue::List(_)) => Ok(list),
                    _ => Err(Error::parse(format!(
                        "invalid list '{trimmed}': expected a JSON array"
                    ))),
                }
            },
        }
    }
}

impl FromStr for AttributeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| Error::parse(format!("unknown attribute type '{s}'")))
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// UTF-8 text.
    String(String),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit float.
    Float(f64),
    /// Boolean.
    Boolean(bool),
    /// Ordered list of values.
    List(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Returns the type of this value.
    #[must_use]
    pub const fn attribute_type(&self) -> AttributeType {
        match self {
            Self::String(_) => AttributeType::String,
            Self::Integer(_) => AttributeType::Integer,
            Self::Float(_) => AttributeType::Float,
            Self::Boolean(_) => AttributeType::Boolean,
            Self::List(_) => AttributeType::List,
        }
    }

    /// Returns the string content if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Renders the value as text, the inverse of [`AttributeType::coerce`].
    ///
    /// Lists render as JSON array text.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::List(_) => self.to_json().to_string(),
        }
    }

    /// Converts to an untyped JSON value.
    ///
    /// Non-finite floats have no JSON representation and become `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Integer(i) => Value::Number(Number::from(*i)),
            Self::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::Boolean(b) => Value::Bool(*b),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }

    /// Infers a value from an untyped JSON value.
    ///
    /// Numbers that fit in `i64` become integers, other numbers floats.
    /// Returns `Ok(None)` for `null`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for JSON objects, which have no attribute type.
    pub fn from_json(value: &Value) -> Result<Option<Self>> {
        let converted = match value {
            Value::Null => return Ok(None),
            Value::Bool(b) => Self::Boolean(*b),
            Value::Number(n) => n.as_i64().map_or_else(
                || Self::Float(n.as_f64().unwrap_or(f64::NAN)),
                Self::Integer,
            ),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(v) = Self::from_json(item)? {
                        list.push(v);
                    }
                }
                Self::List(list)
            },
            Value::Object(_) => {
                return Err(Error::parse(
                    "object-valued attributes are not supported".to_string(),
                ));
            },
        };
        Ok(Some(converted))
    }

    /// Converts to the value's textual form under a wider declared type.
    ///
    /// Used by writers when a column mixes types: integers widen to floats and
    /// anything widens to string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Write`] if the value cannot be represented as `target`.
    pub fn text_as(&self, target: AttributeType) -> Result<String> {
        match (self.attribute_type(), target) {
            (found, expected) if found == expected => Ok(self.to_text()),
            (_, AttributeType::String) | (AttributeType::Integer, AttributeType::Float) => {
                Ok(self.to_text())
            },
            (found, expected) => Err(Error::Write(format!(
                "value of type {found} cannot be written under declared type {expected}"
            ))),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for AttributeValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("string", AttributeType::String)]
    #[test_case("int", AttributeType::Integer)]
    #[test_case("LONG", AttributeType::Integer)]
    #[test_case("integer", AttributeType::Integer)]
    #[test_case("float", AttributeType::Float)]
    #[test_case("double", AttributeType::Float)]
    #[test_case("boolean", AttributeType::Boolean)]
    #[test_case("list", AttributeType::List)]
    fn test_type_parse(name: &str, expected: AttributeType) {
        assert_eq!(AttributeType::parse(name), Some(expected));
    }

    #[test]
    fn test_type_parse_unknown() {
        assert!(AttributeType::parse("map").is_none());
        assert!("uuid".parse::<AttributeType>().is_err());
    }

    #[test]
    fn test_coerce_typed_values() {
        assert_eq!(
            AttributeType::Integer.coerce(" 29 ").unwrap(),
            AttributeValue::Integer(29)
        );
        assert_eq!(
            AttributeType::Float.coerce("0.5").unwrap(),
            AttributeValue::Float(0.5)
        );
        assert_eq!(
            AttributeType::Boolean.coerce("TRUE").unwrap(),
            AttributeValue::Boolean(true)
        );
        assert_eq!(
            AttributeType::String.coerce("  padded ").unwrap(),
            AttributeValue::String("  padded ".to_string())
        );
        assert_eq!(
            AttributeType::List.coerce(r#"["a", 1, 2.5]"#).unwrap(),
            AttributeValue::List(vec![
                AttributeValue::String("a".to_string()),
                AttributeValue::Integer(1),
                AttributeValue::Float(2.5),
            ])
        );
    }

    #[test]
    fn test_coerce_empty_uses_type_default() {
        for ty in AttributeType::all() {
            assert_eq!(ty.coerce("").unwrap(), ty.default_value());
        }
    }

    #[test]
    fn test_coerce_rejects_bad_text() {
        assert!(AttributeType::Integer.coerce("twelve").is_err());
        assert!(AttributeType::Float.coerce("1.2.3").is_err());
        assert!(AttributeType::Boolean.coerce("yes").is_err());
        assert!(AttributeType::List.coerce("{}").is_err());
    }

    #[test]
    fn test_text_roundtrips_through_coerce() {
        let values = [
            AttributeValue::Integer(-7),
            AttributeValue::Float(1.0),
            AttributeValue::Float(1e-12),
            AttributeValue::Boolean(false),
            AttributeValue::List(vec![AttributeValue::Float(3.0)]),
        ];
        for value in values {
            let back = value.attribute_type().coerce(&value.to_text()).unwrap();
            assert_eq!(back, value);
        }
    }

    #[test]
    fn test_from_json_infers_types() {
        let json: Value = serde_json::json!([1, 1.5, "x", true, null]);
        let value = AttributeValue::from_json(&json).unwrap().unwrap();
        assert_eq!(
            value,
            AttributeValue::List(vec![
                AttributeValue::Integer(1),
                AttributeValue::Float(1.5),
                AttributeValue::String("x".to_string()),
                AttributeValue::Boolean(true),
            ])
        );
        assert!(AttributeValue::from_json(&Value::Null).unwrap().is_none());
        assert!(AttributeValue::from_json(&serde_json::json!({"a": 1})).is_err());
    }

    #[test]
    fn test_text_as_widening() {
        assert_eq!(
            AttributeValue::Integer(5)
                .text_as(AttributeType::Float)
                .unwrap(),
            "5"
        );
        assert_eq!(
            AttributeValue::Boolean(true)
                .text_as(AttributeType::String)
                .unwrap(),
            "true"
        );
        assert!(
            AttributeValue::Float(0.5)
                .text_as(AttributeType::Integer)
                .is_err()
        );
    }
}
