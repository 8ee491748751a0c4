//! Supported value kinds and their wire-level type tags.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The kinds of values a record field can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    #[serde(rename = "S")]
    String,
    #[serde(rename = "N")]
    Number,
    #[serde(rename = "B")]
    Binary,
    #[serde(rename = "BOOL")]
    Boolean,
    #[serde(rename = "L")]
    List,
    #[serde(rename = "M")]
    Map,
    #[serde(rename = "NULL")]
    Null,
    #[serde(rename = "SS")]
    StringSet,
    #[serde(rename = "NS")]
    NumberSet,
    #[serde(rename = "BS")]
    BinarySet,
}

impl ValueType {
    /// Every supported kind, in tag order.
    pub const ALL: [ValueType; 10] = [
        ValueType::Binary,
        ValueType::BinarySet,
        ValueType::Boolean,
        ValueType::List,
        ValueType::Map,
        ValueType::Null,
        ValueType::Number,
        ValueType::NumberSet,
        ValueType::String,
        ValueType::StringSet,
    ];

    /// Returns the wire-level type tag (`S`, `N`, `BOOL`, ...).
    pub fn tag(&self) -> &'static str {
        match self {
            ValueType::Binary => "B",
            ValueType::BinarySet => "BS",
            ValueType::Boolean => "BOOL",
            ValueType::List => "L",
            ValueType::Map => "M",
            ValueType::Null => "NULL",
            ValueType::Number => "N",
            ValueType::NumberSet => "NS",
            ValueType::String => "S",
            ValueType::StringSet => "SS",
        }
    }

    /// Parses a wire-level type tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.tag() == tag)
    }

    /// Returns true if the kind can be used as a partition or sort key.
    pub fn is_key_type(&self) -> bool {
        matches!(
            self,
            ValueType::String | ValueType::Number | ValueType::Binary
        )
    }

    /// Returns true for the three set kinds.
    pub fn is_set(&self) -> bool {
        matches!(
            self,
            ValueType::StringSet | ValueType::NumberSet | ValueType::BinarySet
        )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A typed attribute value, mirroring the store's wire representation.
///
/// Numbers are carried as their decimal string form so no precision is lost
/// between the caller and the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    S(String),
    N(String),
    B(Vec<u8>),
    Bool(bool),
    L(Vec<Value>),
    M(HashMap<String, Value>),
    Null,
    Ss(Vec<String>),
    Ns(Vec<String>),
    Bs(Vec<Vec<u8>>),
}

impl Value {
    /// Builds a number value from anything that prints as a decimal.
    pub fn number(n: impl fmt::Display) -> Self {
        Value::N(n.to_string())
    }

    /// Returns the kind of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::S(_) => ValueType::String,
            Value::N(_) => ValueType::Number,
            Value::B(_) => ValueType::Binary,
            Value::Bool(_) => ValueType::Boolean,
            Value::L(_) => ValueType::List,
            Value::M(_) => ValueType::Map,
            Value::Null => ValueType::Null,
            Value::Ss(_) => ValueType::StringSet,
            Value::Ns(_) => ValueType::NumberSet,
            Value::Bs(_) => ValueType::BinarySet,
        }
    }

    pub fn as_s(&self) -> Option<&str> {
        match self {
            Value::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_n(&self) -> Option<&str> {
        match self {
            Value::N(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::S(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::S(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::B(bytes)
    }
}

macro_rules! number_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::number(n)
                }
            }
        )*
    };
}

number_from!(i32, i64, u32, u64, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip() {
        for value_type in ValueType::ALL {
            assert_eq!(ValueType::from_tag(value_type.tag()), Some(value_type));
        }
        assert_eq!(ValueType::from_tag("X"), None);
    }

    #[test]
    fn test_tag_values() {
        assert_eq!(ValueType::String.tag(), "S");
        assert_eq!(ValueType::Number.tag(), "N");
        assert_eq!(ValueType::Boolean.tag(), "BOOL");
        assert_eq!(ValueType::NumberSet.to_string(), "NS");
    }

    #[test]
    fn test_key_types() {
        let keys: Vec<ValueType> = ValueType::ALL
            .into_iter()
            .filter(|t| t.is_key_type())
            .collect();
        assert_eq!(
            keys,
            vec![ValueType::Binary, ValueType::Number, ValueType::String]
        );
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from("a"), Value::S("a".to_string()));
        assert_eq!(Value::from(42), Value::N("42".to_string()));
        assert_eq!(Value::from(10.5), Value::N("10.5".to_string()));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(vec![1u8, 2]).value_type(), ValueType::Binary);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::number(7).as_n(), Some("7"));
        assert_eq!(Value::number(7).as_s(), None);
        assert!(Value::Null.is_null());
        assert_eq!(Value::Null.value_type(), ValueType::Null);
    }
}
