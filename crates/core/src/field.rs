//! Field descriptors: immutable metadata for one named, typed record field.

use std::collections::HashSet;
use std::hash::Hash;

use crate::error::{EngineError, Result};
use crate::types::{Value, ValueType};

/// Maximum number of significant decimal digits a number may carry.
pub const MAX_NUMBER_DIGITS: usize = 38;

/// Metadata for one record field.
///
/// Descriptors never hold values. Per-instance values live in
/// [`Record`](crate::record::Record), so a descriptor can be shared by every
/// record of its definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    value_type: ValueType,
    partition_key: bool,
    sort_key: bool,
    nullable: bool,
}

impl FieldDescriptor {
    /// Creates a plain, non-nullable field.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            partition_key: false,
            sort_key: false,
            nullable: false,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Number)
    }

    pub fn binary(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Binary)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Boolean)
    }

    pub fn list(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::List)
    }

    pub fn map(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Map)
    }

    pub fn string_set(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::StringSet)
    }

    pub fn number_set(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::NumberSet)
    }

    pub fn binary_set(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::BinarySet)
    }

    /// Marks this field as the table's partition (hash) key.
    pub fn partition_key(mut self) -> Self {
        self.partition_key = true;
        self
    }

    /// Marks this field as the table's sort (range) key.
    pub fn sort_key(mut self) -> Self {
        self.sort_key = true;
        self
    }

    /// Allows explicit `Null` values.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn is_partition_key(&self) -> bool {
        self.partition_key
    }

    pub fn is_sort_key(&self) -> bool {
        self.sort_key
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_key(&self) -> bool {
        self.partition_key || self.sort_key
    }

    /// Checks that `value` may be stored in this field.
    ///
    /// `Null` is accepted only for nullable fields. Any other value must have
    /// this field's kind; numbers must be decimal with at most
    /// [`MAX_NUMBER_DIGITS`] digits, sets must be non-empty and duplicate-free.
    pub fn validate(&self, value: &Value) -> Result<()> {
        if value.is_null() {
            return if self.nullable {
                Ok(())
            } else {
                Err(EngineError::Validation(format!(
                    "Attribute '{}' is not nullable",
                    self.name
                )))
            };
        }

        if value.value_type() != self.value_type {
            return Err(EngineError::Validation(format!(
                "Attribute '{}' expects type {} but got {}",
                self.name,
                self.value_type,
                value.value_type()
            )));
        }

        match value {
            Value::N(n) => validate_number(&self.name, n),
            Value::Ns(numbers) => {
                for n in numbers {
                    validate_number(&self.name, n)?;
                }
                validate_set(&self.name, numbers)
            }
            Value::Ss(strings) => validate_set(&self.name, strings),
            Value::Bs(blobs) => validate_set(&self.name, blobs),
            _ => Ok(()),
        }
    }
}

/// Checks that `raw` is a decimal number within the precision limit.
///
/// Accepts an optional sign, digits with an optional fractional part and an
/// optional exponent. Only mantissa digits count towards the limit.
pub fn validate_number(attribute: &str, raw: &str) -> Result<()> {
    let not_numeric = || {
        EngineError::Validation(format!(
            "Attribute '{}' is not a number: {:?}",
            attribute, raw
        ))
    };

    let unsigned = strip_sign(raw);
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(i) => (&unsigned[..i], Some(&unsigned[i + 1..])),
        None => (unsigned, None),
    };

    if let Some(exponent) = exponent {
        let exponent = strip_sign(exponent);
        if exponent.is_empty() || !all_digits(exponent) {
            return Err(not_numeric());
        }
    }

    let (integer, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if (integer.is_empty() && fraction.is_empty()) || !all_digits(integer) || !all_digits(fraction)
    {
        return Err(not_numeric());
    }

    let digits = integer.len() + fraction.len();
    if digits > MAX_NUMBER_DIGITS {
        return Err(EngineError::Validation(format!(
            "Attribute '{}' has {} digits, more than the maximum precision of {}",
            attribute, digits, MAX_NUMBER_DIGITS
        )));
    }

    Ok(())
}

fn strip_sign(s: &str) -> &str {
    s.strip_prefix(['+', '-']).unwrap_or(s)
}

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

fn validate_set<T: Eq + Hash>(attribute: &str, members: &[T]) -> Result<()> {
    if members.is_empty() {
        return Err(EngineError::Validation(format!(
            "Attribute '{}' is an empty set",
            attribute
        )));
    }

    let unique: HashSet<&T> = members.iter().collect();
    if unique.len() != members.len() {
        return Err(EngineError::Validation(format!(
            "Attribute '{}' contains duplicate set members",
            attribute
        )));
    }

    Ok(())
}
