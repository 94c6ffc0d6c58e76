//! The typed argument list handed to an action.

use std::any::Any;
use std::collections::BTreeMap;

use crate::value::{ArgEnum, Value};

/// A bound flag.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    /// A presence flag was given.
    Present,
    /// A valued flag was given with this coerced value.
    Value(Value),
}

/// Positional values in signature order plus flags by canonical key.
///
/// A variadic parameter contributes exactly one entry: [`Value::Rest`] for a
/// raw capture, [`Value::List`] for a typed tail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    positional: Vec<Value>,
    flags: BTreeMap<String, FlagValue>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, value: Value) {
        self.positional.push(value);
    }

    pub(crate) fn set_flag(&mut self, key: &str, value: FlagValue) {
        self.flags.insert(key.to_string(), value);
    }

    /// Number of positional values.
    pub fn len(&self) -> usize {
        self.positional.len()
    }

    /// True if no positional value was bound. Flags are not counted.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.positional
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    pub fn str(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(Value::as_str)
    }

    pub fn int(&self, index: usize) -> Option<i64> {
        self.get(index).and_then(Value::as_int)
    }

    pub fn float(&self, index: usize) -> Option<f64> {
        self.get(index).and_then(Value::as_float)
    }

    pub fn bool(&self, index: usize) -> Option<bool> {
        self.get(index).and_then(Value::as_bool)
    }

    /// The positional value at `index` as a Rust enum.
    pub fn enumeration<E: ArgEnum>(&self, index: usize) -> Option<E> {
        self.get(index)
            .and_then(Value::as_enum)
            .and_then(|e| e.to_enum::<E>())
    }

    pub fn rest(&self, index: usize) -> Option<&[String]> {
        self.get(index).and_then(Value::as_rest)
    }

    pub fn list(&self, index: usize) -> Option<&[Value]> {
        self.get(index).and_then(Value::as_list)
    }

    pub fn custom<T: Any>(&self, index: usize) -> Option<&T> {
        self.get(index).and_then(Value::downcast_ref)
    }

    /// Returns true if the flag with canonical key `key` was given.
    pub fn has_flag(&self, key: &str) -> bool {
        self.flags.contains_key(key)
    }

    /// Value of a valued flag. Presence flags have none.
    pub fn flag(&self, key: &str) -> Option<&Value> {
        match self.flags.get(key)? {
            FlagValue::Value(value) => Some(value),
            FlagValue::Present => None,
        }
    }

    pub fn flags(&self) -> &BTreeMap<String, FlagValue> {
        &self.flags
    }
}
