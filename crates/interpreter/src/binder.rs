//! Argument binding.
//!
//! Distributes folded values into the declared parameter slots of a command.
//! Each step only fills slots that are still unset:
//! 1. keyword entries from every map value, later keys overwriting earlier ones
//! 2. positional values, index-aligned with the declaration order
//! 3. defaults

use indexmap::IndexMap;

use crate::error::{InterpreterError, Result};
use crate::value::Value;

/// Default values keyed by parameter name.
pub type Defaults = IndexMap<String, Value>;

/// Declared parameters in order, each possibly unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSet {
    slots: IndexMap<String, Option<Value>>,
}

impl SlotSet {
    pub fn new<S: AsRef<str>>(params: &[S]) -> Self {
        Self {
            slots: params
                .iter()
                .map(|param| (param.as_ref().to_string(), None))
                .collect(),
        }
    }

    pub fn get(&self, param: &str) -> Option<&Value> {
        self.slots.get(param).and_then(Option::as_ref)
    }

    pub fn is_complete(&self) -> bool {
        self.slots.values().all(Option::is_some)
    }

    /// Parameters still unset, in declaration order.
    pub fn missing(&self) -> Vec<&str> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.is_none())
            .map(|(param, _)| param.as_str())
            .collect()
    }

    pub fn into_arguments(self) -> Result<Arguments> {
        if !self.is_complete() {
            return Err(InterpreterError::MissingArguments(
                self.missing().into_iter().map(str::to_string).collect(),
            ));
        }
        Ok(Arguments {
            values: self
                .slots
                .into_iter()
                .filter_map(|(param, slot)| slot.map(|value| (param, value)))
                .collect(),
        })
    }

    fn fill(&mut self, param: &str, value: Value) {
        if let Some(slot) = self.slots.get_mut(param) {
            if slot.is_none() {
                *slot = Some(value);
            }
        }
    }

    fn fill_at(&mut self, index: usize, value: Value) {
        if let Some((_, slot)) = self.slots.get_index_mut(index) {
            if slot.is_none() {
                *slot = Some(value);
            }
        }
    }
}

/// A complete binding: every declared parameter has a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arguments {
    values: IndexMap<String, Value>,
}

impl Arguments {
    pub fn get(&self, param: &str) -> Option<&Value> {
        self.values.get(param)
    }

    /// The parameter's value when it is a single scalar.
    pub fn scalar(&self, param: &str) -> Result<&str> {
        self.get(param)
            .and_then(Value::as_scalar)
            .ok_or_else(|| InterpreterError::ArgumentType {
                name: param.to_string(),
                expected: "a single value",
            })
    }

    /// The parameter's scalar or list items.
    pub fn scalars(&self, param: &str) -> Result<Vec<&str>> {
        match self.get(param) {
            Some(value) if !value.is_map() => Ok(value.scalars()),
            _ => Err(InterpreterError::ArgumentType {
                name: param.to_string(),
                expected: "a value or a list of values",
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values
            .iter()
            .map(|(param, value)| (param.as_str(), value))
    }
}

/// Binds `values` to `params`, falling back to `defaults`.
pub fn bind<S: AsRef<str>>(values: &[Value], params: &[S], defaults: &Defaults) -> SlotSet {
    let mut slots = SlotSet::new(params);

    let mut keywords: IndexMap<&str, &str> = IndexMap::new();
    let mut positional: Vec<&Value> = Vec::new();
    for value in values {
        match value {
            Value::Map(map) => {
                keywords.extend(map.iter().map(|(key, entry)| (key.as_str(), entry.as_str())))
            }
            other => positional.push(other),
        }
    }

    for param in params {
        if let Some(entry) = keywords.get(param.as_ref()) {
            slots.fill(param.as_ref(), Value::scalar(*entry));
        }
    }

    for (index, value) in positional.into_iter().enumerate() {
        slots.fill_at(index, value.clone());
    }

    for param in params {
        if let Some(value) = defaults.get(param.as_ref()) {
            slots.fill(param.as_ref(), value.clone());
        }
    }

    log::trace!("bound arguments, missing: {:?}", slots.missing());
    slots
}
