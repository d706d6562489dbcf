// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The parameter contract between loosely-typed caller input and typed handler logic.
//!
//! Callers send a JSON object. Handlers pull typed values out of it with
//! [`ParameterSet::required`], [`ParameterSet::optional`] and [`ParameterSet::optional_or`];
//! every coercion failure becomes the same `'<key>' must be <shape> (got <value>)` error.

mod composite;

use std::fmt;

use serde_json::{Map, Value};

use crate::error::ToolError;

pub use composite::{ColorMap, PointList, TabStops};

/// A value that can be coerced out of a loosely-typed parameter.
pub trait FromParam: Sized {
    /// Shape description used in error messages, e.g. `"an integer"`.
    const EXPECTED: &'static str;

    fn from_param(value: &Value) -> Option<Self>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    values: Map<String, Value>,
}

impl ParameterSet {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Accepts a JSON object; `null` yields an empty set.
    pub fn from_value(value: Value) -> Result<Self, ToolError> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            Value::Null => Ok(Self::default()),
            other => Err(ToolError::invalid_request(format!(
                "parameters must be a JSON object (got {})",
                describe(&other)
            ))),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// The raw value for `key`, also trying its camelCase/snake_case twin. `null` counts as
    /// absent.
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.values
            .get(key)
            .filter(|value| !value.is_null())
            .or_else(|| self.values.get(&twin_key(key)).filter(|value| !value.is_null()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.raw(key).is_some()
    }

    pub fn required<T: FromParam>(&self, key: &str) -> Result<T, ToolError> {
        let value = self.raw(key).ok_or_else(|| ToolError::missing_parameter(key))?;
        coerce(key, value)
    }

    pub fn optional<T: FromParam>(&self, key: &str) -> Result<Option<T>, ToolError> {
        self.raw(key).map(|value| coerce(key, value)).transpose()
    }

    pub fn optional_or<T: FromParam>(&self, key: &str, default: T) -> Result<T, ToolError> {
        Ok(self.optional(key)?.unwrap_or(default))
    }

    /// Reads a required 1-based index bounded by `len` and returns it zero-based.
    pub fn index_in(&self, key: &str, len: usize) -> Result<usize, ToolError> {
        let index: i64 = self.required(key)?;
        check_index(key, index, len)
    }

    /// Like [`Self::index_in`], but `None` when the key is absent.
    pub fn optional_index_in(&self, key: &str, len: usize) -> Result<Option<usize>, ToolError> {
        self.optional::<i64>(key)?.map(|index| check_index(key, index, len)).transpose()
    }
}

impl From<Map<String, Value>> for ParameterSet {
    fn from(values: Map<String, Value>) -> Self {
        Self::new(values)
    }
}

fn coerce<T: FromParam>(key: &str, value: &Value) -> Result<T, ToolError> {
    T::from_param(value).ok_or_else(|| ToolError::InvalidParameter {
        key: key.to_owned(),
        expected: T::EXPECTED,
        actual: describe(value),
    })
}

fn check_index(key: &str, index: i64, len: usize) -> Result<usize, ToolError> {
    let max = i64::try_from(len).unwrap_or(i64::MAX);
    ensure_range(key, index, 1, max)?;
    Ok((index - 1) as usize)
}

pub fn ensure_range(key: &str, value: i64, min: i64, max: i64) -> Result<i64, ToolError> {
    if value < min || value > max {
        return Err(ToolError::out_of_range(key, min, max, value));
    }
    Ok(value)
}

pub fn ensure_one_of<T>(key: &str, value: T, allowed: &[T]) -> Result<T, ToolError>
where
    T: PartialEq + fmt::Display,
{
    if allowed.contains(&value) {
        return Ok(value);
    }
    Err(ToolError::not_one_of(key, allowed, value))
}

/// Short rendering of a value for error messages.
pub(crate) fn describe(value: &Value) -> String {
    const MAX_CHARS: usize = 40;
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if s.chars().count() > MAX_CHARS => {
            let head = s.chars().take(MAX_CHARS).collect::<String>();
            format!("\"{head}...\"")
        }
        Value::String(s) => format!("\"{s}\""),
        Value::Array(_) => "an array".to_owned(),
        Value::Object(_) => "an object".to_owned(),
    }
}

/// `pageIndex <-> page_index`.
fn twin_key(key: &str) -> String {
    if key.contains('_') {
        let mut out = String::with_capacity(key.len());
        let mut upper = false;
        for ch in key.chars() {
            if ch == '_' {
                upper = true;
            } else if upper {
                out.push(ch.to_ascii_uppercase());
                upper = false;
            } else {
                out.push(ch);
            }
        }
        out
    } else {
        let mut out = String::with_capacity(key.len() + 4);
        for ch in key.chars() {
            if ch.is_ascii_uppercase() {
                out.push('_');
                out.push(ch.to_ascii_lowercase());
            } else {
                out.push(ch);
            }
        }
        out
    }
}

impl FromParam for i64 {
    const EXPECTED: &'static str = "an integer";

    fn from_param(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| {
                let f = n.as_f64()?;
                (f.fract() == 0.0 && f.abs() < 9.0e15).then_some(f as i64)
            }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

macro_rules! unsigned_from_param {
    ($($ty:ty),*) => {$(
        impl FromParam for $ty {
            const EXPECTED: &'static str = "a non-negative integer";

            fn from_param(value: &Value) -> Option<Self> {
                i64::from_param(value).and_then(|n| <$ty>::try_from(n).ok())
            }
        }
    )*};
}

unsigned_from_param!(u8, u16, u32, u64, usize);

impl FromParam for f64 {
    const EXPECTED: &'static str = "a number";

    fn from_param(value: &Value) -> Option<Self> {
        let n = match value {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        n.is_finite().then_some(n)
    }
}

impl FromParam for bool {
    const EXPECTED: &'static str = "a boolean";

    fn from_param(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
            Value::Number(n) => match n.as_i64() {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl FromParam for String {
    const EXPECTED: &'static str = "a string";

    fn from_param(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl<T: FromParam> FromParam for Vec<T> {
    const EXPECTED: &'static str = "a list";

    fn from_param(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => items.iter().map(T::from_param).collect(),
            scalar => T::from_param(scalar).map(|item| vec![item]),
        }
    }
}

impl FromParam for Value {
    const EXPECTED: &'static str = "any value";

    fn from_param(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}
