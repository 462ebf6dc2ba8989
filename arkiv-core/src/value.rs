// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Attribute value types.
//!
//! Attributes are either string- or numeric-valued; the two kinds live in
//! separate physical tables (`string_attributes` / `numeric_attributes`)
//! and a filter literal's kind selects the table it is matched against.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A filter literal: a string or an unsigned 64-bit number.
///
/// Entity keys (`0x` + 64 hex) and addresses (`0x` + 40 hex) are carried as
/// their literal source text in the `Str` variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Str(String),
    Num(u64),
}

impl Value {
    /// Whether this value selects the string attribute table.
    pub fn is_string(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    /// Lower-case a string value in place; numbers are left untouched.
    pub fn to_lowercase(&self) -> Value {
        match self {
            Value::Str(s) => Value::Str(s.to_lowercase()),
            Value::Num(n) => Value::Num(*n),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Num(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Num(n)
    }
}

/// A positional SQL statement parameter.
///
/// The superset of [`Value`] needed by the emitted statements: cursor
/// columns over `entity_key` carry raw bytes, which never appear in filter
/// literals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlValue {
    Text(String),
    Uint(u64),
    Bytes(Vec<u8>),
}

impl From<Value> for SqlValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Str(s) => SqlValue::Text(s),
            Value::Num(n) => SqlValue::Uint(n),
        }
    }
}

impl From<&Value> for SqlValue {
    fn from(v: &Value) -> Self {
        v.clone().into()
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<u64> for SqlValue {
    fn from(n: u64) -> Self {
        SqlValue::Uint(n)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(b: Vec<u8>) -> Self {
        SqlValue::Bytes(b)
    }
}
