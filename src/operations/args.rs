// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Extraction of named arguments from an operation payload

use serde_json::{Map, Value};

use super::OperationError;
use crate::kubernetes::object::lookup;
use crate::kubernetes::Lookup;

pub fn object(args: &Value) -> Result<&Map<String, Value>, OperationError> {
    args.as_object().ok_or(OperationError::ArgsNotObject)
}

/// A non-empty string argument; absent, empty or non-string values are
/// reported as missing
pub fn required_str<'a>(
    args: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, OperationError> {
    match args.get(field).and_then(Value::as_str) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(OperationError::Missing(field)),
    }
}

/// An optional string argument, empty when absent
pub fn optional_str<'a>(
    args: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, OperationError> {
    match lookup(args, &[field]).as_str() {
        Lookup::Found(value) => Ok(value),
        Lookup::Absent => Ok(""),
        Lookup::WrongType => Err(OperationError::WrongType {
            field,
            expected: "a string",
        }),
    }
}

pub fn optional_bool(
    args: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<bool>, OperationError> {
    match lookup(args, &[field]).as_bool() {
        Lookup::Found(value) => Ok(Some(value)),
        Lookup::Absent => Ok(None),
        Lookup::WrongType => Err(OperationError::WrongType {
            field,
            expected: "a boolean",
        }),
    }
}
