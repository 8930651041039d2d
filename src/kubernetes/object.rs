// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Schema-less Kubernetes objects.
//!
//! A [`GenericResource`] is an ordered JSON mapping with typed accessors.
//! Accessors return a [`Lookup`] so callers can tell a missing field apart
//! from a field holding an unexpected type or an empty value.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome of reading a field out of an untyped object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The field exists and has the requested type
    Found(T),
    /// The field (or one of its parents) does not exist
    Absent,
    /// The field (or one of its parents) exists but has another type
    WrongType,
}

impl<T> Lookup<T> {
    /// Convert into an Option, dropping the absent/wrong-type distinction
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Absent | Lookup::WrongType => None,
        }
    }

    #[allow(dead_code)]
    pub fn is_absent(&self) -> bool {
        matches!(self, Lookup::Absent)
    }

    #[allow(dead_code)]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::Absent => Lookup::Absent,
            Lookup::WrongType => Lookup::WrongType,
        }
    }
}

impl<'a> Lookup<&'a Value> {
    pub fn as_str(self) -> Lookup<&'a str> {
        self.and_then(Value::as_str)
    }

    pub fn as_bool(self) -> Lookup<bool> {
        self.and_then(Value::as_bool)
    }

    pub fn as_seq(self) -> Lookup<&'a [Value]> {
        self.and_then(|v| v.as_array().map(Vec::as_slice))
    }

    pub fn as_map(self) -> Lookup<&'a Map<String, Value>> {
        self.and_then(Value::as_object)
    }

    fn and_then<U>(self, f: impl FnOnce(&'a Value) -> Option<U>) -> Lookup<U> {
        match self {
            Lookup::Found(value) => match f(value) {
                Some(converted) => Lookup::Found(converted),
                None => Lookup::WrongType,
            },
            Lookup::Absent => Lookup::Absent,
            Lookup::WrongType => Lookup::WrongType,
        }
    }
}

/// Walk `path` through nested mappings starting at `map`
pub fn lookup<'a>(map: &'a Map<String, Value>, path: &[&str]) -> Lookup<&'a Value> {
    let Some((last, parents)) = path.split_last() else {
        return Lookup::Absent;
    };

    let mut current = map;
    for key in parents {
        match current.get(*key) {
            Some(Value::Object(next)) => current = next,
            Some(_) => return Lookup::WrongType,
            None => return Lookup::Absent,
        }
    }

    match current.get(*last) {
        Some(value) => Lookup::Found(value),
        None => Lookup::Absent,
    }
}

/// An untyped Kubernetes object (apiVersion, kind, metadata and anything else)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenericResource(Map<String, Value>);

impl GenericResource {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wrap a JSON value, returning None unless it is a mapping
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    #[allow(dead_code)]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, path: &[&str]) -> Lookup<&Value> {
        lookup(&self.0, path)
    }

    pub fn str_at(&self, path: &[&str]) -> Lookup<&str> {
        self.get(path).as_str()
    }

    pub fn seq_at(&self, path: &[&str]) -> Lookup<&[Value]> {
        self.get(path).as_seq()
    }

    pub fn api_version(&self) -> Lookup<&str> {
        self.str_at(&["apiVersion"])
    }

    pub fn kind(&self) -> Lookup<&str> {
        self.str_at(&["kind"])
    }

    pub fn name(&self) -> Lookup<&str> {
        self.str_at(&["metadata", "name"])
    }

    pub fn namespace(&self) -> Lookup<&str> {
        self.str_at(&["metadata", "namespace"])
    }

    pub fn uid(&self) -> Lookup<&str> {
        self.str_at(&["metadata", "uid"])
    }

    pub fn resource_version(&self) -> Lookup<&str> {
        self.str_at(&["metadata", "resourceVersion"])
    }
}
