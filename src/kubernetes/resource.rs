// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Resource reference parsing and endpoint resolution.
//!
//! Turns caller-supplied `{apiVersion, kind, metadata: {name, namespace}}`
//! arguments into a [`ResourceRef`] and resolves it to the API collection
//! (group, version, plural) that serves it.
//!
//! Plurals are guessed from the kind. Well-known Kubernetes kinds map
//! correctly, but custom resources with irregular plurals (e.g. a CRD whose
//! kind `Octopus` is served as `octopi`) will resolve to the wrong collection.

use serde_json::{Map, Value};
use thiserror::Error;

use super::object::{GenericResource, Lookup, lookup};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{0} must be a string")]
    WrongType(&'static str),
    #[error("invalid apiVersion {0:?}: expected \"version\" or \"group/version\"")]
    InvalidApiVersion(String),
}

/// Identity of a single Kubernetes object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    api_version: String,
    kind: String,
    name: String,
    /// Empty for cluster-scoped resources
    namespace: String,
}

impl ResourceRef {
    /// Parse a reference out of operation arguments.
    ///
    /// `apiVersion`, `kind` and `metadata.name` must be non-empty strings;
    /// `metadata.namespace` is optional but must be a string when present.
    pub fn parse(args: &Map<String, Value>) -> Result<Self, ResourceError> {
        let api_version = required_str(args, &["apiVersion"], "apiVersion")?;
        let kind = required_str(args, &["kind"], "kind")?;
        let name = required_str(args, &["metadata", "name"], "metadata.name")?;
        let namespace = namespace_of(lookup(args, &["metadata", "namespace"]).as_str())?;

        Ok(Self {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: namespace.to_string(),
        })
    }

    #[allow(dead_code)]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Resolve to the API collection serving this resource
    pub fn resolve(&self) -> Result<EndpointCoordinate, ResourceError> {
        EndpointCoordinate::for_kind(&self.api_version, &self.kind)
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

fn required_str<'a>(
    args: &'a Map<String, Value>,
    path: &[&str],
    field: &'static str,
) -> Result<&'a str, ResourceError> {
    match lookup(args, path).as_str().found() {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ResourceError::MissingField(field)),
    }
}

/// Namespace from `metadata.namespace`; absent means cluster-scoped
pub fn namespace_of(namespace: Lookup<&str>) -> Result<&str, ResourceError> {
    match namespace {
        Lookup::Found(namespace) => Ok(namespace),
        Lookup::Absent => Ok(""),
        Lookup::WrongType => Err(ResourceError::WrongType("metadata.namespace")),
    }
}

/// Resolved API location of a kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointCoordinate {
    /// API group (empty string for the core group)
    pub group: String,
    pub version: String,
    /// Lower-case plural resource name used in URLs (e.g. "pods")
    pub resource: String,
    /// Kind served by this collection
    pub kind: String,
}

impl EndpointCoordinate {
    pub fn for_kind(api_version: &str, kind: &str) -> Result<Self, ResourceError> {
        let (group, version) = parse_api_version(api_version)?;
        Ok(Self {
            group,
            version,
            resource: pluralize_kind(kind),
            kind: kind.to_string(),
        })
    }

    /// Resolve the collection for an object that carries its own
    /// `apiVersion` and `kind`
    pub fn for_object(object: &GenericResource) -> Result<Self, ResourceError> {
        let kind = match object.kind().found() {
            Some(kind) if !kind.is_empty() => kind,
            _ => return Err(ResourceError::MissingField("kind")),
        };
        let api_version = object.api_version().found().unwrap_or_default();
        Self::for_kind(api_version, kind)
    }

    /// Get the full API group/version string
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

/// Split an apiVersion into (group, version).
///
/// `"v1"` is the core group; `"apps/v1"` is group `apps`. More than one
/// slash, or an empty version, is rejected.
pub fn parse_api_version(api_version: &str) -> Result<(String, String), ResourceError> {
    let invalid = || ResourceError::InvalidApiVersion(api_version.to_string());

    let (group, version) = match api_version.split_once('/') {
        Some((group, version)) => (group, version),
        None => ("", api_version),
    };
    if version.is_empty() || version.contains('/') {
        return Err(invalid());
    }

    Ok((group.to_string(), version.to_string()))
}

/// Kinds whose resource name is not a regular English plural of the
/// lower-cased kind
const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("endpoints", "endpoints"),
    ("podmetrics", "pods"),
    ("nodemetrics", "nodes"),
];

/// Guess the resource name for a kind.
///
/// The kind is lower-cased as a whole (`NetworkPolicy` -> `networkpolicy`),
/// then pluralized: known irregulars first, then `-s/-x/-z/-ch/-sh` take
/// `-es`, a consonant followed by `-y` becomes `-ies`, everything else
/// takes `-s`.
pub fn pluralize_kind(kind: &str) -> String {
    let lower = kind.to_lowercase();
    if lower.is_empty() {
        return lower;
    }

    if let Some((_, plural)) = IRREGULAR_PLURALS.iter().find(|(singular, _)| *singular == lower) {
        return (*plural).to_string();
    }

    if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        return format!("{}es", lower);
    }

    if let Some(stem) = lower.strip_suffix('y')
        && !stem.ends_with(['a', 'e', 'i', 'o', 'u'])
    {
        return format!("{}ies", stem);
    }

    format!("{}s", lower)
}
