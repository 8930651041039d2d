// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! The resource access capability.
//!
//! Operations talk to Kubernetes only through [`ResourceAccess`]. The
//! production implementation lives in `client.rs`; tests supply their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::object::GenericResource;
use super::resource::EndpointCoordinate;

#[derive(Debug, Error)]
pub enum AccessError {
    /// The API server answered 404 for the requested object
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Api(String),
    #[error("failed to load kubeconfig: {0}")]
    Kubeconfig(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AccessError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AccessError::NotFound(_))
    }
}

impl From<kube::Error> for AccessError {
    fn from(err: kube::Error) -> Self {
        match &err {
            kube::Error::Api(status) if status.code == 404 => {
                AccessError::NotFound(err.to_string())
            }
            _ => AccessError::Api(err.to_string()),
        }
    }
}

/// How dependents of a deleted object are cleaned up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// Dependents are removed before the owner
    Foreground,
}

/// "Can `subject` perform `verb` on `resource`?"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessQuery {
    pub subject: String,
    pub verb: String,
    pub resource: String,
    /// Empty for the core API group
    pub group: String,
    /// Empty for a cluster-wide check
    pub namespace: String,
    /// Empty to check all objects of the resource
    pub resource_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: String,
}

/// One kubeconfig context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextInfo {
    pub name: String,
    pub cluster: String,
    pub user: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    pub is_current: bool,
}

#[async_trait]
pub trait ResourceAccess: Send + Sync {
    /// Create `object` in `namespace` (cluster-scoped when empty)
    async fn create(
        &self,
        endpoint: &EndpointCoordinate,
        object: &GenericResource,
        namespace: &str,
    ) -> Result<GenericResource, AccessError>;

    async fn get(
        &self,
        endpoint: &EndpointCoordinate,
        name: &str,
        namespace: &str,
    ) -> Result<GenericResource, AccessError>;

    async fn delete(
        &self,
        endpoint: &EndpointCoordinate,
        name: &str,
        namespace: &str,
        propagation: Propagation,
    ) -> Result<(), AccessError>;

    /// Ask the API server for an authorization decision
    async fn check_access(&self, query: &AccessQuery) -> Result<AccessDecision, AccessError>;

    /// All kubeconfig contexts, sorted by name
    async fn list_contexts(&self) -> Result<Vec<ContextInfo>, AccessError>;

    /// Name of the current context (empty when unset)
    async fn current_context(&self) -> Result<String, AccessError>;

    /// Kubeconfig as YAML, optionally reduced to the current context
    async fn view_config(&self, minify: bool) -> Result<String, AccessError>;
}
