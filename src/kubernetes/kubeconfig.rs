// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Kubeconfig introspection.
//!
//! Lists contexts and computes the minified view of a kubeconfig: the current
//! context plus the cluster and user it references, and nothing else.

use std::path::PathBuf;

use kube::config::Kubeconfig;
use thiserror::Error;

use super::access::{AccessError, ContextInfo};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MinifyError {
    #[error("no current context set in kubeconfig")]
    NoCurrentContext,
    #[error("current context {0:?} not found in kubeconfig")]
    ContextNotFound(String),
    #[error("current context {0:?} has no cluster")]
    NoCluster(String),
    #[error("cluster {0:?} not found in kubeconfig")]
    ClusterNotFound(String),
    #[error("user {0:?} not found in kubeconfig")]
    UserNotFound(String),
}

/// Context entries sorted by name, with the current one flagged
pub fn list_contexts(config: &Kubeconfig) -> Vec<ContextInfo> {
    let current = config.current_context.as_deref().unwrap_or_default();

    let mut contexts: Vec<ContextInfo> = config
        .contexts
        .iter()
        .map(|named| {
            let context = named.context.as_ref();
            ContextInfo {
                name: named.name.clone(),
                cluster: context.map(|c| c.cluster.clone()).unwrap_or_default(),
                user: context.and_then(|c| c.user.clone()).unwrap_or_default(),
                namespace: context.and_then(|c| c.namespace.clone()).unwrap_or_default(),
                is_current: !current.is_empty() && named.name == current,
            }
        })
        .collect();

    contexts.sort_by(|a, b| a.name.cmp(&b.name));
    contexts
}

pub fn current_context(config: &Kubeconfig) -> String {
    config.current_context.clone().unwrap_or_default()
}

/// Reduce `config` to the current context and its cluster and user
pub fn minify(config: &Kubeconfig) -> Result<Kubeconfig, MinifyError> {
    let current = match config.current_context.as_deref() {
        Some(name) if !name.is_empty() => name,
        _ => return Err(MinifyError::NoCurrentContext),
    };

    let named_context = config
        .contexts
        .iter()
        .find(|c| c.name == current)
        .ok_or_else(|| MinifyError::ContextNotFound(current.to_string()))?;

    let cluster_name = named_context
        .context
        .as_ref()
        .map(|c| c.cluster.as_str())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| MinifyError::NoCluster(current.to_string()))?;

    let named_cluster = config
        .clusters
        .iter()
        .find(|c| c.name == cluster_name)
        .ok_or_else(|| MinifyError::ClusterNotFound(cluster_name.to_string()))?;

    // A context may legitimately carry no user
    let user_name = named_context
        .context
        .as_ref()
        .and_then(|c| c.user.as_deref())
        .filter(|name| !name.is_empty());

    let auth_infos = match user_name {
        Some(user) => {
            let named_user = config
                .auth_infos
                .iter()
                .find(|u| u.name == user)
                .ok_or_else(|| MinifyError::UserNotFound(user.to_string()))?;
            vec![named_user.clone()]
        }
        None => Vec::new(),
    };

    Ok(Kubeconfig {
        api_version: Some("v1".to_string()),
        kind: Some("Config".to_string()),
        current_context: Some(current.to_string()),
        contexts: vec![named_context.clone()],
        clusters: vec![named_cluster.clone()],
        auth_infos,
        ..Default::default()
    })
}

pub fn to_yaml(config: &Kubeconfig) -> Result<String, AccessError> {
    serde_yaml::to_string(config)
        .map_err(|e| AccessError::Other(anyhow::anyhow!("failed to marshal config to YAML: {}", e)))
}

/// A kubeconfig file that is re-read on every access
#[derive(Debug, Clone)]
pub struct KubeconfigFile {
    path: PathBuf,
}

impl KubeconfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Kubeconfig, AccessError> {
        Kubeconfig::read_from(&self.path).map_err(|e| AccessError::Kubeconfig(e.to_string()))
    }

    pub fn list_contexts(&self) -> Result<Vec<ContextInfo>, AccessError> {
        Ok(list_contexts(&self.load()?))
    }

    pub fn current_context(&self) -> Result<String, AccessError> {
        Ok(current_context(&self.load()?))
    }

    pub fn view(&self, minified: bool) -> Result<String, AccessError> {
        let config = self.load()?;
        if minified {
            let reduced = minify(&config).map_err(|e| AccessError::Other(e.into()))?;
            to_yaml(&reduced)
        } else {
            to_yaml(&config)
        }
    }
}
