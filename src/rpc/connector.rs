// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::config::Config;
use crate::kubernetes::{KubeResourceAccess, ResourceAccess};

/// Builds the resource access capability on `initialize`
#[async_trait]
pub trait Connector: Send + Sync {
    /// `kubeconfig` is the path the host asked for, if any
    async fn connect(&self, kubeconfig: Option<&str>) -> Result<Arc<dyn ResourceAccess>>;
}

/// Connects to the cluster of the kubeconfig's current context
pub struct KubeConnector {
    config: Config,
    /// Fallback when the host gives no path (`--kubeconfig`)
    default_kubeconfig: Option<String>,
}

impl KubeConnector {
    pub fn new(config: Config, default_kubeconfig: Option<String>) -> Self {
        Self {
            config,
            default_kubeconfig,
        }
    }
}

#[async_trait]
impl Connector for KubeConnector {
    async fn connect(&self, kubeconfig: Option<&str>) -> Result<Arc<dyn ResourceAccess>> {
        let explicit = kubeconfig
            .filter(|p| !p.is_empty())
            .or(self.default_kubeconfig.as_deref());
        let path = self.config.kubeconfig_path(explicit)?;

        info!(kubeconfig = %path.display(), "Connecting to Kubernetes");
        let access = KubeResourceAccess::connect(&path, self.config.timeouts()).await?;
        Ok(Arc::new(access))
    }
}
