// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::authorization::v1::{
    ResourceAttributes, SubjectAccessReview, SubjectAccessReviewSpec,
};
use kube::api::{DeleteParams, DynamicObject, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::discovery::ApiResource;
use kube::{Api, Client, Config};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, trace};

use super::access::{
    AccessDecision, AccessError, AccessQuery, ContextInfo, Propagation, ResourceAccess,
};
use super::kubeconfig::KubeconfigFile;
use super::object::GenericResource;
use super::resource::EndpointCoordinate;

/// Timeout for connecting to K8s API
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for reading K8s API responses
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Client timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub read: Duration,
}

/// Resource access backed by a kube client and a kubeconfig file
pub struct KubeResourceAccess {
    client: Client,
    kubeconfig: KubeconfigFile,
}

impl KubeResourceAccess {
    /// Connect using the current context of the kubeconfig at `path`
    pub async fn connect(path: &Path, timeouts: Timeouts) -> Result<Self> {
        let kubeconfig = Kubeconfig::read_from(path)
            .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;

        let mut config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .with_context(|| format!("Failed to build kubeconfig from {}", path.display()))?;

        // Set timeouts for reliability
        config.connect_timeout = Some(timeouts.connect);
        config.read_timeout = Some(timeouts.read);

        let client = Client::try_from(config).context("Failed to create kubernetes client")?;

        debug!(kubeconfig = %path.display(), "Kubernetes client ready");

        Ok(Self {
            client,
            kubeconfig: KubeconfigFile::new(path),
        })
    }

    /// Dynamic API handle, namespaced when `namespace` is non-empty
    fn dynamic_api(&self, endpoint: &EndpointCoordinate, namespace: &str) -> Api<DynamicObject> {
        let ar = ApiResource {
            group: endpoint.group.clone(),
            version: endpoint.version.clone(),
            api_version: endpoint.api_version(),
            kind: endpoint.kind.clone(),
            plural: endpoint.resource.clone(),
        };

        trace!(
            group = %ar.group,
            version = %ar.version,
            plural = %ar.plural,
            namespace = %namespace,
            "Built dynamic API handle"
        );

        if namespace.is_empty() {
            Api::all_with(self.client.clone(), &ar)
        } else {
            Api::namespaced_with(self.client.clone(), namespace, &ar)
        }
    }
}

fn to_dynamic(object: &GenericResource) -> Result<DynamicObject, AccessError> {
    serde_json::from_value(object.clone().into_value())
        .map_err(|e| AccessError::Other(anyhow::anyhow!("invalid resource object: {}", e)))
}

fn from_dynamic(object: DynamicObject) -> Result<GenericResource, AccessError> {
    let value = serde_json::to_value(object)
        .map_err(|e| AccessError::Other(anyhow::anyhow!("failed to encode resource: {}", e)))?;
    GenericResource::from_value(value)
        .ok_or_else(|| AccessError::Other(anyhow::anyhow!("resource is not an object")))
}

fn delete_params(propagation: Propagation) -> DeleteParams {
    match propagation {
        Propagation::Foreground => DeleteParams::foreground(),
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[async_trait]
impl ResourceAccess for KubeResourceAccess {
    async fn create(
        &self,
        endpoint: &EndpointCoordinate,
        object: &GenericResource,
        namespace: &str,
    ) -> Result<GenericResource, AccessError> {
        let api = self.dynamic_api(endpoint, namespace);
        let created = api.create(&PostParams::default(), &to_dynamic(object)?).await?;
        from_dynamic(created)
    }

    async fn get(
        &self,
        endpoint: &EndpointCoordinate,
        name: &str,
        namespace: &str,
    ) -> Result<GenericResource, AccessError> {
        let api = self.dynamic_api(endpoint, namespace);
        from_dynamic(api.get(name).await?)
    }

    async fn delete(
        &self,
        endpoint: &EndpointCoordinate,
        name: &str,
        namespace: &str,
        propagation: Propagation,
    ) -> Result<(), AccessError> {
        let api = self.dynamic_api(endpoint, namespace);
        api.delete(name, &delete_params(propagation)).await?;
        Ok(())
    }

    async fn check_access(&self, query: &AccessQuery) -> Result<AccessDecision, AccessError> {
        let review = SubjectAccessReview {
            spec: SubjectAccessReviewSpec {
                user: Some(query.subject.clone()),
                resource_attributes: Some(ResourceAttributes {
                    verb: Some(query.verb.clone()),
                    resource: Some(query.resource.clone()),
                    group: non_empty(&query.group),
                    namespace: non_empty(&query.namespace),
                    name: non_empty(&query.resource_name),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        };

        let api: Api<SubjectAccessReview> = Api::all(self.client.clone());
        let result = api.create(&PostParams::default(), &review).await?;

        Ok(result
            .status
            .map(|status| AccessDecision {
                allowed: status.allowed,
                reason: status.reason.unwrap_or_default(),
            })
            .unwrap_or_default())
    }

    async fn list_contexts(&self) -> Result<Vec<ContextInfo>, AccessError> {
        self.kubeconfig.list_contexts()
    }

    async fn current_context(&self) -> Result<String, AccessError> {
        self.kubeconfig.current_context()
    }

    async fn view_config(&self, minify: bool) -> Result<String, AccessError> {
        self.kubeconfig.view(minify)
    }
}
