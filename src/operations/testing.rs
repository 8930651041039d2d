// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! In-memory [`ResourceAccess`] for operation tests

use async_trait::async_trait;

use crate::kubernetes::{
    AccessDecision, AccessError, AccessQuery, ContextInfo, EndpointCoordinate, GenericResource,
    Propagation, ResourceAccess,
};

type CreateFn = Box<
    dyn Fn(&EndpointCoordinate, &GenericResource, &str) -> Result<GenericResource, AccessError>
        + Send
        + Sync,
>;
type GetFn =
    Box<dyn Fn(&EndpointCoordinate, &str, &str) -> Result<GenericResource, AccessError> + Send + Sync>;
type DeleteFn = Box<
    dyn Fn(&EndpointCoordinate, &str, &str, Propagation) -> Result<(), AccessError> + Send + Sync,
>;
type CheckAccessFn =
    Box<dyn Fn(&AccessQuery) -> Result<AccessDecision, AccessError> + Send + Sync>;
type ListContextsFn = Box<dyn Fn() -> Result<Vec<ContextInfo>, AccessError> + Send + Sync>;
type CurrentContextFn = Box<dyn Fn() -> Result<String, AccessError> + Send + Sync>;
type ViewConfigFn = Box<dyn Fn(bool) -> Result<String, AccessError> + Send + Sync>;

/// Each method runs its closure when set, otherwise a permissive default
#[derive(Default)]
pub struct MockAccess {
    create_fn: Option<CreateFn>,
    get_fn: Option<GetFn>,
    delete_fn: Option<DeleteFn>,
    check_access_fn: Option<CheckAccessFn>,
    list_contexts_fn: Option<ListContextsFn>,
    current_context_fn: Option<CurrentContextFn>,
    view_config_fn: Option<ViewConfigFn>,
}

impl MockAccess {
    pub fn on_create(
        mut self,
        f: impl Fn(&EndpointCoordinate, &GenericResource, &str) -> Result<GenericResource, AccessError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.create_fn = Some(Box::new(f));
        self
    }

    pub fn on_get(
        mut self,
        f: impl Fn(&EndpointCoordinate, &str, &str) -> Result<GenericResource, AccessError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.get_fn = Some(Box::new(f));
        self
    }

    pub fn on_delete(
        mut self,
        f: impl Fn(&EndpointCoordinate, &str, &str, Propagation) -> Result<(), AccessError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.delete_fn = Some(Box::new(f));
        self
    }

    pub fn on_check_access(
        mut self,
        f: impl Fn(&AccessQuery) -> Result<AccessDecision, AccessError> + Send + Sync + 'static,
    ) -> Self {
        self.check_access_fn = Some(Box::new(f));
        self
    }

    pub fn on_list_contexts(
        mut self,
        f: impl Fn() -> Result<Vec<ContextInfo>, AccessError> + Send + Sync + 'static,
    ) -> Self {
        self.list_contexts_fn = Some(Box::new(f));
        self
    }

    pub fn on_current_context(
        mut self,
        f: impl Fn() -> Result<String, AccessError> + Send + Sync + 'static,
    ) -> Self {
        self.current_context_fn = Some(Box::new(f));
        self
    }

    pub fn on_view_config(
        mut self,
        f: impl Fn(bool) -> Result<String, AccessError> + Send + Sync + 'static,
    ) -> Self {
        self.view_config_fn = Some(Box::new(f));
        self
    }
}

#[async_trait]
impl ResourceAccess for MockAccess {
    async fn create(
        &self,
        endpoint: &EndpointCoordinate,
        object: &GenericResource,
        namespace: &str,
    ) -> Result<GenericResource, AccessError> {
        match &self.create_fn {
            Some(f) => f(endpoint, object, namespace),
            None => Ok(object.clone()),
        }
    }

    async fn get(
        &self,
        endpoint: &EndpointCoordinate,
        name: &str,
        namespace: &str,
    ) -> Result<GenericResource, AccessError> {
        match &self.get_fn {
            Some(f) => f(endpoint, name, namespace),
            None => Ok(GenericResource::default()),
        }
    }

    async fn delete(
        &self,
        endpoint: &EndpointCoordinate,
        name: &str,
        namespace: &str,
        propagation: Propagation,
    ) -> Result<(), AccessError> {
        match &self.delete_fn {
            Some(f) => f(endpoint, name, namespace, propagation),
            None => Ok(()),
        }
    }

    async fn check_access(&self, query: &AccessQuery) -> Result<AccessDecision, AccessError> {
        match &self.check_access_fn {
            Some(f) => f(query),
            None => Ok(AccessDecision {
                allowed: true,
                reason: String::new(),
            }),
        }
    }

    async fn list_contexts(&self) -> Result<Vec<ContextInfo>, AccessError> {
        match &self.list_contexts_fn {
            Some(f) => f(),
            None => Ok(vec![ContextInfo {
                name: "default".to_string(),
                cluster: "default".to_string(),
                user: "default".to_string(),
                namespace: String::new(),
                is_current: true,
            }]),
        }
    }

    async fn current_context(&self) -> Result<String, AccessError> {
        match &self.current_context_fn {
            Some(f) => f(),
            None => Ok("default".to_string()),
        }
    }

    async fn view_config(&self, minify: bool) -> Result<String, AccessError> {
        match &self.view_config_fn {
            Some(f) => f(minify),
            None => Ok("apiVersion: v1\nkind: Config\n".to_string()),
        }
    }
}
