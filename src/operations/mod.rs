// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! The operation surface exposed to the host.
//!
//! Each operation takes a JSON mapping of named arguments and produces an
//! [`Outcome`]. Failures never escape as `Err`: validation, capability,
//! expectation and timeout errors are all folded into a failure outcome.

mod args;
mod auth;
mod contexts;
mod create;
mod delete;
mod outcome;
#[cfg(test)]
pub(crate) mod testing;
mod wait;

use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::duration::ParseDurationError;
use crate::kubernetes::{AccessError, ResourceAccess, ResourceError};

pub use outcome::Outcome;
pub use wait::LastObserved;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error("kubernetes client not initialized")]
    NotInitialized,
    #[error("args must be an object")]
    ArgsNotObject,
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{field} must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error("invalid timeout format: {0}")]
    InvalidTimeout(#[from] ParseDurationError),
    /// The capability call failed; `action` reads as "failed to <action>"
    #[error("failed to {action}: {source}")]
    Capability {
        action: &'static str,
        #[source]
        source: AccessError,
    },
    #[error("permission expectation not met")]
    ExpectationMismatch { expected: bool, actual: bool },
    #[error("timed out waiting for {target}: last status was {last}")]
    TimedOut {
        target: String,
        condition: String,
        status: String,
        last: LastObserved,
    },
    #[error("cancelled while waiting for {target}: last status was {last}")]
    Cancelled {
        target: String,
        condition: String,
        status: String,
        last: LastObserved,
    },
    #[error("no contexts found in kubeconfig")]
    NoContexts,
    #[error("no current context set in kubeconfig")]
    NoCurrentContext,
}

impl OperationError {
    fn capability(action: &'static str) -> impl FnOnce(AccessError) -> Self {
        move |source| OperationError::Capability { action, source }
    }
}

/// Every operation the extension exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Delete,
    Wait,
    AuthCanI,
    ListContexts,
    GetCurrentContext,
    ViewConfig,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::Create,
        Operation::Delete,
        Operation::Wait,
        Operation::AuthCanI,
        Operation::ListContexts,
        Operation::GetCurrentContext,
        Operation::ViewConfig,
    ];

    /// Wire name used by the host
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Delete => "delete",
            Operation::Wait => "wait",
            Operation::AuthCanI => "authCanI",
            Operation::ListContexts => "listContexts",
            Operation::GetCurrentContext => "getCurrentContext",
            Operation::ViewConfig => "viewConfig",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Operation::Create => "Create a Kubernetes resource from a manifest",
            Operation::Delete => "Delete a Kubernetes resource with foreground propagation",
            Operation::Wait => "Wait until a resource status condition reaches a value",
            Operation::AuthCanI => "Check whether a subject may perform an action",
            Operation::ListContexts => "List the contexts in the kubeconfig",
            Operation::GetCurrentContext => "Show the current kubeconfig context",
            Operation::ViewConfig => "Show the kubeconfig, optionally minified",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operation: {0}")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}

/// Dispatches operations against an injected [`ResourceAccess`].
///
/// The capability is absent until [`Extension::set_access`] is called; every
/// operation fails with `kubernetes client not initialized` until then.
pub struct Extension {
    access: RwLock<Option<Arc<dyn ResourceAccess>>>,
    shutdown: CancellationToken,
}

impl Extension {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            access: RwLock::new(None),
            shutdown,
        }
    }

    pub fn with_access(access: Arc<dyn ResourceAccess>, shutdown: CancellationToken) -> Self {
        Self {
            access: RwLock::new(Some(access)),
            shutdown,
        }
    }

    pub async fn set_access(&self, access: Arc<dyn ResourceAccess>) {
        *self.access.write().await = Some(access);
    }

    /// Cancelling this token stops every in-flight wait
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    async fn access(&self) -> Result<Arc<dyn ResourceAccess>, OperationError> {
        self.access
            .read()
            .await
            .clone()
            .ok_or(OperationError::NotInitialized)
    }

    /// Run `operation` with `args` and report the result as an [`Outcome`]
    pub async fn call(&self, operation: Operation, args: &Value) -> Outcome {
        let result = match self.access().await {
            Ok(access) => {
                let access = access.as_ref();
                match operation {
                    Operation::Create => create::run(access, args).await,
                    Operation::Delete => delete::run(access, args).await,
                    Operation::Wait => wait::run(access, args, &self.shutdown).await,
                    Operation::AuthCanI => auth::run(access, args).await,
                    Operation::ListContexts => contexts::list(access).await,
                    Operation::GetCurrentContext => contexts::current(access).await,
                    Operation::ViewConfig => contexts::view(access, args).await,
                }
            }
            Err(e) => Err(e),
        };

        result.unwrap_or_else(Outcome::from)
    }
}
