// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Kubeconfig introspection: contexts, current context and config view

use serde_json::Value;
use tracing::{error, info};

use super::{OperationError, Outcome, args};
use crate::kubernetes::{AccessError, ResourceAccess};

pub(super) async fn list(access: &dyn ResourceAccess) -> Result<Outcome, OperationError> {
    info!("Listing kubeconfig contexts");

    let contexts = access.list_contexts().await.map_err(|e| {
        error!(error = %e, "Failed to list contexts");
        OperationError::capability("list contexts")(e)
    })?;

    if contexts.is_empty() {
        return Err(OperationError::NoContexts);
    }

    let current = contexts
        .iter()
        .find(|c| c.is_current)
        .map(|c| c.name.clone())
        .unwrap_or_default();

    info!(count = contexts.len(), current = %current, "Contexts listed");

    let listing = serde_json::to_string(&contexts)
        .map_err(|e| OperationError::capability("list contexts")(AccessError::Other(e.into())))?;

    Ok(Outcome::success_with_outputs(
        format!("Found {} context(s), current: {}", contexts.len(), current),
        [
            ("current", current),
            ("count", contexts.len().to_string()),
            ("contexts", listing),
        ],
    ))
}

pub(super) async fn current(access: &dyn ResourceAccess) -> Result<Outcome, OperationError> {
    let context = access.current_context().await.map_err(|e| {
        error!(error = %e, "Failed to get current context");
        OperationError::capability("get current context")(e)
    })?;

    if context.is_empty() {
        return Err(OperationError::NoCurrentContext);
    }

    info!(context = %context, "Current context retrieved");

    Ok(Outcome::success_with_outputs(
        format!("Current context: {}", context),
        [("context", context)],
    ))
}

/// Kubeconfig as YAML; a missing or non-object payload means no arguments
pub(super) async fn view(
    access: &dyn ResourceAccess,
    args: &Value,
) -> Result<Outcome, OperationError> {
    let minify = match args.as_object() {
        Some(args) => args::optional_bool(args, "minify")?.unwrap_or(false),
        None => false,
    };

    info!(minify, "Viewing kubeconfig");

    let config = access.view_config(minify).await.map_err(|e| {
        error!(error = %e, "Failed to view config");
        OperationError::capability("view config")(e)
    })?;

    Ok(Outcome::success_with_outputs(
        "Kubeconfig retrieved",
        [("config", config)],
    ))
}
