// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use serde_json::Value;
use tracing::{error, info};

use super::{OperationError, Outcome, args};
use crate::kubernetes::{Propagation, ResourceAccess, ResourceRef};

/// Delete a resource with foreground propagation
pub(super) async fn run(
    access: &dyn ResourceAccess,
    args: &Value,
) -> Result<Outcome, OperationError> {
    let args = args::object(args)?;
    let target = ResourceRef::parse(args)?;
    let ignore_not_found = args::optional_bool(args, "ignoreNotFound")?.unwrap_or(false);
    let endpoint = target.resolve()?;

    info!(
        kind = %target.kind(),
        name = %target.name(),
        namespace = %target.namespace(),
        ignore_not_found,
        "Deleting resource"
    );

    match access
        .delete(
            &endpoint,
            target.name(),
            target.namespace(),
            Propagation::Foreground,
        )
        .await
    {
        Ok(()) => {
            info!(kind = %target.kind(), name = %target.name(), "Deleted resource");
            Ok(Outcome::success(format!("Deleted {}", target)))
        }
        Err(e) if e.is_not_found() && ignore_not_found => {
            info!(kind = %target.kind(), name = %target.name(), "Resource already absent");
            Ok(Outcome::success(format!("{} not found (ignored)", target)))
        }
        Err(e) => {
            error!(kind = %target.kind(), name = %target.name(), error = %e, "Failed to delete resource");
            Err(OperationError::capability("delete resource")(e))
        }
    }
}
