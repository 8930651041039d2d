// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use serde_json::Value;
use tracing::{error, info};

use super::{OperationError, Outcome, args};
use crate::kubernetes::resource::namespace_of;
use crate::kubernetes::{EndpointCoordinate, GenericResource, ResourceAccess};

/// Create the object given as the whole argument mapping
pub(super) async fn run(
    access: &dyn ResourceAccess,
    args: &Value,
) -> Result<Outcome, OperationError> {
    let object = GenericResource::new(args::object(args)?.clone());
    let endpoint = EndpointCoordinate::for_object(&object)?;
    let namespace = namespace_of(object.namespace())?;
    let kind = endpoint.kind.as_str();

    info!(
        kind = %kind,
        resource = %endpoint.resource,
        namespace = %namespace,
        "Creating resource"
    );

    let created = access
        .create(&endpoint, &object, namespace)
        .await
        .map_err(|e| {
            error!(kind = %kind, error = %e, "Failed to create resource");
            OperationError::capability("create resource")(e)
        })?;

    let name = created.name().found().unwrap_or_default();
    info!(kind = %kind, name = %name, "Created resource");

    Ok(Outcome::success_with_outputs(
        format!("Created {}/{}", kind, name),
        [
            ("name", name),
            ("namespace", created.namespace().found().unwrap_or_default()),
            ("uid", created.uid().found().unwrap_or_default()),
            (
                "resourceVersion",
                created.resource_version().found().unwrap_or_default(),
            ),
        ],
    ))
}
