// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use serde_json::Value;
use tracing::{error, info, warn};

use super::{OperationError, Outcome, args};
use crate::kubernetes::object::lookup;
use crate::kubernetes::{AccessQuery, Lookup, ResourceAccess};

/// `expect.allowed` when the caller supplied one
fn expected_allowed(args: &serde_json::Map<String, Value>) -> Result<Option<bool>, OperationError> {
    match lookup(args, &["expect"]).as_map() {
        Lookup::Found(expect) => args::optional_bool(expect, "allowed").map_err(|_| {
            OperationError::WrongType {
                field: "expect.allowed",
                expected: "a boolean",
            }
        }),
        Lookup::Absent => Ok(None),
        Lookup::WrongType => Err(OperationError::WrongType {
            field: "expect",
            expected: "an object",
        }),
    }
}

/// Check a permission and optionally verify it against `expect.allowed`
pub(super) async fn run(
    access: &dyn ResourceAccess,
    args: &Value,
) -> Result<Outcome, OperationError> {
    let args = args::object(args)?;
    let verb = args::required_str(args, "verb")?;
    let resource = args::required_str(args, "resource")?;
    let subject = args::required_str(args, "as")?;
    let query = AccessQuery {
        subject: subject.to_string(),
        verb: verb.to_string(),
        resource: resource.to_string(),
        group: args::optional_str(args, "apiGroup")?.to_string(),
        namespace: args::optional_str(args, "namespace")?.to_string(),
        resource_name: args::optional_str(args, "resourceName")?.to_string(),
    };
    let expected = expected_allowed(args)?;

    info!(
        subject = %query.subject,
        verb = %query.verb,
        resource = %query.resource,
        group = %query.group,
        namespace = %query.namespace,
        "Checking access"
    );

    let decision = access.check_access(&query).await.map_err(|e| {
        error!(subject = %query.subject, error = %e, "Access review failed");
        OperationError::capability("check permissions")(e)
    })?;

    if let Some(expected) = expected
        && expected != decision.allowed
    {
        warn!(
            subject = %query.subject,
            verb = %query.verb,
            resource = %query.resource,
            expected,
            actual = decision.allowed,
            "Permission expectation not met"
        );
        return Err(OperationError::ExpectationMismatch {
            expected,
            actual: decision.allowed,
        });
    }

    let scope = if query.namespace.is_empty() {
        " cluster-wide".to_string()
    } else {
        format!(" in namespace {}", query.namespace)
    };
    let verdict = if decision.allowed { "allowed" } else { "denied" };

    Ok(Outcome::success_with_outputs(
        format!(
            "{} can {} {}{}: {}",
            query.subject, query.verb, query.resource, scope, verdict
        ),
        [
            ("allowed", decision.allowed.to_string()),
            ("reason", decision.reason),
        ],
    ))
}
