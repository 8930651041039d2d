// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Waiting for a status condition.
//!
//! A wait polls the target once immediately and then every
//! [`POLL_INTERVAL`] until `status.conditions[type=<condition>].status`
//! equals the expected value, the timeout elapses, or the cancellation token
//! fires. Failed reads are inconclusive and never end the wait early.

use std::fmt;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use super::{OperationError, Outcome, args};
use crate::duration::parse_duration;
use crate::kubernetes::{GenericResource, Lookup, ResourceAccess, ResourceRef};

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_STATUS: &str = "True";

/// What the last successful read showed for the awaited condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastObserved {
    /// No read has succeeded yet
    Unobserved,
    /// The object has no `status.conditions` sequence
    NoConditions,
    /// No condition has the awaited type
    ConditionNotFound,
    /// The condition's `status` value
    Status(String),
}

impl fmt::Display for LastObserved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastObserved::Unobserved => f.write_str("Unobserved"),
            LastObserved::NoConditions => f.write_str("NoConditions"),
            LastObserved::ConditionNotFound => f.write_str("ConditionNotFound"),
            LastObserved::Status(status) => f.write_str(status),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Polling,
    Satisfied,
    TimedOut,
}

/// Validated wait arguments
#[derive(Debug, Clone)]
pub struct WaitRequest {
    pub target: ResourceRef,
    pub condition: String,
    pub status: String,
    pub timeout: Duration,
}

impl WaitRequest {
    pub fn parse(args: &Map<String, Value>) -> Result<Self, OperationError> {
        let target = ResourceRef::parse(args)?;
        let condition = args::required_str(args, "condition")?.to_string();

        let status = match args::optional_str(args, "status")? {
            "" => DEFAULT_STATUS.to_string(),
            status => status.to_string(),
        };

        let timeout = match args::optional_str(args, "timeout")? {
            "" => DEFAULT_TIMEOUT,
            timeout => parse_duration(timeout)?,
        };

        Ok(Self {
            target,
            condition,
            status,
            timeout,
        })
    }
}

/// Per-wait mutable state
#[derive(Debug)]
struct PollState<'a> {
    request: &'a WaitRequest,
    phase: PollPhase,
    last: LastObserved,
}

impl<'a> PollState<'a> {
    fn new(request: &'a WaitRequest) -> Self {
        Self {
            request,
            phase: PollPhase::Polling,
            last: LastObserved::Unobserved,
        }
    }

    /// Record one successful read
    fn observe(&mut self, object: &GenericResource) -> PollPhase {
        let conditions = match object.seq_at(&["status", "conditions"]) {
            Lookup::Found(conditions) => conditions,
            Lookup::Absent | Lookup::WrongType => {
                self.last = LastObserved::NoConditions;
                return self.phase;
            }
        };

        // First entry with a matching type wins
        let matched = conditions.iter().find(|condition| {
            condition.get("type").and_then(Value::as_str) == Some(self.request.condition.as_str())
        });

        match matched {
            Some(condition) => {
                let status = condition
                    .get("status")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                self.last = LastObserved::Status(status.to_string());
                if status == self.request.status {
                    self.phase = PollPhase::Satisfied;
                }
            }
            None => self.last = LastObserved::ConditionNotFound,
        }

        self.phase
    }

    /// Enter the terminal `TimedOut` phase
    fn timed_out(&mut self) -> OperationError {
        self.phase = PollPhase::TimedOut;
        OperationError::TimedOut {
            target: self.request.target.to_string(),
            condition: self.request.condition.clone(),
            status: self.request.status.clone(),
            last: self.last.clone(),
        }
    }

    fn cancelled(self) -> OperationError {
        OperationError::Cancelled {
            target: self.request.target.to_string(),
            condition: self.request.condition.clone(),
            status: self.request.status.clone(),
            last: self.last,
        }
    }
}

/// Poll until the condition holds, the timeout elapses or `cancel` fires
pub async fn wait_for_condition(
    access: &dyn ResourceAccess,
    request: &WaitRequest,
    cancel: &CancellationToken,
) -> Result<(), OperationError> {
    let endpoint = request.target.resolve()?;
    let target = &request.target;
    let deadline = Instant::now() + request.timeout;

    // The first tick completes immediately
    let mut ticker = time::interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut state = PollState::new(request);

    loop {
        let poll = async {
            ticker.tick().await;
            access
                .get(&endpoint, target.name(), target.namespace())
                .await
        };

        tokio::select! {
            biased;

            _ = cancel.cancelled() => return Err(state.cancelled()),
            _ = time::sleep_until(deadline) => {
                let err = state.timed_out();
                debug!(resource = %target, phase = ?state.phase, last = %state.last, "Deadline reached");
                return Err(err);
            }
            fetched = poll => match fetched {
                Ok(object) => {
                    if state.observe(&object) == PollPhase::Satisfied {
                        return Ok(());
                    }
                    trace!(resource = %target, last = %state.last, "Condition not met yet");
                }
                Err(e) => debug!(resource = %target, error = %e, "Poll inconclusive"),
            },
        }
    }
}

pub(super) async fn run(
    access: &dyn ResourceAccess,
    args: &Value,
    shutdown: &CancellationToken,
) -> Result<Outcome, OperationError> {
    let request = WaitRequest::parse(args::object(args)?)?;

    info!(
        resource = %request.target,
        namespace = %request.target.namespace(),
        condition = %request.condition,
        status = %request.status,
        timeout = ?request.timeout,
        "Waiting for condition"
    );

    let cancel = shutdown.child_token();
    if let Err(e) = wait_for_condition(access, &request, &cancel).await {
        error!(resource = %request.target, error = %e, "Wait failed");
        return Err(e);
    }

    info!(resource = %request.target, condition = %request.condition, "Condition met");

    Ok(Outcome::success(format!(
        "{} condition {}={}",
        request.target, request.condition, request.status
    )))
}
