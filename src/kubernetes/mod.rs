// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

pub mod access;
mod client;
pub mod kubeconfig;
pub mod object;
pub mod resource;

pub use access::{
    AccessDecision, AccessError, AccessQuery, ContextInfo, Propagation, ResourceAccess,
};
pub use client::{CONNECT_TIMEOUT, KubeResourceAccess, READ_TIMEOUT, Timeouts};
pub use object::{GenericResource, Lookup};
pub use resource::{EndpointCoordinate, ResourceError, ResourceRef};
