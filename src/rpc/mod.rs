// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Newline-delimited JSON-RPC 2.0 transport over stdin/stdout

mod connector;
mod message;
mod server;

pub use connector::{Connector, KubeConnector};
pub use server::Server;
