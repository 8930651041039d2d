// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "k8s-extension")]
#[command(author, version, about = "Generic Kubernetes resource operations for a host process")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to the kubeconfig file (defaults to $KUBECONFIG or ~/.kube/config)
    #[arg(long, global = true, value_name = "PATH")]
    pub kubeconfig: Option<String>,

    /// Enable verbose logging (also logs to stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve operations as JSON-RPC over stdin/stdout (default)
    Serve,

    /// List the available operations
    Operations,

    /// Run a single operation and print its outcome
    Call {
        /// Operation name (e.g. create, wait, authCanI)
        operation: String,

        /// Operation arguments as a JSON object
        #[arg(short, long, value_name = "JSON", conflicts_with = "file")]
        args: Option<String>,

        /// Read operation arguments from a JSON or YAML file
        #[arg(short, long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,
    },
}

#[derive(ValueEnum, Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}
