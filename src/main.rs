// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

mod cli;
pub mod config;
mod duration;
mod kubernetes;
mod operations;
mod output;
mod rpc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::prelude::*;

use cli::{Args, Command, OutputFormat};
use operations::{Extension, Operation};
use rpc::{Connector, KubeConnector, Server};

/// Initialize logging with file output and optional stderr.
///
/// Stdout carries protocol traffic and is never used for logs.
fn init_logging(verbose: bool) {
    use tracing_rolling_file::{RollingConditionBase, RollingFileAppenderBase};
    use tracing_subscriber::fmt::format::FmtSpan;

    // Create log directory
    let log_dir = config::base_dir()
        .map(|p| p.join("log"))
        .unwrap_or_else(|_| std::path::PathBuf::from("."));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Could not create log directory: {}", e);
        return;
    }

    // File appender with size-based rotation:
    // - Max 10MB per file
    // - Keep up to 5 files (total max ~50MB)
    // - Also rotate daily
    let log_path = log_dir.join("k8s-extension.log");
    let condition = RollingConditionBase::new()
        .daily()
        .max_size(10 * 1024 * 1024); // 10MB

    let file_appender = match RollingFileAppenderBase::new(log_path, condition, 5) {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {}", e);
            return;
        }
    };

    let (non_blocking, guard) = file_appender.get_non_blocking_appender();
    // Leak the guard to keep the background writer alive
    std::mem::forget(guard);

    let filter = if verbose {
        "k8s_extension=debug"
    } else {
        "k8s_extension=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    // File layer (always enabled)
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_span_events(FmtSpan::NONE);

    let stderr_layer = verbose.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::NONE)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();
}

/// Cancel `token` on Ctrl-C or SIGTERM
fn cancel_on_signal(token: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Could not install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted"),
            _ = terminate => tracing::info!("Terminated"),
        }
        token.cancel();
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider (aws-lc-rs); a provider installed
    // earlier in the process is kept
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let args = Args::parse();

    // Always log to file (~/.k8s-extension/log/k8s-extension.log); with -v
    // also log to stderr
    init_logging(args.verbose);

    let config = config::Config::load()?;

    match args.command {
        None | Some(Command::Serve) => serve(config, args.kubeconfig).await,
        Some(Command::Operations) => {
            println!("{}", output::operations_table());
            Ok(())
        }
        Some(Command::Call {
            operation,
            args: inline,
            file,
            output,
        }) => {
            let success = call(
                config,
                args.kubeconfig,
                &operation,
                inline.as_deref(),
                file.as_deref(),
                &output,
            )
            .await?;
            if !success {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

async fn serve(config: config::Config, kubeconfig: Option<String>) -> Result<()> {
    let shutdown = CancellationToken::new();
    cancel_on_signal(shutdown.clone());

    let extension = Arc::new(Extension::new(shutdown));
    let server = Server::new(extension, KubeConnector::new(config, kubeconfig));

    server
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;
    Ok(())
}

/// Read operation arguments from `--args` or `--file`; none means `{}`
fn load_call_args(inline: Option<&str>, file: Option<&Path>) -> Result<Value> {
    if let Some(json) = inline {
        return serde_json::from_str(json).context("Failed to parse --args as JSON");
    }

    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        // YAML is a superset of JSON, so this accepts both
        return serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()));
    }

    Ok(Value::Object(Default::default()))
}

/// Run one operation, print its outcome, and report whether it succeeded
async fn call(
    config: config::Config,
    kubeconfig: Option<String>,
    operation: &str,
    inline: Option<&str>,
    file: Option<&Path>,
    format: &OutputFormat,
) -> Result<bool> {
    let operation: Operation = match operation.parse() {
        Ok(op) => op,
        Err(e) => bail!("{} (see `k8s-extension operations`)", e),
    };
    let call_args = load_call_args(inline, file)?;

    let access = KubeConnector::new(config, kubeconfig)
        .connect(None)
        .await
        .context("Failed to initialize Kubernetes client")?;

    let shutdown = CancellationToken::new();
    cancel_on_signal(shutdown.clone());
    let extension = Extension::with_access(access, shutdown);

    let outcome = extension.call(operation, &call_args).await;
    println!("{}", output::format(&outcome, format));
    Ok(outcome.success)
}
