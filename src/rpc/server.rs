// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use super::connector::Connector;
use super::message::{
    ExecuteParams, ExtensionInfo, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    InitializeParams, METHOD_NOT_FOUND, PARSE_ERROR, Request, Response, RpcError,
};
use crate::operations::{Extension, Operation, UnknownOperation};

/// Serves one host over a line-oriented reader/writer pair.
///
/// Every request runs on its own task so a long `wait` does not block other
/// requests; responses funnel through a single writer task.
pub struct Server<C> {
    extension: Arc<Extension>,
    connector: Arc<C>,
}

impl<C: Connector + 'static> Server<C> {
    pub fn new(extension: Arc<Extension>, connector: C) -> Self {
        Self {
            extension,
            connector: Arc::new(connector),
        }
    }

    /// Serve until `shutdown`, end of input, or cancellation of the
    /// extension's shutdown token. Returns the writer once every response
    /// has been flushed.
    pub async fn run<R, W>(&self, reader: R, writer: W) -> Result<W>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel::<Response>();
        let writer_task = tokio::spawn(write_responses(rx, writer));

        let shutdown = self.extension.shutdown_token().clone();
        let mut lines = reader.lines();
        let mut tasks = JoinSet::new();

        info!("Serving JSON-RPC on stdio");

        loop {
            let line = tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Shutdown requested, no longer reading requests");
                    break;
                }
                line = lines.next_line() => line.context("Failed to read request")?,
            };

            let Some(line) = line else {
                debug!("Input closed");
                shutdown.cancel();
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let request = match parse_request(&line) {
                Ok(request) => request,
                Err(response) => {
                    let _ = tx.send(*response);
                    continue;
                }
            };

            reap_finished(&mut tasks);

            let extension = Arc::clone(&self.extension);
            let connector = Arc::clone(&self.connector);
            let tx = tx.clone();
            tasks.spawn(async move {
                let id = request.id.clone();
                let method = request.method.clone();
                let result = dispatch(&extension, connector.as_ref(), request).await;

                // Notifications never get a response
                let Some(id) = id else {
                    if let Err(e) = result {
                        warn!(method = %method, error = %e.message, "Notification failed");
                    }
                    return;
                };

                let response = match result {
                    Ok(value) => Response::result(id, value),
                    Err(e) => Response::error(id, e),
                };
                let _ = tx.send(response);
            });
        }

        // Waits observe the cancelled token and finish promptly
        while let Some(joined) = tasks.join_next().await {
            log_join_error(joined);
        }

        drop(tx);
        let writer = writer_task
            .await
            .context("Response writer task failed")??;

        info!("JSON-RPC server stopped");
        Ok(writer)
    }
}

/// Drop completed request tasks so the set only holds in-flight requests
fn reap_finished(tasks: &mut JoinSet<()>) {
    while let Some(joined) = tasks.try_join_next() {
        log_join_error(joined);
    }
}

fn log_join_error(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "Request task failed");
    }
}

fn parse_request(line: &str) -> Result<Request, Box<Response>> {
    let value: Value = serde_json::from_str(line).map_err(|e| {
        warn!(error = %e, "Unparseable request");
        Box::new(Response::error(
            Value::Null,
            RpcError::new(PARSE_ERROR, format!("parse error: {}", e)),
        ))
    })?;

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|e| {
        warn!(error = %e, "Invalid request");
        Box::new(Response::error(
            id,
            RpcError::new(INVALID_REQUEST, format!("invalid request: {}", e)),
        ))
    })
}

fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, RpcError> {
    let params = match params {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(params)
        .map_err(|e| RpcError::new(INVALID_PARAMS, format!("invalid params: {}", e)))
}

async fn dispatch<C: Connector + ?Sized>(
    extension: &Extension,
    connector: &C,
    request: Request,
) -> Result<Value, RpcError> {
    debug!(method = %request.method, "Handling request");

    match request.method.as_str() {
        "initialize" => {
            let params: InitializeParams = parse_params(request.params)?;
            let access = connector
                .connect(params.config.kubeconfig.as_deref())
                .await
                .map_err(|e| {
                    error!(error = %format!("{:#}", e), "Initialization failed");
                    RpcError::new(INTERNAL_ERROR, format!("failed to initialize: {:#}", e))
                })?;
            extension.set_access(access).await;
            info!("Extension initialized");
            to_value(ExtensionInfo::current())
        }
        "execute" => {
            let params: ExecuteParams = parse_params(request.params)?;
            let operation: Operation = params
                .operation
                .parse()
                .map_err(|e: UnknownOperation| RpcError::new(METHOD_NOT_FOUND, e.to_string()))?;
            let outcome = extension.call(operation, &params.args).await;
            debug!(operation = %operation, success = outcome.success, "Operation finished");
            to_value(outcome)
        }
        "shutdown" => {
            info!("Shutdown requested by host");
            extension.shutdown_token().cancel();
            Ok(Value::Null)
        }
        other => Err(RpcError::new(
            METHOD_NOT_FOUND,
            format!("method not found: {}", other),
        )),
    }
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError::new(INTERNAL_ERROR, e.to_string()))
}

async fn write_responses<W>(mut rx: mpsc::UnboundedReceiver<Response>, mut writer: W) -> Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = serde_json::to_vec(&response).context("Failed to encode response")?;
        line.push(b'\n');
        writer
            .write_all(&line)
            .await
            .context("Failed to write response")?;
        writer.flush().await.context("Failed to flush response")?;
    }
    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kubernetes::ResourceAccess;
    use crate::operations::testing::MockAccess;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::io::BufReader;
    use tokio_util::sync::CancellationToken;

    struct MockConnector;

    #[async_trait]
    impl Connector for MockConnector {
        async fn connect(&self, kubeconfig: Option<&str>) -> Result<Arc<dyn ResourceAccess>> {
            match kubeconfig {
                Some("/missing") => anyhow::bail!("kubeconfig not found: /missing"),
                _ => Ok(Arc::new(
                    MockAccess::default()
                        .on_current_context(|| Ok("prod".to_string()))
                        .on_get(|_, _, _| {
                            Ok(crate::kubernetes::GenericResource::from_value(json!({
                                "status": {"conditions": [{"type": "Ready", "status": "False"}]}
                            }))
                            .unwrap_or_default())
                        }),
                )),
            }
        }
    }

    fn server() -> Server<MockConnector> {
        Server::new(
            Arc::new(Extension::new(CancellationToken::new())),
            MockConnector,
        )
    }

    /// Run `input` to completion and index the responses by id
    async fn serve(input: &str) -> HashMap<String, Value> {
        let output = server()
            .run(BufReader::new(input.as_bytes()), Vec::new())
            .await
            .unwrap();

        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| {
                let value: Value = serde_json::from_str(line).unwrap();
                (value["id"].to_string(), value)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_initialize_returns_catalog() {
        let responses = serve(concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"config":{}}}"#,
            "\n",
        ))
        .await;
        let info = &responses["1"]["result"];
        assert_eq!(info["name"], "k8s-extension");
        assert_eq!(info["operations"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_execute_returns_outcome() {
        let extension = Arc::new(Extension::with_access(
            Arc::new(MockAccess::default().on_current_context(|| Ok("prod".to_string()))),
            CancellationToken::new(),
        ));
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":"a","method":"execute","params":{"operation":"getCurrentContext","args":{}}}"#,
            "\n",
        );
        let output = Server::new(extension, MockConnector)
            .run(BufReader::new(input.as_bytes()), Vec::new())
            .await
            .unwrap();

        let response: Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(response["id"], "a");
        assert_eq!(response["result"]["success"], true);
        assert_eq!(response["result"]["message"], "Current context: prod");
        assert_eq!(response["result"]["outputs"]["context"], "prod");
    }

    #[tokio::test]
    async fn test_execute_before_initialize_is_a_failed_outcome() {
        let responses = serve(concat!(
            r#"{"jsonrpc":"2.0","id":2,"method":"execute","params":{"operation":"listContexts"}}"#,
            "\n",
        ))
        .await;
        let result = &responses["2"]["result"];
        assert_eq!(result["success"], false);
        assert_eq!(result["error"], "kubernetes client not initialized");
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let responses = serve(concat!(
            "{not json\n",
            r#"{"jsonrpc":"2.0","id":3,"method":"execute","params":{"operation":"scale"}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":4,"method":"frobnicate"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":5,"method":"execute","params":{"args":{}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":6,"params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":7,"method":"initialize","params":{"config":{"kubeconfig":"/missing"}}}"#,
            "\n",
        ))
        .await;

        assert_eq!(responses["null"]["error"]["code"], PARSE_ERROR);
        assert_eq!(responses["3"]["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(responses["3"]["error"]["message"], "unknown operation: scale");
        assert_eq!(responses["4"]["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(responses["5"]["error"]["code"], INVALID_PARAMS);
        assert_eq!(responses["6"]["error"]["code"], INVALID_REQUEST);
        assert_eq!(responses["7"]["error"]["code"], INTERNAL_ERROR);
        assert!(
            responses["7"]["error"]["message"]
                .as_str()
                .unwrap()
                .contains("kubeconfig not found: /missing")
        );
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let responses = serve(concat!(
            r#"{"jsonrpc":"2.0","method":"execute","params":{"operation":"listContexts"}}"#,
            "\n",
        ))
        .await;
        assert!(responses.is_empty());
    }

    #[tokio::test]
    async fn test_reap_keeps_only_running_tasks() {
        let done = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut tasks = JoinSet::new();
        for _ in 0..100 {
            let done = done.clone();
            tasks.spawn(async move {
                done.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            });
        }
        tasks.spawn(std::future::pending::<()>());

        while done.load(std::sync::atomic::Ordering::SeqCst) < 100 {
            tokio::task::yield_now().await;
        }
        tokio::task::yield_now().await;

        reap_finished(&mut tasks);
        assert_eq!(tasks.len(), 1);
        tasks.abort_all();
    }

    #[tokio::test]
    async fn test_many_requests_on_one_connection() {
        let input: String = (0..200)
            .map(|id| {
                format!(
                    "{{\"jsonrpc\":\"2.0\",\"id\":{},\"method\":\"execute\",\"params\":{{\"operation\":\"listContexts\"}}}}\n",
                    id
                )
            })
            .collect();

        let responses = serve(&input).await;
        assert_eq!(responses.len(), 200);
        assert_eq!(responses["199"]["result"]["success"], false);
    }

    #[tokio::test]
    async fn test_shutdown_ends_loop_with_open_input() {
        let (mut client, server_side) = tokio::io::duplex(4096);
        client
            .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":9,\"method\":\"shutdown\"}\n")
            .await
            .unwrap();

        let output = tokio::time::timeout(
            Duration::from_secs(5),
            server().run(BufReader::new(server_side), Vec::new()),
        )
        .await
        .expect("server did not stop")
        .unwrap();

        let response: Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(response, json!({"jsonrpc": "2.0", "id": 9, "result": null}));
        drop(client);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_in_flight_wait() {
        let (mut client, server_side) = tokio::io::duplex(4096);
        let server = server();

        let requests = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#,
            "\n",
        );
        client.write_all(requests.as_bytes()).await.unwrap();

        let wait = concat!(
            r#"{"jsonrpc":"2.0","id":2,"method":"execute","params":{"operation":"wait","args":{"#,
            r#""apiVersion":"v1","kind":"Pod","metadata":{"name":"web"},"condition":"Ready"}}}"#,
            "\n",
        );
        let shutdown = concat!(r#"{"jsonrpc":"2.0","id":3,"method":"shutdown"}"#, "\n");

        let driver = async {
            // Let initialize finish before the wait starts
            tokio::time::sleep(Duration::from_millis(50)).await;
            client.write_all(wait.as_bytes()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            client.write_all(shutdown.as_bytes()).await.unwrap();
            client
        };

        let (output, _client) = tokio::join!(
            tokio::time::timeout(
                Duration::from_secs(5),
                server.run(BufReader::new(server_side), Vec::new()),
            ),
            driver,
        );
        let output = output.expect("server did not stop").unwrap();

        let responses: HashMap<String, Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| {
                let value: Value = serde_json::from_str(line).unwrap();
                (value["id"].to_string(), value)
            })
            .collect();

        let wait = &responses["2"]["result"];
        assert_eq!(wait["success"], false);
        assert_eq!(wait["message"], "Condition Ready=True not met");
        assert_eq!(
            wait["error"],
            "cancelled while waiting for Pod/web: last status was False"
        );
        assert_eq!(responses["3"]["result"], Value::Null);
    }
}
