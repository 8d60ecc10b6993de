//! MCP Server implementation

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use gripe_core::{ComplaintService, ListOptions};
use gripe_types::Complaint;

use crate::mcp_protocol::*;
use crate::tools::{self, parse_severity};

pub struct GripeMcpServer {
    service: Arc<ComplaintService>,
    query_timeout: Duration,
    shutdown: CancellationToken,
}

impl GripeMcpServer {
    pub fn new(service: Arc<ComplaintService>, query_timeout: Duration) -> Self {
        Self {
            service,
            query_timeout,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token whose cancellation aborts every in-flight query
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub async fn run_stdio(&self) -> anyhow::Result<()> {
        info!("Gripe MCP Server started (stdio mode)");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve line-delimited requests from `reader` until EOF or shutdown.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        loop {
            let line = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("shutdown requested, closing stdio loop");
                    break;
                }
                line = lines.next_line() => line?,
            };
            let Some(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }

            debug!("Received: {}", line);
            let Some(response) = self.handle_request(&line).await else {
                continue;
            };

            let response_json = serde_json::to_string(&response)?;
            writer.write_all(response_json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
            debug!("Sent: {}", response_json);
        }

        info!("Gripe MCP Server stopped");
        Ok(())
    }

    /// Handle one JSON-RPC message. Notifications yield `None`.
    pub async fn handle_request(&self, line: &str) -> Option<McpResponse> {
        let request: McpRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "unparseable request");
                return Some(McpResponse::error(
                    None,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
            }
        };

        if request.is_notification() {
            debug!(method = %request.method, "notification received");
            return None;
        }

        let id = request.id.clone();
        debug!("Handling method: {}", request.method);

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tool_call(id, request.params).await,
            "ping" => Ok(McpResponse::success(id, json!({}))),
            other => Ok(McpResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Unknown method: {}", other),
            )),
        };

        Some(response.unwrap_or_else(|e| {
            error!("Error handling request: {}", e);
            McpResponse::error(request.id, error_codes::INTERNAL_ERROR, e.to_string())
        }))
    }

    fn handle_initialize(&self, id: Option<Value>) -> anyhow::Result<McpResponse> {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: "gripe-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        Ok(McpResponse::success(id, serde_json::to_value(result)?))
    }

    fn handle_tools_list(&self, id: Option<Value>) -> anyhow::Result<McpResponse> {
        Ok(McpResponse::success(
            id,
            json!({ "tools": tools::catalogue() }),
        ))
    }

    async fn handle_tool_call(&self, id: Option<Value>, params: Value) -> anyhow::Result<McpResponse> {
        let params: ToolCallParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                return Ok(McpResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    format!("Invalid tool call params: {}", e),
                ))
            }
        };

        info!(tool = %params.name, "Tool call");

        // per-call deadline; the filter engine stops scanning once it fires
        let ctx = self.shutdown.child_token();
        let deadline = {
            let ctx = ctx.clone();
            let timeout = self.query_timeout;
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(timeout) => {
                        warn!(timeout_ms = timeout.as_millis() as u64, "tool call deadline reached");
                        ctx.cancel();
                    }
                    _ = ctx.cancelled() => {}
                }
            })
        };

        let result = self.call_tool(&ctx, &params.name, params.arguments).await;
        deadline.abort();

        let tool_result = match result {
            Ok(mut output) => {
                // scans stop early once the token fires; tell the caller to re-issue
                if ctx.is_cancelled() {
                    if let Some(fields) = output.as_object_mut() {
                        warn!(tool = %params.name, "returning partial result");
                        fields.insert("partial".to_string(), Value::Bool(true));
                    }
                }
                ToolCallResult::text(serde_json::to_string_pretty(&output)?)
            }
            Err(e) => {
                warn!(tool = %params.name, error = %e, "tool call failed");
                ToolCallResult::failure(e)
            }
        };
        Ok(McpResponse::success(id, serde_json::to_value(tool_result)?))
    }

    async fn call_tool(
        &self,
        ctx: &CancellationToken,
        name: &str,
        arguments: Value,
    ) -> anyhow::Result<Value> {
        match name {
            tools::FILE_COMPLAINT => {
                let args: tools::FileComplaintArgs = parse_args(arguments)?;
                let filed = self
                    .service
                    .file_complaint(ctx, args.into_new_complaint()?)
                    .await?;
                render(&json!({ "id": filed.id, "complaint": filed }))
            }
            tools::GET_COMPLAINT => {
                let args: tools::IdArgs = parse_args(arguments)?;
                render(&self.service.get_complaint(ctx, &args.id).await?)
            }
            tools::LIST_COMPLAINTS => {
                let args: tools::ListArgs = parse_args(arguments)?;
                let severity = parse_severity(args.severity.as_deref())?;
                let complaints = match (severity, args.project_name.as_deref()) {
                    (Some(severity), None) => {
                        self.service.list_by_severity(ctx, severity, args.limit).await?
                    }
                    (None, Some(project)) => {
                        self.service.list_by_project(ctx, project, args.limit).await?
                    }
                    (Some(_), Some(_)) => {
                        anyhow::bail!("filter by severity or project_name, not both")
                    }
                    (None, None) => {
                        let options = ListOptions {
                            limit: args.limit,
                            offset: args.offset.unwrap_or(0),
                        };
                        self.service.list(ctx, options).await?
                    }
                };
                render_list(&complaints)
            }
            tools::SEARCH_COMPLAINTS => {
                let args: tools::SearchArgs = parse_args(arguments)?;
                render_list(&self.service.search(ctx, &args.query, args.limit).await?)
            }
            tools::LIST_UNRESOLVED => {
                let args: tools::LimitArgs = parse_args(arguments)?;
                render_list(&self.service.list_unresolved(ctx, args.limit).await?)
            }
            tools::UPDATE_COMPLAINT => {
                let (id, patch) = parse_args::<tools::UpdateArgs>(arguments)?.into_parts();
                render(&self.service.amend(ctx, &id, patch).await?)
            }
            tools::RESOLVE_COMPLAINT => {
                let args: tools::ResolveArgs = parse_args(arguments)?;
                render(&self.service.resolve(ctx, &args.id, &args.resolved_by).await?)
            }
            tools::CACHE_STATS => match self.service.cache_stats(ctx).await {
                Some(stats) => render(&stats),
                None => render(&json!({ "enabled": false })),
            },
            _ => Err(anyhow::anyhow!("Unknown tool: {}", name)),
        }
    }
}

/// Missing or null arguments are treated as `{}`.
fn parse_args<T: DeserializeOwned>(arguments: Value) -> anyhow::Result<T> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| anyhow::anyhow!("Invalid arguments: {}", e))
}

fn render<T: serde::Serialize>(value: &T) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(value)?)
}

fn render_list(complaints: &[Complaint]) -> anyhow::Result<Value> {
    render(&json!({ "count": complaints.len(), "complaints": complaints }))
}
