//! Async dispatch core (C1 + C3): one reader task, one spawned worker per
//! request, one serializing writer task.
//!
//! Generalizes `casparian_mcp::server::McpServer`'s synchronous
//! `BufRead::lines()` loop (stdin parse -> `handle_request` -> blocking
//! `write_response`) into the concurrent shape spec §5 requires: the reader
//! never blocks on anything but the next line, workers may suspend on
//! database I/O or the context-manager lock, and a single task owns stdout
//! so two workers' responses can never interleave mid-line.

use crate::error::McpError;
use crate::protocol::{
    methods, ErrorCode, InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, PromptGetParams, ResourceReadParams, ServerCapabilities, ServerInfo,
    ToolCallParams, JSONRPC_VERSION, MCP_PROTOCOL_VERSION,
};
use crate::session::SessionController;
use crate::state::AppState;
use crate::tools::ToolRegistry;
use crate::{prompts, resources};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Bounded drain window given to in-flight workers after stdin EOF, before
/// the writer channel is closed and `run()` returns.
const SHUTDOWN_DRAIN: Duration = Duration::from_secs(5);

/// How often the background sweeper clears expired context-manager entries
/// (spec §4.11: `create` "start[s] (or coalesce[s] with) a background sweep
/// that deletes expired entries"). On-access expiry in `get_page` already
/// keeps correctness; this bounds how long an expired-but-never-revisited
/// context lingers in memory.
const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Clone)]
pub struct ServerInfoConfig {
    pub name: String,
    pub version: String,
}

pub struct McpServer {
    tools: Arc<ToolRegistry>,
    state: AppState,
    session: Arc<SessionController>,
    info: ServerInfoConfig,
}

impl McpServer {
    pub fn new(state: AppState, info: ServerInfoConfig) -> Self {
        Self {
            tools: Arc::new(ToolRegistry::new()),
            state,
            session: Arc::new(SessionController::new()),
            info,
        }
    }

    /// Run the reader/worker/writer loop until stdin EOF, then drain and
    /// return. Never called concurrently with itself.
    pub async fn run(self) -> anyhow::Result<()> {
        let stdin = tokio::io::stdin();
        let mut lines = BufReader::new(stdin).lines();
        let mut stdout = tokio::io::stdout();

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let writer = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                if let Err(e) = stdout.write_all(line.as_bytes()).await {
                    error!("stdout write failed: {e}");
                    break;
                }
                if let Err(e) = stdout.write_all(b"\n").await {
                    error!("stdout write failed: {e}");
                    break;
                }
                if let Err(e) = stdout.flush().await {
                    error!("stdout flush failed: {e}");
                    break;
                }
            }
        });

        let cancellation = CancellationToken::new();
        let mut workers = Vec::new();

        let sweeper = {
            let context = self.state.context.clone();
            let token = cancellation.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
                ticker.tick().await; // first tick fires immediately; skip it
                loop {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = ticker.tick() => {
                            let removed = context.sweep_expired().await;
                            if removed > 0 {
                                debug!("context sweeper removed {removed} expired entries");
                            }
                        }
                    }
                }
            })
        };

        info!("movies MCP server starting");

        loop {
            let next = lines.next_line().await;
            match next {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    debug!("received: {line}");

                    let tools = self.tools.clone();
                    let state = self.state.clone();
                    let session = self.session.clone();
                    let info = self.info.clone();
                    let tx = tx.clone();
                    let token = cancellation.clone();

                    workers.push(tokio::spawn(async move {
                        tokio::select! {
                            _ = token.cancelled() => {}
                            response = dispatch_line(line, &tools, &state, &session, &info) => {
                                if let Some(body) = response {
                                    let _ = tx.send(body);
                                }
                            }
                        }
                    }));
                }
                Ok(None) => break,
                Err(e) => {
                    error!("failed reading stdin: {e}");
                    break;
                }
            }
        }

        self.session.mark_shutdown();
        cancellation.cancel();
        drop(tx);

        for handle in workers {
            if tokio::time::timeout(SHUTDOWN_DRAIN, handle).await.is_err() {
                warn!("worker did not drain within the shutdown window");
            }
        }
        let _ = sweeper.await;

        let _ = writer.await;
        info!("movies MCP server shut down");
        Ok(())
    }
}

async fn dispatch_line(
    line: String,
    tools: &ToolRegistry,
    state: &AppState,
    session: &SessionController,
    info: &ServerInfoConfig,
) -> Option<String> {
    let request: JsonRpcRequest = match serde_json::from_str(&line) {
        Ok(req) => req,
        Err(e) => {
            let response = JsonRpcResponse::error(
                None,
                JsonRpcError::new(ErrorCode::ParseError, format!("invalid JSON: {e}")),
            );
            return Some(serde_json::to_string(&response).unwrap());
        }
    };

    if request.jsonrpc != JSONRPC_VERSION {
        let response = JsonRpcResponse::error(
            request.id,
            JsonRpcError::new(ErrorCode::InvalidRequest, format!("invalid jsonrpc version: {}", request.jsonrpc)),
        );
        return Some(serde_json::to_string(&response).unwrap());
    }

    let is_notification = request.is_notification();
    let response = handle_request(request, tools, state, session, info).await;

    if is_notification {
        return None;
    }
    Some(serde_json::to_string(&response).unwrap())
}

/// Every non-`initialize` method requires `Ready` (spec §4.2's Open Question
/// resolution: uniform `-32002`).
fn require_ready(session: &SessionController, id: Option<crate::protocol::RequestId>) -> std::result::Result<(), JsonRpcResponse> {
    if session.is_ready() {
        Ok(())
    } else {
        Err(JsonRpcResponse::error(
            id,
            JsonRpcError::new(ErrorCode::NOT_INITIALIZED, "server not initialized"),
        ))
    }
}

async fn handle_request(
    request: JsonRpcRequest,
    tools: &ToolRegistry,
    state: &AppState,
    session: &SessionController,
    info: &ServerInfoConfig,
) -> JsonRpcResponse {
    let id = request.id.clone();

    match request.method.as_str() {
        methods::INITIALIZE => handle_initialize(request, session, info),
        methods::INITIALIZED => JsonRpcResponse {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: None,
            result: None,
            error: None,
        },
        methods::PING => JsonRpcResponse::success(id, serde_json::json!({})),
        methods::TOOLS_LIST => match require_ready(session, id.clone()) {
            Ok(()) => {
                let result = crate::protocol::ToolsListResult { tools: tools.list_tools() };
                JsonRpcResponse::success(id, serde_json::to_value(result).unwrap())
            }
            Err(resp) => resp,
        },
        methods::TOOLS_CALL => match require_ready(session, id.clone()) {
            Ok(()) => handle_tools_call(request, tools, state, id).await,
            Err(resp) => resp,
        },
        methods::RESOURCES_LIST => match require_ready(session, id.clone()) {
            Ok(()) => {
                let result = crate::protocol::ResourcesListResult { resources: resources::list() };
                JsonRpcResponse::success(id, serde_json::to_value(result).unwrap())
            }
            Err(resp) => resp,
        },
        methods::RESOURCES_READ => match require_ready(session, id.clone()) {
            Ok(()) => handle_resources_read(request, state, id).await,
            Err(resp) => resp,
        },
        methods::PROMPTS_LIST => match require_ready(session, id.clone()) {
            Ok(()) => {
                let result = crate::protocol::PromptsListResult { prompts: prompts::list() };
                JsonRpcResponse::success(id, serde_json::to_value(result).unwrap())
            }
            Err(resp) => resp,
        },
        methods::PROMPTS_GET => match require_ready(session, id.clone()) {
            Ok(()) => handle_prompts_get(request, id),
            Err(resp) => resp,
        },
        other => JsonRpcResponse::error(id, JsonRpcError::new(ErrorCode::MethodNotFound, format!("unknown method: {other}"))),
    }
}

fn handle_initialize(request: JsonRpcRequest, session: &SessionController, info: &ServerInfoConfig) -> JsonRpcResponse {
    let id = request.id.clone();
    let params: InitializeParams = match request.params.and_then(|p| serde_json::from_value(p).ok()) {
        Some(p) => p,
        None => {
            return JsonRpcResponse::error(id, JsonRpcError::new(ErrorCode::InvalidParams, "missing or invalid initialize params"));
        }
    };

    if params.protocol_version != MCP_PROTOCOL_VERSION {
        return JsonRpcResponse::error(
            id,
            JsonRpcError::new(
                ErrorCode::InvalidParams,
                format!(
                    "unsupported protocol version: {} (this server requires protocol version {MCP_PROTOCOL_VERSION})",
                    params.protocol_version
                ),
            ),
        );
    }

    session.mark_ready();

    let result = InitializeResult {
        protocol_version: MCP_PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities::default(),
        server_info: ServerInfo {
            name: info.name.clone(),
            version: info.version.clone(),
        },
    };

    JsonRpcResponse::success(id, serde_json::to_value(result).unwrap())
}

async fn handle_tools_call(
    request: JsonRpcRequest,
    tools: &ToolRegistry,
    state: &AppState,
    id: Option<crate::protocol::RequestId>,
) -> JsonRpcResponse {
    let params: ToolCallParams = match request.params.and_then(|p| serde_json::from_value(p).ok()) {
        Some(p) => p,
        None => {
            return JsonRpcResponse::error(id, JsonRpcError::new(ErrorCode::InvalidParams, "missing or invalid tools/call params"));
        }
    };

    let tool = match tools.get_tool(&params.name) {
        Some(t) => t,
        None => {
            return JsonRpcResponse::error(id, JsonRpcError::new(ErrorCode::MethodNotFound, format!("unknown tool: {}", params.name)));
        }
    };

    let failures = crate::tools::schema::validate(&tool.input_schema(), &params.arguments);
    if !failures.is_empty() {
        return JsonRpcResponse::error(
            id,
            JsonRpcError::with_data(
                ErrorCode::InvalidParams,
                "tool argument validation failed",
                crate::error::validation_error_data(&failures),
            ),
        );
    }

    match tools.call_tool(&params.name, params.arguments, state).await {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => {
            error!("tool {} failed: {e}", params.name);
            JsonRpcResponse::error(id, e.into_wire())
        }
    }
}

async fn handle_resources_read(request: JsonRpcRequest, state: &AppState, id: Option<crate::protocol::RequestId>) -> JsonRpcResponse {
    let params: ResourceReadParams = match request.params.and_then(|p| serde_json::from_value(p).ok()) {
        Some(p) => p,
        None => {
            return JsonRpcResponse::error(id, JsonRpcError::new(ErrorCode::InvalidParams, "missing or invalid resources/read params"));
        }
    };

    match resources::read(&params.uri, state).await {
        Ok(content) => {
            let result = crate::protocol::ResourceReadResult { contents: vec![content] };
            JsonRpcResponse::success(id, serde_json::to_value(result).unwrap())
        }
        Err(e) => JsonRpcResponse::error(id, e.into_wire()),
    }
}

fn handle_prompts_get(request: JsonRpcRequest, id: Option<crate::protocol::RequestId>) -> JsonRpcResponse {
    let params: PromptGetParams = match request.params.and_then(|p| serde_json::from_value(p).ok()) {
        Some(p) => p,
        None => {
            return JsonRpcResponse::error(id, JsonRpcError::new(ErrorCode::InvalidParams, "missing or invalid prompts/get params"));
        }
    };

    match prompts::get(&params.name, &params.arguments) {
        Ok(result) => JsonRpcResponse::success(id, serde_json::to_value(result).unwrap()),
        Err(e) => JsonRpcResponse::error(id, e.into_wire()),
    }
}

impl From<McpError> for JsonRpcError {
    fn from(e: McpError) -> Self {
        e.into_wire()
    }
}

/// End-to-end request/response tests driving the dispatch functions directly
/// against an in-memory database, in the style of the teacher's
/// `tests/tool_integration.rs`: no stdio, no process boundary, just the same
/// `handle_request` the reader/worker loop calls per line.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{ActorService, LinkService, MovieService};
    use movies_db::{create_pool, ensure_schema, ActorRepository, DbConfig, LinkRepository, MovieRepository};
    use serde_json::json;

    async fn test_state() -> AppState {
        let pool = create_pool(&DbConfig::sqlite_memory()).await.unwrap();
        ensure_schema(&pool).await.unwrap();
        AppState {
            movies: MovieService::new(MovieRepository::new(pool.clone())),
            actors: ActorService::new(ActorRepository::new(pool.clone())),
            links: LinkService::new(
                ActorRepository::new(pool.clone()),
                MovieRepository::new(pool.clone()),
                LinkRepository::new(pool.clone()),
            ),
            context: std::sync::Arc::new(crate::context::ContextManager::new()),
        }
    }

    fn request(id: i64, method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(crate::protocol::RequestId::Number(id)),
            method: method.to_string(),
            params: Some(params),
        }
    }

    fn unwrap_result(resp: JsonRpcResponse) -> Value {
        assert!(resp.error.is_none(), "unexpected error: {:?}", resp.error);
        resp.result.unwrap()
    }

    async fn initialize(tools: &ToolRegistry, state: &AppState, session: &SessionController, info: &ServerInfoConfig) {
        let req = request(
            0,
            methods::INITIALIZE,
            json!({"protocolVersion": MCP_PROTOCOL_VERSION, "capabilities": {}}),
        );
        let resp = handle_request(req, tools, state, session, info).await;
        assert!(resp.error.is_none());
        assert!(session.is_ready());
    }

    #[tokio::test]
    async fn methods_before_initialize_are_rejected() {
        let tools = ToolRegistry::new();
        let state = test_state().await;
        let session = SessionController::new();
        let info = ServerInfoConfig { name: "test".to_string(), version: "0.0.0".to_string() };

        let req = request(1, methods::TOOLS_LIST, Value::Null);
        let resp = handle_request(req, &tools, &state, &session, &info).await;
        let err = resp.error.expect("expected an error before initialize");
        assert_eq!(err.code, ErrorCode::NOT_INITIALIZED.as_i32());
    }

    #[tokio::test]
    async fn add_get_delete_get_round_trip() {
        let tools = ToolRegistry::new();
        let state = test_state().await;
        let session = SessionController::new();
        let info = ServerInfoConfig { name: "test".to_string(), version: "0.0.0".to_string() };
        initialize(&tools, &state, &session, &info).await;

        let add_req = request(
            1,
            methods::TOOLS_CALL,
            json!({"name": "add_movie", "arguments": {"title": "Arrival", "director": "Denis Villeneuve", "year": 2016}}),
        );
        let add_resp = handle_request(add_req, &tools, &state, &session, &info).await;
        let added = unwrap_result(add_resp);
        let movie_id = added.get("id").and_then(Value::as_i64).expect("add_movie returns the new id");

        let get_req = request(2, methods::TOOLS_CALL, json!({"name": "get_movie", "arguments": {"movie_id": movie_id}}));
        let get_resp = handle_request(get_req, &tools, &state, &session, &info).await;
        let fetched = unwrap_result(get_resp);
        assert_eq!(fetched.get("title").and_then(Value::as_str), Some("Arrival"));

        let delete_req = request(3, methods::TOOLS_CALL, json!({"name": "delete_movie", "arguments": {"movie_id": movie_id}}));
        let delete_resp = handle_request(delete_req, &tools, &state, &session, &info).await;
        assert!(delete_resp.error.is_none());

        let get_again = request(4, methods::TOOLS_CALL, json!({"name": "get_movie", "arguments": {"movie_id": movie_id}}));
        let resp = handle_request(get_again, &tools, &state, &session, &info).await;
        assert!(resp.error.is_some(), "expected not-found after delete");
    }

    #[tokio::test]
    async fn unknown_tool_name_is_invalid_params() {
        let tools = ToolRegistry::new();
        let state = test_state().await;
        let session = SessionController::new();
        let info = ServerInfoConfig { name: "test".to_string(), version: "0.0.0".to_string() };
        initialize(&tools, &state, &session, &info).await;

        let req = request(1, methods::TOOLS_CALL, json!({"name": "not_a_real_tool", "arguments": {}}));
        let resp = handle_request(req, &tools, &state, &session, &info).await;
        let err = resp.error.expect("expected an error for an unknown tool");
        assert_eq!(err.code, ErrorCode::MethodNotFound.as_i32());
    }

    #[tokio::test]
    async fn tools_call_with_missing_required_argument_is_invalid_params() {
        let tools = ToolRegistry::new();
        let state = test_state().await;
        let session = SessionController::new();
        let info = ServerInfoConfig { name: "test".to_string(), version: "0.0.0".to_string() };
        initialize(&tools, &state, &session, &info).await;

        let req = request(1, methods::TOOLS_CALL, json!({"name": "add_movie", "arguments": {"title": "No Director"}}));
        let resp = handle_request(req, &tools, &state, &session, &info).await;
        let err = resp.error.expect("expected validation failure");
        assert_eq!(err.code, ErrorCode::InvalidParams.as_i32());
        assert!(err.data.is_some(), "validation failures should be reported in error.data");
    }

    #[tokio::test]
    async fn dispatch_line_rejects_malformed_json() {
        let tools = ToolRegistry::new();
        let state = test_state().await;
        let session = SessionController::new();
        let info = ServerInfoConfig { name: "test".to_string(), version: "0.0.0".to_string() };

        let resp_line = dispatch_line("not json".to_string(), &tools, &state, &session, &info)
            .await
            .expect("parse errors still get a response");
        let resp: JsonRpcResponse = serde_json::from_str(&resp_line).unwrap();
        assert_eq!(resp.error.unwrap().code, ErrorCode::ParseError.as_i32());
    }
}
