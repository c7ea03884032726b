//! MCP tool implementations (C8): one struct per tool, each translating
//! validated JSON-RPC arguments into an application-service command/query
//! and shaping the result per spec §6 ("scalar results are returned
//! directly...; list results use `{items|movies|actors:[...], total:N}`").
//!
//! Grounded on the teacher's `tools/mod.rs` `McpTool` trait shape
//! (`name`/`description`/`input_schema`/`execute`/`definition`), generalized
//! from synchronous `execute` to async since every handler here awaits a
//! `sqlx` pool instead of message-passing to an in-process `CoreHandle`.

pub mod actors;
pub mod context_tools;
pub mod links;
pub mod movies;
pub mod registry;
pub mod schema;

pub use registry::ToolRegistry;

use crate::error::Result;
use crate::protocol::ToolDefinition;
use crate::state::AppState;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait McpTool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn input_schema(&self) -> Value;

    /// Execute against already schema-validated `args`.
    async fn execute(&self, args: Value, state: &AppState) -> Result<Value>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// Pull `page`/`page_size`/`context_id` paging controls out of a tool's raw
/// argument object. Shared by every search-style tool so paging behaves
/// identically across `search_movies`, `search_actors`, etc.
pub(crate) struct PagingArgs {
    pub context_id: Option<String>,
    pub page: usize,
    pub page_size: Option<usize>,
}

pub(crate) fn context_error(e: crate::context::ContextError) -> crate::error::McpError {
    use crate::error::McpError;
    match e {
        crate::context::ContextError::NotFound => McpError::NotFound("Context".to_string()),
        crate::context::ContextError::Expired => McpError::ContextExpired("context expired".to_string()),
    }
}

pub(crate) fn paging_args(args: &Value) -> PagingArgs {
    PagingArgs {
        context_id: args.get("context_id").and_then(Value::as_str).map(str::to_string),
        page: args
            .get("page")
            .and_then(Value::as_u64)
            .map(|p| p as usize)
            .unwrap_or(1)
            .max(1),
        page_size: args.get("page_size").and_then(Value::as_u64).map(|p| p as usize),
    }
}
