//! Direct handles onto the context manager (C11), for a client paging
//! through a previously materialized search result, listing what's still
//! live, or releasing one early. Every search-style tool already returns a
//! `context_id`; these three let a client act on it without re-querying.

use super::{context_error, McpTool};
use crate::error::{McpError, Result};
use crate::state::AppState;
use async_trait::async_trait;
use movies_ids::ContextId;
use serde_json::{json, Value};

fn required_context_id(args: &Value) -> Result<ContextId> {
    args.get("context_id")
        .and_then(Value::as_str)
        .map(ContextId::from_wire)
        .ok_or_else(|| McpError::InvalidParams("context_id is required".to_string()))
}

pub struct GetContextPageTool;

#[async_trait]
impl McpTool for GetContextPageTool {
    fn name(&self) -> &'static str {
        "get_context_page"
    }

    fn description(&self) -> &'static str {
        "Fetch a page from a previously created search context"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "context_id": {"type": "string"},
                "page": {"type": "integer", "minimum": 1},
                "page_size": {"type": "integer", "minimum": 1, "maximum": 1000},
            },
            "required": ["context_id"],
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> Result<Value> {
        let id = required_context_id(&args)?;
        let page = args.get("page").and_then(Value::as_u64).map(|p| p as usize).unwrap_or(1).max(1);
        let page_size = args.get("page_size").and_then(Value::as_u64).map(|p| p as usize);

        let page = state.context.get_page(&id, page, page_size).await.map_err(context_error)?;
        Ok(json!({
            "items": page.items,
            "total": page.total,
            "context_id": page.context_id,
            "page": page.page,
            "page_size": page.page_size,
            "total_pages": page.total_pages,
        }))
    }
}

pub struct ListActiveContextsTool;

#[async_trait]
impl McpTool for ListActiveContextsTool {
    fn name(&self) -> &'static str {
        "list_active_contexts"
    }

    fn description(&self) -> &'static str {
        "List all currently live search contexts"
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: Value, state: &AppState) -> Result<Value> {
        let contexts = state.context.list_active().await;
        let total = contexts.len();
        Ok(json!({"contexts": contexts, "total": total}))
    }
}

pub struct DeleteContextTool;

#[async_trait]
impl McpTool for DeleteContextTool {
    fn name(&self) -> &'static str {
        "delete_context"
    }

    fn description(&self) -> &'static str {
        "Release a search context before its TTL expires"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"context_id": {"type": "string"}},
            "required": ["context_id"],
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> Result<Value> {
        let id = required_context_id(&args)?;
        state.context.delete(&id).await.map_err(context_error)?;
        Ok(json!({"deleted": true, "context_id": id.as_str()}))
    }
}
