//! Actor CRUD and search tools.

use super::{context_error, paging_args, McpTool};
use crate::error::{McpError, Result};
use crate::state::AppState;
use async_trait::async_trait;
use chrono::Utc;
use movies_domain::{search::OrderBy, search::OrderDir, Actor, ActorSearchCriteria, NewActor};
use movies_ids::ActorId;
use serde_json::{json, Value};

fn actor_json(actor: &Actor) -> Value {
    json!({
        "id": actor.id().0,
        "name": actor.name(),
        "birth_year": actor.birth_year(),
        "bio": actor.bio(),
        "movie_ids": actor.movie_ids().iter().collect::<Vec<_>>(),
        "created_at": actor.created_at().to_rfc3339(),
        "updated_at": actor.updated_at().to_rfc3339(),
    })
}

fn required_id(args: &Value, field: &str) -> Result<ActorId> {
    args.get(field)
        .and_then(Value::as_i64)
        .map(ActorId::from)
        .ok_or_else(|| McpError::InvalidParams(format!("{field} is required")))
}

pub struct AddActorTool;

#[async_trait]
impl McpTool for AddActorTool {
    fn name(&self) -> &'static str {
        "add_actor"
    }

    fn description(&self) -> &'static str {
        "Add a new actor to the catalog"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "minLength": 1, "maxLength": 255},
                "birth_year": {"type": "integer", "minimum": 1850},
                "bio": {"type": "string", "maxLength": 4096},
            },
            "required": ["name"],
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> Result<Value> {
        let fields = NewActor {
            name: args
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| McpError::InvalidParams("name is required".to_string()))?
                .to_string(),
            birth_year: args.get("birth_year").and_then(Value::as_i64).map(|y| y as i32),
            bio: args.get("bio").and_then(Value::as_str).map(str::to_string),
        };

        let actor = state.actors.create(fields, Utc::now()).await?;
        Ok(actor_json(&actor))
    }
}

pub struct GetActorTool;

#[async_trait]
impl McpTool for GetActorTool {
    fn name(&self) -> &'static str {
        "get_actor"
    }

    fn description(&self) -> &'static str {
        "Retrieve an actor by id"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"actor_id": {"type": "integer", "minimum": 1}},
            "required": ["actor_id"],
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> Result<Value> {
        let id = required_id(&args, "actor_id")?;
        let actor = state.actors.get(id).await?;
        Ok(actor_json(&actor))
    }
}

pub struct UpdateActorTool;

#[async_trait]
impl McpTool for UpdateActorTool {
    fn name(&self) -> &'static str {
        "update_actor"
    }

    fn description(&self) -> &'static str {
        "Update an actor's fields; omitted fields are left unchanged"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "actor_id": {"type": "integer", "minimum": 1},
                "name": {"type": "string", "minLength": 1, "maxLength": 255},
                "birth_year": {"type": "integer", "minimum": 1850},
                "bio": {"type": "string", "maxLength": 4096},
            },
            "required": ["actor_id"],
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> Result<Value> {
        use crate::services::UpdateActorCommand;

        let id = required_id(&args, "actor_id")?;
        let cmd = UpdateActorCommand {
            id,
            name: args.get("name").and_then(Value::as_str).map(str::to_string),
            birth_year: args.get("birth_year").map(|v| v.as_i64().map(|y| y as i32)),
            bio: args.get("bio").map(|v| v.as_str().map(str::to_string)),
        };

        let actor = state.actors.update(cmd, Utc::now()).await?;
        Ok(actor_json(&actor))
    }
}

pub struct DeleteActorTool;

#[async_trait]
impl McpTool for DeleteActorTool {
    fn name(&self) -> &'static str {
        "delete_actor"
    }

    fn description(&self) -> &'static str {
        "Delete an actor from the catalog"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"actor_id": {"type": "integer", "minimum": 1}},
            "required": ["actor_id"],
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> Result<Value> {
        let id = required_id(&args, "actor_id")?;
        state.actors.delete(id).await?;
        Ok(json!({"deleted": true, "id": id.0}))
    }
}

pub struct SearchActorsTool;

#[async_trait]
impl McpTool for SearchActorsTool {
    fn name(&self) -> &'static str {
        "search_actors"
    }

    fn description(&self) -> &'static str {
        "Search actors by name"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name_contains": {"type": "string"},
                "order_dir": {"type": "string", "enum": ["asc", "desc"]},
                "page": {"type": "integer", "minimum": 1},
                "page_size": {"type": "integer", "minimum": 1, "maximum": 1000},
                "context_id": {"type": "string"},
            },
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> Result<Value> {
        let paging = paging_args(&args);

        if let Some(context_id) = &paging.context_id {
            let id = movies_ids::ContextId::from_wire(context_id);
            let page = state
                .context
                .get_page(&id, paging.page, paging.page_size)
                .await
                .map_err(context_error)?;
            return Ok(json!({
                "actors": page.items,
                "total": page.total,
                "context_id": page.context_id,
                "page": page.page,
                "page_size": page.page_size,
                "total_pages": page.total_pages,
            }));
        }

        let criteria = ActorSearchCriteria {
            name_contains: args.get("name_contains").and_then(Value::as_str).map(str::to_string),
            order_by: OrderBy::Name,
            order_dir: match args.get("order_dir").and_then(Value::as_str) {
                Some("desc") => OrderDir::Desc,
                _ => OrderDir::Asc,
            },
            limit: crate::context::MATERIALIZE_LIMIT as u32,
            offset: 0,
        };

        let actors = state.actors.search_all(&criteria).await?;
        let data: Vec<Value> = actors.iter().map(actor_json).collect();
        let ctx = state.context.create("search_actors", data, paging.page_size).await;
        let page = state
            .context
            .get_page(&ctx.id, paging.page, paging.page_size)
            .await
            .map_err(context_error)?;

        Ok(json!({
            "actors": page.items,
            "total": page.total,
            "context_id": page.context_id,
            "page": page.page,
            "page_size": page.page_size,
            "total_pages": page.total_pages,
        }))
    }
}
