//! Movie<->actor relationship tools (C8, relationship group).

use super::McpTool;
use crate::error::{McpError, Result};
use crate::state::AppState;
use async_trait::async_trait;
use chrono::Utc;
use movies_ids::{ActorId, MovieId};
use serde_json::{json, Value};

fn movie_id(args: &Value, field: &str) -> Result<MovieId> {
    args.get(field)
        .and_then(Value::as_i64)
        .map(MovieId::from)
        .ok_or_else(|| McpError::InvalidParams(format!("{field} is required")))
}

fn actor_id(args: &Value, field: &str) -> Result<ActorId> {
    args.get(field)
        .and_then(Value::as_i64)
        .map(ActorId::from)
        .ok_or_else(|| McpError::InvalidParams(format!("{field} is required")))
}

pub struct LinkActorToMovieTool;

#[async_trait]
impl McpTool for LinkActorToMovieTool {
    fn name(&self) -> &'static str {
        "link_actor_to_movie"
    }

    fn description(&self) -> &'static str {
        "Add an actor to a movie's cast"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "movie_id": {"type": "integer", "minimum": 1},
                "actor_id": {"type": "integer", "minimum": 1},
                "role": {"type": "string", "maxLength": 255},
            },
            "required": ["movie_id", "actor_id"],
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> Result<Value> {
        let movie_id = movie_id(&args, "movie_id")?;
        let actor_id = actor_id(&args, "actor_id")?;
        let role = args.get("role").and_then(Value::as_str).map(str::to_string);
        state.links.link(movie_id, actor_id, role, Utc::now()).await?;
        Ok(json!({"linked": true, "movie_id": movie_id.0, "actor_id": actor_id.0}))
    }
}

pub struct UnlinkActorFromMovieTool;

#[async_trait]
impl McpTool for UnlinkActorFromMovieTool {
    fn name(&self) -> &'static str {
        "unlink_actor_from_movie"
    }

    fn description(&self) -> &'static str {
        "Remove an actor from a movie's cast"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "movie_id": {"type": "integer", "minimum": 1},
                "actor_id": {"type": "integer", "minimum": 1},
            },
            "required": ["movie_id", "actor_id"],
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> Result<Value> {
        let movie_id = movie_id(&args, "movie_id")?;
        let actor_id = actor_id(&args, "actor_id")?;
        state.links.unlink(movie_id, actor_id, Utc::now()).await?;
        Ok(json!({"unlinked": true, "movie_id": movie_id.0, "actor_id": actor_id.0}))
    }
}

pub struct GetMovieCastTool;

#[async_trait]
impl McpTool for GetMovieCastTool {
    fn name(&self) -> &'static str {
        "get_movie_cast"
    }

    fn description(&self) -> &'static str {
        "List the actors in a movie's cast"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"movie_id": {"type": "integer", "minimum": 1}},
            "required": ["movie_id"],
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> Result<Value> {
        let movie_id = movie_id(&args, "movie_id")?;
        let cast = state.links.movie_cast(movie_id).await?;
        let items: Vec<Value> = cast
            .iter()
            .map(|(a, role)| {
                json!({
                    "id": a.id().0,
                    "name": a.name(),
                    "birth_year": a.birth_year(),
                    "role": role,
                })
            })
            .collect();
        let total = items.len();
        Ok(json!({"actors": items, "total": total}))
    }
}

pub struct GetActorMoviesTool;

#[async_trait]
impl McpTool for GetActorMoviesTool {
    fn name(&self) -> &'static str {
        "get_actor_movies"
    }

    fn description(&self) -> &'static str {
        "List the movies an actor has appeared in"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"actor_id": {"type": "integer", "minimum": 1}},
            "required": ["actor_id"],
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> Result<Value> {
        let actor_id = actor_id(&args, "actor_id")?;
        let movies = state.links.actor_movies(actor_id).await?;
        let items: Vec<Value> = movies
            .iter()
            .map(|m| {
                json!({
                    "id": m.id().0,
                    "title": m.title(),
                    "year": m.year(),
                })
            })
            .collect();
        let total = items.len();
        Ok(json!({"movies": items, "total": total}))
    }
}
