//! Tool registry: discovery and dispatch by name, grounded on the teacher's
//! `tools::registry::ToolRegistry` (`register`/`list_tools`/`get_tool`/
//! `has_tool`), populated once at startup and treated as append-only
//! afterward per spec §10 ("open/closed for tools").

use super::actors::{AddActorTool, DeleteActorTool, GetActorTool, SearchActorsTool, UpdateActorTool};
use super::context_tools::{DeleteContextTool, GetContextPageTool, ListActiveContextsTool};
use super::links::{GetActorMoviesTool, GetMovieCastTool, LinkActorToMovieTool, UnlinkActorFromMovieTool};
use super::movies::{
    AddMovieTool, DeleteMovieTool, GetMovieTool, ListTopMoviesTool, SearchByDecadeTool,
    SearchByRatingRangeTool, SearchMoviesTool, UpdateMovieTool,
};
use super::McpTool;
use crate::error::{McpError, Result};
use crate::protocol::ToolDefinition;
use crate::state::AppState;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn McpTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        let mut registry = Self { tools: HashMap::new() };

        registry.register(Box::new(AddMovieTool));
        registry.register(Box::new(GetMovieTool));
        registry.register(Box::new(UpdateMovieTool));
        registry.register(Box::new(DeleteMovieTool));
        registry.register(Box::new(SearchMoviesTool));
        registry.register(Box::new(ListTopMoviesTool));
        registry.register(Box::new(SearchByDecadeTool));
        registry.register(Box::new(SearchByRatingRangeTool));

        registry.register(Box::new(AddActorTool));
        registry.register(Box::new(GetActorTool));
        registry.register(Box::new(UpdateActorTool));
        registry.register(Box::new(DeleteActorTool));
        registry.register(Box::new(SearchActorsTool));

        registry.register(Box::new(LinkActorToMovieTool));
        registry.register(Box::new(UnlinkActorFromMovieTool));
        registry.register(Box::new(GetMovieCastTool));
        registry.register(Box::new(GetActorMoviesTool));

        registry.register(Box::new(GetContextPageTool));
        registry.register(Box::new(ListActiveContextsTool));
        registry.register(Box::new(DeleteContextTool));

        debug!("registered {} tools", registry.tools.len());
        registry
    }

    fn register(&mut self, tool: Box<dyn McpTool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<_> = self.tools.values().map(|t| t.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    pub async fn call_tool(&self, name: &str, args: Value, state: &AppState) -> Result<Value> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| McpError::InvalidParams(format!("unknown tool: {name}")))?;
        tool.execute(args, state).await
    }

    pub fn get_tool(&self, name: &str) -> Option<&dyn McpTool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_the_declared_tool_surface() {
        let registry = ToolRegistry::new();
        for name in [
            "add_movie",
            "get_movie",
            "update_movie",
            "delete_movie",
            "search_movies",
            "list_top_movies",
            "search_by_decade",
            "search_by_rating_range",
            "add_actor",
            "get_actor",
            "update_actor",
            "delete_actor",
            "search_actors",
            "link_actor_to_movie",
            "unlink_actor_from_movie",
            "get_movie_cast",
            "get_actor_movies",
        ] {
            assert!(registry.has_tool(name), "missing tool {name}");
        }
    }

    #[test]
    fn list_tools_is_sorted_and_non_empty() {
        let registry = ToolRegistry::new();
        let tools = registry.list_tools();
        assert!(!tools.is_empty());
        let mut sorted = tools.clone();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(tools.iter().map(|t| &t.name).collect::<Vec<_>>(), sorted.iter().map(|t| &t.name).collect::<Vec<_>>());
    }
}
