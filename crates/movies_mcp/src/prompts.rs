//! Prompt provider (C10): static catalog plus argument substitution into the
//! `{description, messages}` envelope (spec §4.10).
//!
//! The teacher's own `prompts.rs` references `PromptContent`/
//! `PromptDefinition`/`PromptMessage`/`PromptsGetResult` types that are never
//! defined anywhere else in that crate and never wired into its dispatch
//! table — dead code, not a usable precedent. This module is built fresh
//! from general MCP prompt conventions, matching the teacher's
//! plain-struct-plus-`json!`-free style used elsewhere (tool definitions are
//! built the same way from `ToolDefinition` structs).
//!
//! Three templates are provided (expansion: the distilled spec names the
//! envelope shape but not concrete templates):
//! - `recommend_similar(title, genre?)`
//! - `actor_filmography(actor_name)`
//! - `catalog_summary()`

use crate::error::{McpError, Result};
use crate::protocol::{PromptArgument, PromptContent, PromptDefinition, PromptGetResult, PromptMessage};
use std::collections::HashMap;

pub const RECOMMEND_SIMILAR: &str = "recommend_similar";
pub const ACTOR_FILMOGRAPHY: &str = "actor_filmography";
pub const CATALOG_SUMMARY: &str = "catalog_summary";

pub fn list() -> Vec<PromptDefinition> {
    vec![
        PromptDefinition {
            name: RECOMMEND_SIMILAR.to_string(),
            description: "Ask the assistant to recommend movies similar to a given title".to_string(),
            arguments: vec![
                PromptArgument {
                    name: "title".to_string(),
                    description: "The movie to base recommendations on".to_string(),
                    required: true,
                },
                PromptArgument {
                    name: "genre".to_string(),
                    description: "Optionally constrain recommendations to a genre".to_string(),
                    required: false,
                },
            ],
        },
        PromptDefinition {
            name: ACTOR_FILMOGRAPHY.to_string(),
            description: "Ask the assistant to summarize an actor's filmography".to_string(),
            arguments: vec![PromptArgument {
                name: "actor_name".to_string(),
                description: "The actor whose filmography should be summarized".to_string(),
                required: true,
            }],
        },
        PromptDefinition {
            name: CATALOG_SUMMARY.to_string(),
            description: "Ask the assistant to summarize catalog-wide statistics".to_string(),
            arguments: vec![],
        },
    ]
}

/// Render a prompt template by name, validating that every `required`
/// argument is present. Missing optional arguments simply omit the
/// corresponding phrase from the rendered text.
pub fn get(name: &str, arguments: &HashMap<String, String>) -> Result<PromptGetResult> {
    let definition = list()
        .into_iter()
        .find(|p| p.name == name)
        .ok_or_else(|| McpError::InvalidParams(format!("unknown prompt: {name}")))?;

    for arg in definition.arguments.iter().filter(|a| a.required) {
        if !arguments.contains_key(&arg.name) {
            return Err(McpError::InvalidParams(format!("missing required argument: {}", arg.name)));
        }
    }

    let text = match name {
        RECOMMEND_SIMILAR => {
            let title = &arguments["title"];
            match arguments.get("genre") {
                Some(genre) => format!(
                    "Find movies similar to \"{title}\" that are in the {genre} genre. \
                     Use the catalog's search_movies and get_movie tools to support your picks."
                ),
                None => format!(
                    "Find movies similar to \"{title}\". \
                     Use the catalog's search_movies and get_movie tools to support your picks."
                ),
            }
        }
        ACTOR_FILMOGRAPHY => {
            let actor_name = &arguments["actor_name"];
            format!(
                "Summarize {actor_name}'s filmography. \
                 Use search_actors to find their id, then get_actor_movies to list their movies."
            )
        }
        CATALOG_SUMMARY => "Summarize the movie catalog's statistics. \
             Use the db://statistics resource for counts of movies, actors, and cast links."
            .to_string(),
        _ => unreachable!("checked above"),
    };

    Ok(PromptGetResult {
        description: definition.description,
        messages: vec![PromptMessage {
            role: "user",
            content: PromptContent::Text { text },
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_exactly_three_templates() {
        assert_eq!(list().len(), 3);
    }

    #[test]
    fn missing_required_argument_is_rejected() {
        let err = get(RECOMMEND_SIMILAR, &HashMap::new()).unwrap_err();
        assert!(matches!(err, McpError::InvalidParams(_)));
    }

    #[test]
    fn optional_argument_omission_still_renders() {
        let mut args = HashMap::new();
        args.insert("title".to_string(), "Inception".to_string());
        let result = get(RECOMMEND_SIMILAR, &args).unwrap();
        let PromptContent::Text { text } = &result.messages[0].content;
        assert!(text.contains("Inception"));
        assert!(!text.contains("genre"));
    }

    #[test]
    fn no_arg_template_renders_without_arguments() {
        let result = get(CATALOG_SUMMARY, &HashMap::new()).unwrap();
        assert_eq!(result.messages.len(), 1);
    }

    #[test]
    fn unknown_prompt_name_is_rejected() {
        assert!(get("not_a_real_prompt", &HashMap::new()).is_err());
    }
}
