//! Resource provider (C9): `db://statistics`, `storage://posters`. Side
//! effect free; `resources/read` on any other URI is a validation error.
//!
//! The teacher has no resource concept at all (its capabilities never
//! advertise `resources`); this module is built fresh from general MCP
//! resource conventions and the teacher's `ToolDefinition`-style JSON
//! shaping (plain structs serialized with `serde_json::json!`).

use crate::error::{McpError, Result};
use crate::protocol::{ResourceContent, ResourceDefinition};
use crate::state::AppState;
use serde_json::json;

pub const STATISTICS_URI: &str = "db://statistics";
pub const POSTERS_URI: &str = "storage://posters";

pub fn list() -> Vec<ResourceDefinition> {
    vec![
        ResourceDefinition {
            uri: STATISTICS_URI.to_string(),
            name: "Catalog statistics".to_string(),
            description: "Movie count, actor count, and cast-link count".to_string(),
            mime_type: "application/json".to_string(),
        },
        ResourceDefinition {
            uri: POSTERS_URI.to_string(),
            name: "Poster storage summary".to_string(),
            description: "Count of movies with a poster URL, grouped by scheme".to_string(),
            mime_type: "application/json".to_string(),
        },
    ]
}

pub async fn read(uri: &str, state: &AppState) -> Result<ResourceContent> {
    match uri {
        STATISTICS_URI => {
            let movie_count = state.movies.count_all().await?;
            let actor_count = state.actors.count_all().await?;
            let link_count = state.links.count_all().await?;
            let body = json!({
                "movie_count": movie_count,
                "actor_count": actor_count,
                "link_count": link_count,
            });
            Ok(ResourceContent {
                uri: uri.to_string(),
                mime_type: "application/json".to_string(),
                text: serde_json::to_string(&body).map_err(|e| McpError::Internal(e.to_string()))?,
            })
        }
        POSTERS_URI => {
            let criteria = movies_domain::MovieSearchCriteria {
                limit: crate::context::MATERIALIZE_LIMIT as u32,
                ..Default::default()
            };
            let movies = state.movies.search_all(&criteria).await?;

            let mut https = 0u64;
            let mut http = 0u64;
            let mut missing = 0u64;
            for movie in &movies {
                match movie.poster_url() {
                    Some(url) if url.starts_with("https://") => https += 1,
                    Some(_) => http += 1,
                    None => missing += 1,
                }
            }

            let body = json!({
                "total_movies": movies.len(),
                "with_poster_https": https,
                "with_poster_http": http,
                "without_poster": missing,
            });
            Ok(ResourceContent {
                uri: uri.to_string(),
                mime_type: "application/json".to_string(),
                text: serde_json::to_string(&body).map_err(|e| McpError::Internal(e.to_string()))?,
            })
        }
        other => Err(McpError::InvalidParams(format!("unknown resource uri: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_advertises_exactly_the_documented_two_resources() {
        let resources = list();
        assert_eq!(resources.len(), 2);
        assert!(resources.iter().any(|r| r.uri == STATISTICS_URI));
        assert!(resources.iter().any(|r| r.uri == POSTERS_URI));
    }
}
