//! Movie CRUD and query tools, grounded on the teacher's one-struct-per-tool
//! pattern (`casparian_mcp::tools::scan::ScanTool`).

use super::{context_error, paging_args, McpTool};
use crate::error::{McpError, Result};
use crate::state::AppState;
use async_trait::async_trait;
use chrono::Utc;
use movies_domain::{search::OrderBy, search::OrderDir, Movie, MovieSearchCriteria, NewMovie};
use movies_ids::MovieId;
use serde_json::{json, Value};

fn movie_json(movie: &Movie) -> Value {
    json!({
        "id": movie.id().0,
        "title": movie.title(),
        "director": movie.director(),
        "year": movie.year(),
        "rating": movie.rating(),
        "genres": movie.genres(),
        "poster_url": movie.poster_url(),
        "created_at": movie.created_at().to_rfc3339(),
        "updated_at": movie.updated_at().to_rfc3339(),
    })
}

fn required_id(args: &Value, field: &str) -> Result<MovieId> {
    args.get(field)
        .and_then(Value::as_i64)
        .map(MovieId::from)
        .ok_or_else(|| McpError::InvalidParams(format!("{field} is required")))
}

fn order_by_from_str(s: Option<&str>, default: OrderBy) -> OrderBy {
    match s {
        Some("title") => OrderBy::Title,
        Some("director") => OrderBy::Director,
        Some("year") => OrderBy::Year,
        Some("rating") => OrderBy::Rating,
        Some("created_at") => OrderBy::CreatedAt,
        Some("updated_at") => OrderBy::UpdatedAt,
        _ => default,
    }
}

fn order_dir_from_str(s: Option<&str>) -> OrderDir {
    match s {
        Some("desc") => OrderDir::Desc,
        _ => OrderDir::Asc,
    }
}

/// Run `criteria` against the full (safety-limited) result set, materialize
/// it as a new context-manager page cache, and shape the first (or a reused)
/// page per the paging controls in `args`.
async fn search_and_page(
    state: &AppState,
    args: &Value,
    mut criteria: MovieSearchCriteria,
) -> Result<Value> {
    let paging = paging_args(args);

    if let Some(context_id) = &paging.context_id {
        let id = movies_ids::ContextId::from_wire(context_id);
        let page = state
            .context
            .get_page(&id, paging.page, paging.page_size)
            .await
            .map_err(context_error)?;
        return Ok(json!({
            "movies": page.items,
            "total": page.total,
            "context_id": page.context_id,
            "page": page.page,
            "page_size": page.page_size,
            "total_pages": page.total_pages,
        }));
    }

    criteria.limit = crate::context::MATERIALIZE_LIMIT as u32;
    criteria.offset = 0;
    let movies = state.movies.search_all(&criteria).await?;
    let data: Vec<Value> = movies.iter().map(movie_json).collect();
    let ctx = state.context.create("search_movies", data, paging.page_size).await;
    let page = state
        .context
        .get_page(&ctx.id, paging.page, paging.page_size)
        .await
        .map_err(context_error)?;

    Ok(json!({
        "movies": page.items,
        "total": page.total,
        "context_id": page.context_id,
        "page": page.page,
        "page_size": page.page_size,
        "total_pages": page.total_pages,
    }))
}

pub struct AddMovieTool;

#[async_trait]
impl McpTool for AddMovieTool {
    fn name(&self) -> &'static str {
        "add_movie"
    }

    fn description(&self) -> &'static str {
        "Add a new movie to the catalog"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": {"type": "string", "minLength": 1, "maxLength": 255},
                "director": {"type": "string", "minLength": 1, "maxLength": 255},
                "year": {"type": "integer", "minimum": 1888},
                "rating": {"type": "number", "minimum": 0.0, "maximum": 10.0},
                "genres": {"type": "array", "items": {"type": "string"}, "maxItems": 16},
                "poster_url": {"type": "string", "format": "uri"},
            },
            "required": ["title", "director", "year"],
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> Result<Value> {
        let fields = NewMovie {
            title: args
                .get("title")
                .and_then(Value::as_str)
                .ok_or_else(|| McpError::InvalidParams("title is required".to_string()))?
                .to_string(),
            director: args
                .get("director")
                .and_then(Value::as_str)
                .ok_or_else(|| McpError::InvalidParams("director is required".to_string()))?
                .to_string(),
            year: args
                .get("year")
                .and_then(Value::as_i64)
                .ok_or_else(|| McpError::InvalidParams("year is required".to_string()))? as i32,
            rating: args.get("rating").and_then(Value::as_f64),
            genres: args
                .get("genres")
                .and_then(Value::as_array)
                .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                .unwrap_or_default(),
            poster_url: args.get("poster_url").and_then(Value::as_str).map(str::to_string),
        };

        let movie = state.movies.create(fields, Utc::now()).await?;
        Ok(movie_json(&movie))
    }
}

pub struct GetMovieTool;

#[async_trait]
impl McpTool for GetMovieTool {
    fn name(&self) -> &'static str {
        "get_movie"
    }

    fn description(&self) -> &'static str {
        "Retrieve a movie by id"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"movie_id": {"type": "integer", "minimum": 1}},
            "required": ["movie_id"],
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> Result<Value> {
        let id = required_id(&args, "movie_id")?;
        let movie = state.movies.get(id).await?;
        Ok(movie_json(&movie))
    }
}

pub struct UpdateMovieTool;

#[async_trait]
impl McpTool for UpdateMovieTool {
    fn name(&self) -> &'static str {
        "update_movie"
    }

    fn description(&self) -> &'static str {
        "Update a movie's fields; omitted fields are left unchanged"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "movie_id": {"type": "integer", "minimum": 1},
                "title": {"type": "string", "minLength": 1, "maxLength": 255},
                "director": {"type": "string", "minLength": 1, "maxLength": 255},
                "year": {"type": "integer", "minimum": 1888},
                "rating": {"type": "number", "minimum": 0.0, "maximum": 10.0},
                "poster_url": {"type": "string", "format": "uri"},
                "genres": {"type": "array", "items": {"type": "string"}, "maxItems": 16},
            },
            "required": ["movie_id"],
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> Result<Value> {
        use crate::services::UpdateMovieCommand;

        let id = required_id(&args, "movie_id")?;
        let cmd = UpdateMovieCommand {
            id,
            title: args.get("title").and_then(Value::as_str).map(str::to_string),
            director: args.get("director").and_then(Value::as_str).map(str::to_string),
            year: args.get("year").and_then(Value::as_i64).map(|y| y as i32),
            rating: args.get("rating").map(|v| v.as_f64()),
            poster_url: args
                .get("poster_url")
                .map(|v| v.as_str().map(str::to_string)),
            genres: args
                .get("genres")
                .and_then(Value::as_array)
                .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect()),
        };

        let movie = state.movies.update(cmd, Utc::now()).await?;
        Ok(movie_json(&movie))
    }
}

pub struct DeleteMovieTool;

#[async_trait]
impl McpTool for DeleteMovieTool {
    fn name(&self) -> &'static str {
        "delete_movie"
    }

    fn description(&self) -> &'static str {
        "Delete a movie from the catalog"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"movie_id": {"type": "integer", "minimum": 1}},
            "required": ["movie_id"],
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> Result<Value> {
        let id = required_id(&args, "movie_id")?;
        state.movies.delete(id).await?;
        Ok(json!({"deleted": true, "id": id.0}))
    }
}

pub struct SearchMoviesTool;

#[async_trait]
impl McpTool for SearchMoviesTool {
    fn name(&self) -> &'static str {
        "search_movies"
    }

    fn description(&self) -> &'static str {
        "Search movies by title, director, genre, year range, or rating range"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title_contains": {"type": "string"},
                "director_contains": {"type": "string"},
                "genre": {"type": "string"},
                "min_year": {"type": "integer"},
                "max_year": {"type": "integer"},
                "min_rating": {"type": "number"},
                "max_rating": {"type": "number"},
                "order_by": {"type": "string", "enum": ["title", "director", "year", "rating", "created_at", "updated_at"]},
                "order_dir": {"type": "string", "enum": ["asc", "desc"]},
                "page": {"type": "integer", "minimum": 1},
                "page_size": {"type": "integer", "minimum": 1, "maximum": 1000},
                "context_id": {"type": "string"},
            },
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> Result<Value> {
        let criteria = MovieSearchCriteria {
            title_contains: args.get("title_contains").and_then(Value::as_str).map(str::to_string),
            director_contains: args.get("director_contains").and_then(Value::as_str).map(str::to_string),
            genre: args.get("genre").and_then(Value::as_str).map(str::to_string),
            min_year: args.get("min_year").and_then(Value::as_i64).map(|y| y as i32),
            max_year: args.get("max_year").and_then(Value::as_i64).map(|y| y as i32),
            min_rating: args.get("min_rating").and_then(Value::as_f64),
            max_rating: args.get("max_rating").and_then(Value::as_f64),
            order_by: order_by_from_str(args.get("order_by").and_then(Value::as_str), OrderBy::Title),
            order_dir: order_dir_from_str(args.get("order_dir").and_then(Value::as_str)),
            ..Default::default()
        };

        search_and_page(state, &args, criteria).await
    }
}

pub struct ListTopMoviesTool;

#[async_trait]
impl McpTool for ListTopMoviesTool {
    fn name(&self) -> &'static str {
        "list_top_movies"
    }

    fn description(&self) -> &'static str {
        "List movies ordered by rating, highest first"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "genre": {"type": "string"},
                "page": {"type": "integer", "minimum": 1},
                "page_size": {"type": "integer", "minimum": 1, "maximum": 1000},
                "context_id": {"type": "string"},
            },
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> Result<Value> {
        let criteria = MovieSearchCriteria {
            genre: args.get("genre").and_then(Value::as_str).map(str::to_string),
            order_by: OrderBy::Rating,
            order_dir: OrderDir::Desc,
            ..Default::default()
        };

        search_and_page(state, &args, criteria).await
    }
}

/// Normalize a decade selector (`"1990s"`, `"90s"`, `"1990"`) to an inclusive
/// `[start, start + 9]` year range, per spec §4.8: two-digit `NN <= 30` maps
/// to `2000 + NN`, otherwise `1900 + NN`.
pub(crate) fn normalize_decade(raw: &str) -> Result<(i32, i32)> {
    let trimmed = raw.trim().trim_end_matches('s');
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || digits != trimmed {
        return Err(McpError::InvalidParams(format!("not a recognizable decade: {raw}")));
    }

    let start = match digits.len() {
        4 => digits.parse::<i32>().map_err(|_| McpError::InvalidParams(format!("not a recognizable decade: {raw}")))?,
        1 | 2 => {
            let nn: i32 = digits
                .parse()
                .map_err(|_| McpError::InvalidParams(format!("not a recognizable decade: {raw}")))?;
            if nn <= 30 {
                2000 + nn
            } else {
                1900 + nn
            }
        }
        _ => return Err(McpError::InvalidParams(format!("not a recognizable decade: {raw}"))),
    };

    let decade_start = start - (start.rem_euclid(10));
    Ok((decade_start, decade_start + 9))
}

pub struct SearchByDecadeTool;

#[async_trait]
impl McpTool for SearchByDecadeTool {
    fn name(&self) -> &'static str {
        "search_by_decade"
    }

    fn description(&self) -> &'static str {
        "Search movies released within a decade, e.g. \"1990s\", \"90s\", or \"1990\""
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "decade": {"type": "string"},
                "page": {"type": "integer", "minimum": 1},
                "page_size": {"type": "integer", "minimum": 1, "maximum": 1000},
                "context_id": {"type": "string"},
            },
            "required": ["decade"],
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> Result<Value> {
        let decade = args
            .get("decade")
            .and_then(Value::as_str)
            .ok_or_else(|| McpError::InvalidParams("decade is required".to_string()))?;
        let (min_year, max_year) = normalize_decade(decade)?;

        let criteria = MovieSearchCriteria {
            min_year: Some(min_year),
            max_year: Some(max_year),
            order_by: OrderBy::Year,
            ..Default::default()
        };

        search_and_page(state, &args, criteria).await
    }
}

pub struct SearchByRatingRangeTool;

#[async_trait]
impl McpTool for SearchByRatingRangeTool {
    fn name(&self) -> &'static str {
        "search_by_rating_range"
    }

    fn description(&self) -> &'static str {
        "Search movies whose rating falls within an inclusive range"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "min_rating": {"type": "number", "minimum": 0.0, "maximum": 10.0},
                "max_rating": {"type": "number", "minimum": 0.0, "maximum": 10.0},
                "page": {"type": "integer", "minimum": 1},
                "page_size": {"type": "integer", "minimum": 1, "maximum": 1000},
                "context_id": {"type": "string"},
            },
            "required": ["min_rating", "max_rating"],
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> Result<Value> {
        let min_rating = args
            .get("min_rating")
            .and_then(Value::as_f64)
            .ok_or_else(|| McpError::InvalidParams("min_rating is required".to_string()))?;
        let max_rating = args
            .get("max_rating")
            .and_then(Value::as_f64)
            .ok_or_else(|| McpError::InvalidParams("max_rating is required".to_string()))?;

        let criteria = MovieSearchCriteria {
            min_rating: Some(min_rating),
            max_rating: Some(max_rating),
            order_by: OrderBy::Rating,
            order_dir: OrderDir::Desc,
            ..Default::default()
        };

        search_and_page(state, &args, criteria).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decade_normalizes_the_documented_forms() {
        assert_eq!(normalize_decade("1990s").unwrap(), (1990, 1999));
        assert_eq!(normalize_decade("90s").unwrap(), (1990, 1999));
        assert_eq!(normalize_decade("1990").unwrap(), (1990, 1999));
    }

    #[test]
    fn two_digit_decade_splits_at_thirty() {
        assert_eq!(normalize_decade("05s").unwrap(), (2000, 2009));
        assert_eq!(normalize_decade("30s").unwrap(), (2030, 2039));
        assert_eq!(normalize_decade("31s").unwrap(), (1930, 1939));
        assert_eq!(normalize_decade("99s").unwrap(), (1990, 1999));
    }

    #[test]
    fn garbage_decade_is_rejected() {
        assert!(normalize_decade("the nineties").is_err());
    }
}
