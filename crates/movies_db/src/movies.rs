//! Movie repository.

use crate::error::{DbError, Result};
use chrono::{DateTime, Utc};
use movies_domain::{search::OrderBy, search::OrderDir, Movie, MovieSearchCriteria};
use movies_ids::MovieId;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

#[derive(Clone)]
pub struct MovieRepository {
    pool: SqlitePool,
}

impl MovieRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new movie or update an existing one, keyed on whether the
    /// movie already carries a persisted id. On insert, the movie is
    /// assigned the id SQLite allocated.
    pub async fn save(&self, movie: &mut Movie) -> Result<()> {
        let genres = serde_json::to_string(movie.genres())?;

        if movie.id().is_persisted() {
            let result = sqlx::query(
                r#"
                UPDATE movies
                SET title = ?, director = ?, year = ?, rating = ?, genres = ?,
                    poster_url = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(movie.title())
            .bind(movie.director())
            .bind(movie.year())
            .bind(movie.rating())
            .bind(&genres)
            .bind(movie.poster_url())
            .bind(movie.updated_at().to_rfc3339())
            .bind(movie.id().0)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() == 0 {
                return Err(DbError::not_found(format!("movie {}", movie.id())));
            }
            Ok(())
        } else {
            let id = sqlx::query(
                r#"
                INSERT INTO movies (title, director, year, rating, genres, poster_url, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(movie.title())
            .bind(movie.director())
            .bind(movie.year())
            .bind(movie.rating())
            .bind(&genres)
            .bind(movie.poster_url())
            .bind(movie.created_at().to_rfc3339())
            .bind(movie.updated_at().to_rfc3339())
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

            movie.assign_id(MovieId::from(id));
            Ok(())
        }
    }

    pub async fn find_by_id(&self, id: MovieId) -> Result<Option<Movie>> {
        let row = sqlx::query("SELECT * FROM movies WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_movie(&r)).transpose()
    }

    pub async fn delete(&self, id: MovieId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM movies WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_all(&self) -> Result<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM movies").fetch_one(&self.pool).await?;
        Ok(row.0 as u64)
    }

    pub async fn search(&self, criteria: &MovieSearchCriteria) -> Result<Vec<Movie>> {
        let mut builder = base_query(criteria);
        builder.push(" ORDER BY ");
        builder.push(order_by_column(criteria.order_by));
        builder.push(if criteria.order_dir == OrderDir::Asc { " ASC" } else { " DESC" });
        builder.push(", id ASC LIMIT ");
        builder.push_bind(criteria.limit as i64);
        builder.push(" OFFSET ");
        builder.push_bind(criteria.offset as i64);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_movie).collect()
    }

    pub async fn count_matching(&self, criteria: &MovieSearchCriteria) -> Result<u64> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM movies WHERE 1=1");
        push_filters(&mut builder, criteria);
        let row: (i64,) = builder.build_query_as().fetch_one(&self.pool).await?;
        Ok(row.0 as u64)
    }
}

fn base_query(criteria: &MovieSearchCriteria) -> QueryBuilder<'_, Sqlite> {
    let mut builder = QueryBuilder::new("SELECT * FROM movies WHERE 1=1");
    push_filters(&mut builder, criteria);
    builder
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Sqlite>, criteria: &'a MovieSearchCriteria) {
    if let Some(title) = &criteria.title_contains {
        builder.push(" AND title LIKE ");
        builder.push_bind(format!("%{title}%"));
    }
    if let Some(director) = &criteria.director_contains {
        builder.push(" AND director LIKE ");
        builder.push_bind(format!("%{director}%"));
    }
    if let Some(genre) = &criteria.genre {
        builder.push(" AND genres LIKE ");
        builder.push_bind(format!("%\"{genre}\"%"));
    }
    if let Some(min_year) = criteria.min_year {
        builder.push(" AND year >= ");
        builder.push_bind(min_year);
    }
    if let Some(max_year) = criteria.max_year {
        builder.push(" AND year <= ");
        builder.push_bind(max_year);
    }
    if let Some(min_rating) = criteria.min_rating {
        builder.push(" AND rating >= ");
        builder.push_bind(min_rating);
    }
    if let Some(max_rating) = criteria.max_rating {
        builder.push(" AND rating <= ");
        builder.push_bind(max_rating);
    }
}

fn order_by_column(order_by: OrderBy) -> &'static str {
    match order_by {
        OrderBy::Title => "title",
        OrderBy::Director => "director",
        OrderBy::Year => "year",
        OrderBy::Rating => "rating",
        OrderBy::CreatedAt => "created_at",
        OrderBy::UpdatedAt => "updated_at",
        OrderBy::Name => "title",
    }
}

/// Legacy rows stored a bare JSON string (`"Action"`) instead of an array for
/// a single-genre movie; read those tolerantly as a one-element set. Never
/// written back in that form — `MovieRepository::save` always serializes an
/// array.
fn parse_genres(raw: &str) -> Result<Vec<String>> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Array(_)) => {
            serde_json::from_str(raw).map_err(|e| DbError::CorruptRow(format!("genres: {e}")))
        }
        Ok(serde_json::Value::String(s)) => Ok(vec![s]),
        _ => Err(DbError::CorruptRow(format!("genres: not a JSON array or string: {raw}"))),
    }
}

pub(crate) fn row_to_movie(row: &SqliteRow) -> Result<Movie> {
    let id: i64 = row.get("id");
    let genres_json: String = row.get("genres");
    let genres = parse_genres(&genres_json)?;
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Movie::reconstruct(
        MovieId::from(id),
        row.get("title"),
        row.get("director"),
        row.get("year"),
        row.get("rating"),
        genres,
        row.get("poster_url"),
        parse_timestamp(&created_at)?,
        parse_timestamp(&updated_at)?,
    )
    .map_err(|errors| DbError::CorruptRow(format!("movie {id}: {errors:?}")))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::CorruptRow(format!("timestamp: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{create_pool, DbConfig};
    use crate::schema::ensure_schema;
    use movies_domain::NewMovie;

    async fn repo() -> MovieRepository {
        let pool = create_pool(&DbConfig::sqlite_memory()).await.unwrap();
        ensure_schema(&pool).await.unwrap();
        MovieRepository::new(pool)
    }

    fn sample() -> NewMovie {
        NewMovie {
            title: "Inception".into(),
            director: "Christopher Nolan".into(),
            year: 2010,
            rating: Some(8.8),
            genres: vec!["Sci-Fi".into()],
            poster_url: None,
        }
    }

    #[tokio::test]
    async fn save_assigns_id_then_round_trips() {
        let repo = repo().await;
        let mut movie = Movie::create(sample(), Utc::now()).unwrap();
        assert!(!movie.id().is_persisted());

        repo.save(&mut movie).await.unwrap();
        assert!(movie.id().is_persisted());

        let loaded = repo.find_by_id(movie.id()).await.unwrap().unwrap();
        assert_eq!(loaded.title(), "Inception");
        assert_eq!(loaded.genres(), &["Sci-Fi".to_string()]);
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let repo = repo().await;
        let mut movie = Movie::create(sample(), Utc::now()).unwrap();
        repo.save(&mut movie).await.unwrap();

        assert!(repo.delete(movie.id()).await.unwrap());
        assert!(repo.find_by_id(movie.id()).await.unwrap().is_none());
        assert!(!repo.delete(movie.id()).await.unwrap());
    }

    #[tokio::test]
    async fn legacy_bare_string_genre_reads_as_one_element_set() {
        let repo = repo().await;
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO movies (title, director, year, genres, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind("Old Row")
        .bind("Someone")
        .bind(1999)
        .bind("\"Drama\"")
        .bind(&now)
        .bind(&now)
        .execute(&repo.pool)
        .await
        .unwrap();

        let loaded = repo.find_by_id(MovieId::from(1)).await.unwrap().unwrap();
        assert_eq!(loaded.genres(), &["Drama".to_string()]);
    }

    #[tokio::test]
    async fn search_filters_by_decade() {
        let repo = repo().await;
        for (title, year) in [("A", 1995), ("B", 2001), ("C", 2005)] {
            let mut m = Movie::create(
                NewMovie {
                    title: title.into(),
                    director: "X".into(),
                    year,
                    rating: None,
                    genres: vec![],
                    poster_url: None,
                },
                Utc::now(),
            )
            .unwrap();
            repo.save(&mut m).await.unwrap();
        }

        let criteria = MovieSearchCriteria {
            min_year: Some(2000),
            max_year: Some(2009),
            ..Default::default()
        };
        let results = repo.search(&criteria).await.unwrap();
        assert_eq!(results.len(), 2);
    }
}
