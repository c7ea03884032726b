//! Actor repository.
//!
//! `save` is the non-trivial operation: it diffs the actor's in-memory
//! `movie_ids` set against the currently persisted `movie_actors` rows and
//! issues the minimal `INSERT`/`DELETE` set to reconcile them, inside the
//! same transaction as the scalar column `UPDATE`/`INSERT`. A failure at any
//! point rolls back the whole save, so a caller never observes a
//! half-applied link set.

use crate::error::{DbError, Result};
use chrono::{DateTime, Utc};
use movies_domain::search::{OrderBy, OrderDir};
use movies_domain::{Actor, ActorSearchCriteria};
use movies_ids::ActorId;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool, Transaction};
use std::collections::BTreeSet;

#[derive(Clone)]
pub struct ActorRepository {
    pool: SqlitePool,
}

impl ActorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn save(&self, actor: &mut Actor) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        if actor.id().is_persisted() {
            let result = sqlx::query(
                r#"
                UPDATE actors
                SET name = ?, birth_year = ?, bio = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(actor.name())
            .bind(actor.birth_year())
            .bind(actor.bio())
            .bind(actor.updated_at().to_rfc3339())
            .bind(actor.id().0)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(DbError::not_found(format!("actor {}", actor.id())));
            }
        } else {
            let id = sqlx::query(
                r#"
                INSERT INTO actors (name, birth_year, bio, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(actor.name())
            .bind(actor.birth_year())
            .bind(actor.bio())
            .bind(actor.created_at().to_rfc3339())
            .bind(actor.updated_at().to_rfc3339())
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

            actor.assign_id(ActorId::from(id));
        }

        reconcile_links(&mut tx, actor).await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: ActorId) -> Result<Option<Actor>> {
        let row = sqlx::query("SELECT * FROM actors WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let movie_ids = persisted_movie_ids(&self.pool, id).await?;
        row_to_actor(&row, movie_ids).map(Some)
    }

    pub async fn delete(&self, id: ActorId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM actors WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_all(&self) -> Result<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM actors").fetch_one(&self.pool).await?;
        Ok(row.0 as u64)
    }

    pub async fn search(&self, criteria: &ActorSearchCriteria) -> Result<Vec<Actor>> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM actors WHERE 1=1");
        push_filters(&mut builder, criteria);
        builder.push(" ORDER BY ");
        builder.push(order_by_column(criteria.order_by));
        builder.push(if criteria.order_dir == OrderDir::Asc { " ASC" } else { " DESC" });
        builder.push(", id ASC LIMIT ");
        builder.push_bind(criteria.limit as i64);
        builder.push(" OFFSET ");
        builder.push_bind(criteria.offset as i64);

        let rows = builder.build().fetch_all(&self.pool).await?;
        let mut actors = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: i64 = row.get("id");
            let movie_ids = persisted_movie_ids(&self.pool, ActorId::from(id)).await?;
            actors.push(row_to_actor(row, movie_ids)?);
        }
        Ok(actors)
    }

    pub async fn count_matching(&self, criteria: &ActorSearchCriteria) -> Result<u64> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM actors WHERE 1=1");
        push_filters(&mut builder, criteria);
        let row: (i64,) = builder.build_query_as().fetch_one(&self.pool).await?;
        Ok(row.0 as u64)
    }
}

/// Apply the three-way diff between `actor.movie_ids()` and the currently
/// persisted link rows for that actor: `INSERT` the additions, `DELETE` the
/// removals, touch nothing else. Runs inside the caller's transaction.
async fn reconcile_links(tx: &mut Transaction<'_, Sqlite>, actor: &Actor) -> Result<()> {
    let current: Vec<(i64,)> = sqlx::query_as("SELECT movie_id FROM movie_actors WHERE actor_id = ?")
        .bind(actor.id().0)
        .fetch_all(&mut **tx)
        .await?;
    let current: BTreeSet<i64> = current.into_iter().map(|(id,)| id).collect();
    let desired = actor.movie_ids();

    for movie_id in desired.difference(&current) {
        let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM movies WHERE id = ?")
            .bind(movie_id)
            .fetch_optional(&mut **tx)
            .await?;
        if exists.is_none() {
            return Err(DbError::not_found(format!("movie {movie_id}")));
        }
        sqlx::query("INSERT OR IGNORE INTO movie_actors (movie_id, actor_id, created_at) VALUES (?, ?, ?)")
            .bind(movie_id)
            .bind(actor.id().0)
            .bind(actor.updated_at().to_rfc3339())
            .execute(&mut **tx)
            .await?;
    }

    for movie_id in current.difference(desired) {
        sqlx::query("DELETE FROM movie_actors WHERE movie_id = ? AND actor_id = ?")
            .bind(movie_id)
            .bind(actor.id().0)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

pub(crate) async fn persisted_movie_ids(pool: &SqlitePool, actor_id: ActorId) -> Result<BTreeSet<i64>> {
    let rows: Vec<(i64,)> = sqlx::query_as("SELECT movie_id FROM movie_actors WHERE actor_id = ?")
        .bind(actor_id.0)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Sqlite>, criteria: &'a ActorSearchCriteria) {
    if let Some(name) = &criteria.name_contains {
        builder.push(" AND name LIKE ");
        builder.push_bind(format!("%{name}%"));
    }
}

fn order_by_column(order_by: OrderBy) -> &'static str {
    match order_by {
        OrderBy::Name => "name",
        OrderBy::CreatedAt => "created_at",
        OrderBy::UpdatedAt => "updated_at",
        _ => "name",
    }
}

pub(crate) fn row_to_actor(row: &SqliteRow, movie_ids: BTreeSet<i64>) -> Result<Actor> {
    let id: i64 = row.get("id");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Actor::reconstruct(
        ActorId::from(id),
        row.get("name"),
        row.get("birth_year"),
        row.get("bio"),
        movie_ids,
        parse_timestamp(&created_at)?,
        parse_timestamp(&updated_at)?,
    )
    .map_err(|errors| DbError::CorruptRow(format!("actor {id}: {errors:?}")))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::CorruptRow(format!("timestamp: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movies::MovieRepository;
    use crate::pool::{create_pool, DbConfig};
    use crate::schema::ensure_schema;
    use movies_domain::{Movie, NewActor, NewMovie};

    async fn repo() -> (SqlitePool, ActorRepository) {
        let pool = create_pool(&DbConfig::sqlite_memory()).await.unwrap();
        ensure_schema(&pool).await.unwrap();
        (pool.clone(), ActorRepository::new(pool))
    }

    #[tokio::test]
    async fn save_assigns_id_then_round_trips() {
        let (_pool, repo) = repo().await;
        let mut actor = Actor::create(
            NewActor {
                name: "Leonardo DiCaprio".into(),
                birth_year: Some(1974),
                bio: None,
            },
            Utc::now(),
        )
        .unwrap();

        repo.save(&mut actor).await.unwrap();
        assert!(actor.id().is_persisted());

        let loaded = repo.find_by_id(actor.id()).await.unwrap().unwrap();
        assert_eq!(loaded.name(), "Leonardo DiCaprio");
        assert_eq!(loaded.birth_year(), Some(1974));
        assert!(loaded.movie_ids().is_empty());
    }

    #[tokio::test]
    async fn save_reconciles_link_additions_and_removals_atomically() {
        let (pool, repo) = repo().await;
        let movies = MovieRepository::new(pool.clone());

        let mut m1 = Movie::create(
            NewMovie {
                title: "Inception".into(),
                director: "Christopher Nolan".into(),
                year: 2010,
                rating: None,
                genres: vec![],
                poster_url: None,
            },
            Utc::now(),
        )
        .unwrap();
        movies.save(&mut m1).await.unwrap();
        let mut m2 = Movie::create(
            NewMovie {
                title: "Titanic".into(),
                director: "James Cameron".into(),
                year: 1997,
                rating: None,
                genres: vec![],
                poster_url: None,
            },
            Utc::now(),
        )
        .unwrap();
        movies.save(&mut m2).await.unwrap();

        let mut actor = Actor::create(
            NewActor {
                name: "Leonardo DiCaprio".into(),
                birth_year: None,
                bio: None,
            },
            Utc::now(),
        )
        .unwrap();
        let now = Utc::now();
        actor.add_movie(m1.id(), now);
        repo.save(&mut actor).await.unwrap();

        let mut loaded = repo.find_by_id(actor.id()).await.unwrap().unwrap();
        assert_eq!(loaded.movie_ids().len(), 1);

        loaded.add_movie(m2.id(), now);
        loaded.remove_movie(m1.id(), now);
        repo.save(&mut loaded).await.unwrap();

        let reloaded = repo.find_by_id(actor.id()).await.unwrap().unwrap();
        assert_eq!(reloaded.movie_ids(), &[m2.id().0].into_iter().collect());
    }

    #[tokio::test]
    async fn save_rejects_link_to_nonexistent_movie() {
        let (_pool, repo) = repo().await;
        let mut actor = Actor::create(
            NewActor {
                name: "Anon".into(),
                birth_year: None,
                bio: None,
            },
            Utc::now(),
        )
        .unwrap();
        actor.add_movie(movies_ids::MovieId::from(999), Utc::now());

        let err = repo.save(&mut actor).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
        // The scalar insert must have rolled back too: actor was never persisted.
        assert!(!actor.id().is_persisted() || repo.find_by_id(actor.id()).await.unwrap().is_none());
    }
}
