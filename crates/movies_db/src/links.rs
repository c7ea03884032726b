//! Read-side queries over the movie/actor link table.
//!
//! The link table itself is never written here: `link_actor_to_movie` and
//! `unlink_actor_from_movie` go through [`crate::actors::ActorRepository::save`],
//! which reconciles the actor's `movie_ids` set against `movie_actors`
//! atomically with the scalar update (see `actors.rs`). This module only
//! answers the cross-aggregate read queries (`findByRelated` in the
//! repository contract).

use crate::actors::row_to_actor;
use crate::error::Result;
use crate::movies::row_to_movie;
use movies_domain::{Actor, Movie};
use movies_ids::{ActorId, MovieId};
use sqlx::SqlitePool;
use std::collections::BTreeSet;

#[derive(Clone)]
pub struct LinkRepository {
    pool: SqlitePool,
}

impl LinkRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn count_all(&self) -> Result<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM movie_actors").fetch_one(&self.pool).await?;
        Ok(row.0 as u64)
    }

    /// The cast of a movie: every actor linked to it plus the role they were
    /// credited under (if any), ordered by name then id.
    pub async fn movie_cast(&self, movie_id: MovieId) -> Result<Vec<(Actor, Option<String>)>> {
        let rows = sqlx::query(
            r#"
            SELECT actors.*, movie_actors.role AS link_role FROM actors
            INNER JOIN movie_actors ON movie_actors.actor_id = actors.id
            WHERE movie_actors.movie_id = ?
            ORDER BY actors.name ASC, actors.id ASC
            "#,
        )
        .bind(movie_id.0)
        .fetch_all(&self.pool)
        .await?;

        let mut cast = Vec::with_capacity(rows.len());
        for row in &rows {
            let actor_id: i64 = sqlx::Row::get(row, "id");
            let role: Option<String> = sqlx::Row::get(row, "link_role");
            let movie_ids = crate::actors::persisted_movie_ids(&self.pool, ActorId::from(actor_id)).await?;
            cast.push((row_to_actor(row, movie_ids)?, role));
        }
        Ok(cast)
    }

    /// Set (or clear) the credited role for an already-linked pair. A no-op
    /// if the pair isn't linked (the row simply matches zero rows).
    pub async fn set_role(&self, movie_id: MovieId, actor_id: ActorId, role: Option<&str>) -> Result<()> {
        sqlx::query("UPDATE movie_actors SET role = ? WHERE movie_id = ? AND actor_id = ?")
            .bind(role)
            .bind(movie_id.0)
            .bind(actor_id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// The filmography of an actor: every movie linked to it, ordered by
    /// year then id.
    pub async fn actor_filmography(&self, actor_id: ActorId) -> Result<Vec<Movie>> {
        let rows = sqlx::query(
            r#"
            SELECT movies.* FROM movies
            INNER JOIN movie_actors ON movie_actors.movie_id = movies.id
            WHERE movie_actors.actor_id = ?
            ORDER BY movies.year ASC, movies.id ASC
            "#,
        )
        .bind(actor_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_movie).collect()
    }

    /// All movie ids an actor is currently linked to (set membership, not
    /// ordered).
    pub async fn movie_ids_for_actor(&self, actor_id: ActorId) -> Result<BTreeSet<i64>> {
        crate::actors::persisted_movie_ids(&self.pool, actor_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::ActorRepository;
    use crate::movies::MovieRepository;
    use crate::pool::{create_pool, DbConfig};
    use crate::schema::ensure_schema;
    use chrono::Utc;
    use movies_domain::{Movie, NewActor, NewMovie};

    #[tokio::test]
    async fn cast_and_filmography_round_trip_through_actor_save() {
        let pool = create_pool(&DbConfig::sqlite_memory()).await.unwrap();
        ensure_schema(&pool).await.unwrap();

        let movies = MovieRepository::new(pool.clone());
        let actors = ActorRepository::new(pool.clone());
        let links = LinkRepository::new(pool.clone());

        let mut movie = Movie::create(
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
        movies.save(&mut movie).await.unwrap();

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
        actor.add_movie(movie.id(), now);
        actors.save(&mut actor).await.unwrap();

        let cast = links.movie_cast(movie.id()).await.unwrap();
        assert_eq!(cast.len(), 1);
        assert_eq!(cast[0].0.name(), "Leonardo DiCaprio");
        assert_eq!(cast[0].1, None);

        links.set_role(movie.id(), actor.id(), Some("Cobb")).await.unwrap();
        let cast = links.movie_cast(movie.id()).await.unwrap();
        assert_eq!(cast[0].1.as_deref(), Some("Cobb"));

        let filmography = links.actor_filmography(actor.id()).await.unwrap();
        assert_eq!(filmography.len(), 1);
        assert_eq!(filmography[0].title(), "Inception");

        assert_eq!(links.count_all().await.unwrap(), 1);
    }
}
