//! Application services (C7): one per aggregate, plus a shared link
//! service. Each accepts a command (write) or query (read) as a plain
//! record, drives the domain, and calls the repository. No additional
//! validation happens here — argument-shape validation already ran at C4
//! (the tool schema validator); these only translate commands into domain
//! operations and surface `NotFound`/`Conflict` for cross-aggregate checks.

use crate::error::{McpError, Result};
use chrono::{DateTime, Utc};
use movies_db::{ActorRepository, LinkRepository, MovieRepository};
use movies_domain::{
    Actor, ActorSearchCriteria, Movie, MovieSearchCriteria, NewActor, NewMovie,
};
use movies_ids::{ActorId, MovieId};

pub struct UpdateMovieCommand {
    pub id: MovieId,
    pub title: Option<String>,
    pub director: Option<String>,
    pub year: Option<i32>,
    /// `Some(None)` clears the rating; `Some(Some(x))` sets it; `None`
    /// leaves it untouched.
    pub rating: Option<Option<f64>>,
    pub poster_url: Option<Option<String>>,
    pub genres: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct MovieService {
    repo: MovieRepository,
}

impl MovieService {
    pub fn new(repo: MovieRepository) -> Self {
        Self { repo }
    }

    pub async fn create(&self, fields: NewMovie, now: DateTime<Utc>) -> Result<Movie> {
        let mut movie = Movie::create(fields, now)?;
        self.repo.save(&mut movie).await?;
        Ok(movie)
    }

    pub async fn get(&self, id: MovieId) -> Result<Movie> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| McpError::NotFound("Movie".to_string()))
    }

    /// A title/director/year change is modeled as a whole-aggregate
    /// replacement under the existing id (`Movie::reconstruct`), matching
    /// the domain contract that those fields are immutable post-construction.
    pub async fn update(&self, cmd: UpdateMovieCommand, now: DateTime<Utc>) -> Result<Movie> {
        let mut movie = self.get(cmd.id).await?;

        if cmd.title.is_some() || cmd.director.is_some() || cmd.year.is_some() {
            let title = cmd.title.unwrap_or_else(|| movie.title().to_string());
            let director = cmd.director.unwrap_or_else(|| movie.director().to_string());
            let year = cmd.year.unwrap_or_else(|| movie.year());
            movie = Movie::reconstruct(
                movie.id(),
                title,
                director,
                year,
                movie.rating(),
                movie.genres().to_vec(),
                movie.poster_url().map(str::to_string),
                movie.created_at(),
                now,
            )?;
        }

        if let Some(rating) = cmd.rating {
            movie.set_rating(rating, now)?;
        }
        if let Some(poster_url) = cmd.poster_url {
            movie.set_poster_url(poster_url, now)?;
        }
        if let Some(genres) = cmd.genres {
            movie.set_genres(genres, now)?;
        }

        self.repo.save(&mut movie).await?;
        Ok(movie)
    }

    pub async fn delete(&self, id: MovieId) -> Result<()> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(McpError::NotFound("Movie".to_string()))
        }
    }

    /// Runs the search and the matching count as one logical query; returns
    /// `(page, total)` where `total` is the unpaginated match count.
    pub async fn search(&self, criteria: &MovieSearchCriteria) -> Result<(Vec<Movie>, u64)> {
        let page = self.repo.search(criteria).await?;
        let total = self.repo.count_matching(criteria).await?;
        Ok((page, total))
    }

    /// The full (unpaginated, safety-limited) result set for a criteria, for
    /// handing to the context manager to materialize a page cache.
    pub async fn search_all(&self, criteria: &MovieSearchCriteria) -> Result<Vec<Movie>> {
        self.repo.search(criteria).await.map_err(McpError::from)
    }

    pub async fn count_all(&self) -> Result<u64> {
        self.repo.count_all().await.map_err(McpError::from)
    }
}

pub struct UpdateActorCommand {
    pub id: ActorId,
    pub name: Option<String>,
    pub birth_year: Option<Option<i32>>,
    pub bio: Option<Option<String>>,
}

#[derive(Clone)]
pub struct ActorService {
    repo: ActorRepository,
}

impl ActorService {
    pub fn new(repo: ActorRepository) -> Self {
        Self { repo }
    }

    pub async fn create(&self, fields: NewActor, now: DateTime<Utc>) -> Result<Actor> {
        let mut actor = Actor::create(fields, now)?;
        self.repo.save(&mut actor).await?;
        Ok(actor)
    }

    pub async fn get(&self, id: ActorId) -> Result<Actor> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| McpError::NotFound("Actor".to_string()))
    }

    pub async fn update(&self, cmd: UpdateActorCommand, now: DateTime<Utc>) -> Result<Actor> {
        let mut actor = self.get(cmd.id).await?;

        if cmd.name.is_some() || cmd.birth_year.is_some() {
            let name = cmd.name.unwrap_or_else(|| actor.name().to_string());
            let birth_year = match cmd.birth_year {
                Some(by) => by,
                None => actor.birth_year(),
            };
            actor = Actor::reconstruct(
                actor.id(),
                name,
                birth_year,
                actor.bio().map(str::to_string),
                actor.movie_ids().clone(),
                actor.created_at(),
                now,
            )?;
        }

        if let Some(bio) = cmd.bio {
            actor.set_bio(bio, now)?;
        }

        self.repo.save(&mut actor).await?;
        Ok(actor)
    }

    pub async fn delete(&self, id: ActorId) -> Result<()> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(McpError::NotFound("Actor".to_string()))
        }
    }

    pub async fn search(&self, criteria: &ActorSearchCriteria) -> Result<(Vec<Actor>, u64)> {
        let page = self.repo.search(criteria).await?;
        let total = self.repo.count_matching(criteria).await?;
        Ok((page, total))
    }

    pub async fn search_all(&self, criteria: &ActorSearchCriteria) -> Result<Vec<Actor>> {
        self.repo.search(criteria).await.map_err(McpError::from)
    }

    pub async fn count_all(&self) -> Result<u64> {
        self.repo.count_all().await.map_err(McpError::from)
    }
}

#[derive(Clone)]
pub struct LinkService {
    actors: ActorRepository,
    movies: MovieRepository,
    links: LinkRepository,
}

impl LinkService {
    pub fn new(actors: ActorRepository, movies: MovieRepository, links: LinkRepository) -> Self {
        Self { actors, movies, links }
    }

    /// Link an actor to a movie, optionally crediting a role. Conflicts
    /// (wire message contains "already" and "exists") if the pair is already
    /// linked.
    pub async fn link(
        &self,
        movie_id: MovieId,
        actor_id: ActorId,
        role: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.movies.find_by_id(movie_id).await?.is_none() {
            return Err(McpError::NotFound("Movie".to_string()));
        }
        let mut actor = self
            .actors
            .find_by_id(actor_id)
            .await?
            .ok_or_else(|| McpError::NotFound("Actor".to_string()))?;

        if actor.movie_ids().contains(&movie_id.0) {
            return Err(McpError::Conflict(
                "Link already exists between this actor and movie".to_string(),
            ));
        }

        actor.add_movie(movie_id, now);
        self.actors.save(&mut actor).await?;
        if role.is_some() {
            self.links.set_role(movie_id, actor_id, role.as_deref()).await?;
        }
        Ok(())
    }

    /// Unlink an actor from a movie. `NotFound` if the pair was not linked.
    pub async fn unlink(&self, movie_id: MovieId, actor_id: ActorId, now: DateTime<Utc>) -> Result<()> {
        let mut actor = self
            .actors
            .find_by_id(actor_id)
            .await?
            .ok_or_else(|| McpError::NotFound("Actor".to_string()))?;

        if !actor.movie_ids().contains(&movie_id.0) {
            return Err(McpError::NotFound("Link".to_string()));
        }

        actor.remove_movie(movie_id, now);
        self.actors.save(&mut actor).await?;
        Ok(())
    }

    pub async fn movie_cast(&self, movie_id: MovieId) -> Result<Vec<(Actor, Option<String>)>> {
        if self.movies.find_by_id(movie_id).await?.is_none() {
            return Err(McpError::NotFound("Movie".to_string()));
        }
        self.links.movie_cast(movie_id).await.map_err(McpError::from)
    }

    pub async fn actor_movies(&self, actor_id: ActorId) -> Result<Vec<Movie>> {
        if self.actors.find_by_id(actor_id).await?.is_none() {
            return Err(McpError::NotFound("Actor".to_string()));
        }
        self.links.actor_filmography(actor_id).await.map_err(McpError::from)
    }

    pub async fn count_all(&self) -> Result<u64> {
        self.links.count_all().await.map_err(McpError::from)
    }
}
