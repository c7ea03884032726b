//! The Actor aggregate.

use crate::error::ValidationError;
use crate::value_objects::{BirthYear, Bio, BoundedLabel};
use chrono::{DateTime, Utc};
use movies_ids::{ActorId, MovieId};
use std::collections::BTreeSet;

/// An actor catalog entry.
///
/// `name` and `birth_year` are immutable post-construction, same as Movie's
/// title/director/year: a rename is a [`Actor::reconstruct`]-based
/// replacement under the existing id, never a setter. The only mutators are
/// [`Actor::set_bio`], [`Actor::add_movie`], and [`Actor::remove_movie`].
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    id: ActorId,
    name: BoundedLabel,
    birth_year: Option<BirthYear>,
    bio: Option<Bio>,
    movie_ids: BTreeSet<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub struct NewActor {
    pub name: String,
    pub birth_year: Option<i32>,
    pub bio: Option<String>,
}

impl Actor {
    pub fn create(fields: NewActor, now: DateTime<Utc>) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let name = BoundedLabel::new("name", fields.name).map_err(|e| errors.push(e)).ok();
        let birth_year = match fields.birth_year {
            Some(y) => match BirthYear::new(y) {
                Ok(y) => Some(y),
                Err(e) => {
                    errors.push(e);
                    None
                }
            },
            None => None,
        };
        let bio = match fields.bio {
            Some(b) => match Bio::new(b) {
                Ok(b) => Some(b),
                Err(e) => {
                    errors.push(e);
                    None
                }
            },
            None => None,
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            id: ActorId::TRANSIENT,
            name: name.unwrap(),
            birth_year,
            bio,
            movie_ids: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstruct an actor from storage, or replace one wholesale under its
    /// existing id (a "rename" per the aggregate contract: no new id is
    /// issued). `movie_ids` is the link set as currently persisted; the
    /// repository is the only caller that knows it.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: ActorId,
        name: String,
        birth_year: Option<i32>,
        bio: Option<String>,
        movie_ids: BTreeSet<i64>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, Vec<ValidationError>> {
        let mut actor = Self::create(
            NewActor {
                name,
                birth_year,
                bio,
            },
            created_at,
        )?;
        actor.id = id;
        actor.movie_ids = movie_ids;
        actor.updated_at = updated_at;
        Ok(actor)
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn birth_year(&self) -> Option<i32> {
        self.birth_year.map(BirthYear::value)
    }

    pub fn bio(&self) -> Option<&str> {
        self.bio.as_ref().map(Bio::as_str)
    }

    pub fn movie_ids(&self) -> &BTreeSet<i64> {
        &self.movie_ids
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Assign a repository-allocated id. Only ever called once, by the
    /// repository, immediately after the first insert.
    pub fn assign_id(&mut self, id: ActorId) {
        self.id = id;
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    pub fn set_bio(&mut self, bio: Option<String>, now: DateTime<Utc>) -> Result<(), ValidationError> {
        self.bio = match bio {
            Some(b) => Some(Bio::new(b)?),
            None => None,
        };
        self.touch(now);
        Ok(())
    }

    /// Add this actor to a movie's cast. Idempotent: adding a movie already
    /// present is a no-op.
    pub fn add_movie(&mut self, movie_id: MovieId, now: DateTime<Utc>) {
        if self.movie_ids.insert(movie_id.0) {
            self.touch(now);
        }
    }

    /// Remove this actor from a movie's cast. Idempotent: removing a movie
    /// not present is a no-op.
    pub fn remove_movie(&mut self, movie_id: MovieId, now: DateTime<Utc>) {
        if self.movie_ids.remove(&movie_id.0) {
            self.touch(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewActor {
        NewActor {
            name: "Leonardo DiCaprio".into(),
            birth_year: Some(1974),
            bio: Some("American actor.".into()),
        }
    }

    #[test]
    fn create_accepts_valid_fields() {
        let now = Utc::now();
        let actor = Actor::create(sample(), now).unwrap();
        assert_eq!(actor.name(), "Leonardo DiCaprio");
        assert_eq!(actor.birth_year(), Some(1974));
        assert!(actor.movie_ids().is_empty());
    }

    #[test]
    fn unknown_birth_year_is_none_not_error() {
        let now = Utc::now();
        let actor = Actor::create(
            NewActor {
                name: "Anon".into(),
                birth_year: None,
                bio: None,
            },
            now,
        )
        .unwrap();
        assert_eq!(actor.birth_year(), None);
    }

    #[test]
    fn create_collects_all_errors() {
        let now = Utc::now();
        let fields = NewActor {
            name: "".into(),
            birth_year: Some(1500),
            bio: Some("x".repeat(4097)),
        };
        let errors = Actor::create(fields, now).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn add_and_remove_movie_are_idempotent() {
        let now = Utc::now();
        let mut actor = Actor::create(sample(), now).unwrap();
        actor.add_movie(MovieId::from(5), now);
        actor.add_movie(MovieId::from(5), now);
        assert_eq!(actor.movie_ids().len(), 1);
        actor.remove_movie(MovieId::from(5), now);
        actor.remove_movie(MovieId::from(5), now);
        assert!(actor.movie_ids().is_empty());
    }
}
