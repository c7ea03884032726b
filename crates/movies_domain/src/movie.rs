//! The Movie aggregate.

use crate::error::ValidationError;
use crate::value_objects::{BoundedLabel, Genres, PosterUrl, Rating, Year};
use chrono::{DateTime, Utc};
use movies_ids::MovieId;

/// A movie catalog entry.
///
/// `title`, `director`, and `year` are immutable post-construction; a rename
/// is modeled as replacement via [`Movie::reconstruct`] under the existing
/// id, never a setter. The only mutators are [`Movie::set_rating`],
/// [`Movie::set_poster_url`], [`Movie::add_genre`], and
/// [`Movie::remove_genre`]. Construction routes through the value objects in
/// [`crate::value_objects`]; there is no way to hold a `Movie` with an
/// out-of-range year or an over-long title.
#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    id: MovieId,
    title: BoundedLabel,
    director: BoundedLabel,
    year: Year,
    rating: Option<Rating>,
    genres: Genres,
    poster_url: Option<PosterUrl>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Fields accepted when creating a new movie.
pub struct NewMovie {
    pub title: String,
    pub director: String,
    pub year: i32,
    pub rating: Option<f64>,
    pub genres: Vec<String>,
    pub poster_url: Option<String>,
}

impl Movie {
    /// Validate and construct a brand-new movie, timestamped at `now`. The
    /// id is [`MovieId::TRANSIENT`] until a repository assigns one.
    pub fn create(fields: NewMovie, now: DateTime<Utc>) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let title = BoundedLabel::new("title", fields.title).map_err(|e| errors.push(e)).ok();
        let director = BoundedLabel::new("director", fields.director)
            .map_err(|e| errors.push(e))
            .ok();
        let year = Year::new(fields.year).map_err(|e| errors.push(e)).ok();
        let rating = match fields.rating {
            Some(r) => match Rating::new(r) {
                Ok(r) => Some(r),
                Err(e) => {
                    errors.push(e);
                    None
                }
            },
            None => None,
        };
        let genres = Genres::new(fields.genres).map_err(|e| errors.push(e)).ok();
        let poster_url = match fields.poster_url {
            Some(u) => match PosterUrl::new(u) {
                Ok(u) => Some(u),
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
            id: MovieId::TRANSIENT,
            title: title.unwrap(),
            director: director.unwrap(),
            year: year.unwrap(),
            rating,
            genres: genres.unwrap(),
            poster_url,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstruct a movie from storage. Used by the repository layer; the
    /// same value-object constructors run here as on creation, so a
    /// corrupted row fails to load rather than being silently accepted.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: MovieId,
        title: String,
        director: String,
        year: i32,
        rating: Option<f64>,
        genres: Vec<String>,
        poster_url: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, Vec<ValidationError>> {
        let mut movie = Self::create(
            NewMovie {
                title,
                director,
                year,
                rating,
                genres,
                poster_url,
            },
            created_at,
        )?;
        movie.id = id;
        movie.updated_at = updated_at;
        Ok(movie)
    }

    pub fn id(&self) -> MovieId {
        self.id
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    pub fn director(&self) -> &str {
        self.director.as_str()
    }

    pub fn year(&self) -> i32 {
        self.year.value()
    }

    pub fn rating(&self) -> Option<f64> {
        self.rating.map(Rating::value)
    }

    pub fn genres(&self) -> &[String] {
        self.genres.as_slice()
    }

    pub fn poster_url(&self) -> Option<&str> {
        self.poster_url.as_ref().map(PosterUrl::as_str)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Assign a repository-allocated id. Only ever called once, by the
    /// repository, immediately after the first insert.
    pub fn assign_id(&mut self, id: MovieId) {
        self.id = id;
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    pub fn set_rating(&mut self, rating: Option<f64>, now: DateTime<Utc>) -> Result<(), ValidationError> {
        self.rating = match rating {
            Some(r) => Some(Rating::new(r)?),
            None => None,
        };
        self.touch(now);
        Ok(())
    }

    pub fn set_poster_url(&mut self, url: Option<String>, now: DateTime<Utc>) -> Result<(), ValidationError> {
        self.poster_url = match url {
            Some(u) => Some(PosterUrl::new(u)?),
            None => None,
        };
        self.touch(now);
        Ok(())
    }

    pub fn set_genres(&mut self, genres: Vec<String>, now: DateTime<Utc>) -> Result<(), ValidationError> {
        self.genres = Genres::new(genres)?;
        self.touch(now);
        Ok(())
    }

    pub fn add_genre(&mut self, genre: String, now: DateTime<Utc>) -> Result<(), ValidationError> {
        self.genres.add(genre)?;
        self.touch(now);
        Ok(())
    }

    pub fn remove_genre(&mut self, genre: &str, now: DateTime<Utc>) {
        self.genres.remove(genre);
        self.touch(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewMovie {
        NewMovie {
            title: "Inception".into(),
            director: "Christopher Nolan".into(),
            year: 2010,
            rating: Some(8.8),
            genres: vec!["Sci-Fi".into(), "Thriller".into()],
            poster_url: Some("https://example.com/inception.jpg".into()),
        }
    }

    #[test]
    fn create_accepts_valid_fields() {
        let now = Utc::now();
        let movie = Movie::create(sample(), now).unwrap();
        assert_eq!(movie.title(), "Inception");
        assert_eq!(movie.year(), 2010);
        assert_eq!(movie.rating(), Some(8.8));
    }

    #[test]
    fn create_collects_all_errors() {
        let now = Utc::now();
        let fields = NewMovie {
            title: "".into(),
            director: "".into(),
            year: 1000,
            rating: Some(20.0),
            genres: vec![],
            poster_url: Some("not a url".into()),
        };
        let errors = Movie::create(fields, now).unwrap_err();
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn failed_mutation_leaves_state_unchanged() {
        let now = Utc::now();
        let mut movie = Movie::create(sample(), now).unwrap();
        let before = movie.clone();
        assert!(movie.set_rating(Some(20.0), now).is_err());
        assert_eq!(movie, before);
    }

    #[test]
    fn rename_is_a_replacement_under_the_same_id() {
        let now = Utc::now();
        let mut movie = Movie::create(sample(), now).unwrap();
        movie.assign_id(MovieId::from(7));
        let later = now + chrono::Duration::seconds(1);
        let renamed = Movie::reconstruct(
            movie.id(),
            "Inception (Director's Cut)".into(),
            movie.director().to_string(),
            movie.year(),
            movie.rating(),
            movie.genres().to_vec(),
            movie.poster_url().map(str::to_string),
            movie.created_at(),
            later,
        )
        .unwrap();
        assert_eq!(renamed.id(), movie.id());
        assert_eq!(renamed.title(), "Inception (Director's Cut)");
        assert_eq!(renamed.created_at(), movie.created_at());
    }
}
