//! Value objects enforcing the field-level invariants of the catalog domain.
//!
//! Every constructor here is the *only* way to produce a valid instance;
//! repository reload paths call these same constructors, so a corrupted row
//! surfaces as a load error rather than a silently coerced value.

use crate::error::ValidationError;
use chrono::{Datelike, Utc};
use unicode_segmentation::UnicodeSegmentation;

fn grapheme_len(s: &str) -> usize {
    s.graphemes(true).count()
}

fn current_year() -> i32 {
    Utc::now().year()
}

/// A trimmed, non-empty, length-bounded label (Movie title/director, Actor
/// name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedLabel(String);

impl BoundedLabel {
    pub const MAX_GRAPHEMES: usize = 255;

    pub fn new(field: &'static str, raw: impl Into<String>) -> Result<Self, ValidationError> {
        let trimmed = raw.into().trim().to_string();
        if trimmed.is_empty() {
            return Err(ValidationError::new(field, "must not be empty"));
        }
        if grapheme_len(&trimmed) > Self::MAX_GRAPHEMES {
            return Err(ValidationError::new(
                field,
                format!("must be at most {} characters", Self::MAX_GRAPHEMES),
            ));
        }
        Ok(Self(trimmed))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// A release year, bounded to `[1888, currentYear + 5]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Year(i32);

impl Year {
    pub const MIN: i32 = 1888;

    pub fn new(value: i32) -> Result<Self, ValidationError> {
        let max = current_year() + 5;
        if value < Self::MIN || value > max {
            return Err(ValidationError::new(
                "year",
                format!("must be between {} and {}", Self::MIN, max),
            ));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> i32 {
        self.0
    }
}

/// A rating in `[0.0, 10.0]`. Absence is modeled by `Option<Rating>` at the
/// aggregate level; a rating of 0.0 is a real value, distinct from no rating
/// at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rating(f64);

impl Rating {
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || !(0.0..=10.0).contains(&value) {
            return Err(ValidationError::new("rating", "must be between 0.0 and 10.0"));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// An actor's birth year, bounded to `[1850, currentYear]`. Absence means
/// "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BirthYear(i32);

impl BirthYear {
    pub const MIN: i32 = 1850;

    pub fn new(value: i32) -> Result<Self, ValidationError> {
        let max = current_year();
        if value < Self::MIN || value > max {
            return Err(ValidationError::new(
                "birth_year",
                format!("must be between {} and {}", Self::MIN, max),
            ));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> i32 {
        self.0
    }
}

/// Free-text biography, capped at 4096 graphemes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bio(String);

impl Bio {
    pub const MAX_GRAPHEMES: usize = 4096;

    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let value = raw.into();
        if grapheme_len(&value) > Self::MAX_GRAPHEMES {
            return Err(ValidationError::new(
                "bio",
                format!("must be at most {} characters", Self::MAX_GRAPHEMES),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// An absolute `http`/`https` poster URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosterUrl(String);

impl PosterUrl {
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        let parsed = url::Url::parse(&raw)
            .map_err(|e| ValidationError::new("poster_url", format!("invalid URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ValidationError::new(
                "poster_url",
                "must be an absolute http or https URL",
            ));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// The ordered, deduplicated genre set of a Movie. Case-sensitive comparison;
/// at most 16 entries, each non-empty after trimming.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Genres(Vec<String>);

impl Genres {
    pub const MAX_ENTRIES: usize = 16;

    pub fn new(raw: Vec<String>) -> Result<Self, ValidationError> {
        let mut seen = std::collections::HashSet::new();
        let mut ordered = Vec::new();
        for genre in raw {
            let trimmed = genre.trim().to_string();
            if trimmed.is_empty() {
                return Err(ValidationError::new("genres", "genre entries must not be empty"));
            }
            if seen.insert(trimmed.clone()) {
                ordered.push(trimmed);
            }
        }
        if ordered.len() > Self::MAX_ENTRIES {
            return Err(ValidationError::new(
                "genres",
                format!("must have at most {} entries", Self::MAX_ENTRIES),
            ));
        }
        Ok(Self(ordered))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    pub fn contains(&self, genre: &str) -> bool {
        self.0.iter().any(|g| g == genre)
    }

    /// Add a genre, preserving order and dedup; no-op if already present.
    /// Fails if the addition would exceed the entry cap.
    pub fn add(&mut self, genre: impl Into<String>) -> Result<(), ValidationError> {
        let trimmed = genre.into().trim().to_string();
        if trimmed.is_empty() {
            return Err(ValidationError::new("genres", "genre must not be empty"));
        }
        if self.contains(&trimmed) {
            return Ok(());
        }
        if self.0.len() >= Self::MAX_ENTRIES {
            return Err(ValidationError::new(
                "genres",
                format!("must have at most {} entries", Self::MAX_ENTRIES),
            ));
        }
        self.0.push(trimmed);
        Ok(())
    }

    /// Remove a genre if present; no-op (not an error) otherwise.
    pub fn remove(&mut self, genre: &str) {
        self.0.retain(|g| g != genre);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_label_trims_and_rejects_empty() {
        assert_eq!(BoundedLabel::new("title", "  Inception  ").unwrap().as_str(), "Inception");
        assert!(BoundedLabel::new("title", "   ").is_err());
        assert!(BoundedLabel::new("title", "x".repeat(256)).is_err());
    }

    #[test]
    fn year_boundaries() {
        assert!(Year::new(1888).is_ok());
        assert!(Year::new(1887).is_err());
        assert!(Year::new(current_year() + 5).is_ok());
        assert!(Year::new(current_year() + 6).is_err());
    }

    #[test]
    fn rating_boundaries() {
        assert!(Rating::new(0.0).is_ok());
        assert!(Rating::new(10.0).is_ok());
        assert!(Rating::new(10.1).is_err());
        assert!(Rating::new(-0.1).is_err());
    }

    #[test]
    fn genres_dedup_case_sensitive_and_ordered() {
        let genres = Genres::new(vec![
            "Action".into(),
            "Drama".into(),
            "Action".into(),
            "action".into(),
        ])
        .unwrap();
        assert_eq!(genres.as_slice(), &["Action", "Drama", "action"]);
    }

    #[test]
    fn genres_cap_at_sixteen() {
        let many: Vec<String> = (0..17).map(|i| format!("g{i}")).collect();
        assert!(Genres::new(many).is_err());
    }

    #[test]
    fn poster_url_requires_http_scheme() {
        assert!(PosterUrl::new("https://example.com/p.jpg").is_ok());
        assert!(PosterUrl::new("ftp://example.com/p.jpg").is_err());
        assert!(PosterUrl::new("not a url").is_err());
    }
}
