//! Search/ordering criteria shared by the movie and actor query tools.

/// Column a result set is ordered by. Which variants are meaningful depends
/// on the aggregate being searched (movies order by title/director/year/
/// rating/created_at/updated_at; actors order by name/created_at/updated_at).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    Title,
    Director,
    Name,
    Year,
    Rating,
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDir {
    Asc,
    Desc,
}

/// Criteria for a movie search. `None` fields are unconstrained. Ties in
/// the primary ordering always break on ascending id.
#[derive(Debug, Clone)]
pub struct MovieSearchCriteria {
    pub title_contains: Option<String>,
    pub director_contains: Option<String>,
    pub genre: Option<String>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub order_by: OrderBy,
    pub order_dir: OrderDir,
    pub limit: u32,
    pub offset: u32,
}

impl Default for MovieSearchCriteria {
    fn default() -> Self {
        Self {
            title_contains: None,
            director_contains: None,
            genre: None,
            min_year: None,
            max_year: None,
            min_rating: None,
            max_rating: None,
            order_by: OrderBy::Title,
            order_dir: OrderDir::Asc,
            limit: 20,
            offset: 0,
        }
    }
}

/// Criteria for an actor search.
#[derive(Debug, Clone)]
pub struct ActorSearchCriteria {
    pub name_contains: Option<String>,
    pub order_by: OrderBy,
    pub order_dir: OrderDir,
    pub limit: u32,
    pub offset: u32,
}

impl Default for ActorSearchCriteria {
    fn default() -> Self {
        Self {
            name_contains: None,
            order_by: OrderBy::Name,
            order_dir: OrderDir::Asc,
            limit: 20,
            offset: 0,
        }
    }
}
