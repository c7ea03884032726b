//! Domain model for the movie/actor catalog: value objects, aggregates, and
//! their invariants. No persistence or transport concerns live here.

pub mod actor;
pub mod error;
pub mod movie;
pub mod search;
pub mod value_objects;

pub use actor::{Actor, NewActor};
pub use error::ValidationError;
pub use movie::{Movie, NewMovie};
pub use search::{ActorSearchCriteria, MovieSearchCriteria, OrderBy, OrderDir};
