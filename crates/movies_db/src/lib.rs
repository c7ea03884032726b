//! SQLite-backed persistence for the movie/actor catalog.

pub mod actors;
pub mod error;
pub mod links;
pub mod movies;
pub mod pool;
pub mod schema;

pub use actors::ActorRepository;
pub use error::{DbError, Result};
pub use links::LinkRepository;
pub use movies::MovieRepository;
pub use pool::{create_pool, DbConfig};
pub use schema::ensure_schema;
