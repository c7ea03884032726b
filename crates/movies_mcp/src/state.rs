//! Shared application state handed to every tool/resource/prompt handler.

use crate::context::ContextManager;
use crate::services::{ActorService, LinkService, MovieService};
use std::sync::Arc;

/// Cheaply cloneable: every field is already an `Arc`/pool-backed clone
/// handle, matching the teacher's `CoreHandle` (a cloneable facade over
/// shared state) rather than passing `&AppState` references through async
/// tasks with lifetimes.
#[derive(Clone)]
pub struct AppState {
    pub movies: MovieService,
    pub actors: ActorService,
    pub links: LinkService,
    pub context: Arc<ContextManager>,
}
