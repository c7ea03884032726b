//! Shared identifier wrappers for the movies MCP server.
//!
//! Movie and Actor ids are plain monotonically assigned integers (see
//! `MovieId`/`ActorId`); `0` denotes "not yet persisted" per the Movie/Actor
//! aggregate contract. `ContextId` wraps the opaque, process-unique handle
//! minted by the paginated context manager.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

macro_rules! define_row_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// The sentinel id for an entity that has not yet been persisted.
            pub const TRANSIENT: Self = Self(0);

            pub fn is_persisted(self) -> bool {
                self.0 > 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

define_row_id!(MovieId);
define_row_id!(ActorId);

/// Opaque handle for a server-side paginated [`DataContext`]. Unique within
/// the lifetime of a single server process; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(String);

static CONTEXT_COUNTER: AtomicU32 = AtomicU32::new(0);

impl ContextId {
    /// Mint a new id using nanoseconds elapsed since `epoch`, with a trailing
    /// atomic counter to guarantee uniqueness if two ids land on the same
    /// tick.
    pub fn new(epoch: Instant) -> Self {
        let nanos = epoch.elapsed().as_nanos();
        let seq = CONTEXT_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("ctx_{nanos}_{seq}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Rebuild a [`ContextId`] from its wire representation (a tool's
    /// `context_id` argument). Opaque to the caller; the server never
    /// validates the `ctx_<nanos>_<seq>` shape, only equality against a
    /// live table entry.
    pub fn from_wire(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_id_is_not_persisted() {
        assert!(!MovieId::TRANSIENT.is_persisted());
        assert!(MovieId(1).is_persisted());
    }

    #[test]
    fn context_ids_are_unique_within_a_process() {
        let epoch = Instant::now();
        let a = ContextId::new(epoch);
        let b = ContextId::new(epoch);
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("ctx_"));
    }
}
