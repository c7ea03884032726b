//! The paginated context manager (C11): a process-wide, TTL-bounded cache of
//! materialized query results, served by opaque handle.
//!
//! A process-wide table maps `ContextId -> DataContext`, protected by a
//! `tokio::sync::RwLock` (multi-reader/single-writer per spec §5: writers
//! hold the lock only for the hashmap mutation itself, never across a
//! query). State machine per entry: `Live -> Expired -> Gone`; `Expired` is
//! never observable through the API, only a momentary state detected on
//! access or by the sweeper.

use chrono::{DateTime, Duration, Utc};
use movies_ids::ContextId;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

pub const DEFAULT_TTL: Duration = Duration::hours(1);
pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 1000;
/// Safety limit on how many rows a single context materializes.
pub const MATERIALIZE_LIMIT: usize = 10_000;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ContextError {
    #[error("context not found")]
    NotFound,
    #[error("context expired")]
    Expired,
}

#[derive(Debug, Clone)]
pub struct DataContext {
    pub id: ContextId,
    pub query_description: String,
    pub total: usize,
    pub page_size: usize,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub data: Arc<Vec<serde_json::Value>>,
}

impl DataContext {
    fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            return 1;
        }
        std::cmp::max(1, self.total.div_ceil(self.page_size))
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextInfo {
    pub id: String,
    pub total: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<&DataContext> for ContextInfo {
    fn from(ctx: &DataContext) -> Self {
        Self {
            id: ctx.id.to_string(),
            total: ctx.total,
            page_size: ctx.page_size,
            total_pages: ctx.total_pages(),
            created_at: ctx.created_at,
            expires_at: ctx.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub context_id: String,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
    pub items: Vec<serde_json::Value>,
}

/// The context manager. `epoch` anchors [`movies_ids::ContextId::new`]'s
/// monotonic nanosecond clock; `ttl` and `default_page_size` are
/// construction-time configuration, overridable per-test.
pub struct ContextManager {
    table: RwLock<HashMap<ContextId, DataContext>>,
    epoch: Instant,
    ttl: Duration,
    default_page_size: usize,
}

impl ContextManager {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            table: RwLock::new(HashMap::new()),
            epoch: Instant::now(),
            ttl,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Materialize `data` (already fetched under the 10,000-row safety
    /// limit by the caller) as a new, live context.
    pub async fn create(
        &self,
        query_description: impl Into<String>,
        data: Vec<serde_json::Value>,
        page_size: Option<usize>,
    ) -> DataContext {
        let now = Utc::now();
        let page_size = page_size.unwrap_or(self.default_page_size).clamp(1, MAX_PAGE_SIZE);
        let id = ContextId::new(self.epoch);
        let ctx = DataContext {
            id: id.clone(),
            query_description: query_description.into(),
            total: data.len(),
            page_size,
            created_at: now,
            expires_at: now + self.ttl,
            data: Arc::new(data),
        };

        let mut table = self.table.write().await;
        table.insert(id, ctx.clone());
        ctx
    }

    /// Fetch a page, clamping the requested page number into
    /// `[1, total_pages]` (Open Question resolution: the last page is
    /// always served rather than returning an empty slice past the end).
    pub async fn get_page(
        &self,
        id: &ContextId,
        page: usize,
        page_size_override: Option<usize>,
    ) -> Result<Page, ContextError> {
        let now = Utc::now();
        {
            let table = self.table.read().await;
            if let Some(ctx) = table.get(id) {
                if !ctx.is_expired(now) {
                    return Ok(build_page(ctx, page, page_size_override));
                }
            } else {
                return Err(ContextError::NotFound);
            }
        }

        // Expired: upgrade to a write lock and remove it.
        let mut table = self.table.write().await;
        table.remove(id);
        Err(ContextError::Expired)
    }

    pub async fn get_info(&self, id: &ContextId) -> Result<ContextInfo, ContextError> {
        let now = Utc::now();
        let table = self.table.read().await;
        match table.get(id) {
            Some(ctx) if !ctx.is_expired(now) => Ok(ContextInfo::from(ctx)),
            Some(_) => Err(ContextError::Expired),
            None => Err(ContextError::NotFound),
        }
    }

    pub async fn delete(&self, id: &ContextId) -> Result<(), ContextError> {
        let mut table = self.table.write().await;
        match table.remove(id) {
            Some(ctx) if !ctx.is_expired(Utc::now()) => Ok(()),
            Some(_) => Err(ContextError::Expired),
            None => Err(ContextError::NotFound),
        }
    }

    pub async fn list_active(&self) -> Vec<ContextInfo> {
        let now = Utc::now();
        let table = self.table.read().await;
        table
            .values()
            .filter(|ctx| !ctx.is_expired(now))
            .map(ContextInfo::from)
            .collect()
    }

    /// Remove every expired entry. Intended to be driven by a periodic
    /// background sweep task; also safe to call opportunistically.
    pub async fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let mut table = self.table.write().await;
        let before = table.len();
        table.retain(|_, ctx| !ctx.is_expired(now));
        before - table.len()
    }
}

impl Default for ContextManager {
    fn default() -> Self {
        Self::new()
    }
}

fn build_page(ctx: &DataContext, requested_page: usize, page_size_override: Option<usize>) -> Page {
    let page_size = page_size_override.unwrap_or(ctx.page_size).clamp(1, MAX_PAGE_SIZE);
    let total_pages = std::cmp::max(1, ctx.total.div_ceil(page_size.max(1)));
    let page = requested_page.clamp(1, total_pages);
    let start = (page - 1) * page_size;
    let end = std::cmp::min(start + page_size, ctx.data.len());
    let items = if start >= ctx.data.len() {
        Vec::new()
    } else {
        ctx.data[start..end].to_vec()
    };

    Page {
        context_id: ctx.id.to_string(),
        page,
        page_size,
        total: ctx.total,
        total_pages,
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data(n: usize) -> Vec<serde_json::Value> {
        (0..n).map(|i| serde_json::json!({"i": i})).collect()
    }

    #[tokio::test]
    async fn create_then_get_page_round_trips() {
        let mgr = ContextManager::new();
        let ctx = mgr.create("movies", sample_data(120), Some(50)).await;
        let page1 = mgr.get_page(&ctx.id, 1, None).await.unwrap();
        assert_eq!(page1.items.len(), 50);
        let page3 = mgr.get_page(&ctx.id, 3, None).await.unwrap();
        assert_eq!(page3.items.len(), 20);
        assert_eq!(page3.total_pages, 3);
    }

    #[tokio::test]
    async fn page_beyond_total_pages_clamps_to_last_page() {
        let mgr = ContextManager::new();
        let ctx = mgr.create("movies", sample_data(10), Some(5)).await;
        let page = mgr.get_page(&ctx.id, 999, None).await.unwrap();
        assert_eq!(page.page, 2);
        assert_eq!(page.items.len(), 5);
    }

    #[tokio::test]
    async fn empty_result_set_still_serves_an_empty_page_one() {
        let mgr = ContextManager::new();
        let ctx = mgr.create("movies", sample_data(0), Some(50)).await;
        let page = mgr.get_page(&ctx.id, 1, None).await.unwrap();
        assert_eq!(page.page, 1);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
    }

    #[tokio::test]
    async fn expired_context_fails_every_subsequent_access() {
        let mgr = ContextManager::with_ttl(Duration::milliseconds(-1));
        let ctx = mgr.create("movies", sample_data(5), None).await;
        assert!(matches!(
            mgr.get_page(&ctx.id, 1, None).await,
            Err(ContextError::Expired)
        ));
        // A second access after the sweep-on-read observes it as gone.
        assert!(matches!(
            mgr.get_page(&ctx.id, 1, None).await,
            Err(ContextError::NotFound)
        ));
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_entries() {
        let mgr = ContextManager::new();
        let live = mgr.create("live", sample_data(1), None).await;
        let expiring = ContextManager::with_ttl(Duration::milliseconds(-1));
        let expired = expiring.create("expired", sample_data(1), None).await;

        assert_eq!(expiring.sweep_expired().await, 1);
        assert!(mgr.get_info(&live.id).await.is_ok());
        assert!(matches!(
            expiring.get_info(&expired.id).await,
            Err(ContextError::NotFound)
        ));
    }
}
