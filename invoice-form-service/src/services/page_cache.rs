//! Rendered page cache keyed by route path.
//!
//! Successful mutations call [`PageCache::revalidate_path`] so the next read
//! of the route renders from the store again. Each path carries a generation
//! that revalidation bumps; a rendering started before a revalidation is
//! refused by [`PageCache::put_if_fresh`].

use crate::services::metrics::CACHE_REVALIDATIONS_TOTAL;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Default)]
struct Page {
    generation: u64,
    body: Option<String>,
}

#[derive(Clone, Default)]
pub struct PageCache {
    pages: Arc<DashMap<String, Page>>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.pages.get(path).and_then(|page| page.body.clone())
    }

    /// Current generation of `path`. Read it before rendering and hand it
    /// back to [`PageCache::put_if_fresh`].
    pub fn generation(&self, path: &str) -> u64 {
        self.pages.get(path).map(|page| page.generation).unwrap_or(0)
    }

    /// Store `body` only if `path` has not been revalidated since
    /// `generation` was read. Returns whether the body was stored.
    pub fn put_if_fresh(&self, path: &str, generation: u64, body: String) -> bool {
        let mut page = self.pages.entry(path.to_string()).or_default();
        if page.generation != generation {
            tracing::debug!(
                path = %path,
                rendered_at = generation,
                current = page.generation,
                "Discarding rendering older than last revalidation"
            );
            return false;
        }
        page.body = Some(body);
        true
    }

    /// Mark the rendering of `path` stale. Revalidating a path that was never
    /// cached is not an error.
    pub fn revalidate_path(&self, path: &str) {
        let evicted = {
            let mut page = self.pages.entry(path.to_string()).or_default();
            page.generation += 1;
            page.body.take().is_some()
        };
        CACHE_REVALIDATIONS_TOTAL.with_label_values(&[path]).inc();
        tracing::debug!(path = %path, evicted = evicted, "Page cache revalidated");
    }

    pub fn contains(&self, path: &str) -> bool {
        self.pages
            .get(path)
            .map(|page| page.body.is_some())
            .unwrap_or(false)
    }
}
