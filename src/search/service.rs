use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use super::fallback::{CascadeOutcome, FallbackCascade};
use super::formatter::ResultFormatter;
use super::models::{AddressHit, SearchResponse};
use super::plan::{QueryPlan, QueryPlanBuilder};
use crate::backend::SearchBackend;
use crate::core::config::FiasConfig;
use crate::core::error::{FiasError, Result};
use crate::normalizer::{NormalizedQuery, QueryNormalizer};


/// Anything that answers address queries; the regression runner drives it.
#[async_trait]
pub trait AddressSearcher: Send + Sync {
    async fn search(&self, raw: &str, limit: usize) -> Result<Vec<AddressHit>>;
}


/// Normalize, plan, execute with fallback, format.
pub struct AddressSearchService {
    backend: Arc<dyn SearchBackend>,
    config: FiasConfig,
    semaphore: Arc<Semaphore>,
}

impl AddressSearchService {
    pub fn new(backend: Arc<dyn SearchBackend>, config: FiasConfig) -> Self {
        info!(
            "AddressSearchService initialized: backend={}, workers={}",
            backend.name(),
            config.worker_threads
        );

        Self {
            backend,
            semaphore: Arc::new(Semaphore::new(config.worker_threads.max(1))),
            config,
        }
    }

    pub fn config(&self) -> &FiasConfig {
        &self.config
    }

    pub fn normalize(&self, raw: &str) -> NormalizedQuery {
        let query = QueryNormalizer::standard().normalize(raw);
        debug!(
            "Normalized '{}' -> body='{}' house={:?} korpus={:?} stroenie={:?} regions={:?}",
            raw, query.body_text, query.house_number, query.korpus, query.stroenie, query.region_hints
        );
        query
    }

    pub fn explain(&self, raw: &str) -> (NormalizedQuery, QueryPlan) {
        let query = self.normalize(raw);
        let plan = QueryPlanBuilder::standard().build(&query);
        (query, plan)
    }

    /// Runs on the calling thread; the backend may block.
    pub fn search_blocking(&self, raw: &str, limit: usize) -> Vec<AddressHit> {
        self.respond_blocking(raw, limit).results
    }

    /// Same as [`search_blocking`](Self::search_blocking), with the normalized query echoed back.
    pub fn respond_blocking(&self, raw: &str, limit: usize) -> SearchResponse {
        let query = self.normalize(raw);
        let results = run_search(self.backend.as_ref(), &query, self.config.clamp_limit(limit));
        SearchResponse {
            query: raw.to_string(),
            normalized_query: query.normalized_full,
            house_number: query.house_number,
            total: results.len(),
            results,
        }
    }

    /// Executes on the blocking pool, at most `worker_threads` searches at a time.
    pub async fn search(&self, raw: &str, limit: usize) -> Result<Vec<AddressHit>> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| FiasError::Internal(format!("search pool closed: {}", e)))?;

        let backend = Arc::clone(&self.backend);
        let query = self.normalize(raw);
        let limit = self.config.clamp_limit(limit);

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            run_search(backend.as_ref(), &query, limit)
        })
        .await
        .map_err(|e| FiasError::Internal(format!("search task failed: {}", e)))
    }
}

#[async_trait]
impl AddressSearcher for AddressSearchService {
    async fn search(&self, raw: &str, limit: usize) -> Result<Vec<AddressHit>> {
        AddressSearchService::search(self, raw, limit).await
    }
}

fn run_search(backend: &dyn SearchBackend, query: &NormalizedQuery, limit: usize) -> Vec<AddressHit> {
    if query.is_empty() {
        debug!("Empty query '{}', nothing to search", query.original);
        return Vec::new();
    }

    let plan = QueryPlanBuilder::standard().build(query);
    let CascadeOutcome { hits, resolved_by, attempts } = FallbackCascade::new(backend).run(query, &plan, limit);
    debug!("'{}' resolved by {:?} after {} attempts", query.original, resolved_by, attempts);

    ResultFormatter::standard().format(hits)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{doc, house_doc, MemoryBackend};
    use crate::search::HierarchyLevel;

    fn service(backend: MemoryBackend) -> (Arc<MemoryBackend>, AddressSearchService) {
        let backend = Arc::new(backend);
        let service = AddressSearchService::new(backend.clone(), FiasConfig::default());
        (backend, service)
    }

    fn tverskaya() -> MemoryBackend {
        MemoryBackend::new(vec![
            ("s1", doc("street", "тверская", "москва г, тверская ул")),
            ("h7", house_doc("москва г, тверская ул, дом 7", "7", None, None)),
            ("h7k2", house_doc("москва г, тверская ул, дом 7 к 2", "7", Some("2"), None)),
        ])
    }

    #[test]
    fn test_empty_query_skips_backend() {
        let (backend, service) = service(tverskaya());
        assert!(service.search_blocking("  ,. ", 10).is_empty());
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn test_exact_house_ranks_first() {
        let (_, service) = service(tverskaya());
        let hits = service.search_blocking("ул. Тверская, 7", 10);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "h7");
        assert_eq!(hits[0].level, HierarchyLevel::House);
        assert_eq!(hits[0].full_name, "москва г, тверская ул, дом 7");
    }

    #[test]
    fn test_respond_echoes_normalization() {
        let (_, service) = service(tverskaya());
        let response = service.respond_blocking("ул. Тверская, 7", 10);
        assert_eq!(response.query, "ул. Тверская, 7");
        assert_eq!(response.house_number.as_deref(), Some("7"));
        assert_eq!(response.total, response.results.len());
    }

    #[test]
    fn test_explain_builds_plan() {
        let (backend, service) = service(tverskaya());
        let (query, plan) = service.explain("ул. Тверская, 1к1с1");
        assert_eq!(query.body_text, "тверская ул");
        assert!(!plan.is_empty());
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_async_search_clamps_limit() {
        let (_, service) = service(tverskaya());
        let hits = service.search("ул. Тверская, 7", 0).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_searcher_trait_object() {
        let (_, service) = service(tverskaya());
        let searcher: Arc<dyn AddressSearcher> = Arc::new(service);
        let hits = tokio_test::block_on(searcher.search("тверская", 5)).unwrap();
        assert_eq!(hits[0].id, "s1");
    }
}
