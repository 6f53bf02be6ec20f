use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::join_all;
use tracing::{error, info, warn};

use super::models::{CaseError, CaseResult, RegressionCase, RegressionReport};
use crate::core::config::FiasConfig;
use crate::search::AddressSearcher;


/// Runs regression cases in fixed-size batches with a per-item and per-batch deadline.
pub struct RegressionRunner {
    searcher: Arc<dyn AddressSearcher>,
    batch_size: usize,
    batch_timeout: Duration,
    item_timeout: Duration,
    batch_delay: Duration,
}

impl RegressionRunner {
    pub fn new(searcher: Arc<dyn AddressSearcher>, config: &FiasConfig) -> Self {
        Self {
            searcher,
            batch_size: config.regression_batch_size.max(1),
            batch_timeout: Duration::from_secs(config.regression_batch_timeout_secs),
            item_timeout: Duration::from_secs(config.regression_item_timeout_secs),
            batch_delay: Duration::from_millis(config.regression_batch_delay_ms),
        }
    }

    pub fn with_timeouts(mut self, item_timeout: Duration, batch_timeout: Duration) -> Self {
        self.item_timeout = item_timeout;
        self.batch_timeout = batch_timeout;
        self
    }

    pub fn with_batch(mut self, batch_size: usize, batch_delay: Duration) -> Self {
        self.batch_size = batch_size.max(1);
        self.batch_delay = batch_delay;
        self
    }

    pub async fn run(&self, cases: Vec<RegressionCase>) -> RegressionReport {
        let started_at = Utc::now();
        let batch_count = cases.len().div_ceil(self.batch_size);
        info!("Running {} regression cases in {} batches of {}", cases.len(), batch_count, self.batch_size);

        let mut results = Vec::with_capacity(cases.len());
        for (idx, batch) in cases.chunks(self.batch_size).enumerate() {
            results.extend(self.run_batch(batch).await);
            info!("Batch {}/{} done, {} cases evaluated", idx + 1, batch_count, results.len());

            if idx + 1 < batch_count && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        let report = RegressionReport::new(started_at, results);
        info!(
            "Regression finished: {}/{} passed ({:.1}%), {} timeouts",
            report.passed,
            report.total,
            report.accuracy * 100.0,
            report.timeouts
        );
        report
    }

    async fn run_batch(&self, batch: &[RegressionCase]) -> Vec<CaseResult> {
        let started = Instant::now();
        let handles: Vec<_> = batch
            .iter()
            .cloned()
            .map(|case| {
                let searcher = Arc::clone(&self.searcher);
                let item_timeout = self.item_timeout;
                tokio::spawn(async move { evaluate(searcher.as_ref(), case, item_timeout).await })
            })
            .collect();
        let aborts: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();

        match tokio::time::timeout(self.batch_timeout, join_all(handles)).await {
            Ok(joined) => batch
                .iter()
                .zip(joined)
                .map(|(case, outcome)| match outcome {
                    Ok(result) => result,
                    Err(e) => {
                        error!("Regression case {} panicked: {}", case.id, e);
                        CaseResult::failed(case.clone(), CaseError::Panicked, e.to_string(), elapsed_ms(started))
                    }
                })
                .collect(),
            Err(_) => {
                warn!("Batch timed out after {:?}, marking {} cases failed", self.batch_timeout, batch.len());
                aborts.iter().for_each(|a| a.abort());
                batch
                    .iter()
                    .map(|case| {
                        CaseResult::failed(case.clone(), CaseError::Timeout, "batch timeout", elapsed_ms(started))
                    })
                    .collect()
            }
        }
    }
}

async fn evaluate(searcher: &dyn AddressSearcher, case: RegressionCase, item_timeout: Duration) -> CaseResult {
    let started = Instant::now();
    match tokio::time::timeout(item_timeout, searcher.search(&case.query, 1)).await {
        Ok(Ok(hits)) => {
            let actual = hits.first().map(|h| h.full_name.clone()).unwrap_or_default();
            CaseResult::judged(case, actual, elapsed_ms(started))
        }
        Ok(Err(e)) => {
            warn!("Regression case {} failed: {}", case.id, e);
            CaseResult::failed(case, CaseError::Search, e.to_string(), elapsed_ms(started))
        }
        Err(_) => {
            warn!("Regression case {} timed out: {}", case.id, case.query);
            CaseResult::failed(case, CaseError::Timeout, "item timeout", elapsed_ms(started))
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
