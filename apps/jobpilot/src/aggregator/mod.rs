//! Multi-source search: fan out to every board, then dedupe.

pub mod dedup;
pub mod filters;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::models::{Job, JobSourceKind};
use crate::sources::{JobSource, SearchQuery};

/// Per-source outcome of one aggregate search.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub kind: JobSourceKind,
    pub jobs_found: usize,
    pub failed_queries: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateResult {
    /// Deduplicated jobs, in source order then board order.
    pub jobs: Vec<Job>,
    pub total_before_dedup: usize,
    pub sources: Vec<SourceReport>,
}

pub struct JobAggregator {
    sources: Vec<Arc<dyn JobSource>>,
    /// Fixed pause between consecutive queries against the same board.
    delay: Duration,
}

impl JobAggregator {
    pub fn new(sources: Vec<Arc<dyn JobSource>>, delay: Duration) -> Self {
        Self { sources, delay }
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    /// Runs every query against every source. Sources run concurrently, one
    /// task each; queries within a source run in sequence. A failed query is
    /// logged and contributes nothing. There are no retries.
    pub async fn search(&self, queries: &[SearchQuery]) -> AggregateResult {
        let mut tasks = JoinSet::new();

        for (index, source) in self.sources.iter().enumerate() {
            let source = Arc::clone(source);
            let queries = queries.to_vec();
            let delay = self.delay;

            tasks.spawn(async move {
                let mut jobs = Vec::new();
                let mut failed = 0;
                for (i, query) in queries.iter().enumerate() {
                    if i > 0 && !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    match source.search(query).await {
                        Ok(found) => jobs.extend(found),
                        Err(e) => {
                            warn!("{} search for '{}' failed: {e}", source.name(), query.keywords);
                            failed += 1;
                        }
                    }
                }
                let report = SourceReport {
                    source: source.name().to_string(),
                    kind: source.kind(),
                    jobs_found: jobs.len(),
                    failed_queries: failed,
                };
                (index, jobs, report)
            });
        }

        let mut collected: Vec<(usize, Vec<Job>, SourceReport)> = Vec::with_capacity(self.sources.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => collected.push(result),
                Err(e) => warn!("Source task panicked or was cancelled: {e}"),
            }
        }
        collected.sort_by_key(|(index, _, _)| *index);

        let mut all_jobs = Vec::new();
        let mut reports = Vec::with_capacity(collected.len());
        for (_, jobs, report) in collected {
            all_jobs.extend(jobs);
            reports.push(report);
        }

        let total_before_dedup = all_jobs.len();
        let jobs = dedup::dedupe(all_jobs, true);
        info!(
            "Aggregated {} jobs ({} before dedup) from {} sources",
            jobs.len(),
            total_before_dedup,
            reports.len()
        );

        AggregateResult {
            jobs,
            total_before_dedup,
            sources: reports,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SourceError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSource {
        name: &'static str,
        jobs: Vec<Job>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn ok(name: &'static str, jobs: Vec<Job>) -> Self {
            Self { name, jobs, fail: false, calls: AtomicUsize::new(0) }
        }

        fn failing(name: &'static str) -> Self {
            Self { name, jobs: vec![], fail: true, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl JobSource for FakeSource {
        fn name(&self) -> &str {
            self.name
        }

        fn kind(&self) -> JobSourceKind {
            JobSourceKind::HtmlBoard
        }

        async fn search(&self, _query: &SearchQuery) -> Result<Vec<Job>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SourceError::Status { source_name: self.name.into(), status: 503 });
            }
            Ok(self.jobs.clone())
        }
    }

    fn job(title: &str, company: &str) -> Job {
        Job::new(JobSourceKind::HtmlBoard, title, company, "Remote", "u")
    }

    #[tokio::test]
    async fn test_failing_source_contributes_empty_list() {
        let aggregator = JobAggregator::new(
            vec![
                Arc::new(FakeSource::failing("down")),
                Arc::new(FakeSource::ok("up", vec![job("Dev", "Acme")])),
            ],
            Duration::ZERO,
        );

        let result = aggregator.search(&[SearchQuery::new("dev")]).await;
        assert_eq!(result.jobs.len(), 1);
        assert_eq!(result.sources[0].source, "down");
        assert_eq!(result.sources[0].kind, JobSourceKind::HtmlBoard);
        assert_eq!(result.sources[0].failed_queries, 1);
        assert_eq!(result.sources[1].jobs_found, 1);
    }

    #[tokio::test]
    async fn test_duplicates_across_sources_are_merged() {
        let aggregator = JobAggregator::new(
            vec![
                Arc::new(FakeSource::ok("a", vec![job("Dev", "Acme"), job("QA", "Acme")])),
                Arc::new(FakeSource::ok("b", vec![job("dev", "ACME")])),
            ],
            Duration::ZERO,
        );

        let result = aggregator.search(&[SearchQuery::new("dev")]).await;
        assert_eq!(result.total_before_dedup, 3);
        assert_eq!(result.jobs.len(), 2);
    }

    #[tokio::test]
    async fn test_each_query_hits_each_source() {
        let source = Arc::new(FakeSource::ok("a", vec![]));
        let aggregator = JobAggregator::new(vec![source.clone()], Duration::ZERO);

        aggregator
            .search(&[SearchQuery::new("one"), SearchQuery::new("two"), SearchQuery::new("three")])
            .await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_applies_between_queries() {
        let aggregator = JobAggregator::new(
            vec![Arc::new(FakeSource::ok("a", vec![]))],
            Duration::from_secs(2),
        );
        let started = tokio::time::Instant::now();
        aggregator
            .search(&[SearchQuery::new("one"), SearchQuery::new("two")])
            .await;
        assert!(started.elapsed() >= Duration::from_secs(2));
    }
}
