//! Fan-out/gather of per-parent detail fetches
//!
//! [`ConcurrentAggregator::aggregate`] fetches the parent list once, then
//! launches one detail fetch per parent, all at once and without a
//! concurrency cap. Each fetch runs on its own task and its outcome is
//! captured as a [`DetailResult`], so one failing (or panicking) fetch never
//! cancels its siblings. Results are returned sorted by parent identifier.
//! Dropping the `aggregate` future aborts the fetches still in flight.

mod summary;


pub use summary::AggregateSummary;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::AggregateError;
use crate::fetch::{DetailFetcher, ParentListFetcher};
use crate::types::{Detail, ParentEntity};

/// Outcome of one parent's detail fetch
#[derive(Clone, Debug, PartialEq)]
pub enum DetailResult {
    /// The detail was fetched
    Succeeded {
        /// Parent the detail was fetched for
        parent: ParentEntity,
        /// The fetched detail
        detail: Detail,
    },
    /// The fetch failed; siblings are unaffected
    Failed {
        /// Parent whose detail could not be fetched
        parent: ParentEntity,
        /// Failure description
        error: String,
    },
}

impl DetailResult {
    /// Parent this result belongs to
    pub fn parent(&self) -> &ParentEntity {
        match self {
            DetailResult::Succeeded { parent, .. } | DetailResult::Failed { parent, .. } => parent,
        }
    }

    /// The detail, if the fetch succeeded
    pub fn detail(&self) -> Option<&Detail> {
        match self {
            DetailResult::Succeeded { detail, .. } => Some(detail),
            DetailResult::Failed { .. } => None,
        }
    }

    /// Whether the fetch failed
    pub fn is_failed(&self) -> bool {
        matches!(self, DetailResult::Failed { .. })
    }
}

/// Fetches a parent list and the detail of every parent concurrently
#[derive(Clone)]
pub struct ConcurrentAggregator {
    parents: Arc<dyn ParentListFetcher>,
    details: Arc<dyn DetailFetcher>,
}

impl ConcurrentAggregator {
    /// Create an aggregator over the given fetchers
    pub fn new(parents: Arc<dyn ParentListFetcher>, details: Arc<dyn DetailFetcher>) -> Self {
        Self { parents, details }
    }

    /// Run one aggregation
    ///
    /// Returns exactly one [`DetailResult`] per parent, ascending by parent
    /// identifier. Parents sharing an identifier keep their list order.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::ListFetch`] if the parent list cannot be
    /// fetched. Per-parent failures are never returned as errors.
    pub async fn aggregate(&self) -> Result<Vec<DetailResult>, AggregateError> {
        let parents = self.parents.fetch_parents().await.map_err(|e| {
            warn!(error = %e, "parent list fetch failed");
            AggregateError::ListFetch(e)
        })?;
        debug!(parents = parents.len(), "fanning out detail fetches");

        // Every task is spawned before any is awaited. Dropping the set aborts
        // whatever is still running, so an abandoned aggregation leaves no
        // detail fetches behind.
        let mut tasks = JoinSet::new();
        let mut pending = HashMap::with_capacity(parents.len());
        for (index, parent) in parents.into_iter().enumerate() {
            let details = Arc::clone(&self.details);
            let key = parent.id.clone();
            let handle = tasks.spawn(async move { details.fetch_detail(&key).await });
            pending.insert(handle.id(), (index, parent));
        }

        let mut results = Vec::with_capacity(pending.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, outcome) = match joined {
                Ok((id, fetched)) => (id, Ok(fetched)),
                Err(e) => (e.id(), Err(e)),
            };
            let Some((index, parent)) = pending.remove(&id) else {
                continue;
            };
            let result = match outcome {
                Ok(Ok(detail)) => DetailResult::Succeeded { parent, detail },
                Ok(Err(e)) => {
                    warn!(parent = %parent.id, error = %e, "detail fetch failed");
                    DetailResult::Failed {
                        parent,
                        error: e.to_string(),
                    }
                }
                Err(e) => {
                    warn!(parent = %parent.id, error = %e, "detail task did not complete");
                    DetailResult::Failed {
                        parent,
                        error: format!("detail task failed: {e}"),
                    }
                }
            };
            results.push((index, result));
        }

        // Arrival order is arbitrary; ties on the identifier fall back to list order
        results.sort_by(|(ia, a), (ib, b)| {
            a.parent().id.cmp(&b.parent().id).then(ia.cmp(ib))
        });
        let results: Vec<DetailResult> = results.into_iter().map(|(_, r)| r).collect();

        info!(
            total = results.len(),
            failed = results.iter().filter(|r| r.is_failed()).count(),
            "aggregation complete"
        );
        Ok(results)
    }

    /// Run one aggregation and summarize it
    ///
    /// # Errors
    ///
    /// Same as [`aggregate`](Self::aggregate).
    pub async fn aggregate_with_summary(
        &self,
    ) -> Result<(Vec<DetailResult>, AggregateSummary), AggregateError> {
        let results = self.aggregate().await?;
        let summary = AggregateSummary::from_results(&results);
        Ok((results, summary))
    }
}
