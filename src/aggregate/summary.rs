//! Values derived from an aggregation result set

use serde::Serialize;

use super::DetailResult;

/// Totals over a set of [`DetailResult`]s
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct AggregateSummary {
    /// Sum of `detail.value * parent.quantity` over succeeded entries
    pub total_value: f64,
    /// Number of succeeded entries
    pub succeeded: usize,
    /// Number of failed entries
    pub failed: usize,
}

impl AggregateSummary {
    /// Summarize a result set
    pub fn from_results(results: &[DetailResult]) -> Self {
        results
            .iter()
            .fold(Self::default(), |mut summary, result| {
                match result {
                    DetailResult::Succeeded { parent, detail } => {
                        summary.total_value += detail.value * parent.quantity;
                        summary.succeeded += 1;
                    }
                    DetailResult::Failed { .. } => summary.failed += 1,
                }
                summary
            })
    }

    /// Whether any entry failed
    pub fn partial_failure(&self) -> bool {
        self.failed > 0
    }

    /// Total number of entries
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Detail, ParentEntity, ParentId};

    fn succeeded(id: &str, quantity: f64, value: f64) -> DetailResult {
        DetailResult::Succeeded {
            parent: ParentEntity::new(id, id, quantity),
            detail: Detail {
                key: ParentId::new(id),
                value,
            },
        }
    }

    #[test]
    fn totals_only_count_succeeded_entries() {
        let results = vec![
            succeeded("AAPL", 10.0, 150.0),
            DetailResult::Failed {
                parent: ParentEntity::new("BRK", "Berkshire", 2.0),
                error: "timeout".into(),
            },
            succeeded("MSFT", 5.0, 300.0),
        ];

        let summary = AggregateSummary::from_results(&results);
        assert_eq!(summary.total_value, 3000.0);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total(), 3);
        assert!(summary.partial_failure());
    }

    #[test]
    fn empty_result_set_has_no_partial_failure() {
        let summary = AggregateSummary::from_results(&[]);
        assert_eq!(summary, AggregateSummary::default());
        assert!(!summary.partial_failure());
    }
}
