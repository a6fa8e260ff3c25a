use std::sync::Arc;
use crate::core::error::Result;
use crate::core::types::{DocId, Document};
use crate::mvcc::controller::Snapshot;
use crate::query::ast::Query;
use crate::query::evaluator::{EvaluationSettings, Evaluator};
use crate::query::types::{QueryOptions, QueryValidator, ValidationConfig};
use crate::scoring::scorer::Scorer;
use crate::search::formatter::ResultFormatter;
use crate::search::results::{EvalResult, QueryResponse};

/// Reader for a specific snapshot.
///
/// Holding a reader pins its snapshot: later publishes never change what
/// it sees.
#[derive(Clone)]
pub struct SnapshotReader {
    snapshot: Arc<Snapshot>,
    scorer: Arc<dyn Scorer>,
    settings: EvaluationSettings,
    validation: ValidationConfig,
}

impl SnapshotReader {
    pub fn new(
        snapshot: Arc<Snapshot>,
        scorer: Arc<dyn Scorer>,
        settings: EvaluationSettings,
        validation: ValidationConfig,
    ) -> Self {
        SnapshotReader {
            snapshot,
            scorer,
            settings,
            validation,
        }
    }

    pub fn version(&self) -> u64 {
        self.snapshot.version
    }

    pub fn snapshot(&self) -> &Arc<Snapshot> {
        &self.snapshot
    }

    /// Validate, evaluate and format one query.
    pub fn evaluate(&self, query: &Query, options: &QueryOptions) -> Result<QueryResponse> {
        let result = self.evaluate_raw(query)?;
        ResultFormatter::new(&self.snapshot.documents).format(result, options)
    }

    /// Internal result shape, before formatting.
    pub fn evaluate_raw(&self, query: &Query) -> Result<EvalResult> {
        QueryValidator::new(self.validation.clone()).validate(query)?;
        Evaluator::new(&self.snapshot, self.scorer.as_ref(), self.settings).evaluate(query)
    }

    pub fn get_document(&self, id: &DocId) -> Option<Document> {
        self.snapshot
            .documents
            .get(id)
            .map(|source| Document::new(id.clone(), source.clone()))
    }
}
