use tracing::warn;
use crate::core::error::Result;
use crate::index::document_store::DocumentStore;
use crate::query::types::QueryOptions;
use crate::scoring::scorer::round_score;
use crate::search::results::{
    BucketBounds, BucketHit, BucketRecord, DocumentHit, EvalResult, FieldMatch, MatchRecord,
    QueryResponse,
};

/// Turns internal evaluation results into the public response shapes.
pub struct ResultFormatter<'a> {
    documents: &'a DocumentStore,
}

impl<'a> ResultFormatter<'a> {
    pub fn new(documents: &'a DocumentStore) -> Self {
        ResultFormatter { documents }
    }

    /// Paging applies before hydration, so only returned entries are fetched.
    pub fn format(&self, result: EvalResult, options: &QueryOptions) -> Result<QueryResponse> {
        let response = match result {
            EvalResult::Matches(records) => {
                let records = paginate(records, options);
                QueryResponse::Documents(self.documents(records, options.hydrate_documents)?)
            }
            EvalResult::Bucket(bucket) => QueryResponse::Bucket(bucket_hit(bucket)),
            EvalResult::Buckets(buckets) => QueryResponse::Buckets(
                paginate(buckets, options).into_iter().map(bucket_hit).collect(),
            ),
            EvalResult::Values(values) => QueryResponse::Values(values),
            EvalResult::FieldValues(values) => QueryResponse::Distinct(values),
        };
        Ok(response)
    }

    fn documents(&self, records: Vec<MatchRecord>, hydrate: bool) -> Result<Vec<DocumentHit>> {
        records
            .into_iter()
            .map(|record| -> Result<DocumentHit> {
                let doc = if hydrate {
                    let source = self.documents.fetch(&record.id).inspect_err(|err| {
                        warn!(id = %record.id, error = %err, "posting without a stored document");
                    })?;
                    Some(source.clone())
                } else {
                    None
                };

                Ok(DocumentHit {
                    id: record.id.to_string(),
                    matches: record.matches.iter().map(FieldMatch::render).collect(),
                    score: record.score.map(round_score),
                    doc,
                })
            })
            .collect()
    }
}

fn bucket_hit(bucket: BucketRecord) -> BucketHit {
    BucketHit {
        field: bucket.field,
        value: BucketBounds {
            gte: bucket.range.low,
            lte: bucket.range.high,
        },
        ids: bucket.ids.iter().map(ToString::to_string).collect(),
    }
}

fn paginate<T>(mut items: Vec<T>, options: &QueryOptions) -> Vec<T> {
    match options.page {
        Some(page) => {
            let (start, end) = page.bounds(items.len());
            items.truncate(end);
            items.drain(..start);
            items
        }
        None => items,
    }
}
