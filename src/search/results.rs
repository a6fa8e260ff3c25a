use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::core::types::{DocId, ValueRange};

/// Weight of an exact (field, value) posting hit.
pub const EXACT_MATCH_WEIGHT: f64 = 1.0;

/// One matched (field, value) posting inside a match record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMatch {
    pub field: String,
    pub value: String,
    pub weight: f64,
}

impl FieldMatch {
    pub fn exact(field: impl Into<String>, value: impl Into<String>) -> Self {
        FieldMatch {
            field: field.into(),
            value: value.into(),
            weight: EXACT_MATCH_WEIGHT,
        }
    }

    /// `field:value#weight`, weight with two decimals.
    pub fn render(&self) -> String {
        format!("{}:{}#{:.2}", self.field, self.value, self.weight)
    }
}

/// Internal result of a match-shaped node.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub id: DocId,
    pub matches: Vec<FieldMatch>,
    pub score: Option<f64>,     // Search only, full precision
}

impl MatchRecord {
    pub fn new(id: DocId, matches: Vec<FieldMatch>) -> Self {
        MatchRecord { id, matches, score: None }
    }
}

/// Internal result of a bucket-shaped node. `ids` is sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketRecord {
    pub field: String,
    pub range: ValueRange,
    pub ids: Vec<DocId>,
}

/// Distinct value of one field, also the public Distinct shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DistinctValue {
    pub field: String,
    pub value: String,
}

/// Closed set of shapes a query node can evaluate to.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalResult {
    Matches(Vec<MatchRecord>),
    Bucket(BucketRecord),
    Buckets(Vec<BucketRecord>),
    Values(Vec<String>),
    FieldValues(Vec<DistinctValue>),
}

impl EvalResult {
    pub fn shape(&self) -> &'static str {
        match self {
            EvalResult::Matches(_) => "document matches",
            EvalResult::Bucket(_) => "a bucket",
            EvalResult::Buckets(_) => "buckets",
            EvalResult::Values(_) => "values",
            EvalResult::FieldValues(_) => "field values",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            EvalResult::Matches(records) => records.len(),
            EvalResult::Bucket(_) => 1,
            EvalResult::Buckets(buckets) => buckets.len(),
            EvalResult::Values(values) => values.len(),
            EvalResult::FieldValues(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Public document-match entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentHit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_match")]
    pub matches: Vec<String>,
    #[serde(rename = "_score", default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(rename = "_doc", default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketBounds {
    pub gte: String,
    pub lte: String,
}

/// Public bucket entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketHit {
    pub field: String,
    pub value: BucketBounds,
    #[serde(rename = "_id")]
    pub ids: Vec<String>,
}

/// What an evaluation hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Documents(Vec<DocumentHit>),
    Bucket(BucketHit),
    Buckets(Vec<BucketHit>),
    Values(Vec<String>),
    Distinct(Vec<DistinctValue>),
}

impl QueryResponse {
    pub fn len(&self) -> usize {
        match self {
            QueryResponse::Documents(hits) => hits.len(),
            QueryResponse::Bucket(_) => 1,
            QueryResponse::Buckets(buckets) => buckets.len(),
            QueryResponse::Values(values) => values.len(),
            QueryResponse::Distinct(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn documents(&self) -> Option<&[DocumentHit]> {
        match self {
            QueryResponse::Documents(hits) => Some(hits),
            _ => None,
        }
    }

    /// Bucket entries; a lone BUCKET answer reads as a one-element slice.
    pub fn buckets(&self) -> Option<&[BucketHit]> {
        match self {
            QueryResponse::Bucket(bucket) => Some(std::slice::from_ref(bucket)),
            QueryResponse::Buckets(buckets) => Some(buckets),
            _ => None,
        }
    }

    /// Ids of a document-match response, in response order.
    pub fn ids(&self) -> Vec<&str> {
        self.documents()
            .map(|hits| hits.iter().map(|hit| hit.id.as_str()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn match_strings_carry_two_decimals() {
        assert_eq!(FieldMatch::exact("make", "volvo").render(), "make:volvo#1.00");
    }

    #[test]
    fn score_and_doc_are_omitted_when_absent() {
        let hit = DocumentHit {
            id: "8".to_string(),
            matches: vec!["make:tesla#1.00".to_string()],
            score: None,
            doc: None,
        };
        assert_eq!(
            serde_json::to_value(&hit).unwrap(),
            json!({"_id": "8", "_match": ["make:tesla#1.00"]})
        );
    }

    #[test]
    fn responses_serialize_untagged() {
        let hit = BucketHit {
            field: "make".to_string(),
            value: BucketBounds { gte: "bmw".to_string(), lte: "bmw".to_string() },
            ids: vec!["7".to_string()],
        };
        let buckets = QueryResponse::Buckets(vec![hit.clone()]);
        assert_eq!(
            serde_json::to_value(&buckets).unwrap(),
            json!([{"field": "make", "value": {"gte": "bmw", "lte": "bmw"}, "_id": ["7"]}])
        );

        let single = QueryResponse::Bucket(hit);
        assert_eq!(
            serde_json::to_value(&single).unwrap(),
            json!({"field": "make", "value": {"gte": "bmw", "lte": "bmw"}, "_id": ["7"]})
        );
        assert_eq!(single.buckets().unwrap(), buckets.buckets().unwrap());

        let values = QueryResponse::Values(vec!["bmw".to_string()]);
        assert_eq!(serde_json::to_value(&values).unwrap(), json!(["bmw"]));
    }
}
