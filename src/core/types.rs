use serde::{Serialize, Deserialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use crate::core::error::{Error, ErrorKind, Result};

/// Canonical document identifier.
///
/// Identifiers that are canonical unsigned integers order numerically and ahead
/// of every other identifier; the rest order by their UTF-8 bytes. Every
/// posting, bucket and result list in the crate relies on this one ordering.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DocId {
    text: Arc<str>,
    numeric: Option<u64>,
}

impl DocId {
    pub fn new(id: impl AsRef<str>) -> Self {
        let text: Arc<str> = Arc::from(id.as_ref());
        let numeric = canonical_number(&text);
        DocId { text, numeric }
    }

    /// Canonicalize the `_id` carried by a source document.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(DocId::new(s)),
            Value::Number(n) => Ok(DocId::new(n.to_string())),
            other => Err(Error::new(
                ErrorKind::InvalidDocument,
                format!("_id must be a string or a number, got {}", other),
            )),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric.is_some()
    }
}

fn canonical_number(text: &str) -> Option<u64> {
    let bytes = text.as_bytes();
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    text.parse().ok()
}

impl PartialEq for DocId {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for DocId {}

impl Hash for DocId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl PartialOrd for DocId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DocId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric, other.numeric) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.text.as_bytes().cmp(other.text.as_bytes()),
        }
    }
}

impl fmt::Debug for DocId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DocId({:?})", &*self.text)
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<String> for DocId {
    fn from(id: String) -> Self {
        DocId::new(id)
    }
}

impl From<&str> for DocId {
    fn from(id: &str) -> Self {
        DocId::new(id)
    }
}

impl From<u64> for DocId {
    fn from(id: u64) -> Self {
        DocId::new(id.to_string())
    }
}

impl From<DocId> for String {
    fn from(id: DocId) -> Self {
        id.text.to_string()
    }
}

/// A source document as it was handed to ingestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: DocId,
    pub source: Value,
}

impl Document {
    pub fn new(id: DocId, source: Value) -> Self {
        Document { id, source }
    }
}

/// Inclusive range over normalized values; a single value has `low == high`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueRange {
    pub low: String,
    pub high: String,
}

impl ValueRange {
    pub fn exact(value: impl Into<String>) -> Self {
        let value = value.into();
        ValueRange { low: value.clone(), high: value }
    }

    pub fn between(low: impl Into<String>, high: impl Into<String>) -> Self {
        ValueRange { low: low.into(), high: high.into() }
    }

    pub fn is_exact(&self) -> bool {
        self.low == self.high
    }

    pub fn is_empty(&self) -> bool {
        self.low > self.high
    }

    pub fn contains(&self, value: &str) -> bool {
        self.low.as_str() <= value && value <= self.high.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_ids_order_numerically() {
        let mut ids: Vec<DocId> = ["10", "9", "100", "0"].into_iter().map(DocId::from).collect();
        ids.sort();
        let ordered: Vec<&str> = ids.iter().map(DocId::as_str).collect();
        assert_eq!(ordered, vec!["0", "9", "10", "100"]);
    }

    #[test]
    fn text_ids_sort_after_numbers() {
        let mut ids: Vec<DocId> = ["b", "7", "a", "007"].into_iter().map(DocId::from).collect();
        ids.sort();
        let ordered: Vec<&str> = ids.iter().map(DocId::as_str).collect();
        assert_eq!(ordered, vec!["7", "007", "a", "b"]);
    }

    #[test]
    fn json_ids_are_canonicalized() {
        assert_eq!(DocId::from_json(&json!(8)).unwrap().as_str(), "8");
        assert_eq!(DocId::from_json(&json!("car-1")).unwrap().as_str(), "car-1");
        assert!(DocId::from_json(&json!(true)).is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = DocId::from(42u64);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
        let back: DocId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(back, id);
        assert!(back.is_numeric());
    }

    #[test]
    fn value_ranges() {
        let range = ValueRange::between("b", "m");
        assert!(range.contains("bmw"));
        assert!(!range.contains("tesla"));
        assert!(!range.is_exact());
        assert!(ValueRange::exact("volvo").is_exact());
        assert!(ValueRange::between("z", "a").is_empty());
    }
}
