use std::collections::BTreeSet;
use std::sync::Arc;
use rayon::prelude::*;
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;
use crate::analysis::analyzer::Analyzer;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;
use crate::index::document_store::DocumentStore;
use crate::index::inverted::InvertedIndex;
use crate::index::term_stats::TermStatistics;
use crate::mvcc::controller::{Snapshot, SnapshotController};

const ID_FIELD: &str = "_id";

/// Batches above this size are analyzed on the rayon pool.
const PARALLEL_ANALYSIS_THRESHOLD: usize = 100;

/// Single writer over a private working state.
///
/// Every scalar lands in two posting spaces: `index` keys it by the whole
/// normalized value, `text` by each analyzed token. Nothing written here is
/// visible to queries until `commit` freezes the working state into a
/// published snapshot.
pub struct IndexWriter {
    analyzer: Arc<Analyzer>,
    index: InvertedIndex,
    text: InvertedIndex,
    term_stats: TermStatistics,
    documents: DocumentStore,
    pending: usize,
}

/// A document analyzed and ready to be applied.
#[derive(Debug)]
struct PreparedDocument {
    id: DocId,
    source: Value,
    fields: AnalyzedFields,
}

/// Postings one document contributes.
#[derive(Debug, Default)]
struct AnalyzedFields {
    values: Vec<(String, String)>,
    tokens: Vec<(String, String)>,
    terms: BTreeSet<String>,
}

impl IndexWriter {
    pub fn new(analyzer: Arc<Analyzer>) -> Self {
        IndexWriter {
            analyzer,
            index: InvertedIndex::new(),
            text: InvertedIndex::new(),
            term_stats: TermStatistics::new(),
            documents: DocumentStore::new(),
            pending: 0,
        }
    }

    /// Index JSON documents, replacing any with an existing id.
    ///
    /// The batch is validated and analyzed up front; a rejected document
    /// leaves the working state untouched.
    pub fn put(&mut self, docs: Vec<Value>) -> Result<Vec<DocId>> {
        let analyzer = self.analyzer.as_ref();
        let prepared: Vec<PreparedDocument> = if docs.len() > PARALLEL_ANALYSIS_THRESHOLD {
            docs.into_par_iter().map(|doc| prepare(analyzer, doc)).collect::<Result<_>>()?
        } else {
            docs.into_iter().map(|doc| prepare(analyzer, doc)).collect::<Result<_>>()?
        };

        let mut ids = Vec::with_capacity(prepared.len());
        for doc in prepared {
            self.remove_document(&doc.id);
            for (field, value) in &doc.fields.values {
                self.index.insert(field, value, doc.id.clone());
            }
            for (field, token) in &doc.fields.tokens {
                self.text.insert(field, token, doc.id.clone());
            }
            self.term_stats.add_document(doc.fields.terms.iter().map(String::as_str));
            self.documents.insert(doc.id.clone(), doc.source);
            ids.push(doc.id);
        }

        self.pending += ids.len();
        debug!(documents = ids.len(), pending = self.pending, "indexed documents");
        Ok(ids)
    }

    /// Remove documents by id; returns how many existed.
    pub fn delete(&mut self, ids: &[DocId]) -> usize {
        let removed = ids.iter().filter(|id| self.remove_document(id)).count();
        self.pending += removed;
        debug!(requested = ids.len(), removed, "deleted documents");
        removed
    }

    /// Freeze the working state into a new published snapshot.
    pub fn commit(&mut self, controller: &SnapshotController) -> Arc<Snapshot> {
        self.pending = 0;
        controller.publish(
            self.index.clone(),
            self.text.clone(),
            self.term_stats.clone(),
            self.documents.clone(),
        )
    }

    /// Swap in state loaded from elsewhere, discarding uncommitted changes.
    pub fn replace_state(
        &mut self,
        index: InvertedIndex,
        text: InvertedIndex,
        term_stats: TermStatistics,
        documents: DocumentStore,
    ) {
        self.index = index;
        self.text = text;
        self.term_stats = term_stats;
        self.documents = documents;
        self.pending = 0;
    }

    /// Changes since the last commit.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    fn remove_document(&mut self, id: &DocId) -> bool {
        let Some(source) = self.documents.remove(id) else {
            return false;
        };
        // Analysis is deterministic, so re-deriving the postings finds exactly
        // what the document contributed.
        let fields = analyze_fields(&self.analyzer, &source);
        for (field, value) in &fields.values {
            self.index.remove(field, value, id);
        }
        for (field, token) in &fields.tokens {
            self.text.remove(field, token, id);
        }
        self.term_stats.remove_document(fields.terms.iter().map(String::as_str));
        true
    }
}

fn prepare(analyzer: &Analyzer, doc: Value) -> Result<PreparedDocument> {
    let Value::Object(mut source) = doc else {
        return Err(Error::new(
            ErrorKind::InvalidDocument,
            "documents must be JSON objects",
        ));
    };

    let id = match source.get(ID_FIELD) {
        Some(value) => DocId::from_json(value)?,
        None => {
            let id = DocId::new(Uuid::new_v4().to_string());
            source.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
            id
        }
    };

    let source = Value::Object(source);
    let fields = analyze_fields(analyzer, &source);
    Ok(PreparedDocument { id, source, fields })
}

/// Whole-value and token postings of a document plus its distinct tokens.
fn analyze_fields(analyzer: &Analyzer, source: &Value) -> AnalyzedFields {
    let mut scalars = Vec::new();
    if let Value::Object(map) = source {
        flatten_object("", map, &mut scalars);
    }

    let mut fields = AnalyzedFields::default();
    for (field, text) in scalars {
        if let Some(value) = analyzer.normalize(&text) {
            fields.values.push((field.clone(), value));
        }
        for token in analyzer.terms(&text) {
            fields.terms.insert(token.clone());
            fields.tokens.push((field.clone(), token));
        }
    }
    fields.values.sort();
    fields.values.dedup();
    fields.tokens.sort();
    fields.tokens.dedup();
    fields
}

fn flatten_object(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, value) in map {
        if prefix.is_empty() && key == ID_FIELD {
            continue;
        }
        let field = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        flatten_value(&field, value, out);
    }
}

/// Nested objects become dotted names; arrays index every element.
fn flatten_value(field: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => flatten_object(field, map, out),
        Value::Array(items) => {
            for item in items {
                flatten_value(field, item, out);
            }
        }
        Value::String(text) => out.push((field.to_string(), text.clone())),
        Value::Number(number) => out.push((field.to_string(), number.to_string())),
        Value::Bool(flag) => out.push((field.to_string(), flag.to_string())),
        Value::Null => {}
    }
}
