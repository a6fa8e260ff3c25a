use std::collections::HashMap;
use serde::{Deserialize, Serialize};

/// Document-level term frequencies shared by every field.
///
/// A token counts once per document no matter how many fields carry it,
/// which is what the SEARCH idf is computed against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermStatistics {
    doc_freq: HashMap<String, u32>,
    total_docs: u32,
}

impl TermStatistics {
    pub fn new() -> Self {
        TermStatistics {
            doc_freq: HashMap::new(),
            total_docs: 0,
        }
    }

    /// Record one newly ingested document and its distinct tokens.
    pub fn add_document<'a, I>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for token in tokens {
            *self.doc_freq.entry(token.to_string()).or_insert(0) += 1;
        }
        self.total_docs += 1;
    }

    /// Undo `add_document` for a document being deleted or replaced.
    pub fn remove_document<'a, I>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for token in tokens {
            if let Some(freq) = self.doc_freq.get_mut(token) {
                *freq = freq.saturating_sub(1);
                if *freq == 0 {
                    self.doc_freq.remove(token);
                }
            }
        }
        self.total_docs = self.total_docs.saturating_sub(1);
    }

    pub fn doc_freq(&self, term: &str) -> u32 {
        self.doc_freq.get(term).copied().unwrap_or(0)
    }

    pub fn total_docs(&self) -> u32 {
        self.total_docs
    }

    pub fn term_count(&self) -> usize {
        self.doc_freq.len()
    }

    /// `log2(N / df)`; zero when the term is unknown.
    pub fn idf(&self, term: &str) -> f64 {
        let df = self.doc_freq(term);
        if df == 0 || self.total_docs == 0 {
            return 0.0;
        }
        (self.total_docs as f64 / df as f64).log2()
    }
}
