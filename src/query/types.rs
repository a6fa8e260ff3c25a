use serde::{Deserialize, Serialize};
use tracing::warn;
use crate::core::config::EngineConfig;
use crate::core::error::{Error, Result};
use crate::query::ast::{BucketSource, Query};

/// Caller options for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Attach source documents under `_doc`
    #[serde(alias = "DOCUMENTS", alias = "hydrateDocuments")]
    pub hydrate_documents: bool,
    #[serde(alias = "PAGE")]
    pub page: Option<Page>,
}

/// Zero-based page of a document-match or bucket array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Page {
    #[serde(alias = "NUMBER")]
    pub number: usize,
    #[serde(alias = "SIZE")]
    pub size: usize,
}

impl QueryOptions {
    pub fn with_documents() -> Self {
        QueryOptions {
            hydrate_documents: true,
            page: None,
        }
    }

    pub fn paged(mut self, number: usize, size: usize) -> Self {
        self.page = Some(Page { number, size });
        self
    }
}

impl Page {
    /// Slice bounds for a result of `len` entries.
    pub fn bounds(&self, len: usize) -> (usize, usize) {
        let start = self.number.saturating_mul(self.size).min(len);
        let end = start.saturating_add(self.size).min(len);
        (start, end)
    }
}

/// Query validation configuration
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    pub max_query_depth: usize,
    pub max_clauses: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ValidationConfig {
            max_query_depth: 32,
            max_clauses: 1024,
        }
    }
}

impl From<&EngineConfig> for ValidationConfig {
    fn from(config: &EngineConfig) -> Self {
        ValidationConfig {
            max_query_depth: config.max_query_depth,
            max_clauses: config.max_clauses,
        }
    }
}

/// Rejects trees too deep or too wide to evaluate.
pub struct QueryValidator {
    config: ValidationConfig,
}

impl QueryValidator {
    pub fn new(config: ValidationConfig) -> Self {
        QueryValidator { config }
    }

    pub fn validate(&self, query: &Query) -> Result<()> {
        self.validate_node(query, 1)
    }

    fn validate_node(&self, query: &Query, depth: usize) -> Result<()> {
        if depth > self.config.max_query_depth {
            warn!(depth, max = self.config.max_query_depth, "query rejected: too deep");
            return Err(Error::malformed(format!(
                "query depth {} exceeds maximum {}",
                depth, self.config.max_query_depth
            )));
        }

        let clauses = match query {
            Query::And(children) | Query::Or(children) => children.len(),
            Query::Search(search) => search.terms.len(),
            Query::BucketFilter(bf) => match &bf.buckets {
                BucketSource::Literal(specs) => specs.len(),
                BucketSource::Query(_) => 0,
            },
            _ => 0,
        };
        if clauses > self.config.max_clauses {
            warn!(clauses, max = self.config.max_clauses, kind = query.kind(), "query rejected: too many clauses");
            return Err(Error::malformed(format!(
                "{} has {} clauses, max is {}",
                query.kind(), clauses, self.config.max_clauses
            )));
        }

        for child in query.children() {
            self.validate_node(child, depth + 1)?;
        }
        Ok(())
    }
}
