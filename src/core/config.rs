use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::core::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cache_capacity: usize,                 // Cached responses, 0 disables the cache
    pub parallel_threshold: usize,             // AND/OR children count that triggers rayon
    pub worker_threads: usize,                 // Evaluation thread pool size

    pub max_query_depth: usize,
    pub max_clauses: usize,                    // Per AND/OR/SEARCH node

    pub search_requires_all_terms: bool,       // Multi-term SEARCH is conjunctive
    pub batch_size: usize,                     // BatchWriter commit interval in documents
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            cache_capacity: 1000,
            parallel_threshold: 4,
            worker_threads: num_cpus::get(),

            max_query_depth: 32,
            max_clauses: 1024,

            search_requires_all_terms: true,
            batch_size: 1000,
        }
    }
}

impl EngineConfig {
    /// Load a config from a JSON file; missing keys take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let config = serde_json::from_str(&data)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"cache_capacity": 0}"#).unwrap();
        assert_eq!(config.cache_capacity, 0);
        assert_eq!(config.max_query_depth, 32);
        assert!(config.search_requires_all_terms);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        fs::write(&path, r#"{"parallel_threshold": 2, "search_requires_all_terms": false}"#).unwrap();

        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.parallel_threshold, 2);
        assert!(!config.search_requires_all_terms);
    }
}
