use std::collections::HashMap;
use serde_json::Value;
use crate::core::error::{Error, Result};
use crate::core::types::DocId;

/// Id -> original source document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentStore {
    docs: HashMap<DocId, Value>,
}

impl DocumentStore {
    pub fn new() -> Self {
        DocumentStore {
            docs: HashMap::new(),
        }
    }

    pub fn insert(&mut self, id: DocId, source: Value) -> Option<Value> {
        self.docs.insert(id, source)
    }

    pub fn remove(&mut self, id: &DocId) -> Option<Value> {
        self.docs.remove(id)
    }

    pub fn get(&self, id: &DocId) -> Option<&Value> {
        self.docs.get(id)
    }

    /// Lookup for ids reached through a posting: a miss means the index and
    /// the store have diverged.
    pub fn fetch(&self, id: &DocId) -> Result<&Value> {
        self.docs.get(id).ok_or_else(|| {
            Error::inconsistent(format!("document {} is indexed but missing from the document store", id))
        })
    }

    pub fn contains(&self, id: &DocId) -> bool {
        self.docs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Ids in DocId order.
    pub fn ids(&self) -> Vec<DocId> {
        let mut ids: Vec<DocId> = self.docs.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DocId, &Value)> {
        self.docs.iter()
    }
}
