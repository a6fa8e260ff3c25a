use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use chrono::{DateTime, Utc};
use tracing::info;
use crate::index::document_store::DocumentStore;
use crate::index::inverted::InvertedIndex;
use crate::index::term_stats::TermStatistics;

/// Frozen, read-only view of the index at one point in time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub version: u64,
    pub timestamp: DateTime<Utc>,
    /// Whole normalized field values: exact matches, buckets and facets.
    pub index: InvertedIndex,
    /// Analyzed word tokens per field, searched by SEARCH.
    pub text: InvertedIndex,
    pub term_stats: TermStatistics,
    pub documents: DocumentStore,
}

impl Snapshot {
    pub fn doc_count(&self) -> usize {
        self.documents.len()
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot {
            version: 0,
            timestamp: Utc::now(),
            index: InvertedIndex::new(),
            text: InvertedIndex::new(),
            term_stats: TermStatistics::new(),
            documents: DocumentStore::new(),
        }
    }
}

/// Publishes snapshots and hands the current one to readers.
///
/// Publishing swaps an `Arc`; readers that already hold the previous
/// snapshot keep evaluating against it untouched, and it is freed once the
/// last of them lets go.
pub struct SnapshotController {
    current: RwLock<Arc<Snapshot>>,
    next_version: AtomicU64,
}

impl SnapshotController {
    pub fn new() -> Self {
        SnapshotController {
            current: RwLock::new(Arc::new(Snapshot::default())),
            next_version: AtomicU64::new(1),
        }
    }

    pub fn publish(
        &self,
        index: InvertedIndex,
        text: InvertedIndex,
        term_stats: TermStatistics,
        documents: DocumentStore,
    ) -> Arc<Snapshot> {
        let version = self.next_version.fetch_add(1, Ordering::SeqCst);

        let snapshot = Arc::new(Snapshot {
            version,
            timestamp: Utc::now(),
            index,
            text,
            term_stats,
            documents,
        });
        *self.current.write() = snapshot.clone();

        info!(
            version,
            docs = snapshot.doc_count(),
            postings = snapshot.index.posting_count(),
            "published snapshot"
        );
        snapshot
    }

    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }
}

impl Default for SnapshotController {
    fn default() -> Self {
        Self::new()
    }
}
