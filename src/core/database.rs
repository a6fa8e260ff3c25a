use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde_json::Value;
use tracing::{debug, info};
use crate::analysis::analyzer::Analyzer;
use crate::core::config::EngineConfig;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::EngineStats;
use crate::core::types::{DocId, Document};
use crate::mvcc::controller::{Snapshot, SnapshotController};
use crate::query::ast::Query;
use crate::query::cache::{QueryCache, QueryKey};
use crate::query::evaluator::EvaluationSettings;
use crate::query::parser::QueryParser;
use crate::query::types::{QueryOptions, ValidationConfig};
use crate::reader::snapshot_reader::SnapshotReader;
use crate::scoring::scorer::{IdfScorer, Scorer};
use crate::search::results::QueryResponse;
use crate::storage::snapshot_file::{export_snapshot, import_snapshot};
use crate::writer::index_writer::IndexWriter;

/// Embedded query engine: one writer, any number of concurrent readers.
///
/// Every put or delete commits a new snapshot. Queries run against the
/// snapshot current when they start and never observe a half-applied write.
pub struct Database {
    config: EngineConfig,
    query_parser: QueryParser,
    scorer: Arc<dyn Scorer>,

    snapshots: Arc<SnapshotController>,
    writer: Mutex<IndexWriter>,
    query_cache: QueryCache,
    pool: ThreadPool,

    // Metrics
    start_time: Instant,
    query_count: AtomicU64,
    error_count: AtomicU64,
}

impl Database {
    /// In-memory engine with the default configuration.
    pub fn in_memory() -> Result<Self> {
        Self::open(EngineConfig::default())
    }

    pub fn open(config: EngineConfig) -> Result<Self> {
        Self::open_with_analyzer(config, Analyzer::standard())
    }

    /// The analyzer is shared by ingestion and query parsing, so literal and
    /// search values normalize exactly as indexed values do.
    pub fn open_with_analyzer(config: EngineConfig, analyzer: Analyzer) -> Result<Self> {
        let analyzer = Arc::new(analyzer);
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.worker_threads.max(1))
            .thread_name(|i| format!("facetdex-eval-{i}"))
            .build()
            .map_err(|e| Error::new(ErrorKind::Internal, format!("evaluation pool: {e}")))?;

        info!(
            workers = config.worker_threads.max(1),
            cache_capacity = config.cache_capacity,
            "opened engine"
        );

        Ok(Database {
            query_parser: QueryParser::new(analyzer.clone()),
            scorer: Arc::new(IdfScorer),
            snapshots: Arc::new(SnapshotController::new()),
            writer: Mutex::new(IndexWriter::new(analyzer)),
            query_cache: QueryCache::new(config.cache_capacity),
            pool,
            start_time: Instant::now(),
            query_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            config,
        })
    }

    /// Index documents and publish them; returns their ids in input order.
    pub fn put(&self, docs: Vec<Value>) -> Result<Vec<DocId>> {
        let mut writer = self.writer.lock();
        let ids = writer.put(docs)?;
        writer.commit(&self.snapshots);
        Ok(ids)
    }

    /// Delete documents by id and publish; returns how many existed.
    pub fn delete(&self, ids: &[DocId]) -> Result<usize> {
        let mut writer = self.writer.lock();
        let removed = writer.delete(ids);
        if removed > 0 {
            writer.commit(&self.snapshots);
        }
        Ok(removed)
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshots.current_snapshot()
    }

    /// A reader pinned to the current snapshot.
    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader::new(
            self.snapshot(),
            self.scorer.clone(),
            EvaluationSettings::from(&self.config),
            ValidationConfig::from(&self.config),
        )
    }

    pub fn parse(&self, query: &Value) -> Result<Query> {
        self.query_parser.parse(query)
    }

    /// Evaluate a query tree against the current snapshot.
    pub fn evaluate(&self, query: &Query, options: &QueryOptions) -> Result<QueryResponse> {
        let reader = self.reader();
        let key = self.query_cache
            .is_enabled()
            .then(|| QueryKey::new(reader.version(), query, options));
        if let Some(cached) = key.as_ref().and_then(|key| self.query_cache.get(key)) {
            debug!(kind = query.kind(), version = reader.version(), "query cache hit");
            self.query_count.fetch_add(1, Ordering::Relaxed);
            return Ok(cached);
        }

        let result = self.pool.install(|| reader.evaluate(query, options));
        self.query_count.fetch_add(1, Ordering::Relaxed);
        match result {
            Ok(response) => {
                if let Some(key) = key {
                    self.query_cache.put(key, response.clone());
                }
                Ok(response)
            }
            Err(err) => {
                self.error_count.fetch_add(1, Ordering::Relaxed);
                Err(err)
            }
        }
    }

    /// Parse a JSON query and evaluate it.
    pub fn query(&self, query: &Value, options: &QueryOptions) -> Result<QueryResponse> {
        let query = self.parse(query)?;
        self.evaluate(&query, options)
    }

    /// Evaluate on tokio's blocking pool. Dropping the future discards the result.
    pub async fn evaluate_async(
        self: &Arc<Self>,
        query: Query,
        options: QueryOptions,
    ) -> Result<QueryResponse> {
        let db = Arc::clone(self);
        tokio::task::spawn_blocking(move || db.evaluate(&query, &options))
            .await
            .map_err(|e| Error::new(ErrorKind::Internal, format!("evaluation task failed: {e}")))?
    }

    /// Indexed field names, sorted.
    pub fn fields(&self) -> Vec<String> {
        self.snapshot().index.fields().map(str::to_string).collect()
    }

    pub fn document_count(&self) -> usize {
        self.snapshot().doc_count()
    }

    /// Stored documents for `ids`; unknown ids are skipped.
    pub fn documents(&self, ids: &[DocId]) -> Vec<Document> {
        let reader = self.reader();
        ids.iter().filter_map(|id| reader.get_document(id)).collect()
    }

    /// Smallest indexed value of `field`.
    pub fn min(&self, field: &str) -> Option<String> {
        self.snapshot().index.values(field).next().map(str::to_string)
    }

    /// Largest indexed value of `field`.
    pub fn max(&self, field: &str) -> Option<String> {
        self.snapshot().index.values(field).last().map(str::to_string)
    }

    /// Write the current snapshot to `path`; returns bytes written.
    pub fn export<P: AsRef<Path>>(&self, path: P) -> Result<u64> {
        export_snapshot(&self.snapshot(), path)
    }

    /// Replace all state with an export and publish it.
    pub fn import<P: AsRef<Path>>(&self, path: P) -> Result<Arc<Snapshot>> {
        let loaded = import_snapshot(path)?;
        let mut writer = self.writer.lock();
        writer.replace_state(loaded.index, loaded.text, loaded.term_stats, loaded.documents);
        Ok(writer.commit(&self.snapshots))
    }

    pub fn stats(&self) -> EngineStats {
        let snapshot = self.snapshot();
        EngineStats {
            uptime_secs: self.start_time.elapsed().as_secs(),
            snapshot_version: snapshot.version,
            snapshot_timestamp: snapshot.timestamp,
            document_count: snapshot.doc_count(),
            field_count: snapshot.index.field_count(),
            posting_count: snapshot.index.posting_count(),
            term_count: snapshot.term_stats.term_count(),
            queries_evaluated: self.query_count.load(Ordering::Relaxed),
            query_errors: self.error_count.load(Ordering::Relaxed),
            cache_stats: self.query_cache.stats(),
            pending_writes: self.writer.lock().pending(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn parser(&self) -> &QueryParser {
        &self.query_parser
    }
}
