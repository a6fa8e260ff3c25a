use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::query::cache::CacheStats;

/// Engine statistics for monitoring
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub uptime_secs: u64,

    // Current snapshot
    pub snapshot_version: u64,
    pub snapshot_timestamp: DateTime<Utc>,
    pub document_count: usize,
    pub field_count: usize,
    pub posting_count: usize,
    pub term_count: usize,

    // Query metrics
    pub queries_evaluated: u64,
    pub query_errors: u64,
    pub cache_stats: CacheStats,

    // Write metrics
    pub pending_writes: usize,
}
