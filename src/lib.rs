pub mod core;
pub mod storage;
pub mod analysis;
pub mod index;
pub mod scoring;
pub mod search;
pub mod query;
pub mod mvcc;
pub mod writer;
pub mod reader;

pub use crate::core::config::EngineConfig;
pub use crate::core::database::Database;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::types::{DocId, Document, ValueRange};
pub use crate::query::ast::Query;
pub use crate::query::types::{Page, QueryOptions};
pub use crate::search::results::{BucketHit, DistinctValue, DocumentHit, QueryResponse};
pub use crate::writer::batch::BatchWriter;

/*
┌──────────────────────────────────────────────────────────────────────────────┐
│                          FACETDEX STRUCT ARCHITECTURE                         │
└──────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── CORE LAYER ──────────────────────────────────┐
│                                                                              │
│  struct Database                                                             │
│  • config: EngineConfig                 // cache, pool, validation limits    │
│  • query_parser: QueryParser            // JSON -> Query, shared Analyzer    │
│  • scorer: Arc<dyn Scorer>              // IdfScorer                         │
│  • snapshots: Arc<SnapshotController>   // Arc<Snapshot> swap on publish     │
│  • writer: Mutex<IndexWriter>           // single writer, private state      │
│  • query_cache: QueryCache              // LRU keyed by snapshot version     │
│  • pool: rayon::ThreadPool              // AND/OR children in parallel       │
│                                                                              │
└──────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── INDEX LAYER ─────────────────────────────────┐
│                                                                              │
│  struct Snapshot (immutable)                                                 │
│  • index: InvertedIndex        field -> whole value -> PostingList           │
│  • text: InvertedIndex         field -> word token -> PostingList (SEARCH)   │
│  • term_stats: TermStatistics  token -> document frequency, N                │
│  • documents: DocumentStore    DocId -> source JSON                          │
│                                                                              │
└──────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── RELATIONSHIPS ───────────────────────────────┐
│                                                                              │
│  Database ──owns──> IndexWriter ──commit──> SnapshotController ──> Snapshot  │
│     │                                                                        │
│     ├──reader()──> SnapshotReader ──pins──> Arc<Snapshot>                    │
│     │                   │                                                    │
│     │                   ├──> QueryValidator (depth, clauses)                 │
│     │                   ├──> Evaluator ──> PostingList merges, Scorer        │
│     │                   └──> ResultFormatter ──hydrates──> DocumentStore     │
│     │                                                                        │
│     └──export/import──> snapshot_file (magic, crc32, bincode)                │
│                                                                              │
└──────────────────────────────────────────────────────────────────────────────┘
*/
