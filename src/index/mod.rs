pub mod document_store;
pub mod inverted;
pub mod posting;
pub mod term_stats;
