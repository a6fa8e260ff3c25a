pub mod ast;
pub mod cache;
pub mod evaluator;
pub mod parser;
pub mod types;
