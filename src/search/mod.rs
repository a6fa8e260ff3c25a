pub mod formatter;
pub mod results;
