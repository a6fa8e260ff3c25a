pub mod lowercase;
pub mod trim;
