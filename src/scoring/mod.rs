pub mod accumulator;
pub mod scorer;
