pub mod accumulator;
pub mod predictor;
