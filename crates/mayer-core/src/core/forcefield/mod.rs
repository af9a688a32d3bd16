pub mod evaluator;
pub mod potentials;
