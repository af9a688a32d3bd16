use super::config::ConfigError;
use crate::core::models::bonding::GraphError;
use crate::core::separation::SeparationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MoveError {
    #[error("Move '{move_name}' was used before being bound to a box")]
    NotBound { move_name: &'static str },

    #[error("Topology unsuitable for move '{move_name}': {reason}")]
    Topology {
        move_name: &'static str,
        reason: String,
    },

    #[error("Move '{move_name}' found no eligible sites in the bound box")]
    NoEligibleSites { move_name: &'static str },

    #[error("Rejection sampling for a gap of {gap} beads gave up after {attempts} attempts")]
    SamplingExhausted { gap: usize, attempts: u64 },

    #[error("Ring closure cannot build a ring of {beads} beads from the tabulated densities")]
    UnsupportedRingSize { beads: usize },

    #[error("Invalid move configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Separation density error: {source}")]
    Separation {
        #[from]
        source: SeparationError,
    },

    #[error("Malformed molecule graph: {source}")]
    Graph {
        #[from]
        source: GraphError,
    },
}
