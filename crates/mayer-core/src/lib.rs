//! # mayermc
//!
//! Markov-chain Monte Carlo moves for Mayer-sampling calculations of virial coefficients.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`SimulationBox`, `Molecule`,
//!   `MoleculeGraph`), the closed-form chain separation densities, and the contracts for
//!   the external collaborators (`PotentialEvaluator`, `ClusterWeight`, `RandomSource`).
//!
//! - **[`engine`]: The Logic Core.** The stateful move machinery. Every move follows the
//!   trial, chi, accept-or-reject life cycle of `MonteCarloMove`, propagating rigid
//!   transforms through bond graphs with `BondedTransformer`, restoring rejected trials
//!   from `AtomSnapshot`, and regrowing whole chains, trees, and rings with
//!   `ChainGrowthSampler`.
//!
//! - **[`workflows`]: The Public API.** A Metropolis step helper and a weighted move set
//!   that drive moves against a box and tally their statistics.

pub mod core;
pub mod engine;
pub mod workflows;
