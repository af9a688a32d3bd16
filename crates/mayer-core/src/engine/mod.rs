//! # Engine Module
//!
//! The stateful move machinery for Mayer-sampling Markov chains.
//!
//! ## Overview
//!
//! A move perturbs the configuration held by a
//! [`SimulationBox`](crate::core::models::sim_box::SimulationBox), records the energy and
//! cluster weight before and after, and reports an acceptance ratio. The outer driver then
//! accepts the trial or rejects it, in which case the move restores the captured atoms.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Move-set files, growth parameters, and their builders
//! - **Error Handling** ([`error`]) - Move and binding errors
//! - **Bonded Transforms** ([`transform`]) - Rigid transforms propagated through bond graphs
//! - **Snapshots** ([`snapshot`]) - Pre-trial atom copies for bit-exact rejection
//! - **Chain Growth** ([`growth`]) - Chain, tree, and ring configurations of overlapping spheres
//! - **Moves** ([`moves`]) - The trial life cycle and every concrete move

pub mod config;
pub mod error;
pub mod growth;
pub mod moves;
pub mod snapshot;
pub mod transform;
