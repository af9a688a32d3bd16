//! # Core Module
//!
//! Stateless building blocks of the move engine: the configuration data model,
//! geometry helpers, the closed-form separation densities, the random-number
//! contract, and the two external evaluators every move reads.
//!
//! ## Architecture
//!
//! - **Data Model** ([`models`]) - Atoms, molecules, species bonding graphs, and the simulation box
//! - **Separation Densities** ([`separation`]) - End-to-end densities of overlapping-sphere chains
//! - **Randomness** ([`random`]) - The `RandomSource` contract, implemented for every `rand::Rng`
//! - **Energetics** ([`forcefield`]) - Pair and bonded potentials behind the `PotentialEvaluator` contract
//! - **Cluster Weights** ([`cluster`]) - The Mayer-diagram weight behind the `ClusterWeight` contract
//! - **Geometry** ([`utils`]) - Rotations, angles, and dihedrals

pub mod cluster;
pub mod forcefield;
pub mod models;
pub mod random;
pub mod separation;
pub mod utils;
