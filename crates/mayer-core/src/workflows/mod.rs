//! # Workflows Module
//!
//! Thin drivers that run moves against a box.
//!
//! ## Overview
//!
//! The Markov chain itself belongs to the caller. This module offers the pieces most
//! callers rebuild anyway: one Metropolis step for a single move, and a weighted move
//! set that picks a move per step and tallies how each one fares.
//!
//! ## Architecture
//!
//! - **Metropolis Steps** ([`metropolis`]) - Trial, acceptance test, and per-move statistics

pub mod metropolis;
