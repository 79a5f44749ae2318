//! # Workflows Module
//!
//! Batch entry points that tie [`crate::core`] and [`crate::engine`] together. Each
//! takes every path and parameter as an argument, reports through a
//! [`crate::engine::progress::ProgressReporter`] where it runs long, and isolates
//! per-item failures in its report instead of aborting.
//!
//! - **Generation** ([`generate`]) - places a list of adsorbate configurations on a
//!   slab and writes one structure (plus k-point mesh) per identifier, along with the
//!   bare, vacancy and gas-phase reference structures
//! - **Materialization** ([`materialize`]) - turns generated structure files into
//!   calculation folders with control files and a named job script
//! - **Energy Reduction** ([`energy`]) - adsorption energies from converged-energy logs,
//!   singly or for a whole folder, with CSV export

pub mod energy;
pub mod error;
pub mod generate;
pub mod materialize;
