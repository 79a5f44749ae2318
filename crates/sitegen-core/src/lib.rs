//! # sitegen Core Library
//!
//! Surface-site geometry and naming for adsorbate-on-slab calculations: picks
//! atoms by species and z-layer, places oriented adsorbates above them (optionally
//! carving a vacancy first), names every configuration with a parseable identifier,
//! and reduces the resulting energy logs to adsorption energies.
//!
//! ## Architecture
//!
//! - **[`core`]: The Foundation.** Stateless models (`Structure`, `Lattice`, `Atom`),
//!   adsorbate templates, the identifier grammar and the POSCAR / KPOINTS / OSZICAR
//!   file formats.
//!
//! - **[`engine`]: The Geometry.** Layer classification, site resolution and
//!   adsorbate placement on private copies of the slab, with configuration builders
//!   and a not-found error taxonomy.
//!
//! - **[`workflows`]: The Public API.** Batch generation, folder materialization
//!   and energy reduction, each with per-item failure reporting.

pub mod core;
pub mod engine;
pub mod workflows;
