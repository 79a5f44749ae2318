//! # Core Module
//!
//! Stateless building blocks shared by the placement engine and the workflows.
//!
//! - **Structure representation** ([`models`]) - atoms, lattices and slabs
//! - **Adsorbate templates** ([`molecules`]) - the gas-phase molecules that get placed
//! - **Configuration names** ([`naming`]) - identifiers, orientation tokens, folder and job names
//! - **File I/O** ([`io`]) - POSCAR, KPOINTS and OSZICAR
//! - **Geometry helpers** ([`utils`]) - rotations, in-plane means and pair distances

pub mod io;
pub mod models;
pub mod molecules;
pub mod naming;
pub mod utils;
