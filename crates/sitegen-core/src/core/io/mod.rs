//! Provides input/output functionality for the VASP file formats the tool
//! produces and consumes.
//!
//! Structure files go through the [`traits::StructureFile`] interface
//! ([`poscar::PoscarFile`]). K-point meshes are generated from a structure and
//! written alongside it, and solver energy logs are only ever read.

pub mod kpoints;
pub mod oszicar;
pub mod poscar;
pub mod traits;
