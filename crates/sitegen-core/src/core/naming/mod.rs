//! Deterministic names for adsorbate configurations.
//!
//! [`identifier::ConfigIdentifier`] is the `POSCAR_...` file name every generated
//! configuration is written under and later parsed back from. The orientation
//! token comes from the finite table in [`orientation`], and [`jobs`] derives the
//! folder and scheduler job names from a parsed identifier.

pub mod identifier;
pub mod jobs;
pub mod orientation;
