//! # Core Models Module
//!
//! Plain data structures describing periodic slabs and free molecules.
//!
//! ## Key Components
//!
//! - [`atom`] - A single atom: species label, Cartesian position, selective-dynamics flag
//! - [`lattice`] - The periodic cell, stored as row vectors
//! - [`structure`] - An ordered atom list inside a lattice, with in-place geometric operations
//!
//! ## Usage
//!
//! ```ignore
//! use sitegen::core::models::{atom::Atom, lattice::Lattice, structure::Structure};
//!
//! let mut slab = Structure::new(Lattice::orthorhombic(7.4, 7.4, 25.0), Vec::new());
//! slab.push(Atom::new("W", Point3::new(0.0, 0.0, 10.0)));
//! ```

pub mod atom;
pub mod lattice;
pub mod structure;
