use super::atom::Atom;
use super::lattice::Lattice;
use crate::core::utils::geometry::rotation_from_axis_angle;
use nalgebra::{Point3, Vector3};

/// An ordered collection of atoms inside a lattice: a slab or a free molecule.
///
/// Atom indices are positions in the atom list. Removing an atom shifts every
/// later index down by one, so callers must re-resolve indices after a removal.
/// All geometric operations mutate the structure in place; clone first when the
/// original must be preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Structure {
    lattice: Lattice,
    atoms: Vec<Atom>,
}

impl Structure {
    /// Creates a structure from a lattice and an ordered atom list.
    pub fn new(lattice: Lattice, atoms: Vec<Atom>) -> Self {
        Self { lattice, atoms }
    }

    /// Creates a free molecule (zero cell) from an ordered atom list.
    pub fn molecule(atoms: Vec<Atom>) -> Self {
        Self::new(Lattice::zero(), atoms)
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn set_lattice(&mut self, lattice: Lattice) {
        self.lattice = lattice;
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atoms_mut(&mut self) -> &mut [Atom] {
        &mut self.atoms
    }

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Appends an atom at the end of the atom list.
    pub fn push(&mut self, atom: Atom) {
        self.atoms.push(atom);
    }

    /// Removes the atom at `index`, shifting every later atom down by one.
    ///
    /// # Return
    ///
    /// Returns `Some(Atom)` if the index was valid, otherwise `None`.
    pub fn remove_atom(&mut self, index: usize) -> Option<Atom> {
        (index < self.atoms.len()).then(|| self.atoms.remove(index))
    }

    /// Appends copies of every atom of `other`, shifted by `translation`.
    ///
    /// The lattice of `other` is ignored.
    pub fn extend_translated(&mut self, other: &Structure, translation: &Vector3<f64>) {
        self.atoms.extend(other.atoms.iter().map(|atom| Atom {
            position: atom.position + translation,
            ..atom.clone()
        }));
    }

    /// Iterates over `(index, atom)` pairs of one species, in structure order.
    pub fn atoms_of<'a, 's>(
        &'a self,
        symbol: &'s str,
    ) -> impl Iterator<Item = (usize, &'a Atom)> + use<'a, 's> {
        self.atoms
            .iter()
            .enumerate()
            .filter(move |(_, atom)| atom.is(symbol))
    }

    /// Returns the distinct species labels in order of first appearance.
    pub fn species(&self) -> Vec<&str> {
        let mut species: Vec<&str> = Vec::new();
        for atom in &self.atoms {
            if !species.contains(&atom.symbol.as_str()) {
                species.push(atom.symbol.as_str());
            }
        }
        species
    }

    /// Groups consecutive atoms with equal symbols into `(symbol, count)` runs.
    ///
    /// This is the species/count layout of a VASP structure file; the atom order
    /// is never changed.
    pub fn species_runs(&self) -> Vec<(&str, usize)> {
        let mut runs: Vec<(&str, usize)> = Vec::new();
        for atom in &self.atoms {
            match runs.last_mut() {
                Some((symbol, count)) if *symbol == atom.symbol => *count += 1,
                _ => runs.push((atom.symbol.as_str(), 1)),
            }
        }
        runs
    }

    /// Returns the highest z coordinate, or `None` for an empty structure.
    pub fn max_z(&self) -> Option<f64> {
        self.atoms
            .iter()
            .map(|atom| atom.position.z)
            .reduce(f64::max)
    }

    /// Returns the arithmetic mean of all atom positions.
    pub fn centroid(&self) -> Option<Point3<f64>> {
        if self.atoms.is_empty() {
            return None;
        }
        let sum = self
            .atoms
            .iter()
            .fold(Vector3::zeros(), |acc, atom| acc + atom.position.coords);
        Some(Point3::from(sum / self.atoms.len() as f64))
    }

    /// Shifts every atom by `translation`.
    pub fn translate(&mut self, translation: &Vector3<f64>) {
        for atom in &mut self.atoms {
            atom.position += translation;
        }
    }

    /// Rotates every atom by `angle_degrees` about `axis` through the origin.
    pub fn rotate(&mut self, axis: &Vector3<f64>, angle_degrees: f64) {
        let rotation = rotation_from_axis_angle(axis, angle_degrees);
        for atom in &mut self.atoms {
            atom.position = rotation * atom.position;
        }
    }

    /// Translates the structure so that its centroid sits at the origin.
    pub fn center_at_origin(&mut self) {
        if let Some(centroid) = self.centroid() {
            self.translate(&-centroid.coords);
        }
    }

    /// Places the structure in an orthorhombic box with `vacuum` Angstroms of
    /// empty space on each side of its bounding box, centered in the box.
    pub fn center_in_vacuum(&mut self, vacuum: f64) {
        let Some(first) = self.atoms.first() else {
            return;
        };
        let (mut lo, mut hi) = (first.position.coords, first.position.coords);
        for atom in &self.atoms {
            lo = lo.inf(&atom.position.coords);
            hi = hi.sup(&atom.position.coords);
        }
        let extent = hi - lo;
        self.translate(&(Vector3::repeat(vacuum) - lo));
        self.lattice = Lattice::orthorhombic(
            extent.x + 2.0 * vacuum,
            extent.y + 2.0 * vacuum,
            extent.z + 2.0 * vacuum,
        );
    }
}
