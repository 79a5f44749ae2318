use nalgebra::Point3;

/// Represents a single atom of a periodic slab or a free molecule.
///
/// The atom does not store its own index. Its index is its position in the
/// owning [`Structure`](super::structure::Structure), which only changes when an
/// atom in front of it is removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The species label (element symbol, e.g. "O", "W", "H").
    pub symbol: String,
    /// The Cartesian coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// Whether the atom is held fixed during relaxation (selective dynamics `F F F`).
    pub frozen: bool,
}

impl Atom {
    /// Creates a new, movable `Atom`.
    ///
    /// # Arguments
    ///
    /// * `symbol` - The species label of the atom.
    /// * `position` - The Cartesian coordinates of the atom.
    pub fn new(symbol: &str, position: Point3<f64>) -> Self {
        Self {
            symbol: symbol.to_string(),
            position,
            frozen: false,
        }
    }

    /// Returns `true` if this atom belongs to the given species.
    #[inline]
    pub fn is(&self, symbol: &str) -> bool {
        self.symbol == symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_atom_has_expected_default_fields() {
        let atom = Atom::new("O", Point3::new(1.0, 2.0, 3.0));

        assert_eq!(atom.symbol, "O");
        assert_eq!(atom.position, Point3::new(1.0, 2.0, 3.0));
        assert!(!atom.frozen);
    }

    #[test]
    fn is_matches_symbol_exactly() {
        let atom = Atom::new("W", Point3::origin());
        assert!(atom.is("W"));
        assert!(!atom.is("w"));
        assert!(!atom.is("O"));
    }

    #[test]
    fn atom_equality_and_clone_works() {
        let mut atom1 = Atom::new("H", Point3::new(0.0, 0.0, 0.0));
        atom1.frozen = true;
        let atom2 = atom1.clone();
        assert_eq!(atom1, atom2);
    }
}
