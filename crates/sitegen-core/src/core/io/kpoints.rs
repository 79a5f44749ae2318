use crate::core::models::structure::Structure;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// k-points per reciprocal atom used when no density is configured.
pub const DEFAULT_KPPA: f64 = 1000.0;

const HEX_ANGLE_TOLERANCE: f64 = 5.0;
const HEX_LENGTH_TOLERANCE: f64 = 0.01;

#[derive(Debug, Error)]
pub enum KpointsError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Cannot build a k-point mesh for a structure without atoms")]
    EmptyStructure,
    #[error("Cannot build a k-point mesh for a degenerate lattice (volume {volume:.3e})")]
    DegenerateLattice { volume: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KpointStyle {
    Gamma,
    Monkhorst,
}

impl fmt::Display for KpointStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KpointStyle::Gamma => f.write_str("Gamma"),
            KpointStyle::Monkhorst => f.write_str("Monkhorst"),
        }
    }
}

/// An automatic k-point mesh (`KPOINTS` file).
#[derive(Debug, Clone, PartialEq)]
pub struct Kpoints {
    pub comment: String,
    pub style: KpointStyle,
    pub divisions: [u32; 3],
}

impl Kpoints {
    /// Builds a mesh with roughly `kppa` k-points per reciprocal atom.
    ///
    /// Divisions are distributed inversely to the lattice lengths. The mesh is
    /// Gamma-centered when any division is odd or the cell is hexagonal,
    /// Monkhorst-Pack otherwise. A perfect-cube density is bumped by 1% first.
    pub fn automatic_density(structure: &Structure, kppa: f64) -> Result<Self, KpointsError> {
        if structure.is_empty() {
            return Err(KpointsError::EmptyStructure);
        }
        let lattice = structure.lattice();
        if lattice.is_degenerate() {
            return Err(KpointsError::DegenerateLattice {
                volume: lattice.volume(),
            });
        }

        let mut kppa = kppa;
        if ((kppa.cbrt() + 0.5).floor().powi(3) - kppa).abs() < 1.0 {
            kppa += kppa * 0.01;
        }
        let lengths = lattice.lengths();
        let ngrid = kppa / structure.len() as f64;
        let mult = (ngrid * lengths[0] * lengths[1] * lengths[2]).cbrt();
        let divisions = lengths.map(|length| (mult / length).max(1.0).floor() as u32);

        let has_odd = divisions.iter().any(|d| d % 2 == 1);
        let style = if has_odd || lattice.is_hexagonal(HEX_ANGLE_TOLERANCE, HEX_LENGTH_TOLERANCE) {
            KpointStyle::Gamma
        } else {
            KpointStyle::Monkhorst
        };

        Ok(Self {
            comment: format!("pymatgen with grid density = {kppa:.0} / number of atoms"),
            style,
            divisions,
        })
    }

    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), KpointsError> {
        fs::write(path, self.to_string())?;
        Ok(())
    }
}

impl fmt::Display for Kpoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.divisions;
        writeln!(f, "{}", self.comment)?;
        writeln!(f, "0")?;
        writeln!(f, "{}", self.style)?;
        writeln!(f, "{a} {b} {c}")
    }
}

/// The k-point file name that pairs with a structure file name:
/// `POSCAR` becomes `KPOINTS` and `POSCAR_{rest}` becomes `KPOINTS_{rest}`.
pub fn kpoints_name_for(structure_name: &str) -> String {
    match structure_name.strip_prefix("POSCAR") {
        Some(rest) if rest.is_empty() || rest.starts_with('_') => format!("KPOINTS{rest}"),
        _ => format!("KPOINTS_{structure_name}"),
    }
}
