use crate::core::io::traits::StructureFile;
use crate::core::models::atom::Atom;
use crate::core::models::lattice::Lattice;
use crate::core::models::structure::Structure;
use nalgebra::{Point3, Vector3};
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoscarMetadata {
    pub comment: String,
}

#[derive(Debug, Error)]
pub enum PoscarError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: PoscarParseErrorKind,
    },
    #[error("Unexpected end of file, expected {0}")]
    UnexpectedEof(&'static str),
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
}

#[derive(Debug, Error)]
pub enum PoscarParseErrorKind {
    #[error("Invalid float '{value}'")]
    InvalidFloat { value: String },
    #[error("Invalid atom count '{value}'")]
    InvalidCount { value: String },
    #[error("Expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },
    #[error("Species line is required (VASP 5 format)")]
    MissingSpecies,
    #[error("Scale factor must be non-zero")]
    ZeroScale,
    #[error("Invalid selective dynamics flag '{value}' (expected T or F)")]
    InvalidFlag { value: String },
}

struct LineCursor<'a, R: BufRead> {
    lines: io::Lines<&'a mut R>,
    line_num: usize,
}

impl<'a, R: BufRead> LineCursor<'a, R> {
    fn new(reader: &'a mut R) -> Self {
        Self {
            lines: reader.lines(),
            line_num: 0,
        }
    }

    fn next(&mut self, expected: &'static str) -> Result<String, PoscarError> {
        let line = self
            .lines
            .next()
            .ok_or(PoscarError::UnexpectedEof(expected))??;
        self.line_num += 1;
        Ok(line)
    }

    fn error(&self, kind: PoscarParseErrorKind) -> PoscarError {
        PoscarError::Parse {
            line: self.line_num,
            kind,
        }
    }

    fn floats(&self, line: &str, count: usize) -> Result<Vec<f64>, PoscarError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < count {
            return Err(self.error(PoscarParseErrorKind::TooFewFields {
                expected: count,
                found: fields.len(),
            }));
        }
        fields[..count]
            .iter()
            .map(|f| {
                f.parse::<f64>().map_err(|_| {
                    self.error(PoscarParseErrorKind::InvalidFloat {
                        value: f.to_string(),
                    })
                })
            })
            .collect()
    }
}

/// Strips POTCAR-style decorations such as `W_pv` or `O/1a2b` from a species token.
fn clean_species(token: &str) -> &str {
    token.split(['_', '/']).next().unwrap_or(token)
}

fn parse_flag(cursor: &LineCursor<'_, impl BufRead>, token: &str) -> Result<bool, PoscarError> {
    match token {
        "T" | "t" => Ok(true),
        "F" | "f" => Ok(false),
        other => Err(cursor.error(PoscarParseErrorKind::InvalidFlag {
            value: other.to_string(),
        })),
    }
}

/// VASP 5 structure file (`POSCAR` / `CONTCAR`).
pub struct PoscarFile;

impl StructureFile for PoscarFile {
    type Metadata = PoscarMetadata;
    type Error = PoscarError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Structure, Self::Metadata), Self::Error> {
        let mut cursor = LineCursor::new(reader);
        let comment = cursor.next("comment line")?.trim().to_string();

        let scale_line = cursor.next("scale factor")?;
        let scale = cursor.floats(&scale_line, 1)?[0];
        if scale == 0.0 {
            return Err(cursor.error(PoscarParseErrorKind::ZeroScale));
        }

        let mut rows = [Vector3::zeros(); 3];
        for row in rows.iter_mut() {
            let line = cursor.next("lattice vector")?;
            let v = cursor.floats(&line, 3)?;
            *row = Vector3::new(v[0], v[1], v[2]);
        }
        let raw_lattice = Lattice::from_vectors(rows[0], rows[1], rows[2]);
        let factor = if scale > 0.0 {
            scale
        } else {
            let raw_volume = raw_lattice.volume();
            if raw_volume <= 0.0 {
                return Err(PoscarError::Inconsistency(
                    "cannot rescale a degenerate cell to a target volume".to_string(),
                ));
            }
            (scale.abs() / raw_volume).cbrt()
        };
        let lattice = raw_lattice.scaled(factor);

        let species_line = cursor.next("species line")?;
        let starts_alphabetic = species_line
            .trim_start()
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic());
        if !starts_alphabetic {
            return Err(cursor.error(PoscarParseErrorKind::MissingSpecies));
        }
        let species: Vec<String> = species_line
            .split_whitespace()
            .map(|s| clean_species(s).to_string())
            .collect();

        let counts_line = cursor.next("atom counts")?;
        let counts = counts_line
            .split_whitespace()
            .map(|c| {
                c.parse::<usize>().map_err(|_| {
                    cursor.error(PoscarParseErrorKind::InvalidCount {
                        value: c.to_string(),
                    })
                })
            })
            .collect::<Result<Vec<usize>, _>>()?;
        if counts.len() != species.len() {
            return Err(PoscarError::Inconsistency(format!(
                "{} species but {} counts",
                species.len(),
                counts.len()
            )));
        }

        let mut mode_line = cursor.next("coordinate mode")?;
        let selective = mode_line.trim_start().starts_with(['S', 's']);
        if selective {
            mode_line = cursor.next("coordinate mode")?;
        }
        let cartesian = mode_line.trim_start().starts_with(['C', 'c', 'K', 'k']);

        let mut atoms = Vec::with_capacity(counts.iter().sum());
        for (symbol, &count) in species.iter().zip(&counts) {
            for _ in 0..count {
                let line = cursor.next("atom coordinates")?;
                let v = cursor.floats(&line, 3)?;
                let coords = Vector3::new(v[0], v[1], v[2]);
                let position = if cartesian {
                    Point3::from(coords * factor)
                } else {
                    lattice.to_cartesian(&coords)
                };

                let mut atom = Atom::new(symbol, position);
                if selective {
                    let fields: Vec<&str> = line.split_whitespace().collect();
                    if fields.len() < 6 {
                        return Err(cursor.error(PoscarParseErrorKind::TooFewFields {
                            expected: 6,
                            found: fields.len(),
                        }));
                    }
                    let flags = fields[3..6]
                        .iter()
                        .map(|f| parse_flag(&cursor, f))
                        .collect::<Result<Vec<bool>, _>>()?;
                    let movable = flags.iter().filter(|&&f| f).count();
                    if movable != 0 && movable != 3 {
                        warn!(
                            line = cursor.line_num,
                            "Mixed selective dynamics flags are not supported; atom treated as movable."
                        );
                    }
                    atom.frozen = movable == 0;
                }
                atoms.push(atom);
            }
        }

        Ok((Structure::new(lattice, atoms), PoscarMetadata { comment }))
    }

    fn write_to(
        structure: &Structure,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let runs = structure.species_runs();
        writeln!(writer, "{}", metadata.comment)?;
        writeln!(writer, "{:19.16}", 1.0)?;
        for i in 0..3 {
            let v = structure.lattice().vector(i);
            writeln!(writer, " {:21.16} {:21.16} {:21.16}", v.x, v.y, v.z)?;
        }
        for (symbol, _) in &runs {
            write!(writer, "{symbol:>4}")?;
        }
        writeln!(writer)?;
        for (_, count) in &runs {
            write!(writer, "{count:>4}")?;
        }
        writeln!(writer)?;

        let selective = structure.atoms().iter().any(|a| a.frozen);
        if selective {
            writeln!(writer, "Selective dynamics")?;
        }
        writeln!(writer, "Cartesian")?;
        for atom in structure.atoms() {
            let p = atom.position;
            write!(writer, " {:20.16} {:20.16} {:20.16}", p.x, p.y, p.z)?;
            if selective {
                let flag = if atom.frozen { "F" } else { "T" };
                write!(writer, " {flag:>3} {flag:>3} {flag:>3}")?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    fn write_structure_to(structure: &Structure, writer: &mut impl Write) -> Result<(), Self::Error> {
        let comment = structure
            .species_runs()
            .iter()
            .map(|(symbol, _)| *symbol)
            .collect::<Vec<_>>()
            .join(" ");
        Self::write_to(structure, &PoscarMetadata { comment }, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    const DIRECT: &str = "\
WO3 slab
1.0
 4.0 0.0 0.0
 0.0 4.0 0.0
 0.0 0.0 20.0
 W_pv O
 1 2
Direct
 0.0 0.0 0.25
 0.5 0.0 0.30
 0.0 0.5 0.30
";

    fn read(text: &str) -> Result<(Structure, PoscarMetadata), PoscarError> {
        PoscarFile::read_from(&mut Cursor::new(text))
    }

    #[test]
    fn reads_direct_coordinates_into_cartesian() {
        let (structure, metadata) = read(DIRECT).unwrap();
        assert_eq!(metadata.comment, "WO3 slab");
        assert_eq!(structure.len(), 3);
        assert_eq!(structure.atom(0).unwrap().symbol, "W");
        let o = structure.atom(1).unwrap();
        assert_eq!(o.symbol, "O");
        assert!((o.position - Point3::new(2.0, 0.0, 6.0)).norm() < 1e-12);
        assert!(structure.atoms().iter().all(|a| !a.frozen));
    }

    #[test]
    fn reads_selective_dynamics_and_scaled_cartesian() {
        let text = "\
frozen
2.0
 1.0 0.0 0.0
 0.0 1.0 0.0
 0.0 0.0 5.0
 Mo S
 1 1
Selective dynamics
Cartesian
 0.0 0.0 1.0 F F F
 0.5 0.5 2.0 T T T
";
        let (structure, _) = read(text).unwrap();
        assert_eq!(structure.lattice().lengths(), [2.0, 2.0, 10.0]);
        assert!(structure.atom(0).unwrap().frozen);
        assert!(!structure.atom(1).unwrap().frozen);
        assert_eq!(structure.atom(1).unwrap().position, Point3::new(1.0, 1.0, 4.0));
    }

    #[test]
    fn negative_scale_sets_cell_volume() {
        let text = DIRECT.replacen("1.0\n", "-2560.0\n", 1);
        let (structure, _) = read(&text).unwrap();
        assert!((structure.lattice().volume() - 2560.0).abs() < 1e-6);
        assert!((structure.lattice().lengths()[0] - 8.0).abs() < 1e-9);
    }

    #[test]
    fn missing_species_line_is_an_error() {
        let text = "x\n1.0\n1 0 0\n0 1 0\n0 0 1\n 1\nDirect\n0 0 0\n";
        let result = read(text);
        assert!(matches!(
            result,
            Err(PoscarError::Parse {
                line: 6,
                kind: PoscarParseErrorKind::MissingSpecies
            })
        ));
    }

    #[test]
    fn truncated_file_reports_what_was_expected() {
        let text = DIRECT.lines().take(9).collect::<Vec<_>>().join("\n");
        let result = read(&text);
        assert!(matches!(
            result,
            Err(PoscarError::UnexpectedEof("atom coordinates"))
        ));
    }

    #[test]
    fn invalid_float_reports_line_number() {
        let text = DIRECT.replace(" 0.5 0.0 0.30", " 0.5 abc 0.30");
        let result = read(&text);
        assert!(matches!(
            result,
            Err(PoscarError::Parse {
                line: 10,
                kind: PoscarParseErrorKind::InvalidFloat { .. }
            })
        ));
    }

    #[test]
    fn count_mismatch_is_inconsistent() {
        let text = DIRECT.replace(" 1 2\n", " 1 2 3\n");
        assert!(matches!(read(&text), Err(PoscarError::Inconsistency(_))));
    }

    #[test]
    fn writer_keeps_atom_order_and_round_trips() {
        let (mut structure, _) = read(DIRECT).unwrap();
        structure.push(Atom::new("W", Point3::new(1.0, 1.0, 9.0)));
        structure.atoms_mut()[0].frozen = true;

        let mut out = Vec::new();
        PoscarFile::write_structure_to(&structure, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "W O W");
        assert_eq!(lines[5].split_whitespace().collect::<Vec<_>>(), ["W", "O", "W"]);
        assert_eq!(lines[6].split_whitespace().collect::<Vec<_>>(), ["1", "2", "1"]);
        assert_eq!(lines[7], "Selective dynamics");
        assert_eq!(lines[8], "Cartesian");
        assert!(lines[9].ends_with("F   F   F"));

        let (reread, _) = read(&text).unwrap();
        assert_eq!(reread.len(), 4);
        for (a, b) in structure.atoms().iter().zip(reread.atoms()) {
            assert_eq!(a.symbol, b.symbol);
            assert_eq!(a.frozen, b.frozen);
            assert!((a.position - b.position).norm() < 1e-12);
        }
    }

    #[test]
    fn writing_twice_is_byte_identical() {
        let (structure, _) = read(DIRECT).unwrap();
        let dir = tempdir().unwrap();
        let first = dir.path().join("POSCAR_a");
        let second = dir.path().join("POSCAR_b");
        PoscarFile::write_structure_to_path(&structure, &first).unwrap();
        PoscarFile::write_structure_to_path(&structure, &second).unwrap();
        assert_eq!(
            std::fs::read(&first).unwrap(),
            std::fs::read(&second).unwrap()
        );
    }
}
