use super::orientation::OrientationCode;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const PREFIX: &str = "POSCAR";
pub const VACANCY_MARKER: &str = "Vac";
pub const ABOVE_MARKER: &str = "above";
pub const AVERAGE_MARKER: &str = "avg";
pub const POSITION_MARKER: &str = "at";
pub const MAX_AVERAGED_SITES: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("Expected 4 or 5 '_'-separated tokens, found {0}")]
    TokenCount(usize),
    #[error("Identifier must start with 'POSCAR', found '{0}'")]
    Prefix(String),
    #[error("Invalid molecule tag '{0}'")]
    Molecule(String),
    #[error("Expected 'Vac' or 'above', found '{0}'")]
    VacancyMarker(String),
    #[error("Invalid site token '{0}'")]
    Site(String),
    #[error("Unknown orientation token '{0}'")]
    Suffix(String),
    #[error("Averaging site needs at least one index")]
    EmptyAverage,
    #[error("Averaging over {0} sites exceeds the limit of 3")]
    TooManyAveragedSites(usize),
    #[error("Averaged index {0} does not fit a single digit")]
    AveragedIndexTooLarge(usize),
    #[error("An averaging site cannot carry an orientation token")]
    AverageWithOrientation,
    #[error("A vacancy needs a species site, not an explicit position")]
    VacancyWithPosition,
    #[error("A vacancy needs a single-index site, not an averaging site")]
    VacancyWithAverage,
}

/// The site descriptor of an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SiteToken {
    /// `{species}{index}`, e.g. `O14`.
    Single { species: String, index: usize },
    /// `{species}{digits}` followed by a separate `avg` token, e.g. `O014_avg`.
    Average { species: String, indices: Vec<usize> },
    /// `at{x},{y}` with three decimals, stored in thousandths of an Angstrom.
    Position { x_milli: i64, y_milli: i64 },
}

impl SiteToken {
    /// An explicit position, rounded to the three decimals the token carries.
    pub fn position(x: f64, y: f64) -> Self {
        let milli = |v: f64| (v * 1000.0).round() as i64;
        SiteToken::Position {
            x_milli: milli(x),
            y_milli: milli(y),
        }
    }

    /// The (x, y) of a position site.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match self {
            SiteToken::Position { x_milli, y_milli } => {
                Some((*x_milli as f64 / 1000.0, *y_milli as f64 / 1000.0))
            }
            _ => None,
        }
    }

    pub fn species(&self) -> Option<&str> {
        match self {
            SiteToken::Single { species, .. } | SiteToken::Average { species, .. } => {
                Some(species)
            }
            SiteToken::Position { .. } => None,
        }
    }

    pub fn is_average(&self) -> bool {
        matches!(self, SiteToken::Average { .. })
    }

    fn validate(&self) -> Result<(), IdentifierError> {
        if let Some(species) = self.species() {
            if !is_species(species) {
                return Err(IdentifierError::Site(species.to_string()));
            }
        }
        if let SiteToken::Average { indices, .. } = self {
            if indices.is_empty() {
                return Err(IdentifierError::EmptyAverage);
            }
            if indices.len() > MAX_AVERAGED_SITES {
                return Err(IdentifierError::TooManyAveragedSites(indices.len()));
            }
            if let Some(&index) = indices.iter().find(|&&i| i > 9) {
                return Err(IdentifierError::AveragedIndexTooLarge(index));
            }
        }
        Ok(())
    }

    fn parse(token: &str, averaged: bool) -> Result<Self, IdentifierError> {
        let invalid = || IdentifierError::Site(token.to_string());

        if let Some(coords) = token.strip_prefix(POSITION_MARKER) {
            if averaged {
                return Err(invalid());
            }
            let (x, y) = coords.split_once(',').ok_or_else(invalid)?;
            let x: f64 = x.parse().map_err(|_| invalid())?;
            let y: f64 = y.parse().map_err(|_| invalid())?;
            return Ok(SiteToken::position(x, y));
        }

        let split = token
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (species, digits) = token.split_at(split);
        if !is_species(species) || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let species = species.to_string();
        if averaged {
            let indices = digits
                .chars()
                .filter_map(|c| c.to_digit(10))
                .map(|d| d as usize)
                .collect();
            Ok(SiteToken::Average { species, indices })
        } else {
            if digits.len() > 1 && digits.starts_with('0') {
                return Err(invalid());
            }
            let index = digits.parse().map_err(|_| invalid())?;
            Ok(SiteToken::Single { species, index })
        }
    }
}

impl fmt::Display for SiteToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteToken::Single { species, index } => write!(f, "{species}{index}"),
            SiteToken::Average { species, indices } => {
                f.write_str(species)?;
                for index in indices {
                    write!(f, "{index}")?;
                }
                Ok(())
            }
            SiteToken::Position { x_milli, y_milli } => {
                write!(f, "{POSITION_MARKER}{},{}", Milli(*x_milli), Milli(*y_milli))
            }
        }
    }
}

struct Milli(i64);

impl fmt::Display for Milli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:03}", abs / 1000, abs % 1000)
    }
}

fn is_species(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphabetic())
}

fn is_molecule_tag(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
}

/// The canonical name of one adsorbate configuration.
///
/// Serialized as `POSCAR_{molecule}_{Vac|above}_{site}[_{orientation|avg}]` and
/// parsed back with [`FromStr`]. Construction validates every restriction the
/// textual form depends on, so any value of this type serializes to a string that
/// parses back to an equal value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigIdentifier {
    molecule: String,
    vacancy: bool,
    site: SiteToken,
    orientation: Option<OrientationCode>,
}

impl ConfigIdentifier {
    pub fn new(
        molecule: &str,
        vacancy: bool,
        site: SiteToken,
        orientation: Option<OrientationCode>,
    ) -> Result<Self, IdentifierError> {
        if !is_molecule_tag(molecule) {
            return Err(IdentifierError::Molecule(molecule.to_string()));
        }
        site.validate()?;
        let orientation = orientation.filter(|code| code.suffix().is_some());
        if site.is_average() && orientation.is_some() {
            return Err(IdentifierError::AverageWithOrientation);
        }
        if vacancy {
            match site {
                SiteToken::Position { .. } => return Err(IdentifierError::VacancyWithPosition),
                SiteToken::Average { .. } => return Err(IdentifierError::VacancyWithAverage),
                SiteToken::Single { .. } => {}
            }
        }
        Ok(Self {
            molecule: molecule.to_string(),
            vacancy,
            site,
            orientation,
        })
    }

    pub fn molecule(&self) -> &str {
        &self.molecule
    }

    pub fn vacancy(&self) -> bool {
        self.vacancy
    }

    pub fn site(&self) -> &SiteToken {
        &self.site
    }

    pub fn orientation(&self) -> Option<OrientationCode> {
        self.orientation
    }

    /// The orientation token, if any.
    pub fn suffix(&self) -> Option<&'static str> {
        self.orientation.and_then(|code| code.suffix())
    }

    /// The identifier without its `POSCAR_` prefix.
    pub fn stem(&self) -> String {
        let full = self.to_string();
        full[PREFIX.len() + 1..].to_string()
    }

    /// The same identifier under a different file prefix, e.g. `KPOINTS`.
    pub fn with_prefix(&self, prefix: &str) -> String {
        format!("{prefix}_{}", self.stem())
    }
}

impl fmt::Display for ConfigIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.vacancy {
            VACANCY_MARKER
        } else {
            ABOVE_MARKER
        };
        write!(f, "{PREFIX}_{}_{marker}_{}", self.molecule, self.site)?;
        if self.site.is_average() {
            write!(f, "_{AVERAGE_MARKER}")?;
        } else if let Some(suffix) = self.suffix() {
            write!(f, "_{suffix}")?;
        }
        Ok(())
    }
}

impl FromStr for ConfigIdentifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split('_').collect();
        if !(4..=5).contains(&tokens.len()) {
            return Err(IdentifierError::TokenCount(tokens.len()));
        }
        if tokens[0] != PREFIX {
            return Err(IdentifierError::Prefix(tokens[0].to_string()));
        }
        let vacancy = match tokens[2] {
            VACANCY_MARKER => true,
            ABOVE_MARKER => false,
            other => return Err(IdentifierError::VacancyMarker(other.to_string())),
        };

        let (averaged, orientation) = match tokens.get(4) {
            None => (false, None),
            Some(&AVERAGE_MARKER) => (true, None),
            Some(suffix) => {
                let code = OrientationCode::from_suffix(suffix)
                    .ok_or_else(|| IdentifierError::Suffix(suffix.to_string()))?;
                (false, Some(code))
            }
        };
        let site = SiteToken::parse(tokens[3], averaged)?;
        Self::new(tokens[1], vacancy, site, orientation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::naming::orientation::{Orientation, RotationCode};

    fn single(species: &str, index: usize) -> SiteToken {
        SiteToken::Single {
            species: species.to_string(),
            index,
        }
    }

    fn code(orientation: Orientation, deg: f64) -> Option<OrientationCode> {
        Some(OrientationCode::new(orientation, deg))
    }

    #[test]
    fn serializes_vacancy_with_h_down_rotation() {
        let id = ConfigIdentifier::new("H2O", true, single("O", 0), code(Orientation::HDown, 90.0))
            .unwrap();
        assert_eq!(id.to_string(), "POSCAR_H2O_Vac_O0_HDL");

        let id = ConfigIdentifier::new("H2O", true, single("O", 0), code(Orientation::HDown, 270.0))
            .unwrap();
        assert_eq!(id.to_string(), "POSCAR_H2O_Vac_O0_HDR");

        let id = ConfigIdentifier::new("H2O", true, single("O", 0), code(Orientation::HDown, 45.0))
            .unwrap();
        assert_eq!(id.to_string(), "POSCAR_H2O_Vac_O0_HDX");
    }

    #[test]
    fn serializes_averaging_site_with_avg_token() {
        let site = SiteToken::Average {
            species: "O".to_string(),
            indices: vec![0, 1, 4],
        };
        let id = ConfigIdentifier::new("H", false, site, None).unwrap();
        assert_eq!(id.to_string(), "POSCAR_H_above_O014_avg");
    }

    #[test]
    fn serializes_position_site_with_three_decimals() {
        let id = ConfigIdentifier::new("N", false, SiteToken::position(1.0, 2.0 / 3.0), None)
            .unwrap();
        assert_eq!(id.to_string(), "POSCAR_N_above_at1.000,0.667");
    }

    #[test]
    fn orientation_none_produces_four_tokens() {
        let id = ConfigIdentifier::new("H2", false, single("W", 3), code(Orientation::None, 0.0))
            .unwrap();
        assert_eq!(id.to_string(), "POSCAR_H2_above_W3");
        assert_eq!(id.orientation(), None);
    }

    #[test]
    fn parse_inverts_serialize() {
        let ids = [
            ConfigIdentifier::new("H2O", true, single("O", 12), code(Orientation::Coplanar, 180.0)),
            ConfigIdentifier::new("N2", false, single("W", 0), code(Orientation::Upright, 0.0)),
            ConfigIdentifier::new("H2O", false, single("O", 5), code(Orientation::ODown, 0.0)),
            ConfigIdentifier::new("N", true, single("O", 2), None),
            ConfigIdentifier::new(
                "H",
                false,
                SiteToken::Average {
                    species: "O".to_string(),
                    indices: vec![2, 7],
                },
                None,
            ),
            ConfigIdentifier::new("H", false, SiteToken::position(-1.23456, 7.0), None),
        ];
        for id in ids {
            let id = id.unwrap();
            let parsed: ConfigIdentifier = id.to_string().parse().unwrap();
            assert_eq!(parsed, id);
        }
    }

    #[test]
    fn parse_reads_rotation_code_from_suffix() {
        let id: ConfigIdentifier = "POSCAR_H2O_Vac_O0_HDX".parse().unwrap();
        let code = id.orientation().unwrap();
        assert_eq!(code.orientation, Orientation::HDown);
        assert_eq!(code.rotation, RotationCode::Unclassified);
        assert!(id.vacancy());
        assert_eq!(id.site(), &single("O", 0));
    }

    #[test]
    fn parse_rejects_malformed_identifiers() {
        assert_eq!(
            "POSCAR_H2O_Vac".parse::<ConfigIdentifier>(),
            Err(IdentifierError::TokenCount(3))
        );
        assert_eq!(
            "POSCAR_H2O_Vac_O0_HDL_x".parse::<ConfigIdentifier>(),
            Err(IdentifierError::TokenCount(6))
        );
        assert!(matches!(
            "KPOINTS_H2O_Vac_O0".parse::<ConfigIdentifier>(),
            Err(IdentifierError::Prefix(_))
        ));
        assert!(matches!(
            "POSCAR_H2O_below_O0".parse::<ConfigIdentifier>(),
            Err(IdentifierError::VacancyMarker(_))
        ));
        assert!(matches!(
            "POSCAR_H2O_Vac_O0_ZZ".parse::<ConfigIdentifier>(),
            Err(IdentifierError::Suffix(_))
        ));
        assert!(matches!(
            "POSCAR_H2O_Vac_0O_HDL".parse::<ConfigIdentifier>(),
            Err(IdentifierError::Site(_))
        ));
    }

    #[test]
    fn parse_rejects_leading_zeros_on_single_index() {
        assert_eq!(
            "POSCAR_H_above_O007".parse::<ConfigIdentifier>(),
            Err(IdentifierError::Site("O007".to_string()))
        );
        assert_eq!(
            "POSCAR_H_above_O00".parse::<ConfigIdentifier>(),
            Err(IdentifierError::Site("O00".to_string()))
        );
        let zero: ConfigIdentifier = "POSCAR_H_above_O0".parse().unwrap();
        assert_eq!(zero.to_string(), "POSCAR_H_above_O0");
        let ten: ConfigIdentifier = "POSCAR_H_above_O10".parse().unwrap();
        assert_eq!(ten.to_string(), "POSCAR_H_above_O10");
        let averaged: ConfigIdentifier = "POSCAR_H_above_O014_avg".parse().unwrap();
        assert_eq!(averaged.to_string(), "POSCAR_H_above_O014_avg");
    }

    #[test]
    fn construction_enforces_encoding_restrictions() {
        let average = |indices: Vec<usize>| SiteToken::Average {
            species: "O".to_string(),
            indices,
        };
        assert_eq!(
            ConfigIdentifier::new("H", false, average(vec![]), None),
            Err(IdentifierError::EmptyAverage)
        );
        assert_eq!(
            ConfigIdentifier::new("H", false, average(vec![0, 1, 2, 3]), None),
            Err(IdentifierError::TooManyAveragedSites(4))
        );
        assert_eq!(
            ConfigIdentifier::new("H", false, average(vec![0, 12]), None),
            Err(IdentifierError::AveragedIndexTooLarge(12))
        );
        assert_eq!(
            ConfigIdentifier::new("H2O", false, average(vec![0, 1]), code(Orientation::HDown, 0.0)),
            Err(IdentifierError::AverageWithOrientation)
        );
        assert_eq!(
            ConfigIdentifier::new("H", true, SiteToken::position(0.0, 0.0), None),
            Err(IdentifierError::VacancyWithPosition)
        );
        assert_eq!(
            ConfigIdentifier::new("H", true, average(vec![0, 1]), None),
            Err(IdentifierError::VacancyWithAverage)
        );
        assert_eq!(
            "POSCAR_H_Vac_O01_avg".parse::<ConfigIdentifier>(),
            Err(IdentifierError::VacancyWithAverage)
        );
        assert!(matches!(
            ConfigIdentifier::new("H_2", false, single("O", 0), None),
            Err(IdentifierError::Molecule(_))
        ));
    }

    #[test]
    fn with_prefix_swaps_file_prefix() {
        let id: ConfigIdentifier = "POSCAR_N2_above_W1_CD".parse().unwrap();
        assert_eq!(id.stem(), "N2_above_W1_CD");
        assert_eq!(id.with_prefix("KPOINTS"), "KPOINTS_N2_above_W1_CD");
    }
}
