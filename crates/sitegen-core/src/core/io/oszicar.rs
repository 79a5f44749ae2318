use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Prefix of per-configuration energy log files.
pub const ENERGY_LOG_PREFIX: &str = "OSZICAR_";

const ENERGY_FIELD: usize = 2;

#[derive(Debug, Error)]
pub enum EnergyLogError {
    #[error("Failed to read energy log '{path}': {source}")]
    Io { path: String, source: io::Error },
    #[error("Energy log '{path}' contains no data")]
    Empty { path: String },
    #[error("Energy log '{path}': last line '{line}' has no energy in field 2")]
    MissingField { path: String, line: String },
    #[error("Energy log '{path}': cannot parse '{value}' as an energy")]
    InvalidEnergy { path: String, value: String },
}

/// Reads the converged energy of a solver run: field 2 of the last non-empty line.
pub fn read_converged_energy(path: &Path) -> Result<f64, EnergyLogError> {
    let display = path.to_string_lossy().to_string();
    let content = fs::read_to_string(path).map_err(|e| EnergyLogError::Io {
        path: display.clone(),
        source: e,
    })?;
    parse_converged_energy(&content, &display)
}

/// Extracts the converged energy from log text. `origin` names the log in errors.
pub fn parse_converged_energy(content: &str, origin: &str) -> Result<f64, EnergyLogError> {
    let line = content
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| EnergyLogError::Empty {
            path: origin.to_string(),
        })?;
    let value = line
        .split_whitespace()
        .nth(ENERGY_FIELD)
        .ok_or_else(|| EnergyLogError::MissingField {
            path: origin.to_string(),
            line: line.trim().to_string(),
        })?;
    value.parse::<f64>().map_err(|_| EnergyLogError::InvalidEnergy {
        path: origin.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const LOG: &str = "\
       N       E                     dE             d eps       ncg     rms          rms(c)
DAV:   1     0.123456789012E+04    0.12346E+04   -0.74537E+04  8112   0.152E+03
DAV:   2    -0.258112449186E+03   -0.14927E+04   -0.13851E+04  8160   0.327E+02
   1 F= -.57012345E+03 E0= -.57001234E+03  d E =-.570123E+03
   2 F= -.57123456E+03 E0= -.57112345E+03  d E =-.111111E+01

";

    #[test]
    fn takes_third_field_of_last_non_empty_line() {
        let energy = parse_converged_energy(LOG, "OSZICAR").unwrap();
        assert!((energy - (-571.23456)).abs() < 1e-9);
    }

    #[test]
    fn empty_log_is_an_error() {
        assert!(matches!(
            parse_converged_energy("\n  \n", "x"),
            Err(EnergyLogError::Empty { .. })
        ));
    }

    #[test]
    fn short_last_line_is_an_error() {
        assert!(matches!(
            parse_converged_energy("1 F=\n", "x"),
            Err(EnergyLogError::MissingField { .. })
        ));
        assert!(matches!(
            parse_converged_energy("1 F= abc\n", "x"),
            Err(EnergyLogError::InvalidEnergy { .. })
        ));
    }

    #[test]
    fn reads_from_disk_and_reports_missing_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("OSZICAR_slab");
        std::fs::write(&path, "   1 F= -10.5 E0= -10.4\n").unwrap();
        assert_eq!(read_converged_energy(&path).unwrap(), -10.5);

        let missing = read_converged_energy(&dir.path().join("nope"));
        assert!(matches!(missing, Err(EnergyLogError::Io { .. })));
    }
}
