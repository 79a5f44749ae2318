use crate::core::io::oszicar::{ENERGY_LOG_PREFIX, read_converged_energy};
use crate::workflows::error::WorkflowError;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// One adsorption energy and the constituent energies it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyRecord {
    pub name: String,
    pub adsorption_energy: f64,
    pub combined: f64,
    pub surface: f64,
    /// Adsorbate energy, already scaled by the multiplier.
    pub adsorbate: f64,
}

/// `E_combined - (E_surface + multiplier * E_adsorbate)`.
#[inline]
pub fn adsorption_energy(combined: f64, surface: f64, adsorbate: f64, multiplier: f64) -> f64 {
    combined - (surface + multiplier * adsorbate)
}

/// Computes the adsorption energy of one combined run from three energy logs.
pub fn compute(
    name: &str,
    combined_log: &Path,
    surface_log: &Path,
    adsorbate_log: &Path,
    multiplier: f64,
) -> Result<EnergyRecord, WorkflowError> {
    let combined = read_converged_energy(combined_log)?;
    let surface = read_converged_energy(surface_log)?;
    let adsorbate = read_converged_energy(adsorbate_log)?;
    Ok(EnergyRecord {
        name: name.to_string(),
        adsorption_energy: adsorption_energy(combined, surface, adsorbate, multiplier),
        combined,
        surface,
        adsorbate: multiplier * adsorbate,
    })
}

/// An energy log in a batch that could not be reduced.
#[derive(Debug)]
pub struct EnergyFailure {
    pub path: PathBuf,
    pub error: WorkflowError,
}

#[derive(Debug, Default)]
pub struct FolderReport {
    /// Records sorted by name.
    pub records: Vec<EnergyRecord>,
    pub failures: Vec<EnergyFailure>,
}

/// The configuration name an energy log stands for.
pub fn record_name(file_name: &str) -> &str {
    file_name
        .strip_prefix(ENERGY_LOG_PREFIX)
        .unwrap_or(file_name)
}

/// Reduces every energy log in `dir` against shared surface and adsorbate logs.
///
/// Subdirectories are skipped. A log that cannot be read or parsed is recorded as
/// a failure; only an unreadable surface/adsorbate reference or `dir` itself
/// aborts.
#[instrument(skip_all, name = "energy_workflow", fields(dir = %dir.display()))]
pub fn adsorption_energies_of_folder(
    dir: &Path,
    surface_log: &Path,
    adsorbate_log: &Path,
    multiplier: f64,
) -> Result<FolderReport, WorkflowError> {
    let surface = read_converged_energy(surface_log)?;
    let adsorbate = read_converged_energy(adsorbate_log)?;
    debug!(surface, adsorbate, multiplier, "Loaded reference energies.");

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| WorkflowError::io(dir, e))? {
        let entry = entry.map_err(|e| WorkflowError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut report = FolderReport::default();
    for path in paths {
        let name = path
            .file_name()
            .map(|n| record_name(&n.to_string_lossy()).to_string())
            .unwrap_or_default();
        match read_converged_energy(&path) {
            Ok(combined) => report.records.push(EnergyRecord {
                name,
                adsorption_energy: adsorption_energy(combined, surface, adsorbate, multiplier),
                combined,
                surface,
                adsorbate: multiplier * adsorbate,
            }),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping energy log.");
                report.failures.push(EnergyFailure {
                    path,
                    error: e.into(),
                });
            }
        }
    }
    report.records.sort_by(|a, b| a.name.cmp(&b.name));

    info!(
        records = report.records.len(),
        failed = report.failures.len(),
        "Energy reduction complete."
    );
    Ok(report)
}

/// Mean converged energy of several logs.
pub fn mean_converged_energy<P: AsRef<Path>>(paths: &[P]) -> Result<f64, WorkflowError> {
    if paths.is_empty() {
        return Err(WorkflowError::NoEnergyLogs);
    }
    let mut total = 0.0;
    for path in paths {
        total += read_converged_energy(path.as_ref())?;
    }
    Ok(total / paths.len() as f64)
}

/// Writes records as CSV with a `name,adsorption_energy,combined,surface,adsorbate` header.
pub fn write_csv<W: Write>(records: &[EnergyRecord], writer: W) -> Result<(), WorkflowError> {
    let mut csv = csv::Writer::from_writer(writer);
    for record in records {
        csv.serialize(record)?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_csv_to_path(records: &[EnergyRecord], path: &Path) -> Result<(), WorkflowError> {
    let file = fs::File::create(path).map_err(|e| WorkflowError::io(path, e))?;
    write_csv(records, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn log(dir: &Path, name: &str, energy: f64) -> PathBuf {
        let path = dir.join(name);
        fs::write(
            &path,
            format!(
                "DAV:   1    -0.1E+02   -0.1E+02   -0.1E+03  1000   0.1E+02\n\
                 1 F= {energy:.8E} E0= {energy:.8E}  d E =-0.1E+02\n"
            ),
        )
        .unwrap();
        path
    }

    #[test]
    fn adsorption_energy_subtracts_scaled_references() {
        assert!((adsorption_energy(-10.0, -8.0, -1.0, 1.0) - (-1.0)).abs() < 1e-9);
        assert!((adsorption_energy(-10.0, -8.0, -2.0, 0.5) - (-1.0)).abs() < 1e-9);
    }

    #[test]
    fn compute_reads_all_three_logs() {
        let dir = tempdir().unwrap();
        let record = compute(
            "H2O_Vac_O0_HDL",
            &log(dir.path(), "OSZICAR_both", -10.0),
            &log(dir.path(), "OSZICAR_WO3", -8.0),
            &log(dir.path(), "OSZICAR_H2", -2.0),
            0.5,
        )
        .unwrap();
        assert!((record.adsorption_energy + 1.0).abs() < 1e-9);
        assert!((record.adsorbate + 1.0).abs() < 1e-9);
        assert!((record.combined + 10.0).abs() < 1e-9);
    }

    #[test]
    fn compute_fails_on_missing_log() {
        let dir = tempdir().unwrap();
        let surface = log(dir.path(), "OSZICAR_WO3", -8.0);
        let result = compute("x", &dir.path().join("nope"), &surface, &surface, 1.0);
        assert!(matches!(result, Err(WorkflowError::EnergyLog(_))));
    }

    #[test]
    fn folder_batch_sorts_records_and_isolates_failures() {
        let refs = tempdir().unwrap();
        let surface = log(refs.path(), "OSZICAR_WO3", -8.0);
        let adsorbate = log(refs.path(), "OSZICAR_H", -1.0);

        let post = tempdir().unwrap();
        log(post.path(), "OSZICAR_V-O1-HDL", -9.5);
        log(post.path(), "OSZICAR_O0", -10.0);
        log(post.path(), "POSCAR_H_above_O2", -9.0);
        fs::write(post.path().join("OSZICAR_broken"), "\n\n").unwrap();
        fs::create_dir(post.path().join("nested")).unwrap();

        let report =
            adsorption_energies_of_folder(post.path(), &surface, &adsorbate, 1.0).unwrap();
        let names: Vec<&str> = report.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["O0", "POSCAR_H_above_O2", "V-O1-HDL"]);
        assert!((report.records[0].adsorption_energy + 1.0).abs() < 1e-9);
        assert!((report.records[2].adsorption_energy + 0.5).abs() < 1e-9);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("OSZICAR_broken"));
    }

    #[test]
    fn folder_batch_applies_multiplier_to_raw_adsorbate_energy() {
        let refs = tempdir().unwrap();
        let surface = log(refs.path(), "OSZICAR_WO3", -8.0);
        let adsorbate = log(refs.path(), "OSZICAR_H2", -3.0);

        let post = tempdir().unwrap();
        log(post.path(), "OSZICAR_O0", -10.0);

        let report =
            adsorption_energies_of_folder(post.path(), &surface, &adsorbate, 0.5).unwrap();
        let record = &report.records[0];
        let expected = adsorption_energy(-10.0, -8.0, -3.0, 0.5);
        assert!((record.adsorption_energy - expected).abs() < 1e-9);
        assert!((record.adsorption_energy + 0.5).abs() < 1e-9);
        assert!((record.adsorbate + 1.5).abs() < 1e-9);
    }

    #[test]
    fn mean_energy_averages_logs() {
        let dir = tempdir().unwrap();
        let paths = [
            log(dir.path(), "a", -10.0),
            log(dir.path(), "b", -12.0),
        ];
        assert!((mean_converged_energy(&paths).unwrap() + 11.0).abs() < 1e-9);
        let none: [PathBuf; 0] = [];
        assert!(matches!(
            mean_converged_energy(&none),
            Err(WorkflowError::NoEnergyLogs)
        ));
    }

    #[test]
    fn csv_export_has_header_and_rows() {
        let records = vec![EnergyRecord {
            name: "O0".to_string(),
            adsorption_energy: -1.0,
            combined: -10.0,
            surface: -8.0,
            adsorbate: -1.0,
        }];
        let mut out = Vec::new();
        write_csv(&records, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("name,adsorption_energy,combined,surface,adsorbate")
        );
        assert_eq!(lines.next(), Some("O0,-1.0,-10.0,-8.0,-1.0"));
    }
}
