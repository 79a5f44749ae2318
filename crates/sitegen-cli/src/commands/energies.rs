use crate::cli::EnergiesArgs;
use crate::error::{CliError, Result};
use sitegen::workflows::energy;
use tracing::info;

pub fn run(args: EnergiesArgs) -> Result<()> {
    let report = energy::adsorption_energies_of_folder(
        &args.dir,
        &args.references.surface,
        &args.references.adsorbate,
        args.references.multiplier,
    )?;

    match &args.csv {
        Some(path) => {
            energy::write_csv_to_path(&report.records, path)?;
            info!(path = %path.display(), "Wrote energy table.");
            println!(
                "Wrote {} record(s) to {}.",
                report.records.len(),
                path.display()
            );
        }
        None => {
            let width = report
                .records
                .iter()
                .map(|r| r.name.len())
                .max()
                .unwrap_or(4)
                .max(4);
            println!("{:<width$}  {:>16}", "name", "adsorption_energy");
            for record in &report.records {
                println!(
                    "{:<width$}  {:>16.8}",
                    record.name, record.adsorption_energy
                );
            }
        }
    }

    for failure in &report.failures {
        eprintln!("  ✗ {}: {}", failure.path.display(), failure.error);
    }
    if report.failures.is_empty() {
        Ok(())
    } else {
        Err(CliError::Partial {
            failed: report.failures.len(),
            total: report.failures.len() + report.records.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use tempfile::tempdir;

    fn oszicar(energy: f64) -> String {
        format!("   1 F= {energy:.8E} E0= {energy:.8E}  d E =0.0\n")
    }

    #[test]
    fn folder_energies_are_exported_as_csv() {
        let dir = tempdir().unwrap();
        let post = dir.path().join("post");
        fs::create_dir(&post).unwrap();
        fs::write(post.join("OSZICAR_O0"), oszicar(-10.0)).unwrap();
        let csv = dir.path().join("energies.csv");
        let surface = dir.path().join("OSZICAR_WO3");
        let adsorbate = dir.path().join("OSZICAR_H2");
        fs::write(&surface, oszicar(-8.0)).unwrap();
        fs::write(&adsorbate, oszicar(-2.0)).unwrap();

        let argv = [
            "sitegen",
            "energies",
            "-d",
            post.to_str().unwrap(),
            "--surface",
            surface.to_str().unwrap(),
            "--adsorbate",
            adsorbate.to_str().unwrap(),
            "-m",
            "0.5",
            "--csv",
            csv.to_str().unwrap(),
        ];
        let Commands::Energies(args) = Cli::parse_from(argv).command else {
            panic!("Expected 'energies' subcommand");
        };
        run(args).unwrap();

        let content = fs::read_to_string(csv).unwrap();
        assert!(content.starts_with("name,adsorption_energy,combined,surface,adsorbate\n"));
        assert!(content.contains("O0,-1.0,-10.0,-8.0,-1.0"));
    }
}
