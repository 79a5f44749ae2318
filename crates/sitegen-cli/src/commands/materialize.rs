use crate::cli::MaterializeArgs;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use sitegen::engine::progress::ProgressReporter;
use sitegen::workflows::materialize::{MaterializeOptions, materialize, materialize_all};
use tracing::{info, warn};

pub fn run(args: MaterializeArgs) -> Result<()> {
    let options = MaterializeOptions {
        root: args.root,
        main_name: args.name,
        templates_dir: args.templates,
        job_file: args.job_file,
        trail: args.trail,
    };
    if !options.templates_dir.is_dir() {
        return Err(CliError::Argument(format!(
            "Template directory does not exist: {}",
            options.templates_dir.display()
        )));
    }

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let (mut done, mut failed) = (0usize, 0usize);
    for input in &args.inputs {
        if input.is_dir() {
            info!(dir = %input.display(), "Materializing every structure file in directory.");
            let report = materialize_all(input, &options, &reporter)?;
            for folder in &report.folders {
                println!("  ✓ {} ({})", folder.folder.display(), folder.job_name);
            }
            for (path, error) in &report.failures {
                eprintln!("  ✗ {}: {}", path.display(), error);
            }
            done += report.folders.len();
            failed += report.failures.len();
        } else {
            match materialize(input, &options) {
                Ok(folder) => {
                    println!("  ✓ {} ({})", folder.folder.display(), folder.job_name);
                    done += 1;
                }
                Err(e) => {
                    warn!(file = %input.display(), error = %e, "Skipping configuration file.");
                    eprintln!("  ✗ {}: {}", input.display(), e);
                    failed += 1;
                }
            }
        }
    }

    println!("Materialized {} folder(s).", done);
    if failed == 0 {
        Ok(())
    } else {
        Err(CliError::Partial {
            failed,
            total: done + failed,
        })
    }
}
