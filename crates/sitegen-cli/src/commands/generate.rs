use crate::cli::GenerateArgs;
use crate::config::PartialGenerationConfig;
use crate::config::defaults::DefaultsConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use sitegen::{engine::progress::ProgressReporter, workflows};
use tracing::{info, warn};

pub fn run(args: GenerateArgs) -> Result<()> {
    let partial_config = PartialGenerationConfig::from_file(&args.config)?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Generating {} configuration(s) from {}...",
        config.configurations.len(),
        config.slab_path.display()
    );
    let report = workflows::generate::run(&config, &reporter)?;

    for generated in &report.generated {
        println!("  ✓ {}", generated.path.display());
    }
    for failure in &report.failures {
        eprintln!(
            "  ✗ configuration #{} ({}): {}",
            failure.position, failure.label, failure.error
        );
    }

    if args.references {
        let vacuum = DefaultsConfig::default().vacuum;
        let references = workflows::generate::write_references(&config, vacuum)?;
        println!(
            "Reference structures: bare slab at {}, {} vacancy slab(s), {} gas-phase adsorbate(s).",
            references.slab.display(),
            references.vacancies.len(),
            references.molecules.len()
        );
    }

    if report.is_complete() {
        println!(
            "Wrote {} configuration(s) to {}.",
            report.generated.len(),
            config.output_dir.display()
        );
        Ok(())
    } else {
        warn!(
            failed = report.failures.len(),
            "Some configurations were not generated."
        );
        Err(CliError::Partial {
            failed: report.failures.len(),
            total: config.configurations.len(),
        })
    }
}
