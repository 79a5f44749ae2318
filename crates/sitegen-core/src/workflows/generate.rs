use crate::core::io::kpoints::{Kpoints, kpoints_name_for};
use crate::core::io::poscar::PoscarFile;
use crate::core::io::traits::StructureFile;
use crate::core::models::structure::Structure;
use crate::core::molecules::{MoleculeTemplate, TemplateLibrary};
use crate::core::naming::identifier::{ConfigIdentifier, IdentifierError, PREFIX};
use crate::engine::config::{AdsorbateConfig, GenerationConfig, SiteSpec};
use crate::engine::error::EngineError;
use crate::engine::layers::freeze_bottom_layers;
use crate::engine::placement::{VacancyOutcome, place_adsorbate, remove_atom_at};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::site::resolve_anchor;
use crate::workflows::error::WorkflowError;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Vacuum (Angstroms) around an isolated adsorbate reference cell.
pub const DEFAULT_VACUUM: f64 = 5.0;

/// One configuration written to disk.
#[derive(Debug, Clone)]
pub struct GeneratedConfiguration {
    pub identifier: ConfigIdentifier,
    pub path: PathBuf,
    pub kpoints_path: Option<PathBuf>,
    pub vacancy: VacancyOutcome,
}

/// A configuration that could not be generated. `position` is its index in the input list.
#[derive(Debug)]
pub struct ConfigurationFailure {
    pub position: usize,
    pub label: String,
    pub error: WorkflowError,
}

#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Successful configurations, in input order.
    pub generated: Vec<GeneratedConfiguration>,
    /// Failed configurations, in input order.
    pub failures: Vec<ConfigurationFailure>,
}

impl GenerationReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Loads a structure file, mapping failures to a [`WorkflowError`] naming the path.
pub fn read_structure(path: &Path) -> Result<Structure, WorkflowError> {
    PoscarFile::read_from_path(path)
        .map(|(structure, _)| structure)
        .map_err(|source| WorkflowError::ReadStructure {
            path: path.to_string_lossy().to_string(),
            source,
        })
}

fn write_structure(structure: &Structure, path: &Path) -> Result<(), WorkflowError> {
    PoscarFile::write_structure_to_path(structure, path).map_err(|source| {
        WorkflowError::WriteStructure {
            path: path.to_string_lossy().to_string(),
            source,
        }
    })
}

fn create_dir(path: &Path) -> Result<(), WorkflowError> {
    fs::create_dir_all(path).map_err(|e| WorkflowError::io(path, e))
}

/// Writes the k-point mesh that pairs with `structure_path`. Failures are logged
/// and skipped.
pub fn write_kpoints_for(
    structure: &Structure,
    structure_path: &Path,
    kppa: f64,
) -> Option<PathBuf> {
    let name = structure_path.file_name()?.to_string_lossy();
    let path = structure_path.with_file_name(kpoints_name_for(&name));
    let result =
        Kpoints::automatic_density(structure, kppa).and_then(|mesh| mesh.write_to_path(&path));
    match result {
        Ok(()) => Some(path),
        Err(e) => {
            warn!(structure = %structure_path.display(), error = %e, "Skipping k-point file.");
            None
        }
    }
}

/// Loads the built-in adsorbates plus the templates of an optional TOML file.
pub fn load_templates(path: Option<&Path>) -> Result<TemplateLibrary, WorkflowError> {
    let mut library = TemplateLibrary::builtin();
    if let Some(path) = path {
        let count = library.load_into(path)?;
        info!(count, path = %path.display(), "Loaded custom adsorbate templates.");
    }
    Ok(library)
}

/// Places one configuration and writes it as `{output_dir}/{identifier}`.
pub fn generate_one(
    slab: &Structure,
    template: &MoleculeTemplate,
    config: &AdsorbateConfig,
    output_dir: &Path,
    kpoint_density: Option<f64>,
) -> Result<GeneratedConfiguration, WorkflowError> {
    let placement = place_adsorbate(slab, template, config)?;
    let path = output_dir.join(placement.identifier.to_string());
    write_structure(&placement.structure, &path)?;
    let kpoints_path =
        kpoint_density.and_then(|kppa| write_kpoints_for(&placement.structure, &path, kppa));
    Ok(GeneratedConfiguration {
        identifier: placement.identifier,
        path,
        kpoints_path,
        vacancy: placement.vacancy,
    })
}

fn describe(config: &AdsorbateConfig) -> String {
    let site = match &config.site {
        SiteSpec::Single { species, index, .. } => format!("{species}{index}"),
        SiteSpec::Average {
            species, indices, ..
        } => format!("{species}{indices:?}"),
        SiteSpec::Position { x, y } => format!("({x}, {y})"),
    };
    format!("{} at {site}", config.molecule)
}

/// Generates every configuration of `config` into its output directory.
///
/// Per-configuration problems (unknown adsorbate, missing site, duplicate
/// identifier, write failure) are collected in the report and never stop the
/// batch. Only failing to load the slab or the templates, or to create the output
/// directory, aborts the run.
#[instrument(skip_all, name = "generation_workflow")]
pub fn run(
    config: &GenerationConfig,
    reporter: &ProgressReporter,
) -> Result<GenerationReport, WorkflowError> {
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    info!(slab = %config.slab_path.display(), "Loading slab and adsorbate templates.");
    let mut slab = read_structure(&config.slab_path)?;
    let library = load_templates(config.templates_path.as_deref())?;
    if config.freeze_bottom_layers > 0 {
        let frozen = freeze_bottom_layers(&mut slab, config.freeze_bottom_layers);
        info!(frozen, layers = config.freeze_bottom_layers, "Froze bottom layers.");
    }
    create_dir(&config.output_dir)?;
    reporter.report(Progress::PhaseFinish);

    // Identifiers are derived up front so duplicates are caught before any file is written.
    let mut failures = Vec::new();
    let mut jobs = Vec::new();
    let mut seen = HashSet::new();
    for (position, adsorbate) in config.configurations.iter().enumerate() {
        let label = describe(adsorbate);
        let named = library
            .get(&adsorbate.molecule)
            .ok_or_else(|| EngineError::UnknownAdsorbate(adsorbate.molecule.clone()))
            .and_then(|template| Ok((template, adsorbate.identifier(template)?)))
            .map_err(WorkflowError::from)
            .and_then(|(template, identifier)| {
                if seen.insert(identifier.clone()) {
                    Ok(template)
                } else {
                    Err(WorkflowError::DuplicateIdentifier(identifier.to_string()))
                }
            });
        match named {
            Ok(template) => jobs.push((position, label, template, adsorbate)),
            Err(error) => failures.push(ConfigurationFailure {
                position,
                label,
                error,
            }),
        }
    }

    reporter.report(Progress::PhaseStart { name: "Generation" });
    reporter.report(Progress::BatchStart {
        total: jobs.len() as u64,
    });
    let results: Vec<_> = jobs
        .into_par_iter()
        .map(|(position, label, template, adsorbate)| {
            let result = generate_one(
                &slab,
                template,
                adsorbate,
                &config.output_dir,
                config.kpoint_density,
            );
            let name = match &result {
                Ok(generated) => generated.identifier.to_string(),
                Err(_) => label.clone(),
            };
            reporter.report(Progress::ItemDone {
                name,
                success: result.is_ok(),
            });
            (position, label, result)
        })
        .collect();
    reporter.report(Progress::BatchFinish);
    reporter.report(Progress::PhaseFinish);

    let mut report = GenerationReport::default();
    for (position, label, result) in results {
        match result {
            Ok(generated) => report.generated.push(generated),
            Err(error) => failures.push(ConfigurationFailure {
                position,
                label,
                error,
            }),
        }
    }
    failures.sort_by_key(|f| f.position);
    for failure in &failures {
        warn!(
            position = failure.position,
            configuration = %failure.label,
            error = %failure.error,
            "Configuration skipped."
        );
    }
    report.failures = failures;

    info!(
        generated = report.generated.len(),
        failed = report.failures.len(),
        "Generation complete."
    );
    Ok(report)
}

/// Writes the bare slab as `{dir}/POSCAR` (plus `KPOINTS`).
pub fn write_reference_slab(
    slab: &Structure,
    dir: &Path,
    kpoint_density: Option<f64>,
) -> Result<PathBuf, WorkflowError> {
    create_dir(dir)?;
    let path = dir.join(PREFIX);
    write_structure(slab, &path)?;
    if let Some(kppa) = kpoint_density {
        write_kpoints_for(slab, &path, kppa);
    }
    Ok(path)
}

/// Writes the slab with the topmost atom of the site's species under its anchor
/// removed, as `{dir}/POSCAR` (plus `KPOINTS`). Only single-index sites name an
/// atom to remove.
pub fn write_vacancy_slab(
    slab: &Structure,
    site: &SiteSpec,
    dir: &Path,
    kpoint_density: Option<f64>,
) -> Result<(PathBuf, VacancyOutcome), WorkflowError> {
    let species = match site {
        SiteSpec::Single { species, .. } => species,
        SiteSpec::Average { .. } => {
            return Err(EngineError::from(IdentifierError::VacancyWithAverage).into());
        }
        SiteSpec::Position { .. } => {
            return Err(EngineError::from(IdentifierError::VacancyWithPosition).into());
        }
    };
    let anchor = resolve_anchor(slab, site)?;
    let mut vacant = slab.clone();
    let outcome = remove_atom_at(&mut vacant, &anchor, species);
    let path = write_reference_slab(&vacant, dir, kpoint_density)?;
    Ok((path, outcome))
}

/// Writes a fresh copy of `template` centered in an orthorhombic box with
/// `vacuum` Angstroms on every side, as `{dir}/POSCAR_{molecule}`.
pub fn write_adsorbate_in_vacuum(
    template: &MoleculeTemplate,
    vacuum: f64,
    dir: &Path,
) -> Result<PathBuf, WorkflowError> {
    create_dir(dir)?;
    let mut molecule = template.instantiate();
    molecule.center_in_vacuum(vacuum);
    let path = dir.join(format!("{PREFIX}_{}", template.name));
    write_structure(&molecule, &path)?;
    Ok(path)
}

/// Reference structures written next to a batch.
#[derive(Debug, Default)]
pub struct ReferenceSet {
    pub slab: PathBuf,
    pub vacancies: Vec<PathBuf>,
    pub molecules: Vec<PathBuf>,
}

/// Writes the reference structures a batch needs for its energy reduction under
/// `{output_dir}/references`: the bare slab in `slab/`, one vacancy slab per
/// distinct vacancy site in `V-{site}/`, and every adsorbate used in `molecules/`.
///
/// Vacancy sites that cannot be resolved and unknown adsorbates are logged and
/// skipped; generation reports them per configuration anyway.
#[instrument(skip_all, name = "reference_workflow")]
pub fn write_references(
    config: &GenerationConfig,
    vacuum: f64,
) -> Result<ReferenceSet, WorkflowError> {
    let mut slab = read_structure(&config.slab_path)?;
    let library = load_templates(config.templates_path.as_deref())?;
    if config.freeze_bottom_layers > 0 {
        freeze_bottom_layers(&mut slab, config.freeze_bottom_layers);
    }
    let root = config.output_dir.join("references");
    let mut references = ReferenceSet {
        slab: write_reference_slab(&slab, &root.join("slab"), config.kpoint_density)?,
        ..Default::default()
    };

    let mut seen_sites = HashSet::new();
    let mut seen_molecules = HashSet::new();
    for adsorbate in &config.configurations {
        let folder = format!("V-{}", adsorbate.site.token());
        if adsorbate.vacancy && seen_sites.insert(folder.clone()) {
            let dir = root.join(&folder);
            match write_vacancy_slab(&slab, &adsorbate.site, &dir, config.kpoint_density) {
                Ok((path, _)) => references.vacancies.push(path),
                Err(e) => warn!(site = %folder, error = %e, "Skipping vacancy reference."),
            }
        }
        if seen_molecules.insert(adsorbate.molecule.as_str()) {
            match library.get(&adsorbate.molecule) {
                Some(template) => references.molecules.push(write_adsorbate_in_vacuum(
                    template,
                    vacuum,
                    &root.join("molecules"),
                )?),
                None => warn!(
                    molecule = %adsorbate.molecule,
                    "Skipping unknown adsorbate reference."
                ),
            }
        }
    }

    info!(
        vacancies = references.vacancies.len(),
        molecules = references.molecules.len(),
        "Wrote reference structures."
    );
    Ok(references)
}
