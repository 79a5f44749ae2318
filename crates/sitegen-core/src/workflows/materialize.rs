use crate::core::io::kpoints::kpoints_name_for;
use crate::core::naming::identifier::{ConfigIdentifier, PREFIX};
use crate::core::naming::jobs::{folder_name, job_name};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::workflows::error::WorkflowError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_JOB_FILE: &str = "gpu.slurm";
const JOB_NAME_PLACEHOLDER: &str = "JOBNAME";
const CONTROL_FILES: [&str; 2] = ["INCAR", "POTCAR"];
const KPOINTS_FILE: &str = "KPOINTS";

/// Where and how configuration folders are laid out.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializeOptions {
    /// Directory under which `{main}/{folder}` is created.
    pub root: PathBuf,
    /// Overrides the molecule tag as the main directory name.
    pub main_name: Option<String>,
    /// Holds `INCAR`, `KPOINTS`, `POTCAR` and the job file.
    pub templates_dir: PathBuf,
    pub job_file: String,
    /// Appended to every job name.
    pub trail: String,
}

impl MaterializeOptions {
    pub fn new(root: PathBuf, templates_dir: PathBuf) -> Self {
        Self {
            root,
            main_name: None,
            templates_dir,
            job_file: DEFAULT_JOB_FILE.to_string(),
            trail: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MaterializedFolder {
    pub identifier: ConfigIdentifier,
    pub folder: PathBuf,
    pub job_name: String,
}

#[derive(Debug, Default)]
pub struct MaterializeReport {
    pub folders: Vec<MaterializedFolder>,
    pub failures: Vec<(PathBuf, WorkflowError)>,
}

fn template(options: &MaterializeOptions, name: &str) -> Result<PathBuf, WorkflowError> {
    let path = options.templates_dir.join(name);
    if path.is_file() {
        Ok(path)
    } else {
        Err(WorkflowError::MissingTemplate {
            path: path.to_string_lossy().to_string(),
        })
    }
}

fn copy(from: &Path, to: &Path) -> Result<(), WorkflowError> {
    fs::copy(from, to)
        .map(|_| ())
        .map_err(|e| WorkflowError::io(from, e))
}

fn move_file(from: &Path, to: &Path) -> Result<(), WorkflowError> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    copy(from, to)?;
    fs::remove_file(from).map_err(|e| WorkflowError::io(from, e))
}

/// Turns one generated structure file into a ready-to-submit calculation folder.
///
/// The file must be named by its configuration identifier. A sibling k-point file
/// written by generation (`KPOINTS_{...}`) is preferred over the template `KPOINTS`.
#[instrument(skip_all, fields(file = %poscar_path.display()))]
pub fn materialize(
    poscar_path: &Path,
    options: &MaterializeOptions,
) -> Result<MaterializedFolder, WorkflowError> {
    let file_name = poscar_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let identifier: ConfigIdentifier =
        file_name
            .parse()
            .map_err(|source| WorkflowError::Identifier {
                name: file_name.clone(),
                source,
            })?;

    // Resolve every template before touching the filesystem.
    let controls = CONTROL_FILES
        .iter()
        .map(|name| template(options, name).map(|path| (*name, path)))
        .collect::<Result<Vec<_>, _>>()?;
    let job_template = template(options, &options.job_file)?;
    let sibling_kpoints = poscar_path.with_file_name(kpoints_name_for(&file_name));
    let kpoints = if sibling_kpoints.is_file() {
        sibling_kpoints
    } else {
        template(options, KPOINTS_FILE)?
    };

    let main = options
        .main_name
        .clone()
        .unwrap_or_else(|| identifier.molecule().to_string());
    let folder = options.root.join(main).join(folder_name(&identifier));
    if folder.exists() {
        debug!(folder = %folder.display(), "Removing stale configuration folder.");
        fs::remove_dir_all(&folder).map_err(|e| WorkflowError::io(&folder, e))?;
    }
    fs::create_dir_all(&folder).map_err(|e| WorkflowError::io(&folder, e))?;

    for (name, path) in &controls {
        copy(path, &folder.join(name))?;
    }
    copy(&kpoints, &folder.join(KPOINTS_FILE))?;

    let name = job_name(&identifier, &options.trail);
    let content =
        fs::read_to_string(&job_template).map_err(|e| WorkflowError::io(&job_template, e))?;
    let job_path = folder.join(&options.job_file);
    fs::write(&job_path, content.replace(JOB_NAME_PLACEHOLDER, &name))
        .map_err(|e| WorkflowError::io(&job_path, e))?;

    move_file(poscar_path, &folder.join(PREFIX))?;

    info!(folder = %folder.display(), job = %name, "Materialized configuration.");
    Ok(MaterializedFolder {
        identifier,
        folder,
        job_name: name,
    })
}

/// Materializes every `POSCAR_*` file directly inside `dir`, in name order.
#[instrument(skip_all, name = "materialize_workflow", fields(dir = %dir.display()))]
pub fn materialize_all(
    dir: &Path,
    options: &MaterializeOptions,
    reporter: &ProgressReporter,
) -> Result<MaterializeReport, WorkflowError> {
    let prefix = format!("{PREFIX}_");
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| WorkflowError::io(dir, e))? {
        let path = entry.map_err(|e| WorkflowError::io(dir, e))?.path();
        let is_structure = path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with(&prefix));
        if path.is_file() && is_structure {
            paths.push(path);
        }
    }
    paths.sort();

    reporter.report(Progress::BatchStart {
        total: paths.len() as u64,
    });
    let mut report = MaterializeReport::default();
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        match materialize(&path, options) {
            Ok(folder) => {
                reporter.report(Progress::ItemDone {
                    name,
                    success: true,
                });
                report.folders.push(folder);
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Skipping configuration file.");
                reporter.report(Progress::ItemDone {
                    name,
                    success: false,
                });
                report.failures.push((path, e));
            }
        }
    }
    reporter.report(Progress::BatchFinish);
    Ok(report)
}
