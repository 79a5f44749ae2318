use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "sitegen - generate adsorbate-on-surface configurations for slab calculations, lay them out as calculation folders, and reduce their energies.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel generation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate adsorbate configurations on a slab from a TOML batch file.
    Generate(GenerateArgs),
    /// List the atoms of one species in one z-layer of a structure.
    Layers(LayersArgs),
    /// Compute one adsorption energy from three energy logs.
    Energy(EnergyArgs),
    /// Compute adsorption energies for every energy log in a folder.
    Energies(EnergiesArgs),
    /// Turn generated structure files into calculation folders.
    Materialize(MaterializeArgs),
    /// List interatomic distances between two species, shortest first.
    Distances(DistancesArgs),
}

/// Arguments for the `generate` subcommand.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Path to the batch configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    // --- Input/Output Overrides ---
    /// Override the slab structure file.
    #[arg(short, long, value_name = "PATH")]
    pub slab: Option<PathBuf>,

    /// Override the output directory.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Override the custom adsorbate template file.
    #[arg(long, value_name = "PATH")]
    pub templates: Option<PathBuf>,

    // --- Generation Overrides ---
    /// Override the number of bottom layers to freeze.
    #[arg(long, value_name = "INT")]
    pub freeze_bottom_layers: Option<usize>,

    /// Override the k-point density (k-points per reciprocal atom).
    #[arg(long, value_name = "FLOAT", conflicts_with = "no_kpoints")]
    pub kpoint_density: Option<f64>,

    /// Do not write k-point files.
    #[arg(long)]
    pub no_kpoints: bool,

    /// Also write the bare slab, vacancy slabs and gas-phase adsorbates.
    #[arg(long)]
    pub references: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S defaults.height=2.0
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `layers` subcommand.
#[derive(Args, Debug)]
pub struct LayersArgs {
    /// Path to the structure file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Element symbol to classify.
    #[arg(short, long, required = true)]
    pub species: String,

    /// Layer rank: 0 is the lowest layer, -1 the topmost.
    #[arg(short, long, default_value_t = -1, allow_hyphen_values = true)]
    pub layer: isize,
}

/// The bare-surface and adsorbate reference logs shared by energy commands.
#[derive(Args, Debug)]
pub struct ReferenceLogs {
    /// Energy log of the bare surface.
    #[arg(long, required = true, value_name = "PATH")]
    pub surface: PathBuf,

    /// Energy log of the isolated adsorbate.
    #[arg(long, required = true, value_name = "PATH")]
    pub adsorbate: PathBuf,

    /// Factor applied to the adsorbate energy (e.g. 0.5 for half a diatomic).
    #[arg(short, long, default_value_t = 1.0)]
    pub multiplier: f64,
}

/// Arguments for the `energy` subcommand.
#[derive(Args, Debug)]
pub struct EnergyArgs {
    /// Energy log of the combined surface and adsorbate.
    #[arg(long, required = true, value_name = "PATH")]
    pub combined: PathBuf,

    #[command(flatten)]
    pub references: ReferenceLogs,
}

/// Arguments for the `energies` subcommand.
#[derive(Args, Debug)]
pub struct EnergiesArgs {
    /// Folder of per-configuration energy logs.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub dir: PathBuf,

    #[command(flatten)]
    pub references: ReferenceLogs,

    /// Write the records as CSV to this path instead of printing a table.
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,
}

/// Arguments for the `materialize` subcommand.
#[derive(Args, Debug)]
pub struct MaterializeArgs {
    /// Generated structure files, or directories containing them.
    #[arg(required = true, value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Directory holding INCAR, KPOINTS, POTCAR and the job file.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub templates: PathBuf,

    /// Directory under which the calculation folders are created.
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    pub root: PathBuf,

    /// Main folder name. Defaults to the molecule of each configuration.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Name of the job script in the template directory.
    #[arg(long, default_value = "gpu.slurm")]
    pub job_file: String,

    /// Text appended to every job name.
    #[arg(long, default_value = "")]
    pub trail: String,
}

/// Arguments for the `distances` subcommand.
#[derive(Args, Debug)]
pub struct DistancesArgs {
    /// Path to the structure file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// First element symbol.
    pub first: String,

    /// Second element symbol.
    pub second: String,

    /// Show only the shortest N pairs.
    #[arg(short = 'n', long, value_name = "INT")]
    pub limit: Option<usize>,
}
