pub mod defaults;

use crate::cli::GenerateArgs;
use crate::error::{CliError, Result};
use defaults::DefaultsConfig;
use serde::Deserialize;
use sitegen::core::naming::orientation::Orientation;
use sitegen::engine::config as core_config;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
enum PartialSite {
    Single {
        species: String,
        index: usize,
        layer: Option<isize>,
    },
    Average {
        species: String,
        indices: Vec<usize>,
        layer: Option<isize>,
    },
    Position {
        x: f64,
        y: f64,
    },
}

impl PartialSite {
    fn into_site(self, default_layer: isize) -> core_config::SiteSpec {
        match self {
            PartialSite::Single {
                species,
                index,
                layer,
            } => core_config::SiteSpec::Single {
                species,
                layer: layer.unwrap_or(default_layer),
                index,
            },
            PartialSite::Average {
                species,
                indices,
                layer,
            } => core_config::SiteSpec::Average {
                species,
                layer: layer.unwrap_or(default_layer),
                indices,
            },
            PartialSite::Position { x, y } => core_config::SiteSpec::Position { x, y },
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialDefaults {
    height: Option<f64>,
    vacancy_height: Option<f64>,
    rotation: Option<f64>,
    layer: Option<isize>,
    orientation: Option<Orientation>,
    displacement: Option<[f64; 2]>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialAdsorbate {
    molecule: String,
    site: PartialSite,
    height: Option<f64>,
    displacement: Option<[f64; 2]>,
    orientation: Option<Orientation>,
    rotation: Option<f64>,
    #[serde(default)]
    vacancy: bool,
}

/// A batch file as written by the user; every field may be overridden from the
/// command line.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialGenerationConfig {
    slab: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    templates: Option<PathBuf>,
    freeze_bottom_layers: Option<usize>,
    kpoint_density: Option<f64>,
    kpoints: Option<bool>,
    defaults: Option<PartialDefaults>,
    #[serde(default)]
    configurations: Vec<PartialAdsorbate>,
    /// Relative paths in the file are resolved against this directory.
    #[serde(skip)]
    base_dir: PathBuf,
}

impl PartialGenerationConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading batch configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    fn resolve(&self, path: PathBuf) -> PathBuf {
        if path.is_absolute() {
            path
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn merge_with_cli(mut self, args: &GenerateArgs) -> Result<core_config::GenerationConfig> {
        self.apply_set_values(&args.set_values)?;
        let defaults = DefaultsConfig::default();
        let file_defaults = self.defaults.take().unwrap_or_default();

        let slab_path = match (&args.slab, self.slab.take()) {
            (Some(path), _) => path.clone(),
            (None, Some(path)) => self.resolve(path),
            (None, None) => {
                return Err(CliError::Config(
                    "A value for 'slab' is required either in the config file or via --slab."
                        .to_string(),
                ));
            }
        };
        let output_dir = match (&args.output_dir, self.output_dir.take()) {
            (Some(path), _) => path.clone(),
            (None, Some(path)) => self.resolve(path),
            (None, None) => {
                return Err(CliError::Config(
                    "A value for 'output-dir' is required either in the config file or via --output-dir."
                        .to_string(),
                ));
            }
        };
        let templates_path = match (&args.templates, self.templates.take()) {
            (Some(path), _) => Some(path.clone()),
            (None, file) => file.map(|p| self.resolve(p)),
        };

        let kpoint_density = if args.no_kpoints || self.kpoints == Some(false) {
            None
        } else {
            Some(
                args.kpoint_density
                    .or(self.kpoint_density)
                    .unwrap_or(defaults.kpoint_density),
            )
        };

        let configurations = self
            .configurations
            .into_iter()
            .enumerate()
            .map(|(i, partial)| Self::merge_adsorbate(partial, &file_defaults, &defaults, i))
            .collect::<Result<Vec<_>>>()?;

        core_config::GenerationConfigBuilder::new()
            .slab_path(slab_path)
            .output_dir(output_dir)
            .templates_path(templates_path)
            .freeze_bottom_layers(
                args.freeze_bottom_layers
                    .or(self.freeze_bottom_layers)
                    .unwrap_or(defaults.freeze_bottom_layers),
            )
            .kpoint_density(kpoint_density)
            .configurations(configurations)
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    fn merge_adsorbate(
        partial: PartialAdsorbate,
        file_defaults: &PartialDefaults,
        defaults: &DefaultsConfig,
        position: usize,
    ) -> Result<core_config::AdsorbateConfig> {
        let height = partial.height.unwrap_or_else(|| {
            if partial.vacancy {
                file_defaults
                    .vacancy_height
                    .unwrap_or(defaults.vacancy_height)
            } else {
                file_defaults.height.unwrap_or(defaults.height)
            }
        });
        let [dx, dy] = partial
            .displacement
            .or(file_defaults.displacement)
            .unwrap_or([0.0, 0.0]);
        let layer = file_defaults.layer.unwrap_or(defaults.layer);

        let mut builder = core_config::AdsorbateConfigBuilder::new()
            .molecule(&partial.molecule)
            .site(partial.site.into_site(layer))
            .height(height)
            .displacement(dx, dy)
            .rotation(
                partial
                    .rotation
                    .or(file_defaults.rotation)
                    .unwrap_or(defaults.rotation),
            )
            .vacancy(partial.vacancy);
        if let Some(orientation) = partial.orientation.or(file_defaults.orientation) {
            builder = builder.orientation(orientation);
        }
        builder
            .build()
            .map_err(|e| CliError::Config(format!("configurations[{}]: {}", position, e)))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;
            let float = || {
                value_str.parse::<f64>().map_err(|_| {
                    CliError::Config(format!("Invalid float value for {}: {}", key, value_str))
                })
            };

            match key {
                "defaults.height" => {
                    self.defaults.get_or_insert_with(Default::default).height = Some(float()?);
                }
                "defaults.vacancy-height" => {
                    self.defaults
                        .get_or_insert_with(Default::default)
                        .vacancy_height = Some(float()?);
                }
                "defaults.rotation" => {
                    self.defaults.get_or_insert_with(Default::default).rotation = Some(float()?);
                }
                "defaults.layer" => {
                    self.defaults.get_or_insert_with(Default::default).layer =
                        Some(value_str.parse().map_err(|_| {
                            CliError::Config(format!(
                                "Invalid integer value for {}: {}",
                                key, value_str
                            ))
                        })?);
                }
                "defaults.orientation" => {
                    self.defaults.get_or_insert_with(Default::default).orientation =
                        Some(value_str.parse().map_err(|e| {
                            CliError::Config(format!("Invalid value for {}: {}", key, e))
                        })?);
                }
                "kpoint-density" => {
                    self.kpoint_density = Some(float()?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}
