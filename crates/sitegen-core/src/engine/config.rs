use crate::core::io::kpoints::DEFAULT_KPPA;
use crate::core::molecules::MoleculeTemplate;
use crate::core::naming::identifier::{ConfigIdentifier, SiteToken};
use crate::core::naming::orientation::{Orientation, OrientationCode};
use crate::engine::error::EngineError;
use crate::engine::layers::TOP_LAYER;
use nalgebra::Vector2;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Where on the surface an adsorbate goes.
#[derive(Debug, Clone, PartialEq)]
pub enum SiteSpec {
    /// One atom of `species` in layer `layer` (0 = lowest, -1 = topmost).
    Single {
        species: String,
        layer: isize,
        index: usize,
    },
    /// The in-plane mean of several atoms of one layer.
    Average {
        species: String,
        layer: isize,
        indices: Vec<usize>,
    },
    /// An explicit (x, y) anchor.
    Position { x: f64, y: f64 },
}

impl SiteSpec {
    pub fn top(species: &str, index: usize) -> Self {
        SiteSpec::Single {
            species: species.to_string(),
            layer: TOP_LAYER,
            index,
        }
    }

    pub fn species(&self) -> Option<&str> {
        match self {
            SiteSpec::Single { species, .. } | SiteSpec::Average { species, .. } => Some(species),
            SiteSpec::Position { .. } => None,
        }
    }

    /// The identifier token for this site. The layer rank is not part of it.
    pub fn token(&self) -> SiteToken {
        match self {
            SiteSpec::Single { species, index, .. } => SiteToken::Single {
                species: species.clone(),
                index: *index,
            },
            SiteSpec::Average {
                species, indices, ..
            } => SiteToken::Average {
                species: species.clone(),
                indices: indices.clone(),
            },
            SiteSpec::Position { x, y } => SiteToken::position(*x, *y),
        }
    }
}

/// One adsorbate configuration: what goes where, how high, and how it is turned.
#[derive(Debug, Clone, PartialEq)]
pub struct AdsorbateConfig {
    pub molecule: String,
    pub site: SiteSpec,
    pub height: f64,
    pub displacement: Vector2<f64>,
    /// `None` selects the template's default orientation.
    pub orientation: Option<Orientation>,
    /// Rotation about the surface normal in degrees.
    pub rotation: f64,
    pub vacancy: bool,
}

impl AdsorbateConfig {
    /// The orientation actually used when placing `template`.
    pub fn effective_orientation(&self, template: &MoleculeTemplate) -> Result<Orientation, EngineError> {
        let orientation = self.orientation.unwrap_or(template.default_orientation);
        if !template.class.supports(orientation) {
            return Err(EngineError::UnsupportedOrientation {
                molecule: self.molecule.clone(),
                class: template.class,
                orientation,
            });
        }
        Ok(orientation)
    }

    /// Derives the canonical identifier. Every encoding restriction is checked
    /// here, before any structure is touched.
    pub fn identifier(&self, template: &MoleculeTemplate) -> Result<ConfigIdentifier, EngineError> {
        if let SiteSpec::Average {
            species, indices, ..
        } = &self.site
        {
            if indices.is_empty() {
                return Err(EngineError::EmptyAveragingSet {
                    species: species.clone(),
                });
            }
        }
        let orientation = self.effective_orientation(template)?;
        let code = OrientationCode::new(orientation, self.rotation);
        Ok(ConfigIdentifier::new(
            &self.molecule,
            self.vacancy,
            self.site.token(),
            Some(code),
        )?)
    }
}

#[derive(Default)]
pub struct AdsorbateConfigBuilder {
    molecule: Option<String>,
    site: Option<SiteSpec>,
    height: Option<f64>,
    displacement: Option<Vector2<f64>>,
    orientation: Option<Orientation>,
    rotation: Option<f64>,
    vacancy: Option<bool>,
}

impl AdsorbateConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn molecule(mut self, molecule: &str) -> Self {
        self.molecule = Some(molecule.to_string());
        self
    }
    pub fn site(mut self, site: SiteSpec) -> Self {
        self.site = Some(site);
        self
    }
    pub fn height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }
    pub fn displacement(mut self, dx: f64, dy: f64) -> Self {
        self.displacement = Some(Vector2::new(dx, dy));
        self
    }
    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }
    pub fn rotation(mut self, degrees: f64) -> Self {
        self.rotation = Some(degrees);
        self
    }
    pub fn vacancy(mut self, vacancy: bool) -> Self {
        self.vacancy = Some(vacancy);
        self
    }

    pub fn build(self) -> Result<AdsorbateConfig, ConfigError> {
        let height = self.height.ok_or(ConfigError::MissingParameter("height"))?;
        if !height.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "height",
                reason: format!("{height} is not a finite number"),
            });
        }
        Ok(AdsorbateConfig {
            molecule: self
                .molecule
                .ok_or(ConfigError::MissingParameter("molecule"))?,
            site: self.site.ok_or(ConfigError::MissingParameter("site"))?,
            height,
            displacement: self.displacement.unwrap_or_else(Vector2::zeros),
            orientation: self.orientation,
            rotation: self.rotation.unwrap_or(0.0),
            vacancy: self.vacancy.unwrap_or(false),
        })
    }
}

/// Everything a batch generation run needs.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub slab_path: PathBuf,
    pub output_dir: PathBuf,
    pub configurations: Vec<AdsorbateConfig>,
    pub templates_path: Option<PathBuf>,
    pub freeze_bottom_layers: usize,
    /// k-points per reciprocal atom; `None` skips the k-point files.
    pub kpoint_density: Option<f64>,
}

#[derive(Default)]
pub struct GenerationConfigBuilder {
    slab_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    configurations: Vec<AdsorbateConfig>,
    templates_path: Option<PathBuf>,
    freeze_bottom_layers: Option<usize>,
    kpoint_density: Option<Option<f64>>,
}

impl GenerationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slab_path(mut self, path: PathBuf) -> Self {
        self.slab_path = Some(path);
        self
    }
    pub fn output_dir(mut self, path: PathBuf) -> Self {
        self.output_dir = Some(path);
        self
    }
    pub fn configuration(mut self, config: AdsorbateConfig) -> Self {
        self.configurations.push(config);
        self
    }
    pub fn configurations(mut self, configs: Vec<AdsorbateConfig>) -> Self {
        self.configurations.extend(configs);
        self
    }
    pub fn templates_path(mut self, path: Option<PathBuf>) -> Self {
        self.templates_path = path;
        self
    }
    pub fn freeze_bottom_layers(mut self, n: usize) -> Self {
        self.freeze_bottom_layers = Some(n);
        self
    }
    pub fn kpoint_density(mut self, kppa: Option<f64>) -> Self {
        self.kpoint_density = Some(kppa);
        self
    }

    pub fn build(self) -> Result<GenerationConfig, ConfigError> {
        let kpoint_density = self.kpoint_density.unwrap_or(Some(DEFAULT_KPPA));
        if let Some(kppa) = kpoint_density {
            if !(kppa > 0.0) {
                return Err(ConfigError::InvalidParameter {
                    name: "kpoint_density",
                    reason: format!("{kppa} must be positive"),
                });
            }
        }
        Ok(GenerationConfig {
            slab_path: self
                .slab_path
                .ok_or(ConfigError::MissingParameter("slab_path"))?,
            output_dir: self
                .output_dir
                .ok_or(ConfigError::MissingParameter("output_dir"))?,
            configurations: self.configurations,
            templates_path: self.templates_path,
            freeze_bottom_layers: self.freeze_bottom_layers.unwrap_or(0),
            kpoint_density,
        })
    }
}
