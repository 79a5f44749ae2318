use crate::core::models::atom::Atom;
use crate::core::models::structure::Structure;
use crate::core::naming::orientation::{MoleculeClass, Orientation};
use nalgebra::Point3;
use phf::{Map, phf_map};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

struct BuiltinTemplate {
    class: MoleculeClass,
    orientation: Orientation,
    atoms: &'static [(&'static str, [f64; 3])],
}

// Gas-phase geometries in Angstroms; atom 0 is the anchor atom.
static BUILTIN_TEMPLATES: Map<&'static str, BuiltinTemplate> = phf_map! {
    "H2O" => BuiltinTemplate {
        class: MoleculeClass::Water,
        orientation: Orientation::H2Down,
        atoms: &[
            ("O", [0.0, 0.0, 0.119262]),
            ("H", [0.0, 0.763239, -0.477047]),
            ("H", [0.0, -0.763239, -0.477047]),
        ],
    },
    "N2" => BuiltinTemplate {
        class: MoleculeClass::Diatomic,
        orientation: Orientation::Upright,
        atoms: &[("N", [0.0, 0.0, 0.56499]), ("N", [0.0, 0.0, -0.56499])],
    },
    "H2" => BuiltinTemplate {
        class: MoleculeClass::Diatomic,
        orientation: Orientation::None,
        atoms: &[("H", [0.0, 0.0, 0.368583]), ("H", [0.0, 0.0, -0.368583])],
    },
    "N" => BuiltinTemplate {
        class: MoleculeClass::Atomic,
        orientation: Orientation::None,
        atoms: &[("N", [0.0, 0.0, 0.0])],
    },
    "H" => BuiltinTemplate {
        class: MoleculeClass::Atomic,
        orientation: Orientation::None,
        atoms: &[("H", [0.0, 0.0, 0.0])],
    },
};

#[derive(Debug, Error)]
pub enum TemplateLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid template '{name}': {reason}")]
    Invalid { name: String, reason: String },
}

/// An adsorbate prototype. Never placed directly: [`MoleculeTemplate::instantiate`]
/// hands out an independent copy for every configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MoleculeTemplate {
    pub name: String,
    pub class: MoleculeClass,
    /// Used when a configuration does not name an orientation.
    pub default_orientation: Orientation,
    atoms: Vec<Atom>,
}

impl MoleculeTemplate {
    pub fn new(name: &str, class: MoleculeClass, atoms: Vec<Atom>) -> Result<Self, TemplateLoadError> {
        let invalid = |reason: &str| TemplateLoadError::Invalid {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(invalid("name must be non-empty and alphanumeric"));
        }
        let expected = match class {
            MoleculeClass::Atomic => 1,
            MoleculeClass::Diatomic => 2,
            MoleculeClass::Water => 3,
        };
        if atoms.len() != expected {
            return Err(invalid(&format!(
                "class {class:?} needs {expected} atoms, found {}",
                atoms.len()
            )));
        }
        Ok(Self {
            name: name.to_string(),
            class,
            default_orientation: class.default_orientation(),
            atoms,
        })
    }

    /// Replaces the default orientation; it must be one the class supports.
    pub fn with_default_orientation(mut self, orientation: Orientation) -> Result<Self, TemplateLoadError> {
        if !self.class.supports(orientation) {
            return Err(TemplateLoadError::Invalid {
                name: self.name,
                reason: format!("class {:?} does not support orientation '{orientation}'", self.class),
            });
        }
        self.default_orientation = orientation;
        Ok(self)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// A fresh, independently owned copy of the molecule.
    pub fn instantiate(&self) -> Structure {
        Structure::molecule(self.atoms.clone())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TemplateFile {
    #[serde(default)]
    molecule: Vec<TemplateEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TemplateEntry {
    name: String,
    class: MoleculeClass,
    #[serde(default)]
    orientation: Option<Orientation>,
    atoms: Vec<TemplateAtom>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TemplateAtom {
    symbol: String,
    position: [f64; 3],
}

/// The adsorbates available for placement, keyed by molecule tag.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: HashMap<String, MoleculeTemplate>,
}

impl TemplateLibrary {
    /// The built-in gas-phase molecules: H2O, N2, H2, N and H.
    pub fn builtin() -> Self {
        let templates = BUILTIN_TEMPLATES
            .entries()
            .map(|(name, builtin)| {
                let atoms = builtin
                    .atoms
                    .iter()
                    .map(|(symbol, [x, y, z])| Atom::new(symbol, Point3::new(*x, *y, *z)))
                    .collect();
                let template = MoleculeTemplate {
                    name: name.to_string(),
                    class: builtin.class,
                    default_orientation: builtin.orientation,
                    atoms,
                };
                (name.to_string(), template)
            })
            .collect();
        Self { templates }
    }

    /// Adds the templates of a TOML file on top of the current set. Entries with
    /// an existing name replace it.
    ///
    /// ```toml
    /// [[molecule]]
    /// name = "OH"
    /// class = "diatomic"
    /// orientation = "upright"  # optional, class default otherwise
    /// atoms = [
    ///     { symbol = "O", position = [0.0, 0.0, 0.0] },
    ///     { symbol = "H", position = [0.0, 0.0, 0.97] },
    /// ]
    /// ```
    pub fn load_into(&mut self, path: &Path) -> Result<usize, TemplateLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| TemplateLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let file: TemplateFile = toml::from_str(&content).map_err(|e| TemplateLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let count = file.molecule.len();
        for entry in file.molecule {
            let atoms = entry
                .atoms
                .iter()
                .map(|a| Atom::new(&a.symbol, Point3::from(a.position)))
                .collect();
            let mut template = MoleculeTemplate::new(&entry.name, entry.class, atoms)?;
            if let Some(orientation) = entry.orientation {
                template = template.with_default_orientation(orientation)?;
            }
            self.insert(template);
        }
        Ok(count)
    }

    pub fn insert(&mut self, template: MoleculeTemplate) {
        self.templates.insert(template.name.clone(), template);
    }

    pub fn get(&self, name: &str) -> Option<&MoleculeTemplate> {
        self.templates.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
