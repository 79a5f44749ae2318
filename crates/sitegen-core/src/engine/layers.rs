use crate::core::models::atom::Atom;
use crate::core::models::structure::Structure;
use crate::engine::error::EngineError;
use tracing::{debug, error};

/// Height window (Angstroms) within which atoms count as one layer.
pub const LAYER_TOLERANCE: f64 = 0.1;
/// Rank of the topmost layer.
pub const TOP_LAYER: isize = -1;

/// The atoms of one species in one height layer.
#[derive(Debug, Clone)]
pub struct Layer<'a> {
    species: String,
    rank: isize,
    height: f64,
    members: Vec<(usize, &'a Atom)>,
}

impl<'a> Layer<'a> {
    pub fn species(&self) -> &str {
        &self.species
    }

    pub fn rank(&self) -> isize {
        self.rank
    }

    /// The lowest z in the layer.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// `(structure index, atom)` pairs in structure order.
    pub fn members(&self) -> &[(usize, &'a Atom)] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The `index`-th member of the layer.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::IndexOutOfRange`] listing every member when
    /// `index` is past the end of the layer.
    pub fn member(&self, index: usize) -> Result<(usize, &'a Atom), EngineError> {
        self.members.get(index).copied().ok_or_else(|| {
            let members = self
                .members
                .iter()
                .map(|(i, atom)| {
                    let p = atom.position;
                    format!("#{i} {} ({:.3}, {:.3}, {:.3})", atom.symbol, p.x, p.y, p.z)
                })
                .collect::<Vec<_>>()
                .join(", ");
            error!(
                species = %self.species,
                rank = self.rank,
                count = self.members.len(),
                requested = index,
                members = %members,
                "Requested atom index is greater than available atoms."
            );
            EngineError::IndexOutOfRange {
                species: self.species.clone(),
                rank: self.rank,
                count: self.members.len(),
                requested: index,
                members,
            }
        })
    }
}

/// Groups sorted distinct heights into layers and returns each layer's lowest z.
///
/// A new layer starts at the first value that lies [`LAYER_TOLERANCE`] or more
/// above the lowest value of the current layer.
fn cluster_heights(mut heights: Vec<f64>) -> Vec<f64> {
    heights.sort_by(f64::total_cmp);
    heights.dedup();
    let mut starts: Vec<f64> = Vec::new();
    for z in heights {
        match starts.last() {
            Some(&start) if z - start < LAYER_TOLERANCE => {}
            _ => starts.push(z),
        }
    }
    starts
}

fn layer_of(starts: &[f64], z: f64) -> usize {
    starts.partition_point(|&start| start <= z).saturating_sub(1)
}

fn resolve_rank(rank: isize, available: usize) -> Option<usize> {
    let index = if rank < 0 {
        available.checked_sub(rank.unsigned_abs())?
    } else {
        rank as usize
    };
    (index < available).then_some(index)
}

/// The lowest z of every layer of `species`, ascending.
pub fn layer_heights(structure: &Structure, species: &str) -> Result<Vec<f64>, EngineError> {
    let heights: Vec<f64> = structure
        .atoms_of(species)
        .map(|(_, atom)| atom.position.z)
        .collect();
    if heights.is_empty() {
        return Err(EngineError::SpeciesNotFound {
            species: species.to_string(),
        });
    }
    Ok(cluster_heights(heights))
}

/// Returns the atoms of `species` in layer `rank` (0 = lowest, negative ranks count
/// from the top, so [`TOP_LAYER`] is the surface).
pub fn classify_layer<'a>(
    structure: &'a Structure,
    species: &str,
    rank: isize,
) -> Result<Layer<'a>, EngineError> {
    let starts = layer_heights(structure, species)?;
    let target = resolve_rank(rank, starts.len()).ok_or_else(|| EngineError::LayerNotFound {
        species: species.to_string(),
        rank,
        available: starts.len(),
    })?;

    let members: Vec<(usize, &Atom)> = structure
        .atoms_of(species)
        .filter(|(_, atom)| layer_of(&starts, atom.position.z) == target)
        .collect();
    debug!(
        species,
        rank,
        height = starts[target],
        members = members.len(),
        "Classified layer."
    );
    Ok(Layer {
        species: species.to_string(),
        rank,
        height: starts[target],
        members,
    })
}

/// Indices of every atom (any species) whose z is one of the `n` lowest distinct
/// z values of the structure. Heights are compared exactly.
pub fn bottom_layer_indices(structure: &Structure, n: usize) -> Vec<usize> {
    let mut heights: Vec<f64> = structure.atoms().iter().map(|a| a.position.z).collect();
    heights.sort_by(f64::total_cmp);
    heights.dedup();
    heights.truncate(n);
    structure
        .atoms()
        .iter()
        .enumerate()
        .filter(|(_, atom)| heights.contains(&atom.position.z))
        .map(|(i, _)| i)
        .collect()
}

/// Marks the atoms of the `n` lowest z layers as frozen. Returns how many were frozen.
pub fn freeze_bottom_layers(structure: &mut Structure, n: usize) -> usize {
    let indices = bottom_layer_indices(structure, n);
    for &i in &indices {
        structure.atoms_mut()[i].frozen = true;
    }
    indices.len()
}
