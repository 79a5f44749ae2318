use crate::core::models::structure::Structure;
use crate::core::molecules::MoleculeTemplate;
use crate::core::naming::identifier::ConfigIdentifier;
use crate::core::naming::orientation::Orientation;
use crate::core::utils::geometry::Axis;
use crate::engine::config::{AdsorbateConfig, SiteSpec};
use crate::engine::error::EngineError;
use crate::engine::layers::LAYER_TOLERANCE;
use crate::engine::site::resolve_anchor;
use nalgebra::{Point2, Point3, Vector3};
use tracing::{debug, instrument, warn};

/// What happened to the requested vacancy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VacancyOutcome {
    NotRequested,
    /// The atom that was at `index` of the input structure was removed.
    Removed { index: usize, position: Point3<f64> },
    /// No atom of the species sits under the anchor; nothing was removed.
    NotFound,
}

/// Removes the highest atom of `species` whose (x, y) lies within
/// [`LAYER_TOLERANCE`] of `anchor` on both axes.
pub fn remove_atom_at(structure: &mut Structure, anchor: &Point2<f64>, species: &str) -> VacancyOutcome {
    let mut selected: Option<(usize, Point3<f64>)> = None;
    for (index, atom) in structure.atoms_of(species) {
        let p = atom.position;
        if (p.x - anchor.x).abs() >= LAYER_TOLERANCE || (p.y - anchor.y).abs() >= LAYER_TOLERANCE {
            continue;
        }
        if selected.is_none_or(|(_, best)| p.z > best.z) {
            selected = Some((index, p));
        }
    }

    match selected {
        Some((index, position)) => {
            structure.remove_atom(index);
            debug!(index, species, "Removed surface atom for vacancy.");
            VacancyOutcome::Removed { index, position }
        }
        None => {
            warn!(
                species,
                x = anchor.x,
                y = anchor.y,
                "Did not find an atom to remove at the vacancy site; continuing without removal."
            );
            VacancyOutcome::NotFound
        }
    }
}

/// Turns a free molecule into the requested orientation in place.
///
/// Multi-atom molecules are centered first, then the orientation's fixed rotation
/// is applied, then `rotation` degrees about z for orientations that use it.
pub fn orient_adsorbate(molecule: &mut Structure, orientation: Orientation, rotation: f64) {
    if molecule.len() > 1 {
        molecule.center_at_origin();
    }
    if let Some((axis, degrees)) = orientation.pre_rotation() {
        molecule.rotate(&axis.vector(), degrees);
    }
    if orientation.uses_normal_rotation() {
        molecule.rotate(&Axis::Z.vector(), rotation);
    }
}

/// Appends `molecule` to `slab` so that its atom 0 sits at `target` in plane and
/// `height` above the highest atom of the slab.
pub fn insert_adsorbate(
    slab: &mut Structure,
    molecule: &Structure,
    target: &Point2<f64>,
    height: f64,
) -> Result<(), EngineError> {
    let surface_z = slab.max_z().ok_or(EngineError::EmptyStructure)?;
    let Some(reference) = molecule.atom(0) else {
        return Ok(());
    };
    let r = reference.position;
    let translation = Vector3::new(target.x - r.x, target.y - r.y, surface_z + height - r.z);
    slab.extend_translated(molecule, &translation);
    Ok(())
}

/// A realized configuration.
#[derive(Debug, Clone)]
pub struct Placement {
    pub identifier: ConfigIdentifier,
    pub structure: Structure,
    pub anchor: Point2<f64>,
    pub vacancy: VacancyOutcome,
}

/// Builds one adsorbate configuration on a copy of `slab`.
///
/// The identifier is derived and validated first, so an unencodable
/// configuration fails before any geometry work. The vacancy is carved at the
/// anchor itself; the in-plane displacement only moves the adsorbate.
#[instrument(skip_all, fields(molecule = %config.molecule))]
pub fn place_adsorbate(
    slab: &Structure,
    template: &MoleculeTemplate,
    config: &AdsorbateConfig,
) -> Result<Placement, EngineError> {
    let identifier = config.identifier(template)?;
    let orientation = config.effective_orientation(template)?;
    let anchor = resolve_anchor(slab, &config.site)?;

    let mut structure = slab.clone();
    let vacancy = match (&config.site, config.vacancy) {
        (SiteSpec::Single { species, .. }, true) => remove_atom_at(&mut structure, &anchor, species),
        (_, true) => VacancyOutcome::NotFound,
        (_, false) => VacancyOutcome::NotRequested,
    };

    let mut molecule = template.instantiate();
    orient_adsorbate(&mut molecule, orientation, config.rotation);
    let target = anchor + config.displacement;
    insert_adsorbate(&mut structure, &molecule, &target, config.height)?;

    debug!(
        identifier = %identifier,
        x = target.x,
        y = target.y,
        "Placed adsorbate."
    );
    Ok(Placement {
        identifier,
        structure,
        anchor,
        vacancy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::poscar::PoscarFile;
    use crate::core::io::traits::StructureFile;
    use crate::core::models::atom::Atom;
    use crate::core::models::lattice::Lattice;
    use crate::core::molecules::TemplateLibrary;
    use crate::core::naming::identifier::IdentifierError;
    use crate::engine::config::AdsorbateConfigBuilder;

    fn slab() -> Structure {
        let atom = |symbol: &str, x: f64, y: f64, z: f64| Atom::new(symbol, Point3::new(x, y, z));
        Structure::new(
            Lattice::orthorhombic(8.0, 8.0, 25.0),
            vec![
                atom("W", 0.0, 0.0, 10.0),
                atom("O", 2.0, 0.0, 10.0),
                atom("O", 0.0, 2.0, 10.0),
                atom("W", 4.0, 4.0, 11.0),
                atom("O", 2.0, 4.0, 12.0),
                atom("O", 4.0, 2.0, 12.0),
                atom("O", 4.0, 4.0, 12.05),
            ],
        )
    }

    fn library() -> TemplateLibrary {
        TemplateLibrary::builtin()
    }

    #[test]
    fn vacancy_removes_only_the_highest_stacked_atom() {
        let mut s = Structure::molecule(vec![
            Atom::new("O", Point3::new(1.0, 1.0, 1.0)),
            Atom::new("O", Point3::new(1.0, 1.0, 1.5)),
        ]);
        let outcome = remove_atom_at(&mut s, &Point2::new(1.05, 0.95), "O");
        assert_eq!(
            outcome,
            VacancyOutcome::Removed {
                index: 1,
                position: Point3::new(1.0, 1.0, 1.5)
            }
        );
        assert_eq!(s.len(), 1);
        assert_eq!(s.atom(0).unwrap().position.z, 1.0);
    }

    #[test]
    fn vacancy_without_match_leaves_structure_untouched() {
        let mut s = slab();
        let outcome = remove_atom_at(&mut s, &Point2::new(7.0, 7.0), "O");
        assert_eq!(outcome, VacancyOutcome::NotFound);
        assert_eq!(s, slab());
    }

    #[test]
    fn vacancy_ignores_other_species() {
        let mut s = slab();
        let outcome = remove_atom_at(&mut s, &Point2::new(0.0, 0.0), "O");
        assert_eq!(outcome, VacancyOutcome::NotFound);
    }

    #[test]
    fn orient_h_down_points_one_hydrogen_down() {
        let template = library().get("H2O").unwrap().instantiate();
        let mut m = template.clone();
        orient_adsorbate(&mut m, Orientation::HDown, 0.0);
        let o = m.atom(0).unwrap().position;
        let h1 = m.atom(1).unwrap().position;
        let h2 = m.atom(2).unwrap().position;
        assert!((h1.z - o.z).abs() > 0.7 || (h2.z - o.z).abs() > 0.7);
        assert!(h1.z < o.z || h2.z < o.z);
    }

    #[test]
    fn orient_o_down_flips_molecule() {
        let mut m = library().get("H2O").unwrap().instantiate();
        orient_adsorbate(&mut m, Orientation::ODown, 0.0);
        let o = m.atom(0).unwrap().position;
        assert!(m.atoms()[1..].iter().all(|h| h.position.z > o.z));
    }

    #[test]
    fn insertion_puts_anchor_atom_at_height_above_surface() {
        let mut s = slab();
        let molecule = library().get("H").unwrap().instantiate();
        insert_adsorbate(&mut s, &molecule, &Point2::new(1.0, 2.0), 1.5).unwrap();
        let added = s.atom(s.len() - 1).unwrap();
        assert_eq!(added.symbol, "H");
        assert!((added.position - Point3::new(1.0, 2.0, 13.55)).norm() < 1e-9);
    }

    #[test]
    fn insertion_into_empty_slab_fails() {
        let mut s = Structure::default();
        let molecule = library().get("H").unwrap().instantiate();
        assert!(matches!(
            insert_adsorbate(&mut s, &molecule, &Point2::origin(), 1.0),
            Err(EngineError::EmptyStructure)
        ));
    }

    #[test]
    fn water_vacancy_composes_removal_rotation_and_displacement() {
        let lib = library();
        let config = AdsorbateConfigBuilder::new()
            .molecule("H2O")
            .site(SiteSpec::top("O", 2))
            .height(2.0)
            .displacement(0.5, 0.0)
            .orientation(Orientation::HDown)
            .rotation(90.0)
            .vacancy(true)
            .build()
            .unwrap();
        let placement = place_adsorbate(&slab(), lib.get("H2O").unwrap(), &config).unwrap();

        assert_eq!(placement.identifier.to_string(), "POSCAR_H2O_Vac_O2_HDL");
        assert_eq!(placement.anchor, Point2::new(4.0, 4.0));
        assert_eq!(
            placement.vacancy,
            VacancyOutcome::Removed {
                index: 6,
                position: Point3::new(4.0, 4.0, 12.05)
            }
        );
        let s = &placement.structure;
        assert_eq!(s.len(), 9);
        let o = s.atom(6).unwrap();
        assert_eq!(o.symbol, "O");
        assert!((o.position - Point3::new(4.5, 4.0, 14.0)).norm() < 1e-9);
    }

    #[test]
    fn placement_leaves_input_slab_untouched() {
        let original = slab();
        let config = AdsorbateConfigBuilder::new()
            .molecule("N")
            .site(SiteSpec::top("O", 0))
            .height(1.0)
            .vacancy(true)
            .build()
            .unwrap();
        let placement = place_adsorbate(&original, library().get("N").unwrap(), &config).unwrap();
        assert_eq!(original, slab());
        assert_eq!(placement.structure.len(), original.len());
    }

    #[test]
    fn unencodable_configuration_fails_before_geometry() {
        let config = AdsorbateConfigBuilder::new()
            .molecule("H")
            .site(SiteSpec::Average {
                species: "O".to_string(),
                layer: -1,
                indices: vec![0, 1, 2, 3],
            })
            .height(1.0)
            .build()
            .unwrap();
        let result = place_adsorbate(&Structure::default(), library().get("H").unwrap(), &config);
        assert!(matches!(result, Err(EngineError::Identifier { .. })));
    }

    #[test]
    fn n2_defaults_to_upright_pointing_away_from_surface() {
        let config = AdsorbateConfigBuilder::new()
            .molecule("N2")
            .site(SiteSpec::top("O", 0))
            .height(0.5)
            .vacancy(true)
            .build()
            .unwrap();
        let placement = place_adsorbate(&slab(), library().get("N2").unwrap(), &config).unwrap();

        assert_eq!(placement.identifier.to_string(), "POSCAR_N2_Vac_O0_UPR");
        assert!(matches!(placement.vacancy, VacancyOutcome::Removed { index: 4, .. }));
        let s = &placement.structure;
        assert_eq!(s.len(), 8);
        let first = s.atom(6).unwrap().position;
        let second = s.atom(7).unwrap().position;
        assert!((first - Point3::new(2.0, 4.0, 12.55)).norm() < 1e-9);
        assert!((second.z - (12.55 + 2.0 * 0.56499)).abs() < 1e-9);
        assert!(second.z > first.z);
    }

    #[test]
    fn vacancy_on_averaging_site_is_rejected_before_removal() {
        let atom = |x: f64, z: f64| Atom::new("O", Point3::new(x, 0.0, z));
        let slab = Structure::new(
            Lattice::orthorhombic(6.0, 6.0, 20.0),
            vec![atom(1.0, 11.0), atom(0.0, 12.0), atom(2.0, 12.0)],
        );
        let config = AdsorbateConfigBuilder::new()
            .molecule("H")
            .site(SiteSpec::Average {
                species: "O".to_string(),
                layer: -1,
                indices: vec![0, 1],
            })
            .height(1.0)
            .vacancy(true)
            .build()
            .unwrap();
        let result = place_adsorbate(&slab, library().get("H").unwrap(), &config);
        assert!(matches!(
            result,
            Err(EngineError::Identifier {
                source: IdentifierError::VacancyWithAverage
            })
        ));
    }

    #[test]
    fn repeated_placement_is_byte_identical() {
        let lib = library();
        let config = AdsorbateConfigBuilder::new()
            .molecule("N2")
            .site(SiteSpec::top("O", 1))
            .height(1.8)
            .orientation(Orientation::Coplanar)
            .rotation(270.0)
            .build()
            .unwrap();
        let render = || {
            let placement = place_adsorbate(&slab(), lib.get("N2").unwrap(), &config).unwrap();
            let mut out = Vec::new();
            PoscarFile::write_structure_to(&placement.structure, &mut out).unwrap();
            (placement.identifier.to_string(), out)
        };
        let (first_id, first) = render();
        let (second_id, second) = render();
        assert_eq!(first_id, "POSCAR_N2_above_O1_CU");
        assert_eq!(first_id, second_id);
        assert_eq!(first, second);
    }
}
