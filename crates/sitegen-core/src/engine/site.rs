use crate::core::models::structure::Structure;
use crate::core::utils::geometry::mean_xy;
use crate::engine::config::SiteSpec;
use crate::engine::error::EngineError;
use crate::engine::layers::classify_layer;
use nalgebra::Point2;

/// Resolves a site to the in-plane anchor the adsorbate is placed over.
pub fn resolve_anchor(structure: &Structure, site: &SiteSpec) -> Result<Point2<f64>, EngineError> {
    match site {
        SiteSpec::Position { x, y } => Ok(Point2::new(*x, *y)),
        SiteSpec::Single {
            species,
            layer,
            index,
        } => {
            let layer = classify_layer(structure, species, *layer)?;
            let (_, atom) = layer.member(*index)?;
            Ok(atom.position.xy())
        }
        SiteSpec::Average {
            species,
            layer,
            indices,
        } => {
            if indices.is_empty() {
                return Err(EngineError::EmptyAveragingSet {
                    species: species.clone(),
                });
            }
            let layer = classify_layer(structure, species, *layer)?;
            let points = indices
                .iter()
                .map(|&i| layer.member(i).map(|(_, atom)| atom.position))
                .collect::<Result<Vec<_>, _>>()?;
            mean_xy(&points).ok_or_else(|| EngineError::EmptyAveragingSet {
                species: species.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::lattice::Lattice;
    use crate::engine::layers::TOP_LAYER;
    use nalgebra::Point3;

    fn surface() -> Structure {
        Structure::new(
            Lattice::orthorhombic(10.0, 10.0, 20.0),
            vec![
                Atom::new("O", Point3::new(5.0, 5.0, 0.0)),
                Atom::new("O", Point3::new(0.0, 0.0, 3.0)),
                Atom::new("O", Point3::new(2.0, 0.0, 3.0)),
                Atom::new("O", Point3::new(1.0, 2.0, 3.0)),
            ],
        )
    }

    fn average(indices: Vec<usize>) -> SiteSpec {
        SiteSpec::Average {
            species: "O".to_string(),
            layer: TOP_LAYER,
            indices,
        }
    }

    #[test]
    fn single_site_returns_member_position() {
        let anchor = resolve_anchor(&surface(), &SiteSpec::top("O", 2)).unwrap();
        assert_eq!(anchor, Point2::new(1.0, 2.0));
        let bottom = SiteSpec::Single {
            species: "O".to_string(),
            layer: 0,
            index: 0,
        };
        assert_eq!(resolve_anchor(&surface(), &bottom).unwrap(), Point2::new(5.0, 5.0));
    }

    #[test]
    fn averaging_site_returns_in_plane_mean() {
        let anchor = resolve_anchor(&surface(), &average(vec![0, 1, 2])).unwrap();
        assert!((anchor.x - 1.0).abs() < 1e-9);
        assert!((anchor.y - 0.667).abs() < 1e-3);
    }

    #[test]
    fn averaging_maps_sparse_indices_through_layer_order() {
        let atom = |x: f64, y: f64, z: f64| Atom::new("O", Point3::new(x, y, z));
        let s = Structure::new(
            Lattice::orthorhombic(10.0, 10.0, 20.0),
            vec![
                atom(0.0, 0.0, 3.0),
                atom(4.0, 4.0, 0.0),
                atom(2.0, 0.0, 3.0),
                atom(7.0, 7.0, 3.0),
                atom(8.0, 8.0, 3.05),
                atom(6.0, 6.0, 0.0),
                atom(1.0, 2.0, 3.0),
            ],
        );
        let anchor = resolve_anchor(&s, &average(vec![0, 1, 4])).unwrap();
        assert!((anchor.x - 1.0).abs() < 1e-9);
        assert!((anchor.y - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_averaging_set_fails_before_lookup() {
        let empty = Structure::default();
        assert!(matches!(
            resolve_anchor(&empty, &average(vec![])),
            Err(EngineError::EmptyAveragingSet { .. })
        ));
    }

    #[test]
    fn averaging_index_out_of_range_fails() {
        assert!(matches!(
            resolve_anchor(&surface(), &average(vec![0, 3])),
            Err(EngineError::IndexOutOfRange { requested: 3, .. })
        ));
    }

    #[test]
    fn position_override_bypasses_classification() {
        let site = SiteSpec::Position { x: 1.25, y: -3.5 };
        assert_eq!(
            resolve_anchor(&Structure::default(), &site).unwrap(),
            Point2::new(1.25, -3.5)
        );
    }
}
