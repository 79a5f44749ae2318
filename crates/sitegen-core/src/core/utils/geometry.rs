use crate::core::models::structure::Structure;
use nalgebra::{Point2, Point3, Rotation3, Unit, Vector3};

/// Cartesian axis used for orientation rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn vector(self) -> Vector3<f64> {
        match self {
            Axis::X => Vector3::x(),
            Axis::Y => Vector3::y(),
            Axis::Z => Vector3::z(),
        }
    }
}

pub fn rotation_from_axis_angle(axis: &Vector3<f64>, angle_degrees: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle_degrees.to_radians())
}

/// Arithmetic mean of the in-plane (x, y) components of `points`.
pub fn mean_xy(points: &[Point3<f64>]) -> Option<Point2<f64>> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point2::new(sx / n, sy / n))
}

/// Distance between one pair of atoms of the requested species.
#[derive(Debug, Clone, PartialEq)]
pub struct PairDistance {
    pub distance: f64,
    pub first_index: usize,
    pub second_index: usize,
    pub first_symbol: String,
    pub second_symbol: String,
}

/// Computes every distance between an atom of `symbol_a` and an atom of `symbol_b`.
///
/// Each unordered pair is reported once, with `first_index < second_index`.
/// Distances are plain Cartesian distances without periodic images. The result
/// is sorted by ascending distance.
pub fn pair_distances(structure: &Structure, symbol_a: &str, symbol_b: &str) -> Vec<PairDistance> {
    let atoms = structure.atoms();
    let mut pairs = Vec::new();
    for i in 0..atoms.len() {
        for k in (i + 1)..atoms.len() {
            let (first, second) = (&atoms[i], &atoms[k]);
            let matches = (first.is(symbol_a) && second.is(symbol_b))
                || (first.is(symbol_b) && second.is(symbol_a));
            if !matches {
                continue;
            }
            pairs.push(PairDistance {
                distance: (first.position - second.position).norm(),
                first_index: i,
                second_index: k,
                first_symbol: first.symbol.clone(),
                second_symbol: second.symbol.clone(),
            });
        }
    }
    pairs.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    pairs
}
