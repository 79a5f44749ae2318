use nalgebra::{Matrix3, Point3, Vector3};

const DEGENERATE_VOLUME: f64 = 1e-8;

/// The periodic cell of a structure.
///
/// The lattice vectors are stored as the rows of a 3x3 matrix (`a`, `b`, `c`),
/// which is the layout used by VASP structure files.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lattice {
    matrix: Matrix3<f64>,
}

impl Default for Lattice {
    fn default() -> Self {
        Self::zero()
    }
}

impl Lattice {
    /// Creates a lattice from a matrix whose rows are the lattice vectors.
    pub fn new(matrix: Matrix3<f64>) -> Self {
        Self { matrix }
    }

    /// Creates a lattice from the three lattice vectors.
    pub fn from_vectors(a: Vector3<f64>, b: Vector3<f64>, c: Vector3<f64>) -> Self {
        Self::new(Matrix3::from_rows(&[a.transpose(), b.transpose(), c.transpose()]))
    }

    /// Creates an orthorhombic cell with the given edge lengths.
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Self {
        Self::new(Matrix3::from_diagonal(&Vector3::new(a, b, c)))
    }

    /// An all-zero cell, used for free molecules.
    pub fn zero() -> Self {
        Self::new(Matrix3::zeros())
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// Returns lattice vector `i` (0 = a, 1 = b, 2 = c).
    pub fn vector(&self, i: usize) -> Vector3<f64> {
        self.matrix.row(i).transpose()
    }

    /// Returns the lengths `[a, b, c]`.
    pub fn lengths(&self) -> [f64; 3] {
        [
            self.vector(0).norm(),
            self.vector(1).norm(),
            self.vector(2).norm(),
        ]
    }

    /// Returns the angles `[alpha, beta, gamma]` in degrees.
    ///
    /// Angles involving a zero-length vector are reported as 90 degrees.
    pub fn angles(&self) -> [f64; 3] {
        let angle = |u: Vector3<f64>, v: Vector3<f64>| {
            let denom = u.norm() * v.norm();
            if denom < DEGENERATE_VOLUME {
                return 90.0;
            }
            (u.dot(&v) / denom).clamp(-1.0, 1.0).acos().to_degrees()
        };
        let (a, b, c) = (self.vector(0), self.vector(1), self.vector(2));
        [angle(b, c), angle(a, c), angle(a, b)]
    }

    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }

    pub fn is_degenerate(&self) -> bool {
        self.volume() < DEGENERATE_VOLUME
    }

    /// Converts fractional coordinates to Cartesian coordinates.
    pub fn to_cartesian(&self, frac: &Vector3<f64>) -> Point3<f64> {
        Point3::from(self.matrix.transpose() * frac)
    }

    /// Converts Cartesian coordinates to fractional coordinates.
    ///
    /// Returns `None` for a degenerate cell.
    pub fn to_fractional(&self, cart: &Point3<f64>) -> Option<Vector3<f64>> {
        if self.is_degenerate() {
            return None;
        }
        self.matrix
            .transpose()
            .try_inverse()
            .map(|inv| inv * cart.coords)
    }

    /// Returns a copy of this lattice with every vector multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.matrix * factor)
    }

    /// Checks whether the cell is hexagonal: two right angles, one 60/120 degree
    /// angle, and equal lengths along the two right-angle axes.
    pub fn is_hexagonal(&self, angle_tolerance: f64, length_tolerance: f64) -> bool {
        let lengths = self.lengths();
        let angles = self.angles();

        let right_angles: Vec<usize> = (0..3)
            .filter(|&i| (angles[i] - 90.0).abs() < angle_tolerance)
            .collect();
        let hex_angles = (0..3)
            .filter(|&i| {
                (angles[i] - 60.0).abs() < angle_tolerance
                    || (angles[i] - 120.0).abs() < angle_tolerance
            })
            .count();

        right_angles.len() == 2
            && hex_angles == 1
            && (lengths[right_angles[0]] - lengths[right_angles[1]]).abs() < length_tolerance
    }
}
