use crate::core::utils::geometry::Axis;
use phf::{Map, phf_map};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const ROTATION_TOLERANCE: f64 = 1e-9;

/// Shape class of an adsorbate, which decides the orientations it supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoleculeClass {
    Atomic,
    Diatomic,
    Water,
}

impl MoleculeClass {
    /// The orientation used when a configuration does not name one.
    pub fn default_orientation(self) -> Orientation {
        match self {
            MoleculeClass::Water => Orientation::H2Down,
            MoleculeClass::Diatomic | MoleculeClass::Atomic => Orientation::None,
        }
    }

    pub fn supports(self, orientation: Orientation) -> bool {
        match self {
            MoleculeClass::Water => matches!(
                orientation,
                Orientation::H2Down | Orientation::ODown | Orientation::HDown | Orientation::Coplanar
            ),
            MoleculeClass::Diatomic => matches!(
                orientation,
                Orientation::None | Orientation::Upright | Orientation::Coplanar
            ),
            MoleculeClass::Atomic => orientation == Orientation::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Template pose, no orientation token.
    None,
    H2Down,
    ODown,
    HDown,
    Coplanar,
    Upright,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown orientation '{0}' (expected one of: none, H2_down, O_down, H_down, coplanar, upright)")]
pub struct ParseOrientationError(pub String);

impl Orientation {
    pub fn tag(self) -> &'static str {
        match self {
            Orientation::None => "none",
            Orientation::H2Down => "H2_down",
            Orientation::ODown => "O_down",
            Orientation::HDown => "H_down",
            Orientation::Coplanar => "coplanar",
            Orientation::Upright => "upright",
        }
    }

    /// The fixed rotation applied to the centered template before the
    /// rotation about the surface normal.
    pub fn pre_rotation(self) -> Option<(Axis, f64)> {
        match self {
            Orientation::None | Orientation::H2Down => None,
            Orientation::ODown | Orientation::Upright => Some((Axis::X, 180.0)),
            Orientation::HDown => Some((Axis::X, 90.0)),
            Orientation::Coplanar => Some((Axis::Y, 90.0)),
        }
    }

    /// Whether the rotation about the surface normal is applied and encoded.
    pub fn uses_normal_rotation(self) -> bool {
        matches!(self, Orientation::HDown | Orientation::Coplanar)
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Orientation {
    type Err = ParseOrientationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "none" | "" => Ok(Orientation::None),
            "H2_down" => Ok(Orientation::H2Down),
            "O_down" => Ok(Orientation::ODown),
            "H_down" => Ok(Orientation::HDown),
            "coplanar" => Ok(Orientation::Coplanar),
            "upright" => Ok(Orientation::Upright),
            other => Err(ParseOrientationError(other.to_string())),
        }
    }
}

impl Serialize for Orientation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for Orientation {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The rotation about the surface normal, as far as the identifier can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotationCode {
    /// The orientation does not encode a rotation.
    Ignored,
    Deg0,
    Deg90,
    Deg180,
    Deg270,
    /// Any other angle; still applied geometrically.
    Unclassified,
}

impl RotationCode {
    pub fn classify(degrees: f64) -> Self {
        let is = |target: f64| (degrees - target).abs() < ROTATION_TOLERANCE;
        if is(0.0) {
            RotationCode::Deg0
        } else if is(90.0) {
            RotationCode::Deg90
        } else if is(180.0) {
            RotationCode::Deg180
        } else if is(270.0) {
            RotationCode::Deg270
        } else {
            RotationCode::Unclassified
        }
    }
}

/// Orientation plus classified rotation: everything the orientation token encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrientationCode {
    pub orientation: Orientation,
    pub rotation: RotationCode,
}

static SUFFIX_CODES: Map<&'static str, OrientationCode> = phf_map! {
    "H2D" => OrientationCode { orientation: Orientation::H2Down, rotation: RotationCode::Ignored },
    "OD" => OrientationCode { orientation: Orientation::ODown, rotation: RotationCode::Ignored },
    "UPR" => OrientationCode { orientation: Orientation::Upright, rotation: RotationCode::Ignored },
    "HDU" => OrientationCode { orientation: Orientation::HDown, rotation: RotationCode::Deg0 },
    "HDL" => OrientationCode { orientation: Orientation::HDown, rotation: RotationCode::Deg90 },
    "HDD" => OrientationCode { orientation: Orientation::HDown, rotation: RotationCode::Deg180 },
    "HDR" => OrientationCode { orientation: Orientation::HDown, rotation: RotationCode::Deg270 },
    "HDX" => OrientationCode { orientation: Orientation::HDown, rotation: RotationCode::Unclassified },
    "CL" => OrientationCode { orientation: Orientation::Coplanar, rotation: RotationCode::Deg0 },
    "CD" => OrientationCode { orientation: Orientation::Coplanar, rotation: RotationCode::Deg90 },
    "CR" => OrientationCode { orientation: Orientation::Coplanar, rotation: RotationCode::Deg180 },
    "CU" => OrientationCode { orientation: Orientation::Coplanar, rotation: RotationCode::Deg270 },
    "CX" => OrientationCode { orientation: Orientation::Coplanar, rotation: RotationCode::Unclassified },
};

impl OrientationCode {
    /// Classifies `rotation_degrees` for `orientation`. Orientations that do not
    /// use the normal rotation always get [`RotationCode::Ignored`].
    pub fn new(orientation: Orientation, rotation_degrees: f64) -> Self {
        let rotation = if orientation.uses_normal_rotation() {
            RotationCode::classify(rotation_degrees)
        } else {
            RotationCode::Ignored
        };
        Self {
            orientation,
            rotation,
        }
    }

    /// The identifier token, or `None` for [`Orientation::None`].
    pub fn suffix(&self) -> Option<&'static str> {
        use RotationCode::*;
        let suffix = match (self.orientation, self.rotation) {
            (Orientation::None, _) => return None,
            (Orientation::H2Down, _) => "H2D",
            (Orientation::ODown, _) => "OD",
            (Orientation::Upright, _) => "UPR",
            (Orientation::HDown, Deg0) => "HDU",
            (Orientation::HDown, Deg90) => "HDL",
            (Orientation::HDown, Deg180) => "HDD",
            (Orientation::HDown, Deg270) => "HDR",
            (Orientation::HDown, Ignored | Unclassified) => "HDX",
            (Orientation::Coplanar, Deg0) => "CL",
            (Orientation::Coplanar, Deg90) => "CD",
            (Orientation::Coplanar, Deg180) => "CR",
            (Orientation::Coplanar, Deg270) => "CU",
            (Orientation::Coplanar, Ignored | Unclassified) => "CX",
        };
        Some(suffix)
    }

    pub fn from_suffix(suffix: &str) -> Option<Self> {
        SUFFIX_CODES.get(suffix).copied()
    }
}
