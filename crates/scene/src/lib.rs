use glam::Vec3;
use serde::{Deserialize, Serialize};

pub type MaterialId = usize;

/// User-data value the renderer treats as "no valid simulation slot".
pub const INVALID_USER_DATA: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadiusProfile {
    #[default]
    Linear,
    Sigmoid,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SdfPrimitive {
    Sphere {
        center: [f32; 3],
        radius: f32,
    },
    Pill {
        p0: [f32; 3],
        p1: [f32; 3],
        radius: f32,
    },
    ConePill {
        p0: [f32; 3],
        p1: [f32; 3],
        r0: f32,
        r1: f32,
        #[serde(default)]
        profile: RadiusProfile,
    },
}

impl SdfPrimitive {
    pub fn p0(&self) -> Vec3 {
        match self {
            SdfPrimitive::Sphere { center, .. } => Vec3::from(*center),
            SdfPrimitive::Pill { p0, .. } | SdfPrimitive::ConePill { p0, .. } => Vec3::from(*p0),
        }
    }

    pub fn p1(&self) -> Vec3 {
        match self {
            SdfPrimitive::Sphere { center, .. } => Vec3::from(*center),
            SdfPrimitive::Pill { p1, .. } | SdfPrimitive::ConePill { p1, .. } => Vec3::from(*p1),
        }
    }

    pub fn r0(&self) -> f32 {
        match self {
            SdfPrimitive::Sphere { radius, .. } | SdfPrimitive::Pill { radius, .. } => *radius,
            SdfPrimitive::ConePill { r0, .. } => *r0,
        }
    }

    pub fn r1(&self) -> f32 {
        match self {
            SdfPrimitive::Sphere { radius, .. } | SdfPrimitive::Pill { radius, .. } => *radius,
            SdfPrimitive::ConePill { r1, .. } => *r1,
        }
    }

    pub fn is_sphere(&self) -> bool {
        matches!(self, SdfPrimitive::Sphere { .. })
    }

    pub fn is_pill(&self) -> bool {
        matches!(self, SdfPrimitive::Pill { .. })
    }

    pub fn is_cone_pill(&self) -> bool {
        matches!(self, SdfPrimitive::ConePill { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SdfGeometry {
    pub primitive: SdfPrimitive,
    pub user_data: u64,
}

impl SdfGeometry {
    pub fn sphere(center: Vec3, radius: f32, user_data: u64) -> Self {
        Self {
            primitive: SdfPrimitive::Sphere {
                center: center.to_array(),
                radius,
            },
            user_data,
        }
    }

    pub fn pill(p0: Vec3, p1: Vec3, radius: f32, user_data: u64) -> Self {
        Self {
            primitive: SdfPrimitive::Pill {
                p0: p0.to_array(),
                p1: p1.to_array(),
                radius,
            },
            user_data,
        }
    }

    pub fn cone_pill(p0: Vec3, p1: Vec3, r0: f32, r1: f32, user_data: u64) -> Self {
        Self {
            primitive: SdfPrimitive::ConePill {
                p0: p0.to_array(),
                p1: p1.to_array(),
                r0,
                r1,
                profile: RadiusProfile::Linear,
            },
            user_data,
        }
    }

    pub fn cone_pill_sigmoid(p0: Vec3, p1: Vec3, r0: f32, r1: f32, user_data: u64) -> Self {
        Self {
            primitive: SdfPrimitive::ConePill {
                p0: p0.to_array(),
                p1: p1.to_array(),
                r0,
                r1,
                profile: RadiusProfile::Sigmoid,
            },
            user_data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Default for Bounds {
    fn default() -> Self {
        Self::empty()
    }
}

impl Bounds {
    pub fn empty() -> Self {
        Self {
            min: [f32::INFINITY; 3],
            max: [f32::NEG_INFINITY; 3],
        }
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|axis| self.min[axis] > self.max[axis])
    }

    pub fn merge_point(&mut self, point: Vec3) {
        let min = Vec3::from(self.min).min(point);
        let max = Vec3::from(self.max).max(point);
        self.min = min.to_array();
        self.max = max.to_array();
    }

    pub fn merge(&mut self, other: &Bounds) {
        if other.is_empty() {
            return;
        }
        self.merge_point(Vec3::from(other.min));
        self.merge_point(Vec3::from(other.max));
    }
}

/// Everything the renderer needs for one reconstructed cell. `materials` and
/// `neighbours` are parallel to `geometries`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellGeometry {
    pub gid: u64,
    pub geometries: Vec<SdfGeometry>,
    pub materials: Vec<MaterialId>,
    pub neighbours: Vec<Vec<u32>>,
    pub bounds: Bounds,
}

impl CellGeometry {
    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    pub fn spheres(&self) -> impl Iterator<Item = &SdfGeometry> {
        self.geometries
            .iter()
            .filter(|geometry| geometry.primitive.is_sphere())
    }
}
