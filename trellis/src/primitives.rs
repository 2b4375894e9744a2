mod instance;
mod sphere;
mod triangle;

use glam::Vec2;

pub use self::instance::*;
pub use self::sphere::*;
pub use self::triangle::*;

/// Opaque material handle; its meaning is up to the shading side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MaterialIndex(u32);

impl MaterialIndex {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// Outcome of testing a ray against a single leaf primitive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
    pub distance: f32,

    /// Local surface parametrization: barycentric coordinates for triangles,
    /// normalized spherical coordinates for spheres.
    pub uv: Vec2,
}

impl Intersection {
    pub const MISS: Self = Self {
        distance: f32::INFINITY,
        uv: Vec2::ZERO,
    };

    pub fn is_some(&self) -> bool {
        self.distance < f32::INFINITY
    }

    pub fn is_none(&self) -> bool {
        !self.is_some()
    }
}
