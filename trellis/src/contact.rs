use glam::{Vec2, Vec3};

use crate::{MaterialIndex, OccludeQuery, Ray, TokenHierarchy, TraceQuery};

/// Surface point resolved out of a trace, in world space; that's what the
/// shading side gets to work with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    point: Vec3,
    normal: Vec3,
    shading_normal: Vec3,
    outgoing: Vec3,
    distance: f32,
    token: TokenHierarchy,
    material: MaterialIndex,
    texcoord: Vec2,
}

impl Contact {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        point: Vec3,
        normal: Vec3,
        shading_normal: Vec3,
        outgoing: Vec3,
        distance: f32,
        token: TokenHierarchy,
        material: MaterialIndex,
        texcoord: Vec2,
    ) -> Self {
        Self {
            point,
            normal,
            shading_normal,
            outgoing,
            distance,
            token,
            material,
            texcoord,
        }
    }

    pub fn point(&self) -> Vec3 {
        self.point
    }

    /// Geometric normal.
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Interpolated vertex normal for triangles (equal to the geometric one
    /// when the triangle came without normals); same as [`Self::normal()`]
    /// for spheres.
    pub fn shading_normal(&self) -> Vec3 {
        self.shading_normal
    }

    /// Unit direction pointing back towards the ray's origin.
    pub fn outgoing(&self) -> Vec3 {
        self.outgoing
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn token(&self) -> &TokenHierarchy {
        &self.token
    }

    pub fn material(&self) -> MaterialIndex {
        self.material
    }

    pub fn texcoord(&self) -> Vec2 {
        self.texcoord
    }

    /// Returns a query for a ray leaving this contact in given direction,
    /// set up not to hit this very surface again.
    pub fn spawn_trace(&self, direction: Vec3) -> TraceQuery {
        TraceQuery::new(Ray::new(self.point, direction)).with_ignore(self.token)
    }

    /// Returns a query checking whether anything lies between this contact
    /// and `target`.
    pub fn spawn_occlude(&self, target: Vec3) -> OccludeQuery {
        let offset = target - self.point;

        OccludeQuery::new(Ray::new(self.point, offset), offset.length())
            .with_ignore(self.token)
    }
}
