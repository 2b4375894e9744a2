use glam::{Vec2, Vec3};

use crate::{EntityToken, Ray, TokenHierarchy};

/// Closest-hit query.
///
/// Starts with a ray, an optional travel limit and an optional leaf to
/// ignore; after tracing, `distance`, `token`, `uv` and `normal` describe the
/// closest hit (if any), with `normal` being the geometric normal in the
/// query ray's space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceQuery {
    pub ray: Ray,
    pub ignore: TokenHierarchy,
    pub distance: f32,
    pub token: TokenHierarchy,
    pub uv: Vec2,
    pub normal: Vec3,

    /// Instances the traversal is currently inside of.
    pub(crate) current: TokenHierarchy,
}

impl TraceQuery {
    pub fn new(ray: Ray) -> Self {
        Self {
            ray,
            ignore: TokenHierarchy::EMPTY,
            distance: f32::INFINITY,
            token: TokenHierarchy::EMPTY,
            uv: Vec2::ZERO,
            normal: Vec3::ZERO,
            current: TokenHierarchy::EMPTY,
        }
    }

    /// Limits the query to hits closer than `travel`.
    pub fn with_travel(mut self, travel: f32) -> Self {
        self.distance = travel;
        self
    }

    /// Makes the query skip given leaf; used for rays spawned from a surface.
    pub fn with_ignore(mut self, ignore: TokenHierarchy) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn hit(&self) -> bool {
        !self.token.is_empty()
    }

    /// Returns the hit point in the query ray's space.
    pub fn point(&self) -> Vec3 {
        self.ray.at(self.distance)
    }

    pub(crate) fn ignores(&self, leaf: EntityToken) -> bool {
        self.ignore.matches(&self.current, leaf)
    }

    pub(crate) fn record(
        &mut self,
        leaf: EntityToken,
        distance: f32,
        uv: Vec2,
        normal: Vec3,
    ) {
        self.distance = distance;
        self.token = self.current.with_final(leaf);
        self.uv = uv;
        self.normal = normal;
    }
}

/// Any-hit query; answers whether anything lies on the ray closer than
/// `travel`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OccludeQuery {
    pub ray: Ray,
    pub travel: f32,
    pub ignore: TokenHierarchy,
    pub(crate) current: TokenHierarchy,
}

impl OccludeQuery {
    pub fn new(ray: Ray, travel: f32) -> Self {
        Self {
            ray,
            travel,
            ignore: TokenHierarchy::EMPTY,
            current: TokenHierarchy::EMPTY,
        }
    }

    pub fn with_ignore(mut self, ignore: TokenHierarchy) -> Self {
        self.ignore = ignore;
        self
    }

    pub(crate) fn ignores(&self, leaf: EntityToken) -> bool {
        self.ignore.matches(&self.current, leaf)
    }
}

/// Counts primitive tests performed during a traversal; `()` counts nothing,
/// which keeps the regular path free of any bookkeeping.
pub(crate) trait Tally {
    fn tally(&mut self);
}

impl Tally for () {
    #[inline(always)]
    fn tally(&mut self) {
        //
    }
}

impl Tally for u32 {
    fn tally(&mut self) {
        *self += 1;
    }
}
