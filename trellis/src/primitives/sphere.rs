use std::f32::consts::{PI, TAU};

use glam::{vec2, vec3, Vec2, Vec3};

use crate::{BoundingBox, Intersection, MaterialIndex, Ray};

/// Sphere as handed over by the scene preparation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub material: MaterialIndex,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32, material: MaterialIndex) -> Self {
        Self {
            center,
            radius,
            material,
        }
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(
            self.center - Vec3::splat(self.radius),
            self.center + Vec3::splat(self.radius),
        )
    }

    pub fn is_valid(&self) -> bool {
        self.radius > 0.0 && self.radius.is_finite() && self.center.is_finite()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PreparedSphere {
    center: Vec3,
    radius: f32,
    radius2: f32,
    material: MaterialIndex,
}

impl PreparedSphere {
    pub fn new(sphere: &Sphere) -> Self {
        Self {
            center: sphere.center,
            radius: sphere.radius,
            radius2: sphere.radius * sphere.radius,
            material: sphere.material,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn material(&self) -> MaterialIndex {
        self.material
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(
            self.center - Vec3::splat(self.radius),
            self.center + Vec3::splat(self.radius),
        )
    }

    /// Intersects the ray with this sphere.
    ///
    /// Roots closer than `threshold` are ignored; this keeps rays spawned
    /// from the sphere's own surface from hitting it again right away, while
    /// still letting them reach the sphere's far side.
    pub fn intersect(&self, ray: &Ray, threshold: f32) -> Intersection {
        let distance = self.distance(ray, threshold);

        if distance == f32::INFINITY {
            return Intersection::MISS;
        }

        let normal = (ray.at(distance) - self.center) / self.radius;

        Intersection {
            distance,
            uv: Self::spherical(normal),
        }
    }

    pub fn occludes(&self, ray: &Ray, threshold: f32, travel: f32) -> bool {
        self.distance(ray, threshold) < travel
    }

    /// Returns the outward normal at given spherical coordinates.
    pub fn normal(&self, uv: Vec2) -> Vec3 {
        let phi = (uv.x - 0.5) * TAU;
        let theta = uv.y * PI;
        let (sin_theta, cos_theta) = theta.sin_cos();
        let (sin_phi, cos_phi) = phi.sin_cos();

        vec3(sin_theta * sin_phi, cos_theta, sin_theta * cos_phi)
    }

    pub fn point(&self, uv: Vec2) -> Vec3 {
        self.center + self.normal(uv) * self.radius
    }

    fn distance(&self, ray: &Ray, threshold: f32) -> f32 {
        let offset = ray.origin() - self.center;
        let b = offset.dot(ray.direction());

        // Distance from the center to the ray's line, computed directly rather
        // than through `b^2 - c`, which cancels badly for far-away spheres
        let perpendicular = offset - ray.direction() * b;
        let discriminant = self.radius2 - perpendicular.length_squared();

        if !(discriminant >= 0.0) {
            return f32::INFINITY;
        }

        let root = discriminant.sqrt();
        let near = -b - root;

        if near >= threshold {
            return near;
        }

        let far = -b + root;

        if far >= threshold {
            far
        } else {
            f32::INFINITY
        }
    }

    fn spherical(normal: Vec3) -> Vec2 {
        let u = normal.x.atan2(normal.z) / TAU + 0.5;
        let v = normal.y.clamp(-1.0, 1.0).acos() / PI;

        vec2(u, v)
    }
}
