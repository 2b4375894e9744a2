use glam::{Affine3A, Vec3};

use crate::BoundingBox;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
    inv_direction: Vec3,
}

impl Ray {
    /// Creates a new ray; `direction` gets normalized, so that distances
    /// along the ray are measured in world units.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        let direction = direction.normalize();

        Self {
            origin,
            direction,
            inv_direction: 1.0 / direction,
        }
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Returns this ray moved into the coordinate space of `transform`.
    pub fn transform(&self, transform: &Affine3A) -> Self {
        Self::new(
            transform.transform_point3(self.origin),
            transform.transform_vector3(self.direction),
        )
    }

    /// Returns the distance at which this ray enters given box (zero if the
    /// ray starts inside of it) or `f32::INFINITY` if the ray misses it.
    #[inline]
    pub fn distance_to(&self, bounds: &BoundingBox) -> f32 {
        // Pick slabs by the direction's sign instead of min-maxing them, so
        // that inverted (empty) boxes stay inverted
        let negative = self.inv_direction.cmplt(Vec3::ZERO);
        let entry = Vec3::select(negative, bounds.max(), bounds.min());
        let exit = Vec3::select(negative, bounds.min(), bounds.max());

        let near = ((entry - self.origin) * self.inv_direction).max_element();
        let far = ((exit - self.origin) * self.inv_direction).min_element();

        if far >= near && far >= 0.0 {
            near.max(0.0)
        } else {
            f32::INFINITY
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{vec3, Quat};

    use super::*;

    fn unit_box() -> BoundingBox {
        BoundingBox::new(Vec3::ZERO, Vec3::ONE)
    }

    #[test]
    fn at() {
        let ray = Ray::new(Vec3::ZERO, vec3(2.0, 0.0, 0.0));

        assert_eq!(vec3(1.0, 0.0, 0.0), ray.direction());
        assert_eq!(vec3(5.0, 0.0, 0.0), ray.at(5.0));
    }

    #[test]
    fn distance_to_box() {
        let ray = Ray::new(vec3(-5.0, 0.5, 0.5), vec3(1.0, 0.0, 0.0));

        assert_relative_eq!(5.0, ray.distance_to(&unit_box()));

        // Starting inside
        let ray = Ray::new(vec3(0.5, 0.5, 0.5), vec3(1.0, 0.0, 0.0));

        assert_eq!(0.0, ray.distance_to(&unit_box()));

        // Diagonal
        let ray = Ray::new(Vec3::splat(-1.0), Vec3::ONE);

        assert_relative_eq!(
            3.0f32.sqrt(),
            ray.distance_to(&unit_box()),
            epsilon = 1e-5
        );
    }

    #[test]
    fn missing_box() {
        // Passing by
        let ray = Ray::new(vec3(-5.0, 5.0, 5.0), vec3(1.0, 0.0, 0.0));

        assert_eq!(f32::INFINITY, ray.distance_to(&unit_box()));

        // Pointing away
        let ray = Ray::new(vec3(-5.0, 0.5, 0.5), vec3(-1.0, 0.0, 0.0));

        assert_eq!(f32::INFINITY, ray.distance_to(&unit_box()));

        // Empty box
        let ray = Ray::new(Vec3::ZERO, Vec3::X);

        assert_eq!(f32::INFINITY, ray.distance_to(&BoundingBox::EMPTY));
    }

    #[test]
    fn degenerate_direction_misses() {
        let ray = Ray::new(vec3(0.5, 0.5, 0.5), Vec3::ZERO);

        assert_eq!(f32::INFINITY, ray.distance_to(&unit_box()));
    }

    #[test]
    fn transform_round_trip() {
        let backward = Affine3A::from_scale_rotation_translation(
            Vec3::splat(3.0),
            Quat::from_euler(glam::EulerRot::XYZ, 0.3, -1.2, 2.0),
            vec3(1.0, -2.0, 7.5),
        );

        let forward = backward.inverse();
        let ray = Ray::new(vec3(0.25, 4.0, -3.0), vec3(1.0, 2.0, -0.5));
        let round_trip = ray.transform(&forward).transform(&backward);

        assert_relative_eq!(ray.origin().x, round_trip.origin().x, epsilon = 1e-4);
        assert_relative_eq!(ray.origin().y, round_trip.origin().y, epsilon = 1e-4);
        assert_relative_eq!(ray.origin().z, round_trip.origin().z, epsilon = 1e-4);

        assert_relative_eq!(
            ray.direction().x,
            round_trip.direction().x,
            epsilon = 1e-5
        );
        assert_relative_eq!(
            ray.direction().y,
            round_trip.direction().y,
            epsilon = 1e-5
        );
        assert_relative_eq!(
            ray.direction().z,
            round_trip.direction().z,
            epsilon = 1e-5
        );
    }
}
