use std::ops::{Add, AddAssign};

use glam::{vec3, Affine3A, Vec3};

use super::Axis;

/// Axis-aligned bounding box.
///
/// The default box is empty (`min = +inf`, `max = -inf`), which makes it the
/// identity element of `+`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    min: Vec3,
    max: Vec3,
}

impl BoundingBox {
    pub const EMPTY: Self = Self {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().collect()
    }

    pub fn min(&self) -> Vec3 {
        self.min
    }

    pub fn max(&self) -> Vec3 {
        self.max
    }

    pub fn extent(&self) -> Vec3 {
        self.max() - self.min()
    }

    pub fn centroid(&self) -> Vec3 {
        (self.min() + self.max()) * 0.5
    }

    pub fn is_set(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    /// Returns half of the box's total surface area - that's the measure used
    /// by the surface area heuristic.
    pub fn half_area(&self) -> f32 {
        if !self.is_set() {
            return 0.0;
        }

        let extent = self.extent();

        extent.x * extent.y + extent.y * extent.z + extent.z * extent.x
    }

    /// Returns the axis along which this box is the longest; ties go to the
    /// lowest axis.
    pub fn major_axis(&self) -> Axis {
        let extent = self.extent();

        if extent.x >= extent.y && extent.x >= extent.z {
            Axis::X
        } else if extent.y >= extent.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    pub fn contains(&self, other: &Self) -> bool {
        if !other.is_set() {
            return true;
        }

        self.min.cmple(other.min).all() && self.max.cmpge(other.max).all()
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.min.cmple(point).all() && self.max.cmpge(point).all()
    }

    pub fn with_transform(&self, transform: Affine3A) -> Self {
        if !self.is_set() {
            return *self;
        }

        (0..8)
            .map(|i| {
                let point = vec3(
                    if i & 1 > 0 { self.max.x } else { self.min.x },
                    if i & 2 > 0 { self.max.y } else { self.min.y },
                    if i & 4 > 0 { self.max.z } else { self.min.z },
                );

                transform.transform_point3(point)
            })
            .collect()
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Add<Vec3> for BoundingBox {
    type Output = Self;

    fn add(mut self, rhs: Vec3) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign<Vec3> for BoundingBox {
    fn add_assign(&mut self, rhs: Vec3) {
        self.min = self.min.min(rhs);
        self.max = self.max.max(rhs);
    }
}

impl FromIterator<Vec3> for BoundingBox {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = Vec3>,
    {
        let mut this = Self::default();

        for item in iter {
            this += item;
        }

        this
    }
}

impl Add<Self> for BoundingBox {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign<Self> for BoundingBox {
    fn add_assign(&mut self, rhs: Self) {
        self.min = self.min.min(rhs.min);
        self.max = self.max.max(rhs.max);
    }
}

impl FromIterator<Self> for BoundingBox {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = Self>,
    {
        let mut this = Self::default();

        for item in iter {
            this += item;
        }

        this
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::Quat;

    use super::*;

    #[test]
    fn empty_is_absorbing() {
        let bb = BoundingBox::new(vec3(-1.0, 0.0, 2.0), vec3(1.0, 3.0, 4.0));

        assert_eq!(bb, bb + BoundingBox::EMPTY);
        assert_eq!(bb, BoundingBox::EMPTY + bb);
        assert!(!(BoundingBox::EMPTY + BoundingBox::EMPTY).is_set());
        assert_eq!(0.0, BoundingBox::EMPTY.half_area());
    }

    #[test]
    fn half_area() {
        let bb = BoundingBox::new(Vec3::ZERO, vec3(1.0, 2.0, 3.0));

        // 2 + 6 + 3
        assert_relative_eq!(11.0, bb.half_area());

        // Flat boxes are fine too
        let bb = BoundingBox::new(Vec3::ZERO, vec3(2.0, 2.0, 0.0));

        assert_relative_eq!(4.0, bb.half_area());
    }

    #[test]
    fn encapsulate() {
        let bb = BoundingBox::from_points([
            vec3(1.0, 1.0, 1.0),
            vec3(-1.0, 2.0, 0.5),
            vec3(0.0, -3.0, 0.0),
        ]);

        assert_eq!(vec3(-1.0, -3.0, 0.0), bb.min());
        assert_eq!(vec3(1.0, 2.0, 1.0), bb.max());
        assert_eq!(Axis::Y, bb.major_axis());
        assert!(bb.contains_point(Vec3::ZERO));
    }

    #[test]
    fn union_contains_operands() {
        let a = BoundingBox::new(Vec3::ZERO, Vec3::ONE);
        let b = BoundingBox::new(vec3(2.0, -1.0, 0.5), vec3(3.0, 0.0, 0.75));
        let ab = a + b;

        assert!(ab.contains(&a));
        assert!(ab.contains(&b));
        assert!(!a.contains(&b));
    }

    #[test]
    fn with_transform() {
        let bb = BoundingBox::new(Vec3::splat(-1.0), Vec3::ONE);

        let transform = Affine3A::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_4),
            vec3(5.0, 0.0, 0.0),
        );

        let bb = bb.with_transform(transform);
        let half_diagonal = 2.0 * std::f32::consts::SQRT_2;

        assert_relative_eq!(5.0 - half_diagonal, bb.min().x, epsilon = 1e-4);
        assert_relative_eq!(5.0 + half_diagonal, bb.max().x, epsilon = 1e-4);
        assert_relative_eq!(-2.0, bb.min().z, epsilon = 1e-4);
        assert_relative_eq!(2.0, bb.max().z, epsilon = 1e-4);
    }
}
