use glam::{vec2, Vec2, Vec3};

use crate::{BoundingBox, Intersection, MaterialIndex, Ray};

/// Triangle as handed over by the scene preparation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub positions: [Vec3; 3],
    pub normals: Option<[Vec3; 3]>,
    pub texcoords: Option<[Vec2; 3]>,
    pub material: MaterialIndex,
}

impl Triangle {
    pub fn new(positions: [Vec3; 3], material: MaterialIndex) -> Self {
        Self {
            positions,
            normals: None,
            texcoords: None,
            material,
        }
    }

    pub fn with_normals(mut self, normals: [Vec3; 3]) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_texcoords(mut self, texcoords: [Vec2; 3]) -> Self {
        self.texcoords = Some(texcoords);
        self
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_points(self.positions)
    }

    pub fn area(&self) -> f32 {
        let [p0, p1, p2] = self.positions;

        (p1 - p0).cross(p2 - p0).length() * 0.5
    }

    /// Zero-area triangles can't be hit and only pollute the tree, so they
    /// get filtered out before building.
    pub fn is_degenerate(&self) -> bool {
        let area = self.area();

        !(area > 0.0 && area.is_finite())
    }
}

/// Triangle laid out for the Möller-Trumbore test.
#[derive(Clone, Copy, Debug)]
pub struct PreparedTriangle {
    vertex0: Vec3,
    edge1: Vec3,
    edge2: Vec3,
    det_epsilon: f32,
    normal: Vec3,
    normals: [Vec3; 3],
    texcoords: [Vec2; 3],
    material: MaterialIndex,
}

impl PreparedTriangle {
    /// Relative to `|edge1| * |edge2|`, so that small triangles keep being
    /// hittable.
    const EPSILON: f32 = 1e-8;

    pub fn new(triangle: &Triangle) -> Self {
        let [p0, p1, p2] = triangle.positions;
        let edge1 = p1 - p0;
        let edge2 = p2 - p0;
        let normal = edge1.cross(edge2).normalize();

        let normals = triangle
            .normals
            .map(|normals| normals.map(Vec3::normalize))
            .unwrap_or([normal; 3]);

        let texcoords = triangle.texcoords.unwrap_or([
            vec2(0.0, 0.0),
            vec2(1.0, 0.0),
            vec2(0.0, 1.0),
        ]);

        Self {
            vertex0: p0,
            edge1,
            edge2,
            det_epsilon: Self::EPSILON * edge1.length() * edge2.length(),
            normal,
            normals,
            texcoords,
            material: triangle.material,
        }
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        [
            self.vertex0,
            self.vertex0 + self.edge1,
            self.vertex0 + self.edge2,
        ]
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_points(self.vertices())
    }

    pub fn material(&self) -> MaterialIndex {
        self.material
    }

    pub fn geometric_normal(&self) -> Vec3 {
        self.normal
    }

    /// Returns the interpolated vertex normal at given barycentric
    /// coordinates.
    pub fn shading_normal(&self, uv: Vec2) -> Vec3 {
        let [n0, n1, n2] = self.normals;

        ((1.0 - uv.x - uv.y) * n0 + uv.x * n1 + uv.y * n2).normalize()
    }

    pub fn texcoord(&self, uv: Vec2) -> Vec2 {
        let [t0, t1, t2] = self.texcoords;

        (1.0 - uv.x - uv.y) * t0 + uv.x * t1 + uv.y * t2
    }

    pub fn point(&self, uv: Vec2) -> Vec3 {
        self.vertex0 + uv.x * self.edge1 + uv.y * self.edge2
    }

    pub fn intersect(&self, ray: &Ray) -> Intersection {
        let pvec = ray.direction().cross(self.edge2);
        let det = self.edge1.dot(pvec);

        // Ray is parallel to the triangle's plane
        if !(det.abs() > self.det_epsilon) {
            return Intersection::MISS;
        }

        let inv_det = 1.0 / det;
        let tvec = ray.origin() - self.vertex0;
        let u = tvec.dot(pvec) * inv_det;

        if !(0.0..=1.0).contains(&u) {
            return Intersection::MISS;
        }

        let qvec = tvec.cross(self.edge1);
        let v = ray.direction().dot(qvec) * inv_det;

        if !(v >= 0.0 && u + v <= 1.0) {
            return Intersection::MISS;
        }

        let distance = self.edge2.dot(qvec) * inv_det;

        if !(distance >= 0.0) {
            return Intersection::MISS;
        }

        Intersection {
            distance,
            uv: vec2(u, v),
        }
    }

    /// Checks whether the ray hits this triangle closer than `travel`,
    /// without bothering to report where.
    pub fn occludes(&self, ray: &Ray, travel: f32) -> bool {
        let pvec = ray.direction().cross(self.edge2);
        let det = self.edge1.dot(pvec);

        if !(det.abs() > self.det_epsilon) {
            return false;
        }

        let inv_det = 1.0 / det;
        let tvec = ray.origin() - self.vertex0;
        let u = tvec.dot(pvec) * inv_det;

        if !(0.0..=1.0).contains(&u) {
            return false;
        }

        let qvec = tvec.cross(self.edge1);
        let v = ray.direction().dot(qvec) * inv_det;

        if !(v >= 0.0 && u + v <= 1.0) {
            return false;
        }

        let distance = self.edge2.dot(qvec) * inv_det;

        distance >= 0.0 && distance < travel
    }
}
