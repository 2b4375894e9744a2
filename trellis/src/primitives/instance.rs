use glam::{Affine3A, Vec3};

use crate::{PackId, Result, SceneError};

/// Placement of a pack inside another pack.
///
/// `forward` maps the parent's space into the pack's local space, `backward`
/// maps it back. Only rigid transforms with uniform scale are accepted, so
/// that a distance crossing the two spaces changes by a single factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Instance {
    pack_id: PackId,
    forward: Affine3A,
    backward: Affine3A,
    forward_scale: f32,
    backward_scale: f32,
}

impl Instance {
    /// Relative tolerance used when checking whether a transform's axes are
    /// orthogonal and equally long.
    const SCALE_TOLERANCE: f32 = 1e-4;

    /// Places `pack_id` with given local-to-parent transform.
    pub fn new(pack_id: PackId, transform: Affine3A) -> Result<Self> {
        let backward_scale = Self::uniform_scale(&transform)?;
        let forward = transform.inverse();

        if !forward.is_finite() {
            return Err(SceneError::SingularTransform);
        }

        Ok(Self {
            pack_id,
            forward,
            backward: transform,
            forward_scale: 1.0 / backward_scale,
            backward_scale,
        })
    }

    pub fn pack_id(&self) -> PackId {
        self.pack_id
    }

    /// Parent-to-local transform.
    pub fn forward(&self) -> &Affine3A {
        &self.forward
    }

    /// Local-to-parent transform.
    pub fn backward(&self) -> &Affine3A {
        &self.backward
    }

    pub fn forward_scale(&self) -> f32 {
        self.forward_scale
    }

    pub fn backward_scale(&self) -> f32 {
        self.backward_scale
    }

    fn uniform_scale(transform: &Affine3A) -> Result<f32> {
        let axes = [
            Vec3::from(transform.matrix3.x_axis),
            Vec3::from(transform.matrix3.y_axis),
            Vec3::from(transform.matrix3.z_axis),
        ];

        if !transform.is_finite() {
            return Err(SceneError::SingularTransform);
        }

        let scale = Vec3::new(axes[0].length(), axes[1].length(), axes[2].length());

        if scale.min_element() <= 0.0 {
            return Err(SceneError::SingularTransform);
        }

        let max = scale.max_element();
        let tolerance = Self::SCALE_TOLERANCE * max;

        let is_uniform = scale.max_element() - scale.min_element() <= tolerance;

        let is_orthogonal = [(0, 1), (1, 2), (2, 0)]
            .into_iter()
            .all(|(a, b)| axes[a].dot(axes[b]).abs() <= tolerance * max);

        if is_uniform && is_orthogonal {
            Ok(scale.x)
        } else {
            Err(SceneError::NonUniformScale { scale })
        }
    }
}
