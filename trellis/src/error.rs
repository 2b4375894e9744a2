use glam::Vec3;
use thiserror::Error;

use crate::{EntityKind, PackId};

/// Errors raised while preparing packs; none of them can happen once a pack
/// has been published.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("instance transform has non-uniform scale or shear: {scale}")]
    NonUniformScale { scale: Vec3 },

    #[error("instance transform is singular")]
    SingularTransform,

    #[error("invalid sphere: center = {center}, radius = {radius}")]
    InvalidSphere { center: Vec3, radius: f32 },

    #[error("pack has no leaves")]
    EmptyPack,

    #[error("unknown pack: {0:?}")]
    UnknownPack(PackId),

    #[error("too many {kind}s in a single pack: {count} (max: {max})")]
    TooManyLeaves {
        kind: EntityKind,
        count: usize,
        max: usize,
    },

    #[error("instances nested too deep: {depth} (max: {max})")]
    NestingTooDeep { depth: usize, max: usize },
}

pub type Result<T, E = SceneError> = std::result::Result<T, E>;
