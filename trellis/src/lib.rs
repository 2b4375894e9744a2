//! Ray-query engine for offline rendering: SAH-built bounding volume
//! hierarchies over triangles, spheres and instances of other packs, with
//! closest-hit (trace) and any-hit (occlude) queries.
//!
//! Typical flow:
//!
//! - fill a [`PackBuilder`] for each group of geometry, inserting them into
//!   [`Packs`] (instances can refer only to packs inserted earlier),
//! - freeze the arena into a [`Scene`], picking one pack as the world,
//! - shoot [`TraceQuery`]s / [`OccludeQuery`]s at it and resolve hits into
//!   [`Contact`]s.

mod bvh;
mod config;
mod contact;
mod error;
mod pack;
mod packs;
mod primitives;
mod query;
mod ray;
mod scene;
mod token;
mod token_hierarchy;
mod utils;

pub use self::bvh::*;
pub use self::config::*;
pub use self::contact::*;
pub use self::error::*;
pub use self::pack::*;
pub use self::packs::*;
pub use self::primitives::*;
pub use self::query::*;
pub use self::ray::*;
pub use self::scene::*;
pub use self::token::*;
pub use self::token_hierarchy::*;
pub use self::utils::*;
