use derivative::Derivative;

use crate::{
    BoundingBox, BuildStats, Bvh, EntityKind, EntityToken, Instance,
    OccludeQuery, Packs, PreparedSphere, PreparedTriangle, Result,
    SceneError, Sphere, Tally, TokenHierarchy, TraceQuery, Triangle,
};

/// Prepared, immutable group of leaves together with its own BVH.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Pack {
    #[derivative(Debug = "ignore")]
    triangles: Vec<PreparedTriangle>,
    #[derivative(Debug = "ignore")]
    spheres: Vec<PreparedSphere>,
    #[derivative(Debug = "ignore")]
    instances: Vec<Instance>,
    #[derivative(Debug = "ignore")]
    bvh: Bvh,
    bounds: BoundingBox,
    depth: usize,
    sphere_threshold: f32,
    stats: BuildStats,
}

impl Pack {
    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Number of instance levels below this pack (zero when it doesn't
    /// contain any instances).
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn triangles(&self) -> &[PreparedTriangle] {
        &self.triangles
    }

    pub fn spheres(&self) -> &[PreparedSphere] {
        &self.spheres
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn triangle(&self, token: EntityToken) -> &PreparedTriangle {
        debug_assert_eq!(EntityKind::Triangle, token.kind());

        &self.triangles[token.index()]
    }

    pub fn sphere(&self, token: EntityToken) -> &PreparedSphere {
        debug_assert_eq!(EntityKind::Sphere, token.kind());

        &self.spheres[token.index()]
    }

    pub fn instance(&self, token: EntityToken) -> &Instance {
        debug_assert_eq!(EntityKind::Instance, token.kind());

        &self.instances[token.index()]
    }

    pub(crate) fn trace<T>(
        &self,
        packs: &Packs,
        query: &mut TraceQuery,
        tally: &mut T,
    ) where
        T: Tally,
    {
        let ray = query.ray;

        self.bvh.trace(&ray, query.distance, |token| {
            match token.kind() {
                EntityKind::Triangle => {
                    tally.tally();

                    let triangle = &self.triangles[token.index()];
                    let hit = triangle.intersect(&ray);

                    if hit.distance < query.distance && !query.ignores(token) {
                        query.record(
                            token,
                            hit.distance,
                            hit.uv,
                            triangle.geometric_normal(),
                        );
                    }
                }

                EntityKind::Sphere => {
                    tally.tally();

                    // Spheres don't consult `ignore` - instead, roots closer
                    // than the threshold are skipped, which lets rays leaving
                    // a sphere still hit its other side
                    let sphere = &self.spheres[token.index()];
                    let hit = sphere.intersect(&ray, self.sphere_threshold);

                    if hit.distance < query.distance {
                        let normal =
                            (ray.at(hit.distance) - sphere.center()).normalize();

                        query.record(token, hit.distance, hit.uv, normal);
                    }
                }

                EntityKind::Instance => {
                    self.trace_instance(packs, token, query, tally);
                }

                EntityKind::Light => {
                    debug_assert!(false, "packs don't contain lights");
                }
            }

            query.distance
        });
    }

    fn trace_instance<T>(
        &self,
        packs: &Packs,
        token: EntityToken,
        query: &mut TraceQuery,
        tally: &mut T,
    ) where
        T: Tally,
    {
        let instance = &self.instances[token.index()];
        let parent_ray = query.ray;
        let parent_distance = query.distance;
        let local_distance = parent_distance * instance.forward_scale();

        query.ray = parent_ray.transform(instance.forward());
        query.distance = local_distance;
        query.current.push(token);

        packs[instance.pack_id()].trace(packs, query, tally);

        query.current.pop();
        query.ray = parent_ray;

        // Exact comparison on purpose: if nothing closer was found, the
        // distance must come back bit-for-bit, not through a lossy rescale
        if query.distance != local_distance {
            query.distance = (query.distance * instance.backward_scale())
                .min(parent_distance);

            query.normal = instance
                .backward()
                .transform_vector3(query.normal)
                .normalize();
        } else {
            query.distance = parent_distance;
        }
    }

    pub(crate) fn occlude(&self, packs: &Packs, query: &mut OccludeQuery) -> bool {
        let ray = query.ray;
        let travel = query.travel;

        self.bvh.occlude(&ray, travel, |token| match token.kind() {
            EntityKind::Triangle => {
                !query.ignores(token)
                    && self.triangles[token.index()].occludes(&ray, travel)
            }

            EntityKind::Sphere => self.spheres[token.index()].occludes(
                &ray,
                self.sphere_threshold,
                travel,
            ),

            EntityKind::Instance => {
                let instance = &self.instances[token.index()];

                query.ray = ray.transform(instance.forward());
                query.travel = travel * instance.forward_scale();
                query.current.push(token);

                let occluded = packs[instance.pack_id()].occlude(packs, query);

                query.current.pop();
                query.ray = ray;
                query.travel = travel;

                occluded
            }

            EntityKind::Light => false,
        })
    }
}

/// Collects leaves for a pack; see [`Packs::insert()`].
///
/// Tokens returned by the `add_*()` functions stay valid in the built pack.
#[derive(Clone, Debug, Default)]
pub struct PackBuilder {
    triangles: Vec<Triangle>,
    spheres: Vec<Sphere>,
    instances: Vec<Instance>,
}

impl PackBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_triangle(&mut self, triangle: Triangle) -> EntityToken {
        self.triangles.push(triangle);

        EntityToken::triangle(self.triangles.len() - 1)
    }

    pub fn add_sphere(&mut self, sphere: Sphere) -> EntityToken {
        self.spheres.push(sphere);

        EntityToken::sphere(self.spheres.len() - 1)
    }

    pub fn add_instance(&mut self, instance: Instance) -> EntityToken {
        self.instances.push(instance);

        EntityToken::instance(self.instances.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.triangles.len() + self.spheres.len() + self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn build(self, packs: &Packs) -> Result<Pack> {
        for (kind, count) in [
            (EntityKind::Triangle, self.triangles.len()),
            (EntityKind::Sphere, self.spheres.len()),
            (EntityKind::Instance, self.instances.len()),
        ] {
            if count > EntityToken::CAPACITY {
                return Err(SceneError::TooManyLeaves {
                    kind,
                    count,
                    max: EntityToken::CAPACITY,
                });
            }
        }

        let mut bounds = Vec::with_capacity(self.len());
        let mut tokens = Vec::with_capacity(self.len());
        let mut degenerate_triangles = 0;

        for (index, triangle) in self.triangles.iter().enumerate() {
            // Degenerate triangles stay in the array (so that tokens don't
            // shift), they just never become leaves
            if triangle.is_degenerate() {
                degenerate_triangles += 1;
                continue;
            }

            bounds.push(triangle.bounds());
            tokens.push(EntityToken::triangle(index));
        }

        if degenerate_triangles > 0 {
            log::warn!(
                "Dropped {} degenerate triangle(s) out of {}",
                degenerate_triangles,
                self.triangles.len(),
            );
        }

        for (index, sphere) in self.spheres.iter().enumerate() {
            if !sphere.is_valid() {
                return Err(SceneError::InvalidSphere {
                    center: sphere.center,
                    radius: sphere.radius,
                });
            }

            bounds.push(sphere.bounds());
            tokens.push(EntityToken::sphere(index));
        }

        let mut depth = 0;

        for (index, instance) in self.instances.iter().enumerate() {
            let pack = packs
                .get(instance.pack_id())
                .ok_or(SceneError::UnknownPack(instance.pack_id()))?;

            depth = depth.max(pack.depth() + 1);

            if depth > TokenHierarchy::MAX_DEPTH {
                return Err(SceneError::NestingTooDeep {
                    depth,
                    max: TokenHierarchy::MAX_DEPTH,
                });
            }

            log::trace!(
                "Instance {}: pack={:?}, scale={}",
                index,
                instance.pack_id(),
                instance.backward_scale(),
            );

            bounds.push(pack.bounds().with_transform(*instance.backward()));
            tokens.push(EntityToken::instance(index));
        }

        if tokens.is_empty() {
            return Err(SceneError::EmptyPack);
        }

        log::info!(
            "Building pack; leaves = {} (triangles = {}, spheres = {}, \
             instances = {})",
            tokens.len(),
            self.triangles.len() - degenerate_triangles,
            self.spheres.len(),
            self.instances.len(),
        );

        let (bvh, stats) = packs.build_bvh(&bounds, &tokens);

        Ok(Pack {
            triangles: self.triangles.iter().map(PreparedTriangle::new).collect(),
            spheres: self.spheres.iter().map(PreparedSphere::new).collect(),
            instances: self.instances,
            bounds: bvh.bounds(),
            bvh,
            depth,
            sphere_threshold: packs.config().sphere_distance_threshold,
            stats,
        })
    }
}
