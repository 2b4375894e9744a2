use glam::Affine3A;

use crate::{
    BoundingBox, Contact, EntityKind, OccludeQuery, Pack, PackId, Packs, Ray,
    Result, SceneError, TraceQuery,
};

/// Frozen set of packs together with the pack that acts as the world.
///
/// All queries are read-only, so a scene can be shared across as many
/// threads as there are rays to shoot.
#[derive(Debug)]
pub struct Scene {
    packs: Packs,
    root: PackId,
}

impl Scene {
    pub fn new(packs: Packs, root: PackId) -> Result<Self> {
        let Some(root_pack) = packs.get(root) else {
            return Err(SceneError::UnknownPack(root));
        };

        log::info!(
            "Scene ready; packs = {}, depth = {}, bounds = {:?}",
            packs.len(),
            root_pack.depth(),
            root_pack.bounds(),
        );

        Ok(Self { packs, root })
    }

    pub fn packs(&self) -> &Packs {
        &self.packs
    }

    pub fn root(&self) -> &Pack {
        &self.packs[self.root]
    }

    pub fn bounds(&self) -> BoundingBox {
        self.root().bounds()
    }

    /// Finds the closest hit along the query's ray (up to its current
    /// distance), returning whether anything closer got found.
    pub fn trace(&self, query: &mut TraceQuery) -> bool {
        debug_assert!(query.current.is_empty() && query.current.depth() == 0);

        let token = query.token;
        let distance = query.distance;

        self.root().trace(&self.packs, query, &mut ());

        query.distance < distance || query.token != token
    }

    /// Checks whether anything lies along the query's ray closer than its
    /// travel distance.
    pub fn occlude(&self, query: &mut OccludeQuery) -> bool {
        debug_assert!(query.current.is_empty() && query.current.depth() == 0);

        self.root().occlude(&self.packs, query)
    }

    /// Returns how many primitives a trace of given ray gets to test; handy
    /// for rendering heat-maps of the tree's quality.
    pub fn intersection_tests(&self, ray: Ray) -> u32 {
        let mut query = TraceQuery::new(ray);
        let mut tests = 0;

        self.root().trace(&self.packs, &mut query, &mut tests);

        tests
    }

    /// Resolves the query's hit into world space.
    ///
    /// # Panics
    ///
    /// Panics if the query didn't hit anything.
    pub fn interact(&self, query: &TraceQuery) -> Contact {
        assert!(query.hit(), "interacting with a query that hit nothing");

        let mut pack = self.root();
        let mut transform = Affine3A::IDENTITY;

        for &token in query.token.instances() {
            let instance = pack.instance(token);

            transform = transform * *instance.backward();
            pack = &self.packs[instance.pack_id()];
        }

        let leaf = query.token.final_token();
        let uv = query.uv;

        let (point, normal, shading_normal, material, texcoord) =
            match leaf.kind() {
                EntityKind::Triangle => {
                    let triangle = pack.triangle(leaf);

                    (
                        triangle.point(uv),
                        triangle.geometric_normal(),
                        triangle.shading_normal(uv),
                        triangle.material(),
                        triangle.texcoord(uv),
                    )
                }

                EntityKind::Sphere => {
                    let sphere = pack.sphere(leaf);
                    let normal = sphere.normal(uv);

                    (sphere.point(uv), normal, normal, sphere.material(), uv)
                }

                kind => {
                    unreachable!("hits end on triangles or spheres, got {kind}")
                }
            };

        Contact::new(
            transform.transform_point3(point),
            transform.transform_vector3(normal).normalize(),
            transform.transform_vector3(shading_normal).normalize(),
            -query.ray.direction(),
            query.distance,
            query.token,
            material,
            texcoord,
        )
    }
}
