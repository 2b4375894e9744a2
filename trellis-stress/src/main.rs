//! Builds a synthetic, heavily instanced scene and fires random rays at it,
//! logging how long everything took.
//!
//! Knobs (environment variables):
//!
//! - `TRELLIS_SEED` (default: 0),
//! - `TRELLIS_MESHES` - number of distinct meshes (default: 8),
//! - `TRELLIS_TRIANGLES` - triangles per mesh (default: 20000),
//! - `TRELLIS_SPHERES` - spheres per mesh (default: 200),
//! - `TRELLIS_INSTANCES` - instances in the world (default: 2000),
//! - `TRELLIS_RAYS` - number of camera rays (default: 1000000),
//! - `TRELLIS_PARALLEL_THRESHOLD`, `TRELLIS_THREADS` - see `BuildConfig`.

use std::env;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use glam::{vec3, Affine3A, Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use trellis::*;

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let settings = Settings::from_env()?;

    log::info!("Starting; settings = {:?}", settings);

    let (scene, tt) = measure(|| build_scene(&settings));
    let scene = scene?;

    log::info!("Scene built in {}; bounds = {:?}", tt, scene.bounds());

    for (id, pack) in scene.packs().iter() {
        let stats = pack.stats();

        log::debug!(
            "Pack {:?}: leaves = {}, nodes = {}, depth = {}, forks = {}, tt = {}",
            id,
            stats.leaves,
            stats.nodes,
            stats.depth,
            stats.forks,
            stats.elapsed,
        );
    }

    let (stats, tt) = measure(|| shoot_rays(&settings, &scene));
    let rays_per_sec = (settings.rays as f64) / tt.get().as_secs_f64();

    log::info!(
        "Traced {} rays in {} ({:.0} rays/s); hits = {}, shadowed = {}, \
         avg. tests = {:.2}",
        settings.rays,
        tt,
        rays_per_sec,
        stats.hits,
        stats.shadowed,
        (stats.tests as f64) / (settings.rays.max(1) as f64),
    );

    Ok(())
}

#[derive(Debug)]
struct Settings {
    seed: u64,
    meshes: usize,
    triangles: usize,
    spheres: usize,
    instances: usize,
    rays: usize,
    config: BuildConfig,
}

impl Settings {
    fn from_env() -> Result<Self> {
        let mut config = BuildConfig::default();

        if let Some(threshold) = var("TRELLIS_PARALLEL_THRESHOLD")? {
            config = config.with_parallel_threshold(threshold);
        }

        if let Some(threads) = var("TRELLIS_THREADS")? {
            config = config.with_worker_threads(threads);
        }

        Ok(Self {
            seed: var("TRELLIS_SEED")?.unwrap_or(0),
            meshes: var("TRELLIS_MESHES")?.unwrap_or(8).max(1),
            triangles: var("TRELLIS_TRIANGLES")?.unwrap_or(20_000),
            spheres: var("TRELLIS_SPHERES")?.unwrap_or(200),
            instances: var("TRELLIS_INSTANCES")?.unwrap_or(2_000),
            rays: var("TRELLIS_RAYS")?.unwrap_or(1_000_000),
            config,
        })
    }
}

fn var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map(Some)
            .with_context(|| format!("couldn't parse `{name}={val}`")),

        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err).with_context(|| format!("couldn't read `{name}`")),
    }
}

fn build_scene(settings: &Settings) -> Result<Scene> {
    let mut rng = StdRng::seed_from_u64(settings.seed);
    let mut packs = Packs::new(settings.config);
    let mut meshes = Vec::new();

    for mesh_idx in 0..settings.meshes {
        let mut builder = PackBuilder::new();

        // Random blob: small triangles scattered over a unit sphere
        for _ in 0..settings.triangles {
            let center = random_unit_vector(&mut rng);
            let size = rng.gen_range(0.01..0.05);

            builder.add_triangle(Triangle::new(
                [
                    center + random_unit_vector(&mut rng) * size,
                    center + random_unit_vector(&mut rng) * size,
                    center + random_unit_vector(&mut rng) * size,
                ],
                MaterialIndex::new(mesh_idx as u32),
            ));
        }

        for _ in 0..settings.spheres {
            builder.add_sphere(Sphere::new(
                random_unit_vector(&mut rng) * rng.gen_range(0.0..0.8),
                rng.gen_range(0.02..0.1),
                MaterialIndex::new(mesh_idx as u32),
            ));
        }

        if builder.is_empty() {
            builder.add_sphere(Sphere::new(
                Vec3::ZERO,
                1.0,
                MaterialIndex::new(mesh_idx as u32),
            ));
        }

        meshes.push(
            packs
                .insert(builder)
                .with_context(|| format!("couldn't build mesh #{mesh_idx}"))?,
        );
    }

    let mut world = PackBuilder::new();

    for _ in 0..settings.instances {
        let mesh = meshes[rng.gen_range(0..meshes.len())];

        let transform = Affine3A::from_scale_rotation_translation(
            Vec3::splat(rng.gen_range(0.5..4.0)),
            Quat::from_axis_angle(
                random_unit_vector(&mut rng),
                rng.gen_range(0.0..std::f32::consts::TAU),
            ),
            vec3(
                rng.gen_range(-100.0..100.0),
                rng.gen_range(0.0..50.0),
                rng.gen_range(-100.0..100.0),
            ),
        );

        world.add_instance(Instance::new(mesh, transform)?);
    }

    // Ground
    for positions in [
        [
            vec3(-200.0, 0.0, -200.0),
            vec3(-200.0, 0.0, 200.0),
            vec3(200.0, 0.0, 200.0),
        ],
        [
            vec3(-200.0, 0.0, -200.0),
            vec3(200.0, 0.0, 200.0),
            vec3(200.0, 0.0, -200.0),
        ],
    ] {
        world.add_triangle(Triangle::new(positions, MaterialIndex::default()));
    }

    let world = packs.insert(world).context("couldn't build the world")?;

    Ok(Scene::new(packs, world)?)
}

#[derive(Debug, Default)]
struct RayStats {
    hits: u64,
    shadowed: u64,
    tests: u64,
}

fn shoot_rays(settings: &Settings, scene: &Scene) -> RayStats {
    let bounds = scene.bounds();
    let eye = bounds.centroid() + vec3(0.0, bounds.extent().y, bounds.extent().z);
    let light = bounds.centroid() + vec3(0.0, bounds.extent().y * 2.0, 0.0);

    let hits = AtomicU64::new(0);
    let shadowed = AtomicU64::new(0);
    let tests = AtomicU64::new(0);

    (0..settings.rays).into_par_iter().for_each(|ray_idx| {
        let mut rng = StdRng::seed_from_u64(settings.seed ^ (ray_idx as u64));

        let target = vec3(
            rng.gen_range(bounds.min().x..=bounds.max().x),
            rng.gen_range(bounds.min().y..=bounds.max().y),
            rng.gen_range(bounds.min().z..=bounds.max().z),
        );

        let ray = Ray::new(eye, target - eye);

        // Counting is a separate (slower) traversal, so sample it
        if ray_idx % 64 == 0 {
            tests.fetch_add(
                64 * scene.intersection_tests(ray) as u64,
                Ordering::Relaxed,
            );
        }

        let mut query = TraceQuery::new(ray);

        if !scene.trace(&mut query) {
            return;
        }

        hits.fetch_add(1, Ordering::Relaxed);

        let contact = scene.interact(&query);
        let mut shadow = contact.spawn_occlude(light);

        if scene.occlude(&mut shadow) {
            shadowed.fetch_add(1, Ordering::Relaxed);
        }
    });

    RayStats {
        hits: hits.into_inner(),
        shadowed: shadowed.into_inner(),
        tests: tests.into_inner(),
    }
}

fn random_unit_vector(rng: &mut StdRng) -> Vec3 {
    loop {
        let vec = vec3(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );

        let len = vec.length();

        if len > 1e-3 && len <= 1.0 {
            return vec / len;
        }
    }
}
