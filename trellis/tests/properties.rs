use approx::assert_relative_eq;
use fxhash::FxHashSet;
use glam::{vec3, Affine3A, Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use trellis::*;

/// Leaves of a generated scene, kept around for brute-force checks.
struct Fixture {
    scene: Scene,
    mesh: Vec<Triangle>,
    mesh_spheres: Vec<Sphere>,
    instances: Vec<Instance>,
    triangles: Vec<Triangle>,
    spheres: Vec<Sphere>,
}

fn random_vec(rng: &mut StdRng, range: f32) -> Vec3 {
    vec3(
        rng.gen_range(-range..range),
        rng.gen_range(-range..range),
        rng.gen_range(-range..range),
    )
}

fn random_triangle(rng: &mut StdRng, center_range: f32, size: f32) -> Triangle {
    let center = random_vec(rng, center_range);

    Triangle::new(
        [
            center + random_vec(rng, size),
            center + random_vec(rng, size),
            center + random_vec(rng, size),
        ],
        MaterialIndex::new(rng.gen_range(0..8)),
    )
}

fn random_sphere(rng: &mut StdRng, center_range: f32) -> Sphere {
    Sphere::new(
        random_vec(rng, center_range),
        rng.gen_range(0.05..0.5),
        MaterialIndex::new(rng.gen_range(0..8)),
    )
}

fn random_ray(rng: &mut StdRng) -> Ray {
    let origin = random_vec(rng, 30.0);
    let target = random_vec(rng, 10.0);

    Ray::new(origin, target - origin)
}

fn fixture(seed: u64, config: BuildConfig) -> Fixture {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut packs = Packs::new(config);

    let mesh: Vec<_> = (0..300)
        .map(|_| random_triangle(&mut rng, 1.0, 0.3))
        .collect();

    let mesh_spheres: Vec<_> =
        (0..20).map(|_| random_sphere(&mut rng, 1.0)).collect();

    let mut builder = PackBuilder::new();

    for triangle in &mesh {
        builder.add_triangle(*triangle);
    }

    for sphere in &mesh_spheres {
        builder.add_sphere(*sphere);
    }

    let mesh_id = packs.insert(builder).unwrap();

    let instances: Vec<_> = (0..40)
        .map(|_| {
            let axis = random_vec(&mut rng, 1.0).normalize_or_zero();
            let axis = if axis == Vec3::ZERO { Vec3::Y } else { axis };

            Instance::new(
                mesh_id,
                Affine3A::from_scale_rotation_translation(
                    Vec3::splat(rng.gen_range(0.5..3.0)),
                    Quat::from_axis_angle(axis, rng.gen_range(0.0..6.0)),
                    random_vec(&mut rng, 15.0),
                ),
            )
            .unwrap()
        })
        .collect();

    let triangles: Vec<_> = (0..200)
        .map(|_| random_triangle(&mut rng, 15.0, 1.5))
        .collect();

    let spheres: Vec<_> =
        (0..30).map(|_| random_sphere(&mut rng, 15.0)).collect();

    let mut builder = PackBuilder::new();

    for triangle in &triangles {
        builder.add_triangle(*triangle);
    }

    for sphere in &spheres {
        builder.add_sphere(*sphere);
    }

    for instance in &instances {
        builder.add_instance(*instance);
    }

    let root = packs.insert(builder).unwrap();

    Fixture {
        scene: Scene::new(packs, root).unwrap(),
        mesh,
        mesh_spheres,
        instances,
        triangles,
        spheres,
    }
}

/// Closest hit found by testing every single leaf.
fn brute_force_trace(fixture: &Fixture, ray: &Ray) -> f32 {
    let threshold = BuildConfig::default().sphere_distance_threshold;

    let closest = |ray: &Ray, triangles: &[Triangle], spheres: &[Sphere]| {
        let triangles = triangles
            .iter()
            .filter(|triangle| !triangle.is_degenerate())
            .map(|triangle| PreparedTriangle::new(triangle).intersect(ray));

        let spheres = spheres
            .iter()
            .map(|sphere| PreparedSphere::new(sphere).intersect(ray, threshold));

        triangles
            .chain(spheres)
            .map(|hit| hit.distance)
            .fold(f32::INFINITY, f32::min)
    };

    let mut distance = closest(ray, &fixture.triangles, &fixture.spheres);

    for instance in &fixture.instances {
        let local_ray = ray.transform(instance.forward());

        let local_distance =
            closest(&local_ray, &fixture.mesh, &fixture.mesh_spheres);

        distance = distance.min(local_distance * instance.backward_scale());
    }

    distance
}

#[test]
fn trace_matches_brute_force() {
    let fixture = fixture(1, BuildConfig::default());
    let mut rng = StdRng::seed_from_u64(100);
    let mut hits = 0;

    for _ in 0..1000 {
        let ray = random_ray(&mut rng);
        let expected = brute_force_trace(&fixture, &ray);
        let mut query = TraceQuery::new(ray);

        fixture.scene.trace(&mut query);

        if expected.is_finite() {
            hits += 1;

            assert!(query.hit());
            assert_relative_eq!(expected, query.distance, max_relative = 1e-4);
        } else {
            assert!(!query.hit());
            assert_eq!(f32::INFINITY, query.distance);
        }
    }

    // Make sure the scene isn't accidentally empty
    assert!(hits > 100);
}

#[test]
fn trace_respects_travel_limit() {
    let fixture = fixture(2, BuildConfig::default());
    let mut rng = StdRng::seed_from_u64(200);

    for _ in 0..500 {
        let ray = random_ray(&mut rng);
        let mut unlimited = TraceQuery::new(ray);

        fixture.scene.trace(&mut unlimited);

        let travel = rng.gen_range(1.0..60.0);
        let mut limited = TraceQuery::new(ray).with_travel(travel);
        let found = fixture.scene.trace(&mut limited);

        assert!(limited.distance <= travel);

        if unlimited.distance < travel * 0.999 {
            assert!(found);
            assert_relative_eq!(
                unlimited.distance,
                limited.distance,
                max_relative = 1e-4
            );
        } else if unlimited.distance > travel * 1.001 {
            assert!(!found);
            assert!(!limited.hit());
            assert_eq!(travel, limited.distance);
        }
    }
}

#[test]
fn occlude_agrees_with_trace() {
    let fixture = fixture(3, BuildConfig::default());
    let mut rng = StdRng::seed_from_u64(300);

    for _ in 0..1000 {
        let ray = random_ray(&mut rng);
        let mut query = TraceQuery::new(ray);

        fixture.scene.trace(&mut query);

        let travel = rng.gen_range(1.0..60.0);

        // Too close to call with floats
        if (query.distance - travel).abs() < 1e-3 * travel {
            continue;
        }

        let occluded = fixture.scene.occlude(&mut OccludeQuery::new(ray, travel));

        assert_eq!(query.distance < travel, occluded);
    }
}

#[test]
fn interact_agrees_with_trace() {
    let fixture = fixture(4, BuildConfig::default());
    let mut rng = StdRng::seed_from_u64(400);
    let mut checked = 0;

    while checked < 200 {
        let mut query = TraceQuery::new(random_ray(&mut rng));

        if !fixture.scene.trace(&mut query) {
            continue;
        }

        let contact = fixture.scene.interact(&query);

        assert_relative_eq!(query.point(), contact.point(), epsilon = 1e-2);
        assert_relative_eq!(query.normal, contact.normal(), epsilon = 1e-2);
        assert_relative_eq!(1.0, contact.normal().length(), epsilon = 1e-4);
        assert_eq!(query.distance, contact.distance());
        assert_eq!(&query.token, contact.token());

        checked += 1;
    }
}

#[test]
fn spawned_rays_dont_hit_their_own_triangle() {
    let fixture = fixture(5, BuildConfig::default());
    let mut rng = StdRng::seed_from_u64(500);
    let mut checked = 0;

    while checked < 200 {
        let mut query = TraceQuery::new(random_ray(&mut rng));

        if !fixture.scene.trace(&mut query)
            || query.token.final_token().kind() != EntityKind::Triangle
        {
            continue;
        }

        let contact = fixture.scene.interact(&query);

        // Graze the surface from both of its sides
        for side in [1.0, -1.0] {
            let direction = contact.normal() * side * 0.01 + random_vec(&mut rng, 1.0);
            let mut spawned = contact.spawn_trace(direction);

            fixture.scene.trace(&mut spawned);

            assert_ne!(query.token, spawned.token);

            let mut shadow = contact.spawn_occlude(contact.point() + direction);

            // Whatever the shadow ray hits, it's not the surface it started on
            if fixture.scene.occlude(&mut shadow) {
                let mut check = TraceQuery::new(shadow.ray)
                    .with_travel(shadow.travel)
                    .with_ignore(*contact.token());

                assert!(fixture.scene.trace(&mut check));
                assert_ne!(query.token, check.token);
            }
        }

        checked += 1;
    }
}

#[test]
fn rays_leaving_spheres_dont_hit_them_again() {
    let mut packs = Packs::new(BuildConfig::single_threaded());
    let mut builder = PackBuilder::new();

    builder.add_sphere(Sphere::new(Vec3::ZERO, 1.0, MaterialIndex::default()));

    let root = packs.insert(builder).unwrap();
    let scene = Scene::new(packs, root).unwrap();
    let mut rng = StdRng::seed_from_u64(600);

    for _ in 0..200 {
        let origin = random_vec(&mut rng, 1.0).normalize_or_zero() * 5.0;

        if origin == Vec3::ZERO {
            continue;
        }

        let mut query = TraceQuery::new(Ray::new(origin, -origin));

        assert!(scene.trace(&mut query));

        let contact = scene.interact(&query);

        // Outwards: nothing to hit
        let mut outwards = contact.spawn_trace(contact.normal());

        assert!(!scene.trace(&mut outwards));

        // Inwards: the sphere's far side
        let mut inwards = contact.spawn_trace(-contact.normal());

        assert!(scene.trace(&mut inwards));
        assert_relative_eq!(2.0, inwards.distance, epsilon = 1e-3);
    }
}

#[test]
fn every_leaf_is_reachable_once() {
    let fixture = fixture(6, BuildConfig::default());

    for (_, pack) in fixture.scene.packs().iter() {
        let leaves: Vec<_> = pack.bvh().leaves().collect();
        let unique: FxHashSet<_> = leaves.iter().copied().collect();

        assert_eq!(leaves.len(), unique.len());
        assert_eq!(2 * leaves.len() - 1, pack.bvh().len());

        let triangles = pack
            .triangles()
            .iter()
            .enumerate()
            .filter(|(_, triangle)| triangle.geometric_normal().is_finite())
            .map(|(index, _)| EntityToken::triangle(index));

        let spheres = (0..pack.spheres().len()).map(EntityToken::sphere);
        let instances = (0..pack.instances().len()).map(EntityToken::instance);

        let expected: FxHashSet<_> =
            triangles.chain(spheres).chain(instances).collect();

        assert_eq!(expected, unique);
    }
}

#[test]
fn bounds_contain_children() {
    let fixture = fixture(7, BuildConfig::default());

    for (_, pack) in fixture.scene.packs().iter() {
        let bvh = pack.bvh();

        for node in bvh.nodes() {
            if let BvhNode::Internal {
                bounds,
                left_id,
                right_id,
            } = *node
            {
                assert!(bounds.contains(&bvh[left_id].bounds()));
                assert!(bounds.contains(&bvh[right_id].bounds()));
            }
        }
    }

    // Instances' bounds enclose their geometry
    for instance in &fixture.instances {
        let bounds = fixture.scene.packs()[instance.pack_id()]
            .bounds()
            .with_transform(*instance.backward());

        for triangle in &fixture.mesh {
            for position in triangle.positions {
                let position = instance.backward().transform_point3(position);
                let slack = Vec3::splat(1e-3);

                assert!(BoundingBox::new(bounds.min() - slack, bounds.max() + slack)
                    .contains_point(position));
            }
        }
    }
}

#[test]
fn instance_round_trip() {
    let mut rng = StdRng::seed_from_u64(800);

    for _ in 0..200 {
        let axis = random_vec(&mut rng, 1.0).normalize_or_zero();
        let axis = if axis == Vec3::ZERO { Vec3::X } else { axis };

        let instance = Instance::new(
            PackId::new(0),
            Affine3A::from_scale_rotation_translation(
                Vec3::splat(rng.gen_range(0.1..10.0)),
                Quat::from_axis_angle(axis, rng.gen_range(0.0..6.0)),
                random_vec(&mut rng, 100.0),
            ),
        )
        .unwrap();

        let ray = random_ray(&mut rng);

        let round_trip = ray
            .transform(instance.forward())
            .transform(instance.backward());

        assert_relative_eq!(ray.origin(), round_trip.origin(), epsilon = 1e-3);
        assert_relative_eq!(ray.direction(), round_trip.direction(), epsilon = 1e-4);
        assert_relative_eq!(
            1.0,
            instance.forward_scale() * instance.backward_scale(),
            epsilon = 1e-6
        );

        // Distances scale by a single factor
        let local = ray.transform(instance.forward());
        let point = ray.at(10.0);
        let local_point = local.at(10.0 * instance.forward_scale());

        assert_relative_eq!(
            instance.forward().transform_point3(point),
            local_point,
            epsilon = 1e-2
        );
    }
}

#[test]
fn parallel_build_matches_single_threaded_one() {
    let sequential = fixture(9, BuildConfig::single_threaded());

    let parallel = fixture(
        9,
        BuildConfig::default()
            .with_parallel_threshold(8)
            .with_worker_threads(4),
    );

    for ((_, lhs), (_, rhs)) in
        sequential.scene.packs().iter().zip(parallel.scene.packs().iter())
    {
        assert_eq!(lhs.bvh(), rhs.bvh());
        assert_eq!(0, lhs.stats().forks);
        assert!(rhs.stats().forks > 0);
    }

    let mut rng = StdRng::seed_from_u64(900);

    for _ in 0..200 {
        let ray = random_ray(&mut rng);
        let mut lhs = TraceQuery::new(ray);
        let mut rhs = TraceQuery::new(ray);

        sequential.scene.trace(&mut lhs);
        parallel.scene.trace(&mut rhs);

        assert_eq!(lhs, rhs);
    }
}
