use std::rc::Rc;

use approx::assert_relative_eq;
use glam::Vec3A;
use proxima::{
    BoxShape, CapsuleShape, CollisionObject, CollisionRequest, CollisionResult, ConeShape,
    CylinderShape, EllipsoidShape, DistanceRequest, DistanceResult, Geometry, HalfspaceShape,
    Isometry, PlaneShape, QueryError, SphereShape, TriangleMeshShape, collide, distance,
};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn object(geometry: Geometry, at: Vec3A) -> CollisionObject {
    CollisionObject::with_transform(Rc::new(geometry), Isometry::from_translation(at))
}

fn sphere(radius: f32, at: Vec3A) -> CollisionObject {
    object(Geometry::Sphere(SphereShape::new(radius).unwrap()), at)
}

fn box_geom(half_extents: Vec3A) -> Geometry {
    Geometry::Box(BoxShape::new(half_extents).unwrap())
}

fn ground_mesh() -> Geometry {
    let vertices = vec![
        Vec3A::new(-10.0, -10.0, 0.0),
        Vec3A::new(10.0, -10.0, 0.0),
        Vec3A::new(10.0, 10.0, 0.0),
        Vec3A::new(-10.0, 10.0, 0.0),
    ];
    let triangles = vec![[0, 1, 2], [0, 2, 3]];
    Geometry::Mesh(TriangleMeshShape::new(vertices, triangles).unwrap())
}

fn run_collide(a: &CollisionObject, b: &CollisionObject, request: &CollisionRequest) -> CollisionResult {
    let mut result = CollisionResult::new();
    collide(a, b, request, &mut result).unwrap();
    result
}

fn run_distance(a: &CollisionObject, b: &CollisionObject) -> (f32, DistanceResult) {
    let mut result = DistanceResult::new();
    let d = distance(a, b, &DistanceRequest::default(), &mut result).unwrap();
    (d, result)
}

#[test]
fn box_and_cone_centered_at_origin_collide() {
    init_logs();

    // box with side lengths 1 x 2 x 3
    let box_obj = object(box_geom(Vec3A::new(0.5, 1.0, 1.5)), Vec3A::ZERO);
    let cone_obj = object(
        Geometry::Cone(ConeShape::new(1.0, 1.5).unwrap()),
        Vec3A::ZERO,
    );

    let result = run_collide(&box_obj, &cone_obj, &CollisionRequest::default());
    assert!(result.is_collision());
    assert!(result.num_contacts() > 0);
}

#[test]
fn translated_cone_reports_analytic_separation() {
    let box_obj = object(box_geom(Vec3A::new(0.5, 1.0, 1.5)), Vec3A::ZERO);
    let cone_obj = object(
        Geometry::Cone(ConeShape::new(1.0, 1.5).unwrap()),
        Vec3A::new(10.0, 0.0, 0.0),
    );

    let result = run_collide(&box_obj, &cone_obj, &CollisionRequest::default());
    assert!(!result.is_collision());
    assert_eq!(result.num_contacts(), 0);

    // box face at x = 0.5, cone base rim reaches x = 9
    let (d, _) = run_distance(&box_obj, &cone_obj);
    assert_relative_eq!(d, 8.5, epsilon = 1e-3);
}

#[test]
fn sphere_pair_distance_and_nearest_points_are_exact() {
    let a = sphere(1.0, Vec3A::ZERO);
    let b = sphere(1.0, Vec3A::new(5.0, 0.0, 0.0));

    let (d, result) = run_distance(&a, &b);
    assert_relative_eq!(d, 3.0, epsilon = 1e-6);
    assert_relative_eq!(result.nearest_points[0].x, 1.0, epsilon = 1e-6);
    assert_relative_eq!(result.nearest_points[1].x, 4.0, epsilon = 1e-6);
    assert_eq!(result.object_a, Some(a.id()));
    assert_eq!(result.object_b, Some(b.id()));
}

#[test]
fn negative_distance_if_and_only_if_colliding() {
    let a = sphere(1.0, Vec3A::ZERO);
    let overlapping = sphere(1.0, Vec3A::new(1.5, 0.0, 0.0));
    let separated = sphere(1.0, Vec3A::new(3.5, 0.0, 0.0));

    let (d_overlap, _) = run_distance(&a, &overlapping);
    assert_relative_eq!(d_overlap, -0.5, epsilon = 1e-5);
    let hit = run_collide(&a, &overlapping, &CollisionRequest::default());
    assert!(hit.num_contacts() > 0);
    assert_relative_eq!(hit.contacts()[0].penetration_depth, 0.5, epsilon = 1e-5);

    let (d_sep, _) = run_distance(&a, &separated);
    assert_relative_eq!(d_sep, 1.5, epsilon = 1e-5);
    let miss = run_collide(&a, &separated, &CollisionRequest::default());
    assert_eq!(miss.num_contacts(), 0);
}

#[test]
fn queries_are_symmetric_under_operand_swap() {
    let box_obj = object(box_geom(Vec3A::new(1.0, 1.0, 1.0)), Vec3A::ZERO);
    let capsule_obj = object(
        Geometry::Capsule(CapsuleShape::new(0.5, 1.0).unwrap()),
        Vec3A::new(1.2, 0.4, 0.3),
    );

    let fwd = run_collide(&box_obj, &capsule_obj, &CollisionRequest::default());
    let rev = run_collide(&capsule_obj, &box_obj, &CollisionRequest::default());
    assert_eq!(fwd.num_contacts(), rev.num_contacts());
    assert!(fwd.is_collision());

    let (fc, rc) = (fwd.contacts()[0], rev.contacts()[0]);
    // same contact spot, antiparallel normals
    assert_relative_eq!(fc.position.distance(rc.position), 0.0, epsilon = 1e-2);
    assert_relative_eq!(fc.normal.dot(rc.normal), -1.0, epsilon = 1e-2);

    let far_capsule = object(
        Geometry::Capsule(CapsuleShape::new(0.5, 1.0).unwrap()),
        Vec3A::new(4.0, 0.4, 0.3),
    );
    let (d_fwd, _) = run_distance(&box_obj, &far_capsule);
    let (d_rev, _) = run_distance(&far_capsule, &box_obj);
    assert_relative_eq!(d_fwd, d_rev, epsilon = 1e-4);
}

#[test]
fn separation_distance_is_monotone_when_moving_apart() {
    let box_obj = object(box_geom(Vec3A::new(1.0, 1.0, 1.0)), Vec3A::ZERO);

    let mut previous = f32::NEG_INFINITY;
    for step in 0..8 {
        let target = sphere(0.5, Vec3A::new(2.0 + step as f32, 0.0, 0.0));
        let (d, _) = run_distance(&box_obj, &target);
        assert!(d >= previous, "distance shrank while separating: {d} < {previous}");
        previous = d;
    }
}

#[test]
fn sphere_against_halfspace() {
    let floor = object(
        Geometry::Halfspace(HalfspaceShape::new(Vec3A::Z, 0.0).unwrap()),
        Vec3A::ZERO,
    );

    let above = sphere(1.0, Vec3A::new(0.0, 0.0, 3.0));
    let (d, _) = run_distance(&above, &floor);
    assert_relative_eq!(d, 2.0, epsilon = 1e-6);

    let touching = sphere(1.0, Vec3A::new(0.0, 0.0, 0.5));
    let (d, _) = run_distance(&touching, &floor);
    assert_relative_eq!(d, -0.5, epsilon = 1e-6);

    let result = run_collide(&touching, &floor, &CollisionRequest::default());
    assert!(result.is_collision());
    assert_relative_eq!(result.contacts()[0].penetration_depth, 0.5, epsilon = 1e-6);
}

#[test]
fn plane_is_two_sided() {
    let plane = object(
        Geometry::Plane(PlaneShape::new(Vec3A::Z, 0.0).unwrap()),
        Vec3A::ZERO,
    );

    let above = sphere(1.0, Vec3A::new(0.0, 0.0, 5.0));
    let below = sphere(1.0, Vec3A::new(0.0, 0.0, -5.0));
    let straddling = sphere(1.0, Vec3A::new(0.0, 0.0, 0.25));

    assert_relative_eq!(run_distance(&above, &plane).0, 4.0, epsilon = 1e-6);
    assert_relative_eq!(run_distance(&below, &plane).0, 4.0, epsilon = 1e-6);
    assert_relative_eq!(run_distance(&straddling, &plane).0, -0.75, epsilon = 1e-6);
}

#[test]
fn boundary_pairs_are_unsupported() {
    let plane = object(
        Geometry::Plane(PlaneShape::new(Vec3A::Z, 0.0).unwrap()),
        Vec3A::ZERO,
    );
    let halfspace = object(
        Geometry::Halfspace(HalfspaceShape::new(Vec3A::X, 0.0).unwrap()),
        Vec3A::ZERO,
    );

    let mut result = CollisionResult::new();
    let err = collide(&plane, &halfspace, &CollisionRequest::default(), &mut result).unwrap_err();
    assert!(matches!(err, QueryError::UnsupportedGeometryPair("plane", "halfspace")));

    let mut dist_result = DistanceResult::new();
    let err = distance(&halfspace, &halfspace, &DistanceRequest::default(), &mut dist_result)
        .unwrap_err();
    assert!(matches!(err, QueryError::UnsupportedGeometryPair(_, _)));
}

#[test]
fn malformed_geometry_is_rejected_at_construction() {
    assert!(matches!(
        SphereShape::new(-1.0),
        Err(QueryError::InvalidGeometry(_))
    ));
    assert!(matches!(
        SphereShape::new(f32::NAN),
        Err(QueryError::InvalidGeometry(_))
    ));
    assert!(matches!(
        BoxShape::new(Vec3A::new(1.0, 0.0, 1.0)),
        Err(QueryError::InvalidGeometry(_))
    ));
    assert!(matches!(
        ConeShape::new(1.0, -2.0),
        Err(QueryError::InvalidGeometry(_))
    ));
    assert!(matches!(
        TriangleMeshShape::new(vec![Vec3A::ZERO], vec![[0, 0, 1]]),
        Err(QueryError::InvalidGeometry(_))
    ));
    assert!(matches!(
        TriangleMeshShape::new(vec![Vec3A::ZERO], vec![]),
        Err(QueryError::InvalidGeometry(_))
    ));
}

#[test]
fn boolean_only_requests_skip_contact_geometry() {
    let a = sphere(1.0, Vec3A::ZERO);
    let b = sphere(1.0, Vec3A::new(1.0, 0.0, 0.0));

    let request = CollisionRequest {
        enable_contact: false,
        ..CollisionRequest::default()
    };
    let mut result = CollisionResult::new();
    let count = collide(&a, &b, &request, &mut result).unwrap();

    assert_eq!(count, 1);
    assert!(result.is_collision());
    assert!(result.contacts().is_empty());
}

#[test]
fn ellipsoid_and_cylinder_distances_match_axis_geometry() {
    let ellipsoid = object(
        Geometry::Ellipsoid(EllipsoidShape::new(Vec3A::new(1.0, 2.0, 3.0)).unwrap()),
        Vec3A::ZERO,
    );
    let probe = sphere(1.0, Vec3A::new(10.0, 0.0, 0.0));
    assert_relative_eq!(run_distance(&ellipsoid, &probe).0, 8.0, epsilon = 1e-2);

    let cylinder = object(
        Geometry::Cylinder(CylinderShape::new(1.0, 1.0).unwrap()),
        Vec3A::ZERO,
    );
    let box_probe = object(box_geom(Vec3A::splat(0.5)), Vec3A::new(4.0, 0.0, 0.0));
    assert_relative_eq!(run_distance(&cylinder, &box_probe).0, 2.5, epsilon = 1e-3);
}

#[test]
fn sphere_above_mesh_ground() {
    let ground = object(ground_mesh(), Vec3A::ZERO);

    let hovering = sphere(1.0, Vec3A::new(0.0, 0.0, 5.0));
    let (d, _) = run_distance(&ground, &hovering);
    assert_relative_eq!(d, 4.0, epsilon = 1e-3);
    let result = run_collide(&ground, &hovering, &CollisionRequest::default());
    assert_eq!(result.num_contacts(), 0);

    let resting = sphere(1.0, Vec3A::new(0.0, 0.0, 0.5));
    let (d, _) = run_distance(&ground, &resting);
    assert_relative_eq!(d, -0.5, epsilon = 1e-2);

    let result = run_collide(&ground, &resting, &CollisionRequest::default());
    assert!(result.is_collision());
    let contact = result.contacts()[0];
    assert!(contact.normal.z > 0.9, "mesh-to-sphere normal should point up");
    assert_relative_eq!(contact.penetration_depth, 0.5, epsilon = 1e-2);
}

#[test]
fn mesh_contact_generation_honors_the_cap() {
    let ground = object(ground_mesh(), Vec3A::ZERO);
    // straddles both triangles of the quad
    let resting = sphere(2.0, Vec3A::new(0.0, 0.0, 1.0));

    let request = CollisionRequest {
        max_contacts: 1,
        ..CollisionRequest::default()
    };
    let result = run_collide(&ground, &resting, &request);
    assert_eq!(result.num_contacts(), 1);

    let request = CollisionRequest {
        max_contacts: 8,
        ..CollisionRequest::default()
    };
    let result = run_collide(&ground, &resting, &request);
    assert!(result.num_contacts() >= 2, "both triangles should contribute");
}

#[test]
fn mesh_against_mesh_distance() {
    let lower = object(ground_mesh(), Vec3A::ZERO);
    let upper = object(ground_mesh(), Vec3A::new(0.0, 0.0, 3.0));

    let (d, _) = run_distance(&lower, &upper);
    assert_relative_eq!(d, 3.0, epsilon = 1e-3);

    let result = run_collide(&lower, &upper, &CollisionRequest::default());
    assert_eq!(result.num_contacts(), 0);
}

#[test]
fn mesh_against_halfspace_collides_below_surface() {
    let ground = object(ground_mesh(), Vec3A::new(0.0, 0.0, 1.0));
    let halfspace = object(
        Geometry::Halfspace(HalfspaceShape::new(Vec3A::Z, 0.0).unwrap()),
        Vec3A::ZERO,
    );

    let (d, _) = run_distance(&ground, &halfspace);
    assert_relative_eq!(d, 1.0, epsilon = 1e-4);

    let sunken = object(ground_mesh(), Vec3A::new(0.0, 0.0, -0.25));
    let result = run_collide(&sunken, &halfspace, &CollisionRequest::default());
    assert!(result.is_collision());
    assert_relative_eq!(result.contacts()[0].penetration_depth, 0.25, epsilon = 1e-4);
}

#[test]
fn cost_sources_record_the_overlap_region() {
    let a = object(box_geom(Vec3A::splat(1.0)), Vec3A::ZERO);
    let b = object(box_geom(Vec3A::splat(1.0)), Vec3A::new(1.0, 0.0, 0.0));

    let request = CollisionRequest {
        enable_cost: true,
        num_max_cost_sources: 4,
        ..CollisionRequest::default()
    };
    let result = run_collide(&a, &b, &request);

    assert!(result.is_collision());
    assert_eq!(result.cost_sources().len(), 1);
    let source = result.cost_sources()[0];
    assert_relative_eq!(source.aabb_min.x, 0.0, epsilon = 1e-6);
    assert_relative_eq!(source.aabb_max.x, 1.0, epsilon = 1e-6);
    assert_relative_eq!(source.cost_density, 1.0, epsilon = 1e-6);
}

#[test]
fn accumulators_reset_for_reuse() {
    let a = sphere(1.0, Vec3A::ZERO);
    let b = sphere(1.0, Vec3A::new(1.0, 0.0, 0.0));

    let mut result = CollisionResult::new();
    collide(&a, &b, &CollisionRequest::default(), &mut result).unwrap();
    assert!(result.is_collision());

    result.clear();
    assert!(!result.is_collision());
    assert_eq!(result.num_contacts(), 0);

    let mut dist_result = DistanceResult::new();
    distance(&a, &b, &DistanceRequest::default(), &mut dist_result).unwrap();
    assert!(dist_result.min_distance < 0.0);
    dist_result.clear();
    assert_eq!(dist_result.min_distance, f32::INFINITY);
    assert_eq!(dist_result.object_a, None);
}
