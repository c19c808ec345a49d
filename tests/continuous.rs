use std::f32::consts::FRAC_PI_2;
use std::rc::Rc;

use approx::assert_relative_eq;
use glam::{Quat, Vec3A};
use proxima::{
    BoxShape, CollisionObject, ContinuousCollisionRequest, ContinuousCollisionResult, Geometry,
    Isometry, SphereShape, TriangleMeshShape, continuous_collide,
};

fn object(geometry: Geometry, transform: Isometry) -> CollisionObject {
    CollisionObject::with_transform(Rc::new(geometry), transform)
}

fn sphere(radius: f32, at: Vec3A) -> CollisionObject {
    object(
        Geometry::Sphere(SphereShape::new(radius).unwrap()),
        Isometry::from_translation(at),
    )
}

fn run(
    a: &CollisionObject,
    goal_a: Isometry,
    b: &CollisionObject,
    goal_b: Isometry,
) -> ContinuousCollisionResult {
    let mut result = ContinuousCollisionResult::new();
    let toc = continuous_collide(
        a,
        &goal_a,
        b,
        &goal_b,
        &ContinuousCollisionRequest::default(),
        &mut result,
    )
    .unwrap();

    assert!((0.0..=1.0).contains(&toc), "time of contact out of range: {toc}");
    assert_eq!(toc, result.time_of_contact);
    result
}

#[test]
fn moving_sphere_hits_static_sphere_at_the_analytic_time() {
    let mover = sphere(0.5, Vec3A::new(-5.0, 0.0, 0.0));
    let target = sphere(0.5, Vec3A::ZERO);

    // surfaces meet when the mover's center reaches x = -1, i.e. t = 0.4
    let result = run(
        &mover,
        Isometry::from_translation(Vec3A::new(5.0, 0.0, 0.0)),
        &target,
        Isometry::IDENTITY,
    );

    assert!(result.is_collide);
    assert!(result.time_of_contact > 0.0 && result.time_of_contact < 1.0);
    assert_relative_eq!(result.time_of_contact, 0.4, epsilon = 0.01);
}

#[test]
fn disjoint_swept_volumes_report_no_contact() {
    let a = sphere(0.5, Vec3A::new(-5.0, 10.0, 0.0));
    let b = sphere(0.5, Vec3A::ZERO);

    let result = run(
        &a,
        Isometry::from_translation(Vec3A::new(5.0, 10.0, 0.0)),
        &b,
        Isometry::IDENTITY,
    );

    assert!(!result.is_collide);
    assert_eq!(result.time_of_contact, 1.0);
}

#[test]
fn receding_bodies_report_no_contact() {
    let a = sphere(0.5, Vec3A::new(2.0, 0.0, 0.0));
    let b = sphere(0.5, Vec3A::ZERO);

    let result = run(
        &a,
        Isometry::from_translation(Vec3A::new(8.0, 0.0, 0.0)),
        &b,
        Isometry::IDENTITY,
    );

    assert!(!result.is_collide);
    assert_eq!(result.time_of_contact, 1.0);
}

#[test]
fn initially_overlapping_bodies_report_time_zero() {
    let a = sphere(1.0, Vec3A::ZERO);
    let b = sphere(1.0, Vec3A::new(0.5, 0.0, 0.0));

    let result = run(
        &a,
        Isometry::from_translation(Vec3A::new(5.0, 0.0, 0.0)),
        &b,
        Isometry::IDENTITY,
    );

    assert!(result.is_collide);
    assert_eq!(result.time_of_contact, 0.0);
}

#[test]
fn touch_exactly_at_end_is_not_a_collision() {
    let mover = sphere(0.5, Vec3A::new(-2.0, 0.0, 0.0));
    let target = sphere(0.5, Vec3A::ZERO);

    // at t = 1 the mover's center is at x = -1: surfaces touch exactly
    // at the end of the motion, which counts as no collision
    let result = run(
        &mover,
        Isometry::from_translation(Vec3A::new(-1.0, 0.0, 0.0)),
        &target,
        Isometry::IDENTITY,
    );

    assert!(!result.is_collide);
    assert_eq!(result.time_of_contact, 1.0);
}

#[test]
fn rotation_alone_can_produce_contact() {
    // a long thin box spinning a quarter turn about z sweeps into a
    // sphere parked beside it
    let blade = object(
        Geometry::Box(BoxShape::new(Vec3A::new(2.0, 0.2, 0.2)).unwrap()),
        Isometry::IDENTITY,
    );
    let bystander = sphere(0.3, Vec3A::new(0.0, 1.5, 0.0));

    let result = run(
        &blade,
        Isometry::from_rotation(Quat::from_rotation_z(FRAC_PI_2)),
        &bystander,
        Isometry::IDENTITY,
    );

    assert!(result.is_collide);
    assert!(result.time_of_contact > 0.0 && result.time_of_contact < 1.0);
}

#[test]
fn sphere_dropping_onto_mesh_ground() {
    let vertices = vec![
        Vec3A::new(-10.0, -10.0, 0.0),
        Vec3A::new(10.0, -10.0, 0.0),
        Vec3A::new(10.0, 10.0, 0.0),
        Vec3A::new(-10.0, 10.0, 0.0),
    ];
    let triangles = vec![[0, 1, 2], [0, 2, 3]];
    let ground = object(
        Geometry::Mesh(TriangleMeshShape::new(vertices, triangles).unwrap()),
        Isometry::IDENTITY,
    );

    let ball = sphere(1.0, Vec3A::new(0.0, 0.0, 5.0));

    // surface contact at z = 1, i.e. t = 4 / 4.5
    let result = run(
        &ball,
        Isometry::from_translation(Vec3A::new(0.0, 0.0, 0.5)),
        &ground,
        Isometry::IDENTITY,
    );

    assert!(result.is_collide);
    assert_relative_eq!(result.time_of_contact, 4.0 / 4.5, epsilon = 0.01);
}

#[test]
fn stationary_separated_bodies_never_collide() {
    let a = sphere(1.0, Vec3A::ZERO);
    let b = sphere(1.0, Vec3A::new(5.0, 0.0, 0.0));

    let result = run(&a, *a.transform(), &b, *b.transform());

    assert!(!result.is_collide);
    assert_eq!(result.time_of_contact, 1.0);
}
