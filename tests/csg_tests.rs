mod support;

use mesh_effect::{BooleanOp, CsgOps, CsgOptions, MeshEffect, MeshError, StraddleMode, float_types::Real};
use nalgebra::{Matrix4, Point3, Vector3};

use crate::support::{
    TransformInto, approx_eq, assert_no_collapsed_faces, init_logging, rel_eq, translation, unit_cube,
};

fn identity() -> Matrix4<Real> {
    Matrix4::identity()
}

#[test]
fn union_with_itself_keeps_the_volume() {
    init_logging();
    let cube = unit_cube();
    let result = cube.union(&cube, &identity()).unwrap();
    assert!(approx_eq(result.calculate_volume(), 1.0, 1e-9));
    assert!(!result.has_open_edges());
}

#[test]
fn intersection_with_itself_keeps_the_volume() {
    let cube = unit_cube();
    let result = cube.intersection(&cube, &identity()).unwrap();
    assert!(approx_eq(result.calculate_volume(), 1.0, 1e-9));
}

#[test]
fn difference_with_itself_is_empty() {
    let cube = unit_cube();
    let result = cube.difference(&cube, &identity()).unwrap();
    assert!(approx_eq(result.calculate_volume(), 0.0, 1e-9));
    assert_eq!(result.face_count(), 0);
}

#[test]
fn overlapping_cubes() {
    init_logging();
    let a = MeshEffect::cube(2.0, 0).unwrap();
    let b = MeshEffect::cube(2.0, 1).unwrap();
    let shift = translation(1.0, 1.0, 1.0);

    let union = a.union(&b, &shift).unwrap();
    assert!(approx_eq(union.calculate_volume(), 15.0, 1e-9));
    let aabb = union.calculate_aabb().unwrap();
    assert!(approx_eq(aabb.mins.x, 0.0, 1e-12));
    assert!(approx_eq(aabb.maxs.z, 3.0, 1e-12));

    let intersection = a.intersection(&b, &shift).unwrap();
    assert!(approx_eq(intersection.calculate_volume(), 1.0, 1e-9));

    let difference = a.difference(&b, &shift).unwrap();
    assert!(approx_eq(difference.calculate_volume(), 7.0, 1e-9));
    assert_no_collapsed_faces(&difference);
}

#[test]
fn boolean_keeps_operand_materials() {
    let a = MeshEffect::cube(2.0, 3).unwrap();
    let b = MeshEffect::cube(2.0, 7).unwrap();
    let difference = a.difference(&b, &translation(1.0, 0.0, 0.0)).unwrap();

    let mut materials: Vec<u32> = difference
        .face_ids()
        .into_iter()
        .map(|f| difference.face_material(f).unwrap())
        .collect();
    materials.sort_unstable();
    materials.dedup();
    // the cavity wall comes from the subtracted cube
    assert_eq!(materials, vec![3, 7]);
}

#[test]
fn difference_cavity_faces_point_into_the_cavity() {
    let outer = MeshEffect::cube(4.0, 0).unwrap();
    let inner = MeshEffect::cube(1.0, 1).unwrap();
    let result = outer.difference(&inner, &translation(1.5, 1.5, 1.5)).unwrap();
    assert!(approx_eq(result.calculate_volume(), 63.0, 1e-9));

    let center = Point3::new(2.0, 2.0, 2.0);
    for face in result.face_ids() {
        if result.face_material(face).unwrap() != 1 {
            continue;
        }
        let points = result.face_points(face);
        let normal = result.face_normal(face);
        assert!(normal.dot(&(center - points[0])) > 0.0);
    }
}

#[test]
fn cube_minus_inscribed_sphere() {
    init_logging();
    let cube = unit_cube();
    let sphere = MeshEffect::sphere(0.5, 16, 8, 1).unwrap();
    let expected = 1.0 - sphere.calculate_volume();

    let result = cube.difference(&sphere, &translation(0.5, 0.5, 0.5)).unwrap();
    assert!(rel_eq(result.calculate_volume(), expected, 1e-3));
    assert_no_collapsed_faces(&result);
}

#[test]
fn slanted_seams_come_out_closed() {
    init_logging();
    let cube = unit_cube();

    let sphere = MeshEffect::sphere(0.6, 16, 8, 1).unwrap();
    let carved = cube.difference(&sphere, &translation(0.5, 0.5, 0.5)).unwrap();
    assert!(!carved.has_open_edges());
    carved.sanity().unwrap();
    let volume = carved.calculate_volume();
    assert!(volume > 0.0 && volume < 1.0 - MeshEffect::sphere(0.5, 16, 8, 1).unwrap().calculate_volume());

    let tilted = cube.rotate(10.0, 20.0, 30.0).unwrap();
    let merged = cube.union(&tilted, &translation(0.3, 0.2, 0.1)).unwrap();
    assert!(!merged.has_open_edges());
    merged.sanity().unwrap();
    let volume = merged.calculate_volume();
    assert!(volume > 1.0 && volume < 2.0);
}

#[test]
fn second_operand_is_placed_by_the_matrix() {
    let a = unit_cube();
    let far = a.union(&a, &translation(5.0, 0.0, 0.0)).unwrap();
    assert!(approx_eq(far.calculate_volume(), 2.0, 1e-9));
    let disjoint = a.intersection(&a, &translation(5.0, 0.0, 0.0)).unwrap();
    assert_eq!(disjoint.face_count(), 0);
}

#[test]
fn non_convex_operands_split_straddling_faces() {
    init_logging();
    let a = MeshEffect::cube(2.0, 0).unwrap();
    let stepped = a.union(&a, &translation(1.0, 1.0, 1.0)).unwrap();
    let big = MeshEffect::cube(10.0, 2).unwrap().transform_into(&translation(-4.0, -4.0, -4.0));

    let inside = big.intersection(&stepped, &identity()).unwrap();
    assert!(approx_eq(inside.calculate_volume(), 15.0, 1e-8));

    let hollow = big.difference(&stepped, &identity()).unwrap();
    assert!(approx_eq(hollow.calculate_volume(), 985.0, 1e-7));
}

#[test]
fn legacy_straddle_agrees_on_convex_operands() {
    let a = MeshEffect::cube(2.0, 0).unwrap();
    let b = MeshEffect::cube(2.0, 1).unwrap();
    let shift = translation(1.0, 0.5, 0.25);
    let legacy = CsgOptions {
        straddle: StraddleMode::Legacy,
        ..CsgOptions::default()
    };
    let split = CsgOptions {
        straddle: StraddleMode::Split,
        ..CsgOptions::default()
    };

    for op in [BooleanOp::Union, BooleanOp::Intersection, BooleanOp::Difference] {
        let v_legacy = a.boolean(&b, &shift, op, legacy).unwrap().calculate_volume();
        let v_split = a.boolean(&b, &shift, op, split).unwrap().calculate_volume();
        assert!(approx_eq(v_legacy, v_split, 1e-9), "{:?}", op);
    }
}

#[test]
fn clip_mesh_splits_at_the_clipper_boundary() {
    let cube = unit_cube();
    let (top, bottom) = cube.clip_mesh(&cube, &translation(0.5, 0.0, 0.0)).unwrap();

    let top_box = top.calculate_aabb().unwrap();
    assert!(approx_eq(top_box.mins.x, 0.0, 1e-9));
    assert!(approx_eq(top_box.maxs.x, 0.5, 1e-9));

    let bottom_box = bottom.calculate_aabb().unwrap();
    assert!(approx_eq(bottom_box.mins.x, 0.5, 1e-9));
    assert!(approx_eq(bottom_box.maxs.x, 1.0, 1e-9));

    // neither half is capped
    assert!(top.has_open_edges());
    assert!(bottom.has_open_edges());
}

#[test]
fn clip_with_prebuilt_tree() {
    let cube = unit_cube();
    let clipper = MeshEffect::cube(3.0, 0).unwrap().transform_into(&translation(-1.0, -1.0, 0.5));
    let tree = clipper.create_solid_tree(CsgOptions::default()).unwrap();
    let (top, bottom) = cube.clip_mesh_with_tree(&tree).unwrap();
    assert!(approx_eq(top.calculate_aabb().unwrap().maxs.z, 0.5, 1e-9));
    assert!(approx_eq(bottom.calculate_aabb().unwrap().mins.z, 0.5, 1e-9));
}

#[test]
fn plane_clip_caps_both_halves() {
    init_logging();
    let cube = unit_cube();
    let (top, bottom) = cube
        .plane_clip_mesh(&Point3::new(0.0, 0.0, 0.25), &Vector3::z())
        .unwrap();
    assert!(approx_eq(top.calculate_volume(), 0.75, 1e-9));
    assert!(approx_eq(bottom.calculate_volume(), 0.25, 1e-9));
    assert!(approx_eq(top.calculate_aabb().unwrap().mins.z, 0.25, 1e-9));
    assert!(approx_eq(bottom.calculate_aabb().unwrap().maxs.z, 0.25, 1e-9));
}

#[test]
fn plane_clip_with_a_tilted_plane() {
    let cube = unit_cube();
    let center = Point3::new(0.5, 0.5, 0.5);
    let (top, bottom) = cube.plane_clip_mesh(&center, &Vector3::new(1.0, 1.0, 1.0)).unwrap();
    assert!(approx_eq(top.calculate_volume(), 0.5, 1e-9));
    assert!(approx_eq(bottom.calculate_volume(), 0.5, 1e-9));
}

#[test]
fn plane_clip_edge_cases() {
    let empty = MeshEffect::new();
    let (top, bottom) = empty.plane_clip_mesh(&Point3::origin(), &Vector3::y()).unwrap();
    assert!(top.is_empty() && bottom.is_empty());

    let cube = unit_cube();
    assert_eq!(
        cube.plane_clip_mesh(&Point3::origin(), &Vector3::zeros()).unwrap_err(),
        MeshError::DegeneratePlane
    );

    // a plane missing the mesh leaves it whole on one side
    let (top, bottom) = cube.plane_clip_mesh(&Point3::new(0.0, 0.0, -1.0), &Vector3::z()).unwrap();
    assert!(approx_eq(top.calculate_volume(), 1.0, 1e-9));
    assert_eq!(bottom.face_count(), 0);
}

#[test]
fn intersection_checks() {
    let a = unit_cube();
    let tree = a.create_solid_tree(CsgOptions::default()).unwrap();

    let overlapping = unit_cube().transform_into(&translation(0.5, 0.0, 0.0));
    assert!(overlapping.check_intersection(&tree, 1.0).unwrap());

    let apart = unit_cube().transform_into(&translation(2.0, 0.0, 0.0));
    assert!(!apart.check_intersection(&tree, 1.0).unwrap());

    // touching faces do not count; shrinking first never does either
    let touching = unit_cube().transform_into(&translation(1.0, 0.0, 0.0));
    assert!(!touching.check_intersection(&tree, 1.0).unwrap());
    assert!(!touching.check_intersection(&tree, 0.9).unwrap());

    assert!(a.check_intersection_with(&a, &translation(0.25, 0.25, 0.25)).unwrap());
    assert!(!a.check_intersection_with(&a, &translation(0.0, 3.0, 0.0)).unwrap());
}

#[test]
fn trait_transforms() {
    let cube = unit_cube();
    let moved = cube.translate(1.0, 2.0, 3.0).unwrap();
    let aabb = moved.calculate_aabb().unwrap();
    assert!(approx_eq(aabb.mins.y, 2.0, 1e-12));

    let scaled = cube.scale(2.0, 1.0, 1.0).unwrap();
    assert!(approx_eq(scaled.calculate_volume(), 2.0, 1e-12));

    // mirroring keeps the faces outward
    let mirrored = cube.mirror(&Point3::origin(), &Vector3::x()).unwrap();
    assert!(approx_eq(mirrored.calculate_volume(), 1.0, 1e-12));
    assert!(approx_eq(mirrored.calculate_aabb().unwrap().mins.x, -1.0, 1e-12));

    let rotated = cube.rotate(0.0, 0.0, 90.0).unwrap();
    assert!(approx_eq(rotated.calculate_volume(), 1.0, 1e-12));
}
