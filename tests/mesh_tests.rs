mod support;

use mesh_effect::{
    MeshEffect, MeshError, VertexAttribute,
    float_types::{PI, Real},
    mesh::{IndexedFaceList, StreamMut, VertexStream},
};
use nalgebra::{Point3, Vector3};

use crate::support::{approx_eq, flat_polygon, init_logging, unit_cube};

/// Two quads sharing the edge x = 1, positions and normals indexed separately.
fn strip_positions() -> Vec<Real> {
    vec![
        0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, //
        2.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, //
        1.0, 1.0, 0.0, //
        2.0, 1.0, 0.0,
    ]
}

#[test]
fn indexed_input_round_trips_through_face_list() {
    init_logging();
    let positions = strip_positions();
    let position_indices = [0, 1, 4, 3, 1, 2, 5, 4];
    let normals = [0.0, 0.0, 1.0];
    let normal_indices = [0; 8];
    let list = IndexedFaceList {
        face_index_count: &[4, 4],
        face_material: &[2, 5],
        positions: VertexStream::new(&positions, 3, &position_indices),
        normals: Some(VertexStream::new(&normals, 3, &normal_indices)),
        uv0: None,
        uv1: None,
    };
    let mesh = MeshEffect::from_indexed(&list).unwrap();
    assert_eq!(mesh.point_count(), 6);
    assert_eq!(mesh.face_count(), 2);
    mesh.sanity().unwrap();

    let faces = mesh.face_list().unwrap();
    assert_eq!(faces.face_count(), 2);
    assert_eq!(faces.face_index_count, vec![4, 4]);
    let mut materials = faces.face_material.clone();
    materials.sort_unstable();
    assert_eq!(materials, vec![2, 5]);
    assert_eq!(faces.face_of_corner(0), Some(0));
    assert_eq!(faces.face_of_corner(5), Some(1));
    assert_eq!(faces.face_of_corner(8), None);

    // the shared edge is stored once per side
    let (a, b) = (
        mesh.points()[faces.point_indices[1]],
        mesh.points()[faces.point_indices[2]],
    );
    assert!(approx_eq((b - a).norm(), 1.0, 1e-12));

    // padded output stride
    let count = mesh.attribute_count();
    let mut out_positions = vec![-1.0; count * 4];
    let mut out_normals = vec![0.0; count * 3];
    let written = mesh
        .write_vertex_streams(
            StreamMut::new(&mut out_positions, 4),
            Some(StreamMut::new(&mut out_normals, 3)),
            None,
            None,
        )
        .unwrap();
    assert_eq!(written, count);
    for i in 0..count {
        assert_eq!(out_positions[i * 4 + 3], -1.0);
        assert_eq!(out_normals[i * 3 + 2], 1.0);
        assert_eq!(out_positions[i * 4 + 2], 0.0);
    }
}

#[test]
fn indexed_input_errors() {
    let positions = strip_positions();
    let short_face = IndexedFaceList {
        face_index_count: &[2],
        face_material: &[0],
        positions: VertexStream::new(&positions, 3, &[0, 1]),
        normals: None,
        uv0: None,
        uv1: None,
    };
    assert_eq!(
        MeshEffect::from_indexed(&short_face).unwrap_err(),
        MeshError::DegenerateFace { face: 0, count: 2 }
    );

    let out_of_range = IndexedFaceList {
        face_index_count: &[3],
        face_material: &[0],
        positions: VertexStream::new(&positions, 3, &[0, 1, 9]),
        normals: None,
        uv0: None,
        uv1: None,
    };
    assert!(matches!(
        MeshEffect::from_indexed(&out_of_range),
        Err(MeshError::IndexOutOfRange { stream: "position", index: 9, .. })
    ));

    // index * stride would overflow
    let huge = usize::MAX / 2;
    let huge_indices = [0, 1, huge];
    let overflowing = IndexedFaceList {
        face_index_count: &[3],
        face_material: &[0],
        positions: VertexStream::new(&positions, 3, &huge_indices),
        normals: None,
        uv0: None,
        uv1: None,
    };
    assert!(matches!(
        MeshEffect::from_indexed(&overflowing),
        Err(MeshError::IndexOutOfRange { stream: "position", index, .. }) if index == huge
    ));
}

#[test]
fn output_buffer_too_small() {
    let mesh = unit_cube();
    let mut positions = vec![0.0; 3];
    assert!(matches!(
        mesh.write_vertex_streams(StreamMut::new(&mut positions, 3), None, None, None),
        Err(MeshError::BufferTooSmall { stream: "position", .. })
    ));
}

#[test]
fn triangulate_is_idempotent() {
    let mut sphere = MeshEffect::sphere(1.0, 12, 6, 0).unwrap();
    sphere.triangulate().unwrap();
    let faces = sphere.face_count();
    let points = sphere.point_count();
    let attributes = sphere.attribute_count();
    // 12 quads per inner stack, 12 triangles per pole cap
    assert_eq!(faces, 12 * 4 * 2 + 2 * 12);

    sphere.triangulate().unwrap();
    assert_eq!(sphere.face_count(), faces);
    assert_eq!(sphere.point_count(), points);
    assert_eq!(sphere.attribute_count(), attributes);
    sphere.sanity().unwrap();
}

#[test]
fn triangulate_then_merge_back() {
    let mut cube = unit_cube();
    cube.triangulate().unwrap();
    assert_eq!(cube.face_count(), 12);
    assert!(approx_eq(cube.calculate_volume(), 1.0, 1e-12));

    cube.convert_to_polygons().unwrap();
    assert_eq!(cube.face_count(), 6);
    assert!(approx_eq(cube.calculate_volume(), 1.0, 1e-12));
    cube.sanity().unwrap();
}

#[test]
fn material_groups_are_sorted() {
    let mesh = MeshEffect::from_polygons(&[
        flat_polygon(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]], 5),
        flat_polygon(&[[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0]], 1),
    ])
    .unwrap();
    let geometry = mesh.material_geometry().unwrap();
    assert_eq!(geometry.groups.len(), 2);
    assert_eq!(geometry.groups[0].material, 1);
    assert_eq!(geometry.groups[0].indices.len(), 3);
    assert_eq!(geometry.groups[1].material, 5);
    assert_eq!(geometry.groups[1].indices.len(), 6);
    assert_eq!(geometry.total_face_count(), 3);
    assert_eq!(geometry.indices_u16(1).unwrap().len(), 6);
    assert!(geometry.indices_u16(2).is_err());
}

#[test]
fn indirect_streams_dedupe_each_channel() {
    let cube = unit_cube();
    assert_eq!(cube.point_count(), 8);
    assert_eq!(cube.attribute_count(), 24);

    let streams = cube.indirect_streams();
    assert_eq!(streams.positions.len(), 8);
    assert_eq!(streams.normals.len(), 6);
    assert_eq!(streams.uv0.len(), 4);
    assert_eq!(streams.position_index.len(), 24);
    for (attribute, &p) in cube.attributes().iter().zip(&streams.position_index) {
        assert_eq!(attribute.position, streams.positions[p]);
    }
}

#[test]
fn welding_joins_nearby_corners() {
    let mesh = MeshEffect::from_polygons(&[
        flat_polygon(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]], 0),
        flat_polygon(&[[0.0, 0.0, 1e-9], [1.0, 1.0 + 1e-9, 0.0], [0.0, 1.0, 0.0]], 0),
    ])
    .unwrap();
    assert_eq!(mesh.point_count(), 4);
    assert_eq!(mesh.face_count(), 2);
    // both faces are bounded by a single boundary loop
    assert_eq!(mesh.polyhedra().open_faces().len(), 1);
    mesh.sanity().unwrap();
}

#[test]
fn repeated_faces_are_detached() {
    init_logging();
    let triangle = flat_polygon(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], 0);
    let mesh = MeshEffect::from_polygons(&[triangle.clone(), triangle]).unwrap();
    assert_eq!(mesh.face_count(), 2);
    assert_eq!(mesh.point_count(), 6);
    mesh.sanity().unwrap();
}

#[test]
fn collapsed_polygons_are_skipped() {
    let mesh = MeshEffect::from_polygons(&[
        flat_polygon(&[[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]], 0),
        flat_polygon(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], 0),
    ])
    .unwrap();
    assert_eq!(mesh.face_count(), 1);

    let mut mesh = MeshEffect::new();
    mesh.begin_polygon();
    assert!(matches!(
        mesh.add_polygon(&[VertexAttribute::default(), VertexAttribute::default()]),
        Err(MeshError::DegenerateFace { count: 2, .. })
    ));
}

#[test]
fn box_mapping_assigns_materials_by_facing() {
    let mut cube = unit_cube();
    cube.box_mapping(1, 2, 3).unwrap();
    for face in cube.face_ids() {
        let normal = cube.face_normal(face);
        let expected = match normal.iamax() {
            0 => 2,
            1 => 3,
            _ => 1,
        };
        assert_eq!(cube.face_material(face).unwrap(), expected);
    }
    for attribute in cube.attributes() {
        assert!((0.0..=1.0).contains(&attribute.uv0.x));
        assert!((0.0..=1.0).contains(&attribute.uv0.y));
    }
}

#[test]
fn cylinder_mapping_separates_caps() {
    let mut cylinder = MeshEffect::cylinder(1.0, 2.0, 16, 0).unwrap();
    cylinder.cylindrical_mapping(4, 9).unwrap();
    let geometry = cylinder.material_geometry().unwrap();
    let materials: Vec<u32> = geometry.groups.iter().map(|g| g.material).collect();
    assert_eq!(materials, vec![4, 9]);
    // two 16-gon caps
    assert_eq!(geometry.groups[1].indices.len(), 2 * 14 * 3);
}

#[test]
fn spherical_mapping_stays_in_unit_square() {
    let mut sphere = MeshEffect::sphere(2.0, 8, 4, 0).unwrap();
    sphere.spherical_mapping(6).unwrap();
    for attribute in sphere.attributes() {
        assert_eq!(attribute.material, 6);
        assert!(attribute.uv0.x >= 0.0 && attribute.uv0.x <= 1.0);
        assert!(attribute.uv0.y >= 0.0 && attribute.uv0.y <= 1.0);
    }
}

#[test]
fn smoothing_respects_the_crease_angle() {
    let mut cube = unit_cube();
    cube.calculate_normals(PI / 4.0).unwrap();
    for face in cube.face_ids() {
        let normal = cube.face_normal(face).normalize();
        for index in cube.face_attribute_indices(face) {
            assert!((cube.attributes()[index].normal - normal).norm() < 1e-9);
        }
    }

    let mut sphere = MeshEffect::sphere(1.0, 16, 8, 0).unwrap();
    sphere.calculate_normals(PI / 3.0).unwrap();
    for attribute in sphere.attributes() {
        let radial = attribute.position.coords.normalize();
        assert!(attribute.normal.dot(&radial) > 0.95);
    }
}

#[test]
fn edge_vertex_keeps_the_mesh_closed() {
    let mut cube = unit_cube();
    let edge = cube.edge_ids()[0];
    cube.insert_edge_vertex(edge, 0.5).unwrap();
    assert_eq!(cube.point_count(), 9);
    assert!(!cube.has_open_edges());
    cube.sanity().unwrap();
    assert!(approx_eq(cube.calculate_volume(), 1.0, 1e-12));
}

#[test]
fn aabb_and_transform() {
    let mut cube = unit_cube();
    assert_eq!(MeshEffect::new().calculate_aabb().unwrap_err(), MeshError::EmptyMesh);

    let m = nalgebra::Matrix4::new_nonuniform_scaling(&Vector3::new(-2.0, 1.0, 1.0));
    cube.transform_mesh(&m).unwrap();
    let aabb = cube.calculate_aabb().unwrap();
    assert_eq!(aabb.mins, Point3::new(-2.0, 0.0, 0.0));
    assert!(approx_eq(cube.calculate_volume(), 2.0, 1e-12));
    for face in cube.face_ids() {
        let normal = cube.face_normal(face).normalize();
        let index = cube.face_attribute_indices(face)[0];
        assert!(cube.attributes()[index].normal.dot(&normal) > 0.99);
    }
}

#[test]
fn oriented_box_follows_a_rotated_cuboid() {
    assert_eq!(MeshEffect::new().calculate_oobb().unwrap_err(), MeshError::EmptyMesh);

    let mut block = MeshEffect::cuboid(4.0, 2.0, 1.0, 0).unwrap();
    let rotation = nalgebra::Rotation3::from_euler_angles(0.3, -0.5, 1.1);
    let placement = nalgebra::Matrix4::new_translation(&Vector3::new(5.0, -1.0, 2.0))
        * rotation.to_homogeneous()
        * nalgebra::Matrix4::new_translation(&Vector3::new(-2.0, -1.0, -0.5));
    block.transform_mesh(&placement).unwrap();

    let (frame, half) = block.calculate_oobb().unwrap();
    assert!((frame.translation.vector - Vector3::new(5.0, -1.0, 2.0)).norm() < 1e-9);

    let mut extents = [half.x, half.y, half.z];
    extents.sort_by(|a, b| a.total_cmp(b));
    assert!(approx_eq(extents[0], 0.5, 1e-9));
    assert!(approx_eq(extents[1], 1.0, 1e-9));
    assert!(approx_eq(extents[2], 2.0, 1e-9));

    // every box axis is one of the cuboid's edge directions
    for axis in 0..3 {
        let direction = frame.rotation * Vector3::ith(axis, 1.0);
        let best = (0..3)
            .map(|i| (rotation * Vector3::ith(i, 1.0)).dot(&direction).abs())
            .fold(0.0, Real::max);
        assert!(approx_eq(best, 1.0, 1e-9));
    }
}

#[test]
fn flipping_turns_the_volume_inside_out() {
    let mut cube = unit_cube();
    cube.flip_faces().unwrap();
    assert!(approx_eq(cube.calculate_volume(), -1.0, 1e-12));
    cube.sanity().unwrap();
}

#[test]
fn plane_quad_uses_the_frame_and_texture_matrices() {
    use nalgebra::Matrix4;
    let frame = Matrix4::new_translation(&Vector3::new(0.0, 0.0, 3.0));
    let texture = Matrix4::new_scaling(0.5);
    let quad = MeshEffect::plane_quad(&frame, 2.0, 4.0, 8, &Matrix4::identity(), &texture).unwrap();
    assert_eq!(quad.face_count(), 1);
    let face = quad.face_ids()[0];
    assert!(approx_eq(quad.face_normal(face).z, 16.0, 1e-12));
    for attribute in quad.attributes() {
        assert_eq!(attribute.position.z, 3.0);
        assert!(approx_eq(attribute.uv1.x, attribute.uv0.x * 0.5, 1e-12));
        assert_eq!(attribute.material, 8);
    }

    let flat = Matrix4::new_nonuniform_scaling(&Vector3::new(1.0, 1.0, 0.0));
    assert_eq!(
        MeshEffect::plane_quad(&flat, 1.0, 1.0, 0, &Matrix4::identity(), &Matrix4::identity()).unwrap_err(),
        MeshError::DegeneratePlane
    );
}

#[cfg(feature = "chull-io")]
#[test]
fn convex_hull_of_a_cloud() {
    let mut cloud: Vec<Point3<Real>> = unit_cube().points().to_vec();
    // interior and near-duplicate points never reach the hull
    cloud.push(Point3::new(0.5, 0.5, 0.5));
    cloud.push(Point3::new(1.0, 1.0, 1.0 + 1e-9));
    let hull = MeshEffect::convex_hull(&cloud, 1e-6, 2).unwrap();
    assert_eq!(hull.point_count(), 8);
    assert_eq!(hull.face_count(), 6);
    assert!(approx_eq(hull.calculate_volume(), 1.0, 1e-9));
    assert!(!hull.has_open_edges());
}

#[test]
fn exported_streams_rebuild_the_same_mesh() {
    let mut source = MeshEffect::cylinder(1.0, 2.0, 10, 3).unwrap();
    source.box_mapping(1, 2, 3).unwrap();
    let faces = source.face_list().unwrap();

    let count = source.attribute_count();
    let mut positions = vec![0.0; count * 3];
    let mut normals = vec![0.0; count * 3];
    let mut uv0 = vec![0.0; count * 2];
    source
        .write_vertex_streams(
            StreamMut::new(&mut positions, 3),
            Some(StreamMut::new(&mut normals, 3)),
            Some(StreamMut::new(&mut uv0, 2)),
            None,
        )
        .unwrap();

    let rebuilt = MeshEffect::from_indexed(&IndexedFaceList {
        face_index_count: &faces.face_index_count,
        face_material: &faces.face_material,
        positions: VertexStream::new(&positions, 3, &faces.attribute_indices),
        normals: Some(VertexStream::new(&normals, 3, &faces.attribute_indices)),
        uv0: Some(VertexStream::new(&uv0, 2, &faces.attribute_indices)),
        uv1: None,
    })
    .unwrap();

    assert_eq!(rebuilt.face_count(), source.face_count());
    assert_eq!(rebuilt.point_count(), source.point_count());
    let mut source_sizes = faces.face_index_count.clone();
    let mut rebuilt_sizes = rebuilt.face_list().unwrap().face_index_count;
    source_sizes.sort_unstable();
    rebuilt_sizes.sort_unstable();
    assert_eq!(source_sizes, rebuilt_sizes);
    assert!(approx_eq(rebuilt.calculate_volume(), source.calculate_volume(), 1e-12));
    assert!(!rebuilt.has_open_edges());
}
