use mesh_effect::{EdgeId, MeshError, Polyhedra};

/// Closed tetrahedron on vertices 0..4, user data equal to the vertex.
fn tetrahedron() -> Polyhedra {
    let mut poly = Polyhedra::new();
    poly.begin_face();
    for face in [[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]] {
        poly.add_face(&face, &face).unwrap();
    }
    poly.end_face().unwrap();
    poly
}

/// Open grid of two quads: 0-1-2 along the bottom, 3-4-5 along the top.
fn strip() -> Polyhedra {
    let mut poly = Polyhedra::new();
    poly.add_face(&[0, 1, 4, 3], &[0, 1, 4, 3]).unwrap();
    poly.add_face(&[1, 2, 5, 4], &[1, 2, 5, 4]).unwrap();
    poly.end_face().unwrap();
    poly
}

#[test]
fn twin_is_an_involution() {
    let poly = tetrahedron();
    poly.sanity().unwrap();
    assert_eq!(poly.edge_count(), 12);
    for id in poly.edge_ids() {
        let twin = poly.get(id).unwrap().twin;
        assert_ne!(twin, id);
        assert_eq!(poly.get(twin).unwrap().twin, id);
    }
    assert!(!poly.has_open_edges());
}

#[test]
fn walks_visit_each_element_once() {
    let poly = tetrahedron();
    let faces = poly.faces();
    assert_eq!(faces.len(), 4);
    for &face in &faces {
        assert_eq!(poly.face_degree(face), 3);
        // walking twice from the same edge is deterministic
        let first: Vec<EdgeId> = poly.face_walk(face).collect();
        let second: Vec<EdgeId> = poly.face_walk(face).collect();
        assert_eq!(first, second);
    }
    for vertex in 0..4 {
        let start = poly.vertex_edge(vertex).unwrap();
        let around: Vec<EdgeId> = poly.vertex_walk(start).collect();
        assert_eq!(around.len(), 3);
        for e in around {
            assert_eq!(poly.get(e).unwrap().incident_vertex, vertex);
        }
    }
}

#[test]
fn boundary_loop_of_an_open_strip() {
    let poly = strip();
    poly.sanity().unwrap();
    assert_eq!(poly.faces().len(), 2);
    let boundary = poly.open_faces();
    assert_eq!(boundary.len(), 1);
    assert_eq!(poly.face_degree(boundary[0]), 6);
    assert!(poly.is_open(boundary[0]));
    // boundary runs against the faces
    assert!(poly.find_edge(1, 0).is_some_and(|e| poly.is_open(e)));
    assert!(poly.find_edge(4, 1).is_some_and(|e| !poly.is_open(e)));
}

#[test]
fn adding_to_a_closed_batch_reopens_the_boundary() {
    let mut poly = Polyhedra::new();
    poly.add_face(&[0, 1, 4, 3], &[0, 1, 4, 3]).unwrap();
    poly.end_face().unwrap();
    poly.add_face(&[1, 2, 5, 4], &[1, 2, 5, 4]).unwrap();
    poly.end_face().unwrap();
    poly.sanity().unwrap();
    assert_eq!(poly.open_faces().len(), 1);
    assert_eq!(poly.edge_count(), strip().edge_count());
}

#[test]
fn face_errors_leave_the_polyhedron_untouched() {
    let mut poly = Polyhedra::new();
    poly.begin_face();
    poly.add_face(&[0, 1, 2], &[0, 1, 2]).unwrap();
    let before = poly.edge_count();

    // the rejected face would have been the second of the batch
    assert_eq!(
        poly.add_face(&[0, 1], &[0, 1]).unwrap_err(),
        MeshError::DegenerateFace { face: 1, count: 2 }
    );
    assert!(matches!(
        poly.add_face(&[3, 3, 4], &[3, 3, 4]),
        Err(MeshError::DegenerateFace { .. })
    ));
    assert_eq!(
        poly.add_face(&[0, 1, 5], &[0, 1, 5]).unwrap_err(),
        MeshError::DuplicateEdge { v0: 0, v1: 1 }
    );
    poly.add_face(&[1, 0, 6], &[1, 0, 6]).unwrap();
    assert_eq!(
        poly.add_face(&[1, 0, 7], &[1, 0, 7]).unwrap_err(),
        MeshError::DuplicateEdge { v0: 1, v1: 0 }
    );
    assert_eq!(poly.edge_count(), before + 3);
    poly.end_face().unwrap();
    poly.sanity().unwrap();
}

#[test]
fn insert_edge_needs_both_vertices_on_the_face() {
    let mut poly = strip();
    let face = poly.find_edge(0, 1).unwrap();
    assert_eq!(
        poly.insert_edge(face, 0, 5).unwrap_err(),
        MeshError::NotInSameFace { v0: 0, v1: 5 }
    );
    // neighbours are already joined
    assert!(matches!(poly.insert_edge(face, 0, 1), Err(MeshError::DuplicateEdge { .. })));

    let diagonal = poly.insert_edge(face, 0, 4).unwrap();
    poly.sanity().unwrap();
    assert_eq!(poly.faces().len(), 3);
    assert_eq!(poly.face_degree(diagonal), 3);
    assert_eq!(poly.face_degree(poly.get(diagonal).unwrap().twin), 3);
}

#[test]
fn split_flip_delete_round() {
    let mut poly = strip();
    let diagonal = poly.insert_edge(poly.find_edge(0, 1).unwrap(), 0, 4).unwrap();
    let flipped = poly.flip_edge(diagonal).unwrap();
    poly.sanity().unwrap();
    // the quad 0-1-4-3 is now cut along 1-3
    let ends = {
        let a = poly.get(flipped).unwrap().incident_vertex;
        let b = poly.target(flipped).unwrap();
        (a.min(b), a.max(b))
    };
    assert_eq!(ends, (1, 3));

    let shared = poly.find_edge(1, 4).unwrap();
    let half = poly.split_edge(shared, 6, 6, 6).unwrap();
    poly.sanity().unwrap();
    assert_eq!(poly.get(half).unwrap().incident_vertex, 6);
    assert!(poly.find_edge(1, 4).is_none());

    let merged = poly.delete_edge(flipped).unwrap();
    poly.sanity().unwrap();
    assert_eq!(poly.faces().len(), 2);
    assert_eq!(poly.face_degree(merged), 5);
}

#[test]
fn stale_handles_are_rejected() {
    let mut poly = strip();
    let diagonal = poly.insert_edge(poly.find_edge(0, 1).unwrap(), 0, 4).unwrap();
    poly.delete_edge(diagonal).unwrap();
    assert_eq!(poly.get(diagonal).unwrap_err(), MeshError::EdgeNotFound);
    assert_eq!(poly.face_walk(diagonal).count(), 0);
}
