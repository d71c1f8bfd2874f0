use std::rc::Rc;

use cgmath::Vector3;
use loadstone::backend::{HeadlessBackend, TextureHandle};
use loadstone::data_structures::texture::TextureKind;
use loadstone::error::ImportError;
use loadstone::resources::load_model;

mod common;

#[test]
fn loads_shapes_in_order_with_materials() {
    common::init();
    let mut backend = HeadlessBackend::new();
    let model = load_model(common::fixture("two_shapes.obj"), &mut backend).unwrap();

    assert_eq!(model.meshes.len(), 2);
    assert_eq!(model.meshes[0].name, "bare");
    assert_eq!(model.meshes[1].name, "textured");

    // Shape without a material carries no textures; the material shape
    // resolves exactly its diffuse slot.
    assert!(model.meshes[0].textures.is_empty());
    assert_eq!(model.meshes[1].textures.len(), 1);
    let diffuse = &model.meshes[1].textures[0];
    assert_eq!(diffuse.kind, TextureKind::Diffuse);
    assert!(diffuse.handle.is_valid());
    assert_eq!(model.texture_cache().len(), 1);
}

#[test]
fn every_index_is_in_range_and_locally_fresh() {
    common::init();
    let mut backend = HeadlessBackend::new();
    let model = load_model(common::fixture("two_shapes.obj"), &mut backend).unwrap();

    for mesh in &model.meshes {
        assert_eq!(mesh.indices.len() % 3, 0);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
        // One materialized vertex per face-vertex occurrence, indices in
        // visitation order.
        let expected: Vec<u32> = (0..mesh.vertices.len() as u32).collect();
        assert_eq!(mesh.indices, expected);
    }
    // Two triangles sharing pool vertices still materialize six corners.
    assert_eq!(model.meshes[1].vertices.len(), 6);
}

#[test]
fn missing_texcoords_default_to_origin() {
    common::init();
    let mut backend = HeadlessBackend::new();
    let model = load_model(common::fixture("two_shapes.obj"), &mut backend).unwrap();

    let bare = &model.meshes[0];
    for vertex in &bare.vertices {
        assert_eq!(vertex.tex_coords, [0.0, 0.0]);
        assert_eq!(vertex.normal, [0.0, 0.0, -1.0]);
    }
}

#[test]
fn missing_normals_are_a_parse_error() {
    common::init();
    let mut backend = HeadlessBackend::new();
    let err = load_model(common::fixture("no_normals.obj"), &mut backend).unwrap_err();
    assert!(matches!(err, ImportError::Parse { .. }), "{err}");
    assert_eq!(backend.live_textures(), 0);
    assert_eq!(backend.live_buffers(), 0);
}

#[test]
fn unknown_extension_is_rejected_without_side_effects() {
    common::init();
    let mut backend = HeadlessBackend::new();
    for name in ["model.stl", "model.fbx", "model"] {
        let err = load_model(common::fixture(name), &mut backend).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat { .. }), "{err}");
    }
    assert_eq!(backend.live_textures(), 0);
    assert_eq!(backend.live_buffers(), 0);
}

#[test]
fn uppercase_extension_is_recognized() {
    common::init();
    let mut backend = HeadlessBackend::new();
    let model = load_model(common::fixture("UPPER.OBJ"), &mut backend).unwrap();
    assert_eq!(model.meshes.len(), 2);
}

#[test]
fn bounding_box_covers_every_vertex() {
    common::init();
    let mut backend = HeadlessBackend::new();
    let model = load_model(common::fixture("two_shapes.obj"), &mut backend).unwrap();

    assert!(!model.bounds.is_empty());
    assert_eq!(model.bounds.min, Vector3::new(0.0, 0.0, 0.0));
    assert_eq!(model.bounds.max, Vector3::new(1.0, 1.0, 2.0));
    for mesh in &model.meshes {
        for vertex in &mesh.vertices {
            assert!(model.bounds.contains(Vector3::from(vertex.position)));
        }
    }
}

#[test]
fn triangle_soup_matches_index_order() {
    common::init();
    let mut backend = HeadlessBackend::new();
    let model = load_model(common::fixture("two_shapes.obj"), &mut backend).unwrap();

    let triangles = model.triangles();
    let total_indices: usize = model.meshes.iter().map(|m| m.indices.len()).sum();
    assert_eq!(triangles.len(), total_indices);
    assert_eq!(triangles.len() % 3, 0);
    // First triple is the first mesh's first triangle, in index order.
    assert_eq!(triangles[0], Vector3::new(0.0, 0.0, 2.0));
    assert_eq!(triangles[1], Vector3::new(1.0, 0.0, 2.0));
    assert_eq!(triangles[2], Vector3::new(0.0, 1.0, 2.0));
}

#[test]
fn unreadable_image_degrades_to_invalid_handle() {
    common::init();
    let mut backend = HeadlessBackend::new();
    let model = load_model(common::fixture("missing_tex.obj"), &mut backend).unwrap();

    assert_eq!(model.meshes.len(), 1);
    let texture = &model.meshes[0].textures[0];
    assert_eq!(texture.handle, TextureHandle::INVALID);
    assert!(!texture.handle.is_valid());
    // The sentinel is cached too, so the bad path is probed only once.
    assert_eq!(model.texture_cache().len(), 1);
    assert_eq!(backend.live_textures(), 0);
}

#[test]
fn one_texture_file_is_uploaded_once_across_materials() {
    common::init();
    let mut backend = HeadlessBackend::new();
    let model = load_model(common::fixture("shared_tex.obj"), &mut backend).unwrap();

    assert_eq!(model.meshes.len(), 2);
    let kinds: Vec<_> = model.meshes[0].textures.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        [TextureKind::Ambient, TextureKind::Diffuse, TextureKind::Specular]
    );

    // `./checker.png` in the second material normalizes onto the first
    // material's `checker.png`: same cache entry, same handle.
    assert_eq!(model.texture_cache().len(), 3);
    assert_eq!(backend.live_textures(), 3);
    let first = &model.meshes[0].textures[0];
    let second = &model.meshes[1].textures[0];
    assert!(Rc::ptr_eq(first, second));
    assert_eq!(first.handle, second.handle);
}

#[test]
fn release_frees_everything_exactly_once() {
    common::init();
    let mut backend = HeadlessBackend::new();
    let mut model = load_model(common::fixture("two_shapes.obj"), &mut backend).unwrap();

    assert_eq!(backend.live_textures(), 1);
    // Two meshes, a vertex and an index buffer each.
    assert_eq!(backend.live_buffers(), 4);

    model.release(&mut backend);
    assert_eq!(backend.live_textures(), 0);
    assert_eq!(backend.live_buffers(), 0);

    // A second release must be a no-op, not a double free.
    model.release(&mut backend);
    assert_eq!(backend.live_textures(), 0);
    assert_eq!(backend.live_buffers(), 0);
}

#[test]
fn repeated_loads_are_deterministic() {
    common::init();
    let mut backend = HeadlessBackend::new();
    let a = load_model(common::fixture("shared_tex.obj"), &mut backend).unwrap();
    let b = load_model(common::fixture("shared_tex.obj"), &mut backend).unwrap();

    let names = |m: &loadstone::Model| m.meshes.iter().map(|x| x.name.clone()).collect::<Vec<_>>();
    assert_eq!(names(&a), names(&b));
    let paths = |m: &loadstone::Model| {
        m.texture_cache()
            .iter()
            .map(|t| t.path.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(paths(&a), paths(&b));
}
