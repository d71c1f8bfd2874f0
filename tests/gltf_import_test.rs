use std::rc::Rc;

use cgmath::Vector3;
use loadstone::backend::HeadlessBackend;
use loadstone::data_structures::texture::TextureKind;
use loadstone::error::ImportError;
use loadstone::resources::load_model;

mod common;

#[test]
fn meshes_follow_preorder_node_traversal() {
    common::init();
    let mut backend = HeadlessBackend::new();
    let model = load_model(common::fixture("rig.glb"), &mut backend).unwrap();

    // root(quad) -> bare -> group -> leaf(shinytri): a node's own mesh
    // comes before its children.
    let names: Vec<_> = model.meshes.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["quad", "barepts", "shinytri"]);
}

#[test]
fn missing_attributes_default_instead_of_failing() {
    common::init();
    let mut backend = HeadlessBackend::new();
    let model = load_model(common::fixture("rig.glb"), &mut backend).unwrap();

    let bare = &model.meshes[1];
    assert_eq!(bare.vertices.len(), 3);
    for vertex in &bare.vertices {
        assert_eq!(vertex.normal, [0.0, 0.0, 0.0]);
        assert_eq!(vertex.tex_coords, [0.0, 0.0]);
    }
    // Non-indexed primitive: sequential indices over the vertex range.
    assert_eq!(bare.indices, vec![0, 1, 2]);
}

#[test]
fn materials_resolve_diffuse_and_specular_through_one_cache() {
    common::init();
    let mut backend = HeadlessBackend::new();
    let model = load_model(common::fixture("rig.glb"), &mut backend).unwrap();

    let quad = &model.meshes[0];
    assert_eq!(quad.textures.len(), 1);
    assert_eq!(quad.textures[0].kind, TextureKind::Diffuse);
    assert!(quad.textures[0].handle.is_valid());

    let shiny = &model.meshes[2];
    assert_eq!(shiny.textures.len(), 2);
    assert_eq!(shiny.textures[0].kind, TextureKind::Diffuse);
    assert_eq!(shiny.textures[1].kind, TextureKind::Specular);
    // The embedded specular image is keyed by model file and image index.
    assert!(shiny.textures[1].path.to_string_lossy().ends_with("#image1"));

    // Both materials reference the same external diffuse image: one cache
    // entry, one upload, shared by reference.
    assert!(Rc::ptr_eq(&quad.textures[0], &shiny.textures[0]));
    assert_eq!(model.texture_cache().len(), 2);
    assert_eq!(backend.live_textures(), 2);
}

#[test]
fn bounding_box_spans_all_nodes() {
    common::init();
    let mut backend = HeadlessBackend::new();
    let model = load_model(common::fixture("rig.glb"), &mut backend).unwrap();

    assert_eq!(model.bounds.min, Vector3::new(0.0, 0.0, 0.0));
    assert_eq!(model.bounds.max, Vector3::new(1.0, 3.0, 5.0));
}

#[test]
fn triangle_soup_counts_every_mesh() {
    common::init();
    let mut backend = HeadlessBackend::new();
    let model = load_model(common::fixture("rig.glb"), &mut backend).unwrap();

    let total_indices: usize = model.meshes.iter().map(|m| m.indices.len()).sum();
    assert_eq!(model.triangles().len(), total_indices);
    assert_eq!(total_indices, 6 + 3 + 3);
}

#[test]
fn broken_file_is_a_recoverable_parse_error() {
    common::init();
    let mut backend = HeadlessBackend::new();
    let err = load_model(common::fixture("broken.glb"), &mut backend).unwrap_err();
    assert!(matches!(err, ImportError::Parse { .. }), "{err}");
    assert_eq!(backend.live_textures(), 0);
    assert_eq!(backend.live_buffers(), 0);
}

#[test]
fn buffer_shorter_than_declared_is_a_parse_error() {
    common::init();
    let mut backend = HeadlessBackend::new();
    // The document declares 400 buffer bytes and places an image view in
    // the tail, but the data URI only carries 48. Must fail cleanly.
    let err = load_model(common::fixture("truncated_view.gltf"), &mut backend).unwrap_err();
    assert!(matches!(err, ImportError::Parse { .. }), "{err}");
    assert_eq!(backend.live_textures(), 0);
    assert_eq!(backend.live_buffers(), 0);
}

#[test]
fn scene_without_meshes_yields_an_empty_model() {
    common::init();
    let mut backend = HeadlessBackend::new();
    let model = load_model(common::fixture("empty.gltf"), &mut backend).unwrap();

    assert!(model.meshes.is_empty());
    assert!(model.triangles().is_empty());
    assert!(model.bounds.is_empty());
    assert!(!model.bounds.contains(Vector3::new(0.0, 0.0, 0.0)));
}

#[test]
fn failed_import_releases_textures_uploaded_so_far() {
    common::init();
    let mut backend = HeadlessBackend::new();
    // The first node's mesh resolves a texture before the second node's
    // primitive turns out to have no positions.
    let err = load_model(common::fixture("partial.glb"), &mut backend).unwrap_err();
    assert!(matches!(err, ImportError::Parse { .. }), "{err}");
    assert_eq!(backend.live_textures(), 0);
    assert_eq!(backend.live_buffers(), 0);
}

#[test]
fn data_uri_buffers_load() {
    common::init();
    let mut backend = HeadlessBackend::new();
    let model = load_model(common::fixture("tri_embedded.gltf"), &mut backend).unwrap();

    assert_eq!(model.meshes.len(), 1);
    assert_eq!(model.meshes[0].vertices.len(), 3);
    assert!(model.meshes[0].textures.is_empty());
    assert_eq!(model.bounds.max, Vector3::new(2.0, 2.0, 0.0));
}
