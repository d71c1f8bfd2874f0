//! Scene-graph reader: glTF through the `gltf` crate.
//!
//! Nodes are walked in pre-order from the scene roots, a node's own mesh
//! before its children, and every primitive becomes one [`Mesh`]. Unlike the
//! flat-face family, missing normals and texcoords are not errors here:
//! normals default to the zero vector and UVs to (0,0).

use std::path::{Path, PathBuf};
use std::rc::Rc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use gltf::Gltf;

use crate::backend::RenderBackend;
use crate::data_structures::model::{Mesh, ModelVertex};
use crate::data_structures::texture::{Texture, TextureCache, TextureKind};
use crate::error::ImportError;
use crate::resources::texture::{resolve, resolve_bytes};

pub(crate) fn read(
    path: &Path,
    cache: &mut TextureCache,
    backend: &mut dyn RenderBackend,
) -> Result<Vec<Mesh>, ImportError> {
    let gltf = Gltf::open(path).map_err(|e| match e {
        gltf::Error::Io(source) => ImportError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => ImportError::Parse {
            path: path.to_path_buf(),
            message: other.to_string(),
        },
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let buffers = load_buffers(&gltf, base_dir, path)?;

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| ImportError::Parse {
            path: path.to_path_buf(),
            message: "no scene to traverse".into(),
        })?;

    let mut meshes = Vec::new();
    for node in scene.nodes() {
        visit_node(&node, &buffers, base_dir, path, cache, backend, &mut meshes)?;
    }
    log::debug!("{}: {} meshes", path.display(), meshes.len());
    Ok(meshes)
}

/// Pre-order traversal: a node's own mesh primitives first, then its
/// children, so mesh order is deterministic across repeated loads.
fn visit_node(
    node: &gltf::Node,
    buffers: &[Vec<u8>],
    base_dir: &Path,
    path: &Path,
    cache: &mut TextureCache,
    backend: &mut dyn RenderBackend,
    out: &mut Vec<Mesh>,
) -> Result<(), ImportError> {
    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            out.push(read_primitive(
                &mesh, &primitive, buffers, base_dir, path, cache, backend,
            )?);
        }
    }
    for child in node.children() {
        visit_node(&child, buffers, base_dir, path, cache, backend, out)?;
    }
    Ok(())
}

fn read_primitive(
    mesh: &gltf::Mesh,
    primitive: &gltf::Primitive,
    buffers: &[Vec<u8>],
    base_dir: &Path,
    path: &Path,
    cache: &mut TextureCache,
    backend: &mut dyn RenderBackend,
) -> Result<Mesh, ImportError> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    let mut vertices: Vec<ModelVertex> = reader
        .read_positions()
        .ok_or_else(|| ImportError::Parse {
            path: path.to_path_buf(),
            message: format!(
                "mesh `{}` has a primitive without positions",
                mesh.name().unwrap_or("unnamed")
            ),
        })?
        .map(|position| ModelVertex {
            position,
            normal: Default::default(),
            tex_coords: Default::default(),
        })
        .collect();

    if let Some(normals) = reader.read_normals() {
        for (vertex, normal) in vertices.iter_mut().zip(normals) {
            vertex.normal = normal;
        }
    }
    if let Some(tex_coords) = reader.read_tex_coords(0).map(|t| t.into_f32()) {
        for (vertex, uv) in vertices.iter_mut().zip(tex_coords) {
            vertex.tex_coords = uv;
        }
    }

    let indices = match reader.read_indices() {
        Some(raw) => raw.into_u32().collect(),
        // Non-indexed primitives are already expanded triangle lists.
        None => (0..vertices.len() as u32).collect(),
    };

    let mut textures = Vec::new();
    let material = primitive.material();
    if material.index().is_some() {
        let (diffuse, specular) = match material.pbr_specular_glossiness() {
            Some(sg) => (sg.diffuse_texture(), sg.specular_glossiness_texture()),
            None => (
                material.pbr_metallic_roughness().base_color_texture(),
                None,
            ),
        };
        for (info, kind) in [
            (diffuse, TextureKind::Diffuse),
            (specular, TextureKind::Specular),
        ] {
            if let Some(info) = info {
                textures.push(resolve_image(
                    &info.texture(),
                    kind,
                    buffers,
                    base_dir,
                    path,
                    cache,
                    backend,
                ));
            }
        }
    }

    Ok(Mesh::new(
        mesh.name().unwrap_or("unnamed").to_string(),
        vertices,
        indices,
        textures,
    ))
}

/// Resolve one texture reference through the cache, whether its image lives
/// in an external file, a data URI, or a buffer view inside the model file.
fn resolve_image(
    texture: &gltf::Texture,
    kind: TextureKind,
    buffers: &[Vec<u8>],
    base_dir: &Path,
    path: &Path,
    cache: &mut TextureCache,
    backend: &mut dyn RenderBackend,
) -> Rc<Texture> {
    let image = texture.source();
    // Embedded images have no path of their own; key them by model file and
    // image index so two references still share one cache entry.
    let embedded_key = || PathBuf::from(format!("{}#image{}", path.display(), image.index()));
    match image.source() {
        gltf::image::Source::Uri { uri, .. } => match decode_data_uri(uri) {
            Some(bytes) => resolve_bytes(embedded_key(), &bytes, kind, cache, backend),
            None => resolve(&base_dir.join(uri), kind, cache, backend),
        },
        gltf::image::Source::View { view, .. } => {
            let buffer = &buffers[view.buffer().index()];
            // Buffer lengths are checked at load, so this only trips on a
            // view the document itself declares out of range.
            let bytes = buffer
                .get(view.offset()..view.offset() + view.length())
                .unwrap_or_else(|| {
                    log::error!("image {} has an out-of-range buffer view", image.index());
                    &[]
                });
            resolve_bytes(embedded_key(), bytes, kind, cache, backend)
        }
    }
}

fn load_buffers(gltf: &Gltf, base_dir: &Path, path: &Path) -> Result<Vec<Vec<u8>>, ImportError> {
    let mut buffers = Vec::new();
    for buffer in gltf.buffers() {
        let bytes = match buffer.source() {
            gltf::buffer::Source::Bin => match gltf.blob.as_deref() {
                Some(blob) => blob.to_vec(),
                None => {
                    return Err(ImportError::Parse {
                        path: path.to_path_buf(),
                        message: "buffer references a missing binary chunk".into(),
                    });
                }
            },
            gltf::buffer::Source::Uri(uri) => match decode_data_uri(uri) {
                Some(bytes) => bytes,
                None => {
                    let buffer_path = base_dir.join(uri);
                    std::fs::read(&buffer_path).map_err(|source| ImportError::Io {
                        path: buffer_path,
                        source,
                    })?
                }
            },
        };
        // Views and accessors are only ever validated against the buffer's
        // declared length; the bytes actually loaded have to measure up
        // too, or every later slice into them is suspect.
        if bytes.len() < buffer.length() {
            return Err(ImportError::Parse {
                path: path.to_path_buf(),
                message: format!(
                    "buffer {} holds {} bytes but declares {}",
                    buffer.index(),
                    bytes.len(),
                    buffer.length()
                ),
            });
        }
        buffers.push(bytes);
    }
    Ok(buffers)
}

fn decode_data_uri(uri: &str) -> Option<Vec<u8>> {
    let rest = uri.strip_prefix("data:")?;
    let (meta, data) = rest.split_once(',')?;
    if !meta.ends_with(";base64") {
        return None;
    }
    match BASE64.decode(data) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log::error!("invalid base64 data URI: {e}");
            None
        }
    }
}
