//! Model loading: format dispatch, readers, and texture resolution.
//!
//! [`load_model`] is the single entry point. The two on-disk families it
//! understands both converge on the same in-memory [`Model`]:
//!
//! - flat-face (Wavefront OBJ): shared attribute pool, per-shape face lists
//!   with independent per-attribute indices, flat material table
//! - scene-graph (glTF): node hierarchy with per-node meshes and embedded
//!   material references

use std::path::Path;

use cgmath::Vector3;

use crate::backend::RenderBackend;
use crate::data_structures::model::{Aabb, Mesh, Model};
use crate::data_structures::texture::TextureCache;
use crate::error::ImportError;

pub mod gltf;
pub mod obj;
pub mod texture;

/// The closed set of recognized model families, selected once per load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ImportFormat {
    FlatFace,
    SceneGraph,
}

impl ImportFormat {
    /// Case-insensitive extension sniff.
    fn sniff(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "obj" => Some(Self::FlatFace),
            "gltf" | "glb" => Some(Self::SceneGraph),
            _ => None,
        }
    }

    fn decode(
        self,
        path: &Path,
        cache: &mut TextureCache,
        backend: &mut dyn RenderBackend,
    ) -> Result<Vec<Mesh>, ImportError> {
        match self {
            Self::FlatFace => obj::read(path, cache, backend),
            Self::SceneGraph => gltf::read(path, cache, backend),
        }
    }
}

/// Load a model file, dispatching on its extension.
///
/// On success the returned [`Model`] owns its meshes in reader order (shape
/// order for the flat-face family, pre-order node traversal for the
/// scene-graph family), with GPU buffers uploaded and the bounding box
/// computed over the final mesh list. On failure no model is returned and
/// any textures the resolver already uploaded are released again.
pub fn load_model(
    path: impl AsRef<Path>,
    backend: &mut dyn RenderBackend,
) -> Result<Model, ImportError> {
    let path = path.as_ref();
    let format = ImportFormat::sniff(path).ok_or_else(|| ImportError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string(),
    })?;
    log::debug!("loading {} as {format:?}", path.display());

    let mut cache = TextureCache::new();
    let meshes = match format.decode(path, &mut cache, backend) {
        Ok(meshes) => meshes,
        Err(e) => {
            cache.release(backend);
            return Err(e);
        }
    };

    let mut model = Model::new(meshes, cache);
    for mesh in &mut model.meshes {
        mesh.buffers = Some(backend.upload_mesh(&mesh.vertices, &mesh.indices));
    }
    model.bounds = bounding_box(&model.meshes);
    Ok(model)
}

/// One full pass over every vertex of every mesh, run exactly once per
/// successful load.
fn bounding_box(meshes: &[Mesh]) -> Aabb {
    let mut bounds = Aabb::empty();
    for mesh in meshes {
        for vertex in &mesh.vertices {
            bounds.grow(Vector3::from(vertex.position));
        }
    }
    bounds
}
