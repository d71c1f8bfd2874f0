//! Flat-face reader: Wavefront OBJ through `tobj`.
//!
//! OBJ keeps one shared attribute pool and lets every face corner index
//! positions, normals and texcoords independently, so the reader
//! materializes one local vertex per face-vertex occurrence and hands out
//! fresh indices in visitation order. Faces arrive pre-triangulated from the
//! decode step.

use std::path::Path;

use crate::backend::RenderBackend;
use crate::data_structures::model::{Mesh, ModelVertex};
use crate::data_structures::texture::{TextureCache, TextureKind};
use crate::error::ImportError;
use crate::resources::texture::resolve;

pub(crate) fn read(
    path: &Path,
    cache: &mut TextureCache,
    backend: &mut dyn RenderBackend,
) -> Result<Vec<Mesh>, ImportError> {
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: false,
            ..Default::default()
        },
    )
    .map_err(|e| ImportError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    // A broken material library is a warning, not a failed load.
    let materials = match materials {
        Ok(materials) => materials,
        Err(e) => {
            log::warn!("could not load material library for {}: {e}", path.display());
            Vec::new()
        }
    };

    log::debug!(
        "{}: {} shapes, {} materials",
        path.display(),
        models.len(),
        materials.len()
    );

    let mut meshes = Vec::with_capacity(models.len());
    for m in &models {
        let mesh = &m.mesh;
        if mesh.normals.is_empty() || mesh.normal_indices.len() != mesh.indices.len() {
            return Err(ImportError::Parse {
                path: path.to_path_buf(),
                message: format!("shape `{}` has no vertex normals", m.name),
            });
        }

        let mut vertices = Vec::with_capacity(mesh.indices.len());
        let mut indices = Vec::with_capacity(mesh.indices.len());
        for i in 0..mesh.indices.len() {
            let pi = mesh.indices[i] as usize;
            let ni = mesh.normal_indices[i] as usize;
            vertices.push(ModelVertex {
                position: [
                    mesh.positions[pi * 3],
                    mesh.positions[pi * 3 + 1],
                    mesh.positions[pi * 3 + 2],
                ],
                normal: [
                    mesh.normals[ni * 3],
                    mesh.normals[ni * 3 + 1],
                    mesh.normals[ni * 3 + 2],
                ],
                tex_coords: match mesh.texcoord_indices.get(i) {
                    Some(&ti) => [
                        mesh.texcoords.get(ti as usize * 2).map_or(0.0, |f| *f),
                        mesh.texcoords.get(ti as usize * 2 + 1).map_or(0.0, |f| *f),
                    ],
                    None => [0.0, 0.0],
                },
            });
            indices.push(i as u32);
        }

        let mut textures = Vec::new();
        if let Some(id) = mesh.material_id
            && let Some(material) = materials.get(id)
        {
            let slots = [
                (&material.ambient_texture, TextureKind::Ambient),
                (&material.diffuse_texture, TextureKind::Diffuse),
                (&material.specular_texture, TextureKind::Specular),
            ];
            for (slot, kind) in slots {
                if let Some(relative) = slot
                    && !relative.is_empty()
                {
                    textures.push(resolve(&base_dir.join(relative), kind, cache, backend));
                }
            }
        }

        meshes.push(Mesh::new(m.name.clone(), vertices, indices, textures));
    }

    Ok(meshes)
}
