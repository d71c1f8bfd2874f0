//! The format-agnostic model representation every reader converges on.

use std::rc::Rc;

use cgmath::Vector3;

use crate::backend::{MeshBuffers, RenderBackend};
use crate::data_structures::texture::{Texture, TextureCache, TextureKind};

/// One imported vertex. Identity is positional: readers materialize a vertex
/// per face-vertex occurrence and never deduplicate across faces.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl ModelVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    /// Vertex buffer layout matching the upload performed by the backend.
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// One logical shape (flat-face family) or primitive (scene-graph family).
///
/// Invariants: `indices.len()` is a multiple of 3 and every index is smaller
/// than `vertices.len()`. Immutable after import except for the GPU buffers
/// attached at upload time. Textures are shared references; the GPU handle
/// behind them belongs to the model's [`TextureCache`].
#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub textures: Vec<Rc<Texture>>,
    pub buffers: Option<MeshBuffers>,
}

impl Mesh {
    pub fn new(
        name: String,
        vertices: Vec<ModelVertex>,
        indices: Vec<u32>,
        textures: Vec<Rc<Texture>>,
    ) -> Self {
        debug_assert!(indices.len() % 3 == 0);
        debug_assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
        Self {
            name,
            vertices,
            indices,
            textures,
            buffers: None,
        }
    }

    pub fn num_elements(&self) -> u32 {
        self.indices.len() as u32
    }

    /// First resolved texture of the given semantic, if any.
    pub fn texture(&self, kind: TextureKind) -> Option<&Rc<Texture>> {
        self.textures.iter().find(|t| t.kind == kind)
    }
}

/// Axis-aligned bounding box, corners seeded at the floating-point extremes
/// and narrowed vertex by vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: Vector3::new(f32::MAX, f32::MAX, f32::MAX),
            max: Vector3::new(-f32::MAX, -f32::MAX, -f32::MAX),
        }
    }

    /// True until the first vertex has been folded in.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    pub fn grow(&mut self, p: Vector3<f32>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn contains(&self, p: Vector3<f32>) -> bool {
        !self.is_empty()
            && self.min.x <= p.x
            && self.min.y <= p.y
            && self.min.z <= p.z
            && self.max.x >= p.x
            && self.max.y >= p.y
            && self.max.z >= p.z
    }
}

/// An imported model: the reader-ordered mesh list, the texture cache that
/// owns every GPU texture the import resolved, and the bounding box computed
/// once over the final mesh list.
#[derive(Debug)]
pub struct Model {
    pub meshes: Vec<Mesh>,
    pub(crate) cache: TextureCache,
    pub bounds: Aabb,
    released: bool,
}

impl Model {
    pub(crate) fn new(meshes: Vec<Mesh>, cache: TextureCache) -> Self {
        Self {
            meshes,
            cache,
            bounds: Aabb::empty(),
            released: false,
        }
    }

    pub fn texture_cache(&self) -> &TextureCache {
        &self.cache
    }

    /// Flattened triangle soup for collision and other spatial queries:
    /// three positions per triangle, in index order across every mesh.
    pub fn triangles(&self) -> Vec<Vector3<f32>> {
        let mut triangles = Vec::new();
        for mesh in &self.meshes {
            for &index in &mesh.indices {
                triangles.push(Vector3::from(mesh.vertices[index as usize].position));
            }
        }
        triangles
    }

    /// Release every GPU resource this model owns: each mesh's buffers and
    /// each cached texture, exactly once. Subsequent calls are no-ops.
    pub fn release(&mut self, backend: &mut dyn RenderBackend) {
        if self.released {
            return;
        }
        self.released = true;
        for mesh in &mut self.meshes {
            if let Some(buffers) = mesh.buffers.take() {
                backend.release_mesh(buffers);
            }
        }
        self.cache.release(backend);
    }
}

impl Drop for Model {
    fn drop(&mut self) {
        if !self.released
            && (!self.cache.is_empty() || self.meshes.iter().any(|m| m.buffers.is_some()))
        {
            log::warn!("model dropped without releasing its GPU resources");
        }
    }
}
