//! The seam between the import pipeline and a rendering backend.
//!
//! The readers and the texture resolver only ever talk to the
//! [`RenderBackend`] trait, so the whole import path runs without a GPU.
//! [`WgpuBackend`](wgpu::WgpuBackend) is the real implementation;
//! [`HeadlessBackend`] allocates handles without any device and backs the
//! integration tests as well as offline tooling (e.g. extracting collision
//! triangles on a build machine).

use std::collections::BTreeSet;

use crate::data_structures::model::ModelVertex;

pub mod wgpu;

/// Opaque handle to an uploaded texture. `0` marks a texture whose image
/// could not be decoded; renderers substitute a fallback for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

impl TextureHandle {
    pub const INVALID: TextureHandle = TextureHandle(0);

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

/// Opaque handle to an uploaded GPU buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// The GPU buffers backing one mesh, attached at upload time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshBuffers {
    pub vertex: BufferHandle,
    pub index: BufferHandle,
}

/// Upload/release contract the import pipeline is written against.
///
/// Handles are allocated starting at 1; implementations must treat a release
/// of an unknown handle as a caller bug (double release) and must not panic
/// on it.
pub trait RenderBackend {
    /// Upload decoded RGBA pixels and return a fresh handle. The pixels are
    /// already row-flipped to bottom-left origin by the resolver.
    fn upload_texture(&mut self, pixels: &image::RgbaImage) -> TextureHandle;

    /// Upload one mesh's vertex and index data.
    fn upload_mesh(&mut self, vertices: &[ModelVertex], indices: &[u32]) -> MeshBuffers;

    fn release_texture(&mut self, handle: TextureHandle);

    fn release_mesh(&mut self, buffers: MeshBuffers);
}

/// Backend that only does handle bookkeeping.
///
/// Keeps the set of live handles so tests can assert the exactly-once
/// release discipline of [`Model::release`](crate::data_structures::model::Model::release).
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next: u32,
    textures: BTreeSet<u32>,
    buffers: BTreeSet<u32>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    fn next_handle(&mut self) -> u32 {
        self.next += 1;
        self.next
    }
}

impl RenderBackend for HeadlessBackend {
    fn upload_texture(&mut self, _pixels: &image::RgbaImage) -> TextureHandle {
        let id = self.next_handle();
        self.textures.insert(id);
        TextureHandle(id)
    }

    fn upload_mesh(&mut self, _vertices: &[ModelVertex], _indices: &[u32]) -> MeshBuffers {
        let vertex = self.next_handle();
        let index = self.next_handle();
        self.buffers.insert(vertex);
        self.buffers.insert(index);
        MeshBuffers {
            vertex: BufferHandle(vertex),
            index: BufferHandle(index),
        }
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        if handle.is_valid() && !self.textures.remove(&handle.0) {
            log::warn!("double release of texture handle {}", handle.0);
        }
    }

    fn release_mesh(&mut self, buffers: MeshBuffers) {
        for id in [buffers.vertex.0, buffers.index.0] {
            if !self.buffers.remove(&id) {
                log::warn!("double release of buffer handle {id}");
            }
        }
    }
}
