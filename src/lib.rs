//! loadstone
//!
//! A 3D asset import pipeline. Heterogeneous on-disk model formats, a
//! triangulated flat-face format (Wavefront OBJ) and a hierarchical
//! scene-graph format (glTF), are normalized into one uniform in-memory
//! representation: a list of meshes with position/normal/uv vertices, u32
//! triangle indices, resolved material textures and a model bounding box,
//! ready for a renderer to consume.
//!
//! High-level modules
//! - `backend`: the upload/release seam to the GPU, with a wgpu
//!   implementation and a headless one for tests and tooling
//! - `data_structures`: the mesh/model/texture representation and the
//!   per-model texture cache
//! - `error`: the typed import error
//! - `resources`: format dispatch, the two readers and texture resolution
//! - `render`: wgpu bind group layout and per-mesh draw composition
//!
//! The pipeline is single-threaded and synchronous: one
//! [`load_model`](resources::load_model) call runs to completion, fully
//! succeeds or fully fails, and produces deterministic mesh and texture
//! ordering.

pub mod backend;
pub mod data_structures;
pub mod error;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::{Vector2, Vector3};
pub use data_structures::model::{Aabb, Mesh, Model, ModelVertex};
pub use data_structures::texture::{Texture, TextureCache, TextureKind};
pub use error::ImportError;
pub use resources::load_model;
