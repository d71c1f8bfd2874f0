//! Core data types of the import pipeline:
//!
//! - `model` contains the vertex/mesh/model representation and the bounding box
//! - `texture` contains resolved textures and the per-model texture cache

pub mod model;
pub mod texture;
