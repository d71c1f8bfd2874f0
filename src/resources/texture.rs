//! Texture resolution: path normalization, cached decode and upload.
//!
//! A given source path is decoded and uploaded at most once per model; every
//! later reference gets the same cache entry back. Decode failures degrade
//! to the invalid-handle sentinel instead of aborting the load.

use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

use image::{DynamicImage, GenericImageView, RgbaImage};

use crate::backend::{RenderBackend, TextureHandle};
use crate::data_structures::texture::{Texture, TextureCache, TextureKind};

/// Resolve a texture file through the cache, decoding and uploading it on
/// the first reference.
pub fn resolve(
    path: &Path,
    kind: TextureKind,
    cache: &mut TextureCache,
    backend: &mut dyn RenderBackend,
) -> Rc<Texture> {
    let key = normalize_path(path);
    if let Some(existing) = cache.get(&key) {
        return existing;
    }
    let handle = match decode(image::open(&key), &key) {
        Some(pixels) => backend.upload_texture(&pixels),
        None => TextureHandle::INVALID,
    };
    cache.insert(Texture {
        handle,
        kind,
        path: key,
    })
}

/// Resolve an image embedded in the model file itself (e.g. a glTF buffer
/// view). `key` is a synthesized identity such as `scene.glb#image0`.
pub fn resolve_bytes(
    key: PathBuf,
    bytes: &[u8],
    kind: TextureKind,
    cache: &mut TextureCache,
    backend: &mut dyn RenderBackend,
) -> Rc<Texture> {
    if let Some(existing) = cache.get(&key) {
        return existing;
    }
    let handle = match decode(image::load_from_memory(bytes), &key) {
        Some(pixels) => backend.upload_texture(&pixels),
        None => TextureHandle::INVALID,
    };
    cache.insert(Texture {
        handle,
        kind,
        path: key,
    })
}

/// Force four channels and flip rows: image decoding is top-left origin,
/// the texture convention is bottom-left.
fn decode(result: image::ImageResult<DynamicImage>, path: &Path) -> Option<RgbaImage> {
    match result {
        Ok(img) => {
            let (width, height) = img.dimensions();
            if !width.is_power_of_two() || !height.is_power_of_two() {
                log::warn!(
                    "texture {} is not power-of-2 ({width}x{height})",
                    path.display()
                );
            }
            Some(img.flipv().to_rgba8())
        }
        Err(e) => {
            log::error!("could not load texture {}: {e}", path.display());
            None
        }
    }
}

/// Lexical normalization of the cache key: drops redundant `.` segments and
/// collapses interior `..`, so equivalent spellings of one path share one
/// cache entry. Purely lexical on purpose; the path may not exist.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(Component::ParentDir);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}
