//! Resolved textures and the per-model deduplication cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::backend::{RenderBackend, TextureHandle};

/// The role a texture plays in shading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureKind {
    Diffuse,
    Specular,
    Ambient,
}

/// A resolved texture: the uploaded GPU handle (or the invalid sentinel when
/// the image could not be decoded), its shading semantic and the normalized
/// source path that identifies it.
///
/// Meshes hold `Rc` clones of cache entries; the cache alone owns the GPU
/// handle and releases it.
#[derive(Debug, PartialEq)]
pub struct Texture {
    pub handle: TextureHandle,
    pub kind: TextureKind,
    pub path: PathBuf,
}

/// Path-keyed texture cache, scoped to one model's import.
///
/// Guarantees at-most-once decode/upload per source path and preserves
/// first-reference order, which keeps repeated loads of the same file
/// reproducible. Entries for unreadable images are kept too, so a bad path
/// is probed only once.
#[derive(Debug, Default)]
pub struct TextureCache {
    entries: Vec<Rc<Texture>>,
    by_path: HashMap<PathBuf, usize>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<Rc<Texture>> {
        self.by_path.get(path).map(|&i| Rc::clone(&self.entries[i]))
    }

    pub(crate) fn insert(&mut self, texture: Texture) -> Rc<Texture> {
        let entry = Rc::new(texture);
        self.by_path.insert(entry.path.clone(), self.entries.len());
        self.entries.push(Rc::clone(&entry));
        entry
    }

    /// Entries in first-reference order.
    pub fn iter(&self) -> impl Iterator<Item = &Rc<Texture>> {
        self.entries.iter()
    }

    /// Release every owned GPU handle and drop the entries. Called once per
    /// model, either on [`Model::release`](crate::data_structures::model::Model::release)
    /// or when a reader fails after textures were already uploaded.
    pub(crate) fn release(&mut self, backend: &mut dyn RenderBackend) {
        for entry in self.entries.drain(..) {
            if entry.handle.is_valid() {
                backend.release_texture(entry.handle);
            }
        }
        self.by_path.clear();
    }
}
