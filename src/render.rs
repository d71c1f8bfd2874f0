//! wgpu draw path for imported models.
//!
//! Texture semantics map to fixed bindings consumed by the caller's shader:
//! diffuse at bindings 0/1 and specular at bindings 2/3 of the model bind
//! group. The pipeline (shader) is set on the pass by the caller before
//! [`DrawModel::draw_model`] runs, which then issues one indexed draw per
//! mesh.

use crate::backend::wgpu::WgpuBackend;
use crate::data_structures::model::Model;
use crate::data_structures::texture::TextureKind;

/// Bind group layout for the per-mesh material textures: diffuse texture and
/// sampler at bindings 0/1, specular texture and sampler at bindings 2/3.
pub fn diffuse_specular_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    };
    let sampler = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[texture(0), sampler(1), texture(2), sampler(3)],
        label: Some("model texture_bind_group_layout"),
    })
}

/// Per-mesh bind groups for one model, created once after import.
///
/// Missing slots and invalid handles (undecodable images) fall back to the
/// backend's 1x1 white texture, so a visually incomplete model still draws.
pub struct ModelRenderer {
    groups: Vec<wgpu::BindGroup>,
}

impl ModelRenderer {
    pub fn new(gpu: &WgpuBackend, model: &Model, layout: &wgpu::BindGroupLayout) -> Self {
        let groups = model
            .meshes
            .iter()
            .map(|mesh| {
                let slot = |kind| {
                    mesh.texture(kind)
                        .and_then(|t| gpu.texture(t.handle))
                        .unwrap_or_else(|| gpu.fallback())
                };
                let diffuse = slot(TextureKind::Diffuse);
                let specular = slot(TextureKind::Specular);
                gpu.device().create_bind_group(&wgpu::BindGroupDescriptor {
                    layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&diffuse.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&diffuse.sampler),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::TextureView(&specular.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 3,
                            resource: wgpu::BindingResource::Sampler(&specular.sampler),
                        },
                    ],
                    label: Some(&format!("{} bind group", mesh.name)),
                })
            })
            .collect();
        Self { groups }
    }
}

pub trait DrawModel {
    /// One indexed draw per mesh, binding the mesh's material group first.
    fn draw_model(&mut self, model: &Model, renderer: &ModelRenderer, gpu: &WgpuBackend);
}

impl DrawModel for wgpu::RenderPass<'_> {
    fn draw_model(&mut self, model: &Model, renderer: &ModelRenderer, gpu: &WgpuBackend) {
        for (mesh, group) in model.meshes.iter().zip(&renderer.groups) {
            let Some(buffers) = mesh.buffers else {
                log::warn!("mesh {} has no GPU buffers, skipping draw", mesh.name);
                continue;
            };
            let (Some(vertex), Some(index)) =
                (gpu.buffer(buffers.vertex), gpu.buffer(buffers.index))
            else {
                continue;
            };
            self.set_bind_group(0, group, &[]);
            self.set_vertex_buffer(0, vertex.slice(..));
            self.set_index_buffer(index.slice(..), wgpu::IndexFormat::Uint32);
            self.draw_indexed(0..mesh.num_elements(), 0, 0..1);
        }
    }
}
