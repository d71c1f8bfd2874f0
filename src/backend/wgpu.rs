//! wgpu implementation of [`RenderBackend`].

use std::collections::HashMap;

use image::RgbaImage;
use wgpu::util::DeviceExt;

use crate::backend::{BufferHandle, MeshBuffers, RenderBackend, TextureHandle};
use crate::data_structures::model::ModelVertex;

/// An uploaded GPU texture with its view and sampler.
#[derive(Debug)]
pub struct GpuTexture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// Owns the device/queue pair and every resource uploaded through it.
///
/// Handles index into internal maps; releasing a handle drops the wgpu
/// object, which frees the GPU memory. Models carrying an invalid texture
/// handle are drawn with [`fallback`](Self::fallback), a 1x1 white texture.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    next: u32,
    textures: HashMap<u32, GpuTexture>,
    buffers: HashMap<u32, wgpu::Buffer>,
    fallback: GpuTexture,
}

impl WgpuBackend {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let white = RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        let fallback = upload(&device, &queue, &white, Some("fallback texture"));
        Self {
            device,
            queue,
            next: 0,
            textures: HashMap::new(),
            buffers: HashMap::new(),
            fallback,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&GpuTexture> {
        self.textures.get(&handle.0)
    }

    pub fn buffer(&self, handle: BufferHandle) -> Option<&wgpu::Buffer> {
        self.buffers.get(&handle.0)
    }

    /// 1x1 white texture bound in place of missing or invalid slots.
    pub fn fallback(&self) -> &GpuTexture {
        &self.fallback
    }

    fn next_handle(&mut self) -> u32 {
        self.next += 1;
        self.next
    }
}

impl RenderBackend for WgpuBackend {
    fn upload_texture(&mut self, pixels: &RgbaImage) -> TextureHandle {
        let id = self.next_handle();
        let gpu = upload(&self.device, &self.queue, pixels, None);
        self.textures.insert(id, gpu);
        TextureHandle(id)
    }

    fn upload_mesh(&mut self, vertices: &[ModelVertex], indices: &[u32]) -> MeshBuffers {
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("model vertex buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("model index buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        let vertex = self.next_handle();
        let index = self.next_handle();
        self.buffers.insert(vertex, vertex_buffer);
        self.buffers.insert(index, index_buffer);
        MeshBuffers {
            vertex: BufferHandle(vertex),
            index: BufferHandle(index),
        }
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        if handle.is_valid() && self.textures.remove(&handle.0).is_none() {
            log::warn!("double release of texture handle {}", handle.0);
        }
    }

    fn release_mesh(&mut self, buffers: MeshBuffers) {
        for id in [buffers.vertex.0, buffers.index.0] {
            if self.buffers.remove(&id).is_none() {
                log::warn!("double release of buffer handle {id}");
            }
        }
    }
}

/// Create a texture with a full mip chain, write every level, and attach a
/// repeat-addressed trilinear sampler.
///
/// Mip levels are downsampled on the CPU; level 0 holds `pixels` unchanged.
fn upload(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    pixels: &RgbaImage,
    label: Option<&str>,
) -> GpuTexture {
    let (width, height) = pixels.dimensions();
    let mip_level_count = 32 - width.max(height).leading_zeros();

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label,
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    let mut level_pixels = pixels.clone();
    for level in 0..mip_level_count {
        let level_width = (width >> level).max(1);
        let level_height = (height >> level).max(1);
        if level > 0 {
            level_pixels = image::imageops::resize(
                &level_pixels,
                level_width,
                level_height,
                image::imageops::FilterType::Triangle,
            );
        }
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: level,
                origin: wgpu::Origin3d::ZERO,
            },
            &level_pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * level_width),
                rows_per_image: Some(level_height),
            },
            wgpu::Extent3d {
                width: level_width,
                height: level_height,
                depth_or_array_layers: 1,
            },
        );
    }

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        ..Default::default()
    });

    GpuTexture {
        texture,
        view,
        sampler,
    }
}
