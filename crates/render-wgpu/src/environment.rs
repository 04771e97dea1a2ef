use liquidmetal_assets::Cubemap;

/// Environment cubemap bound to the ray-march pass.
pub(crate) struct EnvironmentTexture {
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl EnvironmentTexture {
    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, cubemap: &Cubemap) -> Self {
        let size = wgpu::Extent3d {
            width: cubemap.size().max(1),
            height: cubemap.size().max(1),
            depth_or_array_layers: 6,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("environment_cubemap"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        if cubemap.size() > 0 {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                cubemap.data(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(cubemap.bytes_per_row()),
                    rows_per_image: Some(cubemap.size()),
                },
                size,
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("environment_cubemap_view"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("environment_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self { view, sampler }
    }
}
