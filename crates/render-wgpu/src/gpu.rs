use crate::environment::EnvironmentTexture;
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use liquidmetal_assets::Cubemap;
use liquidmetal_kernel::{Scene, Shape};
use liquidmetal_render::{MAX_MODELS, RenderError, UniformModel};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct CameraUniform {
    position: [f32; 3],
    _pad: f32,
    projection_inverse: [[f32; 4]; 4],
    view_inverse: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable, Debug, PartialEq)]
struct ModelEntry {
    shape: i32,
    _pad: [i32; 3],
    inverse_world: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct DebugUniforms {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct LineVertex {
    position: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable, Debug)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
}

const DEBUG_COLOR: [f32; 4] = [0.85, 0.9, 1.0, 0.7];

/// Build-time options for [`WgpuRenderer`].
#[derive(Debug, Clone)]
pub struct RendererSettings {
    /// Object-space radius the shader uses for every sphere model.
    pub sphere_radius: f32,
    /// Replacement for the built-in ray-march template.
    pub shader_template: Option<String>,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            sphere_radius: 0.1,
            shader_template: None,
        }
    }
}

fn camera_uniform(model: &UniformModel) -> CameraUniform {
    let camera = &model.camera;
    CameraUniform {
        position: camera.position.to_array(),
        _pad: 0.0,
        projection_inverse: camera.projection_inverse.to_cols_array_2d(),
        view_inverse: camera.view_inverse.to_cols_array_2d(),
        normal_matrix: camera.normal_matrix.to_cols_array_2d(),
    }
}

fn model_entries(model: &UniformModel) -> Vec<ModelEntry> {
    model
        .models
        .iter()
        .map(|m| ModelEntry {
            shape: m.shape.as_i32(),
            _pad: [0; 3],
            inverse_world: m.inverse_world.to_cols_array_2d(),
        })
        .collect()
}

/// Instances for every visible debug entity that has a sphere shape.
fn debug_instances(scene: &Scene) -> Vec<InstanceData> {
    scene
        .debug_entities()
        .filter(|(_, entity)| entity.visible)
        .filter_map(|(_, entity)| match entity.shape {
            Shape::Sphere { radius } => {
                let t = &entity.transform;
                let world = Mat4::from_scale_rotation_translation(
                    t.scale * radius,
                    t.rotation,
                    t.position,
                );
                let cols = world.to_cols_array_2d();
                Some(InstanceData {
                    model_0: cols[0],
                    model_1: cols[1],
                    model_2: cols[2],
                    model_3: cols[3],
                    color: DEBUG_COLOR,
                })
            }
            _ => None,
        })
        .collect()
}

/// Unit wire sphere: three orthogonal great circles as a line list.
fn wire_sphere_mesh(segments: u32) -> Vec<LineVertex> {
    let mut verts = Vec::with_capacity(segments as usize * 6);
    let point = |axis: usize, angle: f32| {
        let (s, c) = angle.sin_cos();
        let p = match axis {
            0 => Vec3::new(c, s, 0.0),
            1 => Vec3::new(0.0, c, s),
            _ => Vec3::new(c, 0.0, s),
        };
        LineVertex {
            position: p.to_array(),
        }
    };
    for axis in 0..3 {
        for i in 0..segments {
            let a0 = i as f32 / segments as f32 * std::f32::consts::TAU;
            let a1 = (i + 1) as f32 / segments as f32 * std::f32::consts::TAU;
            verts.push(point(axis, a0));
            verts.push(point(axis, a1));
        }
    }
    verts
}

/// wgpu-based scene renderer.
pub struct WgpuRenderer {
    raymarch_pipeline: wgpu::RenderPipeline,
    raymarch_bind_group: wgpu::BindGroup,
    camera_buffer: wgpu::Buffer,
    model_buffer: wgpu::Buffer,
    model_count: usize,
    debug_pipeline: wgpu::RenderPipeline,
    debug_uniform_buffer: wgpu::Buffer,
    debug_bind_group: wgpu::BindGroup,
    wire_vertex_buffer: wgpu::Buffer,
    wire_vertex_count: u32,
    instance_buffer: wgpu::Buffer,
    max_instances: u32,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    /// Build both pipelines with `model_count` baked into the ray-march shader.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        model_count: usize,
        environment: &Cubemap,
        settings: &RendererSettings,
    ) -> Result<Self, RenderError> {
        if model_count > MAX_MODELS {
            return Err(RenderError::CapacityTooLarge(model_count));
        }

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("camera_buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let model_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("model_buffer"),
            size: (model_count.max(1) * std::mem::size_of::<ModelEntry>()) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let environment = EnvironmentTexture::upload(device, queue, environment);

        let uniform_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let raymarch_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("raymarch_bind_group_layout"),
            entries: &[
                uniform_entry(0),
                uniform_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let raymarch_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("raymarch_bind_group"),
            layout: &raymarch_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: model_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&environment.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&environment.sampler),
                },
            ],
        });

        let template = settings
            .shader_template
            .as_deref()
            .unwrap_or(shaders::RAYMARCH_TEMPLATE);
        let raymarch_source = shaders::raymarch_source(template, model_count, settings.sphere_radius);
        let raymarch_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("raymarch_shader"),
            source: wgpu::ShaderSource::Wgsl(raymarch_source.into()),
        });
        let raymarch_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("raymarch_pipeline_layout"),
                bind_group_layouts: &[&raymarch_layout],
                push_constant_ranges: &[],
            });
        let raymarch_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("raymarch_pipeline"),
            layout: Some(&raymarch_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &raymarch_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &raymarch_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            // Shares the pass with the debug lines but never occludes them.
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Debug wire spheres
        let debug_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("debug_uniform_buffer"),
            contents: bytemuck::bytes_of(&DebugUniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let debug_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("debug_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let debug_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("debug_bind_group"),
            layout: &debug_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: debug_uniform_buffer.as_entire_binding(),
            }],
        });
        let debug_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("debug_pipeline_layout"),
            bind_group_layouts: &[&debug_layout],
            push_constant_ranges: &[],
        });
        let debug_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("debug_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::DEBUG_SHADER.into()),
        });
        let debug_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("debug_pipeline"),
            layout: Some(&debug_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &debug_shader,
                entry_point: Some("vs_debug"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<LineVertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceData>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            1 => Float32x4,
                            2 => Float32x4,
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &debug_shader,
                entry_point: Some("fs_debug"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let wire_verts = wire_sphere_mesh(48);
        let wire_vertex_count = wire_verts.len() as u32;
        let wire_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("wire_sphere_vertex_buffer"),
            contents: bytemuck::cast_slice(&wire_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let max_instances = 1_024u32;
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("debug_instance_buffer"),
            size: (max_instances as u64) * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let depth_texture = Self::create_depth_texture(device, width, height);

        tracing::info!(model_count, "ray-march pipeline built");

        Ok(Self {
            raymarch_pipeline,
            raymarch_bind_group,
            camera_buffer,
            model_buffer,
            model_count,
            debug_pipeline,
            debug_uniform_buffer,
            debug_bind_group,
            wire_vertex_buffer,
            wire_vertex_count,
            instance_buffer,
            max_instances,
            depth_texture,
            surface_format,
        })
    }

    /// Number of models the ray-march shader was compiled for.
    pub fn model_count(&self) -> usize {
        self.model_count
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Render one frame: the metal surface (if visible) then debug spheres.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        scene: &Scene,
        model: &UniformModel,
    ) -> Result<(), RenderError> {
        if model.len() != self.model_count {
            return Err(RenderError::CapacityMismatch {
                builder: model.len(),
                shader: self.model_count,
            });
        }

        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&camera_uniform(model)));
        let entries = model_entries(model);
        if !entries.is_empty() {
            queue.write_buffer(&self.model_buffer, 0, bytemuck::cast_slice(&entries));
        }

        let camera = &model.camera;
        let view_proj = camera.projection_inverse.inverse() * camera.view_inverse.inverse();
        queue.write_buffer(
            &self.debug_uniform_buffer,
            0,
            bytemuck::bytes_of(&DebugUniforms {
                view_proj: view_proj.to_cols_array_2d(),
            }),
        );

        let mut instances = debug_instances(scene);
        instances.truncate(self.max_instances as usize);
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.04,
                            g: 0.04,
                            b: 0.05,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if scene.screen_visible() {
                pass.set_pipeline(&self.raymarch_pipeline);
                pass.set_bind_group(0, &self.raymarch_bind_group, &[]);
                pass.draw(0..3, 0..1);
            }

            if !instances.is_empty() {
                pass.set_pipeline(&self.debug_pipeline);
                pass.set_bind_group(0, &self.debug_bind_group, &[]);
                pass.set_vertex_buffer(0, self.wire_vertex_buffer.slice(..));
                pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                pass.draw(0..self.wire_vertex_count, 0..instances.len() as u32);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}
