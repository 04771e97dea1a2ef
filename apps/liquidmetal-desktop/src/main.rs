use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use liquidmetal_assets::{Cubemap, load_shader_source};
use liquidmetal_driver::{FrameDriver, Presenter, SceneConfig};
use liquidmetal_input::{PointerEvent, Viewport};
use liquidmetal_kernel::Scene;
use liquidmetal_render::{RenderError, UniformModel};
use liquidmetal_render_wgpu::{RendererSettings, WgpuRenderer};
use liquidmetal_tools::SceneInspector;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, Touch, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "liquidmetal-desktop", about = "Liquid metal sphere viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration (YAML). Defaults to the stock scene.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the six environment cube faces
    #[arg(long, default_value = "./assets/cubemap")]
    assets: PathBuf,

    /// File extension of the cube faces
    #[arg(long, default_value = "webp")]
    face_ext: String,

    /// Ray-march shader template replacing the built-in one
    #[arg(long)]
    shader: Option<PathBuf>,
}

/// Hands finished frames to the wgpu renderer for the current surface texture.
struct SurfacePresenter<'a> {
    renderer: &'a WgpuRenderer,
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    view: &'a wgpu::TextureView,
}

impl Presenter for SurfacePresenter<'_> {
    fn model_count(&self) -> usize {
        self.renderer.model_count()
    }

    fn present(&mut self, scene: &Scene, model: &UniformModel) -> Result<(), RenderError> {
        self.renderer
            .render(self.device, self.queue, self.view, scene, model)
    }
}

struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(
        window: Arc<Window>,
        egui_ctx: &EguiContext,
        model_count: usize,
        environment: &Cubemap,
        settings: &RendererSettings,
    ) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no compatible GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("liquidmetal_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no formats"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(
            &device,
            &queue,
            surface_format,
            config.width,
            config.height,
            model_count,
            environment,
            settings,
        )?;

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            adapter = %adapter.get_info().name,
            models = model_count,
            "GPU initialized"
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    /// Draw the egui overlay on top of the already rendered scene.
    fn paint_ui(&mut self, view: &wgpu::TextureView, egui_ctx: &EguiContext, output: egui::FullOutput) {
        self.egui_winit
            .handle_platform_output(&self.window, output.platform_output);

        let paint_jobs = egui_ctx.tessellate(output.shapes, output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: output.pixels_per_point,
        };

        for (id, image_delta) in &output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

fn pointer_event(touch: &Touch) -> PointerEvent {
    let position = Vec2::new(touch.location.x as f32, touch.location.y as f32);
    match touch.phase {
        TouchPhase::Started => PointerEvent::TouchStarted {
            id: touch.id,
            position,
        },
        TouchPhase::Moved => PointerEvent::TouchMoved {
            id: touch.id,
            position,
        },
        TouchPhase::Ended | TouchPhase::Cancelled => PointerEvent::TouchEnded { id: touch.id },
    }
}

fn draw_panel(ctx: &EguiContext, driver: &mut FrameDriver, frame_ms: f32) {
    egui::SidePanel::left("scene_panel")
        .default_width(220.0)
        .show(ctx, |ui| {
            ui.heading("Liquid Metal");
            ui.separator();

            let mut debug = driver.debug_enabled();
            if ui.checkbox(&mut debug, "Debug spheres").changed() {
                driver.set_debug(debug);
            }

            let summary = SceneInspector::summary(driver.scene());
            ui.label(format!("Tick: {}", summary.tick));
            ui.label(format!("Entities: {}", summary.entity_count));
            ui.label(format!("Models: {}", driver.model_capacity()));
            ui.label(format!("Frame: {frame_ms:.1} ms"));

            let cursor = driver
                .scene()
                .transform(driver.cursor())
                .map(|t| t.position)
                .unwrap_or_default();
            ui.label(format!(
                "Cursor: ({:.2}, {:.2}, {:.2})",
                cursor.x, cursor.y, cursor.z
            ));

            ui.separator();
            ui.small("F1: Toggle panel | D: Toggle debug");
        });
}

struct App {
    scene_config: SceneConfig,
    environment: Cubemap,
    settings: RendererSettings,
    driver: Option<FrameDriver>,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    show_panel: bool,
    last_frame: Instant,
    frame_ms: f32,
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(scene_config: SceneConfig, environment: Cubemap, settings: RendererSettings) -> Self {
        Self {
            scene_config,
            environment,
            settings,
            driver: None,
            gpu: None,
            egui_ctx: EguiContext::default(),
            show_panel: true,
            last_frame: Instant::now(),
            frame_ms: 0.0,
            failure: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Liquid Metal")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);
        let size = window.inner_size();

        let driver = FrameDriver::new(
            &self.scene_config,
            Viewport::new(size.width.max(1), size.height.max(1)),
        )?;
        let gpu = Gpu::new(
            window,
            &self.egui_ctx,
            driver.model_capacity(),
            &self.environment,
            &self.settings,
        )?;

        self.driver = Some(driver);
        self.gpu = Some(gpu);
        self.last_frame = Instant::now();
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        tracing::error!("{err:#}");
        self.failure = Some(err);
        if let Some(driver) = &mut self.driver {
            driver.dispose();
        }
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frame_ms = dt * 1000.0;

        let (Some(gpu), Some(driver)) = (self.gpu.as_mut(), self.driver.as_mut()) else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut presenter = SurfacePresenter {
            renderer: &gpu.renderer,
            device: &gpu.device,
            queue: &gpu.queue,
            view: &view,
        };
        if let Err(err) = driver.tick(dt, &mut presenter) {
            self.fail(event_loop, err.into());
            return;
        }

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let show_panel = self.show_panel;
        let frame_ms = self.frame_ms;
        let ui_output = self.egui_ctx.run(raw_input, |ctx| {
            if show_panel {
                draw_panel(ctx, driver, frame_ms);
            }
        });
        gpu.paint_ui(&view, &self.egui_ctx, ui_output);

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        if let Err(err) = self.init(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                if let Some(driver) = &mut self.driver {
                    driver.dispose();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size);
                }
                if let Some(driver) = &mut self.driver {
                    driver.resize(new_size.width.max(1), new_size.height.max(1));
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(driver) = &mut self.driver {
                    driver.handle_pointer(PointerEvent::Moved(Vec2::new(
                        position.x as f32,
                        position.y as f32,
                    )));
                }
            }
            WindowEvent::Touch(touch) => {
                if let Some(driver) = &mut self.driver {
                    driver.handle_pointer(pointer_event(&touch));
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match key {
                KeyCode::F1 => self.show_panel = !self.show_panel,
                KeyCode::KeyD => {
                    if let Some(driver) = &mut self.driver {
                        let enabled = driver.debug_enabled();
                        driver.set_debug(!enabled);
                    }
                }
                KeyCode::Escape => event_loop.exit(),
                _ => {}
            },
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("liquidmetal-desktop starting");

    let scene_config = match &cli.config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };

    // Nothing is spawned until every asset is in memory.
    let environment = Cubemap::load(&cli.assets, &cli.face_ext)
        .with_context(|| format!("load environment from {}", cli.assets.display()))?;
    let shader_template = cli.shader.as_ref().map(load_shader_source).transpose()?;
    let settings = RendererSettings {
        sphere_radius: scene_config.sphere_radius,
        shader_template,
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(scene_config, environment, settings);
    event_loop.run_app(&mut app)?;

    match app.failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
