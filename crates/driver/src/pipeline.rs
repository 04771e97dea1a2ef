use liquidmetal_common::{Camera, EntityId};
use liquidmetal_input::{PointerEvent, PointerRaycaster, Viewport};
use liquidmetal_kernel::Scene;
use liquidmetal_physics::Simulation;
use liquidmetal_render::{RenderError, UniformModel, UniformModelBuilder};
use liquidmetal_tools::DebugView;

use crate::scene::{SceneHandles, build_scene, camera_for};
use crate::{DriverError, SceneConfig};

/// Named steps of one frame, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Input,
    Simulate,
    Sync,
    BuildUniforms,
    Present,
}

impl Stage {
    pub const ORDER: [Stage; 5] = [
        Stage::Input,
        Stage::Simulate,
        Stage::Sync,
        Stage::BuildUniforms,
        Stage::Present,
    ];
}

/// Frame presentation service: consumes the finished scene and uniforms.
pub trait Presenter {
    /// Number of models the presenter's shader was built for.
    fn model_count(&self) -> usize;

    fn present(&mut self, scene: &Scene, model: &UniformModel) -> Result<(), RenderError>;
}

/// Owns the scene, the physics simulation and the uniform builder, and runs
/// one frame per [`tick`](FrameDriver::tick).
pub struct FrameDriver {
    scene: Scene,
    simulation: Simulation,
    handles: SceneHandles,
    builder: UniformModelBuilder,
    raycaster: PointerRaycaster,
    camera: Camera,
    debug_view: DebugView,
    last_stages: Vec<Stage>,
    verified: bool,
}

impl FrameDriver {
    /// Build the scene, size the uniform array from the sealed dynamic list,
    /// attach the raycaster and apply the initial debug state.
    pub fn new(config: &SceneConfig, viewport: Viewport) -> Result<Self, DriverError> {
        let (mut scene, simulation, handles) = build_scene(config)?;
        let mut camera = camera_for(config);
        camera.aspect = viewport.width / viewport.height;

        let builder = UniformModelBuilder::new(
            simulation.registry().dynamic().as_slice(),
            &scene,
            &camera,
        )?;

        let mut raycaster = PointerRaycaster::new();
        raycaster.setup(&camera, viewport);

        let mut debug_view = DebugView::new(config.debug);
        debug_view.set(&mut scene, config.debug);

        Ok(Self {
            scene,
            simulation,
            handles,
            builder,
            raycaster,
            camera,
            debug_view,
            last_stages: Vec::with_capacity(Stage::ORDER.len()),
            verified: false,
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn handles(&self) -> &SceneHandles {
        &self.handles
    }

    pub fn cursor(&self) -> EntityId {
        self.handles.cursor
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Uniform array length, fixed for the lifetime of the driver.
    pub fn model_capacity(&self) -> usize {
        self.builder.capacity()
    }

    /// Uniforms produced by the most recent tick.
    pub fn uniform_model(&self) -> &UniformModel {
        self.builder.model()
    }

    /// Stages executed by the most recent tick.
    pub fn last_stages(&self) -> &[Stage] {
        &self.last_stages
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug_view.enabled()
    }

    pub fn set_debug(&mut self, enabled: bool) {
        self.debug_view.set(&mut self.scene, enabled);
    }

    /// Buffer a pointer event for the next tick's input stage.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        self.raycaster.handle_event(event)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_aspect(width, height);
        self.raycaster.resize(Viewport::new(width, height));
    }

    /// Detach pointer input. Safe to call more than once.
    pub fn dispose(&mut self) {
        self.raycaster.dispose();
    }

    /// Check that the uniform array, the dynamic list and the presenter's
    /// shader all agree on the model count.
    pub fn verify(&self, presenter: &impl Presenter) -> Result<(), DriverError> {
        let dynamic = self.simulation.registry().dynamic().len();
        let uniforms = self.builder.capacity();
        if dynamic != uniforms {
            return Err(DriverError::DynamicCountMismatch { dynamic, uniforms });
        }
        self.builder.check_shader_capacity(presenter.model_count())?;
        Ok(())
    }

    /// Run one frame with a variable step of `dt` seconds.
    pub fn tick(&mut self, dt: f32, presenter: &mut impl Presenter) -> Result<(), DriverError> {
        if !self.verified {
            self.verify(&*presenter)?;
            self.verified = true;
        }
        self.last_stages.clear();
        for stage in Stage::ORDER {
            self.run_stage(stage, dt, presenter)?;
            self.last_stages.push(stage);
        }
        Ok(())
    }

    fn run_stage(
        &mut self,
        stage: Stage,
        dt: f32,
        presenter: &mut impl Presenter,
    ) -> Result<(), DriverError> {
        match stage {
            Stage::Input => {
                self.raycaster.update_camera(&self.camera);
                let target = self.raycaster.position();
                let cursor = self.handles.cursor;
                if let Some(entity) = self.scene.get_mut(cursor) {
                    entity.transform.position = target;
                }
                self.simulation.push_pose(&self.scene, cursor);
            }
            Stage::Simulate => self.simulation.simulate(dt),
            Stage::Sync => {
                self.simulation.sync(&mut self.scene);
                self.scene.advance_tick();
            }
            Stage::BuildUniforms => {
                self.builder.rebuild(&self.scene, &self.camera)?;
            }
            Stage::Present => presenter.present(&self.scene, self.builder.model())?,
        }
        Ok(())
    }
}
