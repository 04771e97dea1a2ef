use glam::{Mat4, Vec3};
use liquidmetal_common::{Camera, EntityId};
use liquidmetal_kernel::Scene;

/// Largest model array a single uniform buffer binding can hold
/// (80-byte entries within the 64 KiB guaranteed binding size).
pub const MAX_MODELS: usize = 512;

/// Errors raised while building shader uniforms.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RenderError {
    #[error("uniform builder holds {builder} models but the shader was built for {shader}")]
    CapacityMismatch { builder: usize, shader: usize },
    #[error("{0} models exceed the uniform array limit of {MAX_MODELS}")]
    CapacityTooLarge(usize),
    #[error("entity {0} in the model array is missing from the scene")]
    MissingEntity(EntityId),
}

/// Implicit-surface kind evaluated by the shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ShapeTag {
    Sphere = 0,
}

impl ShapeTag {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// One slot of the shader's model array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelUniform {
    pub entity: EntityId,
    pub shape: ShapeTag,
    /// World-to-object transform of the entity.
    pub inverse_world: Mat4,
}

/// Camera-derived uniforms, read fresh every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    pub position: Vec3,
    pub projection_inverse: Mat4,
    /// Camera-to-world matrix.
    pub view_inverse: Mat4,
    /// Transpose of the camera-to-world matrix.
    pub normal_matrix: Mat4,
}

impl CameraFrame {
    pub fn from_camera(camera: &Camera) -> Self {
        let view_inverse = camera.world_matrix();
        Self {
            position: camera.position,
            projection_inverse: camera.projection_inverse(),
            view_inverse,
            normal_matrix: view_inverse.transpose(),
        }
    }
}

/// Everything the ray-march shader reads for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformModel {
    pub models: Vec<ModelUniform>,
    pub camera: CameraFrame,
}

impl UniformModel {
    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Builds the per-frame [`UniformModel`] from a fixed slot order.
///
/// Slot `i` always holds the entity at index `i` of the order given at
/// construction. The array is never resized.
#[derive(Debug, Clone)]
pub struct UniformModelBuilder {
    model: UniformModel,
    rebuilds: u64,
}

impl UniformModelBuilder {
    /// Size the array from the dynamic entity order. Every slot starts with
    /// the inverse of the entity's current transform.
    pub fn new(slots: &[EntityId], scene: &Scene, camera: &Camera) -> Result<Self, RenderError> {
        if slots.len() > MAX_MODELS {
            return Err(RenderError::CapacityTooLarge(slots.len()));
        }
        let models = slots
            .iter()
            .map(|&entity| {
                let transform = scene
                    .transform(entity)
                    .ok_or(RenderError::MissingEntity(entity))?;
                Ok(ModelUniform {
                    entity,
                    shape: ShapeTag::Sphere,
                    inverse_world: transform.inverse_matrix(),
                })
            })
            .collect::<Result<Vec<_>, RenderError>>()?;
        tracing::info!(capacity = models.len(), "uniform model sized");
        Ok(Self {
            model: UniformModel {
                models,
                camera: CameraFrame::from_camera(camera),
            },
            rebuilds: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.model.models.len()
    }

    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    pub fn model(&self) -> &UniformModel {
        &self.model
    }

    /// Check that a shader compiled for `shader_models` entries matches.
    pub fn check_shader_capacity(&self, shader_models: usize) -> Result<(), RenderError> {
        if shader_models != self.capacity() {
            return Err(RenderError::CapacityMismatch {
                builder: self.capacity(),
                shader: shader_models,
            });
        }
        Ok(())
    }

    /// Recompute every inverse world matrix and the camera frame.
    ///
    /// Must run after the physics poses have been copied into the scene.
    pub fn rebuild(&mut self, scene: &Scene, camera: &Camera) -> Result<&UniformModel, RenderError> {
        for slot in &mut self.model.models {
            let transform = scene
                .transform(slot.entity)
                .ok_or(RenderError::MissingEntity(slot.entity))?;
            slot.inverse_world = transform.inverse_matrix();
        }
        self.model.camera = CameraFrame::from_camera(camera);
        self.rebuilds += 1;
        Ok(&self.model)
    }
}
