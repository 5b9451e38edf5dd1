use cgmath::*;

use super::camera_utils::OPENGL_TO_WGPU_MATRIX;
use crate::error::SceneError;
use crate::format::{LoadContext, SaveContext, SceneReader, SceneWriter};
use crate::gfx::rendering::backend::{RenderBackend, ShaderSet, Uniform};
use crate::gfx::scene::{NodeClass, NodeKind, Transform, UpdateContext};

/// Perspective camera attached to a node
///
/// The eye sits at the node's global position and looks along the direction its
/// global rotation gives. Only the scene's active camera feeds the shaders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub fovy: Rad<f32>,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fovy: Rad(std::f32::consts::PI / 4.0),
            aspect: 2.0,
            znear: 0.1,
            zfar: 300.0,
        }
    }
}

impl Camera {
    /// Unit vector pointing from the view target back to the eye
    pub fn back_direction(rotation: Vector3<f32>) -> Vector3<f32> {
        let (pitch, yaw) = (rotation.x, rotation.y);
        Vector3::new(
            yaw.sin() * pitch.cos(),
            -pitch.sin(),
            yaw.cos() * pitch.cos(),
        )
    }

    pub fn view_matrix(&self, global: &Transform) -> Matrix4<f32> {
        let eye = Point3::from_vec(global.position);
        let target = eye - Self::back_direction(global.rotation);
        Matrix4::look_at_rh(eye, target, Vector3::unit_y())
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }

    /// Uploads view, projection and eye position to the lighting and skybox shaders
    pub fn apply(&self, global: &Transform, backend: &mut dyn RenderBackend, shaders: &ShaderSet) {
        let view = self.view_matrix(global);
        let projection = self.projection_matrix();
        let eye: [f32; 3] = global.position.into();

        backend.bind_shader(shaders.lighting);
        backend.set_uniform(shaders.lighting, "projection", Uniform::Mat4(projection));
        backend.set_uniform(shaders.lighting, "view", Uniform::Mat4(view));
        backend.set_uniform(shaders.lighting, "viewPos", Uniform::Vec3(eye));

        backend.bind_shader(shaders.skybox);
        backend.set_uniform(shaders.skybox, "projection", Uniform::Mat4(projection));
        backend.set_uniform(shaders.skybox, "view", Uniform::Mat4(view));
        backend.set_uniform(shaders.skybox, "camPos", Uniform::Vec3(eye));
    }
}

impl NodeClass for Camera {
    fn kind(&self) -> NodeKind {
        NodeKind::Camera
    }

    fn load(
        &mut self,
        source: Option<&mut SceneReader<'_>>,
        ctx: &mut LoadContext<'_>,
    ) -> Result<(), SceneError> {
        let Some(source) = source else {
            return Ok(());
        };
        source.expect('(')?;
        let active = source.integer()?;
        source.expect(')')?;
        if active != 0 {
            ctx.claim_active_camera();
        }
        Ok(())
    }

    fn save(&self, writer: &mut SceneWriter, ctx: &SaveContext<'_>) {
        writer.keyword(self.kind().keyword());
        writer.open();
        writer.integer(i64::from(ctx.active_camera == Some(ctx.node)));
        writer.close();
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        self.aspect = ctx.window.aspect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_looks_down_negative_z() {
        let back = Camera::back_direction(Vector3::zero());
        assert!((back - Vector3::unit_z()).magnitude() < 1e-6);
    }

    #[test]
    fn test_view_moves_eye_to_origin() {
        let camera = Camera::default();
        let global = Transform::from_position(Vector3::new(0.0, 2.0, 5.0));
        let eye = camera.view_matrix(&global) * Vector4::new(0.0, 2.0, 5.0, 1.0);
        assert!(eye.truncate().magnitude() < 1e-5);
    }
}
