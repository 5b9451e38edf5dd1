pub mod camera_utils;
pub mod scene_camera;

// Re-export main types
pub use camera_utils::{convert_matrix4_to_array, OPENGL_TO_WGPU_MATRIX};
pub use scene_camera::Camera;
