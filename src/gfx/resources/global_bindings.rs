//! Global uniform bindings for camera and light data
//!
//! Manages GPU uniform buffers and bind groups for global rendering state
//! that is shared across all meshes in a scene: camera matrices and the
//! key light.

use crate::{
    gfx::camera::camera_utils::CameraUniform,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Global uniform buffer content structure
///
/// MUST match the Globals struct in `icon.wgsl` exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUBOContent {
    view_position: [f32; 4],  // Camera position (homogeneous coordinates)
    view_proj: [[f32; 4]; 4], // Camera view-projection matrix

    light_direction: [f32; 3], // Unit vector towards the light
    light_intensity: f32,
    light_color: [f32; 3],
    ambient: f32,
}

/// Directional key light
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LightConfig {
    /// World-space direction pointing towards the light
    pub direction: [f32; 3],
    pub color: [f32; 3],
    pub intensity: f32,
    /// Flat light added everywhere so unlit sides keep some detail
    pub ambient: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            direction: [0.4, 0.6, 0.7],
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            ambient: 0.25,
        }
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// Updates the global uniform buffer with camera and light data
///
/// Called before every draw, both for the preview and for icon exports.
pub fn update_global_ubo(
    ubo: &mut GlobalUBO,
    queue: &wgpu::Queue,
    camera: CameraUniform,
    light: LightConfig,
) {
    let content = GlobalUBOContent {
        view_position: camera.view_position,
        view_proj: camera.view_proj,
        light_direction: light.direction,
        light_intensity: light.intensity,
        light_color: light.color,
        ambient: light.ambient,
    };

    ubo.write(queue, content);
}

/// Manages bind group layouts and bind groups for global uniforms
///
/// This is bound to slot 0 in all render pipelines.
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, ubo: &GlobalUBO) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform()) // Global uniforms (camera + light)
            .create(device, "Globals Bind Group");

        let bind_group = BindGroupBuilder::new(&bind_group_layout)
            .resource(ubo.binding_resource())
            .create(device, "Global Bind Group");

        GlobalBindings {
            bind_group_layout,
            bind_group,
        }
    }

    /// Binds another uniform buffer with the same layout, so passes with
    /// their own camera can share the pipelines.
    pub fn create_bind_group(&self, device: &wgpu::Device, ubo: &GlobalUBO) -> wgpu::BindGroup {
        BindGroupBuilder::new(&self.bind_group_layout)
            .resource(ubo.binding_resource())
            .create(device, "Global Bind Group")
    }

    /// Used when creating render pipelines that need access to global uniforms.
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_matches_shader_layout() {
        // vec4 + mat4x4 + (vec3, f32) + (vec3, f32)
        assert_eq!(std::mem::size_of::<GlobalUBOContent>(), 16 + 64 + 16 + 16);
    }
}
