//! WGPU-based rendering engine for the studio preview
//!
//! Owns the device and queue, the window surface (absent when running
//! headless), the depth buffer, global uniforms and the pipeline cache.
//! The icon renderer borrows all of these for offscreen exports.

use std::sync::Arc;
use wgpu::{Device, TextureFormat};

use crate::{
    config::MAX_TEXTURE_SIZE,
    error::Result,
    gfx::{
        resources::{
            global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO},
            material::material_bind_group_layout,
            texture_resource::TextureResource,
        },
        scene::{object::transform_bind_group_layout, DrawObject, Scene, SceneLayouts},
    },
    wgpu_utils::binding_builder::BindGroupLayoutWithDesc,
};

use super::pipeline_manager::{PipelineConfig, PipelineManager};

/// Name of the lit pipeline used for the preview and for exports
pub const SCENE_PIPELINE: &str = "Scene";

/// Converts an sRGB colour as picked in the UI into the clear colour for
/// a target of `format`
///
/// sRGB targets expect linear values and encode on store; other targets
/// store the value untouched.
pub fn clear_color_for(format: TextureFormat, rgba: [f32; 4]) -> wgpu::Color {
    let channel = |c: f32| -> f64 {
        let c = c.clamp(0.0, 1.0) as f64;
        if !format.is_srgb() {
            c
        } else if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };

    wgpu::Color {
        r: channel(rgba[0]),
        g: channel(rgba[1]),
        b: channel(rgba[2]),
        a: rgba[3].clamp(0.0, 1.0) as f64,
    }
}

/// Records the draw calls for the scene model into an open render pass
///
/// Bind group 0 must be compatible with the engine's global layout.
pub fn draw_scene(
    render_pass: &mut wgpu::RenderPass<'_>,
    pipeline: &wgpu::RenderPipeline,
    globals: &wgpu::BindGroup,
    scene: &Scene,
) {
    let Some(object) = &scene.model else {
        return;
    };

    render_pass.set_pipeline(pipeline);
    render_pass.set_bind_group(0, globals, &[]);
    render_pass.draw_object(object, &scene.material_manager, scene.active_override());
}

/// Lit pipeline for the model
///
/// Materials with MTL dissolve below 1 blend over the background, so a
/// translucent model keeps an opaque background opaque in the exported PNG.
pub fn scene_pipeline_config(bind_group_layouts: Vec<wgpu::BindGroupLayout>) -> PipelineConfig {
    // Open meshes are common in game assets, so draw both faces
    PipelineConfig::default()
        .with_label("Scene")
        .with_shader("icon")
        .with_cull_mode(None)
        .with_depth_format(TextureResource::DEPTH_FORMAT)
        .with_blend(Some(wgpu::BlendState::ALPHA_BLENDING))
        .with_bind_group_layouts(bind_group_layouts)
}

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: Option<wgpu::Surface<'static>>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pub pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    transform_layout: BindGroupLayoutWithDesc,
    material_layout: BindGroupLayoutWithDesc,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        let (device, queue) = Self::request_device(&adapter).await?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .unwrap_or(TextureFormat::Bgra8Unorm);
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        log::info!(
            "Render engine on {:?} ({:?}), surface {:?} {}x{}",
            adapter.get_info().name,
            adapter.get_info().backend,
            format,
            config.width,
            config.height
        );

        Ok(Self::from_parts(Some(surface), device, queue, config))
    }

    /// Creates a render engine without a window
    ///
    /// Only offscreen icon rendering is available; frame rendering is a no-op.
    pub async fn new_headless() -> Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;
        let (device, queue) = Self::request_device(&adapter).await?;

        log::info!(
            "Headless render engine on {:?} ({:?})",
            adapter.get_info().name,
            adapter.get_info().backend
        );

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: TextureResource::ICON_FORMAT,
            width: 1,
            height: 1,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        Ok(Self::from_parts(None, device, queue, config))
    }

    async fn request_device(adapter: &wgpu::Adapter) -> Result<(wgpu::Device, wgpu::Queue)> {
        let device = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: MAX_TEXTURE_SIZE,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;
        Ok(device)
    }

    fn from_parts(
        surface: Option<wgpu::Surface<'static>>,
        device: Device,
        queue: wgpu::Queue,
        config: wgpu::SurfaceConfiguration,
    ) -> Self {
        let format = config.format;
        let depth_texture =
            TextureResource::create_depth_texture(&device, config.width, config.height, "depth_texture");

        // GLOBAL UNIFORMS - CAMERA AND LIGHT, NEEDED BY THE PIPELINES
        let global_ubo = GlobalUBO::zeroed(&device, "Preview Globals");
        let global_bindings = GlobalBindings::new(&device, &global_ubo);

        let transform_layout = transform_bind_group_layout(&device);
        let material_layout = material_bind_group_layout(&device);

        let device_handle: Arc<Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader("icon", include_str!("icon.wgsl"));

        pipeline_manager.register_pipeline(
            SCENE_PIPELINE,
            scene_pipeline_config(vec![
                global_bindings.bind_group_layout().clone(),
                transform_layout.layout.clone(),
                material_layout.layout.clone(),
            ]),
        );

        RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            depth_texture,
            format,
            pipeline_manager,
            global_ubo,
            global_bindings,
            transform_layout,
            material_layout,
        }
    }

    /// Layouts the scene uploads its objects and materials against
    pub fn scene_layouts(&self) -> SceneLayouts<'_> {
        SceneLayouts {
            transform: &self.transform_layout,
            material: &self.material_layout,
        }
    }

    /// Uploads pending scene resources to the GPU
    pub fn prepare_scene(&self, scene: &mut Scene) {
        scene.init_gpu_resources(&self.device, &self.queue, &self.scene_layouts());
    }

    /// Updates camera and light uniforms for the preview
    pub fn update(&mut self, scene: &Scene) {
        let aspect = self.config.width as f32 / self.config.height.max(1) as f32;
        let camera = scene.camera_manager.camera.uniform_for_aspect(aspect);
        update_global_ubo(
            &mut self.global_ubo,
            &self.queue,
            camera,
            scene.light_for_camera(),
        );
    }

    /// Renders the scene to the window, then lets `ui_callback` draw on top
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn render_frame<F>(&mut self, scene: &Scene, ui_callback: Option<F>) -> Result<()>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let Some(surface) = &self.surface else {
            return Ok(());
        };

        let surface_texture = match surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface texture timed out, skipping frame");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.pipeline_manager.prepare(SCENE_PIPELINE, self.format)?;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            // The window always shows an opaque background
            let [r, g, b, _] = scene.background;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color_for(self.format, [r, g, b, 1.0])),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(pipeline) = self.pipeline_manager.get_pipeline(SCENE_PIPELINE, self.format) {
                draw_scene(
                    &mut render_pass,
                    pipeline,
                    self.global_bindings.bind_group(),
                    scene,
                );
            }
        }

        // UI overlay (if provided)
        if let Some(ui_callback) = ui_callback {
            ui_callback(
                &self.device,
                &self.queue,
                &mut encoder,
                &surface_texture_view,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Convenience method for rendering with the UI overlay
    pub fn render_frame_with_ui<F>(&mut self, scene: &Scene, ui_callback: F) -> Result<()>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        self.render_frame(scene, Some(ui_callback))
    }

    /// Resizes the surface and recreates the depth buffer
    ///
    /// Zero sized requests (minimised windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;

        if let Some(surface) = &self.surface {
            surface.configure(&self.device, &self.config);
        }

        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, width, height, "depth_texture");
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Returns the surface texture format
    ///
    /// Used for creating compatible render targets and UI systems.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn global_bindings(&self) -> &GlobalBindings {
        &self.global_bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srgb_targets_get_linear_clear_colors() {
        let color = clear_color_for(TextureFormat::Rgba8UnormSrgb, [0.5, 1.0, 0.0, 0.25]);
        assert!((color.r - 0.214).abs() < 1e-3);
        assert_eq!(color.g, 1.0);
        assert_eq!(color.b, 0.0);
        assert_eq!(color.a, 0.25);
    }

    #[test]
    fn scene_pipeline_blends_translucent_materials() {
        let config = scene_pipeline_config(Vec::new());
        assert_eq!(config.blend, Some(wgpu::BlendState::ALPHA_BLENDING));
        assert!(config.cull_mode.is_none());
        assert_eq!(config.depth_format, Some(TextureResource::DEPTH_FORMAT));
    }

    #[test]
    fn other_targets_keep_the_picked_values() {
        let color = clear_color_for(TextureFormat::Bgra8Unorm, [0.5, 2.0, -1.0, 1.0]);
        assert_eq!(color.r, 0.5);
        assert_eq!(color.g, 1.0);
        assert_eq!(color.b, 0.0);
    }
}
