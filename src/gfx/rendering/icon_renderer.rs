//! Offscreen rendering of icons
//!
//! The scene is drawn into an RGBA8 sRGB texture at `supersample` times the
//! output size, copied into a staging buffer, read back and downsampled
//! to the requested size.

use futures::channel::oneshot;
use image::{imageops, Rgba, Rgba32FImage, RgbaImage};

use super::render_engine::{clear_color_for, draw_scene, RenderEngine, SCENE_PIPELINE};
use crate::{
    config::{validate_output_size, OutputSettings},
    error::{Result, StudioError},
    gfx::{
        resources::{
            global_bindings::{update_global_ubo, GlobalUBO},
            texture_resource::TextureResource,
        },
        scene::Scene,
    },
    wgpu_utils::readback::{padded_bytes_per_row, unpad_rows},
};

const BYTES_PER_PIXEL: u32 = 4;

/// Size and background of one icon render
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IconRequest {
    pub width: u32,
    pub height: u32,
    /// Render scale before downsampling; 1, 2 or 4
    pub supersample: u32,
    /// sRGB background, alpha kept in the PNG
    pub background: [f32; 4],
}

impl IconRequest {
    pub fn validate(&self) -> Result<()> {
        validate_output_size(self.width, self.height, self.supersample)
    }

    /// Size of the texture actually rendered into
    pub fn render_size(&self) -> (u32, u32) {
        (
            self.width * self.supersample,
            self.height * self.supersample,
        )
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

impl From<&OutputSettings> for IconRequest {
    fn from(output: &OutputSettings) -> Self {
        Self {
            width: output.width,
            height: output.height,
            supersample: output.supersample,
            background: output.background,
        }
    }
}

/// Renders the scene into images instead of the window
///
/// Keeps its own camera uniform so exports can use the icon's aspect
/// ratio without disturbing the preview.
pub struct IconRenderer {
    global_ubo: GlobalUBO,
    global_bind_group: wgpu::BindGroup,
}

impl IconRenderer {
    pub fn new(engine: &RenderEngine) -> Self {
        let global_ubo = GlobalUBO::zeroed(engine.device(), "Icon Globals");
        let global_bind_group = engine
            .global_bindings()
            .create_bind_group(engine.device(), &global_ubo);

        Self {
            global_ubo,
            global_bind_group,
        }
    }

    /// Renders one icon with the current camera, model and material
    pub fn render(
        &mut self,
        engine: &mut RenderEngine,
        scene: &mut Scene,
        request: &IconRequest,
    ) -> Result<RgbaImage> {
        request.validate()?;
        let (width, height) = request.render_size();

        engine.prepare_scene(scene);
        engine
            .pipeline_manager
            .prepare(SCENE_PIPELINE, TextureResource::ICON_FORMAT)?;

        let camera = scene.camera_manager.camera.uniform_for_aspect(request.aspect());
        update_global_ubo(
            &mut self.global_ubo,
            engine.queue(),
            camera,
            scene.light_for_camera(),
        );

        let device = engine.device();
        let color_target = TextureResource::create_readback_target(device, width, height, "Icon Target");
        let depth_target = TextureResource::create_depth_texture(device, width, height, "Icon Depth");

        let padded_row = padded_bytes_per_row(width, BYTES_PER_PIXEL);
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Icon Readback Buffer"),
            size: padded_row as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Icon Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Icon Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &color_target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color_for(
                            TextureResource::ICON_FORMAT,
                            request.background,
                        )),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth_target.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            let pipeline = engine
                .pipeline_manager
                .get_pipeline(SCENE_PIPELINE, TextureResource::ICON_FORMAT)
                .ok_or_else(|| StudioError::Pipeline(SCENE_PIPELINE.to_string()))?;
            draw_scene(&mut render_pass, pipeline, &self.global_bind_group, scene);
        }

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &color_target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        engine.queue().submit(std::iter::once(encoder.finish()));

        let pixels = read_back(engine.device(), &staging, width, height)?;
        let image = RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
            StudioError::Readback(format!("pixel buffer does not fit {}x{}", width, height))
        })?;

        log::debug!(
            "Rendered icon {}x{} at x{}",
            request.width,
            request.height,
            request.supersample
        );

        Ok(downsample(image, request.width, request.height))
    }
}

/// Maps the staging buffer and strips the row padding
fn read_back(device: &wgpu::Device, staging: &wgpu::Buffer, width: u32, height: u32) -> Result<Vec<u8>> {
    let slice = staging.slice(..);
    let (tx, rx) = oneshot::channel();
    slice.map_async(wgpu::MapMode::Read, move |res| {
        let _ = tx.send(res);
    });
    device
        .poll(wgpu::PollType::Wait)
        .map_err(|e| StudioError::Readback(e.to_string()))?;

    futures::executor::block_on(rx)
        .map_err(|_| StudioError::Readback("map_async callback dropped".to_string()))?
        .map_err(|e| StudioError::Readback(e.to_string()))?;

    let pixels = {
        let data = slice.get_mapped_range();
        unpad_rows(&data, width, height, BYTES_PER_PIXEL)
    };
    staging.unmap();
    Ok(pixels)
}

/// Scales a supersampled render down to the output size
///
/// Filtering runs on premultiplied alpha, otherwise the colour of fully
/// transparent background pixels bleeds into the silhouette edges.
pub fn downsample(image: RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.width() == width && image.height() == height {
        return image;
    }

    let premultiplied = Rgba32FImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0.map(|c| c as f32 / 255.0);
        Rgba([r * a, g * a, b * a, a])
    });
    let resized = imageops::resize(&premultiplied, width, height, imageops::FilterType::Lanczos3);

    RgbaImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = resized.get_pixel(x, y).0;
        // Lanczos undershoots next to hard edges
        if a <= 0.5 / 255.0 {
            return Rgba([0, 0, 0, 0]);
        }
        let to_byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgba([
            to_byte(r / a),
            to_byte(g / a),
            to_byte(b / a),
            to_byte(a),
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assets::model::{
            load_model,
            tests::{write_fixture, CRATE_MTL, CRATE_OBJ},
        },
        config::StudioConfig,
        gfx::camera::CameraManager,
    };

    /// `None` on machines without a usable GPU adapter
    fn headless_engine() -> Option<RenderEngine> {
        pollster::block_on(RenderEngine::new_headless()).ok()
    }

    fn crate_scene(tag: &str) -> Scene {
        let dir = write_fixture(tag, &[("crate.obj", CRATE_OBJ), ("crate.mtl", CRATE_MTL)]);
        let config = StudioConfig::default();
        let model = load_model(&dir.join("crate.obj"), &config.import).unwrap();
        let _ = std::fs::remove_dir_all(&dir);

        let mut scene = Scene::new(CameraManager::from_config(&config), [0.0; 4]);
        scene.set_model(model);
        scene
    }

    fn covered(image: &RgbaImage) -> usize {
        image.pixels().filter(|p| p[3] > 0).count()
    }

    #[test]
    fn headless_render_draws_the_model() {
        let Some(mut engine) = headless_engine() else {
            return;
        };
        let mut scene = crate_scene("icon_render");
        let mut renderer = IconRenderer::new(&engine);
        let request = IconRequest {
            width: 40,
            height: 24,
            supersample: 2,
            background: [0.0; 4],
        };

        let image = renderer.render(&mut engine, &mut scene, &request).unwrap();

        assert_eq!(image.dimensions(), (40, 24));
        assert_eq!(image.get_pixel(0, 0)[3], 0);
        assert!(covered(&image) > 0);
    }

    #[test]
    fn model_rotation_shows_up_without_a_scene_update() {
        let Some(mut engine) = headless_engine() else {
            return;
        };
        let mut scene = crate_scene("icon_rotation");
        let mut renderer = IconRenderer::new(&engine);
        let request = IconRequest {
            width: 32,
            height: 32,
            supersample: 1,
            background: [0.0; 4],
        };

        let facing = renderer.render(&mut engine, &mut scene, &request).unwrap();
        scene.set_model_rotation(std::f32::consts::FRAC_PI_2, 0.0);
        let turned = renderer.render(&mut engine, &mut scene, &request).unwrap();

        assert_ne!(covered(&facing), covered(&turned));
    }

    #[test]
    fn opaque_background_fills_the_icon() {
        let Some(mut engine) = headless_engine() else {
            return;
        };
        let mut scene = crate_scene("icon_background");
        let mut renderer = IconRenderer::new(&engine);
        let request = IconRequest {
            width: 16,
            height: 16,
            supersample: 1,
            background: [0.0, 0.0, 1.0, 1.0],
        };

        let image = renderer.render(&mut engine, &mut scene, &request).unwrap();
        assert!(image.pixels().all(|p| p[3] == 255));
        assert_eq!(image.get_pixel(0, 0), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn request_from_output_settings() {
        let output = OutputSettings::default();
        let request = IconRequest::from(&output);

        assert_eq!(request.render_size(), (512, 512));
        assert_eq!(request.aspect(), 1.0);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn oversized_requests_are_rejected() {
        let request = IconRequest {
            width: 2048,
            height: 2048,
            supersample: 4,
            background: [0.0; 4],
        };
        assert!(matches!(
            request.validate(),
            Err(StudioError::InvalidOutputSize { supersample: 4, .. })
        ));
    }

    #[test]
    fn downsampling_averages_solid_regions() {
        let image = RgbaImage::from_pixel(8, 4, Rgba([200, 100, 50, 255]));
        let small = downsample(image, 4, 2);

        assert_eq!(small.dimensions(), (4, 2));
        assert_eq!(small.get_pixel(1, 1), &Rgba([200, 100, 50, 255]));
    }

    #[test]
    fn transparent_background_does_not_darken_edges() {
        let image = RgbaImage::from_fn(16, 16, |x, _| {
            if x < 8 {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let small = downsample(image, 8, 8);

        let mut partial = 0;
        for pixel in small.pixels() {
            let [r, g, b, a] = pixel.0;
            if a == 0 {
                continue;
            }
            assert_eq!([r, g, b], [255, 255, 255], "fringe pixel {:?}", pixel);
            if a < 255 {
                partial += 1;
            }
        }
        assert!(partial > 0);
        assert_eq!(small.get_pixel(0, 4)[3], 0);
        assert_eq!(small.get_pixel(7, 4)[3], 255);
    }

    #[test]
    fn same_size_is_untouched() {
        let image = RgbaImage::from_pixel(3, 3, Rgba([1, 2, 3, 4]));
        let same = downsample(image.clone(), 3, 3);
        assert_eq!(same, image);
    }
}
