//! Render pipeline management for wgpu
//!
//! Pipelines are registered once with everything except the colour format
//! and created lazily per target format: the preview swapchain and the
//! icon render target use different formats but the same shader.

use std::{collections::HashMap, sync::Arc};
use wgpu::*;

use crate::{
    error::{Result, StudioError},
    gfx::scene::vertex::Vertex3D,
};

/// Configuration for creating a render pipeline
///
/// Defines all parameters needed to create a wgpu render pipeline except
/// the colour target format, which is supplied when the pipeline is
/// requested.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub shader: String,
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub primitive_topology: PrimitiveTopology,
    pub cull_mode: Option<Face>,
    pub depth_format: Option<TextureFormat>,
    pub blend: Option<BlendState>,
    pub multisample: MultisampleState,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Default Pipeline".to_string(),
            shader: "icon".to_string(),
            bind_group_layouts: Vec::new(),
            primitive_topology: PrimitiveTopology::TriangleList,
            cull_mode: Some(Face::Back),
            depth_format: None,
            blend: Some(BlendState::REPLACE),
            multisample: MultisampleState::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    pub fn with_cull_mode(mut self, face: Option<Face>) -> Self {
        self.cull_mode = face;
        self
    }

    /// Sets the shader for this pipeline (builder pattern)
    pub fn with_shader(mut self, shader: &str) -> Self {
        self.shader = shader.to_string();
        self
    }

    /// Sets all bind group layouts at once (builder pattern)
    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    /// Enables depth testing against a buffer of `format`
    pub fn with_depth_format(mut self, format: TextureFormat) -> Self {
        self.depth_format = Some(format);
        self
    }

    pub fn with_blend(mut self, blend: Option<BlendState>) -> Self {
        self.blend = blend;
        self
    }
}

/// Fragment entry point for a colour target
///
/// sRGB targets encode on store; everything else gets the shader variant
/// that applies the transfer curve itself.
pub fn fragment_entry_point(format: TextureFormat) -> &'static str {
    if format.is_srgb() {
        "fs_main"
    } else {
        "fs_main_encode"
    }
}

/// Manages render pipelines with caching and lazy creation
///
/// Pipelines are only created when first requested for a format.
pub struct PipelineManager {
    device: Arc<Device>,
    pipelines: HashMap<(String, TextureFormat), RenderPipeline>,
    pipeline_configs: HashMap<String, PipelineConfig>,
    shader_modules: HashMap<String, ShaderModule>,
}

impl PipelineManager {
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            pipelines: HashMap::new(),
            pipeline_configs: HashMap::new(),
            shader_modules: HashMap::new(),
        }
    }

    /// Registers a pipeline configuration without creating it
    ///
    /// Replaces any earlier registration and drops pipelines built from it.
    pub fn register_pipeline(&mut self, name: &str, config: PipelineConfig) {
        self.pipelines.retain(|(pipeline, _), _| pipeline != name);
        self.pipeline_configs.insert(name.to_string(), config);
    }

    /// Compiles a WGSL shader module
    pub fn load_shader(&mut self, name: &str, source: &str) {
        let shader_module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });
        self.shader_modules.insert(name.to_string(), shader_module);
    }

    /// Creates the pipeline for `format` unless it is already cached
    pub fn prepare(&mut self, name: &str, format: TextureFormat) -> Result<()> {
        let key = (name.to_string(), format);
        if self.pipelines.contains_key(&key) {
            return Ok(());
        }

        let config = self
            .pipeline_configs
            .get(name)
            .ok_or_else(|| StudioError::Pipeline(name.to_string()))?;
        let pipeline = self.create_pipeline_from_config(name, config, format)?;

        log::debug!("Created pipeline '{}' for {:?}", name, format);
        self.pipelines.insert(key, pipeline);
        Ok(())
    }

    /// Gets a pipeline created earlier by [`prepare`](Self::prepare)
    pub fn get_pipeline(&self, name: &str, format: TextureFormat) -> Option<&RenderPipeline> {
        self.pipelines.get(&(name.to_string(), format))
    }

    fn create_pipeline_from_config(
        &self,
        name: &str,
        config: &PipelineConfig,
        format: TextureFormat,
    ) -> Result<RenderPipeline> {
        let shader = self.shader_modules.get(&config.shader).ok_or_else(|| {
            StudioError::Pipeline(format!("{} (shader '{}' not loaded)", name, config.shader))
        })?;

        let bind_group_layout_refs: Vec<&BindGroupLayout> =
            config.bind_group_layouts.iter().collect();
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some(&format!("{} Layout", name)),
                bind_group_layouts: &bind_group_layout_refs,
                push_constant_ranges: &[],
            });

        let depth_stencil = config.depth_format.map(|format| DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        });

        let color_targets = [Some(ColorTargetState {
            format,
            blend: config.blend,
            write_mask: ColorWrites::ALL,
        })];

        let pipeline = self
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(&format!("{} ({:?})", config.label, format)),
                layout: Some(&pipeline_layout),
                vertex: VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex3D::desc()],
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment: Some(FragmentState {
                    module: shader,
                    entry_point: Some(fragment_entry_point(format)),
                    targets: &color_targets,
                    compilation_options: PipelineCompilationOptions::default(),
                }),
                primitive: PrimitiveState {
                    topology: config.primitive_topology,
                    strip_index_format: None,
                    front_face: FrontFace::Ccw,
                    cull_mode: config.cull_mode,
                    polygon_mode: PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil,
                multisample: config.multisample,
                multiview: None,
                cache: None,
            });

        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srgb_targets_use_the_plain_entry_point() {
        assert_eq!(fragment_entry_point(TextureFormat::Rgba8UnormSrgb), "fs_main");
        assert_eq!(fragment_entry_point(TextureFormat::Bgra8UnormSrgb), "fs_main");
        assert_eq!(fragment_entry_point(TextureFormat::Bgra8Unorm), "fs_main_encode");
    }

    #[test]
    fn config_builder() {
        let config = PipelineConfig::default()
            .with_label("Icon")
            .with_cull_mode(None)
            .with_depth_format(TextureFormat::Depth32Float)
            .with_blend(None);

        assert_eq!(config.label, "Icon");
        assert_eq!(config.shader, "icon");
        assert!(config.cull_mode.is_none());
        assert_eq!(config.depth_format, Some(TextureFormat::Depth32Float));
        assert!(config.blend.is_none());
    }
}
