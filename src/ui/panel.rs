// src/ui/panel.rs
//! The icon studio control panel
//!
//! The panel edits camera, model rotation and background directly on the
//! scene. Anything that touches the filesystem, the clipboard or the loader
//! is returned as a [`PanelAction`] for the application to carry out.

use std::path::PathBuf;

use cgmath::Deg;
use imgui::{Condition, SliderFlags, TreeNodeFlags, Ui};

use crate::{
    config::{OutputSettings, FOV_RANGE_DEGREES, MAX_TEXTURE_SIZE},
    gfx::scene::Scene,
};

/// Supersampling factors offered in the panel
pub const SUPERSAMPLE_FACTORS: [u32; 3] = [1, 2, 4];
const SUPERSAMPLE_LABELS: [&str; 3] = ["1x", "2x", "4x"];

/// Requests from the panel that the application has to carry out
#[derive(Debug, Clone, PartialEq)]
pub enum PanelAction {
    BrowseModel,
    LoadModel(PathBuf),
    BrowseMaterial,
    ApplyMaterial {
        path: PathBuf,
        /// Entry in the MTL library; the first one when `None`
        name: Option<String>,
    },
    UseModelMaterial,
    FrameModel,
    ResetCamera,
    BrowseOutput,
    ExportPng,
    CopyToClipboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Busy,
    Error,
}

/// Status line shown at the bottom of the panel
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub level: StatusLevel,
    pub message: String,
}

impl Status {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            message: message.into(),
        }
    }

    pub fn busy(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Busy,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            message: message.into(),
        }
    }

    fn color(&self) -> [f32; 4] {
        match self.level {
            StatusLevel::Info => [0.6, 0.9, 0.6, 1.0],
            StatusLevel::Busy => [1.0, 0.85, 0.3, 1.0],
            StatusLevel::Error => [1.0, 0.4, 0.4, 1.0],
        }
    }
}

/// Text fields and output options edited in the panel
#[derive(Debug, Clone)]
pub struct PanelState {
    pub model_path: String,
    pub material_path: String,
    /// Optional entry name inside the MTL library
    pub material_name: String,
    pub output_path: String,
    pub output_width: i32,
    pub output_height: i32,
    pub supersample_index: usize,
    pub copy_to_clipboard: bool,
    pub status: Status,
}

impl PanelState {
    pub fn new(output: &OutputSettings) -> Self {
        let supersample_index = SUPERSAMPLE_FACTORS
            .iter()
            .position(|&f| f == output.supersample)
            .unwrap_or(1);

        Self {
            model_path: String::new(),
            material_path: String::new(),
            material_name: String::new(),
            output_path: output.path.display().to_string(),
            output_width: output.width as i32,
            output_height: output.height as i32,
            supersample_index,
            copy_to_clipboard: output.copy_to_clipboard,
            status: Status::info("Pick a model to start"),
        }
    }

    pub fn supersample(&self) -> u32 {
        SUPERSAMPLE_FACTORS
            .get(self.supersample_index)
            .copied()
            .unwrap_or(1)
    }

    /// Output settings as currently entered, with the scene's background
    pub fn output_settings(&self, background: [f32; 4]) -> OutputSettings {
        OutputSettings {
            width: self.output_width.max(1) as u32,
            height: self.output_height.max(1) as u32,
            supersample: self.supersample(),
            background,
            path: PathBuf::from(self.output_path.trim()),
            copy_to_clipboard: self.copy_to_clipboard,
        }
    }

    fn material_name(&self) -> Option<String> {
        let name = self.material_name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}

/// Draws the studio panel and returns what the user asked for this frame
pub fn icon_panel(ui: &Ui, state: &mut PanelState, scene: &mut Scene) -> Vec<PanelAction> {
    let mut actions = Vec::new();

    let display_size = ui.io().display_size;
    // Guard against invalid display size that could cause crashes
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return actions;
    }
    let panel_width = (display_size[0] * 0.3).clamp(360.0, 480.0);
    let panel_height = (display_size[1] - 40.0).max(400.0);

    ui.window("Icon Studio")
        .size([panel_width, panel_height], Condition::FirstUseEver)
        .position([20.0, 20.0], Condition::FirstUseEver)
        .resizable(true)
        .collapsible(true)
        .build(|| {
            render_asset_controls(ui, state, &mut actions);
            render_camera_controls(ui, scene, &mut actions);
            render_model_controls(ui, scene);
            render_output_controls(ui, state, scene, &mut actions);
            ui.separator();
            render_status(ui, state, scene);
        });

    actions
}

fn render_asset_controls(ui: &Ui, state: &mut PanelState, actions: &mut Vec<PanelAction>) {
    if !ui.collapsing_header("Assets", TreeNodeFlags::DEFAULT_OPEN) {
        return;
    }

    ui.text("Model (OBJ)");
    ui.set_next_item_width(-170.0);
    let submitted = ui
        .input_text("##model_path", &mut state.model_path)
        .enter_returns_true(true)
        .build();
    ui.same_line();
    if ui.button("Browse##model") {
        actions.push(PanelAction::BrowseModel);
    }
    ui.same_line();
    if (ui.button("Load") || submitted) && !state.model_path.trim().is_empty() {
        actions.push(PanelAction::LoadModel(PathBuf::from(state.model_path.trim())));
    }

    ui.spacing();
    ui.text("Material (MTL)");
    ui.set_next_item_width(-170.0);
    ui.input_text("##material_path", &mut state.material_path)
        .build();
    ui.same_line();
    if ui.button("Browse##material") {
        actions.push(PanelAction::BrowseMaterial);
    }
    ui.same_line();
    if ui.button("Apply") && !state.material_path.trim().is_empty() {
        actions.push(PanelAction::ApplyMaterial {
            path: PathBuf::from(state.material_path.trim()),
            name: state.material_name(),
        });
    }
    ui.set_next_item_width(-170.0);
    ui.input_text("Entry##material_name", &mut state.material_name)
        .hint("first in library")
        .build();
    if ui.button("Use model material") {
        actions.push(PanelAction::UseModelMaterial);
    }
    ui.spacing();
}

fn render_camera_controls(ui: &Ui, scene: &mut Scene, actions: &mut Vec<PanelAction>) {
    if !ui.collapsing_header("Camera", TreeNodeFlags::DEFAULT_OPEN) {
        return;
    }

    let camera = &mut scene.camera_manager.camera;
    let bounds = camera.bounds;

    let mut yaw = camera.yaw.to_degrees();
    if ui.slider("Yaw", -180.0, 180.0, &mut yaw) {
        camera.set_yaw(yaw.to_radians());
    }

    let mut pitch = camera.pitch.to_degrees();
    if ui.slider(
        "Pitch",
        bounds.min_pitch.to_degrees(),
        bounds.max_pitch.to_degrees(),
        &mut pitch,
    ) {
        camera.set_pitch(pitch.to_radians());
    }

    let mut distance = camera.distance;
    if ui
        .slider_config("Distance", bounds.min_distance, bounds.max_distance)
        .flags(SliderFlags::LOGARITHMIC)
        .build(&mut distance)
    {
        camera.set_distance(distance);
    }

    let (min_fov, max_fov) = FOV_RANGE_DEGREES;
    let mut fov = Deg::from(camera.fovy).0;
    if ui.slider("FOV", min_fov, max_fov, &mut fov) {
        camera.set_fov(Deg(fov));
    }

    if ui.button("Frame model") {
        actions.push(PanelAction::FrameModel);
    }
    ui.same_line();
    if ui.button("Reset camera") {
        actions.push(PanelAction::ResetCamera);
    }
    ui.spacing();
}

fn render_model_controls(ui: &Ui, scene: &mut Scene) {
    if !ui.collapsing_header("Model rotation", TreeNodeFlags::DEFAULT_OPEN) {
        return;
    }

    let rotation = scene.model_rotation;
    let mut yaw = rotation.yaw.to_degrees();
    let mut pitch = rotation.pitch.to_degrees();
    let limit = crate::gfx::camera::ModelRotation::PITCH_LIMIT.to_degrees();

    let mut changed = ui.slider("Model yaw", -180.0, 180.0, &mut yaw);
    changed |= ui.slider("Model pitch", -limit, limit, &mut pitch);
    if changed {
        scene.set_model_rotation(yaw.to_radians(), pitch.to_radians());
    }
    if ui.button("Reset rotation") {
        scene.set_model_rotation(0.0, 0.0);
    }
    ui.checkbox("Light follows camera", &mut scene.light_follows_camera);
    ui.spacing();
}

fn render_output_controls(
    ui: &Ui,
    state: &mut PanelState,
    scene: &mut Scene,
    actions: &mut Vec<PanelAction>,
) {
    if !ui.collapsing_header("Output", TreeNodeFlags::DEFAULT_OPEN) {
        return;
    }

    ui.color_edit4("Background", &mut scene.background);

    let max_edge = MAX_TEXTURE_SIZE as i32;
    if ui.input_int("Width", &mut state.output_width).build() {
        state.output_width = state.output_width.clamp(1, max_edge);
    }
    if ui.input_int("Height", &mut state.output_height).build() {
        state.output_height = state.output_height.clamp(1, max_edge);
    }
    ui.combo_simple_string(
        "Supersample",
        &mut state.supersample_index,
        &SUPERSAMPLE_LABELS,
    );

    ui.text("Output path");
    ui.set_next_item_width(-90.0);
    ui.input_text("##output_path", &mut state.output_path)
        .build();
    ui.same_line();
    if ui.button("Browse##output") {
        actions.push(PanelAction::BrowseOutput);
    }
    ui.checkbox("Also copy to clipboard", &mut state.copy_to_clipboard);

    ui.spacing();
    if ui.button("Export PNG") {
        actions.push(PanelAction::ExportPng);
    }
    ui.same_line();
    if ui.button("Copy to clipboard") {
        actions.push(PanelAction::CopyToClipboard);
    }
    ui.spacing();
}

fn render_status(ui: &Ui, state: &PanelState, scene: &Scene) {
    ui.text_colored(state.status.color(), &state.status.message);

    let stats = scene.statistics();
    match &stats.model_name {
        Some(name) => {
            ui.text(format!("Model: {}", name));
            ui.text(format!(
                "Triangles: {}  Vertices: {}  Meshes: {}",
                stats.total_triangles, stats.total_vertices, stats.mesh_count
            ));
            ui.text(format!(
                "Size: {:.1} x {:.1} x {:.1}",
                stats.size.x, stats.size.y, stats.size.z
            ));
        }
        None => ui.text_disabled("No model loaded"),
    }
    if let Some(material) = &scene.material_override {
        ui.text(format!("Material: {}", material));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::StudioConfig, gfx::camera::CameraManager};

    #[test]
    fn state_follows_output_settings() {
        let output = OutputSettings {
            supersample: 4,
            ..OutputSettings::default()
        };
        let state = PanelState::new(&output);

        assert_eq!(state.supersample(), 4);
        assert_eq!(state.output_width, 256);
        assert_eq!(
            state.output_settings(output.background),
            OutputSettings {
                supersample: 4,
                ..OutputSettings::default()
            }
        );
    }

    #[test]
    fn unknown_supersample_falls_back_to_2x() {
        let output = OutputSettings {
            supersample: 3,
            ..OutputSettings::default()
        };
        assert_eq!(PanelState::new(&output).supersample(), 2);
    }

    #[test]
    fn blank_material_name_means_first_entry() {
        let mut state = PanelState::new(&OutputSettings::default());
        state.material_name = "  ".into();
        assert_eq!(state.material_name(), None);
        state.material_name = " Gold ".into();
        assert_eq!(state.material_name().as_deref(), Some("Gold"));
    }

    #[test]
    fn idle_frame_requests_nothing() {
        let mut context = imgui::Context::create();
        context.set_ini_filename(None);
        context.io_mut().display_size = [1280.0, 800.0];
        context.fonts().build_rgba32_texture();

        let config = StudioConfig::default();
        let mut scene = Scene::new(CameraManager::from_config(&config), [0.0; 4]);
        let mut state = PanelState::new(&config.output);

        let ui = context.frame();
        let actions = icon_panel(ui, &mut state, &mut scene);
        context.render();

        assert!(actions.is_empty());
    }
}
