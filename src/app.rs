use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    assets::{load_material, LoadEvent, ModelLoader},
    config::StudioConfig,
    error::Result,
    export::{export_icon, ExportTarget, SystemClipboard},
    gfx::{
        camera::camera_utils::CameraManager,
        rendering::{IconRenderer, RenderEngine},
        scene::Scene,
    },
    ui::{icon_panel, EventRoute, PanelAction, PanelState, Status, UiManager},
};

/// The icon studio application
///
/// Owns the winit event loop; [`run`](Self::run) blocks until the window
/// is closed.
pub struct IconStudioApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: StudioConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    icon_renderer: Option<IconRenderer>,
    ui_manager: Option<UiManager>,
    scene: Scene,
    panel: PanelState,
    loader: ModelLoader,
    clipboard: SystemClipboard,
}

impl IconStudioApp {
    pub fn new(config: StudioConfig) -> Result<Self> {
        let event_loop = EventLoop::new()?;

        let camera_manager = CameraManager::from_config(&config);
        let scene = Scene::new(camera_manager, config.output.background);

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                window: None,
                render_engine: None,
                icon_renderer: None,
                ui_manager: None,
                scene,
                panel: PanelState::new(&config.output),
                loader: ModelLoader::new(config.import.clone()),
                clipboard: SystemClipboard::new(),
                config,
            },
        })
    }

    /// Starts loading a model before the window opens
    pub fn load_model(&mut self, path: impl AsRef<Path>) {
        self.app_state.request_model(path.as_ref().to_path_buf());
    }

    /// Run the application (consumes self and starts the event loop)
    pub fn run(mut self) -> Result<()> {
        let Some(event_loop) = self.event_loop.take() else {
            return Ok(());
        };
        event_loop.set_control_flow(ControlFlow::Wait);
        event_loop.run_app(&mut self.app_state)?;
        Ok(())
    }
}

impl AppState {
    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn request_model(&mut self, path: PathBuf) {
        self.panel.model_path = path.display().to_string();
        self.panel.status = Status::busy(format!("Loading {}", path.display()));
        self.loader.request(path);
    }

    /// Applies the result of the most recent model load
    fn poll_loader(&mut self) {
        let Some(event) = self.loader.poll() else {
            return;
        };

        match event {
            LoadEvent::Loaded(model) => {
                self.panel.status = Status::info(format!(
                    "Loaded {} ({} triangles)",
                    model.name,
                    model.triangle_count()
                ));
                self.scene.set_model(model);
            }
            LoadEvent::Failed { path, error } => {
                log::error!("Loading {} failed: {}", path.display(), error);
                self.panel.status = Status::error(error.to_string());
            }
        }
        self.request_redraw();
    }

    fn apply_material(&mut self, path: PathBuf, name: Option<String>) {
        match load_material(&path, name.as_deref()) {
            Ok(material) => {
                self.panel.status = Status::info(format!("Material {}", material.name));
                self.scene.set_material(material);
            }
            Err(err) => {
                log::warn!("Material not applied: {}", err);
                self.panel.status = Status::error(err.to_string());
            }
        }
    }

    fn export(&mut self, target: ExportTarget) {
        let output = self.panel.output_settings(self.scene.background);
        let (Some(engine), Some(renderer)) =
            (self.render_engine.as_mut(), self.icon_renderer.as_mut())
        else {
            return;
        };

        if !self.scene.has_model() {
            log::warn!("Exporting an icon without a model");
        }

        let result = export_icon(
            engine,
            renderer,
            &mut self.scene,
            &output,
            &target,
            &mut self.clipboard,
        );
        self.panel.status = match result {
            Ok(report) => Status::info(report.summary()),
            Err(err) => {
                log::error!("Export failed: {}", err);
                Status::error(format!("Export failed: {}", err))
            }
        };
    }

    fn handle_action(&mut self, action: PanelAction) {
        log::debug!("Panel action: {:?}", action);

        match action {
            PanelAction::BrowseModel => {
                if let Some(path) = rfd::FileDialog::new()
                    .set_title("Open model")
                    .add_filter("Wavefront OBJ", &["obj"])
                    .pick_file()
                {
                    self.request_model(path);
                }
            }
            PanelAction::LoadModel(path) => self.request_model(path),
            PanelAction::BrowseMaterial => {
                if let Some(path) = rfd::FileDialog::new()
                    .set_title("Open material library")
                    .add_filter("Wavefront MTL", &["mtl"])
                    .pick_file()
                {
                    self.panel.material_path = path.display().to_string();
                    let name = Some(self.panel.material_name.trim().to_string())
                        .filter(|n| !n.is_empty());
                    self.apply_material(path, name);
                }
            }
            PanelAction::ApplyMaterial { path, name } => self.apply_material(path, name),
            PanelAction::UseModelMaterial => {
                self.scene.clear_material_override();
                self.panel.status = Status::info("Using the model's materials");
            }
            PanelAction::FrameModel => self.scene.frame_model(),
            PanelAction::ResetCamera => self.scene.reset_camera(),
            PanelAction::BrowseOutput => {
                if let Some(path) = rfd::FileDialog::new()
                    .set_title("Save icon as")
                    .add_filter("PNG image", &["png"])
                    .set_file_name("icon.png")
                    .save_file()
                {
                    self.panel.output_path = path.display().to_string();
                }
            }
            PanelAction::ExportPng => {
                let output = self.panel.output_settings(self.scene.background);
                self.export(ExportTarget::file(&output));
            }
            PanelAction::CopyToClipboard => self.export(ExportTarget::clipboard_only()),
        }
    }

    fn redraw(&mut self) {
        // Build the UI first; its actions may change what gets drawn
        let actions = {
            let (Some(window), Some(ui_manager)) = (self.window.as_ref(), self.ui_manager.as_mut())
            else {
                return;
            };
            let panel = &mut self.panel;
            let scene = &mut self.scene;
            ui_manager.build_frame(window, |ui| icon_panel(ui, panel, scene))
        };

        for action in actions {
            self.handle_action(action);
        }

        let (Some(render_engine), Some(ui_manager)) =
            (self.render_engine.as_mut(), self.ui_manager.as_mut())
        else {
            return;
        };

        self.scene.update();
        render_engine.prepare_scene(&mut self.scene);
        render_engine.update(&self.scene);

        let mut ui_drawn = false;
        let result = render_engine.render_frame_with_ui(
            &self.scene,
            |device, queue, encoder, color_attachment| {
                ui_manager.draw_overlay(device, queue, encoder, color_attachment);
                ui_drawn = true;
            },
        );
        if !ui_drawn {
            ui_manager.discard_frame();
        }
        if let Err(err) = result {
            log::error!("Frame failed: {}", err);
        }
    }

    fn handle_dropped_file(&mut self, path: PathBuf) {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("obj") => self.request_model(path),
            Some("mtl") => {
                self.panel.material_path = path.display().to_string();
                self.apply_material(path, None);
            }
            _ => {
                log::warn!("Ignoring dropped file {}", path.display());
                self.panel.status = Status::error(format!("Not an OBJ or MTL file: {}", path.display()));
            }
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title("Icon Studio")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {}", err);
                event_loop.exit();
                return;
            }
        };

        let (width, height) = window.inner_size().into();
        let renderer = match pollster::block_on(RenderEngine::new(window.clone(), width, height)) {
            Ok(renderer) => renderer,
            Err(err) => {
                log::error!("Failed to initialise rendering: {}", err);
                event_loop.exit();
                return;
            }
        };

        self.scene
            .camera_manager
            .camera
            .resize_projection(width, height);

        let mut ui_manager = UiManager::new(
            renderer.device(),
            renderer.queue(),
            renderer.surface_format(),
            &window,
        );
        ui_manager.update_display_size(width, height);

        self.icon_renderer = Some(IconRenderer::new(&renderer));
        self.ui_manager = Some(ui_manager);
        self.render_engine = Some(renderer);
        self.window = Some(window);
        self.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };

        // Handle UI input first
        let route = match self.ui_manager.as_mut() {
            Some(ui_manager) => ui_manager.route_window_event(&window, window_id, &event),
            None => EventRoute::Camera,
        };
        if route != EventRoute::Camera {
            if route.reaches_camera() {
                self.scene.camera_manager.process_window_event(&event);
            }
            window.request_redraw();
            return;
        }

        if self.scene.camera_manager.process_window_event(&event) {
            window.request_redraw();
        }

        match event {
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.scene
                    .camera_manager
                    .camera
                    .resize_projection(width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
                window.request_redraw();
            }
            WindowEvent::DroppedFile(path) => {
                self.handle_dropped_file(path);
                window.request_redraw();
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        // Check if UI wants to capture input before processing camera events
        if self
            .ui_manager
            .as_ref()
            .is_some_and(|ui_manager| ui_manager.wants_mouse())
        {
            return;
        }

        let scene = &mut self.scene;
        if scene
            .camera_manager
            .process_device_event(&event, &mut scene.model_rotation)
        {
            self.request_redraw();
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        self.poll_loader();
        // Keep polling while a load is in flight
        if self.loader.is_loading() {
            self.request_redraw();
        }
    }
}
