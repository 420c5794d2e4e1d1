// src/ui/manager.rs
//! Dear ImGui hosting for the studio window
//!
//! Decides which window events belong to the panel and which to the orbit
//! camera, builds one panel frame per redraw and draws it over the preview.

use imgui::{Context, FontConfig, FontSource, MouseCursor};
use imgui_wgpu::{Renderer, RendererConfig};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use std::time::Instant;
use wgpu::{CommandEncoder, Device, Queue, TextureFormat, TextureView};
use winit::{
    event::{ElementState, Event, WindowEvent},
    window::{Window, WindowId},
};

const FONT_SIZE: f32 = 18.0;

/// Who gets a window event after the UI has seen it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventRoute {
    /// The panel consumed it
    Ui,
    /// The panel is not interested; camera controls may use it
    Camera,
    /// The panel consumed it but the camera still has to see it, so a drag
    /// that ends over the panel does not keep orbiting
    Both,
}

impl EventRoute {
    pub fn reaches_camera(self) -> bool {
        self != EventRoute::Ui
    }
}

/// Routing policy given whether ImGui wants the input
pub fn route_for(event: &WindowEvent, ui_captured: bool) -> EventRoute {
    if !ui_captured {
        return EventRoute::Camera;
    }
    match event {
        WindowEvent::MouseInput {
            state: ElementState::Released,
            ..
        }
        | WindowEvent::ModifiersChanged(_)
        | WindowEvent::Focused(false) => EventRoute::Both,
        _ => EventRoute::Ui,
    }
}

/// Whether ImGui needs to see `event` at all
fn is_ui_input(event: &WindowEvent) -> bool {
    matches!(
        event,
        WindowEvent::CursorMoved { .. }
            | WindowEvent::CursorLeft { .. }
            | WindowEvent::MouseInput { .. }
            | WindowEvent::MouseWheel { .. }
            | WindowEvent::KeyboardInput { .. }
            | WindowEvent::Ime(_)
            | WindowEvent::ModifiersChanged(_)
            | WindowEvent::Focused(_)
    )
}

/// ImGui context, winit platform glue and the wgpu renderer for the panel
pub struct UiManager {
    context: Context,
    platform: WinitPlatform,
    renderer: Renderer,
    last_frame: Instant,
    last_cursor: Option<MouseCursor>,
}

impl UiManager {
    /// The panel is drawn straight into the swapchain, so `format` must be
    /// the surface format. DPI scaling is locked to 1.
    pub fn new(device: &Device, queue: &Queue, format: TextureFormat, window: &Window) -> Self {
        let mut context = Context::create();
        context.set_ini_filename(None);

        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(context.io_mut(), window, HiDpiMode::Locked(1.0));

        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: FONT_SIZE,
                ..Default::default()
            }),
        }]);

        let renderer = Renderer::new(
            &mut context,
            device,
            queue,
            RendererConfig {
                texture_format: format,
                ..Default::default()
            },
        );

        Self {
            context,
            platform,
            renderer,
            last_frame: Instant::now(),
            last_cursor: None,
        }
    }

    pub fn update_display_size(&mut self, width: u32, height: u32) {
        self.context.io_mut().display_size = [width as f32, height as f32];
    }

    /// Feeds input events to ImGui and decides where they go next
    pub fn route_window_event(
        &mut self,
        window: &Window,
        window_id: WindowId,
        event: &WindowEvent,
    ) -> EventRoute {
        if !is_ui_input(event) {
            return EventRoute::Camera;
        }

        let wrapped: Event<()> = Event::WindowEvent {
            window_id,
            event: event.clone(),
        };
        self.platform
            .handle_event(self.context.io_mut(), window, &wrapped);

        let io = self.context.io();
        route_for(event, io.want_capture_mouse || io.want_capture_keyboard)
    }

    /// True while the pointer is over the panel or dragging one of its widgets
    pub fn wants_mouse(&self) -> bool {
        self.context.io().want_capture_mouse
    }

    /// Starts a frame, lets `build` lay out the panel and returns its result
    ///
    /// Every built frame has to end in [`draw_overlay`](Self::draw_overlay)
    /// or [`discard_frame`](Self::discard_frame).
    pub fn build_frame<R>(&mut self, window: &Window, build: impl FnOnce(&imgui::Ui) -> R) -> R {
        let now = Instant::now();
        self.context.io_mut().update_delta_time(now - self.last_frame);
        self.last_frame = now;

        if let Err(err) = self.platform.prepare_frame(self.context.io_mut(), window) {
            log::warn!("Failed to prepare UI frame: {}", err);
        }

        let ui = self.context.frame();
        let output = build(ui);

        let cursor = ui.mouse_cursor();
        if self.last_cursor != cursor {
            self.last_cursor = cursor;
            self.platform.prepare_render(ui, window);
        }

        output
    }

    /// Draws the frame from [`build_frame`](Self::build_frame) over the
    /// preview already rendered into `target`
    pub fn draw_overlay(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        target: &TextureView,
    ) {
        let draw_data = self.context.render();
        // Minimised window
        if draw_data.display_size[0] <= 0.0 || draw_data.display_size[1] <= 0.0 {
            return;
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Panel Overlay Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Err(err) = self.renderer.render(draw_data, queue, device, &mut render_pass) {
            log::error!("Failed to draw panel: {}", err);
        }
    }

    /// Ends a built frame that will not be drawn, e.g. when the surface
    /// was lost
    pub fn discard_frame(&mut self) {
        self.context.render();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::event::{DeviceId, MouseButton};

    fn mouse(state: ElementState) -> WindowEvent {
        WindowEvent::MouseInput {
            // SAFETY: the id is never handed back to winit
            device_id: unsafe { DeviceId::dummy() },
            state,
            button: MouseButton::Left,
        }
    }

    #[test]
    fn uncaptured_input_goes_to_the_camera() {
        assert_eq!(route_for(&mouse(ElementState::Pressed), false), EventRoute::Camera);
        assert!(route_for(&WindowEvent::Focused(true), false).reaches_camera());
    }

    #[test]
    fn captured_presses_stay_in_the_panel() {
        let route = route_for(&mouse(ElementState::Pressed), true);
        assert_eq!(route, EventRoute::Ui);
        assert!(!route.reaches_camera());
    }

    #[test]
    fn releases_and_focus_loss_always_reach_the_camera() {
        assert_eq!(route_for(&mouse(ElementState::Released), true), EventRoute::Both);
        assert_eq!(route_for(&WindowEvent::Focused(false), true), EventRoute::Both);
    }

    #[test]
    fn non_input_events_skip_the_panel() {
        assert!(!is_ui_input(&WindowEvent::CloseRequested));
        assert!(!is_ui_input(&WindowEvent::RedrawRequested));
        assert!(is_ui_input(&mouse(ElementState::Pressed)));
    }
}
