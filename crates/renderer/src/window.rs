use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{Sender, TrySendError};
use tracing::{debug, error, trace, warn};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, Touch, TouchPhase, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::geometry::BlobGeometry;
use crate::gpu::{FrameOutcome, GpuState};
use crate::interaction::{PointerKind, Snap};
use crate::runtime::{FrameClock, FrameScheduler};
use crate::scene::Scene;
use crate::types::{RendererConfig, SurfaceAlpha};
use crate::BlobSignal;

/// Everything the event loop mutates. Field order matters: the GPU surface
/// must be dropped before the window it presents to.
pub(crate) struct WindowState {
    gpu: GpuState,
    window: Arc<Window>,
    scene: Scene,
    cursor: Option<PhysicalPosition<f64>>,
    active_touch: Option<u64>,
    signals: Sender<BlobSignal>,
}

impl WindowState {
    pub(crate) fn new(
        window: Arc<Window>,
        config: &RendererConfig,
        signals: Sender<BlobSignal>,
    ) -> Result<Self> {
        let geometry = BlobGeometry::default();
        let size = window.inner_size();
        let gpu = GpuState::new(window.as_ref(), size, config, &geometry)?;
        let scene = Scene::new(gpu.size(), config.interaction, config.animation, geometry);

        Ok(Self {
            gpu,
            window,
            scene,
            cursor: None,
            active_touch: None,
            signals,
        })
    }

    pub(crate) fn window(&self) -> &Window {
        self.window.as_ref()
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
        if self.scene.resize(self.gpu.size()) {
            let viewport = self.scene.viewport();
            debug!(
                width = viewport.width(),
                height = viewport.height(),
                aspect = viewport.aspect_ratio(),
                "viewport resized"
            );
        }
    }

    pub(crate) fn render_frame(&mut self, seconds: f32) -> Result<FrameOutcome, wgpu::SurfaceError> {
        let snapshot = self.scene.advance(seconds);
        self.emit(BlobSignal::Progress(snapshot.progress));
        if snapshot.content_changed {
            debug!(
                interactive = snapshot.content_interactive,
                progress = snapshot.progress,
                "content lock toggled"
            );
            self.emit(BlobSignal::ContentInteractive(snapshot.content_interactive));
        }
        self.gpu.render(&snapshot.uniforms)
    }

    pub(crate) fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        self.cursor = Some(position);
        self.scene
            .pointer_move(PointerKind::Mouse, position.x, position.y);
    }

    pub(crate) fn handle_mouse_button(&mut self, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if let Some(position) = self.cursor {
                    self.scene
                        .pointer_down(PointerKind::Mouse, position.x, position.y);
                }
            }
            ElementState::Released => {
                let snap = self.scene.pointer_up(PointerKind::Mouse);
                self.emit_snap(snap);
            }
        }
    }

    /// Follows the first finger down; other touches are ignored until it lifts.
    pub(crate) fn handle_touch(&mut self, touch: Touch) {
        let Touch {
            phase,
            location,
            id,
            ..
        } = touch;
        match phase {
            TouchPhase::Started => {
                if self.active_touch.is_some() {
                    trace!(id, "ignoring additional touch");
                    return;
                }
                self.active_touch = Some(id);
                self.scene
                    .pointer_down(PointerKind::Touch, location.x, location.y);
            }
            TouchPhase::Moved if self.active_touch == Some(id) => {
                self.scene
                    .pointer_move(PointerKind::Touch, location.x, location.y);
            }
            TouchPhase::Ended if self.active_touch == Some(id) => {
                self.active_touch = None;
                let snap = self.scene.pointer_up(PointerKind::Touch);
                self.emit_snap(snap);
            }
            TouchPhase::Cancelled if self.active_touch == Some(id) => {
                self.active_touch = None;
                let snap = self.scene.cancel_gesture();
                self.emit_snap(snap);
            }
            _ => {}
        }
    }

    fn emit_snap(&self, snap: Option<Snap>) {
        if let Some(snap) = snap {
            self.emit(BlobSignal::Snapped { open: snap.open });
        }
    }

    fn emit(&self, signal: BlobSignal) {
        match self.signals.try_send(signal) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(signal)) => {
                trace!(?signal, "signal channel full; dropping");
            }
        }
    }
}

fn is_escape(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed
        && !event.repeat
        && matches!(event.logical_key, Key::Named(NamedKey::Escape))
}

/// Creates the window and runs the event loop until the window closes.
pub(crate) fn run_window(config: RendererConfig, signals: Sender<BlobSignal>) -> Result<()> {
    let event_loop =
        EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title(config.window_title.as_str())
        .with_inner_size(window_size)
        .with_transparent(config.surface_alpha == SurfaceAlpha::Transparent)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window, &config, signals)
        .context("failed to initialise window renderer")?;

    let mut scheduler = FrameScheduler::new(config.target_fps);
    if let Some(interval) = scheduler.interval() {
        debug!(interval_ms = interval.as_millis(), "frame rate capped");
    }
    let clock = FrameClock::start();
    state.window().request_redraw();

    let run_result = event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    elwt.exit();
                }
                WindowEvent::KeyboardInput { event, .. } if is_escape(&event) => {
                    elwt.exit();
                }
                WindowEvent::CursorMoved { position, .. } => {
                    state.handle_cursor_moved(position);
                }
                WindowEvent::MouseInput {
                    state: button_state,
                    button: MouseButton::Left,
                    ..
                } => {
                    state.handle_mouse_button(button_state);
                }
                WindowEvent::Touch(touch) => {
                    state.handle_touch(touch);
                }
                WindowEvent::Resized(new_size) => {
                    state.resize(new_size);
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    match state.render_frame(clock.seconds_at(now)) {
                        Ok(FrameOutcome::Presented) => scheduler.mark_rendered(now),
                        Ok(FrameOutcome::Deferred) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            state.gpu.reconfigure();
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            error!("surface out of memory; exiting");
                            elwt.exit();
                        }
                        Err(wgpu::SurfaceError::Timeout) => {
                            warn!("surface timeout; retrying next frame");
                        }
                        Err(other) => {
                            warn!("surface error: {other:?}; retrying next frame");
                        }
                    }
                }
                _ => {}
            }
        }
        Event::AboutToWait => {
            let now = Instant::now();
            if scheduler.ready_for_frame(now) {
                trace!("scheduler: issuing redraw now");
                state.window().request_redraw();
                elwt.set_control_flow(ControlFlow::Wait);
            } else if let Some(deadline) = scheduler.next_deadline() {
                let ms = deadline.saturating_duration_since(now).as_millis();
                trace!(deadline_ms = ms, "scheduler: waiting until next frame");
                elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
            } else {
                elwt.set_control_flow(ControlFlow::Wait);
            }
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}
