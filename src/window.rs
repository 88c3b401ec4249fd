//! Windowed viewer: event loop, frame pacing and mouse controls.
//!
//! - drag with the left button to orbit
//! - scroll to zoom
//! - click a sphere to nudge it
//! - `Space` pauses, `R` rebuilds the cluster, `Escape` quits

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::config::ShellConfig;
use crate::error::RunError;
use crate::gpu::GpuState;
use crate::input::{Input, KeyCode, MouseButton};
use crate::sim::Simulation;
use crate::time::Time;

/// Open a window and run the simulation until it is closed.
pub fn run(config: ShellConfig) -> Result<(), RunError> {
    config.validate()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct App {
    config: ShellConfig,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    sim: Simulation,
    time: Time,
    input: Input,
    /// Paused from the keyboard, as opposed to by occlusion.
    user_paused: bool,
    /// First fatal error; returned from [`run`] once the loop exits.
    error: Option<RunError>,
}

impl App {
    fn new(config: ShellConfig) -> Self {
        Self {
            sim: Simulation::new(config.clone()),
            config,
            window: None,
            gpu_state: None,
            time: Time::new(),
            input: Input::new(),
            user_paused: false,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: RunError) {
        tracing::error!(%err, "viewer failed");
        self.error.get_or_insert(err);
        self.sim.stop();
        event_loop.exit();
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), RunError> {
        let view = &self.config.view;
        let window_attrs = Window::default_attributes()
            .with_title(view.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(view.width, view.height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu_state = pollster::block_on(GpuState::new(window.clone(), view.intro_from))?;

        self.window = Some(window);
        self.gpu_state = Some(gpu_state);
        self.sim.start(self.time.elapsed_ms());
        Ok(())
    }

    /// Apply this frame's input to the camera and the simulation.
    fn apply_input(&mut self, event_loop: &ActiveEventLoop) {
        if self.input.key_pressed(KeyCode::Escape) {
            self.sim.stop();
            event_loop.exit();
            return;
        }
        if self.input.key_pressed(KeyCode::Space) {
            self.user_paused = !self.user_paused;
            if self.user_paused {
                self.time.pause();
            } else {
                self.time.resume();
            }
            tracing::info!(paused = self.user_paused, "pause toggled");
        }
        if self.input.key_pressed(KeyCode::R) {
            self.sim.stop();
            self.sim.start(self.time.elapsed_ms());
        }

        let Some(gpu_state) = &mut self.gpu_state else {
            return;
        };
        if self.input.mouse_held(MouseButton::Left) {
            gpu_state.camera.orbit(self.input.mouse_delta());
        }
        if self.input.scroll_delta() != 0.0 {
            gpu_state.camera.scroll(self.input.scroll_delta());
        }
        if self.input.clicked() {
            let cursor = self.input.mouse_position();
            let (origin, direction) = gpu_state.pick_ray(cursor.x, cursor.y);
            self.sim.poke(origin, direction);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.apply_input(event_loop);
        self.input.end_frame();

        let (now_ms, _) = self.time.update();
        if !self.time.is_paused() {
            self.sim.tick(now_ms);
        }

        if let Some(gpu_state) = &mut self.gpu_state {
            match gpu_state.render(self.sim.render(), (now_ms / 1000.0) as f32) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu_state.reconfigure(),
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    tracing::error!("surface out of memory");
                    self.sim.stop();
                    event_loop.exit();
                }
                Err(e) => tracing::warn!("Render error: {:?}", e),
            }
        }

        if self.time.frame() % 600 == 0 && self.time.frame() > 0 {
            tracing::debug!(
                fps = self.time.fps(),
                bodies = self.sim.registry().len(),
                "frame stats"
            );
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(err) = self.create_window(event_loop) {
                self.fail(event_loop, err);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                self.sim.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }
            WindowEvent::Occluded(occluded) => {
                if occluded {
                    self.time.pause();
                } else if !self.user_paused {
                    self.time.resume();
                }
                tracing::debug!(occluded, "window occlusion changed");
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
