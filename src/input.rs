//! Input handling for the viewer window.
//!
//! The `Input` struct tracks both instantaneous events (button just pressed)
//! and continuous state (button held), plus the cursor travel since the
//! left button went down so a click can be told apart from a drag.

use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, MouseButton as WinitMouseButton, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

/// Cursor travel in pixels below which a press and release count as a click.
const CLICK_SLOP: f32 = 4.0;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    fn from_winit(btn: WinitMouseButton) -> Option<Self> {
        match btn {
            WinitMouseButton::Left => Some(MouseButton::Left),
            WinitMouseButton::Right => Some(MouseButton::Right),
            WinitMouseButton::Middle => Some(MouseButton::Middle),
            _ => None,
        }
    }
}

/// Keys the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Escape,
    Space,
    R,
}

impl KeyCode {
    fn from_winit(key: WinitKeyCode) -> Option<Self> {
        match key {
            WinitKeyCode::Escape => Some(KeyCode::Escape),
            WinitKeyCode::Space => Some(KeyCode::Space),
            WinitKeyCode::KeyR => Some(KeyCode::R),
            _ => None,
        }
    }
}

/// Input state tracking for keyboard and mouse.
#[derive(Debug, Default)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,

    mouse_held: HashSet<MouseButton>,
    mouse_pressed: HashSet<MouseButton>,
    mouse_released: HashSet<MouseButton>,

    mouse_position: Vec2,
    mouse_delta: Vec2,
    /// Total cursor travel since the left button went down.
    drag_distance: f32,

    scroll_delta: f32,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a key was pressed this frame (just went down).
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_pressed.contains(&button)
    }

    pub fn mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }

    pub fn mouse_released(&self, button: MouseButton) -> bool {
        self.mouse_released.contains(&button)
    }

    /// Get the mouse position in window pixels.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Get the mouse movement since last frame in pixels.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Get the scroll wheel delta this frame, in lines.
    ///
    /// Positive values indicate scrolling up/forward.
    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }

    /// The left button was released this frame without being dragged.
    pub fn clicked(&self) -> bool {
        self.mouse_released(MouseButton::Left) && self.drag_distance < CLICK_SLOP
    }

    /// Called at the end of each frame to clear per-frame state.
    pub(crate) fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_pressed.clear();
        self.mouse_released.clear();
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
    }

    /// Process a winit window event.
    pub(crate) fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                let Some(key) = KeyCode::from_winit(code) else {
                    return;
                };
                match event.state {
                    ElementState::Pressed => {
                        // No repeat events while held.
                        if self.keys_held.insert(key) {
                            self.keys_pressed.insert(key);
                        }
                    }
                    ElementState::Released => {
                        self.keys_held.remove(&key);
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(btn) = MouseButton::from_winit(*button) {
                    self.press(btn, *state);
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.move_to(Vec2::new(position.x as f32, position.y as f32));
            }

            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_delta += match delta {
                    winit::event::MouseScrollDelta::LineDelta(_, y) => *y,
                    winit::event::MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
            }

            _ => {}
        }
    }

    fn press(&mut self, btn: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.mouse_pressed.insert(btn);
                self.mouse_held.insert(btn);
                if btn == MouseButton::Left {
                    self.drag_distance = 0.0;
                }
            }
            ElementState::Released => {
                self.mouse_held.remove(&btn);
                self.mouse_released.insert(btn);
            }
        }
    }

    fn move_to(&mut self, position: Vec2) {
        let step = position - self.mouse_position;
        self.mouse_delta += step;
        self.mouse_position = position;
        if self.mouse_held(MouseButton::Left) {
            self.drag_distance += step.length();
        }
    }
}
