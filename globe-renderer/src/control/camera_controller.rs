use std::collections::BTreeMap;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;
#[cfg(target_arch = "wasm32")]
use web_time::Duration;

use glam::Vec2;
use strum::{EnumIter, IntoEnumIterator};
use winit::{
    event::{DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::data::camera::OrbitCamera;

/// Velocity carried over between frames decays by this factor, the damping
/// the original orbit controls used.
pub const DAMPING: f32 = 0.05;

const ROTATE_SPEED: f32 = 0.005;
const WHEEL_ZOOM_BASE: f32 = 0.9;
pub const ZOOM_IN_STEP: f32 = 0.8;
pub const ZOOM_OUT_STEP: f32 = 1.2;

#[derive(Copy, Clone, Debug, EnumIter, PartialEq, Eq, PartialOrd, Ord)]
pub enum Control {
    MouseLeft,
}

/// Orbit controls: left-drag rotates the eye around the globe with
/// damping, the wheel and the +/- keys zoom within the distance clamp.
/// Panning is deliberately absent; the view target never leaves the
/// center.
pub struct CameraController {
    is_pressed_map: BTreeMap<Control, bool>,
    drag_delta: (f32, f32),
    scroll_delta: f32,
    zoom_steps: i32,
    velocity: Vec2,
}

impl CameraController {
    pub fn new() -> Self {
        let mut is_pressed = BTreeMap::new();
        for control in Control::iter() {
            is_pressed.insert(control, false);
        }
        Self {
            is_pressed_map: is_pressed,
            drag_delta: (0.0, 0.0),
            scroll_delta: 0.0,
            zoom_steps: 0,
            velocity: Vec2::ZERO,
        }
    }

    fn is_pressed(&self, control: Control) -> bool {
        *self.is_pressed_map.get(&control).unwrap_or(&false)
    }

    pub fn process_events(&mut self, event: &WindowEvent) -> bool {
        match *event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(keycode),
                        repeat: false,
                        ..
                    },
                ..
            } => match keycode {
                KeyCode::Equal | KeyCode::NumpadAdd => {
                    self.zoom_steps -= 1;
                    true
                }
                KeyCode::Minus | KeyCode::NumpadSubtract => {
                    self.zoom_steps += 1;
                    true
                }
                _ => false,
            },
            WindowEvent::MouseInput {
                device_id: _,
                state,
                button,
            } if button == MouseButton::Left => {
                self.is_pressed_map
                    .get_mut(&Control::MouseLeft)
                    .map(|pressed| *pressed = state.is_pressed());
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_delta += match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / 50.0,
                };
                true
            }
            WindowEvent::CursorLeft { device_id: _ } => {
                self.is_pressed_map
                    .iter_mut()
                    .for_each(|(_, pressed)| *pressed = false);
                false
            }
            _ => false,
        }
    }

    pub fn process_device_events(&mut self, event: &DeviceEvent) {
        match event {
            DeviceEvent::MouseMotion { delta } => {
                if self.is_pressed(Control::MouseLeft) {
                    self.drag_delta.0 += delta.0 as f32;
                    self.drag_delta.1 += delta.1 as f32;
                }
            }
            _ => {}
        }
    }

    /// Applies accumulated input to the camera. Returns whether the camera
    /// moved this tick.
    pub fn update_camera(&mut self, camera: &mut OrbitCamera, time_delta: Duration) -> bool {
        let mut changed = false;

        // Frame-time compensated so damping feels the same at any refresh
        // rate; the constants are tuned for 60 fps frames.
        let frames = (time_delta.as_secs_f32() * 60.0).min(4.0);

        self.velocity += Vec2::new(self.drag_delta.0, self.drag_delta.1) * ROTATE_SPEED;
        self.drag_delta = (0.0, 0.0);

        if self.velocity.length_squared() > 1e-8 {
            camera.orbit(self.velocity.x * frames, self.velocity.y * frames);
            self.velocity *= (1.0 - DAMPING).powf(frames);
            if self.velocity.length_squared() < 1e-8 {
                self.velocity = Vec2::ZERO;
            }
            changed = true;
        }

        if self.scroll_delta != 0.0 {
            camera.zoom_by(WHEEL_ZOOM_BASE.powf(self.scroll_delta));
            self.scroll_delta = 0.0;
            changed = true;
        }

        while self.zoom_steps != 0 {
            if self.zoom_steps < 0 {
                camera.zoom_by(ZOOM_IN_STEP);
                self.zoom_steps += 1;
            } else {
                camera.zoom_by(ZOOM_OUT_STEP);
                self.zoom_steps -= 1;
            }
            changed = true;
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::camera::{MAX_DISTANCE, MIN_DISTANCE};

    #[test]
    fn wheel_scroll_zooms_in_within_the_clamp() {
        let mut controller = CameraController::new();
        let mut camera = OrbitCamera::default();
        let before = camera.distance();

        controller.scroll_delta = 3.0;
        assert!(controller.update_camera(&mut camera, Duration::from_millis(16)));
        assert!(camera.distance() < before);
        assert!(camera.distance() >= MIN_DISTANCE);
    }

    #[test]
    fn drag_orbits_and_damps_out() {
        let mut controller = CameraController::new();
        let mut camera = OrbitCamera::default();
        let before = camera.eye;

        controller
            .is_pressed_map
            .insert(Control::MouseLeft, true);
        controller.process_device_events(&DeviceEvent::MouseMotion { delta: (30.0, 0.0) });
        assert!(controller.update_camera(&mut camera, Duration::from_millis(16)));
        assert_ne!(camera.eye, before);

        // No further input: the carried velocity decays to rest.
        for _ in 0..600 {
            controller.update_camera(&mut camera, Duration::from_millis(16));
        }
        assert!(!controller.update_camera(&mut camera, Duration::from_millis(16)));
    }

    #[test]
    fn zoom_steps_apply_once_per_key_press() {
        let mut controller = CameraController::new();
        let mut camera = OrbitCamera::default();

        controller.zoom_steps = 2;
        controller.update_camera(&mut camera, Duration::from_millis(16));
        let zoomed_out = camera.distance();
        assert!(zoomed_out > OrbitCamera::DEFAULT_POSITION.length());
        assert!(zoomed_out <= MAX_DISTANCE);

        // Steps were consumed; nothing further happens.
        assert!(!controller.update_camera(&mut camera, Duration::from_millis(16)));
    }
}
