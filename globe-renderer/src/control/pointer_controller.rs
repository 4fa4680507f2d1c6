use glam::Vec2;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, WindowEvent},
};

use crate::data::Size;

/// A press-release pair travelling less than this many pixels counts as a
/// click rather than a drag.
const CLICK_SLOP: f64 = 5.0;

/// Tracks the cursor in window coordinates and separates clicks from
/// orbit drags.
#[derive(Debug, Default)]
pub struct PointerController {
    cursor: Option<PhysicalPosition<f64>>,
    pressed_at: Option<PhysicalPosition<f64>>,
    clicks: Vec<PhysicalPosition<f64>>,
}

impl PointerController {
    pub fn process_events(&mut self, event: &WindowEvent) -> bool {
        match *event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some(position);
                true
            }
            WindowEvent::CursorLeft { device_id: _ } => {
                self.cursor = None;
                self.pressed_at = None;
                false
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                match state {
                    ElementState::Pressed => {
                        self.pressed_at = self.cursor;
                    }
                    ElementState::Released => {
                        if let (Some(pressed), Some(released)) =
                            (self.pressed_at.take(), self.cursor)
                        {
                            let dx = released.x - pressed.x;
                            let dy = released.y - pressed.y;
                            if (dx * dx + dy * dy).sqrt() < CLICK_SLOP {
                                self.clicks.push(released);
                            }
                        }
                    }
                }
                true
            }
            _ => false,
        }
    }

    /// Cursor position in normalized device coordinates, if it is over the
    /// window.
    pub fn ndc(&self, bounds: Size<f32>) -> Option<Vec2> {
        self.cursor.map(|cursor| to_ndc(cursor, bounds))
    }

    /// Drains the clicks collected since the last call, converted to NDC.
    pub fn take_clicks(&mut self, bounds: Size<f32>) -> Vec<Vec2> {
        self.clicks
            .drain(..)
            .map(|click| to_ndc(click, bounds))
            .collect()
    }
}

fn to_ndc(position: PhysicalPosition<f64>, bounds: Size<f32>) -> Vec2 {
    Vec2::new(
        (position.x as f32 / bounds.width) * 2.0 - 1.0,
        -((position.y as f32 / bounds.height) * 2.0 - 1.0),
    )
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn bounds() -> Size<f32> {
        Size::from((800.0, 600.0))
    }

    fn cursor_moved(x: f64, y: f64) -> WindowEvent {
        WindowEvent::CursorMoved {
            device_id: winit::event::DeviceId::dummy(),
            position: PhysicalPosition::new(x, y),
        }
    }

    fn mouse_left(state: ElementState) -> WindowEvent {
        WindowEvent::MouseInput {
            device_id: winit::event::DeviceId::dummy(),
            state,
            button: MouseButton::Left,
        }
    }

    #[test]
    fn window_center_maps_to_ndc_origin() {
        let mut pointer = PointerController::default();
        pointer.process_events(&cursor_moved(400.0, 300.0));
        let ndc = pointer.ndc(bounds()).unwrap();
        assert_relative_eq!(ndc.x, 0.0);
        assert_relative_eq!(ndc.y, 0.0);
    }

    #[test]
    fn ndc_y_points_up() {
        let mut pointer = PointerController::default();
        pointer.process_events(&cursor_moved(0.0, 0.0));
        let ndc = pointer.ndc(bounds()).unwrap();
        assert_relative_eq!(ndc.x, -1.0);
        assert_relative_eq!(ndc.y, 1.0);
    }

    #[test]
    fn press_release_in_place_is_a_click() {
        let mut pointer = PointerController::default();
        pointer.process_events(&cursor_moved(400.0, 300.0));
        pointer.process_events(&mouse_left(ElementState::Pressed));
        pointer.process_events(&mouse_left(ElementState::Released));

        let clicks = pointer.take_clicks(bounds());
        assert_eq!(clicks.len(), 1);
        assert!(pointer.take_clicks(bounds()).is_empty());
    }

    #[test]
    fn a_drag_is_not_a_click() {
        let mut pointer = PointerController::default();
        pointer.process_events(&cursor_moved(400.0, 300.0));
        pointer.process_events(&mouse_left(ElementState::Pressed));
        pointer.process_events(&cursor_moved(500.0, 360.0));
        pointer.process_events(&mouse_left(ElementState::Released));

        assert!(pointer.take_clicks(bounds()).is_empty());
    }
}
