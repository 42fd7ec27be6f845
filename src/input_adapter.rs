use std::collections::HashSet;

use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::core::{InputEvent, ViewControls};

/// World units per second
const MOVE_SPEED: f32 = 2.0;
/// Radians per second
const TURN_SPEED: f32 = 1.2;
const FOV_SPEED: f32 = 0.8;
/// Radians per dragged pixel
const DRAG_SENSITIVITY: f32 = 0.005;

/// Bridges winit events to view edits and orchestrator input events
///
/// Any held key or a left-button drag counts as interaction, so frames keep
/// coming while the user is steering even when the animation is paused.
#[derive(Debug, Clone, Default)]
pub struct WinitController {
    held: HashSet<KeyCode>,
    dragging: bool,
    cursor: Option<(f32, f32)>,
    drag_delta: (f32, f32),
    interacting: bool,
}

impl WinitController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate one window event, applying discrete edits to `controls`
    pub fn process_event(&mut self, event: &WindowEvent, controls: &mut ViewControls) -> Vec<InputEvent> {
        match event {
            WindowEvent::KeyboardInput { event, .. } if !event.repeat => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    return self.key_changed(key, event.state == ElementState::Pressed, controls);
                }
                Vec::new()
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => self.drag_changed(*state == ElementState::Pressed),
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(position.x as f32, position.y as f32);
                Vec::new()
            }
            WindowEvent::Resized(size) => {
                controls.set_viewport(size.width, size.height);
                vec![InputEvent::ParameterChanged]
            }
            _ => Vec::new(),
        }
    }

    pub fn key_changed(&mut self, key: KeyCode, pressed: bool, controls: &mut ViewControls) -> Vec<InputEvent> {
        let mut events = Vec::new();

        if matches!(key, KeyCode::KeyP | KeyCode::Space) {
            if pressed {
                events.push(InputEvent::PlayToggled);
            }
            return events;
        }
        if !is_steering_key(key) {
            return events;
        }

        if pressed {
            if self.held.insert(key) && apply_discrete(key, controls) {
                events.push(InputEvent::ParameterChanged);
            }
        } else {
            self.held.remove(&key);
        }
        events.extend(self.sync_interaction());
        events
    }

    pub fn drag_changed(&mut self, pressed: bool) -> Vec<InputEvent> {
        self.dragging = pressed;
        self.drag_delta = (0.0, 0.0);
        self.sync_interaction().into_iter().collect()
    }

    pub fn cursor_moved(&mut self, x: f32, y: f32) {
        if let (true, Some((old_x, old_y))) = (self.dragging, self.cursor) {
            self.drag_delta.0 += x - old_x;
            self.drag_delta.1 += y - old_y;
        }
        self.cursor = Some((x, y));
    }

    pub fn is_interacting(&self) -> bool {
        self.interacting
    }

    /// Apply held keys and the pending drag for `dt` seconds
    pub fn update(&mut self, dt: f32, controls: &mut ViewControls) -> Option<InputEvent> {
        let axis = |plus: KeyCode, minus: KeyCode| {
            self.held.contains(&plus) as i32 as f32 - self.held.contains(&minus) as i32 as f32
        };

        let movement = [
            axis(KeyCode::KeyD, KeyCode::KeyA),
            axis(KeyCode::KeyR, KeyCode::KeyF),
            axis(KeyCode::KeyW, KeyCode::KeyS),
        ];
        let turn = [
            axis(KeyCode::ArrowDown, KeyCode::ArrowUp) * TURN_SPEED * dt + self.drag_delta.1 * DRAG_SENSITIVITY,
            axis(KeyCode::ArrowRight, KeyCode::ArrowLeft) * TURN_SPEED * dt + self.drag_delta.0 * DRAG_SENSITIVITY,
            0.0,
        ];
        let zoom = axis(KeyCode::KeyX, KeyCode::KeyZ) * FOV_SPEED * dt;
        self.drag_delta = (0.0, 0.0);

        let before = controls.view;
        if movement.iter().any(|&m| m != 0.0) {
            controls.move_camera(movement.map(|m| m * MOVE_SPEED * dt));
        }
        if turn.iter().any(|&t| t != 0.0) {
            controls.rotate_camera(turn);
        }
        if zoom != 0.0 {
            controls.adjust_fov(zoom);
        }

        (controls.view != before).then_some(InputEvent::ParameterChanged)
    }

    fn sync_interaction(&mut self) -> Option<InputEvent> {
        let interacting = self.dragging || !self.held.is_empty();
        if interacting == self.interacting {
            return None;
        }
        self.interacting = interacting;
        Some(if interacting {
            InputEvent::InteractionStart
        } else {
            InputEvent::InteractionEnd
        })
    }
}

fn is_steering_key(key: KeyCode) -> bool {
    matches!(
        key,
        KeyCode::KeyW
            | KeyCode::KeyA
            | KeyCode::KeyS
            | KeyCode::KeyD
            | KeyCode::KeyR
            | KeyCode::KeyF
            | KeyCode::KeyZ
            | KeyCode::KeyX
            | KeyCode::KeyM
            | KeyCode::ArrowUp
            | KeyCode::ArrowDown
            | KeyCode::ArrowLeft
            | KeyCode::ArrowRight
            | KeyCode::Equal
            | KeyCode::NumpadAdd
            | KeyCode::Minus
            | KeyCode::NumpadSubtract
    )
}

/// One-shot edits bound to a key press; true if anything changed
fn apply_discrete(key: KeyCode, controls: &mut ViewControls) -> bool {
    let before = controls.view;
    match key {
        KeyCode::KeyM => controls.toggle_supersampling(),
        KeyCode::Equal | KeyCode::NumpadAdd => controls.scale_resolution(2.0),
        KeyCode::Minus | KeyCode::NumpadSubtract => controls.scale_resolution(0.5),
        _ => {}
    }
    controls.view != before
}
