use super::params::ViewParams;

/// Discrete events emitted by the UI layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputEvent {
    ParameterChanged,
    InteractionStart,
    InteractionEnd,
    PlayToggled,
}

/// Current view parameters, read at dispatch time rather than at event time
pub trait ParameterSource {
    fn view_params(&self) -> ViewParams;

    /// Viewport size in physical pixels before the resolution factor
    fn viewport(&self) -> (u32, u32);
}

const MIN_RESOLUTION_FACTOR: f32 = 1.0 / 16.0;
const MAX_RESOLUTION_FACTOR: f32 = 4.0;
const MIN_FOV: f32 = 0.1;
const MAX_FOV: f32 = 3.0;

/// Parameter store edited by the host's input handling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewControls {
    pub view: ViewParams,
    pub viewport: (u32, u32),
}

impl ViewControls {
    pub fn new(view: ViewParams, viewport: (u32, u32)) -> Self {
        Self { view, viewport }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    pub fn move_camera(&mut self, delta: [f32; 3]) {
        for (axis, d) in self.view.camera_position.iter_mut().zip(delta) {
            *axis += d;
        }
    }

    pub fn rotate_camera(&mut self, delta: [f32; 3]) {
        for (axis, d) in self.view.camera_rotation.iter_mut().zip(delta) {
            *axis = (*axis + d).rem_euclid(std::f32::consts::TAU);
        }
    }

    pub fn adjust_fov(&mut self, delta: f32) {
        self.view.field_of_view = (self.view.field_of_view + delta).clamp(MIN_FOV, MAX_FOV);
    }

    /// Multiply the resolution factor, kept within 1/16..4
    pub fn scale_resolution(&mut self, factor: f32) {
        self.view.resolution_factor = (self.view.resolution_factor * factor)
            .clamp(MIN_RESOLUTION_FACTOR, MAX_RESOLUTION_FACTOR);
    }

    pub fn toggle_supersampling(&mut self) {
        self.view.supersampling = !self.view.supersampling;
    }
}

impl ParameterSource for ViewControls {
    fn view_params(&self) -> ViewParams {
        self.view
    }

    fn viewport(&self) -> (u32, u32) {
        self.viewport
    }
}
