use serde::{Deserialize, Serialize};

use super::region::{Region, TileGrid};
use super::session::SessionId;

/// User-editable view parameters, sampled fresh for every dispatched frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewParams {
    /// Multiplier applied to the viewport size before capping
    pub resolution_factor: f32,
    /// Field of view in radians
    pub field_of_view: f32,
    pub supersampling: bool,
    pub camera_position: [f32; 3],
    /// Rotation around x, y and z in radians
    pub camera_rotation: [f32; 3],
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            resolution_factor: 1.0,
            field_of_view: std::f32::consts::FRAC_PI_3,
            supersampling: false,
            camera_position: [0.0; 3],
            camera_rotation: [0.0; 3],
        }
    }
}

/// Pixel dimensions of one rendered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Apply the sizing contract: `min(ceil(factor * viewport), cap)` per axis
    ///
    /// The result never drops below the tile grid's column/row count, so every
    /// planned region has at least one pixel.
    pub fn fit(
        viewport: (u32, u32),
        resolution_factor: f32,
        max_size: (u32, u32),
        grid: TileGrid,
    ) -> Self {
        Self {
            width: fit_axis(viewport.0, resolution_factor, max_size.0, grid.columns),
            height: fit_axis(viewport.1, resolution_factor, max_size.1, grid.rows),
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Size of a full-frame RGBA buffer
    pub fn byte_len(&self) -> usize {
        self.pixel_count() * 4
    }
}

fn fit_axis(viewport: u32, factor: f32, cap: u32, minimum: u32) -> u32 {
    // f32 product; widening to f64 first turns 0.3 * 1000 into 301
    let scaled = (factor * viewport as f32).ceil();
    let capped = scaled.min(cap as f32).max(0.0) as u32;
    capped.max(minimum).max(1)
}

/// Everything one frame needs from the coordinator, immutable once dispatched
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRequest {
    pub width: u32,
    pub height: u32,
    pub field_of_view: f32,
    pub supersampling: bool,
    pub camera_position: [f32; 3],
    pub camera_rotation: [f32; 3],
    /// Accumulated animation clock in seconds
    pub animation_time: f32,
}

impl FrameRequest {
    pub fn new(size: FrameSize, view: &ViewParams, animation_time: f32) -> Self {
        Self {
            width: size.width,
            height: size.height,
            field_of_view: view.field_of_view,
            supersampling: view.supersampling,
            camera_position: view.camera_position,
            camera_rotation: view.camera_rotation,
            animation_time,
        }
    }

    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }
}

/// One worker's share of a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileRequest {
    pub session: SessionId,
    pub worker: usize,
    pub frame: FrameRequest,
    pub region: Region,
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAP: (u32, u32) = (3840, 2160);

    fn quad() -> TileGrid {
        TileGrid::for_tile_count(4)
    }

    #[test]
    fn test_fit_scales_and_rounds_up() {
        let size = FrameSize::fit((801, 601), 0.5, CAP, quad());
        assert_eq!(size, FrameSize::new(401, 301));
    }

    #[test]
    fn test_fit_decimal_factors_round_exactly() {
        assert_eq!(
            FrameSize::fit((1000, 1000), 0.3, CAP, quad()),
            FrameSize::new(300, 300)
        );
        assert_eq!(
            FrameSize::fit((800, 800), 0.1, CAP, quad()),
            FrameSize::new(80, 80)
        );
        assert_eq!(
            FrameSize::fit((1000, 1000), 1.1, CAP, quad()),
            FrameSize::new(1100, 1100)
        );
    }

    #[test]
    fn test_fit_caps_each_axis() {
        let size = FrameSize::fit((3000, 1000), 2.0, CAP, quad());
        assert_eq!(size, FrameSize::new(3840, 2000));
    }

    #[test]
    fn test_fit_never_smaller_than_grid() {
        let size = FrameSize::fit((1, 1), 0.125, CAP, quad());
        assert_eq!(size, FrameSize::new(2, 2));
    }

    #[test]
    fn test_fit_ignores_nan_factor() {
        let size = FrameSize::fit((100, 100), f32::NAN, CAP, quad());
        assert_eq!(size, FrameSize::new(3840, 2160));
    }

    #[test]
    fn test_byte_len_is_rgba() {
        assert_eq!(FrameSize::new(800, 600).byte_len(), 800 * 600 * 4);
    }

    #[test]
    fn test_frame_request_copies_view() {
        let view = ViewParams {
            supersampling: true,
            camera_position: [1.0, 2.0, 3.0],
            ..ViewParams::default()
        };
        let request = FrameRequest::new(FrameSize::new(64, 32), &view, 1.5);
        assert_eq!(request.size(), FrameSize::new(64, 32));
        assert!(request.supersampling);
        assert_eq!(request.camera_position, [1.0, 2.0, 3.0]);
        assert_eq!(request.animation_time, 1.5);
    }
}
