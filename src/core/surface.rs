use super::params::FrameSize;
use super::region::Region;

/// RGBA presentation surface
#[derive(Debug, Clone)]
pub struct Surface {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    visible: bool,
}

impl Surface {
    fn new(size: FrameSize, visible: bool) -> Self {
        Self {
            pixels: vec![0; size.byte_len()],
            width: size.width,
            height: size.height,
            visible,
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// RGBA value at `(x, y)`, if inside the surface
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize * self.width as usize) + x as usize) * 4;
        let mut rgba = [0; 4];
        rgba.copy_from_slice(&self.pixels[idx..idx + 4]);
        Some(rgba)
    }

    /// Clear to transparent black at `size`, reallocating when the size changes
    fn reset(&mut self, size: FrameSize) {
        if self.size() == size {
            self.pixels.fill(0);
        } else {
            self.pixels = vec![0; size.byte_len()];
            self.width = size.width;
            self.height = size.height;
        }
    }

    /// Copy `region` out of a full-frame RGBA buffer addressed like this surface
    ///
    /// Only bytes inside the region are read; the rest of `source` is ignored.
    /// Returns false without writing when the buffer or region do not match
    /// this surface.
    pub fn blit_region(&mut self, source: &[u8], region: Region) -> bool {
        if source.len() != self.pixels.len() || !region.fits_within(self.width, self.height) {
            return false;
        }

        let stride = self.width as usize * 4;
        let row_bytes = region.width() as usize * 4;
        let x_offset = region.start_x as usize * 4;

        for y in region.start_y..region.end_y {
            let start = y as usize * stride + x_offset;
            let end = start + row_bytes;
            self.pixels[start..end].copy_from_slice(&source[start..end]);
        }

        true
    }
}

/// Visible/hidden surface pair
///
/// Only the hidden surface is ever handed out mutably, so the surface flagged
/// visible cannot change until the next [`swap`](Self::swap).
#[derive(Debug, Clone)]
pub struct DoubleBuffer {
    surfaces: [Surface; 2],
    visible: usize,
}

impl DoubleBuffer {
    pub fn new(size: FrameSize) -> Self {
        Self {
            surfaces: [Surface::new(size, true), Surface::new(size, false)],
            visible: 0,
        }
    }

    pub fn visible(&self) -> &Surface {
        &self.surfaces[self.visible]
    }

    pub fn visible_index(&self) -> usize {
        self.visible
    }

    /// The hidden surface, target of the in-flight frame
    pub fn write_surface(&self) -> &Surface {
        &self.surfaces[1 - self.visible]
    }

    pub fn write_surface_mut(&mut self) -> &mut Surface {
        &mut self.surfaces[1 - self.visible]
    }

    /// Clear and resize the hidden surface before a frame is dispatched
    pub fn prepare_write(&mut self, size: FrameSize) {
        self.write_surface_mut().reset(size);
    }

    /// Publish the hidden surface and hide the previously visible one
    pub fn swap(&mut self) {
        let hidden = 1 - self.visible;
        self.surfaces[hidden].visible = true;
        self.surfaces[self.visible].visible = false;
        self.visible = hidden;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(size: FrameSize, rgba: [u8; 4]) -> Vec<u8> {
        rgba.iter().copied().cycle().take(size.byte_len()).collect()
    }

    #[test]
    fn test_new_has_one_visible_surface() {
        let buffers = DoubleBuffer::new(FrameSize::new(4, 4));
        assert!(buffers.visible().is_visible());
        assert!(!buffers.write_surface().is_visible());
        assert_eq!(buffers.visible_index(), 0);
    }

    #[test]
    fn test_swap_toggles_roles() {
        let mut buffers = DoubleBuffer::new(FrameSize::new(4, 4));
        buffers.swap();
        assert_eq!(buffers.visible_index(), 1);
        assert!(buffers.visible().is_visible());
        assert!(!buffers.write_surface().is_visible());
        buffers.swap();
        assert_eq!(buffers.visible_index(), 0);
    }

    #[test]
    fn test_blit_copies_only_region() {
        let size = FrameSize::new(4, 4);
        let mut buffers = DoubleBuffer::new(size);
        let source = solid(size, [9, 8, 7, 255]);

        assert!(buffers
            .write_surface_mut()
            .blit_region(&source, Region::new(1, 3, 2, 4)));

        let surface = buffers.write_surface();
        assert_eq!(surface.pixel(1, 2), Some([9, 8, 7, 255]));
        assert_eq!(surface.pixel(2, 3), Some([9, 8, 7, 255]));
        assert_eq!(surface.pixel(0, 2), Some([0, 0, 0, 0]));
        assert_eq!(surface.pixel(3, 3), Some([0, 0, 0, 0]));
        assert_eq!(surface.pixel(1, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_blit_rejects_mismatched_buffer() {
        let mut buffers = DoubleBuffer::new(FrameSize::new(4, 4));
        let short = vec![255; 4 * 4 * 4 - 1];
        assert!(!buffers
            .write_surface_mut()
            .blit_region(&short, Region::full(4, 4)));
        assert!(buffers.write_surface().pixels().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_blit_rejects_out_of_bounds_region() {
        let size = FrameSize::new(4, 4);
        let mut buffers = DoubleBuffer::new(size);
        let source = solid(size, [1, 1, 1, 1]);
        assert!(!buffers
            .write_surface_mut()
            .blit_region(&source, Region::new(2, 5, 0, 4)));
    }

    #[test]
    fn test_prepare_write_resizes_and_clears_hidden_only() {
        let size = FrameSize::new(2, 2);
        let mut buffers = DoubleBuffer::new(size);
        let source = solid(size, [200, 0, 0, 255]);
        buffers
            .write_surface_mut()
            .blit_region(&source, Region::full(2, 2));
        buffers.swap();

        buffers.prepare_write(FrameSize::new(4, 3));

        assert_eq!(buffers.write_surface().dimensions(), (4, 3));
        assert!(buffers.write_surface().pixels().iter().all(|&b| b == 0));
        assert_eq!(buffers.visible().dimensions(), (2, 2));
        assert_eq!(buffers.visible().pixel(0, 0), Some([200, 0, 0, 255]));
    }

    #[test]
    fn test_prepare_write_same_size_clears_stale_pixels() {
        let size = FrameSize::new(2, 2);
        let mut buffers = DoubleBuffer::new(size);
        let source = solid(size, [5, 5, 5, 5]);
        buffers
            .write_surface_mut()
            .blit_region(&source, Region::full(2, 2));

        buffers.prepare_write(size);
        assert!(buffers.write_surface().pixels().iter().all(|&b| b == 0));
    }
}
