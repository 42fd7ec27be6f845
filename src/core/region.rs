/// Half-open pixel rectangle `[start_x, end_x) x [start_y, end_y)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub start_x: u32,
    pub end_x: u32,
    pub start_y: u32,
    pub end_y: u32,
}

impl Region {
    pub const fn new(start_x: u32, end_x: u32, start_y: u32, end_y: u32) -> Self {
        Self {
            start_x,
            end_x,
            start_y,
            end_y,
        }
    }

    /// Region covering a whole `width x height` frame
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, width, 0, height)
    }

    pub fn width(&self) -> u32 {
        self.end_x.saturating_sub(self.start_x)
    }

    pub fn height(&self) -> u32 {
        self.end_y.saturating_sub(self.start_y)
    }

    /// Number of pixels inside the region
    pub fn area(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.start_x && x < self.end_x && y >= self.start_y && y < self.end_y
    }

    /// True when the region lies inside a `width x height` frame
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.start_x <= self.end_x
            && self.start_y <= self.end_y
            && self.end_x <= width
            && self.end_y <= height
    }
}

/// Column/row layout of the tiles in one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    pub columns: u32,
    pub rows: u32,
}

impl TileGrid {
    /// Most square grid whose cell count is exactly `tile_count`
    ///
    /// Rows take the largest divisor not exceeding the square root, so 4 tiles
    /// become 2x2, 6 become 3x2 and a prime count becomes a single row.
    pub fn for_tile_count(tile_count: usize) -> Self {
        if tile_count == 0 {
            return Self { columns: 0, rows: 0 };
        }

        let rows = (1..=tile_count)
            .take_while(|d| d * d <= tile_count)
            .filter(|d| tile_count % d == 0)
            .last()
            .unwrap_or(1);

        Self {
            columns: (tile_count / rows) as u32,
            rows: rows as u32,
        }
    }

    pub fn tile_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }
}

/// Split point `k` of `parts` equal divisions of `extent`, rounded down
fn split_point(extent: u32, k: u32, parts: u32) -> u32 {
    ((extent as u64 * k as u64) / parts as u64) as u32
}

/// Partition a frame into `tile_count` disjoint regions
///
/// Regions are ordered column-major (top to bottom, then left to right) and
/// map positionally onto worker indices. Each split point belongs to the
/// second half, so odd extents hand the extra row or column to the later
/// tile. Frames smaller than the grid yield empty regions; callers size
/// frames through [`FrameSize`](super::params::FrameSize) to avoid that.
pub fn plan(width: u32, height: u32, tile_count: usize) -> Vec<Region> {
    let grid = TileGrid::for_tile_count(tile_count);
    let mut regions = Vec::with_capacity(grid.tile_count());

    for column in 0..grid.columns {
        let start_x = split_point(width, column, grid.columns);
        let end_x = split_point(width, column + 1, grid.columns);

        for row in 0..grid.rows {
            let start_y = split_point(height, row, grid.rows);
            let end_y = split_point(height, row + 1, grid.rows);
            regions.push(Region::new(start_x, end_x, start_y, end_y));
        }
    }

    regions
}
