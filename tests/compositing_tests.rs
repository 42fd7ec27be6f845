use tile_relay::core::{
    plan, CompletionTracker, DoubleBuffer, DropReason, FrameRequest, FrameSession, FrameSize,
    Region, SessionId, TileOutcome, TileResult, ViewParams,
};

const RED: [u8; 4] = [255, 0, 0, 255];

fn solid(size: FrameSize, rgba: [u8; 4]) -> Vec<u8> {
    rgba.iter().copied().cycle().take(size.byte_len()).collect()
}

/// Buffer whose every pixel encodes the worker that produced it
fn tagged(size: FrameSize, worker: usize) -> Vec<u8> {
    solid(size, [worker as u8 * 40, 0, 0, 255])
}

fn begin(
    tracker: &mut CompletionTracker,
    buffers: &mut DoubleBuffer,
    id: u64,
    size: FrameSize,
) -> Vec<Region> {
    let regions = plan(size.width, size.height, 4);
    buffers.prepare_write(size);
    tracker.begin(FrameSession::new(
        SessionId(id),
        FrameRequest::new(size, &ViewParams::default(), 0.0),
        regions.clone(),
        1 - buffers.visible_index(),
    ));
    regions
}

fn result(id: u64, worker: usize, region: Region, pixels: Vec<u8>) -> TileResult {
    TileResult {
        session: SessionId(id),
        worker,
        region,
        pixels,
    }
}

// ============================================================================
// Aggregation
// ============================================================================

#[test]
fn test_reverse_order_solid_tiles_fill_frame() {
    let size = FrameSize::new(800, 600);
    let mut tracker = CompletionTracker::new();
    let mut buffers = DoubleBuffer::new(size);
    let regions = begin(&mut tracker, &mut buffers, 1, size);

    let mut completions = 0;
    for worker in (0..4).rev() {
        let outcome =
            tracker.on_tile_result(&mut buffers, result(1, worker, regions[worker], solid(size, RED)));
        if outcome == TileOutcome::FrameComplete {
            completions += 1;
        }
    }

    assert_eq!(completions, 1);
    assert!(buffers
        .write_surface()
        .pixels()
        .chunks_exact(4)
        .all(|px| px == RED));
    assert!(buffers.visible().pixels().iter().all(|&b| b == 0));
}

#[test]
fn test_arrival_order_does_not_change_image() {
    let size = FrameSize::new(13, 9);
    let orders = [[0, 1, 2, 3], [3, 2, 1, 0], [2, 0, 3, 1], [1, 3, 0, 2]];

    let images: Vec<Vec<u8>> = orders
        .iter()
        .map(|order| {
            let mut tracker = CompletionTracker::new();
            let mut buffers = DoubleBuffer::new(size);
            let regions = begin(&mut tracker, &mut buffers, 1, size);
            for &worker in order {
                tracker.on_tile_result(
                    &mut buffers,
                    result(1, worker, regions[worker], tagged(size, worker)),
                );
            }
            buffers.write_surface().pixels().to_vec()
        })
        .collect();

    assert!(images.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn test_each_tile_lands_in_its_region_only() {
    let size = FrameSize::new(10, 8);
    let mut tracker = CompletionTracker::new();
    let mut buffers = DoubleBuffer::new(size);
    let regions = begin(&mut tracker, &mut buffers, 1, size);

    for (worker, region) in regions.iter().enumerate() {
        tracker.on_tile_result(&mut buffers, result(1, worker, *region, tagged(size, worker)));
    }

    let surface = buffers.write_surface();
    for (worker, region) in regions.iter().enumerate() {
        for y in region.start_y..region.end_y {
            for x in region.start_x..region.end_x {
                assert_eq!(surface.pixel(x, y), Some([worker as u8 * 40, 0, 0, 255]));
            }
        }
    }
}

// ============================================================================
// Stale and late results
// ============================================================================

#[test]
fn test_previous_session_results_are_dropped() {
    let size = FrameSize::new(8, 8);
    let mut tracker = CompletionTracker::new();
    let mut buffers = DoubleBuffer::new(size);

    let old = begin(&mut tracker, &mut buffers, 1, size);
    let regions = begin(&mut tracker, &mut buffers, 2, size);

    let outcome = tracker.on_tile_result(&mut buffers, result(1, 0, old[0], solid(size, RED)));
    assert_eq!(outcome, TileOutcome::Dropped(DropReason::UnknownSession));
    assert_eq!(buffers.write_surface().pixel(0, 0), Some([0, 0, 0, 0]));

    for (worker, region) in regions.iter().enumerate() {
        tracker.on_tile_result(&mut buffers, result(2, worker, *region, solid(size, RED)));
    }
    assert!(!tracker.is_in_flight());
    assert_eq!(tracker.dropped_results(), 1);
}

// ============================================================================
// Resize between frames
// ============================================================================

#[test]
fn test_resized_frame_leaves_no_stale_pixels() {
    let small = FrameSize::new(8, 6);
    let large = FrameSize::new(16, 12);
    let mut tracker = CompletionTracker::new();
    let mut buffers = DoubleBuffer::new(small);

    // Two frames at the small size so both surfaces hold red pixels
    for id in 1..=2 {
        let regions = begin(&mut tracker, &mut buffers, id, small);
        for (worker, region) in regions.iter().enumerate() {
            tracker.on_tile_result(&mut buffers, result(id, worker, *region, solid(small, RED)));
        }
        buffers.swap();
    }

    let regions = begin(&mut tracker, &mut buffers, 3, large);
    assert_eq!(buffers.write_surface().size(), large);
    assert!(buffers.write_surface().pixels().iter().all(|&b| b == 0));

    // Only the first tile arrives at the old size: rejected, nothing written
    let outcome = tracker.on_tile_result(&mut buffers, result(3, 0, regions[0], solid(small, RED)));
    assert_eq!(outcome, TileOutcome::Dropped(DropReason::SizeMismatch));

    let blue = [0, 0, 255, 255];
    for (worker, region) in regions.iter().enumerate() {
        tracker.on_tile_result(&mut buffers, result(3, worker, *region, solid(large, blue)));
    }
    buffers.swap();

    let visible = buffers.visible();
    assert_eq!(visible.dimensions(), (16, 12));
    assert!(visible.pixels().chunks_exact(4).all(|px| px == blue));
}
