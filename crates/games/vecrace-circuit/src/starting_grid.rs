use vecrace_core::track::TrackBitmap;
use vecrace_core::vector::Vec2;

/// Starting positions for `racer_count` racers: the centres of the track's
/// start/finish cells in row-major order, reused in turn when there are more
/// racers than cells.
pub fn starting_grid(track: &TrackBitmap, racer_count: usize) -> Vec<Vec2> {
    let cells = track.start_cells();
    if cells.is_empty() {
        tracing::warn!(
            width = track.width(),
            height = track.height(),
            "Track has no start line, placing racers at its centre"
        );
        return vec![track.center(); racer_count];
    }
    (0..racer_count)
        .map(|i| cells[i % cells.len()].center())
        .collect()
}
