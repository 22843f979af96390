use crate::models::Position2D;
use crate::stage::PositionCombiner;

/// Per-coordinate arithmetic mean of the valid input positions.
/// Invalid inputs are left out; with none valid the result is invalid.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanPosition;

impl MeanPosition {
    pub fn new() -> Self {
        Self
    }
}

impl PositionCombiner for MeanPosition {
    fn name(&self) -> &str {
        "mean"
    }

    fn combine(&mut self, positions: &[Position2D]) -> Position2D {
        let (sum_x, sum_y, count) = positions
            .iter()
            .filter_map(Position2D::coords)
            .fold((0.0, 0.0, 0usize), |(sx, sy, n), (x, y)| (sx + x, sy + y, n + 1));

        if count == 0 {
            return Position2D::invalid();
        }
        Position2D::new(sum_x / count as f64, sum_y / count as f64)
    }
}
