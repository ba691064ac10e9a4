use log::debug;
use crate::waterfall::raster::Interval;
use crate::waterfall::WaterfallError;
/// Default display depth in rows.
pub const DEFAULT_HISTORY_ROWS: usize = 200;
/// Default intensity scale in dB.
pub const DEFAULT_INTENSITY: Interval = Interval {
    min: -200.0,
    max: 0.0,
};
/// Scrolling frequency x time store for one channel.
///
/// Cells are row-major, `vec_points` wide. Row `history_rows - 1` is always the
/// newest line and row `0` the oldest one still on screen.
#[derive(Clone, Debug)]
pub struct HistoryBuffer {
    cells: Vec<f64>,
    live: Vec<bool>, // row -> carries real data (not zero fill)
    vec_points: usize,
    history_rows: usize,
    frequency: Interval,
    intensity: Interval,
    rows_written: u64,
}
impl HistoryBuffer {
    pub fn new(
        frequency: Interval,
        vec_points: usize,
        history_rows: usize,
    ) -> Result<Self, WaterfallError> {
        let cells = zeroed_cells(vec_points, history_rows)?;
        Ok(Self {
            cells,
            live: vec![false; history_rows],
            vec_points,
            history_rows,
            frequency,
            intensity: DEFAULT_INTENSITY,
            rows_written: 0,
        })
    }
    pub fn vec_points(&self) -> usize {
        self.vec_points
    }
    pub fn history_rows(&self) -> usize {
        self.history_rows
    }
    pub fn frequency(&self) -> Interval {
        self.frequency
    }
    pub fn intensity(&self) -> Interval {
        self.intensity
    }
    pub fn set_intensity(&mut self, intensity: Interval) {
        self.intensity = intensity;
    }
    /// Rows inserted since the last reset, dropped-frame fill included.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
    pub fn cells(&self) -> &[f64] {
        &self.cells
    }
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        let start = row.checked_mul(self.vec_points)?;
        let end = start.checked_add(self.vec_points)?;
        self.cells.get(start..end)
    }
    /// Oldest row first.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.cells.chunks_exact(self.vec_points.max(1))
    }
    /// Rows that hold inserted vectors, oldest first. Zero fill and untouched rows are skipped.
    pub fn populated_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.rows()
            .zip(&self.live)
            .filter(|(_, live)| **live)
            .map(|(row, _)| row)
    }
    pub fn reset(&mut self) {
        self.cells.fill(0.0);
        self.live.fill(false);
        self.rows_written = 0;
    }
    /// Reallocates for new dimensions and bounds, then zeroes everything.
    ///
    /// Nothing is touched unless the new storage could be allocated.
    pub fn resize_to(
        &mut self,
        vec_points: usize,
        frequency: Interval,
        history_rows: Option<usize>,
    ) -> Result<(), WaterfallError> {
        let history_rows = history_rows.unwrap_or(self.history_rows);
        if vec_points != self.vec_points || history_rows != self.history_rows {
            let cells = zeroed_cells(vec_points, history_rows)?;
            self.cells = cells;
            self.live = vec![false; history_rows];
            self.vec_points = vec_points;
            self.history_rows = history_rows;
        }
        self.frequency = frequency;
        debug!(
            "history resized to {vec_points} x {history_rows}, frequency [{}, {}]",
            frequency.min, frequency.max
        );
        self.reset();
        Ok(())
    }
    /// Scrolls the history up and appends `vector` as the newest row.
    ///
    /// `dropped_frames` zero rows are placed before the new row so every row keeps
    /// standing for one update interval. When the gap reaches the buffer depth the
    /// whole history is discarded.
    pub fn insert_row(&mut self, vector: &[f64], dropped_frames: usize) -> Result<(), WaterfallError> {
        if vector.len() != self.vec_points {
            return Err(WaterfallError::VectorLengthMismatch {
                expected: self.vec_points,
                actual: vector.len(),
            });
        }
        let width = self.vec_points;
        let newest = self.history_rows - 1;
        let dropped = dropped_frames.min(newest);
        let kept = newest - dropped;
        if kept > 0 {
            self.cells
                .copy_within((dropped + 1) * width..self.history_rows * width, 0);
            self.live.copy_within(dropped + 1..self.history_rows, 0);
        }
        if dropped > 0 {
            self.cells[kept * width..newest * width].fill(0.0);
            self.live[kept..newest].fill(false);
        }
        self.cells[newest * width..].copy_from_slice(vector);
        self.live[newest] = true;
        self.rows_written = self.rows_written.saturating_add(dropped as u64 + 1);
        Ok(())
    }
    /// Deep-copies dimensions, bounds and contents into `other`.
    pub fn snapshot_into(&self, other: &mut HistoryBuffer) -> Result<(), WaterfallError> {
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(self.cells.len())
            .map_err(|_| WaterfallError::Allocation(self.cells.len()))?;
        cells.extend_from_slice(&self.cells);
        other.cells = cells;
        other.live.clone_from(&self.live);
        other.vec_points = self.vec_points;
        other.history_rows = self.history_rows;
        other.frequency = self.frequency;
        other.intensity = self.intensity;
        other.rows_written = self.rows_written;
        Ok(())
    }
}
fn zeroed_cells(vec_points: usize, history_rows: usize) -> Result<Vec<f64>, WaterfallError> {
    if vec_points == 0 || history_rows == 0 {
        return Err(WaterfallError::InvalidDimensions);
    }
    let len = vec_points
        .checked_mul(history_rows)
        .filter(|len| len.checked_mul(std::mem::size_of::<f64>()).is_some())
        .ok_or(WaterfallError::DimensionOverflow {
            vec_points,
            history_rows,
        })?;
    let mut cells = Vec::new();
    cells
        .try_reserve_exact(len)
        .map_err(|_| WaterfallError::Allocation(len))?;
    cells.resize(len, 0.0);
    Ok(cells)
}
