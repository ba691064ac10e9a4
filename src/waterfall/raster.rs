use crate::waterfall::history::HistoryBuffer;
/// Closed interval on one plot axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}
impl Interval {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
    pub fn width(&self) -> f64 {
        self.max - self.min
    }
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}
/// Extent of a raster on all three axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterBounds {
    pub frequency: Interval,
    pub time: Interval,
    pub intensity: Interval,
}
/// What a renderer needs from a waterfall: a cell lookup plus the plotted extent.
pub trait RasterData {
    /// Value of the cell nearest to `(x, y)`, or `0.0` outside the raster.
    fn value_at(&self, x: f64, y: f64) -> f64;
    fn bounds(&self) -> RasterBounds;
}
impl RasterData for HistoryBuffer {
    fn value_at(&self, x: f64, y: f64) -> f64 {
        let bounds = self.bounds();
        if !bounds.frequency.contains(x) || !bounds.time.contains(y) {
            return 0.0;
        }
        let columns = self.vec_points();
        let rows = self.history_rows();
        let col = ((x - bounds.frequency.min) / bounds.frequency.width()
            * (columns - 1) as f64)
            .round();
        let row = ((1.0 - y / bounds.time.max) * (rows - 1) as f64).floor();
        match (cell_index(col, columns), cell_index(row, rows)) {
            (Some(col), Some(row)) => self.cells()[row * columns + col],
            _ => 0.0,
        }
    }
    fn bounds(&self) -> RasterBounds {
        RasterBounds {
            frequency: self.frequency(),
            time: Interval::new(0.0, self.history_rows() as f64),
            intensity: self.intensity(),
        }
    }
}
fn cell_index(position: f64, len: usize) -> Option<usize> {
    if position.is_finite() && position >= 0.0 && position <= (len - 1) as f64 {
        Some(position as usize)
    } else {
        None
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn numbered(vec_points: usize, history_rows: usize) -> HistoryBuffer {
        let mut buf = HistoryBuffer::new(Interval::new(100.0, 200.0), vec_points, history_rows).unwrap();
        for r in 0..history_rows {
            let row: Vec<f64> = (0..vec_points)
                .map(|c| (r * vec_points + c + 1) as f64)
                .collect();
            buf.insert_row(&row, 0).unwrap();
        }
        buf
    }
    #[test]
    fn corners_resolve_to_corner_cells() {
        let buf = numbered(5, 4);
        let at = |col: usize, row: usize| buf.row(row).unwrap()[col];
        let h = buf.history_rows() as f64;
        assert_eq!(buf.value_at(100.0, h), at(0, 0));
        assert_eq!(buf.value_at(200.0, h), at(4, 0));
        assert_eq!(buf.value_at(100.0, 0.0), at(0, 3));
        assert_eq!(buf.value_at(200.0, 0.0), at(4, 3));
    }
    #[test]
    fn columns_round_to_nearest_bin() {
        let buf = numbered(5, 4);
        // Bin spacing is 25 Hz; 112 rounds to bin 0, 113 to bin 1.
        assert_eq!(buf.value_at(112.0, 0.0), buf.row(3).unwrap()[0]);
        assert_eq!(buf.value_at(113.0, 0.0), buf.row(3).unwrap()[1]);
    }
    #[test]
    fn outside_coordinates_read_zero() {
        let buf = numbered(5, 4);
        assert_eq!(buf.value_at(99.999, 1.0), 0.0);
        assert_eq!(buf.value_at(200.001, 1.0), 0.0);
        assert_eq!(buf.value_at(150.0, -0.001), 0.0);
        assert_eq!(buf.value_at(150.0, 4.001), 0.0);
        assert_eq!(buf.value_at(f64::NAN, 1.0), 0.0);
    }
    #[test]
    fn bounds_report_all_axes() {
        let buf = numbered(5, 4);
        let bounds = buf.bounds();
        assert_eq!(bounds.frequency, Interval::new(100.0, 200.0));
        assert_eq!(bounds.time, Interval::new(0.0, 4.0));
        assert_eq!(bounds.intensity, Interval::new(-200.0, 0.0));
    }
}
