use log::debug;
use crate::waterfall::history::{HistoryBuffer, DEFAULT_INTENSITY};
use crate::waterfall::raster::Interval;
use crate::waterfall::WaterfallError;
/// Frequency and intensity bounds shared by every channel of a display.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeManager {
    center_frequency: f64,
    bandwidth: f64,
    intensity: Interval,
    time_per_vec: f64,
}
impl RangeManager {
    pub fn new(center_frequency: f64, bandwidth: f64) -> Result<Self, WaterfallError> {
        check_frequency(center_frequency, bandwidth)?;
        Ok(Self {
            center_frequency,
            bandwidth,
            intensity: DEFAULT_INTENSITY,
            time_per_vec: 0.1,
        })
    }
    pub fn center_frequency(&self) -> f64 {
        self.center_frequency
    }
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }
    /// `[center - bandwidth / 2, center + bandwidth / 2]`.
    pub fn frequency(&self) -> Interval {
        frequency_bounds(self.center_frequency, self.bandwidth)
    }
    pub fn start_frequency(&self) -> f64 {
        self.frequency().min
    }
    pub fn stop_frequency(&self) -> f64 {
        self.frequency().max
    }
    /// Rebinds the frequency axis. Buffers are rescaled (and therefore cleared)
    /// only when the bounds actually move; returns whether that happened.
    pub fn set_frequency_range(
        &mut self,
        center_frequency: f64,
        bandwidth: f64,
        buffers: &mut [HistoryBuffer],
    ) -> Result<bool, WaterfallError> {
        check_frequency(center_frequency, bandwidth)?;
        let bounds = frequency_bounds(center_frequency, bandwidth);
        if bounds == self.frequency() {
            return Ok(false);
        }
        for buffer in buffers.iter_mut() {
            buffer.resize_to(buffer.vec_points(), bounds, None)?;
        }
        self.center_frequency = center_frequency;
        self.bandwidth = bandwidth;
        debug!("frequency axis now [{}, {}]", bounds.min, bounds.max);
        Ok(true)
    }
    pub fn intensity(&self) -> Interval {
        self.intensity
    }
    pub fn set_intensity_range(
        &mut self,
        min: f64,
        max: f64,
        buffers: &mut [HistoryBuffer],
    ) -> Result<(), WaterfallError> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(WaterfallError::InvalidIntensityRange { min, max });
        }
        self.apply_intensity(Interval::new(min, max), buffers);
        Ok(())
    }
    /// Fits the intensity scale to the extrema of every populated cell.
    ///
    /// Returns the new range, or `None` (leaving the scale alone) when no buffer
    /// holds data yet.
    pub fn autoscale(&mut self, buffers: &mut [HistoryBuffer]) -> Option<Interval> {
        let (min, max) = buffers
            .iter()
            .flat_map(|buffer| buffer.populated_rows())
            .flatten()
            .copied()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if min > max {
            return None;
        }
        let fitted = Interval::new(min, max);
        self.apply_intensity(fitted, buffers);
        debug!("autoscaled intensity to [{min}, {max}]");
        Some(fitted)
    }
    pub fn time_per_vec(&self) -> f64 {
        self.time_per_vec
    }
    pub fn set_time_per_vec(&mut self, seconds: f64) -> Result<(), WaterfallError> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(WaterfallError::InvalidUpdateTime(seconds));
        }
        self.time_per_vec = seconds;
        Ok(())
    }
    /// Seconds covered by `history_rows` rows.
    pub fn time_span(&self, history_rows: usize) -> f64 {
        history_rows as f64 * self.time_per_vec
    }
    fn apply_intensity(&mut self, intensity: Interval, buffers: &mut [HistoryBuffer]) {
        self.intensity = intensity;
        for buffer in buffers.iter_mut() {
            buffer.set_intensity(intensity);
        }
    }
}
pub fn frequency_bounds(center_frequency: f64, bandwidth: f64) -> Interval {
    Interval::new(
        center_frequency - bandwidth / 2.0,
        center_frequency + bandwidth / 2.0,
    )
}
fn check_frequency(center_frequency: f64, bandwidth: f64) -> Result<(), WaterfallError> {
    if !center_frequency.is_finite() {
        return Err(WaterfallError::Config(format!(
            "center frequency must be finite, got {center_frequency}"
        )));
    }
    if !bandwidth.is_finite() || bandwidth <= 0.0 {
        return Err(WaterfallError::InvalidBandwidth(bandwidth));
    }
    Ok(())
}
