// src/config.rs
use std::fs;
use std::path::Path;
use log::info;
use serde::{Deserialize, Serialize};
use crate::waterfall::{HandoffPolicy, WaterfallError, DEFAULT_HISTORY_ROWS, DEFAULT_UPDATE_TIME_SECS};
/// Everything needed to bring up a sink/display pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterfallConfig {
    pub title: String,
    pub vec_size: usize,
    pub channels: usize,
    /// Hz.
    pub center_frequency: f64,
    /// Hz.
    pub bandwidth: f64,
    /// EMA weight of the newest vector; 1.0 disables averaging.
    pub vec_average: f32,
    pub update_time_secs: f64,
    pub intensity_min: f64,
    pub intensity_max: f64,
    pub history_rows: usize,
    pub time_per_vec_secs: f64,
    pub channel_labels: Vec<String>,
    /// `None` keeps the display queue unbounded.
    pub queue_capacity: Option<usize>,
}
impl Default for WaterfallConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            vec_size: 1024,
            channels: 1,
            center_frequency: 0.0,
            bandwidth: 1.0,
            vec_average: 1.0,
            update_time_secs: DEFAULT_UPDATE_TIME_SECS,
            // Display starts at -200..0 dB until autoscaled.
            intensity_min: -200.0,
            intensity_max: 0.0,
            history_rows: DEFAULT_HISTORY_ROWS,
            time_per_vec_secs: DEFAULT_UPDATE_TIME_SECS,
            channel_labels: Vec::new(),
            queue_capacity: None,
        }
    }
}
impl WaterfallConfig {
    pub fn new(vec_size: usize, center_frequency: f64, bandwidth: f64, channels: usize) -> Self {
        Self {
            vec_size,
            center_frequency,
            bandwidth,
            channels,
            ..Self::default()
        }
    }
    pub fn validate(&self) -> Result<(), WaterfallError> {
        if self.vec_size == 0 || self.channels == 0 || self.history_rows == 0 {
            return Err(WaterfallError::InvalidDimensions);
        }
        if self.vec_size.checked_mul(self.history_rows).is_none() {
            return Err(WaterfallError::DimensionOverflow {
                vec_points: self.vec_size,
                history_rows: self.history_rows,
            });
        }
        if !self.center_frequency.is_finite() {
            return Err(WaterfallError::Config(format!(
                "center frequency must be finite, got {}",
                self.center_frequency
            )));
        }
        if !self.bandwidth.is_finite() || self.bandwidth <= 0.0 {
            return Err(WaterfallError::InvalidBandwidth(self.bandwidth));
        }
        if !(0.0..=1.0).contains(&self.vec_average) {
            return Err(WaterfallError::InvalidAverage(self.vec_average));
        }
        if !self.update_time_secs.is_finite() || self.update_time_secs < 0.0 {
            return Err(WaterfallError::InvalidUpdateTime(self.update_time_secs));
        }
        if !self.time_per_vec_secs.is_finite() || self.time_per_vec_secs <= 0.0 {
            return Err(WaterfallError::InvalidUpdateTime(self.time_per_vec_secs));
        }
        if !self.intensity_min.is_finite()
            || !self.intensity_max.is_finite()
            || self.intensity_min >= self.intensity_max
        {
            return Err(WaterfallError::InvalidIntensityRange {
                min: self.intensity_min,
                max: self.intensity_max,
            });
        }
        if self.queue_capacity == Some(0) {
            return Err(WaterfallError::Config("queue capacity must be at least 1".into()));
        }
        Ok(())
    }
    pub fn from_json_str(text: &str) -> Result<Self, WaterfallError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WaterfallError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        info!("loaded waterfall config from {}", path.display());
        Ok(config)
    }
    pub fn handoff_policy(&self) -> HandoffPolicy {
        match self.queue_capacity {
            Some(capacity) => HandoffPolicy::DropNewest { capacity },
            None => HandoffPolicy::Unbounded,
        }
    }
    /// Configured label, falling back to "Data N".
    pub fn channel_label(&self, channel: usize) -> String {
        self.channel_labels
            .get(channel)
            .filter(|label| !label.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("Data {channel}"))
    }
}
