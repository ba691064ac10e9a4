use std::sync::mpsc::Receiver;
use log::{debug, info, trace};
use crate::config::WaterfallConfig;
use crate::types::{DisplayEvent, SinkCommand};
use crate::waterfall::averager::VectorAverager;
use crate::waterfall::click::{ClickState, FrequencyPort};
use crate::waterfall::clock::{Clock, Tick};
use crate::waterfall::display::WaterfallDisplay;
use crate::waterfall::handoff::{handoff_channel, PostOutcome, Poster, UpdateMessage};
use crate::waterfall::range::frequency_bounds;
use crate::waterfall::scheduler::UpdateScheduler;
use crate::waterfall::source::VectorBatch;
use crate::waterfall::WaterfallError;
/// Position inside each batch whose vector feeds the averager on a trigger.
///
/// Every trigger samples this same slot rather than sweeping the batch; output
/// depends on it, so it stays fixed. Batches holding a single vector use that one.
pub const AVERAGING_OFFSET: usize = 1;
/// Producer half of the waterfall: averages incoming vectors and, at most once per
/// update interval, hands an owned snapshot to the display.
pub struct WaterfallSink<C: Clock> {
    vec_size: usize,
    channels: usize,
    center_frequency: f64,
    bandwidth: f64,
    averager: VectorAverager,
    scheduler: UpdateScheduler<C>,
    poster: Poster,
    click: ClickState,
    port: FrequencyPort,
    posted: u64,
    dropped: u64,
}
impl<C: Clock> WaterfallSink<C> {
    pub fn new(
        config: &WaterfallConfig,
        clock: C,
        poster: Poster,
        click: ClickState,
    ) -> Result<Self, WaterfallError> {
        config.validate()?;
        let averager = VectorAverager::new(config.channels, config.vec_size, config.vec_average)?;
        let scheduler = UpdateScheduler::with_update_time(clock, config.update_time_secs)?;
        let sink = Self {
            vec_size: config.vec_size,
            channels: config.channels,
            center_frequency: config.center_frequency,
            bandwidth: config.bandwidth,
            averager,
            scheduler,
            poster,
            click,
            port: FrequencyPort::new(),
            posted: 0,
            dropped: 0,
        };
        // The display measures gaps in producer ticks, so it needs the interval up front.
        sink.poster
            .post_control(DisplayEvent::SetUpdateTime(sink.scheduler.update_interval()))?;
        Ok(sink)
    }
    /// Builds a connected sink and display sharing one click state.
    pub fn open(
        config: &WaterfallConfig,
        clock: C,
    ) -> Result<(Self, WaterfallDisplay, Receiver<DisplayEvent>), WaterfallError> {
        let click = ClickState::new();
        let display = WaterfallDisplay::new(config, click.clone())?;
        let (poster, rx) = handoff_channel(config.handoff_policy());
        let sink = Self::new(config, clock, poster, click)?;
        Ok((sink, display, rx))
    }
    pub fn vec_size(&self) -> usize {
        self.vec_size
    }
    pub fn channel_count(&self) -> usize {
        self.channels
    }
    pub fn vec_average(&self) -> f32 {
        self.averager.alpha()
    }
    pub fn update_interval(&self) -> Tick {
        self.scheduler.update_interval()
    }
    pub fn center_frequency(&self) -> f64 {
        self.center_frequency
    }
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }
    pub fn averager(&self) -> &VectorAverager {
        &self.averager
    }
    /// Updates handed to the display so far.
    pub fn posted(&self) -> u64 {
        self.posted
    }
    /// Updates discarded because a bounded display queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
    pub fn subscribe_frequency(&mut self) -> Receiver<f64> {
        self.port.subscribe()
    }
    /// Consumes one batch. Returns the number of vectors per channel it held.
    pub fn work(&mut self, batch: &VectorBatch) -> Result<usize, WaterfallError> {
        self.check_clicked();
        batch.validate(self.vec_size, self.channels)?;
        let items = batch.num_items();
        let offset = AVERAGING_OFFSET.min(items.saturating_sub(1));
        for _ in 0..items {
            let Some(now) = self.scheduler.poll() else {
                continue;
            };
            for channel in 0..self.channels {
                let vector = batch
                    .vector(channel, offset)
                    .ok_or(WaterfallError::ChannelIndex(channel))?;
                self.averager.update_channel(channel, vector)?;
            }
            let message = UpdateMessage::snapshot(self.averager.states(), now)?;
            match self.poster.post_update(message)? {
                PostOutcome::Queued => self.posted += 1,
                PostOutcome::Dropped => self.dropped += 1,
            }
            trace!("update posted at tick {now}");
        }
        Ok(items)
    }
    /// Publishes a pending display selection on the frequency port.
    pub fn check_clicked(&mut self) -> Option<f64> {
        let frequency = self.click.take()?;
        self.port.publish(frequency);
        Some(frequency)
    }
    pub fn set_vec_size(&mut self, vec_size: usize) -> Result<(), WaterfallError> {
        if vec_size == 0 {
            return Err(WaterfallError::InvalidDimensions);
        }
        if vec_size == self.vec_size {
            return Ok(());
        }
        self.averager.resize(self.channels, vec_size);
        self.vec_size = vec_size;
        debug!("vector size now {vec_size}");
        self.poster.post_control(DisplayEvent::SetVecSize(vec_size))
    }
    pub fn set_channel_count(&mut self, channels: usize) -> Result<(), WaterfallError> {
        if channels == 0 {
            return Err(WaterfallError::InvalidDimensions);
        }
        if channels == self.channels {
            return Ok(());
        }
        self.averager.resize(channels, self.vec_size);
        self.channels = channels;
        debug!("channel count now {channels}");
        self.poster.post_control(DisplayEvent::SetChannelCount(channels))
    }
    pub fn set_vec_average(&mut self, alpha: f32) -> Result<(), WaterfallError> {
        self.averager.set_alpha(alpha)
    }
    pub fn set_update_time(&mut self, seconds: f64) -> Result<(), WaterfallError> {
        self.scheduler.set_update_time(seconds)?;
        self.poster
            .post_control(DisplayEvent::SetUpdateTime(self.scheduler.update_interval()))
    }
    pub fn set_frequency_range(&mut self, center: f64, bandwidth: f64) -> Result<(), WaterfallError> {
        if !bandwidth.is_finite() || bandwidth <= 0.0 {
            return Err(WaterfallError::InvalidBandwidth(bandwidth));
        }
        if frequency_bounds(center, bandwidth) == frequency_bounds(self.center_frequency, self.bandwidth) {
            return Ok(());
        }
        self.center_frequency = center;
        self.bandwidth = bandwidth;
        self.poster
            .post_control(DisplayEvent::SetFrequencyRange { center, bandwidth })
    }
    pub fn set_intensity_range(&mut self, min: f64, max: f64) -> Result<(), WaterfallError> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(WaterfallError::InvalidIntensityRange { min, max });
        }
        self.poster
            .post_control(DisplayEvent::SetIntensityRange { min, max })
    }
    pub fn set_history_rows(&mut self, rows: usize) -> Result<(), WaterfallError> {
        if rows == 0 {
            return Err(WaterfallError::InvalidDimensions);
        }
        self.poster.post_control(DisplayEvent::SetHistoryRows(rows))
    }
    pub fn set_time_per_vec(&mut self, seconds: f64) -> Result<(), WaterfallError> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(WaterfallError::InvalidUpdateTime(seconds));
        }
        self.poster.post_control(DisplayEvent::SetTimePerVec(seconds))
    }
    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), WaterfallError> {
        self.poster.post_control(DisplayEvent::SetTitle(title.into()))
    }
    pub fn set_channel_label(
        &mut self,
        channel: usize,
        label: impl Into<String>,
    ) -> Result<(), WaterfallError> {
        if channel >= self.channels {
            return Err(WaterfallError::ChannelIndex(channel));
        }
        self.poster.post_control(DisplayEvent::SetChannelLabel {
            channel,
            label: label.into(),
        })
    }
    pub fn clear_data(&mut self) -> Result<(), WaterfallError> {
        self.poster.post_control(DisplayEvent::Clear)
    }
    pub fn auto_scale(&mut self) -> Result<(), WaterfallError> {
        self.poster.post_control(DisplayEvent::AutoScale)
    }
    /// Applies one control command. Returns `false` once asked to stop.
    pub fn apply(&mut self, command: SinkCommand) -> Result<bool, WaterfallError> {
        match command {
            SinkCommand::SetVecSize(n) => self.set_vec_size(n)?,
            SinkCommand::SetChannelCount(n) => self.set_channel_count(n)?,
            SinkCommand::SetVecAverage(alpha) => self.set_vec_average(alpha)?,
            SinkCommand::SetUpdateTime(t) => self.set_update_time(t)?,
            SinkCommand::SetFrequencyRange { center, bandwidth } => {
                self.set_frequency_range(center, bandwidth)?
            }
            SinkCommand::SetIntensityRange { min, max } => self.set_intensity_range(min, max)?,
            SinkCommand::SetHistoryRows(rows) => self.set_history_rows(rows)?,
            SinkCommand::SetTimePerVec(t) => self.set_time_per_vec(t)?,
            SinkCommand::SetTitle(title) => self.set_title(title)?,
            SinkCommand::SetChannelLabel { channel, label } => self.set_channel_label(channel, label)?,
            SinkCommand::ClearData => self.clear_data()?,
            SinkCommand::AutoScale => self.auto_scale()?,
            SinkCommand::Stop => {
                info!("sink stopping after {} updates", self.posted);
                return Ok(false);
            }
        }
        Ok(true)
    }
}
