use std::sync::mpsc::{Receiver, TryRecvError};
use log::{debug, error, info, warn};
use crate::config::WaterfallConfig;
use crate::types::DisplayEvent;
use crate::waterfall::click::ClickState;
use crate::waterfall::clock::Tick;
use crate::waterfall::handoff::UpdateMessage;
use crate::waterfall::history::HistoryBuffer;
use crate::waterfall::range::RangeManager;
use crate::waterfall::raster::Interval;
use crate::waterfall::WaterfallError;
/// Anything that paints the waterfall. Called once after every applied event.
pub trait Renderer {
    fn redraw(&mut self, display: &WaterfallDisplay);
}
impl<F: FnMut(&WaterfallDisplay)> Renderer for F {
    fn redraw(&mut self, display: &WaterfallDisplay) {
        self(display)
    }
}
/// Consumer half of the waterfall. Owns one history buffer per channel and is
/// only ever touched from the display thread.
#[derive(Debug)]
pub struct WaterfallDisplay {
    buffers: Vec<HistoryBuffer>,
    ranges: RangeManager,
    vec_size: usize,
    history_rows: usize,
    update_interval: Option<Tick>,
    last_timestamp: Option<Tick>,
    observed: Option<Interval>,
    title: String,
    labels: Vec<String>,
    click: ClickState,
    updates_applied: u64,
}
impl WaterfallDisplay {
    pub fn new(config: &WaterfallConfig, click: ClickState) -> Result<Self, WaterfallError> {
        config.validate()?;
        let mut ranges = RangeManager::new(config.center_frequency, config.bandwidth)?;
        ranges.set_time_per_vec(config.time_per_vec_secs)?;
        let mut buffers = build_buffers(&ranges, config.channels, config.vec_size, config.history_rows)?;
        ranges.set_intensity_range(config.intensity_min, config.intensity_max, &mut buffers)?;
        let labels = (0..config.channels).map(|i| config.channel_label(i)).collect();
        Ok(Self {
            buffers,
            ranges,
            vec_size: config.vec_size,
            history_rows: config.history_rows,
            update_interval: None,
            last_timestamp: None,
            observed: None,
            title: config.title.clone(),
            labels,
            click,
            updates_applied: 0,
        })
    }
    pub fn buffers(&self) -> &[HistoryBuffer] {
        &self.buffers
    }
    pub fn channel(&self, index: usize) -> Option<&HistoryBuffer> {
        self.buffers.get(index)
    }
    pub fn channel_count(&self) -> usize {
        self.buffers.len()
    }
    pub fn vec_size(&self) -> usize {
        self.vec_size
    }
    pub fn history_rows(&self) -> usize {
        self.history_rows
    }
    pub fn ranges(&self) -> &RangeManager {
        &self.ranges
    }
    pub fn title(&self) -> &str {
        &self.title
    }
    pub fn label(&self, channel: usize) -> Option<&str> {
        self.labels.get(channel).map(String::as_str)
    }
    pub fn update_interval(&self) -> Option<Tick> {
        self.update_interval
    }
    pub fn updates_applied(&self) -> u64 {
        self.updates_applied
    }
    /// Extrema of every update applied since the last clear or autoscale.
    pub fn observed_range(&self) -> Option<Interval> {
        self.observed
    }
    /// Seconds spanned by the time axis.
    pub fn time_span(&self) -> f64 {
        self.ranges.time_span(self.history_rows)
    }
    /// Records a user selection for the producer to publish. Positions off the
    /// frequency axis are ignored.
    pub fn select_frequency(&self, frequency: f64) -> bool {
        if !self.ranges.frequency().contains(frequency) {
            return false;
        }
        self.click.record(frequency);
        true
    }
    /// Frames missed between the last applied update and one stamped `timestamp`.
    pub fn dropped_frames(&self, timestamp: Tick) -> usize {
        match (self.last_timestamp, self.update_interval) {
            (Some(last), Some(interval)) if interval > 0 => {
                let periods = timestamp.saturating_sub(last) / interval;
                usize::try_from(periods.saturating_sub(1)).unwrap_or(usize::MAX)
            }
            _ => 0,
        }
    }
    pub fn apply(&mut self, event: DisplayEvent) -> Result<(), WaterfallError> {
        match event {
            DisplayEvent::Update(message) => self.plot_update(message)?,
            DisplayEvent::SetVecSize(vec_size) => {
                if vec_size != self.vec_size {
                    self.rebuild(self.buffers.len(), vec_size, self.history_rows)?;
                }
            }
            DisplayEvent::SetChannelCount(channels) => {
                if channels != self.buffers.len() {
                    self.rebuild(channels, self.vec_size, self.history_rows)?;
                    self.labels.resize_with(channels, String::new);
                    for (i, label) in self.labels.iter_mut().enumerate() {
                        if label.is_empty() {
                            *label = format!("Data {i}");
                        }
                    }
                }
            }
            DisplayEvent::SetHistoryRows(rows) => {
                if rows != self.history_rows {
                    self.rebuild(self.buffers.len(), self.vec_size, rows)?;
                }
            }
            DisplayEvent::SetFrequencyRange { center, bandwidth } => {
                if self.ranges.set_frequency_range(center, bandwidth, &mut self.buffers)? {
                    self.forget_history();
                }
            }
            DisplayEvent::SetIntensityRange { min, max } => {
                self.ranges.set_intensity_range(min, max, &mut self.buffers)?
            }
            DisplayEvent::SetUpdateTime(interval) => {
                self.update_interval = Some(interval);
                self.last_timestamp = None;
            }
            DisplayEvent::SetTimePerVec(seconds) => self.ranges.set_time_per_vec(seconds)?,
            DisplayEvent::SetTitle(title) => self.title = title,
            DisplayEvent::SetChannelLabel { channel, label } => {
                let slot = self
                    .labels
                    .get_mut(channel)
                    .ok_or(WaterfallError::ChannelIndex(channel))?;
                *slot = label;
            }
            DisplayEvent::AutoScale => {
                if let Some(fitted) = self.ranges.autoscale(&mut self.buffers) {
                    info!("intensity autoscaled to [{:.1}, {:.1}]", fitted.min, fitted.max);
                }
                self.observed = None;
            }
            DisplayEvent::Clear => {
                for buffer in &mut self.buffers {
                    buffer.reset();
                }
                self.forget_history();
            }
        }
        Ok(())
    }
    fn plot_update(&mut self, message: UpdateMessage) -> Result<(), WaterfallError> {
        if message.num_channels() != self.buffers.len() {
            return Err(WaterfallError::ChannelMismatch {
                expected: self.buffers.len(),
                actual: message.num_channels(),
            });
        }
        // Check every channel before touching any, so the buffers move in lockstep.
        for vector in &message.channels {
            if vector.len() != self.vec_size {
                return Err(WaterfallError::VectorLengthMismatch {
                    expected: self.vec_size,
                    actual: vector.len(),
                });
            }
        }
        let dropped = self.dropped_frames(message.timestamp);
        if dropped > 0 {
            debug!("{dropped} frame(s) missed before tick {}", message.timestamp);
        }
        for (buffer, vector) in self.buffers.iter_mut().zip(&message.channels) {
            buffer.insert_row(vector, dropped)?;
        }
        self.observed = message
            .channels
            .iter()
            .flatten()
            .copied()
            .filter(|v| v.is_finite())
            .fold(self.observed, |acc, v| match acc {
                Some(seen) => Some(Interval::new(seen.min.min(v), seen.max.max(v))),
                None => Some(Interval::new(v, v)),
            });
        self.last_timestamp = Some(message.timestamp);
        self.updates_applied += 1;
        Ok(())
    }
    /// Swaps in freshly sized buffers; on failure the current ones stay untouched.
    fn rebuild(&mut self, channels: usize, vec_size: usize, history_rows: usize) -> Result<(), WaterfallError> {
        let mut buffers = build_buffers(&self.ranges, channels, vec_size, history_rows)?;
        let intensity = self.ranges.intensity();
        for buffer in &mut buffers {
            buffer.set_intensity(intensity);
        }
        self.buffers = buffers;
        self.vec_size = vec_size;
        self.history_rows = history_rows;
        self.forget_history();
        debug!("display rebuilt: {channels} channel(s), {vec_size} points, {history_rows} rows");
        Ok(())
    }
    fn forget_history(&mut self) {
        self.last_timestamp = None;
        self.observed = None;
    }
    /// Applies whatever is queued without blocking, redrawing after each event.
    /// Returns the number of events handled, or `Disconnected` once the producer
    /// has gone and the queue is empty.
    pub fn process_pending<R: Renderer + ?Sized>(
        &mut self,
        rx: &Receiver<DisplayEvent>,
        renderer: &mut R,
    ) -> Result<usize, WaterfallError> {
        let mut handled = 0;
        loop {
            match rx.try_recv() {
                Ok(event) => {
                    self.handle(event, renderer)?;
                    handled += 1;
                }
                Err(TryRecvError::Empty) => return Ok(handled),
                Err(TryRecvError::Disconnected) if handled > 0 => return Ok(handled),
                Err(TryRecvError::Disconnected) => return Err(WaterfallError::Disconnected),
            }
        }
    }
    /// Blocks on the queue until the producer hangs up, then releases the
    /// buffers. Returns the number of events handled.
    ///
    /// An allocation failure ends the loop early; pending events are discarded.
    pub fn run<R: Renderer + ?Sized>(
        &mut self,
        rx: Receiver<DisplayEvent>,
        renderer: &mut R,
    ) -> Result<u64, WaterfallError> {
        info!("display loop started");
        let mut handled = 0u64;
        while let Ok(event) = rx.recv() {
            if let Err(err) = self.handle(event, renderer) {
                self.shutdown(rx);
                return Err(err);
            }
            handled += 1;
        }
        info!("display loop finished after {handled} event(s)");
        self.teardown();
        Ok(handled)
    }
    /// Discards undelivered events and frees the history.
    pub fn shutdown(&mut self, rx: Receiver<DisplayEvent>) -> usize {
        let discarded = rx.try_iter().count();
        drop(rx);
        if discarded > 0 {
            debug!("discarded {discarded} pending event(s)");
        }
        self.teardown();
        discarded
    }
    fn teardown(&mut self) {
        self.buffers = Vec::new();
        self.forget_history();
    }
    fn handle<R: Renderer + ?Sized>(
        &mut self,
        event: DisplayEvent,
        renderer: &mut R,
    ) -> Result<(), WaterfallError> {
        match self.apply(event) {
            Ok(()) => {}
            Err(err @ WaterfallError::Allocation(_)) => {
                error!("display cannot continue: {err}");
                return Err(err);
            }
            Err(err) => warn!("display event rejected: {err}"),
        }
        renderer.redraw(self);
        Ok(())
    }
}
fn build_buffers(
    ranges: &RangeManager,
    channels: usize,
    vec_size: usize,
    history_rows: usize,
) -> Result<Vec<HistoryBuffer>, WaterfallError> {
    if channels == 0 {
        return Err(WaterfallError::InvalidDimensions);
    }
    (0..channels)
        .map(|_| HistoryBuffer::new(ranges.frequency(), vec_size, history_rows))
        .collect()
}
#[cfg(test)]
mod tests {
    use std::sync::mpsc::channel;
    use std::thread;
    use super::*;
    use crate::waterfall::handoff::{handoff_channel, HandoffPolicy};
    use crate::waterfall::raster::RasterData;
    fn config() -> WaterfallConfig {
        WaterfallConfig {
            vec_size: 3,
            channels: 2,
            center_frequency: 0.0,
            bandwidth: 2.0,
            history_rows: 4,
            ..WaterfallConfig::default()
        }
    }
    fn update(value: f64, timestamp: Tick) -> DisplayEvent {
        DisplayEvent::Update(UpdateMessage {
            channels: vec![vec![value; 3], vec![-value; 3]],
            num_points: 3,
            timestamp,
        })
    }
    #[test]
    fn updates_land_on_the_newest_row() {
        let mut display = WaterfallDisplay::new(&config(), ClickState::new()).unwrap();
        display.apply(update(5.0, 0)).unwrap();
        assert_eq!(display.channel(0).unwrap().row(3).unwrap(), &[5.0, 5.0, 5.0]);
        assert_eq!(display.channel(1).unwrap().row(3).unwrap(), &[-5.0, -5.0, -5.0]);
        assert_eq!(display.channel(0).unwrap().value_at(0.0, 0.0), 5.0);
        assert_eq!(display.observed_range(), Some(Interval::new(-5.0, 5.0)));
    }
    #[test]
    fn gaps_in_timestamps_become_blank_rows() {
        let mut display = WaterfallDisplay::new(&config(), ClickState::new()).unwrap();
        display.apply(DisplayEvent::SetUpdateTime(10)).unwrap();
        display.apply(update(1.0, 0)).unwrap();
        assert_eq!(display.dropped_frames(11), 0);
        assert_eq!(display.dropped_frames(25), 1);
        display.apply(update(2.0, 25)).unwrap();
        let buffer = display.channel(0).unwrap();
        assert_eq!(buffer.row(1).unwrap(), &[1.0, 1.0, 1.0]);
        assert_eq!(buffer.row(2).unwrap(), &[0.0, 0.0, 0.0]);
        assert_eq!(buffer.row(3).unwrap(), &[2.0, 2.0, 2.0]);
        assert_eq!(buffer.rows_written(), 3);
    }
    #[test]
    fn mismatched_updates_leave_every_channel_untouched() {
        let mut display = WaterfallDisplay::new(&config(), ClickState::new()).unwrap();
        let bad = DisplayEvent::Update(UpdateMessage {
            channels: vec![vec![1.0; 3], vec![1.0; 2]],
            num_points: 3,
            timestamp: 0,
        });
        assert!(matches!(
            display.apply(bad),
            Err(WaterfallError::VectorLengthMismatch { expected: 3, actual: 2 })
        ));
        assert!(display.buffers().iter().all(|b| b.rows_written() == 0));
        let single = DisplayEvent::Update(UpdateMessage {
            channels: vec![vec![1.0; 3]],
            num_points: 3,
            timestamp: 0,
        });
        assert!(display.apply(single).is_err());
    }
    #[test]
    fn reconfiguration_clears_and_resizes() {
        let mut display = WaterfallDisplay::new(&config(), ClickState::new()).unwrap();
        display.apply(update(3.0, 0)).unwrap();
        display.apply(DisplayEvent::SetVecSize(5)).unwrap();
        assert_eq!(display.channel(0).unwrap().vec_points(), 5);
        assert!(display.channel(0).unwrap().cells().iter().all(|&v| v == 0.0));
        display.apply(DisplayEvent::SetChannelCount(3)).unwrap();
        assert_eq!(display.channel_count(), 3);
        assert_eq!(display.label(2), Some("Data 2"));
        display.apply(DisplayEvent::SetHistoryRows(6)).unwrap();
        assert_eq!(display.history_rows(), 6);
        display
            .apply(DisplayEvent::SetFrequencyRange { center: 10.0, bandwidth: 4.0 })
            .unwrap();
        assert_eq!(display.channel(0).unwrap().frequency(), Interval::new(8.0, 12.0));
        assert!(display.apply(DisplayEvent::SetChannelLabel { channel: 9, label: "x".into() }).is_err());
    }
    #[test]
    fn autoscale_fits_populated_rows() {
        let mut display = WaterfallDisplay::new(&config(), ClickState::new()).unwrap();
        display.apply(update(7.0, 0)).unwrap();
        display.apply(DisplayEvent::AutoScale).unwrap();
        assert_eq!(display.ranges().intensity(), Interval::new(-7.0, 7.0));
        assert!(display.observed_range().is_none());
        display.apply(DisplayEvent::Clear).unwrap();
        assert!(display.channel(0).unwrap().cells().iter().all(|&v| v == 0.0));
    }
    #[test]
    fn selections_outside_the_axis_are_ignored() {
        let click = ClickState::new();
        let display = WaterfallDisplay::new(&config(), click.clone()).unwrap();
        assert!(!display.select_frequency(3.0));
        assert!(display.select_frequency(0.5));
        assert_eq!(click.take(), Some(0.5));
    }
    #[test]
    fn run_drains_in_order_and_releases_buffers() {
        let mut display = WaterfallDisplay::new(&config(), ClickState::new()).unwrap();
        let (tx, rx) = channel();
        let producer = thread::spawn(move || {
            for i in 0..10 {
                tx.send(update(i as f64, i)).unwrap();
            }
        });
        let mut newest = Vec::new();
        let handled = display
            .run(rx, &mut |d: &WaterfallDisplay| {
                newest.push(d.channel(0).unwrap().row(3).unwrap()[0]);
            })
            .unwrap();
        producer.join().unwrap();
        assert_eq!(handled, 10);
        assert_eq!(newest, (0..10).map(|i| i as f64).collect::<Vec<_>>());
        assert!(display.buffers().is_empty());
    }
    #[test]
    fn process_pending_reports_hangup() {
        let mut display = WaterfallDisplay::new(&config(), ClickState::new()).unwrap();
        let (tx, rx) = channel();
        tx.send(update(1.0, 0)).unwrap();
        let mut redraws = 0;
        let mut count = |_: &WaterfallDisplay| redraws += 1;
        assert_eq!(display.process_pending(&rx, &mut count).unwrap(), 1);
        drop(tx);
        assert!(matches!(
            display.process_pending(&rx, &mut count),
            Err(WaterfallError::Disconnected)
        ));
        assert_eq!(redraws, 1);
    }
    #[test]
    fn shutdown_discards_pending_events_and_releases_buffers() {
        let mut display = WaterfallDisplay::new(&config(), ClickState::new()).unwrap();
        let (poster, rx) = handoff_channel(HandoffPolicy::Unbounded);
        let message = |v: f64, t: Tick| UpdateMessage {
            channels: vec![vec![v; 3], vec![v; 3]],
            num_points: 3,
            timestamp: t,
        };
        for t in 0..3 {
            poster.post_update(message(1.0, t)).unwrap();
        }
        poster.post_control(DisplayEvent::AutoScale).unwrap();
        assert_eq!(display.shutdown(rx), 4);
        assert!(display.buffers().is_empty());
        assert!(matches!(
            poster.post_update(message(2.0, 3)),
            Err(WaterfallError::Disconnected)
        ));
    }
    #[test]
    fn allocation_failure_ends_the_loop() {
        let mut display = WaterfallDisplay::new(&config(), ClickState::new()).unwrap();
        let (poster, rx) = handoff_channel(HandoffPolicy::Unbounded);
        poster.post_control(update(1.0, 0)).unwrap();
        // Fits in usize but not in the address space.
        poster
            .post_control(DisplayEvent::SetHistoryRows(usize::MAX / 32))
            .unwrap();
        poster.post_control(update(2.0, 1)).unwrap();
        let mut redraws = 0;
        let result = display.run(rx, &mut |_: &WaterfallDisplay| redraws += 1);
        assert!(matches!(result, Err(WaterfallError::Allocation(_))));
        assert_eq!(redraws, 1);
        assert!(display.buffers().is_empty());
        assert!(matches!(
            poster.post_control(DisplayEvent::Clear),
            Err(WaterfallError::Disconnected)
        ));
    }
}
