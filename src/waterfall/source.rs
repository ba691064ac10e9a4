use std::collections::VecDeque;
use std::f32::consts::TAU;
use rand::Rng;
use crate::waterfall::spectrum::SpectrumBuilder;
use crate::waterfall::WaterfallError;
/// Batch of fixed-length vectors for every channel.
#[derive(Clone, Debug)]
pub struct VectorBatch {
    pub vec_size: usize,
    pub channels: Vec<Vec<f32>>, // channel -> items x vec_size, flattened
}
impl VectorBatch {
    pub fn new(vec_size: usize, channels: Vec<Vec<f32>>) -> Self {
        Self {
            vec_size,
            channels,
        }
    }
    /// Batch holding exactly one vector per channel.
    pub fn single(vectors: Vec<Vec<f32>>) -> Self {
        let vec_size = vectors.first().map(|v| v.len()).unwrap_or(0);
        Self::new(vec_size, vectors)
    }
    pub fn validate(&self, vec_size: usize, channels: usize) -> Result<(), WaterfallError> {
        if self.vec_size != vec_size {
            return Err(WaterfallError::VectorLengthMismatch {
                expected: vec_size,
                actual: self.vec_size,
            });
        }
        if self.channels.len() != channels {
            return Err(WaterfallError::ChannelMismatch {
                expected: channels,
                actual: self.channels.len(),
            });
        }
        if vec_size == 0 {
            return Err(WaterfallError::InvalidDimensions);
        }
        let items = self.num_items();
        for channel in &self.channels {
            if channel.len() % vec_size != 0 {
                return Err(WaterfallError::VectorLengthMismatch {
                    expected: vec_size,
                    actual: channel.len() % vec_size,
                });
            }
            if channel.len() / vec_size != items {
                return Err(WaterfallError::RaggedBatch);
            }
        }
        Ok(())
    }
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }
    pub fn num_items(&self) -> usize {
        if self.vec_size == 0 {
            return 0;
        }
        self.channels
            .first()
            .map(|c| c.len() / self.vec_size)
            .unwrap_or(0)
    }
    /// The `item`-th vector of `channel`, if present.
    pub fn vector(&self, channel: usize, item: usize) -> Option<&[f32]> {
        let start = item.checked_mul(self.vec_size)?;
        let end = start.checked_add(self.vec_size)?;
        self.channels.get(channel)?.get(start..end)
    }
}
/// Trait representing something that can yield vector batches on demand.
pub trait VectorSource {
    fn next_batch(&mut self) -> Result<Option<VectorBatch>, WaterfallError>;
}
/// In-memory source useful for tests and deterministic playback.
pub struct ManualSource {
    queue: VecDeque<VectorBatch>,
}
impl ManualSource {
    pub fn new(batches: impl IntoIterator<Item = VectorBatch>) -> Self {
        Self {
            queue: batches.into_iter().collect(),
        }
    }
    pub fn push(&mut self, batch: VectorBatch) {
        self.queue.push_back(batch);
    }
}
impl VectorSource for ManualSource {
    fn next_batch(&mut self) -> Result<Option<VectorBatch>, WaterfallError> {
        Ok(self.queue.pop_front())
    }
}
/// Drifting tones buried in white noise, rendered to dB spectra.
pub struct SimulatedSource {
    builder: SpectrumBuilder,
    sample_rate_hz: f32,
    tone_hz: Vec<f32>,
    drift_hz: f32,
    noise: f32,
    items_per_batch: usize,
    phase: Vec<f32>,
    elapsed_blocks: u64,
}
impl SimulatedSource {
    pub fn new(vec_size: usize, channels: usize, sample_rate_hz: f32) -> Self {
        let tone_hz = (0..channels)
            .map(|c| sample_rate_hz * (0.1 + 0.15 * c as f32))
            .collect();
        Self {
            builder: SpectrumBuilder::with_size(vec_size),
            sample_rate_hz,
            tone_hz,
            drift_hz: sample_rate_hz / 400.0,
            noise: 0.05,
            items_per_batch: 2,
            phase: vec![0.0; channels],
            elapsed_blocks: 0,
        }
    }
    pub fn with_items_per_batch(mut self, items: usize) -> Self {
        self.items_per_batch = items.max(1);
        self
    }
    pub fn with_noise(mut self, amplitude: f32) -> Self {
        self.noise = amplitude.max(0.0);
        self
    }
    fn render_block(&mut self, channel: usize, rng: &mut impl Rng) -> Vec<f32> {
        let n = self.builder.fft_size();
        let wobble = (self.elapsed_blocks as f32 * 0.02).sin() * self.drift_hz;
        let freq = self.tone_hz[channel] + wobble;
        let step = TAU * freq / self.sample_rate_hz;
        let mut phase = self.phase[channel];
        let block: Vec<f32> = (0..n)
            .map(|_| {
                let v = phase.sin() + self.noise * rng.gen_range(-1.0f32..1.0);
                phase = (phase + step) % TAU;
                v
            })
            .collect();
        self.phase[channel] = phase;
        self.builder.magnitude_db(&block)
    }
}
impl VectorSource for SimulatedSource {
    fn next_batch(&mut self) -> Result<Option<VectorBatch>, WaterfallError> {
        let mut rng = rand::thread_rng();
        let channel_count = self.tone_hz.len();
        let mut channels = vec![Vec::new(); channel_count];
        for _ in 0..self.items_per_batch {
            for (c, out) in channels.iter_mut().enumerate() {
                let spectrum = self.render_block(c, &mut rng);
                out.extend_from_slice(&spectrum);
            }
            self.elapsed_blocks += 1;
        }
        Ok(Some(VectorBatch::new(self.builder.fft_size(), channels)))
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn batch_validation_catches_shape_errors() {
        let ok = VectorBatch::new(2, vec![vec![0.0; 4], vec![1.0; 4]]);
        assert!(ok.validate(2, 2).is_ok());
        assert_eq!(ok.num_items(), 2);
        assert_eq!(ok.vector(1, 1), Some(&[1.0f32, 1.0][..]));
        assert!(ok.vector(1, 2).is_none());
        assert!(ok.vector(0, usize::MAX / 2).is_none());
        assert!(ok.vector(0, usize::MAX).is_none());
        assert!(matches!(
            ok.validate(3, 2),
            Err(WaterfallError::VectorLengthMismatch { .. })
        ));
        assert!(matches!(
            ok.validate(2, 1),
            Err(WaterfallError::ChannelMismatch { .. })
        ));
        let ragged = VectorBatch::new(2, vec![vec![0.0; 4], vec![0.0; 2]]);
        assert!(matches!(
            ragged.validate(2, 2),
            Err(WaterfallError::RaggedBatch)
        ));
        let torn = VectorBatch::new(2, vec![vec![0.0; 3]]);
        assert!(torn.validate(2, 1).is_err());
    }
    #[test]
    fn simulated_source_produces_valid_batches() {
        let mut source = SimulatedSource::new(64, 2, 48_000.0).with_items_per_batch(3);
        let batch = source.next_batch().unwrap().unwrap();
        batch.validate(64, 2).unwrap();
        assert_eq!(batch.num_items(), 3);
        assert!(batch.channels[0].iter().all(|v| v.is_finite()));
    }
    #[test]
    fn manual_source_plays_back_in_push_order() {
        let mut source = ManualSource::new([VectorBatch::single(vec![vec![1.0]])]);
        source.push(VectorBatch::single(vec![vec![2.0]]));
        let first = source.next_batch().unwrap().unwrap();
        let second = source.next_batch().unwrap().unwrap();
        assert_eq!(first.channels[0], vec![1.0]);
        assert_eq!(second.channels[0], vec![2.0]);
        assert!(source.next_batch().unwrap().is_none());
    }
    #[test]
    fn noiseless_sources_are_reproducible() {
        let mut a = SimulatedSource::new(32, 1, 8_000.0).with_noise(0.0);
        let mut b = SimulatedSource::new(32, 1, 8_000.0).with_noise(0.0);
        let (a, b) = (a.next_batch().unwrap().unwrap(), b.next_batch().unwrap().unwrap());
        assert_eq!(a.channels, b.channels);
    }
}
