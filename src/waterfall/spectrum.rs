use std::fmt;
use std::sync::Arc;
use rustfft::{num_complex::Complex32, Fft, FftPlanner};
/// Floor applied before taking the logarithm so silent bins stay finite.
const POWER_FLOOR: f32 = 1e-20;
/// Turns real time-domain blocks into DC-centred dB magnitude vectors.
pub struct SpectrumBuilder {
    fft_size: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
}
impl fmt::Debug for SpectrumBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectrumBuilder")
            .field("fft_size", &self.fft_size)
            .finish()
    }
}
impl SpectrumBuilder {
    pub fn with_size(fft_size: usize) -> Self {
        let fft_size = fft_size.max(1);
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_size);
        Self {
            fft_size,
            fft,
            window: hann(fft_size),
        }
    }
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }
    /// Windowed magnitude spectrum in dB, negative frequencies first.
    ///
    /// Short blocks are zero-padded and long ones truncated to the FFT size.
    pub fn magnitude_db(&self, block: &[f32]) -> Vec<f32> {
        let mut buffer: Vec<Complex32> = block
            .iter()
            .zip(&self.window)
            .map(|(v, w)| Complex32::new(v * w, 0.0))
            .collect();
        buffer.resize(self.fft_size, Complex32::ZERO);
        self.fft.process(&mut buffer);
        let gain: f32 = self.window.iter().sum::<f32>().max(f32::EPSILON);
        let half = self.fft_size / 2;
        (0..self.fft_size)
            .map(|k| {
                let bin = buffer[(k + self.fft_size - half) % self.fft_size];
                let power = (bin.norm() / gain).powi(2);
                10.0 * power.max(POWER_FLOOR).log10()
            })
            .collect()
    }
}
fn hann(n: usize) -> Vec<f32> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.5 - 0.5 * (std::f32::consts::TAU * i as f32 / (n - 1) as f32).cos())
        .collect()
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn tone_peaks_in_expected_bin() {
        let n = 64;
        let builder = SpectrumBuilder::with_size(n);
        // A real tone at bin 8 shows up at +8 and -8 around DC.
        let block: Vec<f32> = (0..n)
            .map(|i| (std::f32::consts::TAU * 8.0 * i as f32 / n as f32).cos())
            .collect();
        let db = builder.magnitude_db(&block);
        assert_eq!(db.len(), n);
        let peak = db
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert!(peak == n / 2 + 8 || peak == n / 2 - 8, "peak at {peak}");
    }
    #[test]
    fn silence_is_floored_not_infinite() {
        let builder = SpectrumBuilder::with_size(16);
        let db = builder.magnitude_db(&[0.0; 16]);
        assert!(db.iter().all(|v| v.is_finite()));
        assert!((db[0] - 10.0 * POWER_FLOOR.log10()).abs() < 1e-3);
    }
}
