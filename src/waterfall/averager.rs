use crate::waterfall::WaterfallError;
/// Exponentially weighted magnitude per bin for one channel.
#[derive(Clone, Debug, PartialEq)]
pub struct AveragingState {
    bins: Vec<f64>,
}
impl AveragingState {
    pub fn zeroed(vec_points: usize) -> Self {
        Self {
            bins: vec![0.0; vec_points],
        }
    }
    pub fn len(&self) -> usize {
        self.bins.len()
    }
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
    pub fn bins(&self) -> &[f64] {
        &self.bins
    }
    /// `state[i] = (1 - alpha) * state[i] + alpha * input[i]`.
    pub fn update(&mut self, input: &[f32], alpha: f32) -> Result<(), WaterfallError> {
        if input.len() != self.bins.len() {
            return Err(WaterfallError::VectorLengthMismatch {
                expected: self.bins.len(),
                actual: input.len(),
            });
        }
        let alpha = f64::from(alpha);
        for (state, &value) in self.bins.iter_mut().zip(input) {
            *state = (1.0 - alpha) * *state + alpha * f64::from(value);
        }
        Ok(())
    }
}
/// Per-channel averaging stage owned by the producer.
#[derive(Clone, Debug)]
pub struct VectorAverager {
    states: Vec<AveragingState>,
    vec_points: usize,
    alpha: f32,
}
impl VectorAverager {
    pub fn new(channels: usize, vec_points: usize, alpha: f32) -> Result<Self, WaterfallError> {
        check_alpha(alpha)?;
        Ok(Self {
            states: vec![AveragingState::zeroed(vec_points); channels],
            vec_points,
            alpha,
        })
    }
    pub fn alpha(&self) -> f32 {
        self.alpha
    }
    pub fn set_alpha(&mut self, alpha: f32) -> Result<(), WaterfallError> {
        check_alpha(alpha)?;
        self.alpha = alpha;
        Ok(())
    }
    pub fn vec_points(&self) -> usize {
        self.vec_points
    }
    pub fn channel_count(&self) -> usize {
        self.states.len()
    }
    /// Drops all averaging history and adopts new dimensions.
    pub fn resize(&mut self, channels: usize, vec_points: usize) {
        self.vec_points = vec_points;
        self.states = vec![AveragingState::zeroed(vec_points); channels];
    }
    pub fn update_channel(&mut self, channel: usize, input: &[f32]) -> Result<(), WaterfallError> {
        let alpha = self.alpha;
        self.states
            .get_mut(channel)
            .ok_or(WaterfallError::ChannelIndex(channel))?
            .update(input, alpha)
    }
    pub fn states(&self) -> &[AveragingState] {
        &self.states
    }
}
fn check_alpha(alpha: f32) -> Result<(), WaterfallError> {
    if (0.0..=1.0).contains(&alpha) {
        Ok(())
    } else {
        Err(WaterfallError::InvalidAverage(alpha))
    }
}
