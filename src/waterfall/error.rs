use thiserror::Error;
#[derive(Debug, Error)]
pub enum WaterfallError {
    #[error("vector length mismatch: expected {expected}, got {actual}")]
    VectorLengthMismatch { expected: usize, actual: usize },
    #[error("channel count mismatch: expected {expected}, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },
    #[error("channels in a batch must carry the same number of vectors")]
    RaggedBatch,
    #[error("vector size, channel count and history depth must be greater than zero")]
    InvalidDimensions,
    #[error("buffer dimensions {vec_points} x {history_rows} overflow the address space")]
    DimensionOverflow {
        vec_points: usize,
        history_rows: usize,
    },
    #[error("failed to allocate {0} values")]
    Allocation(usize),
    #[error("averaging weight must lie in [0, 1], got {0}")]
    InvalidAverage(f32),
    #[error("update time must be a finite, non-negative number of seconds, got {0}")]
    InvalidUpdateTime(f64),
    #[error("intensity range is empty or not finite: [{min}, {max}]")]
    InvalidIntensityRange { min: f64, max: f64 },
    #[error("bandwidth must be finite and greater than zero, got {0}")]
    InvalidBandwidth(f64),
    #[error("no channel with index {0}")]
    ChannelIndex(usize),
    #[error("display side hung up; update dropped")]
    Disconnected,
    #[error("invalid configuration: {0}")]
    Config(String),
}
impl From<serde_json::Error> for WaterfallError {
    fn from(value: serde_json::Error) -> Self {
        WaterfallError::Config(value.to_string())
    }
}
impl From<std::io::Error> for WaterfallError {
    fn from(value: std::io::Error) -> Self {
        WaterfallError::Config(value.to_string())
    }
}
