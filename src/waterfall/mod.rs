// src/waterfall/mod.rs
// 声明同级目录下的子模块文件
pub mod averager;
pub mod click;
pub mod clock;
pub mod display;
pub mod error;
pub mod handoff;
pub mod history;
pub mod range;
pub mod raster;
pub mod scheduler;
pub mod sink;
pub mod source;
pub mod spectrum;
// 公开导出这些模块里的结构体，方便外部调用
pub use averager::{AveragingState, VectorAverager};
pub use click::{ClickState, FrequencyPort};
pub use clock::{Clock, ManualClock, MonotonicClock, Tick};
pub use display::{Renderer, WaterfallDisplay};
pub use error::WaterfallError;
pub use handoff::{handoff_channel, HandoffPolicy, PostOutcome, Poster, UpdateMessage};
pub use history::{HistoryBuffer, DEFAULT_HISTORY_ROWS, DEFAULT_INTENSITY};
pub use range::{frequency_bounds, RangeManager};
pub use raster::{Interval, RasterBounds, RasterData};
pub use scheduler::{UpdateScheduler, DEFAULT_UPDATE_TIME_SECS};
pub use sink::{WaterfallSink, AVERAGING_OFFSET};
pub use source::{ManualSource, SimulatedSource, VectorBatch, VectorSource};
pub use spectrum::SpectrumBuilder;
