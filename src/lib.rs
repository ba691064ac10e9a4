// src/lib.rs
pub mod config;
pub mod engine;
pub mod types;
pub mod waterfall;
pub use config::WaterfallConfig;
pub use engine::{spawn_producer, ProducerStats};
pub use types::{DisplayEvent, SinkCommand};
pub use waterfall::{
    ClickState, RasterData, Renderer, UpdateMessage, WaterfallDisplay, WaterfallError,
    WaterfallSink,
};
