// src/types.rs
use crate::waterfall::{Tick, UpdateMessage};

// Commands sent to the producer thread
#[derive(Clone, Debug, PartialEq)]
pub enum SinkCommand {
    SetVecSize(usize),
    SetChannelCount(usize),
    SetVecAverage(f32),
    SetUpdateTime(f64),
    SetFrequencyRange { center: f64, bandwidth: f64 },
    SetIntensityRange { min: f64, max: f64 },
    SetHistoryRows(usize),
    SetTimePerVec(f64),
    SetTitle(String),
    SetChannelLabel { channel: usize, label: String },
    ClearData,
    AutoScale,
    Stop,
}

// Events delivered to the display thread, in post order
#[derive(Clone, Debug, PartialEq)]
pub enum DisplayEvent {
    Update(UpdateMessage),
    SetVecSize(usize),
    SetChannelCount(usize),
    SetFrequencyRange { center: f64, bandwidth: f64 },
    SetIntensityRange { min: f64, max: f64 },
    SetHistoryRows(usize),
    // gating interval in producer clock ticks
    SetUpdateTime(Tick),
    SetTimePerVec(f64),
    SetTitle(String),
    SetChannelLabel { channel: usize, label: String },
    AutoScale,
    Clear,
}
