use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use log::trace;
/// Bit pattern marking "no selection". A NaN payload no recorded value can carry,
/// since `record` canonicalises NaN inputs.
const EMPTY: u64 = 0x7ff8_0000_0000_0c1c;
/// Last frequency selected on the display, set by the display thread and
/// polled-and-cleared by the producer's control path.
///
/// Value and pending flag share one atomic word, so a selection is handed over
/// whole and at most once.
#[derive(Clone, Debug)]
pub struct ClickState {
    slot: Arc<AtomicU64>,
}
impl Default for ClickState {
    fn default() -> Self {
        Self {
            slot: Arc::new(AtomicU64::new(EMPTY)),
        }
    }
}
impl ClickState {
    pub fn new() -> Self {
        Self::default()
    }
    /// Records a selection. A newer click overwrites one not yet taken.
    pub fn record(&self, frequency: f64) {
        let bits = if frequency.is_nan() {
            f64::NAN.to_bits()
        } else {
            frequency.to_bits()
        };
        self.slot.store(bits, Ordering::Release);
    }
    /// Returns the pending selection, if any, and clears it.
    pub fn take(&self) -> Option<f64> {
        match self.slot.swap(EMPTY, Ordering::AcqRel) {
            EMPTY => None,
            bits => Some(f64::from_bits(bits)),
        }
    }
    pub fn is_pending(&self) -> bool {
        self.slot.load(Ordering::Acquire) != EMPTY
    }
}
/// Publish/subscribe output carrying selected frequencies, independent of the vector stream.
#[derive(Debug, Default)]
pub struct FrequencyPort {
    subscribers: Vec<Sender<f64>>,
}
impl FrequencyPort {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn subscribe(&mut self) -> Receiver<f64> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
    /// Sends `frequency` to every live subscriber, forgetting the ones that hung up.
    pub fn publish(&mut self, frequency: f64) -> usize {
        self.subscribers.retain(|tx| tx.send(frequency).is_ok());
        trace!(
            "published frequency {frequency} to {} subscribers",
            self.subscribers.len()
        );
        self.subscribers.len()
    }
}
