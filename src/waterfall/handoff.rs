use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TrySendError};
use log::{trace, warn};
use crate::types::DisplayEvent;
use crate::waterfall::averager::AveragingState;
use crate::waterfall::clock::Tick;
use crate::waterfall::WaterfallError;
/// Owned snapshot of every channel's averaged vector at one trigger.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateMessage {
    pub channels: Vec<Vec<f64>>,
    pub num_points: usize,
    pub timestamp: Tick,
}
impl UpdateMessage {
    /// Deep-copies the producer's averaging state; nothing is shared with it afterwards.
    pub fn snapshot(states: &[AveragingState], timestamp: Tick) -> Result<Self, WaterfallError> {
        let num_points = states.first().map(|s| s.len()).unwrap_or(0);
        let mut channels = Vec::new();
        channels
            .try_reserve_exact(states.len())
            .map_err(|_| WaterfallError::Allocation(states.len()))?;
        for state in states {
            let mut copy = Vec::new();
            copy.try_reserve_exact(state.len())
                .map_err(|_| WaterfallError::Allocation(state.len()))?;
            copy.extend_from_slice(state.bins());
            channels.push(copy);
        }
        Ok(Self {
            channels,
            num_points,
            timestamp,
        })
    }
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }
}
/// Queueing behaviour between producer and display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HandoffPolicy {
    /// Never blocks and never drops; queue depth grows while the display stalls.
    #[default]
    Unbounded,
    /// At most `capacity` queued events; new updates are discarded while full.
    ///
    /// Control events are never discarded, so [`Poster::post_control`] blocks
    /// until there is room. Posting one from the thread that drains the queue
    /// while it is full deadlocks.
    DropNewest { capacity: usize },
}
/// What happened to a posted update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostOutcome {
    Queued,
    Dropped,
}
#[derive(Clone, Debug)]
enum Lane {
    Unbounded(Sender<DisplayEvent>),
    Bounded(SyncSender<DisplayEvent>),
}
/// Producer end of the handoff channel.
#[derive(Clone, Debug)]
pub struct Poster {
    lane: Lane,
}
impl Poster {
    /// Hands an update to the display without blocking.
    pub fn post_update(&self, message: UpdateMessage) -> Result<PostOutcome, WaterfallError> {
        let timestamp = message.timestamp;
        match &self.lane {
            Lane::Unbounded(tx) => tx
                .send(DisplayEvent::Update(message))
                .map(|_| PostOutcome::Queued)
                .map_err(|_| WaterfallError::Disconnected),
            Lane::Bounded(tx) => match tx.try_send(DisplayEvent::Update(message)) {
                Ok(()) => Ok(PostOutcome::Queued),
                Err(TrySendError::Full(_)) => {
                    warn!("display queue full; dropping update stamped {timestamp}");
                    Ok(PostOutcome::Dropped)
                }
                Err(TrySendError::Disconnected(_)) => Err(WaterfallError::Disconnected),
            },
        }
    }
    /// Sends a reconfiguration event. Control events are never discarded, so on a
    /// bounded lane this waits for room.
    pub fn post_control(&self, event: DisplayEvent) -> Result<(), WaterfallError> {
        trace!("posting control event {event:?}");
        let sent = match &self.lane {
            Lane::Unbounded(tx) => tx.send(event).is_ok(),
            Lane::Bounded(tx) => tx.send(event).is_ok(),
        };
        if sent {
            Ok(())
        } else {
            Err(WaterfallError::Disconnected)
        }
    }
}
/// Create the producer/display pair: `(Poster, Receiver<DisplayEvent>)`.
pub fn handoff_channel(policy: HandoffPolicy) -> (Poster, Receiver<DisplayEvent>) {
    match policy {
        HandoffPolicy::Unbounded => {
            let (tx, rx) = mpsc::channel();
            (
                Poster {
                    lane: Lane::Unbounded(tx),
                },
                rx,
            )
        }
        HandoffPolicy::DropNewest { capacity } => {
            let (tx, rx) = mpsc::sync_channel(capacity.max(1));
            (
                Poster {
                    lane: Lane::Bounded(tx),
                },
                rx,
            )
        }
    }
}
