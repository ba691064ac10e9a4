// src/engine.rs
use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use log::{error, info, warn};
use crate::types::SinkCommand;
use crate::waterfall::{Clock, VectorSource, WaterfallError, WaterfallSink};
/// Counters reported when the producer thread exits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProducerStats {
    pub batches: u64,
    pub rejected_batches: u64,
    pub posted: u64,
    pub dropped: u64,
}
/// Runs the producer on its own thread: control commands first, then one batch
/// from `source` per pass, sleeping `pace` between passes.
///
/// The thread stops on [`SinkCommand::Stop`], when the command channel closes, or
/// when the display hangs up. Dropping the sink on exit closes the display queue.
pub fn spawn_producer<S, C>(
    mut sink: WaterfallSink<C>,
    mut source: S,
    rx_cmd: Receiver<SinkCommand>,
    pace: Duration,
) -> JoinHandle<Result<ProducerStats, WaterfallError>>
where
    S: VectorSource + Send + 'static,
    C: Clock + 'static,
{
    thread::spawn(move || {
        info!("producer started: {} channel(s) x {} points", sink.channel_count(), sink.vec_size());
        let mut stats = ProducerStats::default();
        'pump: loop {
            // 1. 命令处理
            for _ in 0..10 {
                match rx_cmd.try_recv() {
                    Ok(command) => match sink.apply(command) {
                        Ok(true) => {}
                        Ok(false) => break 'pump,
                        Err(WaterfallError::Disconnected) => break 'pump,
                        Err(err) => warn!("command rejected: {err}"),
                    },
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        info!("command channel closed");
                        break 'pump;
                    }
                }
            }
            // 2. 数据泵
            match source.next_batch() {
                Ok(Some(batch)) => {
                    stats.batches += 1;
                    match sink.work(&batch) {
                        Ok(_) => {}
                        Err(WaterfallError::Disconnected) => {
                            info!("display hung up");
                            break 'pump;
                        }
                        Err(err @ WaterfallError::Allocation(_)) => {
                            error!("producer aborting: {err}");
                            return Err(err);
                        }
                        Err(err) => {
                            stats.rejected_batches += 1;
                            warn!("batch rejected: {err}");
                        }
                    }
                    thread::sleep(pace);
                }
                Ok(None) => thread::sleep(pace.max(Duration::from_millis(50))),
                Err(err) => {
                    error!("source failed: {err}");
                    return Err(err);
                }
            }
        }
        stats.posted = sink.posted();
        stats.dropped = sink.dropped();
        info!(
            "producer stopped: {} batch(es), {} update(s) posted, {} dropped",
            stats.batches, stats.posted, stats.dropped
        );
        Ok(stats)
    })
}
#[cfg(test)]
mod tests {
    use std::sync::mpsc::channel;
    use super::*;
    use crate::config::WaterfallConfig;
    use crate::waterfall::{ManualClock, ManualSource, VectorBatch, WaterfallDisplay};
    #[test]
    fn producer_feeds_display_until_stopped() {
        let config = WaterfallConfig {
            vec_size: 2,
            history_rows: 3,
            update_time_secs: 0.0,
            ..WaterfallConfig::default()
        };
        let clock = ManualClock::new(1_000);
        let (sink, mut display, rx) = WaterfallSink::open(&config, clock.clone()).unwrap();
        let batches = (1..=3).map(|i| VectorBatch::single(vec![vec![i as f32; 2]]));
        let source = ManualSource::new(batches);
        let (tx_cmd, rx_cmd) = channel();
        let handle = spawn_producer(sink, source, rx_cmd, Duration::from_millis(1));
        // Keep the clock moving so every batch triggers.
        let ticker = thread::spawn(move || {
            for _ in 0..200 {
                clock.advance(10);
                thread::sleep(Duration::from_millis(1));
            }
            tx_cmd.send(SinkCommand::Stop).unwrap();
        });
        let mut rows = Vec::new();
        display
            .run(rx, &mut |d: &WaterfallDisplay| {
                if d.updates_applied() == 0 {
                    return;
                }
                if let Some(row) = d.channel(0).and_then(|b| b.row(2)) {
                    rows.push(row[0]);
                }
            })
            .unwrap();
        ticker.join().unwrap();
        let stats = handle.join().unwrap().unwrap();
        assert_eq!(stats.batches, 3);
        assert_eq!(stats.rejected_batches, 0);
        assert!(stats.posted >= 1);
        assert!(!rows.is_empty());
        assert!(rows.windows(2).all(|w| w[0] <= w[1]));
        assert!(rows.iter().all(|&v| (1.0..=3.0).contains(&v)));
    }
    #[test]
    fn malformed_batches_are_counted_not_fatal() {
        let config = WaterfallConfig {
            vec_size: 4,
            ..WaterfallConfig::default()
        };
        let (sink, _display, rx) = WaterfallSink::open(&config, ManualClock::new(1_000)).unwrap();
        let source = ManualSource::new([
            VectorBatch::single(vec![vec![0.0; 3]]),
            VectorBatch::single(vec![vec![0.0; 4]]),
        ]);
        let (tx_cmd, rx_cmd) = channel();
        let handle = spawn_producer(sink, source, rx_cmd, Duration::from_millis(1));
        thread::sleep(Duration::from_millis(100));
        tx_cmd.send(SinkCommand::Stop).unwrap();
        let stats = handle.join().unwrap().unwrap();
        assert_eq!(stats.batches, 2);
        assert_eq!(stats.rejected_batches, 1);
        assert_eq!(stats.posted, 1);
        drop(rx);
    }
}
