// src/main.rs
use std::sync::mpsc::channel;
use std::thread;
use std::time::Duration;
use anyhow::{anyhow, Context};
use log::info;
use waterscroll::waterfall::{MonotonicClock, SimulatedSource};
use waterscroll::{
    spawn_producer, RasterData, Renderer, SinkCommand, WaterfallConfig, WaterfallDisplay,
    WaterfallSink,
};
/// Logs a summary now and then and "clicks" on the strongest bin once.
#[derive(Default)]
struct LogRenderer {
    frames: u64,
    clicked: bool,
}
impl Renderer for LogRenderer {
    fn redraw(&mut self, display: &WaterfallDisplay) {
        self.frames += 1;
        if self.frames % 10 != 0 {
            return;
        }
        let Some(buffer) = display.channel(0) else {
            return;
        };
        let bounds = buffer.bounds();
        // Scan the newest line through the raster lookup.
        let step = bounds.frequency.width() / (buffer.vec_points().max(2) - 1) as f64;
        let (peak_hz, peak_db) = (0..buffer.vec_points())
            .map(|i| bounds.frequency.min + i as f64 * step)
            .map(|hz| (hz, buffer.value_at(hz, 0.0)))
            .fold((bounds.frequency.min, f64::NEG_INFINITY), |best, cur| {
                if cur.1 > best.1 { cur } else { best }
            });
        info!(
            "[{}] frame {}: peak {:.0} Hz at {:.1} dB, scale [{:.1}, {:.1}] dB",
            display.title(),
            self.frames,
            peak_hz,
            peak_db,
            bounds.intensity.min,
            bounds.intensity.max
        );
        if !self.clicked && display.select_frequency(peak_hz) {
            self.clicked = true;
        }
    }
}
fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = match std::env::args().nth(1) {
        Some(path) => WaterfallConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => WaterfallConfig {
            title: "Simulated spectrum".to_owned(),
            vec_size: 256,
            channels: 2,
            center_frequency: 0.0,
            bandwidth: 48_000.0,
            vec_average: 0.3,
            ..WaterfallConfig::default()
        },
    };
    let (mut sink, mut display, rx) = WaterfallSink::open(&config, MonotonicClock::new())
        .context("building waterfall")?;
    let selections = sink.subscribe_frequency();
    let source = SimulatedSource::new(config.vec_size, config.channels, config.bandwidth as f32)
        .with_noise(0.1);
    let (tx_cmd, rx_cmd) = channel();
    let producer = spawn_producer(sink, source, rx_cmd, Duration::from_millis(5));
    let controller = thread::spawn(move || {
        thread::sleep(Duration::from_secs(2));
        tx_cmd.send(SinkCommand::AutoScale).ok();
        thread::sleep(Duration::from_secs(2));
        tx_cmd.send(SinkCommand::Stop).ok();
    });
    let mut renderer = LogRenderer::default();
    let handled = display.run(rx, &mut renderer).context("display loop")?;
    controller
        .join()
        .map_err(|_| anyhow!("controller thread panicked"))?;
    let stats = producer
        .join()
        .map_err(|_| anyhow!("producer thread panicked"))??;
    for frequency in selections.try_iter() {
        info!("selected {frequency:.0} Hz");
    }
    info!(
        "done: {handled} display event(s), {} update(s) posted, {} dropped",
        stats.posted, stats.dropped
    );
    Ok(())
}
