//! Recorder relay
//!
//! Captures the microphone, relays every block from the audio thread to
//! the main thread and writes the result as a WAV file on Ctrl-C.

use anyhow::Context;
use recorder_relay::pipeline::{PumpConfig, Recording, SamplePump};
use recorder_relay::{
    ring_channel, CaptureHost, ProcessorRegistry, RelayConfig, RECORDER_PROCESSOR_NAME,
};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::time::{interval, Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recorder_relay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Recorder relay v{}", env!("CARGO_PKG_VERSION"));

    let config = RelayConfig::from_env().context("invalid configuration")?;

    let devices = CaptureHost::list_devices();
    tracing::info!("Input devices: {:?}", devices);

    let registry = ProcessorRegistry::with_defaults();
    let (port, receiver) = ring_channel(config.block_size, config.ring_blocks);
    let processor = registry.create(RECORDER_PROCESSOR_NAME, Box::new(port))?;

    let mut host = CaptureHost::start(&config, processor).context("failed to start capture")?;

    let mut pump = SamplePump::new(
        receiver,
        PumpConfig {
            poll_interval: config.poll_interval(),
            ..Default::default()
        },
    );
    let mut blocks = pump.subscribe();
    pump.start().await?;

    tracing::info!(
        "Capturing {}Hz, relaying channel 0 of {}",
        host.sample_rate(),
        host.channels()
    );
    let mut recording = Recording::new(host.sample_rate());
    let mut report = interval(Duration::from_secs(1));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    tracing::info!("Recording, press Ctrl-C to stop");

    loop {
        tokio::select! {
            received = blocks.recv() => match received {
                Ok(block) => recording.push_block(&block),
                Err(RecvError::Lagged(n)) => tracing::warn!("Main thread lagged, {} blocks lost", n),
                Err(RecvError::Closed) => break,
            },
            _ = report.tick() => {
                let stats = pump.stats();
                tracing::debug!(
                    "{:.1}s recorded, peak {:.3}, {} blocks relayed, {} dropped",
                    recording.duration().as_secs_f32(),
                    recording.peak(),
                    stats.delivered,
                    stats.dropped
                );
            }
            _ = &mut ctrl_c => {
                tracing::info!("Stopping");
                break;
            }
        }
    }

    host.stop();
    pump.stop().await?;

    loop {
        match blocks.try_recv() {
            Ok(block) => recording.push_block(&block),
            Err(TryRecvError::Lagged(n)) => tracing::warn!("{} blocks lost on shutdown", n),
            Err(_) => break,
        }
    }

    recording
        .write_wav(&config.output)
        .with_context(|| format!("failed to write {}", config.output.display()))?;

    Ok(())
}
