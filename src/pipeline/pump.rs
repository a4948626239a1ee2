//! Main-thread sample pump
//!
//! Drains the ring filled by the audio thread on a tokio interval and
//! republishes every block to subscribers.

use crate::port::RingReceiver;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Pump configuration
#[derive(Debug, Clone)]
pub struct PumpConfig {
    /// Interval between two drains of the ring
    pub poll_interval: Duration,
    /// Capacity of the broadcast channel (blocks)
    pub channel_capacity: usize,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            channel_capacity: 1024,
        }
    }
}

/// Pump errors
#[derive(Error, Debug)]
pub enum PumpError {
    #[error("Pump already running")]
    AlreadyRunning,

    #[error("Pump not started")]
    NotRunning,

    #[error("Pump task failed: {0}")]
    TaskFailed(String),
}

/// Pump state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpStatus {
    Stopped,
    Running,
    Stopping,
}

/// Counters shared with the pump task
#[derive(Debug, Default)]
struct Counters {
    delivered: AtomicU64,
    dropped: AtomicU64,
}

/// Snapshot of the pump counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PumpStats {
    /// Blocks received from the ring and published
    pub delivered: u64,
    /// Blocks the audio thread could not enqueue
    pub dropped: u64,
}

/// Moves blocks from the audio thread to async subscribers
pub struct SamplePump {
    config: PumpConfig,
    receiver: Option<RingReceiver>,
    status: Arc<RwLock<PumpStatus>>,
    counters: Arc<Counters>,
    block_tx: broadcast::Sender<Arc<[f32]>>,
    stop_tx: Option<mpsc::Sender<()>>,
    task: Option<JoinHandle<RingReceiver>>,
}

impl SamplePump {
    /// Create a stopped pump reading from `receiver`
    pub fn new(receiver: RingReceiver, config: PumpConfig) -> Self {
        let (block_tx, _) = broadcast::channel(config.channel_capacity.max(1));

        Self {
            config,
            receiver: Some(receiver),
            status: Arc::new(RwLock::new(PumpStatus::Stopped)),
            counters: Arc::new(Counters::default()),
            block_tx,
            stop_tx: None,
            task: None,
        }
    }

    /// Start draining the ring
    pub async fn start(&mut self) -> Result<(), PumpError> {
        {
            let status = self.status.read().await;
            if *status != PumpStatus::Stopped {
                return Err(PumpError::AlreadyRunning);
            }
        }

        let mut receiver = self
            .receiver
            .take()
            .ok_or_else(|| PumpError::TaskFailed("ring receiver lost".to_string()))?;

        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
        self.stop_tx = Some(stop_tx);

        let block_tx = self.block_tx.clone();
        let counters = Arc::clone(&self.counters);
        let poll_interval = self.config.poll_interval;

        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut block = Vec::new();

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        drain(&mut receiver, &block_tx, &counters, &mut block);
                    }
                    _ = stop_rx.recv() => {
                        tracing::debug!("Stop signal received");
                        break;
                    }
                }
            }

            // Blocks posted before the stop are still delivered
            let remaining = drain(&mut receiver, &block_tx, &counters, &mut block);
            tracing::debug!("Drained {} blocks on stop", remaining);
            receiver
        }));

        {
            let mut status = self.status.write().await;
            *status = PumpStatus::Running;
        }

        tracing::info!("Pump started");
        Ok(())
    }

    /// Stop the pump after a final drain
    pub async fn stop(&mut self) -> Result<(), PumpError> {
        {
            let mut status = self.status.write().await;
            if *status != PumpStatus::Running {
                return Err(PumpError::NotRunning);
            }
            *status = PumpStatus::Stopping;
        }

        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(()).await;
        }

        let result = match self.task.take() {
            Some(task) => task.await.map_err(|e| PumpError::TaskFailed(e.to_string())),
            None => Err(PumpError::TaskFailed("pump task missing".to_string())),
        };

        {
            let mut status = self.status.write().await;
            *status = PumpStatus::Stopped;
        }

        self.receiver = Some(result?);
        tracing::info!("Pump stopped");
        Ok(())
    }

    /// Return the current pump status
    pub async fn status(&self) -> PumpStatus {
        *self.status.read().await
    }

    /// Subscribe to relayed blocks
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<[f32]>> {
        self.block_tx.subscribe()
    }

    pub fn stats(&self) -> PumpStats {
        PumpStats {
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Publish every pending block, returning how many were moved
fn drain(
    receiver: &mut RingReceiver,
    block_tx: &broadcast::Sender<Arc<[f32]>>,
    counters: &Counters,
    block: &mut Vec<f32>,
) -> usize {
    let mut moved = 0;
    while receiver.try_recv(block) {
        // No subscriber is not an error
        let _ = block_tx.send(Arc::from(block.as_slice()));
        moved += 1;
    }

    counters.delivered.fetch_add(moved as u64, Ordering::Relaxed);
    counters
        .dropped
        .store(receiver.dropped_blocks(), Ordering::Relaxed);
    moved
}
