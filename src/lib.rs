//! Recorder relay
//!
//! Forwards microphone blocks, unmodified, from the real-time audio thread
//! to the main thread. The audio side is a single processor invoked once
//! per block; the main side drains a lock-free ring on a tokio task.

pub mod config;
pub mod host;
pub mod pipeline;
pub mod port;
pub mod processor;

pub use config::{ConfigError, RelayConfig};
pub use host::{BlockDriver, CaptureHost, HostError};
pub use pipeline::{PumpConfig, Recording, SamplePump};
pub use port::{ring_channel, MessagePort, RingPort, RingReceiver};
pub use processor::{
    AudioBlockProcessor, InputBus, OutputBus, ParamMap, ProcessorRegistry, RecorderProcessor,
    RECORDER_PROCESSOR_NAME,
};
