//! Main-thread side of the relay
//!
//! Drains blocks posted by the audio thread and accumulates them.

mod pump;
mod recording;

pub use pump::{PumpConfig, PumpError, PumpStats, PumpStatus, SamplePump};
pub use recording::{Recording, RecordingError};
