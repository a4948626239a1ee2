//! Host environment
//!
//! Opens the microphone and invokes a processor once per block.

mod capture;
mod driver;

pub use capture::{CaptureHost, HostError};
pub use driver::BlockDriver;
