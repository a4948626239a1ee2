//! Real-time block processors
//!
//! Callback interface invoked by the host, the recorder and the registry
//! the host instantiates processors from.

mod block;
mod recorder;
mod registry;

pub use block::{AudioBlockProcessor, InputBus, OutputBus, ParamMap};
pub use recorder::RecorderProcessor;
pub use registry::{ProcessorFactory, ProcessorRegistry, RegistryError, RECORDER_PROCESSOR_NAME};
