//! Message channel between the audio thread and the main thread

mod message;
mod ring;

pub use message::MessagePort;
pub use ring::{ring_channel, RingPort, RingReceiver, MAX_BLOCK_SIZE, MAX_RING_SAMPLES};

#[cfg(test)]
pub use message::MockMessagePort;
