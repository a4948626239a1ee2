//! Block driver
//!
//! Device callbacks deliver interleaved frames in whatever size the backend
//! chooses. The driver regroups them into fixed blocks and invokes the
//! processor once per block, the way an audio graph host calls its nodes.

use crate::port::MAX_BLOCK_SIZE;
use crate::processor::{AudioBlockProcessor, InputBus, ParamMap};

/// Feeds fixed-size planar blocks to a processor
pub struct BlockDriver {
    processor: Box<dyn AudioBlockProcessor>,
    channels: usize,
    block_size: usize,
    /// Planar block under construction, `channels * block_size` samples
    scratch: Vec<f32>,
    filled: usize,
    active: bool,
    blocks: u64,
}

impl BlockDriver {
    /// Create a driver for `channels` interleaved input channels
    ///
    /// `block_size` is clamped to `1..=MAX_BLOCK_SIZE` and `channels` to the
    /// `u16` range devices report, so the scratch size cannot overflow.
    pub fn new(processor: Box<dyn AudioBlockProcessor>, channels: usize, block_size: usize) -> Self {
        let block_size = block_size.clamp(1, MAX_BLOCK_SIZE);
        let channels = channels.min(u16::MAX as usize);
        Self {
            processor,
            channels,
            block_size,
            scratch: vec![0.0; channels * block_size],
            filled: 0,
            active: true,
            blocks: 0,
        }
    }

    /// Push interleaved frames, running the processor for every full block
    ///
    /// A trailing partial frame (fewer samples than channels) is ignored.
    /// A device without input channels carries no frames to count, so each
    /// of its callbacks runs one block with a channel-less bus.
    /// Does not allocate.
    pub fn push_interleaved(&mut self, data: &[f32]) {
        if !self.active {
            return;
        }
        if self.channels == 0 {
            self.run_block();
            return;
        }

        for frame in data.chunks_exact(self.channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                self.scratch[ch * self.block_size + self.filled] = sample;
            }
            self.filled += 1;

            if self.filled == self.block_size {
                self.filled = 0;
                self.run_block();
                if !self.active {
                    return;
                }
            }
        }
    }

    fn run_block(&mut self) {
        let bus = InputBus::new(&self.scratch, self.block_size);
        self.active = self
            .processor
            .process(std::slice::from_ref(&bus), &mut [], &ParamMap::empty());
        self.blocks += 1;
    }

    /// Whether the processor still asks to be invoked
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Number of blocks handed to the processor
    pub fn blocks_processed(&self) -> u64 {
        self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{ring_channel, RingReceiver};
    use crate::processor::{OutputBus, RecorderProcessor};

    fn recorder_driver(channels: usize, block_size: usize) -> (BlockDriver, RingReceiver) {
        let (port, rx) = ring_channel(block_size, 16);
        let driver = BlockDriver::new(Box::new(RecorderProcessor::new(port)), channels, block_size);
        (driver, rx)
    }

    #[test]
    fn test_regroups_into_blocks() {
        let (mut driver, mut rx) = recorder_driver(1, 4);

        driver.push_interleaved(&[1.0, 2.0, 3.0]);
        assert_eq!(driver.blocks_processed(), 0);

        driver.push_interleaved(&[4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(driver.blocks_processed(), 2);

        let mut out = Vec::new();
        assert!(rx.try_recv(&mut out));
        assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0]);
        assert!(rx.try_recv(&mut out));
        assert_eq!(out, vec![5.0, 6.0, 7.0, 8.0]);
        assert!(!rx.try_recv(&mut out));
    }

    #[test]
    fn test_deinterleaves_first_channel() {
        let (mut driver, mut rx) = recorder_driver(2, 3);

        // L R L R L R
        driver.push_interleaved(&[0.1, -0.1, 0.2, -0.2, 0.3, -0.3]);

        let mut out = Vec::new();
        assert!(rx.try_recv(&mut out));
        assert_eq!(out, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_no_channels_reaches_absent_input_path() {
        let (mut driver, mut rx) = recorder_driver(0, 4);
        driver.push_interleaved(&[]);
        driver.push_interleaved(&[]);

        // The recorder is invoked with an empty bus, posts nothing and stays registered
        assert_eq!(driver.blocks_processed(), 2);
        assert!(driver.is_active());

        let mut out = Vec::new();
        assert!(!rx.try_recv(&mut out));
        assert_eq!(rx.dropped_blocks(), 0);
    }

    #[test]
    fn test_block_size_is_bounded() {
        let (port, mut rx) = ring_channel(MAX_BLOCK_SIZE, 4);
        let recorder = Box::new(RecorderProcessor::new(port));
        let mut driver = BlockDriver::new(recorder, 2, usize::MAX);

        driver.push_interleaved(&vec![0.25; 2 * MAX_BLOCK_SIZE]);

        assert_eq!(driver.blocks_processed(), 1);
        let mut out = Vec::new();
        assert!(rx.try_recv(&mut out));
        assert_eq!(out.len(), MAX_BLOCK_SIZE);
    }

    struct StopAfter {
        remaining: usize,
        calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    }

    impl AudioBlockProcessor for StopAfter {
        fn process(&mut self, _: &[InputBus<'_>], _: &mut [OutputBus<'_>], _: &ParamMap<'_>) -> bool {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.remaining -= 1;
            self.remaining > 0
        }
    }

    #[test]
    fn test_stops_invoking_after_false() {
        let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let processor = StopAfter {
            remaining: 2,
            calls: calls.clone(),
        };
        let mut driver = BlockDriver::new(Box::new(processor), 1, 2);

        driver.push_interleaved(&[0.0; 20]);

        assert!(!driver.is_active());
        assert_eq!(driver.blocks_processed(), 2);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
