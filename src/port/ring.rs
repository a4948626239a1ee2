//! Lock-free block transport between the audio thread and the main thread
//!
//! Two single-producer/single-consumer rings from `ringbuf` are allocated up
//! front: one carries samples, the other the length of each posted block.
//! The producer writes samples before the length, so a length seen by the
//! consumer always refers to samples already in the ring.

use super::message::MessagePort;
use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Largest block accepted by the transport, in samples
pub const MAX_BLOCK_SIZE: usize = 8192;

/// Largest sample ring the transport allocates (~87s @ 48kHz)
pub const MAX_RING_SAMPLES: usize = 1 << 22;

/// Create a connected port/receiver pair
///
/// The sample ring holds `block_size * capacity_blocks` samples. Both
/// arguments are clamped to at least 1, `block_size` to `MAX_BLOCK_SIZE`
/// and the ring to `MAX_RING_SAMPLES`.
pub fn ring_channel(block_size: usize, capacity_blocks: usize) -> (RingPort, RingReceiver) {
    let block_size = block_size.clamp(1, MAX_BLOCK_SIZE);
    let capacity_blocks = capacity_blocks.clamp(1, MAX_RING_SAMPLES / block_size);
    let ring_samples = block_size
        .checked_mul(capacity_blocks)
        .map_or(MAX_RING_SAMPLES, |n| n.min(MAX_RING_SAMPLES));

    let (samples_tx, samples_rx) = HeapRb::<f32>::new(ring_samples).split();
    let (lengths_tx, lengths_rx) = HeapRb::<usize>::new(capacity_blocks).split();
    let dropped = Arc::new(AtomicU64::new(0));

    tracing::debug!(
        "Ring channel: {} blocks of {} samples",
        capacity_blocks,
        block_size
    );

    (
        RingPort {
            samples: samples_tx,
            lengths: lengths_tx,
            dropped: Arc::clone(&dropped),
        },
        RingReceiver {
            samples: samples_rx,
            lengths: lengths_rx,
            dropped,
        },
    )
}

/// Producer half, owned by the processor on the audio thread
pub struct RingPort {
    samples: HeapProd<f32>,
    lengths: HeapProd<usize>,
    dropped: Arc<AtomicU64>,
}

impl MessagePort for RingPort {
    fn post_message(&mut self, samples: &[f32]) {
        // A block is either delivered whole or not at all
        if self.samples.vacant_len() < samples.len() || self.lengths.is_full() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        self.samples.push_slice(samples);
        let _ = self.lengths.try_push(samples.len());
    }
}

/// Consumer half, read on the main thread
pub struct RingReceiver {
    samples: HeapCons<f32>,
    lengths: HeapCons<usize>,
    dropped: Arc<AtomicU64>,
}

impl RingReceiver {
    /// Pop the oldest pending block into `out`
    ///
    /// `out` is cleared and resized to the block length. Returns `false`
    /// if nothing is pending.
    pub fn try_recv(&mut self, out: &mut Vec<f32>) -> bool {
        let Some(len) = self.lengths.try_pop() else {
            return false;
        };

        out.clear();
        out.resize(len, 0.0);
        let read = self.samples.pop_slice(out);
        out.truncate(read);
        true
    }

    /// Number of blocks waiting to be received
    pub fn pending_blocks(&self) -> usize {
        self.lengths.occupied_len()
    }

    /// Blocks discarded because the ring was full
    pub fn dropped_blocks(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_arrive_in_order() {
        let (mut port, mut rx) = ring_channel(4, 8);

        port.post_message(&[1.0, 2.0, 3.0, 4.0]);
        port.post_message(&[5.0, 6.0]);
        assert_eq!(rx.pending_blocks(), 2);

        let mut out = Vec::new();
        assert!(rx.try_recv(&mut out));
        assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0]);
        assert!(rx.try_recv(&mut out));
        assert_eq!(out, vec![5.0, 6.0]);
        assert!(!rx.try_recv(&mut out));
    }

    #[test]
    fn test_full_ring_drops_whole_block() {
        let (mut port, mut rx) = ring_channel(2, 2);

        port.post_message(&[1.0, 2.0]);
        port.post_message(&[3.0, 4.0]);
        port.post_message(&[5.0, 6.0]);

        assert_eq!(rx.pending_blocks(), 2);
        assert_eq!(rx.dropped_blocks(), 1);

        let mut out = Vec::new();
        assert!(rx.try_recv(&mut out));
        assert_eq!(out, vec![1.0, 2.0]);

        // Space freed by the consumer is reused
        port.post_message(&[7.0, 8.0]);
        assert!(rx.try_recv(&mut out));
        assert_eq!(out, vec![3.0, 4.0]);
        assert!(rx.try_recv(&mut out));
        assert_eq!(out, vec![7.0, 8.0]);
    }

    #[test]
    fn test_oversized_block_is_dropped() {
        let (mut port, mut rx) = ring_channel(2, 1);

        port.post_message(&[0.0; 3]);

        let mut out = Vec::new();
        assert!(!rx.try_recv(&mut out));
        assert_eq!(rx.dropped_blocks(), 1);
    }

    #[test]
    fn test_oversized_request_is_clamped() {
        // Would overflow `block_size * capacity_blocks` without clamping
        let (mut port, mut rx) = ring_channel(usize::MAX, usize::MAX);

        let blocks = MAX_RING_SAMPLES / MAX_BLOCK_SIZE;
        let block = vec![0.5; MAX_BLOCK_SIZE];
        for _ in 0..=blocks {
            port.post_message(&block);
        }

        assert_eq!(rx.pending_blocks(), blocks);
        assert_eq!(rx.dropped_blocks(), 1);

        let mut out = Vec::new();
        assert!(rx.try_recv(&mut out));
        assert_eq!(out, block);
    }

    #[test]
    fn test_empty_block_is_delivered() {
        let (mut port, mut rx) = ring_channel(4, 2);
        port.post_message(&[]);

        let mut out = vec![9.0];
        assert!(rx.try_recv(&mut out));
        assert!(out.is_empty());
    }

    #[test]
    fn test_across_threads() {
        let (mut port, mut rx) = ring_channel(3, 64);

        let producer = std::thread::spawn(move || {
            for i in 0..50 {
                let v = i as f32;
                port.post_message(&[v, v + 0.5, v + 0.25]);
            }
        });
        producer.join().unwrap();

        let mut out = Vec::new();
        for i in 0..50 {
            assert!(rx.try_recv(&mut out));
            let v = i as f32;
            assert_eq!(out, vec![v, v + 0.5, v + 0.25]);
        }
        assert_eq!(rx.dropped_blocks(), 0);
    }
}
