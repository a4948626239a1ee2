//! Recorder processor
//!
//! Forwards the mono channel of the first input bus to the main thread,
//! untouched, once per block.

use super::block::{AudioBlockProcessor, InputBus, OutputBus, ParamMap};
use crate::port::MessagePort;

/// Relays bus 0 / channel 0 of every block through its message port
pub struct RecorderProcessor<P: MessagePort> {
    port: P,
}

impl<P: MessagePort> RecorderProcessor<P> {
    /// Create a recorder posting to `port`
    pub fn new(port: P) -> Self {
        Self { port }
    }
}

impl<P: MessagePort> AudioBlockProcessor for RecorderProcessor<P> {
    fn process(
        &mut self,
        inputs: &[InputBus<'_>],
        _outputs: &mut [OutputBus<'_>],
        _params: &ParamMap<'_>,
    ) -> bool {
        // The host leaves the input empty when no device is connected
        if let Some(samples) = inputs.first().and_then(|bus| bus.channel(0)) {
            self.port.post_message(samples);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MockMessagePort;
    use mockall::Sequence;

    fn run(processor: &mut impl AudioBlockProcessor, inputs: &[InputBus<'_>]) -> bool {
        processor.process(inputs, &mut [], &ParamMap::empty())
    }

    #[test]
    fn test_forwards_first_channel_unchanged() {
        let block: Vec<f32> = (0..128).map(|i| (i as f32 / 64.0) - 1.0).collect();
        let expected = block.clone();

        let mut port = MockMessagePort::new();
        port.expect_post_message()
            .withf(move |samples| samples.to_vec() == expected)
            .times(1)
            .return_const(());

        let mut recorder = RecorderProcessor::new(port);
        assert!(run(&mut recorder, &[InputBus::new(&block, 128)]));
    }

    #[test]
    fn test_ignores_other_channels_and_buses() {
        // Stereo bus 0: left = 1.0, right = 2.0; bus 1 carries 3.0
        let mut stereo = vec![1.0; 4];
        stereo.extend_from_slice(&[2.0; 4]);
        let other = [3.0; 4];

        let mut port = MockMessagePort::new();
        port.expect_post_message()
            .withf(|samples| samples.to_vec() == vec![1.0; 4])
            .times(1)
            .return_const(());

        let mut recorder = RecorderProcessor::new(port);
        let inputs = [InputBus::new(&stereo, 4), InputBus::new(&other, 4)];
        assert!(run(&mut recorder, &inputs));
    }

    #[test]
    fn test_absent_input_is_a_no_op() {
        let mut port = MockMessagePort::new();
        port.expect_post_message().times(0);

        let mut recorder = RecorderProcessor::new(port);

        // No bus at all
        assert!(run(&mut recorder, &[]));
        // Bus without channels
        assert!(run(&mut recorder, &[InputBus::new(&[], 128)]));
    }

    #[test]
    fn test_blocks_are_posted_in_order() {
        let blocks: Vec<Vec<f32>> = (0..5).map(|i| vec![i as f32; 8]).collect();

        let mut seq = Sequence::new();
        let mut port = MockMessagePort::new();
        for block in blocks.clone() {
            port.expect_post_message()
                .withf(move |samples| samples.to_vec() == block)
                .times(1)
                .in_sequence(&mut seq)
                .return_const(());
        }

        let mut recorder = RecorderProcessor::new(port);
        for block in &blocks {
            assert!(run(&mut recorder, &[InputBus::new(block, 8)]));
        }
    }

    #[test]
    fn test_outputs_and_params_are_untouched() {
        let input = [0.5; 4];
        let mut output = [0.0; 4];
        let automation = [1.0; 4];
        let entries = [("gain", &automation[..])];

        let mut port = MockMessagePort::new();
        port.expect_post_message().times(1).return_const(());

        let mut recorder = RecorderProcessor::new(port);
        let keep_alive = recorder.process(
            &[InputBus::new(&input, 4)],
            &mut [OutputBus::new(&mut output, 4)],
            &ParamMap::new(&entries),
        );

        assert!(keep_alive);
        assert_eq!(output, [0.0; 4]);
    }

    #[test]
    fn test_values_are_not_clipped() {
        let block = [2.5, -3.0, f32::MIN_POSITIVE, 0.0];
        let mut sent = Vec::new();

        struct Collect<'a>(&'a mut Vec<Vec<f32>>);
        impl MessagePort for Collect<'_> {
            fn post_message(&mut self, samples: &[f32]) {
                self.0.push(samples.to_vec());
            }
        }

        let mut recorder = RecorderProcessor::new(Collect(&mut sent));
        assert!(run(&mut recorder, &[InputBus::new(&block, 4)]));
        drop(recorder);

        assert_eq!(sent, vec![block.to_vec()]);
    }
}
