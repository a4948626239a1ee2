//! Outbound message channel used by processors

/// Sending half of a channel from the audio thread to the main thread
///
/// Posting never fails from the caller's point of view. Whatever the
/// transport does with a message it cannot deliver is its own concern.
#[cfg_attr(test, mockall::automock)]
pub trait MessagePort: Send {
    /// Send one block of samples
    fn post_message(&mut self, samples: &[f32]);
}

impl<P: MessagePort + ?Sized> MessagePort for Box<P> {
    fn post_message(&mut self, samples: &[f32]) {
        (**self).post_message(samples)
    }
}
