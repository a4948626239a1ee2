//! Block processing interface
//!
//! Buses are stored planar: channel `i` occupies
//! `data[i * frames..(i + 1) * frames]`. This lets the host hand a whole
//! bus to the processor without building nested slices on the audio thread.

/// Read-only view over one input bus
#[derive(Debug, Clone, Copy)]
pub struct InputBus<'a> {
    data: &'a [f32],
    frames: usize,
}

impl<'a> InputBus<'a> {
    /// Wrap a planar buffer holding `data.len() / frames` channels
    pub fn new(data: &'a [f32], frames: usize) -> Self {
        Self { data, frames }
    }

    /// Number of frames per channel
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Number of channels carried by the bus
    pub fn channel_count(&self) -> usize {
        if self.frames == 0 {
            0
        } else {
            self.data.len() / self.frames
        }
    }

    /// Samples of channel `index`, or `None` if the bus does not carry it
    pub fn channel(&self, index: usize) -> Option<&'a [f32]> {
        if index >= self.channel_count() {
            return None;
        }
        let start = index * self.frames;
        self.data.get(start..start + self.frames)
    }
}

/// Mutable view over one output bus
#[derive(Debug)]
pub struct OutputBus<'a> {
    data: &'a mut [f32],
    frames: usize,
}

impl<'a> OutputBus<'a> {
    pub fn new(data: &'a mut [f32], frames: usize) -> Self {
        Self { data, frames }
    }

    pub fn channel_count(&self) -> usize {
        if self.frames == 0 {
            0
        } else {
            self.data.len() / self.frames
        }
    }

    pub fn channel_mut(&mut self, index: usize) -> Option<&mut [f32]> {
        if index >= self.channel_count() {
            return None;
        }
        let start = index * self.frames;
        self.data.get_mut(start..start + self.frames)
    }
}

/// Automation values for one block, keyed by parameter name
#[derive(Debug, Clone, Copy, Default)]
pub struct ParamMap<'a> {
    entries: &'a [(&'a str, &'a [f32])],
}

impl<'a> ParamMap<'a> {
    pub fn new(entries: &'a [(&'a str, &'a [f32])]) -> Self {
        Self { entries }
    }

    /// A block without any parameters
    pub fn empty() -> Self {
        Self { entries: &[] }
    }

    pub fn get(&self, name: &str) -> Option<&'a [f32]> {
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, values)| *values)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Callback invoked by the host once per audio block
///
/// Runs on the real-time audio thread: implementations must not allocate,
/// lock or block, and must finish well within one block's duration.
pub trait AudioBlockProcessor: Send {
    /// Process one block.
    ///
    /// Returns `true` to keep being invoked for subsequent blocks. Once
    /// `false` is returned the host stops calling the processor.
    fn process(
        &mut self,
        inputs: &[InputBus<'_>],
        outputs: &mut [OutputBus<'_>],
        params: &ParamMap<'_>,
    ) -> bool;
}

impl<P: AudioBlockProcessor + ?Sized> AudioBlockProcessor for Box<P> {
    fn process(
        &mut self,
        inputs: &[InputBus<'_>],
        outputs: &mut [OutputBus<'_>],
        params: &ParamMap<'_>,
    ) -> bool {
        (**self).process(inputs, outputs, params)
    }
}
