//! Microphone capture host
//!
//! Uses cpal for cross-platform capture. The stream lives on a dedicated
//! thread (cpal streams are not `Send`) and drives a `BlockDriver` from the
//! device callback.

use super::driver::BlockDriver;
use crate::config::RelayConfig;
use crate::processor::AudioBlockProcessor;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Capture host errors
#[derive(Error, Debug)]
pub enum HostError {
    #[error("No audio device found")]
    NoDevice,

    #[error("Input device not found: {0}")]
    DeviceNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Audio thread exited before capture started")]
    ThreadDied,
}

/// Format of the opened input device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StreamFormat {
    sample_rate: u32,
    channels: u16,
}

/// Commands to control the audio thread
enum HostCommand {
    Stop,
}

/// Handle to a running capture
pub struct CaptureHost {
    format: StreamFormat,
    command_tx: mpsc::Sender<HostCommand>,
    thread_handle: Option<JoinHandle<()>>,
}

impl CaptureHost {
    /// Open the configured input device and start invoking `processor`
    ///
    /// Blocks until the stream is playing or has failed to start.
    pub fn start(
        config: &RelayConfig,
        processor: Box<dyn AudioBlockProcessor>,
    ) -> Result<Self, HostError> {
        let (command_tx, command_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let device_name = config.device.clone();
        let block_size = config.block_size;

        let thread_handle = thread::Builder::new()
            .name("audio-capture".into())
            .spawn(move || {
                if let Err(e) =
                    run_capture(device_name, block_size, processor, ready_tx.clone(), command_rx)
                {
                    tracing::error!("Audio capture error: {}", e);
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|e| HostError::StreamError(e.to_string()))?;

        let format = match ready_rx.recv() {
            Ok(Ok(format)) => format,
            Ok(Err(e)) => {
                let _ = thread_handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread_handle.join();
                return Err(HostError::ThreadDied);
            }
        };

        Ok(Self {
            format,
            command_tx,
            thread_handle: Some(thread_handle),
        })
    }

    /// Stop capture and join the audio thread
    pub fn stop(&mut self) {
        let _ = self.command_tx.send(HostCommand::Stop);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.format.channels
    }

    /// List available input devices
    pub fn list_devices() -> Vec<String> {
        let host = cpal::default_host();
        host.input_devices()
            .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
            .unwrap_or_default()
    }
}

impl Drop for CaptureHost {
    fn drop(&mut self) {
        self.stop();
    }
}

fn find_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device, HostError> {
    match name {
        None => host.default_input_device().ok_or(HostError::NoDevice),
        Some(name) => host
            .input_devices()
            .map_err(|e| HostError::ConfigError(e.to_string()))?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| HostError::DeviceNotFound(name.to_string())),
    }
}

/// Run capture (in the dedicated thread)
fn run_capture(
    device_name: Option<String>,
    block_size: usize,
    processor: Box<dyn AudioBlockProcessor>,
    ready_tx: mpsc::SyncSender<Result<StreamFormat, HostError>>,
    command_rx: mpsc::Receiver<HostCommand>,
) -> Result<(), HostError> {
    let host = cpal::default_host();
    let device = find_device(&host, device_name.as_deref())?;

    tracing::info!("Audio device: {:?}", device.name());

    let supported_config = device
        .default_input_config()
        .map_err(|e| HostError::ConfigError(e.to_string()))?;

    if supported_config.sample_format() != cpal::SampleFormat::F32 {
        return Err(HostError::UnsupportedFormat(format!(
            "{:?}",
            supported_config.sample_format()
        )));
    }

    let format = StreamFormat {
        sample_rate: supported_config.sample_rate().0,
        channels: supported_config.channels(),
    };

    tracing::info!(
        "Audio config: {}Hz {}ch, blocks of {} frames",
        format.sample_rate,
        format.channels,
        block_size
    );

    let stream_config: cpal::StreamConfig = supported_config.into();
    let mut driver = BlockDriver::new(processor, format.channels as usize, block_size);

    let stream = device
        .build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                driver.push_interleaved(data);
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| HostError::StreamError(e.to_string()))?;

    stream
        .play()
        .map_err(|e| HostError::StreamError(e.to_string()))?;

    tracing::info!("Audio capture started");
    let _ = ready_tx.send(Ok(format));

    // Wait for stop signal
    loop {
        match command_rx.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(HostCommand::Stop) => {
                tracing::info!("Audio capture stopped");
                break;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}
