//! Real audio capture using CPAL (Cross-Platform Audio Library).
//!
//! Opens the default input device at 16kHz mono and pushes each driver
//! callback's samples into the shared [`SampleQueue`]. The data callback
//! never blocks and never logs; device status anomalies are reported by
//! the error callback on stderr and do not stop the stream.

use crate::audio::block::AudioBlock;
use crate::audio::queue::SampleQueue;
use crate::audio::source::CaptureSource;
use crate::audio::wav;
use crate::defaults;
use crate::error::{EchoscribeError, Result};
use crate::pipeline::state::PipelineState;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::Arc;

/// Run a closure with stderr temporarily redirected to /dev/null.
///
/// This suppresses noisy ALSA/JACK/PipeWire messages that CPAL triggers
/// when probing audio backends. The messages are harmless but confusing to users.
///
/// # Safety
/// Uses `libc::dup`/`libc::dup2` to save and restore file descriptor 2 (stderr).
/// Safe as long as no other thread is concurrently manipulating fd 2.
fn with_suppressed_stderr<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    unsafe {
        let saved_fd = libc::dup(2);
        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
        if saved_fd >= 0 && devnull >= 0 {
            libc::dup2(devnull, 2);
            libc::close(devnull);
        }

        let result = f();

        if saved_fd >= 0 {
            libc::dup2(saved_fd, 2);
            libc::close(saved_fd);
        }

        result
    }
}

/// Suppress noisy JACK/ALSA error messages that occur during audio backend probing.
///
/// # Safety
/// This modifies environment variables which is safe when called before spawning threads.
pub fn suppress_audio_warnings() {
    // SAFETY: Called at startup before any threads are spawned
    unsafe {
        std::env::set_var("JACK_NO_START_SERVER", "1");
        std::env::set_var("JACK_NO_AUDIO_RESERVATION", "1");
        std::env::set_var("PIPEWIRE_DEBUG", "0");
        std::env::set_var("ALSA_DEBUG", "0");
        std::env::set_var("PW_LOG", "0");
    }
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: the stream is only touched from one thread at a time. It is
/// created in `start` and consumed in `stop`, both called through the
/// exclusive `&mut self` of the owning capture.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Microphone capture backed by CPAL.
///
/// Captures mono f32 audio at 16kHz. Tries the preferred format first
/// (f32/16kHz/mono), then i16 with conversion, then the device's default
/// config with software conversion (channel mixing + resampling).
pub struct CpalCapture {
    sample_rate: u32,
    stream: Option<SendableStream>,
}

impl CpalCapture {
    /// Create a capture for the default input device at the pipeline rate.
    pub fn new() -> Self {
        Self::with_sample_rate(defaults::SAMPLE_RATE)
    }

    /// Create a capture with a custom sample rate.
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            stream: None,
        }
    }

    /// Open the system default input device.
    fn default_device() -> Result<cpal::Device> {
        with_suppressed_stderr(|| {
            let host = cpal::default_host();
            host.default_input_device()
                .ok_or_else(|| EchoscribeError::AudioDeviceNotFound {
                    device: "default".to_string(),
                })
        })
    }

    /// Build the input stream, trying formats from most to least preferred.
    fn build_stream(
        &self,
        device: &cpal::Device,
        queue: Arc<SampleQueue>,
        state: Arc<PipelineState>,
    ) -> Result<cpal::Stream> {
        let preferred_config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        // Device status anomalies are logged, never raised into the audio
        // thread. The callback must not panic or block.
        let err_callback = |err| {
            eprintln!("echoscribe: audio stream error: {}", err);
        };

        // Try f32/16kHz/mono, the pipeline's native format
        {
            let queue = Arc::clone(&queue);
            let state = Arc::clone(&state);
            if let Ok(stream) = device.build_input_stream(
                &preferred_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !state.is_running() {
                        return;
                    }
                    // The driver owns `data`; copy before the callback returns
                    queue.push(AudioBlock::copied_from(data));
                },
                err_callback,
                None,
            ) {
                return Ok(stream);
            }
        }

        // Try i16/16kHz/mono for devices that only expose integer formats
        {
            let queue = Arc::clone(&queue);
            let state = Arc::clone(&state);
            if let Ok(stream) = device.build_input_stream(
                &preferred_config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    if !state.is_running() {
                        return;
                    }
                    let samples = data.iter().map(|&s| s as f32 / 32768.0).collect();
                    queue.push(AudioBlock::new(samples));
                },
                err_callback,
                None,
            ) {
                return Ok(stream);
            }
        }

        // Fallback: capture at the device's native config, convert in software.
        self.build_stream_native(device, queue, state)
    }

    /// Build a stream using the device's default/native config, with software
    /// channel mixing (stereo→mono) and resampling (native rate→16kHz).
    fn build_stream_native(
        &self,
        device: &cpal::Device,
        queue: Arc<SampleQueue>,
        state: Arc<PipelineState>,
    ) -> Result<cpal::Stream> {
        use cpal::SampleFormat;

        let default_config =
            device
                .default_input_config()
                .map_err(|e| EchoscribeError::AudioCapture {
                    message: format!("Failed to query default input config: {}", e),
                })?;

        let native_rate = default_config.sample_rate().0;
        let native_channels = default_config.channels() as usize;
        let target_rate = self.sample_rate;

        let stream_config: cpal::StreamConfig = default_config.clone().into();

        eprintln!(
            "echoscribe: using native audio format ({}ch/{}Hz/{:?}), converting in software",
            native_channels,
            native_rate,
            default_config.sample_format(),
        );

        let err_callback = |err| {
            eprintln!("echoscribe: audio stream error: {}", err);
        };

        match default_config.sample_format() {
            SampleFormat::F32 => device
                .build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        if !state.is_running() {
                            return;
                        }
                        let converted =
                            convert_to_mono_16khz(data, native_channels, native_rate, target_rate);
                        queue.push(AudioBlock::new(converted));
                    },
                    err_callback,
                    None,
                )
                .map_err(|e| EchoscribeError::AudioCapture {
                    message: format!("Failed to build native f32 stream: {}", e),
                }),
            SampleFormat::I16 => device
                .build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        if !state.is_running() {
                            return;
                        }
                        let float_data: Vec<f32> =
                            data.iter().map(|&s| s as f32 / 32768.0).collect();
                        let converted = convert_to_mono_16khz(
                            &float_data,
                            native_channels,
                            native_rate,
                            target_rate,
                        );
                        queue.push(AudioBlock::new(converted));
                    },
                    err_callback,
                    None,
                )
                .map_err(|e| EchoscribeError::AudioCapture {
                    message: format!("Failed to build native i16 stream: {}", e),
                }),
            fmt => Err(EchoscribeError::AudioCapture {
                message: format!("Unsupported native sample format: {:?}", fmt),
            }),
        }
    }
}

impl Default for CpalCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSource for CpalCapture {
    fn start(&mut self, queue: Arc<SampleQueue>, state: Arc<PipelineState>) -> Result<()> {
        if self.stream.is_some() {
            return Ok(()); // Already started
        }

        let device = Self::default_device()?;
        let stream = self.build_stream(&device, queue, state)?;
        stream.play().map_err(|e| EchoscribeError::AudioCapture {
            message: format!("Failed to start audio stream: {}", e),
        })?;

        self.stream = Some(SendableStream(stream));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(sendable_stream) = self.stream.take() {
            sendable_stream
                .0
                .pause()
                .map_err(|e| EchoscribeError::AudioCapture {
                    message: format!("Failed to stop audio stream: {}", e),
                })?;
            // Dropping the stream closes the device; no more callbacks fire.
        }
        Ok(())
    }
}

/// Mix multi-channel audio to mono and resample to the target rate.
fn convert_to_mono_16khz(
    samples: &[f32],
    channels: usize,
    source_rate: u32,
    target_rate: u32,
) -> Vec<f32> {
    // Mix to mono by averaging channels
    let mono: Vec<f32> = if channels <= 1 {
        samples.to_vec()
    } else {
        samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    // Resample if needed
    if source_rate == target_rate {
        mono
    } else {
        wav::resample(&mono, source_rate, target_rate)
    }
}
