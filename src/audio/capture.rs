//! Live capture using CPAL (Cross-Platform Audio Library).

use crate::audio::device::{CaptureDevice, DeviceId, DeviceStream, ReadOutcome};
use crate::audio::format::{AudioFormat, ByteOrder, Encoding};
use crate::defaults;
use crate::error::{PcgError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use std::time::Duration;

/// Run a closure with stderr temporarily redirected to /dev/null.
///
/// Suppresses the ALSA/JACK/PipeWire chatter CPAL triggers while probing
/// backends.
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

/// Name that selects the host's default input device.
pub const DEFAULT_DEVICE: &str = "default";

/// Device name patterns to filter out (outputs and surround sub-channels).
const FILTERED_PATTERNS: &[&str] = &[
    "surround",
    "front:",
    "rear:",
    "center:",
    "side:",
    "Digital Output",
    "HDMI",
    "S/PDIF",
];

/// Chunks buffered between the CPAL callback and the acquisition thread.
const CALLBACK_QUEUE_DEPTH: usize = 256;

fn should_filter_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    FILTERED_PATTERNS
        .iter()
        .any(|pattern| lower.contains(&pattern.to_lowercase()))
}

/// Append one i16 sample to `out` in the byte layout described by `format`.
fn encode_sample(sample: i16, format: &AudioFormat, out: &mut Vec<u8>) {
    match format.bits_per_sample {
        8 => {
            let high = (sample >> 8) as i8;
            match format.encoding {
                Encoding::Unsigned => out.push((high as i16 + 128) as u8),
                _ => out.push(high as u8),
            }
        }
        _ => match format.byte_order {
            ByteOrder::LittleEndian => out.extend_from_slice(&sample.to_le_bytes()),
            ByteOrder::BigEndian => out.extend_from_slice(&sample.to_be_bytes()),
        },
    }
}

/// Scale a float sample in [-1.0, 1.0] to i16, clamping out-of-range input.
fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Re-encodes callback buffers into the configured byte layout and queues
/// them for the acquisition thread.
///
/// `stride` is the channel count the stream was opened with; only the first
/// `format.channels` samples of each such frame are kept.
#[derive(Clone)]
struct ChunkSender {
    tx: Sender<Vec<u8>>,
    format: AudioFormat,
    stride: usize,
}

impl ChunkSender {
    fn encode<I>(&self, samples: I, len: usize) -> Vec<u8>
    where
        I: Iterator<Item = i16>,
    {
        let keep = (self.format.channels as usize).max(1);
        let stride = self.stride.max(keep);
        let mut bytes = Vec::with_capacity(len / stride * keep * self.format.bytes_per_sample());
        for (i, sample) in samples.enumerate() {
            if i % stride < keep {
                encode_sample(sample, &self.format, &mut bytes);
            }
        }
        bytes
    }

    fn send(&self, bytes: Vec<u8>) {
        if let Err(TrySendError::Full(_)) = self.tx.try_send(bytes) {
            tracing::debug!("capture queue full, dropping callback chunk");
        }
    }

    fn push_i16(&self, data: &[i16]) {
        self.send(self.encode(data.iter().copied(), data.len()));
    }

    fn push_f32(&self, data: &[f32]) {
        self.send(self.encode(data.iter().map(|&s| f32_to_i16(s)), data.len()));
    }
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: the stream is created on the thread that calls `open` and afterwards
/// only touched by the single acquisition thread that owns the `CpalStream`.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Capture device backed by the host's CPAL input devices.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalCaptureDevice;

impl CpalCaptureDevice {
    pub fn new() -> Self {
        Self
    }

    fn find_device(name: &str) -> Result<cpal::Device> {
        with_suppressed_stderr(|| {
            let host = cpal::default_host();

            if name == DEFAULT_DEVICE {
                return host
                    .default_input_device()
                    .ok_or_else(|| PcgError::DeviceUnavailable {
                        device: name.to_string(),
                        message: "no default input device".to_string(),
                    });
            }

            let devices = host
                .input_devices()
                .map_err(|e| PcgError::DeviceUnavailable {
                    device: name.to_string(),
                    message: format!("failed to enumerate devices: {}", e),
                })?;

            for dev in devices {
                if let Ok(dev_name) = dev.name()
                    && dev_name == name
                {
                    return Ok(dev);
                }
            }

            Err(PcgError::DeviceUnavailable {
                device: name.to_string(),
                message: "device not found".to_string(),
            })
        })
    }

    /// Build an input stream that feeds `sender`.
    ///
    /// Tries in order:
    /// 1. i16 at the requested rate and channel count
    /// 2. f32 at the same config, for devices that only expose float formats
    /// 3. the device's native config, if its rate matches, keeping the
    ///    requested channels of each native frame
    fn build_stream(
        device: &cpal::Device,
        format: &AudioFormat,
        sender: ChunkSender,
    ) -> std::result::Result<cpal::Stream, String> {
        let requested = cpal::StreamConfig {
            channels: format.channels,
            sample_rate: cpal::SampleRate(format.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };
        let err_callback = |err| {
            tracing::warn!(error = %err, "audio stream error");
        };

        let i16_sender = sender.clone();
        if let Ok(stream) = device.build_input_stream(
            &requested,
            move |data: &[i16], _: &cpal::InputCallbackInfo| i16_sender.push_i16(data),
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        let f32_sender = sender.clone();
        if let Ok(stream) = device.build_input_stream(
            &requested,
            move |data: &[f32], _: &cpal::InputCallbackInfo| f32_sender.push_f32(data),
            err_callback,
            None,
        ) {
            tracing::info!("[Capture] Using f32 input, converting to i16");
            return Ok(stream);
        }

        Self::build_stream_native(device, format, sender)
    }

    fn build_stream_native(
        device: &cpal::Device,
        format: &AudioFormat,
        mut sender: ChunkSender,
    ) -> std::result::Result<cpal::Stream, String> {
        use cpal::SampleFormat;

        let native = device
            .default_input_config()
            .map_err(|e| format!("failed to query default input config: {}", e))?;
        let native_rate = native.sample_rate().0;
        let native_channels = native.channels();

        if native_rate != format.sample_rate {
            return Err(format!(
                "device runs at {}Hz and cannot capture at {}Hz",
                native_rate, format.sample_rate
            ));
        }
        if native_channels < format.channels {
            return Err(format!(
                "device has {} channels, {} requested",
                native_channels, format.channels
            ));
        }

        tracing::info!(
            "[Capture] Using native format ({}ch/{}Hz/{:?})",
            native_channels,
            native_rate,
            native.sample_format()
        );
        sender.stride = native_channels as usize;
        let config: cpal::StreamConfig = native.clone().into();
        let err_callback = |err| {
            tracing::warn!(error = %err, "audio stream error");
        };

        match native.sample_format() {
            SampleFormat::I16 => device
                .build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| sender.push_i16(data),
                    err_callback,
                    None,
                )
                .map_err(|e| format!("failed to build native i16 stream: {}", e)),
            SampleFormat::F32 => device
                .build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| sender.push_f32(data),
                    err_callback,
                    None,
                )
                .map_err(|e| format!("failed to build native f32 stream: {}", e)),
            other => Err(format!("unsupported native sample format: {:?}", other)),
        }
    }
}

impl CaptureDevice for CpalCaptureDevice {
    /// List input devices, with [`DEFAULT_DEVICE`] first.
    fn list_devices(&self) -> Result<Vec<DeviceId>> {
        let devices = with_suppressed_stderr(|| cpal::default_host().input_devices());
        let devices = devices.map_err(|e| PcgError::DeviceUnavailable {
            device: DEFAULT_DEVICE.to_string(),
            message: format!("failed to enumerate input devices: {}", e),
        })?;

        let mut names = vec![DEFAULT_DEVICE.to_string()];
        for device in devices {
            if let Ok(name) = device.name()
                && !should_filter_device(&name)
                && name != DEFAULT_DEVICE
            {
                names.push(name);
            }
        }
        Ok(names)
    }

    fn open(&self, device_name: &str, format: &AudioFormat) -> Result<Box<dyn DeviceStream>> {
        let device = Self::find_device(device_name)?;
        let unavailable = |message: String| PcgError::DeviceUnavailable {
            device: device_name.to_string(),
            message,
        };

        let (tx, rx) = bounded::<Vec<u8>>(CALLBACK_QUEUE_DEPTH);
        let sender = ChunkSender {
            tx,
            format: *format,
            stride: format.channels as usize,
        };
        let stream = Self::build_stream(&device, format, sender).map_err(unavailable)?;

        stream
            .play()
            .map_err(|e| unavailable(format!("failed to start input stream: {}", e)))?;

        tracing::info!(device = device_name, format = %format, "opened capture device");

        // Half a second of audio stands in for the backend's opaque buffer.
        let buffer_size =
            (format.sample_rate as usize / 2 * format.frame_size()).max(format.frame_size());

        Ok(Box::new(CpalStream {
            stream: Some(SendableStream(stream)),
            receiver: rx,
            pending: Vec::new(),
            buffer_size,
        }))
    }
}

/// An open CPAL input stream feeding a bounded queue of byte chunks.
struct CpalStream {
    stream: Option<SendableStream>,
    receiver: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    buffer_size: usize,
}

impl DeviceStream for CpalStream {
    fn read(&mut self, buffer: &mut [u8]) -> Result<ReadOutcome> {
        if self.pending.is_empty() {
            if self.stream.is_none() {
                return Ok(ReadOutcome::EndOfStream);
            }
            match self
                .receiver
                .recv_timeout(Duration::from_millis(defaults::READ_TIMEOUT_MS))
            {
                Ok(bytes) => self.pending = bytes,
                Err(RecvTimeoutError::Timeout) => return Ok(ReadOutcome::NoData),
                Err(RecvTimeoutError::Disconnected) => return Ok(ReadOutcome::EndOfStream),
            }
        }

        let n = self.pending.len().min(buffer.len());
        buffer[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(ReadOutcome::Data(n))
    }

    fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn close(&mut self) -> Result<()> {
        if let Some(sendable) = self.stream.take() {
            sendable.0.pause().map_err(|e| PcgError::DeviceRead {
                message: format!("failed to stop input stream: {}", e),
            })?;
        }
        Ok(())
    }
}
