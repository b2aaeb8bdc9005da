use crate::audio::format::AudioFormat;
use crate::defaults;
use crate::error::{PcgError, Result};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Identifier of a capture device as reported by [`CaptureDevice::list_devices`].
pub type DeviceId = String;

/// Result of a single blocking device read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// This many bytes were written to the front of the buffer.
    Data(usize),
    /// Nothing arrived before the read gave up; try again.
    NoData,
    /// The device closed or the stream ran dry. No more data will come.
    EndOfStream,
}

/// An opened capture stream.
///
/// Owned by exactly one acquisition thread for the lifetime of a session.
pub trait DeviceStream: Send {
    /// Block until some bytes are available, the stream ends, or an
    /// implementation-defined timeout elapses.
    fn read(&mut self, buffer: &mut [u8]) -> Result<ReadOutcome>;

    /// Size of the device's internal buffer in bytes.
    fn buffer_size(&self) -> usize;

    /// Release the device. Calling this more than once is harmless.
    fn close(&mut self) -> Result<()>;
}

/// Trait for capture device backends.
///
/// This trait allows swapping implementations (real audio device vs mock).
pub trait CaptureDevice: Send + Sync {
    /// Names of the input devices that can be passed to [`CaptureDevice::open`].
    fn list_devices(&self) -> Result<Vec<DeviceId>>;

    /// Open `device` at `format`.
    ///
    /// # Errors
    /// Returns `PcgError::DeviceUnavailable` if the device is missing, busy,
    /// or cannot deliver the requested format.
    fn open(&self, device: &str, format: &AudioFormat) -> Result<Box<dyn DeviceStream>>;
}

/// Scripted capture device for testing.
///
/// Every `open` replays the configured chunks in order, then either ends the
/// stream or (with [`MockCaptureDevice::held_open`]) keeps reporting
/// [`ReadOutcome::NoData`] until closed.
#[derive(Debug, Clone)]
pub struct MockCaptureDevice {
    devices: Vec<DeviceId>,
    chunks: Vec<Vec<u8>>,
    buffer_size: usize,
    hold_open: bool,
    should_fail_open: bool,
    fail_read_after: Option<usize>,
    error_message: String,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl MockCaptureDevice {
    /// Create a mock exposing a single device named "mock" with no data.
    pub fn new() -> Self {
        Self {
            devices: vec!["mock".to_string()],
            chunks: Vec::new(),
            buffer_size: defaults::DEVICE_BUFFER_BYTES,
            hold_open: false,
            should_fail_open: false,
            fail_read_after: None,
            error_message: "mock device error".to_string(),
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replay 16-bit little-endian `samples`, `chunk_samples` per read.
    pub fn from_samples(samples: &[i16], chunk_samples: usize) -> Self {
        let chunks = samples
            .chunks(chunk_samples.max(1))
            .map(|chunk| chunk.iter().flat_map(|s| s.to_le_bytes()).collect())
            .collect();
        Self::new().with_chunks(chunks)
    }

    /// Configure the raw byte chunks returned by successive reads
    pub fn with_chunks(mut self, chunks: Vec<Vec<u8>>) -> Self {
        self.chunks = chunks;
        self
    }

    /// Configure the device names reported by `list_devices`
    pub fn with_devices(mut self, devices: Vec<DeviceId>) -> Self {
        self.devices = devices;
        self
    }

    /// Configure the internal buffer size reported by opened streams
    pub fn with_buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = bytes;
        self
    }

    /// Keep the stream open after the chunks are exhausted
    pub fn held_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Configure the mock to fail on open
    pub fn with_open_failure(mut self) -> Self {
        self.should_fail_open = true;
        self
    }

    /// Configure reads to fail after `reads` successful reads
    pub fn with_read_failure_after(mut self, reads: usize) -> Self {
        self.fail_read_after = Some(reads);
        self
    }

    /// Configure the error message for failures
    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    /// Number of streams opened so far.
    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of streams closed so far.
    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for MockCaptureDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureDevice for MockCaptureDevice {
    fn list_devices(&self) -> Result<Vec<DeviceId>> {
        Ok(self.devices.clone())
    }

    fn open(&self, device: &str, _format: &AudioFormat) -> Result<Box<dyn DeviceStream>> {
        if self.should_fail_open || !self.devices.iter().any(|d| d == device) {
            return Err(PcgError::DeviceUnavailable {
                device: device.to_string(),
                message: self.error_message.clone(),
            });
        }

        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockStream {
            chunks: self.chunks.iter().cloned().collect(),
            buffer_size: self.buffer_size,
            hold_open: self.hold_open,
            reads_left_before_failure: self.fail_read_after,
            error_message: self.error_message.clone(),
            closed: Arc::clone(&self.closed),
            is_closed: false,
        }))
    }
}

struct MockStream {
    chunks: VecDeque<Vec<u8>>,
    buffer_size: usize,
    hold_open: bool,
    reads_left_before_failure: Option<usize>,
    error_message: String,
    closed: Arc<AtomicUsize>,
    is_closed: bool,
}

impl DeviceStream for MockStream {
    fn read(&mut self, buffer: &mut [u8]) -> Result<ReadOutcome> {
        if self.is_closed {
            return Ok(ReadOutcome::EndOfStream);
        }

        if let Some(left) = self.reads_left_before_failure.as_mut() {
            if *left == 0 {
                return Err(PcgError::DeviceRead {
                    message: self.error_message.clone(),
                });
            }
            *left -= 1;
        }

        let Some(mut chunk) = self.chunks.pop_front() else {
            if self.hold_open {
                std::thread::sleep(Duration::from_millis(1));
                return Ok(ReadOutcome::NoData);
            }
            return Ok(ReadOutcome::EndOfStream);
        };

        let n = chunk.len().min(buffer.len());
        buffer[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            self.chunks.push_front(chunk.split_off(n));
        }
        Ok(ReadOutcome::Data(n))
    }

    fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn close(&mut self) -> Result<()> {
        if !self.is_closed {
            self.is_closed = true;
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
