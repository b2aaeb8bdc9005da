//! Default configuration constants for pcgscope.
//!
//! Shared by the configuration layer and the pipelines so that the two never
//! disagree on the reference capture format or window sizes.

/// Default capture sample rate in Hz.
pub const SAMPLE_RATE: u32 = 44100;

/// Default bits per sample for live capture.
pub const BIT_DEPTH: u16 = 16;

/// Channel count. Only mono capture is supported.
pub const CHANNELS: u16 = 1;

/// Number of samples kept in the live waveform window.
///
/// 65536 samples is roughly 1.5 seconds at 44.1kHz, enough to show a couple
/// of heart cycles.
pub const WAVEFORM_WINDOW_SIZE: usize = 65536;

/// Number of samples per spectral analysis window.
pub const FFT_WINDOW_SIZE: usize = 2048;

/// Each device read requests this fraction of the device's internal buffer.
pub const READ_CHUNK_DIVISOR: usize = 5;

/// Internal buffer size in bytes assumed for devices that do not report one.
///
/// Half a second of 16-bit mono at 44.1kHz.
pub const DEVICE_BUFFER_BYTES: usize = 44100;

/// Capacity of the snapshot channel between acquisition and presentation.
pub const CHANNEL_CAPACITY: usize = 64;

/// How long the end-of-session event waits for room in a full snapshot channel (ms).
pub const SESSION_END_TIMEOUT_MS: u64 = 500;

/// Upper bound of the frequency band shown by the spectrum view, in Hz.
///
/// Heart sounds and murmurs sit well below 3kHz.
pub const SPECTRUM_DISPLAY_MAX_HZ: f64 = 3000.0;

/// How long a device read waits for data before reporting "no data yet" (ms).
pub const READ_TIMEOUT_MS: u64 = 50;

/// Consecutive empty reads after which a stalled device is reported.
///
/// About five seconds with the cpal read timeout.
pub const EMPTY_READS_BEFORE_REPORT: u32 = 100;
