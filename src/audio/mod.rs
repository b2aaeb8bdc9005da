//! Audio input: PCM formats, byte decoding, capture devices and WAV files.

#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod decoder;
pub mod device;
pub mod format;
pub mod wav;

#[cfg(feature = "cpal-audio")]
pub use capture::CpalCaptureDevice;
pub use decoder::{decode, decode_full, ensure_supported};
pub use device::{CaptureDevice, DeviceId, DeviceStream, MockCaptureDevice, ReadOutcome};
pub use format::{AudioFormat, ByteOrder, Encoding};
pub use wav::WavFile;
