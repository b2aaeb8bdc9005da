//! Live capture session: one acquisition thread per recording.
//!
//! The thread owns the opened device stream and both sample windows. Each
//! positive read is decoded, appended to the waveform window (snapshot
//! published), then appended to the analysis window (one spectrum published
//! per completed window). Stop is cooperative through an atomic flag.

use crate::audio::decoder::{decode, ensure_supported};
use crate::audio::device::{CaptureDevice, DeviceId, DeviceStream, ReadOutcome};
use crate::audio::format::AudioFormat;
use crate::config::Config;
use crate::defaults;
use crate::error::{PcgError, Result};
use crate::pipeline::error::{ErrorReporter, LogReporter, StationError};
use crate::pipeline::sink::{EndReason, Renderer};
use crate::spectrum::SpectralEngine;
use crate::streaming::{AnalysisWindow, WaveformWindow};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

const STATION: &str = "acquisition";

/// Parameters fixed for the duration of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Format requested from the device.
    pub format: AudioFormat,
    /// Samples kept in the waveform window.
    pub waveform_window_size: usize,
    /// Samples per spectral analysis window.
    pub fft_window_size: usize,
    /// Each read asks for `buffer_size / read_chunk_divisor` bytes.
    pub read_chunk_divisor: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            format: AudioFormat::default(),
            waveform_window_size: defaults::WAVEFORM_WINDOW_SIZE,
            fft_window_size: defaults::FFT_WINDOW_SIZE,
            read_chunk_divisor: defaults::READ_CHUNK_DIVISOR,
        }
    }
}

impl From<&Config> for CaptureConfig {
    fn from(config: &Config) -> Self {
        Self {
            format: config.audio_format(),
            waveform_window_size: config.analysis.waveform_window_size,
            fft_window_size: config.analysis.fft_window_size,
            read_chunk_divisor: config.analysis.read_chunk_divisor,
        }
    }
}

/// Capture session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Recording,
}

/// Counters for the current (or most recent) session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub chunks_read: u64,
    pub frames_decoded: u64,
    pub spectra_published: u64,
}

#[derive(Debug, Default)]
struct SessionCounters {
    chunks_read: AtomicU64,
    frames_decoded: AtomicU64,
    spectra_published: AtomicU64,
}

impl SessionCounters {
    fn reset(&self) {
        self.chunks_read.store(0, Ordering::Relaxed);
        self.frames_decoded.store(0, Ordering::Relaxed);
        self.spectra_published.store(0, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CaptureStats {
        CaptureStats {
            chunks_read: self.chunks_read.load(Ordering::Relaxed),
            frames_decoded: self.frames_decoded.load(Ordering::Relaxed),
            spectra_published: self.spectra_published.load(Ordering::Relaxed),
        }
    }
}

/// Owns a capture device and drives recording sessions on it.
pub struct CapturePipeline {
    device: Arc<dyn CaptureDevice>,
    renderer: Arc<dyn Renderer>,
    error_reporter: Arc<dyn ErrorReporter>,
    config: CaptureConfig,
    selected: Option<DeviceId>,
    recording: Arc<AtomicBool>,
    counters: Arc<SessionCounters>,
    worker: Option<JoinHandle<()>>,
}

impl CapturePipeline {
    pub fn new(
        device: Arc<dyn CaptureDevice>,
        renderer: Arc<dyn Renderer>,
        config: CaptureConfig,
    ) -> Self {
        Self {
            device,
            renderer,
            error_reporter: Arc::new(LogReporter),
            config,
            selected: None,
            recording: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(SessionCounters::default()),
            worker: None,
        }
    }

    /// Build from loaded configuration, preselecting `audio.device` if set.
    pub fn from_config(
        device: Arc<dyn CaptureDevice>,
        renderer: Arc<dyn Renderer>,
        config: &Config,
    ) -> Self {
        let mut pipeline = Self::new(device, renderer, CaptureConfig::from(config));
        pipeline.selected = config.audio.device.clone();
        pipeline
    }

    /// Replace the default [`LogReporter`].
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = reporter;
        self
    }

    pub fn list_devices(&self) -> Result<Vec<DeviceId>> {
        self.device.list_devices()
    }

    /// Choose the device used by the next `start`.
    pub fn select_device(&mut self, device: impl Into<DeviceId>) {
        self.selected = Some(device.into());
    }

    pub fn selected_device(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn state(&self) -> CaptureState {
        if self.recording.load(Ordering::Acquire) {
            CaptureState::Recording
        } else {
            CaptureState::Idle
        }
    }

    pub fn is_recording(&self) -> bool {
        self.state() == CaptureState::Recording
    }

    /// Counters of the current session, or of the last one once it ended.
    pub fn stats(&self) -> CaptureStats {
        self.counters.snapshot()
    }

    /// Open the selected device and spawn the acquisition thread.
    ///
    /// # Errors
    /// - `PcgError::AlreadyRecording` if a session is running
    /// - `PcgError::NoDeviceSelected` if no device was chosen
    /// - `PcgError::UnsupportedFormat` if the configured format cannot be decoded
    /// - `PcgError::DeviceUnavailable` if the device cannot be opened
    ///
    /// The pipeline stays `Idle` on every error.
    pub fn start(&mut self) -> Result<()> {
        // A session that ended on its own still has a finished thread to reap.
        if self.worker.as_ref().is_some_and(JoinHandle::is_finished) {
            self.join_worker();
        }
        if self.is_recording() {
            return Err(PcgError::AlreadyRecording);
        }
        self.join_worker();

        let device_id = self.selected.clone().ok_or(PcgError::NoDeviceSelected)?;
        ensure_supported(&self.config.format)?;

        let stream = self.device.open(&device_id, &self.config.format)?;
        tracing::info!(
            "[Capture] Opened '{}' at {} (buffer {} bytes, renderer {})",
            device_id,
            self.config.format,
            stream.buffer_size(),
            self.renderer.name()
        );

        self.counters.reset();
        self.recording.store(true, Ordering::Release);

        let session = Session {
            stream: StreamGuard::new(stream, Arc::clone(&self.recording)),
            format: self.config.format,
            waveform: WaveformWindow::new(self.config.waveform_window_size),
            analysis: AnalysisWindow::new(self.config.fft_window_size),
            engine: SpectralEngine::with_window(self.config.fft_window_size),
            read_chunk_divisor: self.config.read_chunk_divisor,
            renderer: Arc::clone(&self.renderer),
            error_reporter: Arc::clone(&self.error_reporter),
            recording: Arc::clone(&self.recording),
            counters: Arc::clone(&self.counters),
        };

        let spawned = thread::Builder::new()
            .name("pcgscope-capture".to_string())
            .spawn(move || session.run());

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(())
            }
            Err(e) => {
                // The session (and its stream) was dropped with the closure.
                self.recording.store(false, Ordering::Release);
                Err(PcgError::Io(e))
            }
        }
    }

    /// Request the acquisition thread to stop and wait for it.
    ///
    /// The device is closed before this returns. Stopping while idle does
    /// nothing.
    pub fn stop(&mut self) {
        if self.worker.is_none() {
            return;
        }
        self.recording.store(false, Ordering::Release);
        self.join_worker();
        tracing::info!("[Capture] Stopped");
    }

    /// Block until the current session ends by itself (end of stream or
    /// device failure).
    pub fn wait(&mut self) {
        self.join_worker();
    }

    fn join_worker(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };
        if let Err(panic_info) = handle.join() {
            let msg = panic_info
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                .unwrap_or("unknown panic");
            self.error_reporter.report(
                STATION,
                &StationError::Fatal(format!("acquisition thread panicked: {msg}")),
            );
        }
        self.recording.store(false, Ordering::Release);
    }
}

impl Drop for CapturePipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Closes the stream and clears the recording flag on every exit path,
/// including unwinding out of a renderer.
struct StreamGuard {
    stream: Box<dyn DeviceStream>,
    recording: Arc<AtomicBool>,
}

impl StreamGuard {
    fn new(stream: Box<dyn DeviceStream>, recording: Arc<AtomicBool>) -> Self {
        Self { stream, recording }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        if let Err(e) = self.stream.close() {
            tracing::warn!("[Capture] Failed to close device: {e}");
        }
        self.recording.store(false, Ordering::Release);
    }
}

struct Session {
    stream: StreamGuard,
    format: AudioFormat,
    waveform: WaveformWindow,
    analysis: AnalysisWindow,
    engine: SpectralEngine,
    read_chunk_divisor: usize,
    renderer: Arc<dyn Renderer>,
    error_reporter: Arc<dyn ErrorReporter>,
    recording: Arc<AtomicBool>,
    counters: Arc<SessionCounters>,
}

impl Session {
    fn run(mut self) {
        let reason = self.acquire();

        match &reason {
            EndReason::Stopped => tracing::debug!("[Capture] Stop requested"),
            EndReason::EndOfStream => tracing::info!("[Capture] End of stream"),
            EndReason::DeviceFailure(msg) => tracing::warn!("[Capture] Session failed: {msg}"),
        }

        let Session { stream, renderer, .. } = self;
        // Closes the device and clears the recording flag.
        drop(stream);
        renderer.session_ended(reason);
    }

    /// Bytes requested per read: a fraction of the device buffer, whole frames only.
    fn chunk_bytes(&self) -> usize {
        let frame = self.format.frame_size();
        let raw = self.stream.stream.buffer_size() / self.read_chunk_divisor.max(1);
        (raw - raw % frame).max(frame)
    }

    fn acquire(&mut self) -> EndReason {
        let frame = self.format.frame_size();
        let mut buffer = vec![0u8; self.chunk_bytes()];
        // Bytes of a partial frame left over from the previous read.
        let mut carry = 0usize;
        let mut empty_reads = 0u32;

        loop {
            if !self.recording.load(Ordering::Acquire) {
                return EndReason::Stopped;
            }

            let outcome = match self.stream.stream.read(&mut buffer[carry..]) {
                Ok(outcome) => outcome,
                Err(e) => return self.fail(e),
            };

            let n = match outcome {
                ReadOutcome::Data(n) if n > 0 => n,
                ReadOutcome::Data(_) | ReadOutcome::NoData => {
                    empty_reads = empty_reads.saturating_add(1);
                    if empty_reads == defaults::EMPTY_READS_BEFORE_REPORT {
                        self.error_reporter.report(
                            STATION,
                            &StationError::Recoverable(format!(
                                "no data from device after {} reads",
                                empty_reads
                            )),
                        );
                    }
                    continue;
                }
                ReadOutcome::EndOfStream => return EndReason::EndOfStream,
            };
            empty_reads = 0;
            self.counters.chunks_read.fetch_add(1, Ordering::Relaxed);

            let filled = carry + n;
            let whole = filled - filled % frame;
            let samples = match decode(&buffer, whole, &self.format) {
                Ok(samples) => samples,
                Err(e) => return self.fail(e),
            };
            buffer.copy_within(whole..filled, 0);
            carry = filled - whole;

            if samples.is_empty() {
                continue;
            }
            self.counters
                .frames_decoded
                .fetch_add(samples.len() as u64, Ordering::Relaxed);
            self.publish(&samples);
        }
    }

    fn publish(&mut self, samples: &[f64]) {
        self.waveform.push(samples);
        self.renderer
            .publish_waveform(self.waveform.snapshot(), self.waveform.capacity());

        let sample_rate = self.format.sample_rate;
        let Session {
            analysis,
            engine,
            renderer,
            counters,
            ..
        } = self;
        analysis.push(samples, |window| {
            renderer.publish_spectrum(engine.analyze(window, sample_rate));
            counters.spectra_published.fetch_add(1, Ordering::Relaxed);
        });
    }

    fn fail(&self, error: PcgError) -> EndReason {
        let message = error.to_string();
        self.error_reporter
            .report(STATION, &StationError::Fatal(message.clone()));
        EndReason::DeviceFailure(message)
    }
}
