use crate::config::Config;
use crate::defaults;
use crate::spectrum::SpectrumResult;
use crossbeam_channel::{Receiver, SendTimeoutError, Sender, TrySendError, bounded};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Why a capture session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// `stop` was requested.
    Stopped,
    /// The device reported end of stream.
    EndOfStream,
    /// A read or decode failed; the message describes it.
    DeviceFailure(String),
}

/// Pluggable consumer of computed views.
///
/// Called from the acquisition thread. Implementations must not block for
/// long; nothing they return is consumed.
pub trait Renderer: Send + Sync {
    /// A snapshot of the most recent samples, oldest first.
    fn publish_waveform(&self, samples: Vec<f64>, window_capacity: usize);

    /// The spectrum of one completed analysis window.
    fn publish_spectrum(&self, spectrum: SpectrumResult);

    /// Called once when a session's acquisition loop exits.
    fn session_ended(&self, _reason: EndReason) {}

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "renderer"
    }
}

/// Immutable waveform snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformSnapshot {
    pub sequence: u64,
    pub samples: Vec<f64>,
    pub window_capacity: usize,
}

/// Immutable spectrum snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumSnapshot {
    pub sequence: u64,
    pub spectrum: SpectrumResult,
}

/// Messages delivered by [`ChannelRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    Waveform(WaveformSnapshot),
    Spectrum(SpectrumSnapshot),
    SessionEnded(EndReason),
}

/// Renderer that forwards snapshots over a bounded channel.
///
/// The presentation side drains the receiver on its own schedule. When the
/// channel is full a snapshot is dropped rather than blocking acquisition.
/// The end-of-session event waits up to
/// [`defaults::SESSION_END_TIMEOUT_MS`] for room instead.
pub struct ChannelRenderer {
    tx: Sender<RenderEvent>,
    waveform_sequence: AtomicU64,
    spectrum_sequence: AtomicU64,
    dropped: AtomicU64,
}

impl ChannelRenderer {
    /// Create a renderer and the receiver for its events.
    pub fn new(capacity: usize) -> (Self, Receiver<RenderEvent>) {
        let (tx, rx) = bounded(capacity);
        let renderer = Self {
            tx,
            waveform_sequence: AtomicU64::new(0),
            spectrum_sequence: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        };
        (renderer, rx)
    }

    /// Create a renderer sized by `analysis.channel_capacity`.
    pub fn from_config(config: &Config) -> (Self, Receiver<RenderEvent>) {
        Self::new(config.analysis.channel_capacity)
    }

    /// Events dropped because the channel was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn send(&self, event: RenderEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("render channel full, dropping snapshot");
            }
            Err(TrySendError::Disconnected(_)) => {
                // Presentation side went away; nothing left to notify.
            }
        }
    }
}

impl Renderer for ChannelRenderer {
    fn publish_waveform(&self, samples: Vec<f64>, window_capacity: usize) {
        let sequence = self.waveform_sequence.fetch_add(1, Ordering::Relaxed);
        self.send(RenderEvent::Waveform(WaveformSnapshot {
            sequence,
            samples,
            window_capacity,
        }));
    }

    fn publish_spectrum(&self, spectrum: SpectrumResult) {
        let sequence = self.spectrum_sequence.fetch_add(1, Ordering::Relaxed);
        self.send(RenderEvent::Spectrum(SpectrumSnapshot { sequence, spectrum }));
    }

    fn session_ended(&self, reason: EndReason) {
        let timeout = Duration::from_millis(defaults::SESSION_END_TIMEOUT_MS);
        match self.tx.send_timeout(RenderEvent::SessionEnded(reason), timeout) {
            Ok(()) | Err(SendTimeoutError::Disconnected(_)) => {}
            Err(SendTimeoutError::Timeout(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("render channel full, session end notification dropped");
            }
        }
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}

#[derive(Debug, Default)]
struct Collected {
    waveforms: Vec<Vec<f64>>,
    spectra: Vec<SpectrumResult>,
    end_reasons: Vec<EndReason>,
}

/// Renderer that keeps everything it receives. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct CollectorRenderer {
    inner: Arc<Mutex<Collected>>,
}

impl CollectorRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waveforms(&self) -> Vec<Vec<f64>> {
        self.inner
            .lock()
            .map(|c| c.waveforms.clone())
            .unwrap_or_default()
    }

    pub fn spectra(&self) -> Vec<SpectrumResult> {
        self.inner
            .lock()
            .map(|c| c.spectra.clone())
            .unwrap_or_default()
    }

    pub fn end_reasons(&self) -> Vec<EndReason> {
        self.inner
            .lock()
            .map(|c| c.end_reasons.clone())
            .unwrap_or_default()
    }

    pub fn last_spectrum(&self) -> Option<SpectrumResult> {
        self.inner.lock().ok().and_then(|c| c.spectra.last().cloned())
    }
}

impl Renderer for CollectorRenderer {
    fn publish_waveform(&self, samples: Vec<f64>, _window_capacity: usize) {
        if let Ok(mut collected) = self.inner.lock() {
            collected.waveforms.push(samples);
        }
    }

    fn publish_spectrum(&self, spectrum: SpectrumResult) {
        if let Ok(mut collected) = self.inner.lock() {
            collected.spectra.push(spectrum);
        }
    }

    fn session_ended(&self, reason: EndReason) {
        if let Ok(mut collected) = self.inner.lock() {
            collected.end_reasons.push(reason);
        }
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}
