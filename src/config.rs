use crate::audio::format::{AudioFormat, ByteOrder, Encoding};
use crate::defaults;
use crate::error::{PcgError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub analysis: AnalysisConfig,
}

/// Capture format configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub sample_rate: u32,
    pub bit_depth: u16,
    pub channels: u16,
    pub signed: bool,
    pub big_endian: bool,
}

/// Window sizes and acquisition tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub waveform_window_size: usize,
    pub fft_window_size: usize,
    pub read_chunk_divisor: usize,
    pub channel_capacity: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
            bit_depth: defaults::BIT_DEPTH,
            channels: defaults::CHANNELS,
            signed: true,
            big_endian: false,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            waveform_window_size: defaults::WAVEFORM_WINDOW_SIZE,
            fft_window_size: defaults::FFT_WINDOW_SIZE,
            read_chunk_divisor: defaults::READ_CHUNK_DIVISOR,
            channel_capacity: defaults::CHANNEL_CAPACITY,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults only if the file is missing.
    ///
    /// Invalid TOML and other I/O failures are returned as errors.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(PcgError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - PCGSCOPE_AUDIO_DEVICE → audio.device
    /// - PCGSCOPE_SAMPLE_RATE → audio.sample_rate
    /// - PCGSCOPE_FFT_WINDOW_SIZE → analysis.fft_window_size
    /// - PCGSCOPE_WAVEFORM_WINDOW_SIZE → analysis.waveform_window_size
    ///
    /// Empty values are ignored; unparsable numbers are logged and ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(device) = std::env::var("PCGSCOPE_AUDIO_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        if let Some(rate) = env_number("PCGSCOPE_SAMPLE_RATE") {
            self.audio.sample_rate = rate;
        }

        if let Some(size) = env_number("PCGSCOPE_FFT_WINDOW_SIZE") {
            self.analysis.fft_window_size = size;
        }

        if let Some(size) = env_number("PCGSCOPE_WAVEFORM_WINDOW_SIZE") {
            self.analysis.waveform_window_size = size;
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/pcgscope/config.toml on Linux, or `None` when the
    /// platform has no config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pcgscope").join("config.toml"))
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(invalid("audio.sample_rate", "must be positive"));
        }
        if !matches!(self.audio.bit_depth, 8 | 16) {
            return Err(invalid("audio.bit_depth", "must be 8 or 16"));
        }
        if self.audio.channels != 1 {
            return Err(invalid("audio.channels", "only mono capture is supported"));
        }
        if self.analysis.waveform_window_size == 0 {
            return Err(invalid("analysis.waveform_window_size", "must be positive"));
        }
        if self.analysis.fft_window_size == 0 {
            return Err(invalid("analysis.fft_window_size", "must be positive"));
        }
        if self.analysis.read_chunk_divisor == 0 {
            return Err(invalid("analysis.read_chunk_divisor", "must be positive"));
        }
        if self.analysis.channel_capacity == 0 {
            return Err(invalid("analysis.channel_capacity", "must be positive"));
        }
        Ok(())
    }

    /// The capture format described by the `[audio]` section.
    pub fn audio_format(&self) -> AudioFormat {
        AudioFormat {
            sample_rate: self.audio.sample_rate,
            bits_per_sample: self.audio.bit_depth,
            channels: self.audio.channels,
            encoding: if self.audio.signed {
                Encoding::Signed
            } else {
                Encoding::Unsigned
            },
            byte_order: if self.audio.big_endian {
                ByteOrder::BigEndian
            } else {
                ByteOrder::LittleEndian
            },
        }
    }
}

fn invalid(key: &str, message: &str) -> PcgError {
    PcgError::ConfigInvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    let value = std::env::var(key).ok().filter(|v| !v.is_empty())?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(key, value = %value, "ignoring unparsable environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_pcgscope_env() {
        remove_env("PCGSCOPE_AUDIO_DEVICE");
        remove_env("PCGSCOPE_SAMPLE_RATE");
        remove_env("PCGSCOPE_FFT_WINDOW_SIZE");
        remove_env("PCGSCOPE_WAVEFORM_WINDOW_SIZE");
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.audio.device, None);
        assert_eq!(config.audio.sample_rate, 44100);
        assert_eq!(config.audio.bit_depth, 16);
        assert_eq!(config.audio.channels, 1);
        assert!(config.audio.signed);
        assert!(!config.audio.big_endian);

        assert_eq!(config.analysis.waveform_window_size, 65536);
        assert_eq!(config.analysis.fft_window_size, 2048);
        assert_eq!(config.analysis.read_chunk_divisor, 5);

        assert!(config.validate().is_ok());
        assert_eq!(config.audio_format(), AudioFormat::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let toml_content = r#"
            [audio]
            device = "hw:0,0"
            sample_rate = 8000
            bit_depth = 8
            signed = false
            big_endian = true

            [analysis]
            waveform_window_size = 4096
            fft_window_size = 512
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.audio.device, Some("hw:0,0".to_string()));
        assert_eq!(config.audio.sample_rate, 8000);
        assert_eq!(config.audio.bit_depth, 8);
        assert_eq!(config.analysis.waveform_window_size, 4096);
        assert_eq!(config.analysis.fft_window_size, 512);
        assert_eq!(config.analysis.read_chunk_divisor, 5);

        let format = config.audio_format();
        assert_eq!(format.encoding, Encoding::Unsigned);
        assert_eq!(format.byte_order, ByteOrder::BigEndian);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let toml_content = r#"
            [analysis]
            fft_window_size = 4096
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.analysis.fft_window_size, 4096);
        assert_eq!(config.audio, AudioConfig::default());
        assert_eq!(config.analysis.waveform_window_size, 65536);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[audio\nsample_rate = \"broken")
            .unwrap();

        let result = Config::load(temp_file.path());
        assert!(matches!(result, Err(PcgError::Config(_))));
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let missing_path = Path::new("/tmp/nonexistent_pcgscope_config_12345.toml");
        let config = Config::load_or_default(missing_path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_propagates_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[analysis\n").unwrap();

        assert!(Config::load_or_default(temp_file.path()).is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let mut config = Config::default();
        config.audio.bit_depth = 24;
        match config.validate() {
            Err(PcgError::ConfigInvalidValue { key, .. }) => assert_eq!(key, "audio.bit_depth"),
            other => panic!("Expected ConfigInvalidValue, got {:?}", other),
        }

        let mut config = Config::default();
        config.audio.channels = 2;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.analysis.fft_window_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.analysis.read_chunk_divisor = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.audio.sample_rate = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_override_device_and_rate() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_pcgscope_env();

        set_env("PCGSCOPE_AUDIO_DEVICE", "pulse");
        set_env("PCGSCOPE_SAMPLE_RATE", "48000");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.audio.device, Some("pulse".to_string()));
        assert_eq!(config.audio.sample_rate, 48000);
        assert_eq!(config.analysis.fft_window_size, 2048);

        clear_pcgscope_env();
    }

    #[test]
    fn test_env_override_window_sizes() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_pcgscope_env();

        set_env("PCGSCOPE_FFT_WINDOW_SIZE", "1024");
        set_env("PCGSCOPE_WAVEFORM_WINDOW_SIZE", "8192");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.analysis.fft_window_size, 1024);
        assert_eq!(config.analysis.waveform_window_size, 8192);

        clear_pcgscope_env();
    }

    #[test]
    fn test_env_override_empty_and_invalid_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_pcgscope_env();

        set_env("PCGSCOPE_AUDIO_DEVICE", "");
        set_env("PCGSCOPE_SAMPLE_RATE", "fast");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.audio.device, None);
        assert_eq!(config.audio.sample_rate, 44100);

        clear_pcgscope_env();
    }

    #[test]
    fn test_default_path_ends_with_config_toml() {
        if let Some(path) = Config::default_path() {
            let path_str = path.to_string_lossy();
            assert!(path_str.contains("pcgscope"));
            assert!(path_str.ends_with("config.toml"));
        }
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let mut config = Config::default();
        config.audio.device = Some("mock".to_string());
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
