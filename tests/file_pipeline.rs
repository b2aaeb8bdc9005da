use pcgscope::audio::{Encoding, MockCaptureDevice, WavFile};
use pcgscope::pipeline::{CaptureConfig, CapturePipeline, CollectorRenderer, FilePipeline};
use pcgscope::PcgError;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use tempfile::NamedTempFile;

fn write_wav(path: &Path, spec: hound::WavSpec, samples: &[i16]) {
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        if spec.bits_per_sample == 8 {
            writer.write_sample(s as i8).unwrap();
        } else {
            writer.write_sample(s).unwrap();
        }
    }
    writer.finalize().unwrap();
}

fn mono_16(sample_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

fn temp_wav(spec: hound::WavSpec, samples: &[i16]) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), spec, samples);
    file
}

#[test]
fn loads_recording_from_disk() {
    let file = temp_wav(mono_16(44100), &[0, 32767, -32768, 16384]);

    let decoded = FilePipeline::new().load(file.path()).unwrap();

    assert_eq!(decoded.format.sample_rate, 44100);
    assert_eq!(decoded.format.encoding, Encoding::Signed);
    assert_eq!(decoded.len(), 4);
    assert_eq!(decoded.samples[0], 0.0);
    assert!((decoded.samples[1] - 1.0).abs() <= 1.0 / 32768.0);
    assert_eq!(decoded.samples[2], -1.0);
    assert_eq!(decoded.samples[3], 0.5);
}

#[test]
fn stereo_recording_keeps_first_channel() {
    let spec = hound::WavSpec {
        channels: 2,
        ..mono_16(8000)
    };
    let file = temp_wav(spec, &[16384, -1, -16384, -1, 0, -1]);

    let decoded = FilePipeline::new().load(file.path()).unwrap();
    assert_eq!(decoded.samples, vec![0.5, -0.5, 0.0]);
}

#[test]
fn eight_bit_recording_is_unsupported() {
    let spec = hound::WavSpec {
        bits_per_sample: 8,
        ..mono_16(8000)
    };
    let file = temp_wav(spec, &[0, 10, -10]);

    match FilePipeline::new().load(file.path()) {
        Err(PcgError::UnsupportedFormat { .. }) => {}
        other => panic!("Expected UnsupportedFormat, got {:?}", other),
    }
}

#[test]
fn truncated_recording_is_reported() {
    let complete = temp_wav(mono_16(8000), &[100; 64]);
    let bytes = std::fs::read(complete.path()).unwrap();

    let mut truncated = NamedTempFile::new().unwrap();
    truncated.write_all(&bytes[..bytes.len() - 10]).unwrap();
    truncated.flush().unwrap();

    match FilePipeline::new().load(truncated.path()) {
        Err(PcgError::TruncatedInput {
            expected_bytes,
            actual_bytes,
        }) => {
            assert_eq!(expected_bytes, 128);
            assert_eq!(actual_bytes, 118);
        }
        other => panic!("Expected TruncatedInput, got {:?}", other),
    }
}

#[test]
fn missing_file_is_io_error() {
    let result = FilePipeline::new().load(Path::new("/nonexistent/pcgscope/heart.wav"));
    assert!(matches!(result, Err(PcgError::Io(_))));
}

#[test]
fn not_a_wav_file_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"this is not audio").unwrap();
    file.flush().unwrap();

    assert!(WavFile::open(file.path()).is_err());
}

#[test]
fn file_decoding_runs_alongside_capture() {
    let samples: Vec<i16> = (0..8000).map(|i| (i % 200) as i16 * 100).collect();
    let file = temp_wav(mono_16(8000), &samples);

    let device = MockCaptureDevice::new().held_open();
    let renderer = CollectorRenderer::new();
    let mut pipeline = CapturePipeline::new(
        Arc::new(device.clone()),
        Arc::new(renderer),
        CaptureConfig::default(),
    );
    pipeline.select_device("mock");
    pipeline.start().unwrap();

    let path = file.path().to_path_buf();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let path = path.clone();
            thread::spawn(move || FilePipeline::new().load(&path).map(|d| d.len()))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), 8000);
    }

    assert!(pipeline.is_recording());
    pipeline.stop();
    assert_eq!(device.close_count(), 1);
}
