use log::{debug, info};
use serde::Serialize;

use crate::audio_source::AudioSource;
use crate::decoder::SymphoniaStream;
use crate::error::SampleError;
use crate::window;

/// Ceilings and defaults for the pipeline, passed in explicitly; there
/// is no global configuration.
#[derive(Debug, Clone)]
pub struct SamplerOptions {
    pub default_length: usize,
    pub default_sample_rate: u32,
    /// Upper bound on the requested window length, to bound memory.
    pub max_length: usize,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        SamplerOptions {
            default_length: 2048,
            default_sample_rate: 44100,
            max_length: 1_000_000,
        }
    }
}

/// One sampled window plus the stream facts needed to interpret it.
#[derive(Debug, Clone, Serialize)]
pub struct SampleReply {
    pub samples: Vec<i16>,
    pub size: usize,
    pub channels: u32,
    pub samplerate: u32,
    pub truncated: bool,
}

/// Request orchestrator: validates parameters, runs decode + extract,
/// and assembles the reply. Holds no per-request state, so one value
/// can serve any number of independent requests.
pub struct Sampler {
    options: SamplerOptions,
}

impl Sampler {
    pub fn new(options: SamplerOptions) -> Sampler {
        Sampler { options }
    }

    pub fn options(&self) -> &SamplerOptions {
        &self.options
    }

    /// Decodes `source` and returns a window of `length` interleaved
    /// samples from the middle of the stream.
    ///
    /// `sample_rate_hint` is advisory only: no resampling is done and
    /// the decoded rate is returned as-is; a mismatch is just logged.
    /// The source and the decoder are dropped on every path out of
    /// here, success or failure.
    pub fn sample(
        &self,
        source: AudioSource,
        length: usize,
        sample_rate_hint: u32,
    ) -> Result<SampleReply, SampleError> {
        if length == 0 {
            return Err(SampleError::InvalidParameter(
                "length must be positive".into(),
            ));
        }
        if length > self.options.max_length {
            return Err(SampleError::InvalidParameter(format!(
                "length must be at most {}",
                self.options.max_length
            )));
        }
        if sample_rate_hint == 0 {
            return Err(SampleError::InvalidParameter(
                "sample_rate must be positive".into(),
            ));
        }

        let mut stream = SymphoniaStream::open(source)?;
        let metadata = stream.metadata().clone();

        if sample_rate_hint != metadata.sample_rate {
            debug!(
                "requested {} Hz but stream is {} Hz; returning the decoded rate",
                sample_rate_hint, metadata.sample_rate
            );
        }

        let window = window::extract(&metadata, &mut stream, length)?;

        info!(
            "sampled {} of {} requested samples ({} channels, {} Hz)",
            window.samples.len(),
            window.requested,
            metadata.channels,
            metadata.sample_rate
        );

        Ok(SampleReply {
            size: window.samples.len(),
            truncated: window.truncated,
            samples: window.samples,
            channels: metadata.channels,
            samplerate: metadata.sample_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Sampler, SamplerOptions};
    use crate::audio_source::AudioSource;
    use crate::error::SampleError;
    use crate::test_wav;

    fn sampler() -> Sampler {
        Sampler::new(SamplerOptions::default())
    }

    fn ramp(len: usize) -> Vec<i16> {
        (0..len).map(|i| i as i16).collect()
    }

    #[test]
    fn rejects_zero_length_before_decoding() {
        // an empty source would itself be an error, so getting
        // InvalidParameter proves validation ran first
        let err = sampler()
            .sample(AudioSource::Memory(Vec::new()), 0, 44100)
            .unwrap_err();
        assert!(matches!(err, SampleError::InvalidParameter(_)));
    }

    #[test]
    fn rejects_length_over_ceiling_before_decoding() {
        let err = sampler()
            .sample(AudioSource::Memory(Vec::new()), 1_000_001, 44100)
            .unwrap_err();
        assert!(matches!(err, SampleError::InvalidParameter(_)));
    }

    #[test]
    fn rejects_zero_sample_rate_before_decoding() {
        let err = sampler()
            .sample(AudioSource::Memory(Vec::new()), 2048, 0)
            .unwrap_err();
        assert!(matches!(err, SampleError::InvalidParameter(_)));
    }

    #[test]
    fn empty_source_is_reported_as_such() {
        let err = sampler()
            .sample(AudioSource::Memory(Vec::new()), 2048, 44100)
            .unwrap_err();
        assert!(matches!(err, SampleError::EmptySource));
    }

    #[test]
    fn unrecognized_bytes_are_unsupported() {
        let bytes = b"<html>not audio at all</html>".repeat(32);
        let err = sampler()
            .sample(AudioSource::Memory(bytes), 2048, 44100)
            .unwrap_err();
        assert!(matches!(err, SampleError::UnsupportedFormat));
    }

    #[test]
    fn samples_whole_stream_when_exactly_window_sized() {
        let samples = ramp(2048);
        let bytes = test_wav::wav_s16le(1, 44100, &samples);

        let reply = sampler()
            .sample(AudioSource::Memory(bytes), 2048, 44100)
            .unwrap();

        assert_eq!(reply.samples, samples);
        assert_eq!(reply.size, 2048);
        assert_eq!(reply.channels, 1);
        assert_eq!(reply.samplerate, 44100);
        assert!(!reply.truncated);
    }

    #[test]
    fn samples_centered_window_of_longer_stream() {
        // 3x the window length: midpoint puts the window one third in
        let samples: Vec<i16> = (0..6144).map(|i| (i % 3000) as i16).collect();
        let bytes = test_wav::wav_s16le(1, 44100, &samples);

        let reply = sampler()
            .sample(AudioSource::Memory(bytes), 2048, 44100)
            .unwrap();

        assert_eq!(reply.size, 2048);
        assert_eq!(reply.samples, &samples[2048..4096]);
        assert!(!reply.truncated);
    }

    #[test]
    fn short_audio_is_truncated_not_an_error() {
        let samples = ramp(300);
        let bytes = test_wav::wav_s16le(1, 44100, &samples);

        let reply = sampler()
            .sample(AudioSource::Memory(bytes), 2048, 44100)
            .unwrap();

        assert_eq!(reply.samples, samples);
        assert_eq!(reply.size, 300);
        assert!(reply.truncated);
    }

    #[test]
    fn stereo_metadata_is_passed_through() {
        let samples = ramp(4096);
        let bytes = test_wav::wav_s16le(2, 48000, &samples);

        let reply = sampler()
            .sample(AudioSource::Memory(bytes), 1024, 44100)
            .unwrap();

        assert_eq!(reply.channels, 2);
        assert_eq!(reply.samplerate, 48000);
        assert_eq!(reply.size, 1024);
    }

    #[test]
    fn sampling_is_deterministic() {
        let samples: Vec<i16> = (0..10_000).map(|i| (i * 7 % 4096) as i16).collect();
        let bytes = test_wav::wav_s16le(2, 44100, &samples);

        let first = sampler()
            .sample(AudioSource::Memory(bytes.clone()), 2048, 44100)
            .unwrap();
        let second = sampler()
            .sample(AudioSource::Memory(bytes), 2048, 44100)
            .unwrap();

        assert_eq!(first.samples, second.samples);
        assert_eq!(first.size, second.size);
        assert_eq!(first.truncated, second.truncated);
    }

    #[test]
    fn truncated_container_is_corrupt_not_short() {
        // data chunk claims 65536 frames but the file is cut off half
        // way, inside the promised window
        let samples: Vec<i16> = (0..32768).map(|i| (i % 512) as i16).collect();
        let bytes = test_wav::truncated_wav_s16le(1, 44100, 65536, &samples);

        let err = sampler()
            .sample(AudioSource::Memory(bytes), 2048, 44100)
            .unwrap_err();
        assert!(matches!(err, SampleError::CorruptStream));
    }

    #[test]
    fn reply_serializes_with_expected_fields() {
        let samples = ramp(64);
        let bytes = test_wav::wav_s16le(1, 44100, &samples);

        let reply = sampler()
            .sample(AudioSource::Memory(bytes), 64, 44100)
            .unwrap();
        let json = serde_json::to_value(&reply).unwrap();

        assert_eq!(json["size"], 64);
        assert_eq!(json["channels"], 1);
        assert_eq!(json["samplerate"], 44100);
        assert_eq!(json["truncated"], false);
        assert_eq!(json["samples"].as_array().unwrap().len(), 64);
    }
}
