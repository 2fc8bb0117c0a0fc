//! Hand-built RIFF/WAVE fixtures for tests: a canonical 44-byte header
//! followed by interleaved s16le data.

/// A complete, well-formed PCM wav file.
pub(crate) fn wav_s16le(channels: u16, sample_rate: u32, samples: &[i16]) -> Vec<u8> {
    build(channels, sample_rate, (samples.len() * 2) as u32, samples)
}

/// A wav file whose data chunk claims `claimed_frames` frames while
/// only `samples` are actually present, i.e. a file cut off mid-stream.
pub(crate) fn truncated_wav_s16le(
    channels: u16,
    sample_rate: u32,
    claimed_frames: u32,
    samples: &[i16],
) -> Vec<u8> {
    let claimed_data_len = claimed_frames * channels as u32 * 2;
    build(channels, sample_rate, claimed_data_len, samples)
}

fn build(channels: u16, sample_rate: u32, data_len: u32, samples: &[i16]) -> Vec<u8> {
    let block_align = channels * 2;

    let mut bytes = Vec::with_capacity(44 + samples.len() * 2);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());

    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }

    bytes
}
