use log::debug;

use crate::audio_source::{BlockSource, StreamMetadata};
use crate::error::SampleError;

/// A fixed-length slice of interleaved samples taken from the temporal
/// midpoint of the decoded stream.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleWindow {
    pub samples: Vec<i16>,
    /// The interleaved sample count the caller asked for.
    pub requested: usize,
    /// True when fewer samples than requested could be returned, either
    /// because the audio is shorter than the window or because the
    /// window was truncated to whole frames.
    pub truncated: bool,
}

/// Picks `length` interleaved samples centered on the middle of the
/// stream.
///
/// `length` counts interleaved scalar values, not frames, so the window
/// spans `length / channels` frames; a `length` that does not divide
/// evenly is truncated to whole frames, which keeps the window
/// frame-aligned and the channel order intact.
pub fn extract(
    metadata: &StreamMetadata,
    blocks: &mut dyn BlockSource,
    length: usize,
) -> Result<SampleWindow, SampleError> {
    // channels >= 1, enforced when the stream was opened
    let channels = metadata.channels as usize;
    let window_frames = length / channels;
    let window_len = window_frames * channels;

    // A length under one frame truncates to an empty window, but an
    // empty stream must still be reported as such, on either path.
    if window_len == 0 {
        if blocks.next_block()?.is_none() {
            return Err(SampleError::EmptyStream);
        }
        return Ok(SampleWindow {
            truncated: length > 0,
            requested: length,
            samples: Vec::new(),
        });
    }

    let samples = match metadata.total_frames {
        Some(total_frames) if total_frames > 0 => {
            streamed_window(blocks, total_frames, channels, window_len)
        }
        _ => buffered_window(blocks, channels, window_len),
    }?;

    Ok(SampleWindow {
        truncated: samples.len() < length,
        requested: length,
        samples,
    })
}

/// Fast path: the container reported its frame count, so the midpoint
/// is known before decoding. Blocks ahead of the window are dropped as
/// they arrive and decoding stops as soon as the window is full; only
/// the window itself is ever held.
fn streamed_window(
    blocks: &mut dyn BlockSource,
    total_frames: u64,
    channels: usize,
    window_len: usize,
) -> Result<Vec<i16>, SampleError> {
    let total = total_frames * channels as u64;
    let window_frames = (window_len / channels) as u64;

    let start_frame = if total_frames > window_frames {
        (total_frames - window_frames) / 2
    } else {
        0
    };
    let start = start_frame * channels as u64;
    let want = window_len.min((total - start) as usize);
    let end = start + want as u64;

    let mut out: Vec<i16> = Vec::with_capacity(want);
    let mut saw_block = false;

    while out.len() < want {
        let block = match blocks.next_block()? {
            Some(block) => block,
            None => break,
        };
        saw_block = true;

        let block_start = block.offset;
        let block_end = block.offset + block.samples.len() as u64;
        if block_end <= start {
            continue;
        }
        if block_start >= end {
            break;
        }

        let lo = (start.max(block_start) - block_start) as usize;
        let hi = (end.min(block_end) - block_start) as usize;
        out.extend_from_slice(&block.samples[lo..hi]);
    }

    if out.len() < want {
        if !saw_block {
            return Err(SampleError::EmptyStream);
        }
        // The header promised more frames than the stream delivered.
        // A short "success" here would be indistinguishable from real
        // short audio, so fail instead.
        debug!(
            "stream ended with {} of {} window samples collected",
            out.len(),
            want
        );
        return Err(SampleError::CorruptStream);
    }

    Ok(out)
}

/// Fallback for containers that do not report a length: accumulate the
/// whole decode, then apply the same midpoint formula retrospectively.
/// Trades memory for determinism, which is fine for the preview-length
/// inputs this serves; long recordings would need a smarter strategy.
fn buffered_window(
    blocks: &mut dyn BlockSource,
    channels: usize,
    window_len: usize,
) -> Result<Vec<i16>, SampleError> {
    let mut all: Vec<i16> = Vec::new();
    while let Some(block) = blocks.next_block()? {
        all.extend_from_slice(&block.samples);
    }

    if all.is_empty() {
        return Err(SampleError::EmptyStream);
    }

    let total_frames = all.len() / channels;
    let window_frames = window_len / channels;
    let start_frame = if total_frames > window_frames {
        (total_frames - window_frames) / 2
    } else {
        0
    };

    let start = start_frame * channels;
    let end = (start + window_len).min(total_frames * channels);
    Ok(all[start..end].to_vec())
}
