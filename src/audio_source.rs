use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::PathBuf;

use symphonia::core::io::{MediaSource, MediaSourceStream};

use crate::error::SampleError;

/// Where the encoded audio comes from. One per request; the
/// orchestrator owns it for the request's duration and drops it on
/// every exit path.
pub enum AudioSource {
    File(PathBuf),
    Memory(Vec<u8>),
}

impl AudioSource {
    /// Turns the source into a symphonia media source stream. A
    /// zero-length source is rejected here, before any probe work.
    pub(crate) fn into_stream(self) -> Result<MediaSourceStream, SampleError> {
        match self {
            AudioSource::File(path) => {
                let file = File::open(&path)?;
                if file.metadata()?.len() == 0 {
                    return Err(SampleError::EmptySource);
                }
                Ok(MediaSourceStream::new(Box::new(file), Default::default()))
            }
            AudioSource::Memory(bytes) => {
                if bytes.is_empty() {
                    return Err(SampleError::EmptySource);
                }
                Ok(MediaSourceStream::new(
                    Box::new(MemorySource::new(bytes)),
                    Default::default(),
                ))
            }
        }
    }
}

/// Seekable in-memory media source for uploaded or fetched bytes.
struct MemorySource {
    cursor: Cursor<Vec<u8>>,
}

impl MemorySource {
    fn new(bytes: Vec<u8>) -> MemorySource {
        MemorySource {
            cursor: Cursor::new(bytes),
        }
    }
}

impl Read for MemorySource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Seek for MemorySource {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.cursor.seek(pos)
    }
}

impl MediaSource for MemorySource {
    fn is_seekable(&self) -> bool {
        true
    }

    fn byte_len(&self) -> Option<u64> {
        Some(self.cursor.get_ref().len() as u64)
    }
}

/// Facts about the decoded stream, probed before any samples are read.
/// Immutable once produced.
#[derive(Debug, Clone)]
pub struct StreamMetadata {
    pub channels: u32,
    pub sample_rate: u32,
    pub bits_per_sample: u32,
    /// Total frames reported by the container header, when it has one.
    /// `None` means the length is only knowable by decoding to the end.
    pub total_frames: Option<u64>,
}

/// One decoded chunk of interleaved signed 16-bit samples.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBlock {
    pub samples: Vec<i16>,
    /// Starting position of this block, counted in interleaved samples
    /// from the beginning of the stream.
    pub offset: u64,
}

/// A lazy, finite, forward-only sequence of decoded PCM blocks.
///
/// Blocks arrive in stream order, each exactly once; ownership moves to
/// the caller and the producer keeps nothing after yielding. `Ok(None)`
/// marks end-of-stream. The sequence is not restartable.
pub trait BlockSource {
    fn next_block(&mut self) -> Result<Option<PcmBlock>, SampleError>;
}
