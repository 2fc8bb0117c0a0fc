//! Server-side waveform sampling: decode an uploaded or fetched audio
//! file and return a fixed-size window of interleaved 16-bit PCM from
//! the middle of the stream, plus the stream's channel count and sample
//! rate. Browsers can't reliably sample arbitrary audio for waveform
//! previews, so the decode happens here instead.

pub mod audio_source;
pub mod config;
pub mod decoder;
pub mod error;
pub mod sampler;
pub mod web_framework;
pub mod window;

#[cfg(test)]
mod test_wav;

pub use audio_source::{AudioSource, BlockSource, PcmBlock, StreamMetadata};
pub use decoder::SymphoniaStream;
pub use error::SampleError;
pub use sampler::{SampleReply, Sampler, SamplerOptions};
pub use window::SampleWindow;
