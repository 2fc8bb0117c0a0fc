use log::{debug, warn};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio_source::{AudioSource, BlockSource, PcmBlock, StreamMetadata};
use crate::error::SampleError;

/// Give up after this many undecodable packets in a row. Symphonia
/// treats per-packet decode errors as recoverable, but a stream that
/// produces nothing but bad packets is corrupt and must not be spun on
/// forever.
const MAX_CONSECUTIVE_DECODE_ERRORS: u32 = 64;

/// Decoder adapter over symphonia: probes the container, selects the
/// default audio track, and yields interleaved 16-bit PCM blocks one at
/// a time. Forward-only and single-pass.
pub struct SymphoniaStream {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    metadata: StreamMetadata,
    // scratch buffer, reused across packets
    sample_buf: Option<SampleBuffer<i16>>,
    offset: u64,
    bad_packets: u32,
}

impl SymphoniaStream {
    pub fn open(source: AudioSource) -> Result<SymphoniaStream, SampleError> {
        let mss = source.into_stream()?;

        // Probe with an empty hint; the registry identifies the
        // container from the bytes themselves.
        let hint = Hint::new();
        let format_opts: FormatOptions = Default::default();
        let metadata_opts: MetadataOptions = Default::default();
        let decoder_opts: DecoderOptions = Default::default();

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &format_opts, &metadata_opts)
            .map_err(|err| {
                debug!("format probe failed: {}", err);
                SampleError::UnsupportedFormat
            })?;

        let format = probed.format;

        let track = format
            .default_track()
            .ok_or(SampleError::UnsupportedFormat)?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        // Channel count and sample rate are required up front: without
        // them the interleaving of the output cannot be interpreted.
        let channels = params
            .channels
            .map(|channels| channels.count() as u32)
            .filter(|&count| count > 0)
            .ok_or(SampleError::UnsupportedFormat)?;
        let sample_rate = params
            .sample_rate
            .filter(|&rate| rate > 0)
            .ok_or(SampleError::UnsupportedFormat)?;

        let metadata = StreamMetadata {
            channels,
            sample_rate,
            bits_per_sample: params.bits_per_sample.unwrap_or(16),
            total_frames: params.n_frames,
        };

        let decoder = symphonia::default::get_codecs()
            .make(&params, &decoder_opts)
            .map_err(|err| {
                debug!("no decoder for track: {}", err);
                SampleError::UnsupportedFormat
            })?;

        debug!(
            "opened audio stream: {} channels, {} Hz, {:?} total frames",
            channels, sample_rate, metadata.total_frames
        );

        Ok(SymphoniaStream {
            format,
            decoder,
            track_id,
            metadata,
            sample_buf: None,
            offset: 0,
            bad_packets: 0,
        })
    }

    pub fn metadata(&self) -> &StreamMetadata {
        &self.metadata
    }
}

impl BlockSource for SymphoniaStream {
    fn next_block(&mut self) -> Result<Option<PcmBlock>, SampleError> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(Error::IoError(err))
                    if err.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    // clean end of stream
                    return Ok(None);
                }
                Err(err) => {
                    warn!("error reading packet: {}", err);
                    return Err(SampleError::CorruptStream);
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(audio_buf) => {
                    self.bad_packets = 0;

                    // The scratch buffer is sized to the decoder's
                    // capacity, which is the same for every packet.
                    let spec = *audio_buf.spec();
                    let duration = audio_buf.capacity() as u64;
                    let buf = self
                        .sample_buf
                        .get_or_insert_with(|| SampleBuffer::<i16>::new(duration, spec));

                    buf.copy_interleaved_ref(audio_buf);
                    if buf.samples().is_empty() {
                        continue;
                    }

                    let block = PcmBlock {
                        samples: buf.samples().to_vec(),
                        offset: self.offset,
                    };
                    self.offset += block.samples.len() as u64;
                    return Ok(Some(block));
                }
                Err(Error::DecodeError(err)) => {
                    debug!("skipping undecodable packet: {}", err);
                    self.bad_packets += 1;
                    if self.bad_packets >= MAX_CONSECUTIVE_DECODE_ERRORS {
                        return Err(SampleError::CorruptStream);
                    }
                }
                Err(err) => {
                    warn!("decoder failed mid-stream: {}", err);
                    return Err(SampleError::CorruptStream);
                }
            }
        }
    }
}
