use bytes::Bytes;
use capturekit::frame::{self, CompressedOutput, FrameEncoder, SessionState};
use capturekit::{pack, DecodedAudioBuffer, EncoderConfig, Error, Result, WavHeader};
use mp3lame_encoder::{
    max_required_buffer_size, Bitrate, Builder, FlushGap, InterleavedPcm, MonoPcm,
};
use tracing::{debug, debug_span};

// worst-case size of the final frames written by a flush
const FLUSH_RESERVE: usize = 7200;

/// One LAME encoder run: constant bitrate, no tag frames.
pub struct Mp3Session {
    inner: mp3lame_encoder::Encoder,
    channels: u16,
    state: SessionState,
    scratch: Vec<u8>,
}

fn lame_bitrate(bitrate: u32) -> Result<Bitrate> {
    match bitrate {
        320_000 => Ok(Bitrate::Kbps320),
        256_000 => Ok(Bitrate::Kbps256),
        192_000 => Ok(Bitrate::Kbps192),
        128_000 => Ok(Bitrate::Kbps128),
        96_000 => Ok(Bitrate::Kbps96),
        b => Err(Error::InvalidInput(format!(
            "unsupported bitrate {} (expected 96000, 128000, 192000, 256000 or 320000)",
            b
        ))),
    }
}

impl Mp3Session {
    fn check_interleaved(&self, samples: &[i16]) -> Result<()> {
        if samples.len() % self.channels as usize != 0 {
            return Err(Error::InvalidInput(format!(
                "{} samples do not divide into {} channels",
                samples.len(),
                self.channels
            )));
        }
        Ok(())
    }

    fn encode_into_scratch(&mut self, samples: &[i16]) -> Result<()> {
        self.scratch.reserve(max_required_buffer_size(samples.len()));

        let res = if self.channels == 1 {
            self.inner.encode_to_vec(MonoPcm(samples), &mut self.scratch)
        } else {
            self.inner.encode_to_vec(InterleavedPcm(samples), &mut self.scratch)
        };
        res.map(|_| ()).map_err(|e| Error::Encoder(e.to_string()))
    }

    fn take_scratch(&mut self) -> Option<Bytes> {
        if self.scratch.is_empty() {
            None
        } else {
            // scratch is reused by the next call
            Some(Bytes::copy_from_slice(&self.scratch))
        }
    }
}

impl FrameEncoder for Mp3Session {
    fn new(sample_rate: u32, channels: u16, config: &EncoderConfig) -> Result<Self> {
        if !(1..=2).contains(&channels) {
            return Err(Error::UnsupportedChannels(channels));
        }
        let brate = lame_bitrate(config.bitrate)?;

        let mut builder =
            Builder::new().ok_or_else(|| Error::Encoder("lame_init failed".to_string()))?;
        builder
            .set_sample_rate(sample_rate)
            .map_err(|e| Error::Encoder(format!("sample rate {}: {:?}", sample_rate, e)))?;
        builder
            .set_num_channels(channels as u8)
            .map_err(|e| Error::Encoder(format!("channels {}: {:?}", channels, e)))?;
        builder
            .set_brate(brate)
            .map_err(|e| Error::Encoder(format!("bitrate {}: {:?}", config.bitrate, e)))?;
        builder
            .set_to_write_vbr_tag(false)
            .map_err(|e| Error::Encoder(format!("vbr tag: {:?}", e)))?;
        let inner = builder
            .build()
            .map_err(|e| Error::Encoder(format!("lame_init_params: {:?}", e)))?;

        debug!(sample_rate, channels, bitrate = config.bitrate, "mp3 session created");

        Ok(Mp3Session {
            inner,
            channels,
            state: SessionState::Created,
            scratch: Vec::new(),
        })
    }

    fn channel_count(&self) -> u16 {
        self.channels
    }

    fn state(&self) -> SessionState {
        self.state
    }

    fn submit(&mut self, frame: &[i16]) -> Result<Option<Bytes>> {
        self.check_interleaved(frame)?;
        self.state.begin_submit()?;
        self.scratch.clear();
        self.encode_into_scratch(frame)?;
        Ok(self.take_scratch())
    }

    fn flush(&mut self, tail: &[i16]) -> Result<Option<Bytes>> {
        self.check_interleaved(tail)?;
        self.state.begin_flush()?;
        self.scratch.clear();
        if !tail.is_empty() {
            self.encode_into_scratch(tail)?;
        }

        self.scratch.reserve(FLUSH_RESERVE);
        self.inner
            .flush_to_vec::<FlushGap>(&mut self.scratch)
            .map_err(|e| Error::Encoder(e.to_string()))?;

        debug!(tail = tail.len(), bytes = self.scratch.len(), "mp3 session flushed");
        Ok(self.take_scratch())
    }
}

/// Encodes interleaved 16-bit PCM to MP3 at the default 128 kbps.
pub fn encode(channels: u16, sample_rate: u32, samples: &[i16]) -> Result<CompressedOutput> {
    frame::encode::<Mp3Session>(channels, sample_rate, samples, &EncoderConfig::default())
}

/// Transcodes a decoded recording to a standalone MP3 stream.
pub fn transcode(buffer: &DecodedAudioBuffer) -> Result<Bytes> {
    transcode_with(buffer, &EncoderConfig::default())
}

pub fn transcode_with(buffer: &DecodedAudioBuffer, config: &EncoderConfig) -> Result<Bytes> {
    let _span = debug_span!(
        "transcode",
        channels = buffer.channel_count(),
        sample_rate = buffer.sample_rate()
    )
    .entered();

    let wav = pack(buffer)?;
    let header = WavHeader::read(wav.as_bytes())?;
    let samples = wav.samples()?;

    let out = frame::encode::<Mp3Session>(header.channels, header.sample_rate, &samples, config)?;
    Ok(out.into_bytes())
}
