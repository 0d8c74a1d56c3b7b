use crate::config::EncoderConfig;
use crate::error::{Error, Result};
use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

/// Sample frames per MPEG-1 Layer III frame.
pub const SAMPLES_PER_FRAME: usize = 1152;

/// Lifecycle of an encoder session. Dropping the session closes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Encoding,
    Flushed,
}

impl SessionState {
    /// Moves to `Encoding`; fails once flushed.
    pub fn begin_submit(&mut self) -> Result<()> {
        match self {
            SessionState::Flushed => Err(Error::SessionFlushed),
            _ => {
                *self = SessionState::Encoding;
                Ok(())
            }
        }
    }

    /// Moves to `Flushed`; fails if already flushed.
    pub fn begin_flush(&mut self) -> Result<()> {
        match self {
            SessionState::Flushed => Err(Error::SessionFlushed),
            _ => {
                *self = SessionState::Flushed;
                Ok(())
            }
        }
    }
}

/// A stateful, single-use compression session fed whole frames of
/// interleaved 16-bit samples.
pub trait FrameEncoder {
    fn new(sample_rate: u32, channels: u16, config: &EncoderConfig) -> Result<Self>
    where
        Self: Sized;

    fn channel_count(&self) -> u16;

    fn state(&self) -> SessionState;

    /// Encodes one full frame (`SAMPLES_PER_FRAME * channels` samples).
    /// Returns `None` when the codec held the frame back without output.
    fn submit(&mut self, frame: &[i16]) -> Result<Option<Bytes>>;

    /// Encodes the trailing partial frame, if any, and drains the session.
    /// May be called once.
    fn flush(&mut self, tail: &[i16]) -> Result<Option<Bytes>>;
}

/// Encoded chunks in emission order.
#[derive(Debug, Clone, Default)]
pub struct CompressedOutput {
    chunks: Vec<Bytes>,
    frames_submitted: usize,
}

impl CompressedOutput {
    fn push(&mut self, chunk: Bytes) {
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
    }

    pub fn chunks(&self) -> &[Bytes] {
        &self.chunks
    }

    /// Full frames handed to the session before flushing.
    pub fn frames_submitted(&self) -> usize {
        self.frames_submitted
    }

    /// Total encoded length in bytes.
    pub fn len(&self) -> usize {
        self.chunks.iter().map(Bytes::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        if self.chunks.len() == 1 {
            return self.chunks.into_iter().next().unwrap_or_default();
        }
        let mut buf = BytesMut::with_capacity(self.len());
        for chunk in &self.chunks {
            buf.extend_from_slice(chunk);
        }
        buf.freeze()
    }
}

/// Feeds `samples` to `session` one full frame at a time, then flushes once
/// with whatever partial frame is left over.
pub fn encode_frames<E: FrameEncoder>(session: &mut E, samples: &[i16]) -> Result<CompressedOutput> {
    let channels = session.channel_count() as usize;
    if channels == 0 || samples.len() % channels != 0 {
        return Err(Error::InvalidInput(format!(
            "{} samples do not divide into {} channels",
            samples.len(),
            channels
        )));
    }

    let frame_len = SAMPLES_PER_FRAME * channels;
    let mut out = CompressedOutput::default();
    let mut frames = samples.chunks_exact(frame_len);

    for frame in &mut frames {
        if let Some(chunk) = session.submit(frame)? {
            trace!(frame = out.frames_submitted, bytes = chunk.len(), "frame encoded");
            out.push(chunk);
        }
        out.frames_submitted += 1;
    }

    let tail = frames.remainder();
    if let Some(chunk) = session.flush(tail)? {
        out.push(chunk);
    }

    debug!(
        frames = out.frames_submitted,
        tail = tail.len(),
        chunks = out.chunks.len(),
        bytes = out.len(),
        "encode finished"
    );

    Ok(out)
}

/// Opens a fresh `E` session and encodes `samples` through it.
pub fn encode<E: FrameEncoder>(
    channels: u16,
    sample_rate: u32,
    samples: &[i16],
    config: &EncoderConfig,
) -> Result<CompressedOutput> {
    let mut session = E::new(sample_rate, channels, config)?;
    encode_frames(&mut session, samples)
}
