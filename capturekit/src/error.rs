use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid audio input: {0}")]
    InvalidInput(String),

    #[error("PCM container too large: {bytes} bytes does not fit a RIFF header")]
    TooLarge { bytes: u64 },

    #[error("Malformed WAV data: {0}")]
    Malformed(String),

    #[error("Unsupported channel count: {0}")]
    UnsupportedChannels(u16),

    /// Submit or flush was called on a session that has already been flushed.
    #[error("Encoder session already flushed")]
    SessionFlushed,

    #[error("Encoder error: {0}")]
    Encoder(String),
}
