pub mod audio_bytes;
pub mod audio_types;
pub mod config;
pub mod error;
pub mod frame;
pub mod test_utils;
pub mod wav;

pub use audio_types::DecodedAudioBuffer;
pub use config::EncoderConfig;
pub use error::{Error, Result};
pub use frame::{CompressedOutput, FrameEncoder, SessionState, SAMPLES_PER_FRAME};
pub use wav::{pack, PcmContainer, WavHeader};
