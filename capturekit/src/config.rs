use serde::{Deserialize, Serialize};

/// Constant bitrate used for recordings, in bits per second.
pub const DEFAULT_BITRATE: u32 = 128_000;

/// Settings shared by every frame encoder session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Target constant bitrate in bits per second.
    pub bitrate: u32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            bitrate: DEFAULT_BITRATE,
        }
    }
}
