use byteorder::{ByteOrder, LittleEndian};

/// Quantizes one float sample to signed 16-bit.
///
/// The input is clamped to [-1.0, 1.0], negative values are scaled by 32768
/// and the rest by 32767, then truncated toward zero. `-1.0` maps to
/// `i16::MIN` and `1.0` to `i16::MAX`. NaN maps to 0.
#[inline]
pub fn f32_to_s16(sample: f32) -> i16 {
    let clamped = (sample as f64).clamp(-1.0, 1.0);
    if clamped < 0.0 {
        (clamped * 32768.0) as i16
    } else {
        (clamped * 32767.0) as i16
    }
}

/// Quantizes planar float channels and writes them as interleaved s16le into
/// `out`, time-major with channels innermost.
///
/// `out` must hold exactly `channels.len() * channels[0].len() * 2` bytes.
pub fn interleave_f32_to_s16le(channels: &[Vec<f32>], out: &mut [u8]) {
    let channel_count = channels.len();
    if channel_count == 0 {
        return;
    }
    let sample_count = channels[0].len();
    assert_eq!(
        out.len(),
        sample_count * channel_count * 2,
        "output length must match interleaved sample bytes"
    );

    let mut pos = 0;
    for i in 0..sample_count {
        for channel in channels {
            LittleEndian::write_i16(&mut out[pos..pos + 2], f32_to_s16(channel[i]));
            pos += 2;
        }
    }
}

pub fn s16le_to_i16(data: &[u8]) -> Vec<i16> {
    let sample_count = data.len() / 2;
    let mut result = Vec::with_capacity(sample_count);
    data.chunks_exact(2).for_each(|chunk| {
        result.push(LittleEndian::read_i16(chunk));
    });
    result
}
