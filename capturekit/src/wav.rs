use crate::audio_bytes::{interleave_f32_to_s16le, s16le_to_i16};
use crate::audio_types::DecodedAudioBuffer;
use crate::error::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

pub const WAV_HEADER_LEN: usize = 44;

const RIFF: u32 = 0x4646_4952;
const WAVE: u32 = 0x4556_4157;
const FMT: u32 = 0x2074_6d66;
const DATA: u32 = 0x6174_6164;

const FMT_CHUNK_LEN: u32 = 16;
const FORMAT_PCM: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: usize = 2;

/// Forward-only little-endian writer over a pre-sized buffer.
struct WavWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> WavWriter<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn put_u16(&mut self, value: u16) {
        LittleEndian::write_u16(&mut self.buf[self.pos..self.pos + 2], value);
        self.pos += 2;
    }

    fn put_u32(&mut self, value: u32) {
        LittleEndian::write_u32(&mut self.buf[self.pos..self.pos + 4], value);
        self.pos += 4;
    }

    fn pos(&self) -> usize {
        self.pos
    }
}

/// A canonical 16-bit PCM RIFF/WAVE file held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmContainer {
    channels: u16,
    sample_rate: u32,
    block_align: u16,
    data_len: u32,
    bytes: Vec<u8>,
}

impl PcmContainer {
    pub fn channel_count(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Bytes per sample frame (all channels at one instant).
    pub fn block_align(&self) -> u16 {
        self.block_align
    }

    pub fn data_len(&self) -> u32 {
        self.data_len
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn data(&self) -> &[u8] {
        &self.bytes[WAV_HEADER_LEN..]
    }

    /// Re-reads the header and returns the data region as interleaved i16.
    pub fn samples(&self) -> Result<Vec<i16>> {
        let header = WavHeader::read(&self.bytes)?;
        Ok(s16le_to_i16(header.data(&self.bytes)))
    }
}

/// Packs a decoded buffer into a 16-bit PCM WAV container.
///
/// Fails only when the result cannot be described by a RIFF header.
pub fn pack(buffer: &DecodedAudioBuffer) -> Result<PcmContainer> {
    let channels = buffer.channel_count();
    let sample_rate = buffer.sample_rate();

    let total = (buffer.sample_count() as u64) * (channels as u64) * BYTES_PER_SAMPLE as u64
        + WAV_HEADER_LEN as u64;
    if total > u32::MAX as u64 {
        return Err(Error::TooLarge { bytes: total });
    }

    let block_align = u16::try_from(channels as u32 * BYTES_PER_SAMPLE as u32).map_err(|_| {
        Error::InvalidInput(format!("block align overflows for {} channels", channels))
    })?;
    let byte_rate = sample_rate
        .checked_mul(block_align as u32)
        .ok_or_else(|| {
            Error::InvalidInput(format!(
                "byte rate overflows for {} Hz x {} channels",
                sample_rate, channels
            ))
        })?;

    let total = total as usize;
    let mut bytes = vec![0u8; total];

    let mut w = WavWriter::new(&mut bytes[..WAV_HEADER_LEN]);
    w.put_u32(RIFF);
    w.put_u32((total - 8) as u32);
    w.put_u32(WAVE);
    w.put_u32(FMT);
    w.put_u32(FMT_CHUNK_LEN);
    w.put_u16(FORMAT_PCM);
    w.put_u16(channels);
    w.put_u32(sample_rate);
    w.put_u32(byte_rate);
    w.put_u16(block_align);
    w.put_u16(BITS_PER_SAMPLE);
    w.put_u32(DATA);
    let data_len = (total - w.pos() - 4) as u32;
    w.put_u32(data_len);
    debug_assert_eq!(w.pos(), WAV_HEADER_LEN);

    interleave_f32_to_s16le(buffer.channels(), &mut bytes[WAV_HEADER_LEN..]);

    debug!(
        channels,
        sample_rate,
        frames = buffer.sample_count(),
        bytes = total,
        "packed pcm container"
    );

    Ok(PcmContainer {
        channels,
        sample_rate,
        block_align,
        data_len,
        bytes,
    })
}

/// Parsed RIFF/WAVE header of a 16-bit PCM file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// Offset of the first sample byte from the start of the file.
    pub data_offset: usize,
    pub data_len: usize,
}

impl WavHeader {
    /// Reads the header, skipping unknown chunks before `fmt ` and `data`.
    pub fn read(buf: &[u8]) -> Result<Self> {
        if buf.len() < 12 {
            return Err(Error::Malformed(format!(
                "need at least 12 bytes, got {}",
                buf.len()
            )));
        }
        if LittleEndian::read_u32(&buf[0..4]) != RIFF || LittleEndian::read_u32(&buf[8..12]) != WAVE
        {
            return Err(Error::Malformed("not a RIFF/WAVE file".to_string()));
        }

        let mut fmt: Option<(u16, u16, u32, u32, u16, u16)> = None;
        let mut idx = 12;

        loop {
            if buf.len() < idx + 8 {
                return Err(Error::Malformed("missing data chunk".to_string()));
            }
            let id = LittleEndian::read_u32(&buf[idx..idx + 4]);
            let size = LittleEndian::read_u32(&buf[idx + 4..idx + 8]) as usize;
            let body = idx + 8;

            match id {
                FMT => {
                    if size < FMT_CHUNK_LEN as usize || buf.len() < body + FMT_CHUNK_LEN as usize {
                        return Err(Error::Malformed("truncated fmt chunk".to_string()));
                    }
                    let f = &buf[body..body + FMT_CHUNK_LEN as usize];
                    fmt = Some((
                        LittleEndian::read_u16(&f[0..2]),
                        LittleEndian::read_u16(&f[2..4]),
                        LittleEndian::read_u32(&f[4..8]),
                        LittleEndian::read_u32(&f[8..12]),
                        LittleEndian::read_u16(&f[12..14]),
                        LittleEndian::read_u16(&f[14..16]),
                    ));
                }
                DATA => {
                    let (format, channels, sample_rate, byte_rate, block_align, bits) = fmt
                        .ok_or_else(|| Error::Malformed("data chunk before fmt".to_string()))?;

                    if format != FORMAT_PCM {
                        return Err(Error::Malformed(format!(
                            "unsupported format tag {}",
                            format
                        )));
                    }
                    if bits != BITS_PER_SAMPLE {
                        return Err(Error::Malformed(format!(
                            "unsupported bits per sample {}",
                            bits
                        )));
                    }
                    if channels == 0 {
                        return Err(Error::Malformed("zero channels".to_string()));
                    }
                    if block_align as usize != channels as usize * BYTES_PER_SAMPLE {
                        return Err(Error::Malformed(format!(
                            "block align {} does not match {} channels",
                            block_align, channels
                        )));
                    }
                    if size % block_align as usize != 0 {
                        return Err(Error::Malformed(format!(
                            "data length {} is not a multiple of block align {}",
                            size, block_align
                        )));
                    }
                    if buf.len() < body + size {
                        return Err(Error::Malformed(format!(
                            "data chunk declares {} bytes, {} available",
                            size,
                            buf.len() - body
                        )));
                    }

                    return Ok(WavHeader {
                        channels,
                        sample_rate,
                        byte_rate,
                        block_align,
                        bits_per_sample: bits,
                        data_offset: body,
                        data_len: size,
                    });
                }
                _ => {}
            }

            // chunks are word aligned
            idx = body + size + (size & 1);
        }
    }

    pub fn data<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.data_offset..self.data_offset + self.data_len]
    }

    /// Number of interleaved 16-bit samples in the data chunk.
    pub fn sample_len(&self) -> usize {
        self.data_len / BYTES_PER_SAMPLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_bytes::f32_to_s16;

    fn stereo(left: Vec<f32>, right: Vec<f32>) -> DecodedAudioBuffer {
        DecodedAudioBuffer::new(44_100, vec![left, right]).unwrap()
    }

    #[test]
    fn test_pack_header_layout() {
        let buf = stereo(vec![0.0; 3], vec![0.0; 3]);
        let wav = pack(&buf).unwrap();
        let b = wav.as_bytes();

        assert_eq!(b.len(), 44 + 3 * 2 * 2);
        assert_eq!(&b[0..4], b"RIFF");
        assert_eq!(LittleEndian::read_u32(&b[4..8]) as usize, b.len() - 8);
        assert_eq!(&b[8..12], b"WAVE");
        assert_eq!(&b[12..16], b"fmt ");
        assert_eq!(LittleEndian::read_u32(&b[16..20]), 16);
        assert_eq!(LittleEndian::read_u16(&b[20..22]), 1);
        assert_eq!(LittleEndian::read_u16(&b[22..24]), 2);
        assert_eq!(LittleEndian::read_u32(&b[24..28]), 44_100);
        assert_eq!(LittleEndian::read_u32(&b[28..32]), 44_100 * 2 * 2);
        assert_eq!(LittleEndian::read_u16(&b[32..34]), 4);
        assert_eq!(LittleEndian::read_u16(&b[34..36]), 16);
        assert_eq!(&b[36..40], b"data");
        assert_eq!(LittleEndian::read_u32(&b[40..44]), 12);

        assert_eq!(wav.channel_count(), 2);
        assert_eq!(wav.sample_rate(), 44_100);
        assert_eq!(wav.block_align(), 4);
        assert_eq!(wav.data_len(), 12);
    }

    #[test]
    fn test_pack_exact_header_bytes() {
        let buf = DecodedAudioBuffer::new(8_000, vec![vec![]]).unwrap();
        let wav = pack(&buf).unwrap();
        let expected: [u8; 44] = [
            b'R', b'I', b'F', b'F', 36, 0, 0, 0, b'W', b'A', b'V', b'E', b'f', b'm', b't', b' ',
            16, 0, 0, 0, 1, 0, 1, 0, 0x40, 0x1f, 0, 0, 0x80, 0x3e, 0, 0, 2, 0, 16, 0, b'd', b'a',
            b't', b'a', 0, 0, 0, 0,
        ];
        assert_eq!(wav.as_bytes(), &expected[..]);
    }

    #[test]
    fn test_pack_lengths_hold_for_varied_shapes() {
        for (channels, frames) in [(1usize, 0usize), (1, 1), (2, 1153), (3, 10), (6, 480)] {
            let buf = DecodedAudioBuffer::new(48_000, vec![vec![0.1; frames]; channels]).unwrap();
            let wav = pack(&buf).unwrap();
            let b = wav.as_bytes();
            assert_eq!(LittleEndian::read_u32(&b[4..8]) as usize, b.len() - 8);
            assert_eq!(
                LittleEndian::read_u32(&b[40..44]) as usize,
                frames * channels * 2
            );
        }
    }

    #[test]
    fn test_pack_silence_is_zero() {
        let buf = stereo(vec![0.0; 100], vec![0.0; 100]);
        let wav = pack(&buf).unwrap();
        assert_eq!(wav.data().len(), 400);
        assert!(wav.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_pack_interleaves_channels() {
        let (a0, a1, b0, b1) = (0.25, -0.75, 1.5, -0.1);
        let buf = stereo(vec![a0, a1], vec![b0, b1]);
        let wav = pack(&buf).unwrap();
        assert_eq!(
            wav.samples().unwrap(),
            vec![f32_to_s16(a0), f32_to_s16(b0), f32_to_s16(a1), f32_to_s16(b1)]
        );
    }

    #[test]
    fn test_pack_full_scale() {
        let buf = DecodedAudioBuffer::new(22_050, vec![vec![1.0, -1.0, 1.5, -1.5]]).unwrap();
        let wav = pack(&buf).unwrap();
        assert_eq!(wav.samples().unwrap(), vec![32767, -32768, 32767, -32768]);
    }

    #[test]
    fn test_read_header_of_packed() {
        let buf = stereo(vec![0.5; 10], vec![-0.5; 10]);
        let wav = pack(&buf).unwrap();
        let header = WavHeader::read(wav.as_bytes()).unwrap();
        assert_eq!(header.channels, 2);
        assert_eq!(header.sample_rate, 44_100);
        assert_eq!(header.byte_rate, 176_400);
        assert_eq!(header.block_align, 4);
        assert_eq!(header.bits_per_sample, 16);
        assert_eq!(header.data_offset, 44);
        assert_eq!(header.data_len, 40);
        assert_eq!(header.sample_len(), 20);
    }

    #[test]
    fn test_read_header_skips_unknown_chunks() {
        let wav = pack(&DecodedAudioBuffer::new(16_000, vec![vec![0.0; 2]]).unwrap()).unwrap();
        let b = wav.as_bytes();

        // splice a LIST chunk with an odd length between fmt and data
        let mut spliced = Vec::new();
        spliced.extend_from_slice(&b[..36]);
        spliced.extend_from_slice(b"LIST");
        spliced.extend_from_slice(&3u32.to_le_bytes());
        spliced.extend_from_slice(&[1, 2, 3, 0]);
        spliced.extend_from_slice(&b[36..]);

        let header = WavHeader::read(&spliced).unwrap();
        assert_eq!(header.data_offset, 56);
        assert_eq!(header.data_len, 4);
    }

    #[test]
    fn test_read_header_rejects_bad_magic() {
        let mut b = pack(&DecodedAudioBuffer::new(16_000, vec![vec![0.0]]).unwrap())
            .unwrap()
            .into_bytes();
        b[8..12].copy_from_slice(b"AVI ");
        assert!(matches!(WavHeader::read(&b), Err(Error::Malformed(_))));
    }

    #[test]
    fn test_read_header_rejects_truncated() {
        let b = pack(&DecodedAudioBuffer::new(16_000, vec![vec![0.0; 8]]).unwrap())
            .unwrap()
            .into_bytes();
        assert!(matches!(WavHeader::read(&b[..8]), Err(Error::Malformed(_))));
        assert!(matches!(WavHeader::read(&b[..30]), Err(Error::Malformed(_))));
        assert!(matches!(
            WavHeader::read(&b[..b.len() - 1]),
            Err(Error::Malformed(_))
        ));
    }

    #[test]
    fn test_read_header_rejects_float_format() {
        let mut b = pack(&DecodedAudioBuffer::new(16_000, vec![vec![0.0; 2]]).unwrap())
            .unwrap()
            .into_bytes();
        b[20..22].copy_from_slice(&3u16.to_le_bytes());
        assert_eq!(
            WavHeader::read(&b),
            Err(Error::Malformed("unsupported format tag 3".to_string()))
        );
    }

    #[test]
    fn test_pack_rejects_byte_rate_overflow() {
        let buf = DecodedAudioBuffer::new(u32::MAX, vec![vec![]; 2]).unwrap();
        assert!(matches!(pack(&buf), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_read_header_rejects_partial_sample_frame() {
        let mut b = pack(&stereo(vec![0.0; 2], vec![0.0; 2]))
            .unwrap()
            .into_bytes();
        // 6 data bytes is one and a half stereo frames
        b[40..44].copy_from_slice(&6u32.to_le_bytes());
        assert_eq!(
            WavHeader::read(&b),
            Err(Error::Malformed(
                "data length 6 is not a multiple of block align 4".to_string()
            ))
        );
    }

    #[test]
    fn test_read_header_rejects_wrong_block_align() {
        let mut b = pack(&stereo(vec![0.0; 2], vec![0.0; 2]))
            .unwrap()
            .into_bytes();
        b[32..34].copy_from_slice(&2u16.to_le_bytes());
        assert!(matches!(WavHeader::read(&b), Err(Error::Malformed(_))));
    }
}
