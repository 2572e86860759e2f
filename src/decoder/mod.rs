pub mod channel;

use base64::Engine;
use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use serde::Serialize;
use thiserror::Error;

pub use channel::{Channel, ChannelKind};

/// Smallest frame accepted: header plus channel B's type byte.
pub const MIN_PAYLOAD_LEN: usize = 7;

/// Standard alphabet, padding required, non-zero trailing bits tolerated.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("base64 decode error: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("payload too short: need at least {} bytes, got {}", MIN_PAYLOAD_LEN, .len)]
    PayloadTooShort { len: usize },

    #[error("channel {channel} decode error: not enough bytes for uint32 at offset {offset} (payload is {len} bytes)")]
    InsufficientBytes {
        channel: Channel,
        offset: usize,
        len: usize,
    },

    #[error("channel {channel} decode error: unsupported channel type {kind}")]
    UnsupportedChannelType { channel: Channel, kind: u8 },
}

pub type Result<T> = std::result::Result<T, DecodeError>;

/// A named physical quantity read from one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurement {
    pub name: &'static str,
    /// May be infinite: resistance of a zero-volt reading is `+inf`.
    pub value: f64,
}

impl Measurement {
    pub fn new(name: &'static str, value: f64) -> Self {
        Self { name, value }
    }
}

/// Decoder for two-channel analog transmitter frames.
///
/// Holds no state; a single instance can be shared freely between threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct PayloadDecoder;

impl PayloadDecoder {
    pub fn new() -> Self {
        PayloadDecoder
    }

    /// Decode a standard (padded) base64 frame into channel A's measurements
    /// followed by channel B's.
    pub fn decode(&self, input: &str) -> Result<Vec<Measurement>> {
        // Line breaks from wrapped input are skipped.
        let cleaned: String = input.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
        let raw = BASE64.decode(cleaned)?;
        self.decode_bytes(&raw)
    }

    /// Same as [`decode`](Self::decode) for a frame that is already raw bytes.
    pub fn decode_bytes(&self, raw: &[u8]) -> Result<Vec<Measurement>> {
        if raw.len() < MIN_PAYLOAD_LEN {
            return Err(DecodeError::PayloadTooShort { len: raw.len() });
        }

        let mut measurements = Vec::with_capacity(5);
        for channel in Channel::ALL {
            channel::decode_channel(raw, channel, &mut measurements)?;
        }
        Ok(measurements)
    }
}

/// Round to 3 decimals, ties away from zero.
pub(crate) fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(raw: &[u8]) -> String {
        BASE64.encode(raw)
    }

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-6
    }

    fn valid_frame() -> [u8; 10] {
        [0x00, 0x00, 0x01, 0x00, 0xF4, 0x24, 0x02, 0x00, 0x03, 0xE8]
    }

    #[test]
    fn decodes_voltage_then_current() {
        let decoder = PayloadDecoder::new();
        let metrics = decoder.decode(&encode(&valid_frame())).unwrap();

        let expected = [
            ("V", 0.063),
            ("I", 0.315),
            ("W", 69.3),
            ("R", 220.0 / 0.315),
            ("mA", 0.01),
        ];
        assert_eq!(metrics.len(), expected.len());
        for (m, (name, value)) in metrics.iter().zip(expected) {
            assert_eq!(m.name, name);
            assert!(approx_eq(m.value, value), "{} = {}, want {}", m.name, m.value, value);
        }
    }

    #[test]
    fn invalid_base64_is_an_encoding_error() {
        let err = PayloadDecoder::new().decode("not_base64!!").unwrap_err();
        assert!(matches!(err, DecodeError::Encoding(_)));
        assert!(err.to_string().starts_with("base64 decode error:"));
    }

    #[test]
    fn missing_padding_is_rejected() {
        // "AAAAAAAAAA==" without its padding.
        let err = PayloadDecoder::new().decode("AAAAAAAAAA").unwrap_err();
        assert!(matches!(err, DecodeError::Encoding(_)));
    }

    #[test]
    fn trailing_bits_in_last_symbol_are_accepted() {
        // "6B" instead of "6A": the extra low bit is dropped.
        let lenient = PayloadDecoder::new().decode("AAABAPQkAgAD6B==").unwrap();
        let canonical = PayloadDecoder::new().decode("AAABAPQkAgAD6A==").unwrap();
        assert_eq!(lenient, canonical);
        assert_eq!(lenient.len(), 5);
    }

    #[test]
    fn line_breaks_are_skipped() {
        let wrapped = PayloadDecoder::new().decode("AAABAPQk\r\nAgAD\n6A==").unwrap();
        let canonical = PayloadDecoder::new().decode("AAABAPQkAgAD6A==").unwrap();
        assert_eq!(wrapped, canonical);
    }

    #[test]
    fn other_whitespace_is_still_rejected() {
        let err = PayloadDecoder::new().decode("AAABAPQk AgAD6A==").unwrap_err();
        assert!(matches!(err, DecodeError::Encoding(_)));
    }

    #[test]
    fn too_short_names_the_minimum() {
        let err = PayloadDecoder::new().decode(&encode(&[0u8; 5])).unwrap_err();
        assert!(matches!(err, DecodeError::PayloadTooShort { len: 5 }));
        assert_eq!(
            err.to_string(),
            "payload too short: need at least 7 bytes, got 5"
        );
    }

    #[test]
    fn empty_input_is_too_short() {
        let err = PayloadDecoder::new().decode("").unwrap_err();
        assert!(matches!(err, DecodeError::PayloadTooShort { len: 0 }));
    }

    #[test]
    fn seven_byte_frame_fails_on_channel_b_window() {
        let raw = [0x00, 0x00, 0x01, 0x00, 0xF4, 0x24, 0x02];
        let err = PayloadDecoder::new().decode_bytes(&raw).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InsufficientBytes { channel: Channel::B, offset: 6, len: 7 }
        ));
    }

    #[test]
    fn channel_a_type_is_checked_before_channel_b() {
        let mut raw = [0u8; 10];
        raw[2] = 0x03;
        raw[6] = 0x04;
        let err = PayloadDecoder::new().decode_bytes(&raw).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnsupportedChannelType { channel: Channel::A, kind: 3 }
        ));
        assert_eq!(
            err.to_string(),
            "channel A decode error: unsupported channel type 3"
        );
    }

    #[test]
    fn unsupported_channel_b_discards_channel_a() {
        let mut raw = valid_frame();
        raw[6] = 0x00;
        let err = PayloadDecoder::new().decode_bytes(&raw).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnsupportedChannelType { channel: Channel::B, kind: 0 }
        ));
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut raw = valid_frame().to_vec();
        raw.extend([0xAA, 0xBB, 0xCC]);
        let metrics = PayloadDecoder::new().decode_bytes(&raw).unwrap();
        assert_eq!(metrics.len(), 5);
    }

    #[test]
    fn two_current_channels() {
        let mut raw = valid_frame();
        raw[2..6].copy_from_slice(&[0x02, 0x00, 0x27, 0x10]);
        let metrics = PayloadDecoder::new().decode_bytes(&raw).unwrap();
        let names: Vec<_> = metrics.iter().map(|m| m.name).collect();
        assert_eq!(names, ["mA", "mA"]);
        assert!(approx_eq(metrics[0].value, 0.1));
    }
}
