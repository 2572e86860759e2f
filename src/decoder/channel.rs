use std::fmt;

use super::{DecodeError, Measurement, round3};

/// Bytes read per channel: type nibble + flags in the top byte, magnitude below.
pub const CHANNEL_WORD_LEN: usize = 4;
pub const MAGNITUDE_MASK: u32 = 0x00FF_FFFF;

/// Fixed current conversion of the transmitter's voltage input.
pub const AMPS_PER_VOLT: f64 = 5.0;
/// Mains voltage assumed for the derived power and resistance.
pub const LINE_VOLTAGE: f64 = 220.0;

pub const MICROVOLTS_PER_VOLT: f64 = 1_000_000.0;
/// Current channel magnitudes are in 0.1 µA.
pub const DECI_MICROAMPS_PER_MILLIAMP: f64 = 100_000.0;

/// One of the two analog inputs carried in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    A,
    B,
}

impl Channel {
    /// Channels in the order they are decoded.
    pub const ALL: [Channel; 2] = [Channel::A, Channel::B];

    pub fn offset(self) -> usize {
        match self {
            Channel::A => 2,
            Channel::B => 6,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::A => f.write_str("A"),
            Channel::B => f.write_str("B"),
        }
    }
}

/// Measurement kind selected by the low nibble of a channel's first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Voltage,
    Current,
}

impl ChannelKind {
    pub fn from_nibble(nibble: u8) -> Option<Self> {
        match nibble {
            1 => Some(ChannelKind::Voltage),
            2 => Some(ChannelKind::Current),
            _ => None,
        }
    }
}

/// Decode one channel of `raw` and append its measurements to `out`.
///
/// Nothing is appended when an error is returned.
pub(crate) fn decode_channel(
    raw: &[u8],
    channel: Channel,
    out: &mut Vec<Measurement>,
) -> Result<(), DecodeError> {
    let offset = channel.offset();
    let word: [u8; CHANNEL_WORD_LEN] = raw
        .get(offset..offset + CHANNEL_WORD_LEN)
        .and_then(|w| w.try_into().ok())
        .ok_or(DecodeError::InsufficientBytes {
            channel,
            offset,
            len: raw.len(),
        })?;

    let nibble = word[0] & 0x0F;
    let magnitude = f64::from(u32::from_be_bytes(word) & MAGNITUDE_MASK);

    match ChannelKind::from_nibble(nibble) {
        Some(ChannelKind::Voltage) => {
            let volts = round3(magnitude / MICROVOLTS_PER_VOLT);
            let amps = volts * AMPS_PER_VOLT;
            let watts = amps * LINE_VOLTAGE;
            // +inf when the reading is zero volts.
            let ohms = LINE_VOLTAGE / amps;
            out.extend([
                Measurement::new("V", volts),
                Measurement::new("I", amps),
                Measurement::new("W", watts),
                Measurement::new("R", ohms),
            ]);
        }
        Some(ChannelKind::Current) => {
            let milliamps = round3(magnitude / DECI_MICROAMPS_PER_MILLIAMP);
            out.push(Measurement::new("mA", milliamps));
        }
        None => {
            return Err(DecodeError::UnsupportedChannelType {
                channel,
                kind: nibble,
            });
        }
    }

    Ok(())
}
