//! Decoder for two-channel analog sensor transmitter frames.
//!
//! A frame is base64 on the wire. Channel A sits at byte 2 and channel B at
//! byte 6; each is a big-endian word whose low nibble of the first byte picks
//! the channel type and whose low 24 bits hold the reading.
//!
//! ```
//! use analog_payload::PayloadDecoder;
//!
//! let measurements = PayloadDecoder::new().decode("AAABAPQkAgAD6A==").unwrap();
//! let names: Vec<_> = measurements.iter().map(|m| m.name).collect();
//! assert_eq!(names, ["V", "I", "W", "R", "mA"]);
//! ```

pub mod decoder;
pub mod export;

pub use decoder::{Channel, ChannelKind, DecodeError, Measurement, PayloadDecoder};
