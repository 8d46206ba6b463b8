//! Payload codecs.
//!
//! Two unrelated payload formats have been broadcast by the advertiser over its history and
//! both are supported side by side:
//!
//! - [`measurement`]: a flags byte followed by a little endian `f32`, matching the layout of the
//!   Temperature Measurement characteristic.
//! - [`integer`]: the slider value as a single byte followed by a zero byte.

pub mod integer;
pub mod measurement;

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub enum DecodeError {
    #[error("Payload too short (expected at least {expected} bytes, got {actual})")]
    TooShort { expected: usize, actual: usize },
}

/// Check that `data` holds at least `expected` bytes.
pub(crate) fn check_len(data: &[u8], expected: usize) -> Result<(), DecodeError> {
    if data.len() < expected {
        Err(DecodeError::TooShort {
            expected,
            actual: data.len(),
        })
    } else {
        Ok(())
    }
}

/// Selects which payload format is produced or expected.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub enum PayloadVariant {
    #[default]
    Measurement,
    Integer,
}

impl PayloadVariant {
    pub const fn payload_len(&self) -> usize {
        match self {
            Self::Measurement => measurement::PAYLOAD_LEN,
            Self::Integer => integer::PAYLOAD_LEN,
        }
    }
}

/// A decoded payload of either variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub enum Value {
    Temperature(crate::types::TemperatureReading),
    Slider(crate::types::SliderValue),
}

impl Value {
    pub fn variant(&self) -> PayloadVariant {
        match self {
            Self::Temperature(_) => PayloadVariant::Measurement,
            Self::Slider(_) => PayloadVariant::Integer,
        }
    }
}

impl core::fmt::Display for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Temperature(t) => write!(f, "{}\u{00B0}F", t.value()),
            Self::Slider(s) => write!(f, "{}", s.get()),
        }
    }
}

/// Decode `data` according to `variant`.
pub fn decode(variant: PayloadVariant, data: &[u8]) -> Result<Value, DecodeError> {
    match variant {
        PayloadVariant::Measurement => measurement::decode(data).map(Value::Temperature),
        PayloadVariant::Integer => integer::decode(data).map(Value::Slider),
    }
}

/// An encoded payload of either variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub enum Packet {
    Measurement(measurement::EncodedPacket),
    Integer(integer::IntegerPacket),
}

impl Packet {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Measurement(p) => p.as_bytes(),
            Self::Integer(p) => p.as_bytes(),
        }
    }
}

/// Encode `value` into the payload format it belongs to.
pub fn encode(value: &Value) -> Packet {
    match value {
        Value::Temperature(t) => Packet::Measurement(measurement::encode(*t)),
        Value::Slider(s) => Packet::Integer(integer::encode(*s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SliderValue, TemperatureReading};

    #[test]
    fn variant_lengths() {
        assert_eq!(PayloadVariant::Measurement.payload_len(), 5);
        assert_eq!(PayloadVariant::Integer.payload_len(), 2);
    }

    #[test]
    fn dispatch_by_variant() {
        let data = [0x80, 0x00, 0x00, 0xA0, 0x41];
        assert_eq!(
            decode(PayloadVariant::Measurement, &data),
            Ok(Value::Temperature(TemperatureReading::new(20.0)))
        );
        assert_eq!(
            decode(PayloadVariant::Integer, &data),
            Ok(Value::Slider(SliderValue::from_raw(0x80)))
        );
    }

    #[test]
    fn encode_either_variant() {
        let t = Value::Temperature(TemperatureReading::new(20.0));
        assert_eq!(encode(&t).as_bytes(), &[0x80, 0x00, 0x00, 0xA0, 0x41]);
        assert_eq!(t.variant(), PayloadVariant::Measurement);

        let s = Value::Slider(SliderValue::new(42));
        assert_eq!(encode(&s).as_bytes(), &[42, 0]);
        assert_eq!(s.variant(), PayloadVariant::Integer);
    }

    #[test]
    fn short_input_reports_lengths() {
        assert_eq!(
            decode(PayloadVariant::Measurement, &[0x80, 0x00]),
            Err(DecodeError::TooShort {
                expected: 5,
                actual: 2
            })
        );
        assert_eq!(
            decode(PayloadVariant::Integer, &[]),
            Err(DecodeError::TooShort {
                expected: 2,
                actual: 0
            })
        );
    }
}
