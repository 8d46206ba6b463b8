//! Flags byte followed by the temperature as a little endian IEEE-754 `f32`.
//!
//! ```text
//! offset 0:   flags (bit 7 = Fahrenheit, always set)
//! offset 1-4: f32, little endian
//! ```

use super::{check_len, DecodeError};
use crate::types::{PayloadFlags, TemperatureReading};
use serde::{Deserialize, Serialize};

pub const PAYLOAD_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub struct EncodedPacket([u8; PAYLOAD_LEN]);

impl EncodedPacket {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> [u8; PAYLOAD_LEN] {
        self.0
    }

    /// The flags byte, as sent. See [`decode`] for why this is not consulted when decoding.
    pub fn flags(&self) -> PayloadFlags {
        PayloadFlags::from_byte(self.0[0])
    }
}

impl AsRef<[u8]> for EncodedPacket {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

pub fn encode(reading: TemperatureReading) -> EncodedPacket {
    let mut bytes = [0u8; PAYLOAD_LEN];
    bytes[0] = PayloadFlags::FAHRENHEIT.to_byte();
    bytes[1..].copy_from_slice(&reading.value().to_le_bytes());
    EncodedPacket(bytes)
}

/// Decode a measurement payload.
///
/// The flags byte is skipped without being interpreted, so a payload with the Fahrenheit bit
/// cleared still decodes as Fahrenheit. Bytes past the fifth are ignored. Any bit pattern,
/// including NaN and infinities, is returned as-is.
pub fn decode(data: &[u8]) -> Result<TemperatureReading, DecodeError> {
    check_len(data, PAYLOAD_LEN)?;
    let value = f32::from_le_bytes([data[1], data[2], data[3], data[4]]);
    Ok(TemperatureReading::new(value))
}
