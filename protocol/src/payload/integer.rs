//! The slider value as one byte, followed by a reserved zero byte.

use super::{check_len, DecodeError};
use crate::types::SliderValue;
use serde::{Deserialize, Serialize};

pub const PAYLOAD_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub struct IntegerPacket([u8; PAYLOAD_LEN]);

impl IntegerPacket {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> [u8; PAYLOAD_LEN] {
        self.0
    }
}

impl AsRef<[u8]> for IntegerPacket {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

pub fn encode(value: SliderValue) -> IntegerPacket {
    IntegerPacket([value.get(), 0x00])
}

/// Decode an integer payload, reading only the first byte.
///
/// Values above [`SliderValue::MAX`] are returned unclamped.
pub fn decode(data: &[u8]) -> Result<SliderValue, DecodeError> {
    check_len(data, PAYLOAD_LEN)?;
    Ok(SliderValue::from_raw(data[0]))
}
