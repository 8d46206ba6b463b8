use core::ops::Deref;
use serde::{Deserialize, Serialize};

/// A temperature in degrees Fahrenheit.
///
/// No range validation is applied, any `f32` bit pattern is a valid reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub struct TemperatureReading {
    value: f32,
}

impl TemperatureReading {
    pub const fn new(fahrenheit: f32) -> Self {
        Self { value: fahrenheit }
    }

    pub const fn value(&self) -> f32 {
        self.value
    }
}

impl Deref for TemperatureReading {
    type Target = f32;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl From<f32> for TemperatureReading {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

/// The flags byte that leads a measurement payload.
///
/// Only the top bit is defined; it marks the value as Fahrenheit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub struct PayloadFlags {
    pub fahrenheit: bool,
}

impl PayloadFlags {
    pub const FAHRENHEIT_BIT: u8 = 0x80;

    pub const FAHRENHEIT: Self = Self { fahrenheit: true };

    pub const fn to_byte(self) -> u8 {
        if self.fahrenheit {
            Self::FAHRENHEIT_BIT
        } else {
            0
        }
    }

    /// Interpret a received flags byte.
    ///
    /// Bits 0 to 6 are ignored. Decoding a payload never calls this, it is here for diagnostic
    /// display of raw packets.
    pub const fn from_byte(byte: u8) -> Self {
        Self {
            fahrenheit: byte & Self::FAHRENHEIT_BIT != 0,
        }
    }
}

impl Default for PayloadFlags {
    fn default() -> Self {
        Self::FAHRENHEIT
    }
}

/// The integer value chosen on the advertiser's slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub struct SliderValue(u8);

impl SliderValue {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(100);
    pub const DEFAULT: Self = Self(20);

    /// Values above [`SliderValue::MAX`] are clamped.
    pub fn new(value: u8) -> Self {
        Self(value.min(Self::MAX.0))
    }

    /// Wraps a raw value as received over the air, without clamping.
    pub(crate) const fn from_raw(value: u8) -> Self {
        Self(value)
    }

    /// Parse the text shown next to the slider.
    ///
    /// Surrounding whitespace is ignored. Anything that is not a non-negative decimal integer,
    /// negative numbers included, becomes zero, and large values clamp to [`SliderValue::MAX`]
    /// instead of wrapping to a byte.
    pub fn from_text(text: &str) -> Self {
        match text.trim().parse::<u32>() {
            Ok(value) => Self::new(value.min(u8::MAX as u32) as u8),
            Err(_) => Self::MIN,
        }
    }

    pub const fn get(&self) -> u8 {
        self.0
    }
}

impl Default for SliderValue {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Deref for SliderValue {
    type Target = u8;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
