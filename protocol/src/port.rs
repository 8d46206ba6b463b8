//! The boundary with the platform's Bluetooth stack.
//!
//! Radio state, retries and the advertising lifecycle belong to whatever implements
//! [`AdvertisingPort`] and [`ScanningPort`]. This crate only supplies the advertisement content
//! and interprets what comes back.
//!
//! Scan results are delivered once each, independently of one another, and with no ordering
//! guarantee between devices. [`observe`] holds no state, so it may be called from whichever
//! task or thread the platform delivers results on. Anything that keeps the latest observation
//! for display should treat it as last-writer-wins.

use crate::{
    debug,
    framing::{AdvertisementData, FramingMode},
    payload::{self, DecodeError, PayloadVariant, Value},
    scan_record::{DeviceName, ScanRecord},
};
use core::{fmt, time::Duration};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub enum AdvertiseMode {
    LowPower,
    #[default]
    Balanced,
    LowLatency,
}

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub enum TxPowerLevel {
    UltraLow,
    Low,
    #[default]
    Medium,
    High,
}

impl TxPowerLevel {
    /// Nominal transmit power, as advertised in the TX power level field.
    pub const fn dbm(&self) -> i8 {
        match self {
            Self::UltraLow => -21,
            Self::Low => -15,
            Self::Medium => -7,
            Self::High => 1,
        }
    }
}

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub enum ScanMode {
    LowPower,
    #[default]
    Balanced,
    LowLatency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub struct AdvertiseSettings {
    pub mode: AdvertiseMode,
    pub tx_power: TxPowerLevel,
    pub connectable: bool,

    /// Zero advertises until stopped.
    pub timeout_millis: u32,
}

impl Default for AdvertiseSettings {
    fn default() -> Self {
        Self {
            mode: AdvertiseMode::Balanced,
            tx_power: TxPowerLevel::Medium,
            connectable: false,
            timeout_millis: 0,
        }
    }
}

pub trait AdvertisingPort {
    type Error;

    fn start_advertising(
        &mut self,
        settings: &AdvertiseSettings,
        data: &AdvertisementData,
    ) -> Result<(), Self::Error>;

    fn stop_advertising(&mut self) -> Result<(), Self::Error>;

    /// Replace the advertisement currently being broadcast.
    fn restart_advertising(
        &mut self,
        settings: &AdvertiseSettings,
        data: &AdvertisementData,
    ) -> Result<(), Self::Error> {
        debug!("Restarting advertisement");
        self.stop_advertising()?;
        self.start_advertising(settings, data)
    }
}

#[allow(async_fn_in_trait)]
pub trait ScanningPort {
    type Error;

    fn start_scanning(&mut self, mode: ScanMode) -> Result<(), Self::Error>;

    fn stop_scanning(&mut self) -> Result<(), Self::Error>;

    /// Wait up to `timeout` for the next scan result.
    ///
    /// Each result is handed out once. `None` means nothing arrived in time or the scan is not
    /// running.
    async fn next_result(&mut self, timeout: Duration) -> Option<ScanResult>;
}

/// A Bluetooth device address, most significant byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub struct DeviceAddress(pub [u8; 6]);

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub address: DeviceAddress,
    pub rssi: i8,
    pub record: ScanRecord,
}

/// A reading recovered from one scan result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub struct Observation {
    pub address: DeviceAddress,
    pub rssi: i8,
    pub device_name: Option<DeviceName>,
    pub tx_power_level: Option<i8>,
    pub value: Value,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub enum ObserveError {
    #[error("Advertisement does not carry {0}")]
    NotOurDevice(FramingMode),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Pick the payload out of a scan result and decode it.
///
/// Results from other devices yield [`ObserveError::NotOurDevice`], which callers will normally
/// log and ignore.
pub fn observe(
    result: &ScanResult,
    mode: &FramingMode,
    variant: PayloadVariant,
) -> Result<Observation, ObserveError> {
    let data = mode
        .extract(result.record.data())
        .ok_or(ObserveError::NotOurDevice(*mode))?;

    let value = payload::decode(variant, data)?;

    Ok(Observation {
        address: result.address,
        rssi: result.rssi,
        device_name: result.record.device_name().and_then(|n| n.try_into().ok()),
        tx_power_level: result.record.tx_power_level(),
        value,
    })
}
