//! Raw advertisement bytes, as a sequence of AD structures.
//!
//! Each structure is `[length][type][data; length - 1]`. A zero length byte ends the record,
//! which is how the unused tail of a fixed size scan record buffer is padded.

use crate::{
    framing::{AdvertisementData, FrameError, ServiceUuid},
    port::AdvertiseSettings,
    trace, warn, AdvertisementBytes, MAX_ADVERTISEMENT_LEN,
};
use serde::{Deserialize, Serialize};

/// Advertising data plus scan response data.
pub const MAX_SCAN_RECORD_LEN: usize = 2 * MAX_ADVERTISEMENT_LEN;

pub type ScanRecordBytes = heapless::Vec<u8, MAX_SCAN_RECORD_LEN>;

pub type DeviceName = heapless::String<{ MAX_SCAN_RECORD_LEN - 2 }>;

/// "LE General Discoverable Mode" and "BR/EDR Not Supported".
pub const DEFAULT_FLAGS: u8 = 0x06;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub struct AdType(u8);

impl AdType {
    pub const FLAGS: AdType = AdType(0x01);
    pub const INCOMPLETE_16_SERVICE_LIST: AdType = AdType(0x02);
    pub const COMPLETE_16_SERVICE_LIST: AdType = AdType(0x03);
    pub const INCOMPLETE_32_SERVICE_LIST: AdType = AdType(0x04);
    pub const COMPLETE_32_SERVICE_LIST: AdType = AdType(0x05);
    pub const INCOMPLETE_128_SERVICE_LIST: AdType = AdType(0x06);
    pub const COMPLETE_128_SERVICE_LIST: AdType = AdType(0x07);
    pub const SHORT_NAME: AdType = AdType(0x08);
    pub const FULL_NAME: AdType = AdType(0x09);
    pub const TX_POWER_LEVEL: AdType = AdType(0x0a);
    pub const SERVICE_DATA_16: AdType = AdType(0x16);
    pub const SERVICE_DATA_32: AdType = AdType(0x20);
    pub const SERVICE_DATA_128: AdType = AdType(0x21);
    pub const MANUFACTURER_SPECIFIC_DATA: AdType = AdType(0xff);

    pub const fn to_u8(self) -> u8 {
        self.0
    }
}

impl From<u8> for AdType {
    fn from(value: u8) -> Self {
        AdType(value)
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub enum ScanRecordError {
    #[error("Scan record of {len} bytes exceeds {max} bytes")]
    TooLong { len: usize, max: usize },

    #[error("AD structure at offset {offset} runs past the end of the record")]
    Truncated { offset: usize },

    #[error("AD structure of type {ad_type:#04x} has an invalid length")]
    Malformed { ad_type: u8 },
}

struct AdWriter {
    buf: AdvertisementBytes,
}

impl AdWriter {
    fn new() -> Self {
        Self {
            buf: AdvertisementBytes::new(),
        }
    }

    fn write(&mut self, ad_type: AdType, parts: &[&[u8]]) -> Result<(), FrameError> {
        let too_large = FrameError::TooLarge {
            max: MAX_ADVERTISEMENT_LEN,
        };

        let len = 1 + parts.iter().map(|p| p.len()).sum::<usize>();
        if len >= MAX_ADVERTISEMENT_LEN {
            return Err(too_large);
        }

        self.buf.push(len as u8).map_err(|_| too_large)?;
        self.buf.push(ad_type.to_u8()).map_err(|_| too_large)?;
        for part in parts {
            self.buf.extend_from_slice(part).map_err(|_| too_large)?;
        }

        Ok(())
    }
}

impl AdvertisementData {
    /// Serialise into the bytes of a legacy advertisement.
    ///
    /// Service UUIDs that are aliases of the Bluetooth base UUID are written in their 16 bit form.
    /// The flags structure is only present for connectable advertisements.
    pub fn to_scan_record(
        &self,
        device_name: &str,
        settings: &AdvertiseSettings,
    ) -> Result<AdvertisementBytes, FrameError> {
        let mut w = AdWriter::new();

        if settings.connectable {
            w.write(AdType::FLAGS, &[&[DEFAULT_FLAGS]])?;
        }

        if self.include_device_name {
            w.write(AdType::FULL_NAME, &[device_name.as_bytes()])?;
        }

        let mut short_uuids = heapless::Vec::<u8, MAX_ADVERTISEMENT_LEN>::new();
        let mut long_uuids = heapless::Vec::<u8, MAX_ADVERTISEMENT_LEN>::new();
        for uuid in self.service_uuids() {
            let result = match uuid.as_u16() {
                Some(short) => short_uuids.extend_from_slice(&short.to_le_bytes()),
                None => long_uuids.extend_from_slice(&uuid.to_le_bytes()),
            };
            result.map_err(|_| FrameError::TooLarge {
                max: MAX_ADVERTISEMENT_LEN,
            })?;
        }
        if !short_uuids.is_empty() {
            w.write(AdType::COMPLETE_16_SERVICE_LIST, &[&short_uuids])?;
        }
        if !long_uuids.is_empty() {
            w.write(AdType::COMPLETE_128_SERVICE_LIST, &[&long_uuids])?;
        }

        for (uuid, data) in self.service_data_entries() {
            match uuid.as_u16() {
                Some(short) => w.write(AdType::SERVICE_DATA_16, &[&short.to_le_bytes(), data])?,
                None => w.write(AdType::SERVICE_DATA_128, &[&uuid.to_le_bytes(), data])?,
            }
        }

        for (manufacturer_id, data) in self.manufacturer_data_entries() {
            w.write(
                AdType::MANUFACTURER_SPECIFIC_DATA,
                &[&manufacturer_id.to_le_bytes(), data],
            )?;
        }

        if self.include_tx_power_level {
            w.write(
                AdType::TX_POWER_LEVEL,
                &[&settings.tx_power.dbm().to_le_bytes()],
            )?;
        }

        Ok(w.buf)
    }
}

/// A received advertisement, split into its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    bytes: ScanRecordBytes,
    flags: Option<u8>,
    device_name: Option<DeviceName>,
    tx_power_level: Option<i8>,
    data: AdvertisementData,
}

impl ScanRecord {
    /// Parse the AD structures in `raw`.
    ///
    /// Unknown AD types are skipped. Fields that do not fit in [`AdvertisementData`] are dropped
    /// with a warning rather than failing the whole record.
    pub fn parse(raw: &[u8]) -> Result<Self, ScanRecordError> {
        let bytes = ScanRecordBytes::from_slice(raw).map_err(|_| ScanRecordError::TooLong {
            len: raw.len(),
            max: MAX_SCAN_RECORD_LEN,
        })?;

        let mut record = Self {
            bytes,
            flags: None,
            device_name: None,
            tx_power_level: None,
            data: AdvertisementData::default(),
        };

        let mut offset = 0;
        while offset < raw.len() {
            let len = raw[offset] as usize;
            if len == 0 {
                break;
            }

            let end = offset + 1 + len;
            if end > raw.len() {
                warn!("Truncated AD structure at offset {}", offset);
                return Err(ScanRecordError::Truncated { offset });
            }

            let ad_type = raw[offset + 1];
            record.apply(ad_type, &raw[offset + 2..end])?;

            offset = end;
        }

        Ok(record)
    }

    fn apply(&mut self, ad_type: u8, body: &[u8]) -> Result<(), ScanRecordError> {
        let malformed = ScanRecordError::Malformed { ad_type };

        let result = match AdType::from(ad_type) {
            AdType::FLAGS => {
                self.flags = Some(*body.first().ok_or(malformed)?);
                Ok(())
            }
            AdType::INCOMPLETE_16_SERVICE_LIST | AdType::COMPLETE_16_SERVICE_LIST => {
                let chunks = exact_chunks::<2>(body).ok_or(malformed)?;
                self.add_service_uuids(chunks.map(|c| ServiceUuid::from_u16(u16::from_le_bytes(c))))
            }
            AdType::INCOMPLETE_32_SERVICE_LIST | AdType::COMPLETE_32_SERVICE_LIST => {
                let chunks = exact_chunks::<4>(body).ok_or(malformed)?;
                self.add_service_uuids(chunks.map(|c| ServiceUuid::from_u32(u32::from_le_bytes(c))))
            }
            AdType::INCOMPLETE_128_SERVICE_LIST | AdType::COMPLETE_128_SERVICE_LIST => {
                let chunks = exact_chunks::<16>(body).ok_or(malformed)?;
                self.add_service_uuids(chunks.map(ServiceUuid::from_le_bytes))
            }
            AdType::SHORT_NAME | AdType::FULL_NAME => {
                match core::str::from_utf8(body)
                    .ok()
                    .and_then(|name| DeviceName::try_from(name).ok())
                {
                    Some(name) => self.device_name = Some(name),
                    None => warn!("Ignoring device name that is not valid UTF-8"),
                }
                Ok(())
            }
            AdType::TX_POWER_LEVEL => {
                let [level] = body else {
                    return Err(malformed);
                };
                self.tx_power_level = Some(*level as i8);
                Ok(())
            }
            AdType::SERVICE_DATA_16 => {
                let (uuid, data) = split_key::<2>(body).ok_or(malformed)?;
                let uuid = ServiceUuid::from_u16(u16::from_le_bytes(uuid));
                self.data.add_service_data(uuid, data)
            }
            AdType::SERVICE_DATA_32 => {
                let (uuid, data) = split_key::<4>(body).ok_or(malformed)?;
                let uuid = ServiceUuid::from_u32(u32::from_le_bytes(uuid));
                self.data.add_service_data(uuid, data)
            }
            AdType::SERVICE_DATA_128 => {
                let (uuid, data) = split_key::<16>(body).ok_or(malformed)?;
                self.data
                    .add_service_data(ServiceUuid::from_le_bytes(uuid), data)
            }
            AdType::MANUFACTURER_SPECIFIC_DATA => {
                let (id, data) = split_key::<2>(body).ok_or(malformed)?;
                self.data
                    .add_manufacturer_data(u16::from_le_bytes(id), data)
            }
            _ => {
                trace!("Skipping AD type {}", ad_type);
                Ok(())
            }
        };

        if result.is_err() {
            warn!("Dropping AD structure of type {} that does not fit", ad_type);
        }

        Ok(())
    }

    fn add_service_uuids(
        &mut self,
        uuids: impl Iterator<Item = ServiceUuid>,
    ) -> Result<(), FrameError> {
        for uuid in uuids {
            self.data.add_service_uuid(uuid)?;
        }
        Ok(())
    }

    /// The record exactly as received.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn flags(&self) -> Option<u8> {
        self.flags
    }

    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }

    pub fn tx_power_level(&self) -> Option<i8> {
        self.tx_power_level
    }

    pub fn data(&self) -> &AdvertisementData {
        &self.data
    }

    pub fn manufacturer_data(&self, manufacturer_id: u16) -> Option<&[u8]> {
        self.data.manufacturer_data(manufacturer_id)
    }

    pub fn service_data(&self, uuid: &ServiceUuid) -> Option<&[u8]> {
        self.data.service_data(uuid)
    }

    pub fn service_uuids(&self) -> &[ServiceUuid] {
        self.data.service_uuids()
    }
}

/// Split `body` into `N` byte chunks, failing if it is not a whole number of them.
fn exact_chunks<const N: usize>(body: &[u8]) -> Option<impl Iterator<Item = [u8; N]> + '_> {
    if body.len() % N != 0 {
        return None;
    }
    Some(
        body.chunks_exact(N)
            .filter_map(|chunk| <[u8; N]>::try_from(chunk).ok()),
    )
}

/// Split an `N` byte key off the front of `body`.
fn split_key<const N: usize>(body: &[u8]) -> Option<([u8; N], &[u8])> {
    if body.len() < N {
        return None;
    }
    let (key, rest) = body.split_at(N);
    Some((key.try_into().ok()?, rest))
}
