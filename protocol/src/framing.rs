//! Placement of a payload within an advertisement.

use crate::AdvertisementBytes;
use core::fmt;
use heapless::{LinearMap, Vec};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Google's Bluetooth SIG company identifier.
pub const MANUFACTURER_GOOGLE: u16 = 0x00E0;

/// The Health Thermometer Service, `00001809-0000-1000-8000-00805f9b34fb`.
pub const HEALTH_THERMOMETER_SERVICE: ServiceUuid = ServiceUuid::from_u16(0x1809);

/// `00000000-0000-1000-8000-00805f9b34fb`, which 16 and 32 bit UUIDs are aliases within.
pub const BLUETOOTH_BASE_UUID: ServiceUuid =
    ServiceUuid(Uuid::from_u128(0x00000000_0000_1000_8000_00805f9b34fb));

const SHORT_UUID_SHIFT: u32 = 96;

/// Maximum number of distinct keys of each kind held in one advertisement.
pub const MAX_ENTRIES: usize = 4;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub enum FrameError {
    #[error("Advertisement data exceeds {max} bytes")]
    TooLarge { max: usize },

    #[error("Too many entries of one kind in the advertisement")]
    TooManyEntries,
}

/// A GATT service UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceUuid(Uuid);

impl ServiceUuid {
    pub const fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Expand a 16 bit assigned number onto the Bluetooth base UUID.
    pub const fn from_u16(short: u16) -> Self {
        Self::from_u32(short as u32)
    }

    /// Expand a 32 bit assigned number onto the Bluetooth base UUID.
    pub const fn from_u32(short: u32) -> Self {
        Self(Uuid::from_u128(
            BLUETOOTH_BASE_UUID.0.as_u128() | ((short as u128) << SHORT_UUID_SHIFT),
        ))
    }

    /// The 16 bit form of this UUID, if it has one.
    pub fn as_u16(&self) -> Option<u16> {
        let value = self.0.as_u128();
        let alias_mask = 0xFFFF_u128 << SHORT_UUID_SHIFT;
        if value & !alias_mask == BLUETOOTH_BASE_UUID.0.as_u128() {
            Some((value >> SHORT_UUID_SHIFT) as u16)
        } else {
            None
        }
    }

    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// The 128 bit form in the little endian byte order used on air.
    pub fn to_le_bytes(&self) -> [u8; 16] {
        self.0.as_u128().to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_u128(u128::from_le_bytes(bytes)))
    }
}

impl From<Uuid> for ServiceUuid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for ServiceUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(feature = "no-std")]
impl defmt::Format for ServiceUuid {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=u128:#x}", self.0.as_u128())
    }
}

/// Where in an advertisement the payload is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub enum FramingMode {
    /// Manufacturer specific data under a company identifier.
    ManufacturerData { manufacturer_id: u16 },

    /// Service data keyed by a service UUID, with the UUID also listed as a service.
    ServiceData { service_uuid: ServiceUuid },
}

impl FramingMode {
    pub const fn health_thermometer() -> Self {
        Self::ServiceData {
            service_uuid: HEALTH_THERMOMETER_SERVICE,
        }
    }

    /// Find the payload this framing mode would have placed in `data`.
    pub fn extract<'a>(&self, data: &'a AdvertisementData) -> Option<&'a [u8]> {
        match self {
            Self::ManufacturerData { manufacturer_id } => data.manufacturer_data(*manufacturer_id),
            Self::ServiceData { service_uuid } => data.service_data(service_uuid),
        }
    }
}

impl Default for FramingMode {
    fn default() -> Self {
        Self::ManufacturerData {
            manufacturer_id: MANUFACTURER_GOOGLE,
        }
    }
}

impl fmt::Display for FramingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ManufacturerData { manufacturer_id } => {
                write!(f, "manufacturer data 0x{manufacturer_id:04X}")
            }
            Self::ServiceData { service_uuid } => write!(f, "service data {service_uuid}"),
        }
    }
}

/// The content of an advertisement, prior to serialisation into AD structures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertisementData {
    pub include_device_name: bool,
    pub include_tx_power_level: bool,
    manufacturer_data: LinearMap<u16, AdvertisementBytes, MAX_ENTRIES>,
    service_uuids: Vec<ServiceUuid, MAX_ENTRIES>,
    service_data: LinearMap<ServiceUuid, AdvertisementBytes, MAX_ENTRIES>,
}

impl Default for AdvertisementData {
    fn default() -> Self {
        Self {
            include_device_name: false,
            include_tx_power_level: false,
            manufacturer_data: LinearMap::new(),
            service_uuids: Vec::new(),
            service_data: LinearMap::new(),
        }
    }
}

impl AdvertisementData {
    /// Set the manufacturer data for `manufacturer_id`, replacing any previous entry.
    pub fn add_manufacturer_data(
        &mut self,
        manufacturer_id: u16,
        data: &[u8],
    ) -> Result<(), FrameError> {
        let data = to_field(data)?;
        self.manufacturer_data
            .insert(manufacturer_id, data)
            .map_err(|_| FrameError::TooManyEntries)?;
        Ok(())
    }

    /// List `uuid` as a service offered by the advertiser. Adding a UUID twice has no effect.
    pub fn add_service_uuid(&mut self, uuid: ServiceUuid) -> Result<(), FrameError> {
        if self.service_uuids.contains(&uuid) {
            return Ok(());
        }
        self.service_uuids
            .push(uuid)
            .map_err(|_| FrameError::TooManyEntries)
    }

    /// Set the service data for `uuid`, replacing any previous entry.
    pub fn add_service_data(&mut self, uuid: ServiceUuid, data: &[u8]) -> Result<(), FrameError> {
        let data = to_field(data)?;
        self.service_data
            .insert(uuid, data)
            .map_err(|_| FrameError::TooManyEntries)?;
        Ok(())
    }

    pub fn manufacturer_data(&self, manufacturer_id: u16) -> Option<&[u8]> {
        self.manufacturer_data
            .get(&manufacturer_id)
            .map(|d| d.as_slice())
    }

    pub fn has_manufacturer_data(&self, manufacturer_id: u16) -> bool {
        self.manufacturer_data.contains_key(&manufacturer_id)
    }

    pub fn manufacturer_data_entries(&self) -> impl Iterator<Item = (u16, &[u8])> {
        self.manufacturer_data
            .iter()
            .map(|(id, data)| (*id, data.as_slice()))
    }

    pub fn service_uuids(&self) -> &[ServiceUuid] {
        &self.service_uuids
    }

    pub fn service_data(&self, uuid: &ServiceUuid) -> Option<&[u8]> {
        self.service_data.get(uuid).map(|d| d.as_slice())
    }

    pub fn has_service_data(&self, uuid: &ServiceUuid) -> bool {
        self.service_data.contains_key(uuid)
    }

    pub fn service_data_entries(&self) -> impl Iterator<Item = (&ServiceUuid, &[u8])> {
        self.service_data
            .iter()
            .map(|(uuid, data)| (uuid, data.as_slice()))
    }
}

fn to_field(data: &[u8]) -> Result<AdvertisementBytes, FrameError> {
    AdvertisementBytes::from_slice(data).map_err(|_| FrameError::TooLarge {
        max: crate::MAX_ADVERTISEMENT_LEN,
    })
}

/// Build the advertisement carrying `payload` under `mode`.
///
/// The device name and TX power level are included, as a scanner needs the former to show a
/// friendly name and the latter for proximity estimates.
pub fn frame(mode: &FramingMode, payload: &[u8]) -> Result<AdvertisementData, FrameError> {
    let mut data = AdvertisementData {
        include_device_name: true,
        include_tx_power_level: true,
        ..Default::default()
    };

    match mode {
        FramingMode::ManufacturerData { manufacturer_id } => {
            data.add_manufacturer_data(*manufacturer_id, payload)?;
        }
        FramingMode::ServiceData { service_uuid } => {
            data.add_service_uuid(*service_uuid)?;
            data.add_service_data(*service_uuid, payload)?;
        }
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{payload::measurement, types::TemperatureReading};

    #[test]
    fn health_thermometer_uuid() {
        assert_eq!(
            HEALTH_THERMOMETER_SERVICE.as_uuid(),
            &Uuid::from_u128(0x00001809_0000_1000_8000_00805f9b34fb)
        );
        assert_eq!(HEALTH_THERMOMETER_SERVICE.as_u16(), Some(0x1809));
    }

    #[test]
    fn non_base_uuid_has_no_short_form() {
        let uuid = ServiceUuid::new(Uuid::from_u128(0xdf21fe2c_2515_4fdb_8886_f12c4d67927c));
        assert_eq!(uuid.as_u16(), None);
        assert_eq!(ServiceUuid::from_u32(0x0001_1809).as_u16(), None);
    }

    #[test]
    fn uuid_le_bytes() {
        let bytes = HEALTH_THERMOMETER_SERVICE.to_le_bytes();
        assert_eq!(bytes[0], 0xFB);
        assert_eq!(&bytes[12..], &[0x09, 0x18, 0x00, 0x00]);
        assert_eq!(ServiceUuid::from_le_bytes(bytes), HEALTH_THERMOMETER_SERVICE);
    }

    #[test]
    fn default_framing_is_google_manufacturer_data() {
        assert_eq!(
            FramingMode::default(),
            FramingMode::ManufacturerData {
                manufacturer_id: 0x00E0
            }
        );
    }

    #[test]
    fn frame_manufacturer_data() {
        let packet = measurement::encode(TemperatureReading::new(20.0));
        let data = frame(&FramingMode::default(), packet.as_bytes()).unwrap();

        assert!(data.include_device_name);
        assert!(data.include_tx_power_level);
        assert!(data.has_manufacturer_data(MANUFACTURER_GOOGLE));
        assert_eq!(
            data.manufacturer_data(MANUFACTURER_GOOGLE),
            Some(&[0x80, 0x00, 0x00, 0xA0, 0x41][..])
        );
        assert_eq!(data.manufacturer_data_entries().count(), 1);
        assert!(data.service_uuids().is_empty());
        assert_eq!(data.service_data_entries().count(), 0);
    }

    #[test]
    fn frame_service_data_lists_uuid_and_data() {
        let packet = measurement::encode(TemperatureReading::new(20.0));
        let mode = FramingMode::health_thermometer();
        let data = frame(&mode, packet.as_bytes()).unwrap();

        assert_eq!(data.service_uuids(), &[HEALTH_THERMOMETER_SERVICE]);
        assert!(data.has_service_data(&HEALTH_THERMOMETER_SERVICE));

        let (keyed_by, payload) = data.service_data_entries().next().unwrap();
        assert_eq!(keyed_by, &data.service_uuids()[0]);
        assert_eq!(payload, packet.as_bytes());

        assert_eq!(data.manufacturer_data_entries().count(), 0);
        assert_eq!(mode.extract(&data), Some(packet.as_bytes()));
    }

    #[test]
    fn extract_with_wrong_key() {
        let data = frame(&FramingMode::default(), &[20, 0]).unwrap();
        assert_eq!(FramingMode::health_thermometer().extract(&data), None);
        assert_eq!(
            FramingMode::ManufacturerData {
                manufacturer_id: 0x004C
            }
            .extract(&data),
            None
        );
    }

    #[test]
    fn replacing_entries() {
        let mut data = AdvertisementData::default();
        data.add_manufacturer_data(MANUFACTURER_GOOGLE, &[1]).unwrap();
        data.add_manufacturer_data(MANUFACTURER_GOOGLE, &[2]).unwrap();
        assert_eq!(data.manufacturer_data(MANUFACTURER_GOOGLE), Some(&[2][..]));

        data.add_service_uuid(HEALTH_THERMOMETER_SERVICE).unwrap();
        data.add_service_uuid(HEALTH_THERMOMETER_SERVICE).unwrap();
        assert_eq!(data.service_uuids().len(), 1);
    }

    #[test]
    fn too_many_entries() {
        let mut data = AdvertisementData::default();
        for id in 0..MAX_ENTRIES as u16 {
            data.add_manufacturer_data(id, &[0]).unwrap();
        }
        assert_eq!(
            data.add_manufacturer_data(0xFFFF, &[0]),
            Err(FrameError::TooManyEntries)
        );
    }

    #[test]
    fn oversize_payload() {
        let payload = [0u8; 32];
        assert_eq!(
            frame(&FramingMode::default(), &payload),
            Err(FrameError::TooLarge { max: 31 })
        );
    }
}
