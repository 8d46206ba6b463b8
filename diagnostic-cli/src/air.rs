//! An in-process stand-in for the radio, connecting advertisers to scanners over a tokio
//! broadcast channel.

use log::{debug, trace, warn};
use std::time::Duration;
use thermo_beacon_protocol::{
    framing::{AdvertisementData, FrameError},
    port::{
        AdvertiseSettings, AdvertisingPort, DeviceAddress, ScanMode, ScanResult, ScanningPort,
    },
    scan_record::ScanRecord,
    AdvertisementBytes,
};
use tokio::sync::broadcast::{self, error::RecvError, Receiver, Sender};

/// Signal strength reported for every loopback reception.
pub(crate) const LOOPBACK_RSSI: i8 = -42;

#[derive(Debug, Clone)]
struct Transmission {
    address: DeviceAddress,
    record: AdvertisementBytes,
}

#[derive(Clone)]
pub(crate) struct Air {
    tx: Sender<Transmission>,
}

impl Air {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }
}

pub(crate) struct LoopbackAdvertiser {
    address: DeviceAddress,
    device_name: String,
    air: Air,
    current: Option<AdvertisementBytes>,
}

impl LoopbackAdvertiser {
    pub(crate) fn new(address: DeviceAddress, device_name: &str, air: Air) -> Self {
        Self {
            address,
            device_name: device_name.to_string(),
            air,
            current: None,
        }
    }

    /// Send one advertising event. Returns the number of scanners that will see it.
    pub(crate) fn transmit(&self) -> usize {
        match &self.current {
            Some(record) => {
                trace!("Transmitting {} byte advertisement", record.len());
                self.air
                    .tx
                    .send(Transmission {
                        address: self.address,
                        record: record.clone(),
                    })
                    .unwrap_or(0)
            }
            None => 0,
        }
    }
}

impl AdvertisingPort for LoopbackAdvertiser {
    type Error = FrameError;

    fn start_advertising(
        &mut self,
        settings: &AdvertiseSettings,
        data: &AdvertisementData,
    ) -> Result<(), Self::Error> {
        let record = data.to_scan_record(&self.device_name, settings)?;
        debug!(
            "LE advertise started ({}, TX power {})",
            settings.mode, settings.tx_power
        );
        self.current = Some(record);
        Ok(())
    }

    fn stop_advertising(&mut self) -> Result<(), Self::Error> {
        debug!("LE advertise stopped");
        self.current = None;
        Ok(())
    }
}

pub(crate) struct LoopbackScanner {
    air: Air,
    rx: Option<Receiver<Transmission>>,
}

impl LoopbackScanner {
    pub(crate) fn new(air: Air) -> Self {
        Self { air, rx: None }
    }
}

impl ScanningPort for LoopbackScanner {
    type Error = ();

    fn start_scanning(&mut self, mode: ScanMode) -> Result<(), Self::Error> {
        debug!("LE scan started ({mode})");
        self.rx = Some(self.air.tx.subscribe());
        Ok(())
    }

    fn stop_scanning(&mut self) -> Result<(), Self::Error> {
        debug!("LE scan stopped");
        self.rx = None;
        Ok(())
    }

    /// Records that fail to parse are logged and skipped.
    async fn next_result(&mut self, timeout: Duration) -> Option<ScanResult> {
        let rx = self.rx.as_mut()?;

        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Ok(transmission)) => match ScanRecord::parse(&transmission.record) {
                    Ok(record) => {
                        return Some(ScanResult {
                            address: transmission.address,
                            rssi: LOOPBACK_RSSI,
                            record,
                        })
                    }
                    Err(e) => warn!("Error scanning devices: {e}"),
                },
                Ok(Err(RecvError::Lagged(count))) => {
                    warn!("Missed {count} advertisements");
                }
                Ok(Err(RecvError::Closed)) => {
                    warn!("Air closed");
                    return None;
                }
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use thermo_beacon_protocol::{
        framing::{frame, FramingMode},
        payload::{measurement, PayloadVariant, Value},
        port::observe,
        types::TemperatureReading,
    };

    const ADDRESS: DeviceAddress = DeviceAddress([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    const TIMEOUT: Duration = Duration::from_millis(100);

    fn advertisement(value: f32) -> AdvertisementData {
        let packet = measurement::encode(TemperatureReading::new(value));
        frame(&FramingMode::default(), packet.as_bytes()).unwrap()
    }

    #[tokio::test]
    async fn advertise_and_scan() {
        let air = Air::new(8);
        let mut advertiser = LoopbackAdvertiser::new(ADDRESS, "Thermometer", air.clone());
        let mut scanner = LoopbackScanner::new(air);

        scanner.start_scanning(ScanMode::Balanced).unwrap();
        advertiser
            .start_advertising(&AdvertiseSettings::default(), &advertisement(20.0))
            .unwrap();
        assert_eq!(advertiser.transmit(), 1);

        let result = scanner.next_result(TIMEOUT).await.unwrap();
        assert_eq!(result.address, ADDRESS);
        assert_eq!(result.rssi, LOOPBACK_RSSI);
        assert_eq!(result.record.device_name(), Some("Thermometer"));

        let observation =
            observe(&result, &FramingMode::default(), PayloadVariant::Measurement).unwrap();
        assert_eq!(
            observation.value,
            Value::Temperature(TemperatureReading::new(20.0))
        );
    }

    #[tokio::test]
    async fn restart_replaces_advertisement() {
        let air = Air::new(8);
        let mut advertiser = LoopbackAdvertiser::new(ADDRESS, "Thermometer", air.clone());
        let mut scanner = LoopbackScanner::new(air);
        let settings = AdvertiseSettings::default();

        scanner.start_scanning(ScanMode::Balanced).unwrap();
        advertiser
            .start_advertising(&settings, &advertisement(20.0))
            .unwrap();
        advertiser
            .restart_advertising(&settings, &advertisement(21.5))
            .unwrap();
        advertiser.transmit();

        let result = scanner.next_result(TIMEOUT).await.unwrap();
        let observation =
            observe(&result, &FramingMode::default(), PayloadVariant::Measurement).unwrap();
        assert_eq!(
            observation.value,
            Value::Temperature(TemperatureReading::new(21.5))
        );
    }

    #[tokio::test]
    async fn stopped_advertiser_is_silent() {
        let air = Air::new(8);
        let mut advertiser = LoopbackAdvertiser::new(ADDRESS, "Thermometer", air.clone());
        let mut scanner = LoopbackScanner::new(air);

        scanner.start_scanning(ScanMode::Balanced).unwrap();
        advertiser
            .start_advertising(&AdvertiseSettings::default(), &advertisement(20.0))
            .unwrap();
        advertiser.stop_advertising().unwrap();

        assert_eq!(advertiser.transmit(), 0);
        assert!(scanner.next_result(TIMEOUT).await.is_none());
    }

    #[tokio::test]
    async fn scanner_not_started() {
        let air = Air::new(8);
        let mut advertiser = LoopbackAdvertiser::new(ADDRESS, "Thermometer", air.clone());
        let mut scanner = LoopbackScanner::new(air);

        advertiser
            .start_advertising(&AdvertiseSettings::default(), &advertisement(20.0))
            .unwrap();
        assert_eq!(advertiser.transmit(), 0);
        assert!(scanner.next_result(TIMEOUT).await.is_none());

        scanner.start_scanning(ScanMode::LowLatency).unwrap();
        scanner.stop_scanning().unwrap();
        assert!(scanner.next_result(TIMEOUT).await.is_none());
    }

    #[tokio::test]
    async fn oversize_advertisement_is_rejected() {
        let air = Air::new(8);
        let mut advertiser = LoopbackAdvertiser::new(
            ADDRESS,
            "A device name far too long to advertise",
            air,
        );

        assert_eq!(
            advertiser.start_advertising(&AdvertiseSettings::default(), &advertisement(20.0)),
            Err(FrameError::TooLarge { max: 31 })
        );
        assert_eq!(advertiser.transmit(), 0);
    }
}
