use crate::{
    args::{FramingArgs, VariantArgs},
    hex::HexArg,
    Runner,
};
use clap::Parser;
use log::{error, info, warn};
use thermo_beacon_protocol::{
    format::HexBytes,
    port::{observe, DeviceAddress, ObserveError, ScanResult},
    scan_record::ScanRecord,
};

#[derive(Parser)]
pub(super) struct Cli {
    /// Raw scan record as hex
    record: HexArg,

    /// Received signal strength to report, in dBm
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    rssi: i8,

    #[command(flatten)]
    variant: VariantArgs,

    #[command(flatten)]
    framing: FramingArgs,
}

impl Runner for Cli {
    async fn run(&self) -> Result<(), ()> {
        let record = ScanRecord::parse(&self.record).map_err(|e| {
            error!("Failed to parse scan record: {e}");
        })?;

        info!("Record: {}", HexBytes(record.bytes()));
        info!("Name: {}", record.device_name().unwrap_or("<none>"));
        match record.tx_power_level() {
            Some(level) => info!("TX power: {level}dBm"),
            None => info!("TX power: <none>"),
        }
        for (id, data) in record.data().manufacturer_data_entries() {
            info!("Manufacturer data 0x{id:04X}: {}", HexBytes(data));
        }
        for uuid in record.service_uuids() {
            info!("Service: {uuid}");
        }
        for (uuid, data) in record.data().service_data_entries() {
            info!("Service data {uuid}: {}", HexBytes(data));
        }

        let result = ScanResult {
            address: DeviceAddress([0; 6]),
            rssi: self.rssi,
            record,
        };

        match observe(&result, &self.framing.mode(), self.variant.variant()) {
            Ok(observation) => {
                info!("Value: {}", observation.value);
                Ok(())
            }
            Err(ObserveError::NotOurDevice(mode)) => {
                warn!("This is not the device we're looking for... (no {mode})");
                Ok(())
            }
            Err(e) => {
                error!("{e}");
                Err(())
            }
        }
    }
}
