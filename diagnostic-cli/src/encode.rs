use crate::{
    args::{AdvertiserArgs, FramingArgs, VariantArgs},
    Runner,
};
use clap::Parser;
use log::{error, info};
use thermo_beacon_protocol::{format::HexBytes, framing::frame};

#[derive(Parser)]
pub(super) struct Cli {
    /// Value to encode, a temperature or the slider text depending on the variant
    #[arg(default_value = "20", allow_hyphen_values = true)]
    value: String,

    #[command(flatten)]
    variant: VariantArgs,

    #[command(flatten)]
    framing: FramingArgs,

    #[command(flatten)]
    advertiser: AdvertiserArgs,
}

impl Runner for Cli {
    async fn run(&self) -> Result<(), ()> {
        let packet = self.variant.encode_text(&self.value).map_err(|e| {
            error!("{e}");
        })?;
        info!("Payload: {}", HexBytes(packet.as_bytes()));

        let mode = self.framing.mode();
        let data = frame(&mode, packet.as_bytes()).map_err(|e| {
            error!("Failed to frame payload: {e}");
        })?;

        let settings = self.advertiser.settings();
        let record = data
            .to_scan_record(&self.advertiser.device_name, &settings)
            .map_err(|e| {
                error!("Failed to build advertisement: {e}");
            })?;

        info!("Framing: {mode}");
        info!(
            "Settings: mode {}, TX power {} ({} dBm), connectable {}",
            settings.mode,
            settings.tx_power,
            settings.tx_power.dbm(),
            settings.connectable
        );
        info!(
            "Advertisement ({} bytes): {}",
            record.len(),
            HexBytes(&record)
        );

        Ok(())
    }
}
