use crate::{args::VariantArgs, hex::HexArg, Runner};
use clap::Parser;
use log::{error, info, warn};
use thermo_beacon_protocol::{format::HexBytes, payload, types::PayloadFlags};

#[derive(Parser)]
pub(super) struct Cli {
    /// Payload bytes as hex
    payload: HexArg,

    #[command(flatten)]
    variant: VariantArgs,
}

impl Runner for Cli {
    async fn run(&self) -> Result<(), ()> {
        info!("Payload: {}", HexBytes(&self.payload));

        let expected = self.variant.variant().payload_len();
        if self.payload.len() > expected {
            warn!(
                "Ignoring {} bytes past the {expected} byte payload",
                self.payload.len() - expected
            );
        }

        match payload::decode(self.variant.variant(), &self.payload) {
            Ok(value) => {
                if let payload::Value::Temperature(_) = value {
                    let flags = PayloadFlags::from_byte(self.payload[0]);
                    info!("Flags: {:#04x} ({:?})", self.payload[0], flags);
                }
                info!("Value: {value}");
                Ok(())
            }
            Err(e) => {
                error!("Failed to decode payload: {e}");
                Err(())
            }
        }
    }
}
