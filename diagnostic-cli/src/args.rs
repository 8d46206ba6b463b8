use crate::hex::parse_u16;
use clap::{Args, ValueEnum};
use thermo_beacon_protocol::{
    framing::{FramingMode, ServiceUuid},
    payload::{self, PayloadVariant, Value},
    port::{AdvertiseMode, AdvertiseSettings, TxPowerLevel},
    types::{SliderValue, TemperatureReading},
};
use uuid::Uuid;

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum Framing {
    /// Manufacturer specific data
    Manufacturer,
    /// Service data, also listing the service UUID
    Service,
}

#[derive(Args)]
pub(crate) struct FramingArgs {
    /// Where in the advertisement the payload is carried
    #[arg(long, value_enum, default_value_t = Framing::Manufacturer)]
    framing: Framing,

    /// Company identifier for manufacturer data
    #[arg(long, value_parser = parse_u16, default_value = "0x00E0")]
    manufacturer_id: u16,

    /// Service UUID for service data
    #[arg(long, default_value = "00001809-0000-1000-8000-00805f9b34fb")]
    service_uuid: Uuid,
}

impl FramingArgs {
    pub(crate) fn mode(&self) -> FramingMode {
        match self.framing {
            Framing::Manufacturer => FramingMode::ManufacturerData {
                manufacturer_id: self.manufacturer_id,
            },
            Framing::Service => FramingMode::ServiceData {
                service_uuid: ServiceUuid::new(self.service_uuid),
            },
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum Variant {
    /// Flags byte and little endian f32
    Measurement,
    /// Single byte slider value
    Integer,
}

impl From<Variant> for PayloadVariant {
    fn from(value: Variant) -> Self {
        match value {
            Variant::Measurement => PayloadVariant::Measurement,
            Variant::Integer => PayloadVariant::Integer,
        }
    }
}

#[derive(Args)]
pub(crate) struct VariantArgs {
    /// Payload format
    #[arg(long, value_enum, default_value_t = Variant::Measurement)]
    pub(crate) variant: Variant,
}

impl VariantArgs {
    pub(crate) fn variant(&self) -> PayloadVariant {
        self.variant.into()
    }

    /// Interpret command line text as a value of the selected payload format.
    ///
    /// Integer payloads follow the slider's rule that unparsable text is zero.
    pub(crate) fn value_from_text(&self, text: &str) -> Result<Value, String> {
        match self.variant() {
            PayloadVariant::Measurement => text
                .trim()
                .parse::<f32>()
                .map(|v| Value::Temperature(TemperatureReading::new(v)))
                .map_err(|e| format!("\"{text}\" is not a temperature: {e}")),
            PayloadVariant::Integer => Ok(Value::Slider(SliderValue::from_text(text))),
        }
    }

    pub(crate) fn encode_text(&self, text: &str) -> Result<payload::Packet, String> {
        self.value_from_text(text).map(|v| payload::encode(&v))
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum Mode {
    LowPower,
    Balanced,
    LowLatency,
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum TxPower {
    UltraLow,
    Low,
    Medium,
    High,
}

#[derive(Args)]
pub(crate) struct AdvertiserArgs {
    /// Name included in the advertisement
    #[arg(long, default_value = "Thermometer")]
    pub(crate) device_name: String,

    /// Advertising interval trade-off
    #[arg(long, value_enum, default_value_t = Mode::Balanced)]
    mode: Mode,

    /// Transmit power
    #[arg(long, value_enum, default_value_t = TxPower::Medium)]
    tx_power: TxPower,

    /// Advertise as connectable, which adds the flags structure
    #[arg(long)]
    connectable: bool,
}

impl AdvertiserArgs {
    pub(crate) fn settings(&self) -> AdvertiseSettings {
        AdvertiseSettings {
            mode: match self.mode {
                Mode::LowPower => AdvertiseMode::LowPower,
                Mode::Balanced => AdvertiseMode::Balanced,
                Mode::LowLatency => AdvertiseMode::LowLatency,
            },
            tx_power: match self.tx_power {
                TxPower::UltraLow => TxPowerLevel::UltraLow,
                TxPower::Low => TxPowerLevel::Low,
                TxPower::Medium => TxPowerLevel::Medium,
                TxPower::High => TxPowerLevel::High,
            },
            connectable: self.connectable,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::Parser;
    use thermo_beacon_protocol::framing::HEALTH_THERMOMETER_SERVICE;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        framing: FramingArgs,

        #[command(flatten)]
        variant: VariantArgs,

        #[command(flatten)]
        advertiser: AdvertiserArgs,
    }

    #[test]
    fn defaults() {
        let cli = TestCli::parse_from(["test"]);
        assert_eq!(cli.framing.mode(), FramingMode::default());
        assert_eq!(cli.variant.variant(), PayloadVariant::Measurement);
        assert_eq!(cli.advertiser.settings(), AdvertiseSettings::default());
        assert_eq!(cli.advertiser.device_name, "Thermometer");
    }

    #[test]
    fn service_framing_defaults_to_health_thermometer() {
        let cli = TestCli::parse_from(["test", "--framing", "service"]);
        assert_eq!(
            cli.framing.mode(),
            FramingMode::ServiceData {
                service_uuid: HEALTH_THERMOMETER_SERVICE
            }
        );
    }

    #[test]
    fn custom_manufacturer() {
        let cli = TestCli::parse_from(["test", "--manufacturer-id", "0x004C"]);
        assert_eq!(
            cli.framing.mode(),
            FramingMode::ManufacturerData {
                manufacturer_id: 0x004C
            }
        );
    }

    #[test]
    fn advertiser_settings() {
        let cli = TestCli::parse_from(["test", "--tx-power", "high", "--connectable"]);
        let settings = cli.advertiser.settings();
        assert_eq!(settings.tx_power, TxPowerLevel::High);
        assert!(settings.connectable);
    }

    #[test]
    fn value_text() {
        let cli = TestCli::parse_from(["test"]);
        assert_eq!(
            cli.variant.encode_text("20").unwrap().as_bytes(),
            &[0x80, 0x00, 0x00, 0xA0, 0x41]
        );
        assert!(cli.variant.encode_text("warm").is_err());

        let cli = TestCli::parse_from(["test", "--variant", "integer"]);
        assert_eq!(cli.variant.encode_text("20").unwrap().as_bytes(), &[20, 0]);
        assert_eq!(cli.variant.encode_text("warm").unwrap().as_bytes(), &[0, 0]);
    }
}
