use crate::{
    air::{Air, LoopbackAdvertiser, LoopbackScanner},
    args::{AdvertiserArgs, FramingArgs, VariantArgs},
    Runner,
};
use chrono::{DateTime, Utc};
use clap::Parser;
use log::{error, info, warn};
use std::time::Duration;
use thermo_beacon_protocol::{
    format::HexBytes,
    framing::{frame, FramingMode},
    payload::{self, PayloadVariant, Value},
    port::{
        observe, AdvertiseSettings, AdvertisingPort, DeviceAddress, ObserveError, ScanMode,
        ScanningPort,
    },
    types::{SliderValue, TemperatureReading},
};

const ADVERTISER_ADDRESS: DeviceAddress = DeviceAddress([0xC0, 0xFF, 0xEE, 0x00, 0x18, 0x09]);

#[derive(Parser)]
pub(super) struct Cli {
    /// First value to advertise
    #[arg(long, default_value_t = 20.0, allow_hyphen_values = true)]
    start: f32,

    /// Change applied to the value before each update
    #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
    step: f32,

    /// Number of values to advertise
    #[arg(long, default_value_t = 5)]
    count: usize,

    /// Time between updates in milliseconds
    #[arg(long, default_value_t = 250, value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    #[command(flatten)]
    variant: VariantArgs,

    #[command(flatten)]
    framing: FramingArgs,

    #[command(flatten)]
    advertiser: AdvertiserArgs,
}

/// The most recently displayed reading. Whichever result arrives last wins.
#[derive(Debug)]
struct LatestReading {
    address: DeviceAddress,
    value: Value,
    updated: DateTime<Utc>,
}

impl Runner for Cli {
    async fn run(&self) -> Result<(), ()> {
        let interval = Duration::from_millis(self.interval);
        let plan = values(self.start, self.step, self.count, self.variant.variant());

        let air = Air::new(self.count.max(1));
        let mut advertiser =
            LoopbackAdvertiser::new(ADVERTISER_ADDRESS, &self.advertiser.device_name, air.clone());
        let mut scanner = LoopbackScanner::new(air);

        let mode = self.framing.mode();
        let variant = self.variant.variant();
        let settings = self.advertiser.settings();

        scanner.start_scanning(ScanMode::Balanced)?;

        let advertising = advertise(&mut advertiser, &mode, &settings, &plan, interval);
        let scanning = scan(&mut scanner, &mode, variant, plan.len(), interval * 4);

        let (advertised, latest) = tokio::join!(advertising, scanning);

        scanner.stop_scanning()?;

        match latest {
            Some(latest) => info!(
                "Last reading {} from {} at {}",
                latest.value, latest.address, latest.updated
            ),
            None => warn!("No readings received"),
        }

        advertised
    }
}

fn values(start: f32, step: f32, count: usize, variant: PayloadVariant) -> Vec<Value> {
    (0..count)
        .map(|i| {
            let v = start + step * i as f32;
            match variant {
                PayloadVariant::Measurement => Value::Temperature(TemperatureReading::new(v)),
                PayloadVariant::Integer => {
                    Value::Slider(SliderValue::new(v.round().clamp(0.0, 255.0) as u8))
                }
            }
        })
        .collect()
}

async fn advertise(
    advertiser: &mut LoopbackAdvertiser,
    mode: &FramingMode,
    settings: &AdvertiseSettings,
    plan: &[Value],
    interval: Duration,
) -> Result<(), ()> {
    if interval.is_zero() {
        error!("Update interval must be non-zero");
        return Err(());
    }

    let mut ticker = tokio::time::interval(interval);

    for (i, value) in plan.iter().enumerate() {
        ticker.tick().await;

        let packet = payload::encode(value);
        let data = frame(mode, packet.as_bytes()).map_err(|e| {
            error!("Failed to frame payload: {e}");
        })?;

        let result = if i == 0 {
            advertiser.start_advertising(settings, &data)
        } else {
            advertiser.restart_advertising(settings, &data)
        };
        result.map_err(|e| {
            warn!("LE advertise failed: {e}");
        })?;

        info!("Advertising {value} ({})", HexBytes(packet.as_bytes()));
        advertiser.transmit();
    }

    advertiser.stop_advertising().map_err(|e| {
        warn!("Failed to stop advertising: {e}");
    })
}

async fn scan(
    scanner: &mut LoopbackScanner,
    mode: &FramingMode,
    variant: PayloadVariant,
    expected: usize,
    timeout: Duration,
) -> Option<LatestReading> {
    let mut latest = None;

    for _ in 0..expected {
        let Some(result) = scanner.next_result(timeout).await else {
            break;
        };

        match observe(&result, mode, variant) {
            Ok(observation) => {
                info!(
                    "{} ({}, {}dBm): {} [{}]",
                    observation.address,
                    observation.device_name.as_deref().unwrap_or("unnamed"),
                    observation.rssi,
                    observation.value,
                    HexBytes(result.record.bytes())
                );
                latest = Some(LatestReading {
                    address: observation.address,
                    value: observation.value,
                    updated: Utc::now(),
                });
            }
            Err(ObserveError::NotOurDevice(_)) => {
                warn!("This is not the device we're looking for...");
            }
            Err(e) => warn!("Ignoring scan result: {e}"),
        }
    }

    latest
}
