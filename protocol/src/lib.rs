#![cfg_attr(feature = "no-std", no_std)]

//! Temperature beacon payloads for Bluetooth Low Energy advertisements.
//!
//! A reading is packed into a small payload ([`payload`]), placed under either a manufacturer
//! identifier or a GATT service UUID ([`framing`]), serialised into the AD structures of a raw
//! scan record ([`scan_record`]) and recovered again on the scanning side ([`port::observe`]).

#[cfg(feature = "no-std")]
use defmt::{debug, trace, warn};
#[cfg(feature = "std")]
use log::{debug, trace, warn};

pub mod format;
pub mod framing;
pub mod payload;
pub mod port;
pub mod scan_record;
pub mod types;

/// Maximum number of bytes in a legacy advertising PDU's data field.
pub const MAX_ADVERTISEMENT_LEN: usize = 31;

/// Bytes making up a single advertisement or scan record.
pub type AdvertisementBytes = heapless::Vec<u8, MAX_ADVERTISEMENT_LEN>;
