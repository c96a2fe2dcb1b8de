//! Generic Access Profile pieces used by the peripheral role
//!
//! Connected centrals, device addresses and the advertising payloads that make
//! the device discoverable.

pub mod advertising;
pub mod constants;
pub mod types;

pub use advertising::{
    parse_advertising_data, AdvertiseData, AdvertiseMode, AdvertiseSettings, TxPowerLevel,
};
pub use constants::*;
pub use types::*;
