//! Standard GATT services built on [`GattServiceHandler`](crate::server::GattServiceHandler)

pub mod current_time;
pub mod device_information;
pub mod heart_rate;
pub mod subscribers;

pub use current_time::CurrentTimeService;
pub use device_information::DeviceInformationService;
pub use heart_rate::{BodySensorLocation, HeartRateService};
pub use subscribers::Subscribers;
