//! Example running the standard services on the in-memory transport
//!
//! Registers Device Information, Current Time and Heart Rate, advertises the
//! Heart Rate service, then plays a central that subscribes to measurements.
//! Run with `RUST_LOG=debug` to see every routed event.

use btserver::gap::{parse_advertising_data, BdAddr, Central};
use btserver::services::heart_rate::HEART_RATE_MEASUREMENT_UUID;
use btserver::services::{
    BodySensorLocation, CurrentTimeService, DeviceInformationService, HeartRateService,
};
use btserver::{BluetoothServer, GattServiceHandler, MemoryTransport, ServerConfig};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let transport = Arc::new(MemoryTransport::new());
    let config = ServerConfig {
        device_name: Some("btserver HRM".to_string()),
        ..Default::default()
    };
    let mut server = BluetoothServer::new(transport.clone(), config)?;

    let hrs = Arc::new(HeartRateService::new(
        transport.clone(),
        BodySensorLocation::Chest,
    ));
    let dis = DeviceInformationService::new(transport.clone(), "btserver", "HRM-1");
    let cts = CurrentTimeService::new(transport.clone());
    let handlers: Vec<Arc<dyn GattServiceHandler>> =
        vec![Arc::new(dis), Arc::new(cts), hrs.clone()];

    let report = server.start(handlers)?;
    println!("Registered {} services", report.registered.len());
    for failure in &report.failed {
        println!("Failed to register {}: {}", failure.name, failure.error);
    }
    if let Some(error) = &report.advertise_error {
        println!("Not discoverable: {}", error);
    }

    if let Some(advertising) = transport.advertising() {
        for (ad_type, data) in parse_advertising_data(&advertising.advertise_bytes) {
            println!("  adv  0x{:02X}: {}", ad_type, hex::encode(&data));
        }
        for (ad_type, data) in parse_advertising_data(&advertising.scan_response_bytes) {
            println!("  scan 0x{:02X}: {}", ad_type, hex::encode(&data));
        }
    }

    let central = Central::new(BdAddr::new([0x55, 0x44, 0x33, 0x22, 0x11, 0x00]), 0x0040);
    transport.connect(central);

    if let Some(measurement) = hrs.service().characteristic_ref(&HEART_RATE_MEASUREMENT_UUID) {
        transport.subscribe(&central, &measurement);
    }

    for bpm in [62, 75, 91, 118] {
        hrs.add_energy_expended(3);
        hrs.notify_measurement(bpm);
    }

    for sent in transport.notifications() {
        println!("Notified {}: {}", sent.central, hex::encode(&sent.value));
    }

    transport.disconnect(&central);
    server.reset();
    println!("Server stopped");

    Ok(())
}
