//! Current Time Service (0x1805)
//!
//! Serves the local wall-clock time in the 10-byte "Current Time" format and
//! notifies subscribers when the time is pushed or adjusted. A central may
//! write a new time; the service then keeps an offset from the system clock
//! rather than touching the clock itself.

use super::subscribers::Subscribers;
use crate::gap::Central;
use crate::gatt::{
    AttPermissions, CharacteristicProperties, CharacteristicRef, GattCharacteristic, GattService,
    GattStatus,
};
use crate::server::GattServiceHandler;
use crate::transport::PeripheralTransport;
use crate::uuid::Uuid;
use byteorder::{LittleEndian, ReadBytesExt};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use std::io::Cursor;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

pub const CURRENT_TIME_SERVICE_UUID: Uuid = Uuid::from_u16(0x1805);
pub const CURRENT_TIME_UUID: Uuid = Uuid::from_u16(0x2A2B);

pub const CURRENT_TIME_LEN: usize = 10;

// Adjust reason flags
pub const ADJUST_NONE: u8 = 0x00;
pub const ADJUST_MANUAL: u8 = 0x01;

/// Encodes a time as a Current Time characteristic value.
pub fn encode_current_time(time: &NaiveDateTime, adjust_reason: u8) -> [u8; CURRENT_TIME_LEN] {
    let year = (time.year().clamp(0, u16::MAX as i32) as u16).to_le_bytes();
    let fractions256 = (u64::from(time.nanosecond().min(999_999_999)) * 256 / 1_000_000_000) as u8;

    [
        year[0],
        year[1],
        time.month() as u8,
        time.day() as u8,
        time.hour() as u8,
        time.minute() as u8,
        time.second() as u8,
        time.weekday().number_from_monday() as u8,
        fractions256,
        adjust_reason,
    ]
}

/// Decodes a Current Time value. The day-of-week and adjust-reason fields are
/// ignored; `None` if the date or time is not valid.
pub fn decode_current_time(value: &[u8]) -> Option<NaiveDateTime> {
    if value.len() != CURRENT_TIME_LEN {
        return None;
    }

    let mut cursor = Cursor::new(value);
    let year = cursor.read_u16::<LittleEndian>().ok()?;
    let month = cursor.read_u8().ok()?;
    let day = cursor.read_u8().ok()?;
    let hour = cursor.read_u8().ok()?;
    let minute = cursor.read_u8().ok()?;
    let second = cursor.read_u8().ok()?;
    let _day_of_week = cursor.read_u8().ok()?;
    let fractions256 = cursor.read_u8().ok()?;

    let time = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))?
        .and_hms_opt(u32::from(hour), u32::from(minute), u32::from(second))?;
    Some(time + TimeDelta::nanoseconds(i64::from(fractions256) * 1_000_000_000 / 256))
}

pub struct CurrentTimeService {
    transport: Arc<dyn PeripheralTransport>,
    service: GattService,
    subscribers: Subscribers,
    offset: RwLock<TimeDelta>,
}

impl CurrentTimeService {
    pub fn new(transport: Arc<dyn PeripheralTransport>) -> Self {
        let service = GattService::new(CURRENT_TIME_SERVICE_UUID).with_characteristic(
            GattCharacteristic::new(
                CURRENT_TIME_UUID,
                CharacteristicProperties::READ
                    | CharacteristicProperties::WRITE
                    | CharacteristicProperties::NOTIFY,
                AttPermissions::read_write(),
            )
            .with_cccd(),
        );

        Self {
            transport,
            service,
            subscribers: Subscribers::new(),
            offset: RwLock::new(TimeDelta::zero()),
        }
    }

    /// Local time as served to centrals
    pub fn now(&self) -> NaiveDateTime {
        let offset = *self.offset.read().unwrap_or_else(PoisonError::into_inner);
        Local::now().naive_local() + offset
    }

    fn characteristic(&self) -> CharacteristicRef {
        CharacteristicRef::new(CURRENT_TIME_UUID, self.service.id())
    }

    fn push(&self, adjust_reason: u8) -> usize {
        let characteristic = self.characteristic();
        let value = encode_current_time(&self.now(), adjust_reason);

        let mut sent = 0;
        for central in self.subscribers.subscribers(&CURRENT_TIME_UUID) {
            match self.transport.notify(&central, &characteristic, &value) {
                Ok(()) => sent += 1,
                Err(e) => warn!(central = %central, error = %e, "current time notification failed"),
            }
        }
        sent
    }

    /// Sends the current time to every subscribed central. Returns how many
    /// notifications were handed to the transport.
    pub fn notify_current_time(&self) -> usize {
        self.push(ADJUST_NONE)
    }
}

impl GattServiceHandler for CurrentTimeService {
    fn service(&self) -> &GattService {
        &self.service
    }

    fn name(&self) -> &str {
        "Current Time Service"
    }

    fn on_characteristic_read(&self, _central: &Central, characteristic: &CharacteristicRef) {
        if characteristic.uuid != CURRENT_TIME_UUID {
            return;
        }
        let value = encode_current_time(&self.now(), ADJUST_NONE);
        if let Err(e) = self.transport.set_characteristic_value(characteristic, &value) {
            warn!(error = %e, "failed to set current time");
        }
    }

    fn on_characteristic_write(
        &self,
        central: &Central,
        characteristic: &CharacteristicRef,
        value: &[u8],
    ) -> GattStatus {
        if characteristic.uuid != CURRENT_TIME_UUID {
            return GattStatus::RequestNotSupported;
        }
        if value.len() != CURRENT_TIME_LEN {
            return GattStatus::InvalidAttributeValueLength;
        }
        let Some(time) = decode_current_time(value) else {
            return GattStatus::ValueNotAllowed;
        };

        let offset = time - Local::now().naive_local();
        *self.offset.write().unwrap_or_else(PoisonError::into_inner) = offset;
        info!(central = %central, time = %time, "current time set");

        self.push(ADJUST_MANUAL);
        GattStatus::Success
    }

    fn on_notifying_enabled(&self, central: &Central, characteristic: &CharacteristicRef) {
        if characteristic.uuid == CURRENT_TIME_UUID {
            self.subscribers.subscribe(CURRENT_TIME_UUID, *central);
            debug!(central = %central, "subscribed to current time");
        }
    }

    fn on_notifying_disabled(&self, central: &Central, characteristic: &CharacteristicRef) {
        if characteristic.uuid == CURRENT_TIME_UUID {
            self.subscribers.unsubscribe(&CURRENT_TIME_UUID, central);
        }
    }

    fn on_central_disconnected(&self, central: &Central) {
        self.subscribers.remove_central(central);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gap::BdAddr;
    use crate::transport::MemoryTransport;

    fn time(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_encode_current_time() {
        // 2024-03-15 was a Friday
        let encoded = encode_current_time(&time(2024, 3, 15, 13, 45, 30), ADJUST_MANUAL);
        assert_eq!(encoded, [0xE8, 0x07, 3, 15, 13, 45, 30, 5, 0, 0x01]);
    }

    #[test]
    fn test_decode_current_time() {
        let value = [0xE8, 0x07, 3, 15, 13, 45, 30, 5, 128, 0];
        let decoded = decode_current_time(&value).unwrap();
        assert_eq!(decoded, time(2024, 3, 15, 13, 45, 30) + TimeDelta::milliseconds(500));

        assert_eq!(decode_current_time(&[0xE8, 0x07, 2, 30, 0, 0, 0, 0, 0, 0]), None);
        assert_eq!(decode_current_time(&[0xE8, 0x07, 3, 15, 25, 0, 0, 0, 0, 0]), None);
        assert_eq!(decode_current_time(&value[..9]), None);
    }

    #[test]
    fn test_write_adjusts_offset_and_notifies() {
        let transport = Arc::new(MemoryTransport::new());
        let cts = CurrentTimeService::new(transport.clone());
        transport.add_service(cts.service()).unwrap();

        let central = Central::new(BdAddr::new([1, 2, 3, 4, 5, 6]), 1);
        transport.connect(central);
        let characteristic = cts.characteristic();
        cts.on_notifying_enabled(&central, &characteristic);

        let target = time(2030, 1, 1, 0, 0, 0);
        let value = encode_current_time(&target, 0);
        let status = cts.on_characteristic_write(&central, &characteristic, &value);
        assert_eq!(status, GattStatus::Success);
        assert!((cts.now() - target).num_seconds().abs() < 5);

        let sent = transport.notifications();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].value[0..2], 2030u16.to_le_bytes());
        assert_eq!(sent[0].value[9], ADJUST_MANUAL);

        assert_eq!(
            cts.on_characteristic_write(&central, &characteristic, &[0; 4]),
            GattStatus::InvalidAttributeValueLength
        );
        assert_eq!(
            cts.on_characteristic_write(&central, &characteristic, &[0; 10]),
            GattStatus::ValueNotAllowed
        );

        cts.on_central_disconnected(&central);
        assert_eq!(cts.notify_current_time(), 0);
    }
}
