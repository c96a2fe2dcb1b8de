//! Advertising settings and payloads
//!
//! A peripheral broadcasts two payloads: the advertising data carried in every
//! advertising PDU and the scan response returned to active scanners. Each is
//! described by an [`AdvertiseData`] listing which fields to include; the
//! encoder turns that selection into AD structures.

use super::constants::*;
use crate::error::AdvertiseError;
use crate::uuid::Uuid;
use std::time::Duration;

/// Trade-off between discovery latency and power draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdvertiseMode {
    LowPower,
    #[default]
    Balanced,
    LowLatency,
}

impl AdvertiseMode {
    /// Advertising interval in 0.625 ms units.
    pub fn interval(&self) -> u16 {
        match self {
            AdvertiseMode::LowPower => ADV_INTERVAL_LOW_POWER,
            AdvertiseMode::Balanced => ADV_INTERVAL_BALANCED,
            AdvertiseMode::LowLatency => ADV_INTERVAL_LOW_LATENCY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxPowerLevel {
    UltraLow,
    Low,
    #[default]
    Medium,
    High,
}

impl TxPowerLevel {
    pub fn dbm(&self) -> i8 {
        match self {
            TxPowerLevel::UltraLow => TX_POWER_ULTRA_LOW,
            TxPowerLevel::Low => TX_POWER_LOW,
            TxPowerLevel::Medium => TX_POWER_MEDIUM,
            TxPowerLevel::High => TX_POWER_HIGH,
        }
    }
}

/// Advertising parameters. The defaults advertise connectably, at medium
/// power and balanced interval, until explicitly stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertiseSettings {
    pub mode: AdvertiseMode,
    pub tx_power_level: TxPowerLevel,
    pub connectable: bool,
    /// `None` advertises indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for AdvertiseSettings {
    fn default() -> Self {
        Self {
            mode: AdvertiseMode::Balanced,
            tx_power_level: TxPowerLevel::Medium,
            connectable: true,
            timeout: None,
        }
    }
}

/// Selection of fields for one advertising payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvertiseData {
    pub include_device_name: bool,
    pub include_tx_power_level: bool,
    pub service_uuids: Vec<Uuid>,
    /// (company identifier, data)
    pub manufacturer_data: Vec<(u16, Vec<u8>)>,
}

impl AdvertiseData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_device_name(mut self, include: bool) -> Self {
        self.include_device_name = include;
        self
    }

    pub fn include_tx_power_level(mut self, include: bool) -> Self {
        self.include_tx_power_level = include;
        self
    }

    pub fn add_service_uuid(mut self, uuid: Uuid) -> Self {
        self.service_uuids.push(uuid);
        self
    }

    pub fn add_manufacturer_data(mut self, company_id: u16, data: Vec<u8>) -> Self {
        self.manufacturer_data.push((company_id, data));
        self
    }

    /// Encodes the selected fields as AD structures.
    ///
    /// `device_name` and `tx_power` are only read when the matching field is
    /// selected. Fails if the result does not fit a legacy advertising PDU.
    pub fn encode(&self, device_name: &str, tx_power: i8) -> Result<Vec<u8>, AdvertiseError> {
        let mut data = Vec::with_capacity(ADV_MAX_PAYLOAD_LEN);

        if self.include_device_name {
            push_structure(&mut data, ADV_TYPE_COMPLETE_LOCAL_NAME, device_name.as_bytes());
        }

        if self.include_tx_power_level {
            push_structure(&mut data, ADV_TYPE_TX_POWER_LEVEL, &[tx_power as u8]);
        }

        let mut uuids16 = Vec::new();
        let mut uuids32 = Vec::new();
        let mut uuids128 = Vec::new();
        for uuid in &self.service_uuids {
            if let Some(short) = uuid.as_u16() {
                uuids16.extend_from_slice(&short.to_le_bytes());
            } else if let Some(long) = uuid.as_u32() {
                uuids32.extend_from_slice(&long.to_le_bytes());
            } else {
                uuids128.extend_from_slice(uuid.as_bytes_le());
            }
        }
        if !uuids16.is_empty() {
            push_structure(&mut data, ADV_TYPE_16BIT_SERVICE_UUID_COMPLETE, &uuids16);
        }
        if !uuids32.is_empty() {
            push_structure(&mut data, ADV_TYPE_32BIT_SERVICE_UUID_COMPLETE, &uuids32);
        }
        if !uuids128.is_empty() {
            push_structure(&mut data, ADV_TYPE_128BIT_SERVICE_UUID_COMPLETE, &uuids128);
        }

        for (company_id, payload) in &self.manufacturer_data {
            let mut field = company_id.to_le_bytes().to_vec();
            field.extend_from_slice(payload);
            push_structure(&mut data, ADV_TYPE_MANUFACTURER_SPECIFIC, &field);
        }

        if data.len() > ADV_MAX_PAYLOAD_LEN {
            return Err(AdvertiseError::DataTooLarge {
                len: data.len(),
                limit: ADV_MAX_PAYLOAD_LEN,
            });
        }

        Ok(data)
    }
}

fn push_structure(data: &mut Vec<u8>, ad_type: u8, value: &[u8]) {
    // Oversized fields are caught by the payload length check in encode()
    let len = value.len().min(u8::MAX as usize - 1);
    data.push(len as u8 + 1);
    data.push(ad_type);
    data.extend_from_slice(&value[..len]);
}

/// Splits an advertising payload into (type, data) pairs.
///
/// Parsing stops at the first zero-length structure or truncated entry.
pub fn parse_advertising_data(data: &[u8]) -> Vec<(u8, Vec<u8>)> {
    let mut result = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let length = data[i] as usize;
        if length == 0 || i + length >= data.len() {
            break;
        }

        let ad_type = data[i + 1];
        let ad_data = data[i + 2..i + 1 + length].to_vec();

        result.push((ad_type, ad_data));

        i += 1 + length;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = AdvertiseSettings::default();
        assert!(settings.connectable);
        assert_eq!(settings.timeout, None);
        assert_eq!(settings.mode.interval(), 0x0190);
        assert_eq!(settings.tx_power_level.dbm(), -7);
    }

    #[test]
    fn test_encode_selected_fields_only() {
        let data = AdvertiseData::new()
            .include_tx_power_level(true)
            .add_service_uuid(Uuid::from_u16(0x180D));

        let encoded = data.encode("ignored", -7).unwrap();
        assert_eq!(encoded, vec![0x02, 0x0A, 0xF9, 0x03, 0x03, 0x0D, 0x18]);

        let fields = parse_advertising_data(&encoded);
        assert_eq!(fields.len(), 2);
        assert!(fields
            .iter()
            .all(|(ad_type, _)| *ad_type != ADV_TYPE_COMPLETE_LOCAL_NAME));
    }

    #[test]
    fn test_encode_scan_response_name() {
        let scan = AdvertiseData::new().include_device_name(true);
        let encoded = scan.encode("Pixel", 0).unwrap();
        assert_eq!(
            parse_advertising_data(&encoded),
            vec![(ADV_TYPE_COMPLETE_LOCAL_NAME, b"Pixel".to_vec())]
        );
    }

    #[test]
    fn test_encode_128bit_uuid() {
        let vendor = Uuid::from_u128(0x6E400001_B5A3_F393_E0A9_E50E24DCCA9E);
        let encoded = AdvertiseData::new()
            .add_service_uuid(vendor)
            .encode("", 0)
            .unwrap();
        assert_eq!(encoded.len(), 18);
        assert_eq!(encoded[1], ADV_TYPE_128BIT_SERVICE_UUID_COMPLETE);
        assert_eq!(&encoded[2..], vendor.as_bytes_le());
    }

    #[test]
    fn test_encode_too_large() {
        let data = AdvertiseData::new()
            .include_device_name(true)
            .add_service_uuid(Uuid::from_u128(0x6E400001_B5A3_F393_E0A9_E50E24DCCA9E));

        let err = data.encode("A rather long device name", 0).unwrap_err();
        assert_eq!(err, AdvertiseError::DataTooLarge { len: 45, limit: 31 });
    }
}
