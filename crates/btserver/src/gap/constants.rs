// Advertising data types (Core Specification Supplement, Part A)
pub const ADV_TYPE_16BIT_SERVICE_UUID_COMPLETE: u8 = 0x03;
pub const ADV_TYPE_32BIT_SERVICE_UUID_COMPLETE: u8 = 0x05;
pub const ADV_TYPE_128BIT_SERVICE_UUID_COMPLETE: u8 = 0x07;
pub const ADV_TYPE_COMPLETE_LOCAL_NAME: u8 = 0x09;
pub const ADV_TYPE_TX_POWER_LEVEL: u8 = 0x0A;
pub const ADV_TYPE_MANUFACTURER_SPECIFIC: u8 = 0xFF;

// Legacy advertising PDU payload limit
pub const ADV_MAX_PAYLOAD_LEN: usize = 31;

// Advertising intervals in 0.625 ms units
pub const ADV_INTERVAL_LOW_POWER: u16 = 0x0640; // 1000 ms
pub const ADV_INTERVAL_BALANCED: u16 = 0x0190; // 250 ms
pub const ADV_INTERVAL_LOW_LATENCY: u16 = 0x00A0; // 100 ms

// Transmit power levels in dBm
pub const TX_POWER_ULTRA_LOW: i8 = -21;
pub const TX_POWER_LOW: i8 = -15;
pub const TX_POWER_MEDIUM: i8 = -7;
pub const TX_POWER_HIGH: i8 = 1;
