//! Constants for the Sidus vendor codec

/// Length of every Sidus command/status payload
pub const SIDUS_PAYLOAD_LEN: usize = 10;

/// Full 3-byte vendor opcode (Telink company 0x0211) plus the Sidus
/// sub-opcode, as emitted on the wire
pub const SIDUS_VENDOR_OPCODE: [u8; 4] = [0xC0, 0x11, 0x02, 0x26];

/// Bare sub-opcode form also seen on the wire
pub const SIDUS_SUB_OPCODE: u8 = 0x26;

// Command types
pub const COMMAND_TYPE_HSI: u8 = 1;
pub const COMMAND_TYPE_CCT: u8 = 2;
pub const COMMAND_TYPE_EFFECT: u8 = 7;
pub const COMMAND_TYPE_SLEEP: u8 = 12;

// Effect types
pub const EFFECT_TYPE_PAPARAZZI: u8 = 1;
pub const EFFECT_TYPE_LIGHTNING: u8 = 2;
pub const EFFECT_TYPE_CANDLE: u8 = 3;
pub const EFFECT_TYPE_FIRE: u8 = 4;
pub const EFFECT_TYPE_TV: u8 = 5;
pub const EFFECT_TYPE_STROBE: u8 = 6;
pub const EFFECT_TYPE_EXPLOSION: u8 = 7;
pub const EFFECT_TYPE_FAULTY_BULB: u8 = 8;
pub const EFFECT_TYPE_PULSING: u8 = 9;
pub const EFFECT_TYPE_WELDING: u8 = 10;
pub const EFFECT_TYPE_COP_CAR: u8 = 11;
pub const EFFECT_TYPE_PARTY: u8 = 13;
pub const EFFECT_TYPE_FIREWORKS: u8 = 14;
pub const EFFECT_TYPE_OFF: u8 = 15;

// Input ranges
pub const INTENSITY_MAX: u16 = 1000;
pub const CCT_MIN: u16 = 180;
pub const CCT_MAX: u16 = 2000;
pub const GM_MAX: u16 = 200;
pub const HUE_MAX: u16 = 360;
pub const SATURATION_MAX: u8 = 100;
