//! Constants for the configuration client

use std::time::Duration;

// Config model opcodes
pub const CONFIG_APPKEY_ADD_OPCODE: u8 = 0x00;
pub const CONFIG_APPKEY_STATUS_OPCODE: [u8; 2] = [0x80, 0x03];
pub const CONFIG_MODEL_PUBLICATION_SET_OPCODE: u8 = 0x03;
pub const CONFIG_MODEL_PUBLICATION_STATUS_OPCODE: [u8; 2] = [0x80, 0x19];
pub const CONFIG_MODEL_APP_BIND_OPCODE: [u8; 2] = [0x80, 0x3D];
pub const CONFIG_MODEL_APP_STATUS_OPCODE: [u8; 2] = [0x80, 0x3E];

/// Status code for success in every Config Status message
pub const CONFIG_STATUS_SUCCESS: u8 = 0x00;

/// Telink company identifier of the Sidus vendor model
pub const SIDUS_COMPANY_ID: u16 = 0x0211;
/// Model identifier of the Sidus vendor model
pub const SIDUS_VENDOR_MODEL_ID: u16 = 0x00C0;

/// How long to wait for the status answer of one configuration step
pub const CONFIG_RESPONSE_TIMEOUT: Duration = Duration::from_millis(1500);

/// Retries per step before giving up on the sequence
pub const CONFIG_MAX_RETRIES: u8 = 2;
