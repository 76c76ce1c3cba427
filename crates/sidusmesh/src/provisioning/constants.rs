//! Constants for the provisioning protocol

use std::time::Duration;

// Provisioning PDU types
pub const PROVISIONING_PDU_INVITE: u8 = 0x00;
pub const PROVISIONING_PDU_CAPABILITIES: u8 = 0x01;
pub const PROVISIONING_PDU_START: u8 = 0x02;
pub const PROVISIONING_PDU_PUBLIC_KEY: u8 = 0x03;
pub const PROVISIONING_PDU_INPUT_COMPLETE: u8 = 0x04;
pub const PROVISIONING_PDU_CONFIRMATION: u8 = 0x05;
pub const PROVISIONING_PDU_RANDOM: u8 = 0x06;
pub const PROVISIONING_PDU_DATA: u8 = 0x07;
pub const PROVISIONING_PDU_COMPLETE: u8 = 0x08;
pub const PROVISIONING_PDU_FAILED: u8 = 0x09;

// Start PDU parameter values for the no-OOB FIPS P-256 flow
pub const START_ALGORITHM_P256: u8 = 0x00;
pub const START_PUBLIC_KEY_NO_OOB: u8 = 0x00;
pub const START_AUTH_METHOD_NO_OOB: u8 = 0x00;

/// Parameter length of a Capabilities PDU
pub const CAPABILITIES_PARAMS_LEN: usize = 11;

/// Length of the plaintext provisioning data
pub const PROVISIONING_DATA_LEN: usize = 25;

/// Length of the encrypted provisioning data including its 8-byte MIC
pub const ENCRYPTED_PROVISIONING_DATA_LEN: usize = 33;

/// AuthValue for the no-OOB flow: sixteen zero bytes
pub const NO_OOB_AUTH_VALUE: [u8; 16] = [0u8; 16];

/// Per-step timeout of the provisioning flow
pub const PROVISIONING_STEP_TIMEOUT: Duration = Duration::from_secs(30);
