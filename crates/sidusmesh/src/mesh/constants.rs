//! Constants for the mesh PDU pipeline

// Well-known addresses
pub const UNASSIGNED_ADDRESS: u16 = 0x0000;
pub const CONTROLLER_ADDRESS: u16 = 0x0001;
pub const SIDUS_GROUP_ADDRESS: u16 = 0xC000;
pub const ALL_NODES_ADDRESS: u16 = 0xFFFF;

// Proxy PDU SAR values
pub const PROXY_SAR_COMPLETE: u8 = 0x00;
pub const PROXY_SAR_FIRST: u8 = 0x01;
pub const PROXY_SAR_CONTINUATION: u8 = 0x02;
pub const PROXY_SAR_LAST: u8 = 0x03;

// Proxy PDU message types
pub const PROXY_TYPE_NETWORK_PDU: u8 = 0x00;
pub const PROXY_TYPE_MESH_BEACON: u8 = 0x01;
pub const PROXY_TYPE_PROXY_CONFIG: u8 = 0x02;
pub const PROXY_TYPE_PROVISIONING: u8 = 0x03;

// Proxy filter control opcodes
pub const FILTER_SET_TYPE_OPCODE: u8 = 0x00;
pub const FILTER_STATUS_OPCODE: u8 = 0x03;
/// Blacklist filter type: reject listed addresses, i.e. accept everything
/// while the list stays empty
pub const FILTER_TYPE_BLACKLIST: u8 = 0x01;

// Lower transport header bits
pub const SEG_BIT: u8 = 0x80;
pub const AKF_BIT: u8 = 0x40;
pub const AID_MASK: u8 = 0x3F;

/// Shortest proxy PDU that can hold a network PDU worth decrypting
pub const MIN_PROXY_NETWORK_PDU: usize = 15;

/// Longest access message (opcode + parameters) an unsegmented
/// application-key SIG-model PDU can carry
pub const MAX_UNSEGMENTED_SIG_ACCESS: usize = 11;

/// Longest encrypted access payload that still goes out unsegmented on
/// the device-key path
pub const MAX_UNSEGMENTED_DEVICE_PAYLOAD: usize = 15;

/// Segment size for segmented device-key messages
pub const SEGMENT_SIZE: usize = 12;

/// First sequence number issued by a fresh pipeline; large enough to
/// clear trivial replay rejection after reinstalls
pub const INITIAL_SEQUENCE: u32 = 0x01_0000;

/// Largest representable 24-bit sequence number
pub const SEQUENCE_MAX: u32 = 0xFF_FFFF;

/// Default TTL for outbound access messages
pub const DEFAULT_TTL: u8 = 7;

// 16-bit service UUIDs used in mesh advertisements
pub const MESH_PROVISIONING_SERVICE_UUID: u16 = 0x1827;
pub const MESH_PROXY_SERVICE_UUID: u16 = 0x1828;
