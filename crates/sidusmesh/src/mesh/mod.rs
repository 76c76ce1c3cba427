//! Mesh PDU pipeline
//!
//! The layered construction and parsing of mesh traffic: access payloads
//! are sealed into upper/lower transport PDUs, network PDUs (with nonce
//! construction and header obfuscation) and finally GATT proxy PDUs; the
//! inbound path reverses the stack. Device-key configuration traffic is
//! segmented when it outgrows an unsegmented PDU.

mod beacon;
mod constants;
mod network;
mod nonce;
mod pipeline;
mod proxy;
mod transport;


pub use self::beacon::MeshAdvertisement;
pub use self::constants::*;
pub use self::network::{obfuscate_header, NetworkPdu};
pub use self::nonce::{application_nonce, device_nonce, network_nonce};
pub use self::pipeline::{InboundMessage, MeshProtocol};
pub use self::proxy::ProxyPdu;
pub use self::transport::{
    segmented_access_header, split_segments, unsegmented_access_header, LowerTransportPdu,
};
