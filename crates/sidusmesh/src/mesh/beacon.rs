//! Mesh advertisement classification
//!
//! Mesh devices advertise 16-bit service data: UUID 0x1827 while
//! unprovisioned (Device UUID + OOB info) and 0x1828 once provisioned
//! (Network ID or a node identity hash). The scanner side of the
//! transport adapter feeds service data here to decide what a discovered
//! peripheral is.

use super::constants::{MESH_PROVISIONING_SERVICE_UUID, MESH_PROXY_SERVICE_UUID};
use crate::keys::DerivedKeys;
use log::debug;

const ADVERTISEMENT_TYPE_NETWORK_ID: u8 = 0x00;

/// Classified mesh advertisement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshAdvertisement {
    /// Unprovisioned device beacon (service 0x1827)
    Unprovisioned {
        device_uuid: [u8; 16],
        oob_info: u16,
    },
    /// Provisioned node advertising its network (service 0x1828, type 0)
    NetworkId { network_id: [u8; 8] },
    /// Provisioned node advertising a node identity (service 0x1828,
    /// types 1..=3)
    NodeIdentity {
        advertisement_type: u8,
        hash: [u8; 8],
    },
}

impl MeshAdvertisement {
    /// Parse the service data for one of the two mesh service UUIDs
    pub fn parse(service_uuid: u16, data: &[u8]) -> Option<Self> {
        match service_uuid {
            MESH_PROVISIONING_SERVICE_UUID => {
                if data.len() < 18 {
                    debug!("short unprovisioned service data: {} bytes", data.len());
                    return None;
                }
                let device_uuid: [u8; 16] = data[..16].try_into().unwrap();
                let oob_info = u16::from_be_bytes([data[16], data[17]]);
                Some(MeshAdvertisement::Unprovisioned {
                    device_uuid,
                    oob_info,
                })
            }
            MESH_PROXY_SERVICE_UUID => {
                if data.len() < 9 {
                    debug!("short proxy service data: {} bytes", data.len());
                    return None;
                }
                let advertisement_type = data[0];
                let body: [u8; 8] = data[1..9].try_into().unwrap();
                if advertisement_type == ADVERTISEMENT_TYPE_NETWORK_ID {
                    Some(MeshAdvertisement::NetworkId { network_id: body })
                } else {
                    Some(MeshAdvertisement::NodeIdentity {
                        advertisement_type,
                        hash: body,
                    })
                }
            }
            _ => None,
        }
    }

    /// Whether this advertisement names the network we hold keys for
    pub fn matches_network(&self, keys: &DerivedKeys) -> bool {
        match self {
            MeshAdvertisement::NetworkId { network_id } => *network_id == keys.network_id,
            _ => false,
        }
    }
}
