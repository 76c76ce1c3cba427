//! Network credentials and key storage
//!
//! Credentials (NetworkKey, AppKey, IVIndex, key indices, per-device
//! DeviceKeys) are owned by the embedding application behind the
//! [`KeyStore`] trait; the engine only reads them and asks the store to
//! remember a DeviceKey when provisioning completes. The material derived
//! from the credentials (NID, EncryptionKey, PrivacyKey, AID) is cached by
//! the PDU pipeline and rebuilt whenever the credentials change.

use crate::crypto::{k2, k3, k4};
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Shared handle to a key store implementation
pub type KeyStoreHandle = Arc<dyn KeyStore + Send + Sync>;

/// Snapshot of the process-wide network credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkCredentials {
    /// The 128-bit mesh network key
    pub network_key: [u8; 16],
    /// The 128-bit application key
    pub app_key: [u8; 16],
    /// The 32-bit network IV index; its LSB is the IVI flag of every
    /// network PDU
    pub iv_index: u32,
    /// Global index of the network key
    pub net_key_index: u16,
    /// Global index of the application key
    pub app_key_index: u16,
}

/// Material derived deterministically from the network credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedKeys {
    /// 7-bit network identifier carried in every network PDU
    pub nid: u8,
    /// Network-layer encryption key
    pub encryption_key: [u8; 16],
    /// Header obfuscation key
    pub privacy_key: [u8; 16],
    /// 6-bit application key identifier
    pub aid: u8,
    /// 64-bit Network ID advertised by provisioned nodes
    pub network_id: [u8; 8],
}

impl DerivedKeys {
    /// Derive the cacheable key material from a credential snapshot
    ///
    /// Recomputing on the same credentials yields identical bytes.
    pub fn derive(credentials: &NetworkCredentials) -> Self {
        let (nid, encryption_key, privacy_key) = k2(&credentials.network_key, &[0x00]);
        let aid = k4(&credentials.app_key);
        let network_id = k3(&credentials.network_key);

        debug!("derived network keys: nid={:#04X} aid={:#04X}", nid, aid);

        Self {
            nid,
            encryption_key,
            privacy_key,
            aid,
            network_id,
        }
    }
}

/// Key store trait for credential access and DeviceKey persistence
///
/// Implementations own the persisted state; the engine treats the store
/// as read-only apart from [`KeyStore::store_device_key`], invoked once
/// per successful provisioning.
pub trait KeyStore {
    /// Current network credentials
    fn credentials(&self) -> NetworkCredentials;

    /// Look up the DeviceKey for a node's unicast address
    fn device_key(&self, address: u16) -> Option<[u8; 16]>;

    /// Remember the DeviceKey assigned to a newly provisioned node
    fn store_device_key(&self, address: u16, key: [u8; 16]);
}

/// In-memory implementation of [`KeyStore`]
///
/// Used by the test suite and by embedders that keep persistence outside
/// the engine.
#[derive(Debug)]
pub struct MemoryKeyStore {
    credentials: NetworkCredentials,
    device_keys: RwLock<HashMap<u16, [u8; 16]>>,
}

impl MemoryKeyStore {
    /// Create a store over a fixed credential set
    pub fn new(credentials: NetworkCredentials) -> Self {
        Self {
            credentials,
            device_keys: RwLock::new(HashMap::new()),
        }
    }
}

impl KeyStore for MemoryKeyStore {
    fn credentials(&self) -> NetworkCredentials {
        self.credentials
    }

    fn device_key(&self, address: u16) -> Option<[u8; 16]> {
        let keys = self.device_keys.read().unwrap();
        keys.get(&address).copied()
    }

    fn store_device_key(&self, address: u16, key: [u8; 16]) {
        let mut keys = self.device_keys.write().unwrap();
        keys.insert(address, key);
    }
}
