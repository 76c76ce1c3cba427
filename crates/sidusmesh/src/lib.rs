//! SidusMesh - a Bluetooth Mesh client engine for Sidus-Link film lights
//!
//! This library implements the mesh protocol core used to control
//! Aputure/Amaran Sidus-Link lights over the Mesh Proxy GATT bearer: the
//! cryptographic transforms, the layered PDU pipeline (access through
//! proxy framing), the Sidus vendor codec, the device provisioning state
//! machine and the post-provisioning configuration client. The BLE
//! transport itself, key persistence and all user-facing controls live
//! outside, behind the [`bearer::ProxyBearer`] and [`keys::KeyStore`]
//! traits.

pub mod bearer;
pub mod config;
pub mod crypto;
pub mod error;
pub mod keys;
pub mod mesh;
pub mod provisioning;
pub mod session;
pub mod sidus;

// Re-export common types for convenience
pub use bearer::ProxyBearer;
pub use config::{ConfigAction, ConfigClient, ConfigStep};
pub use error::{ConfigFailureCause, MeshError, MeshResult};
pub use keys::{DerivedKeys, KeyStore, KeyStoreHandle, MemoryKeyStore, NetworkCredentials};
pub use mesh::{InboundMessage, MeshAdvertisement, MeshProtocol};
pub use provisioning::{Provisioner, ProvisionerAction, ProvisioningResult, ProvisioningState};
pub use session::{Session, SessionEvent};
pub use sidus::{
    CctCommand, EffectCommand, HsiCommand, SidusCommand, SidusError, SidusStatus,
};
