//! Device provisioning
//!
//! The one-shot provisioner state machine and the provisioning PDU
//! codecs for the no-OOB FIPS P-256 flow used to bring a factory-fresh
//! Sidus light into the network.

mod constants;
mod machine;
mod pdu;


pub use self::constants::*;
pub use self::machine::{
    Provisioner, ProvisionerAction, ProvisioningResult, ProvisioningState,
};
pub use self::pdu::{
    confirmation_pdu, data_pdu, invite_pdu, public_key_pdu, random_pdu, start_pdu, Algorithms,
    Capabilities, ProvisioningPdu, StaticOobType,
};
