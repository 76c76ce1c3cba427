//! Configuration client
//!
//! Builds and tracks the post-provisioning configuration sequence that
//! every freshly provisioned (or freshly connected) light needs before
//! application commands work: AppKey distribution and vendor-model
//! binding, plus optional status publication setup.

mod client;
mod constants;
mod messages;

#[cfg(test)]
mod tests;

pub use self::client::{ConfigAction, ConfigClient, ConfigStep};
pub use self::constants::*;
pub use self::messages::{
    pack_key_indices, unpack_key_indices, ConfigAppKeyAdd, ConfigModelAppBind,
    ConfigModelPublicationSet, ConfigStatusMessage, ModelId,
};
