//! Error types for the sidusmesh library
//!
//! This module defines the error types used throughout the library.

use crate::sidus::SidusError;
use thiserror::Error;

/// Result type used by the mesh engine
pub type MeshResult<T> = Result<T, MeshError>;

/// Cause of a failed configuration step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFailureCause {
    /// Device answered with a non-zero status code
    Status(u8),
    /// No matching status arrived before the step timeout
    Timeout,
}

impl std::fmt::Display for ConfigFailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigFailureCause::Status(code) => write!(f, "status code {:#04X}", code),
            ConfigFailureCause::Timeout => write!(f, "timeout"),
        }
    }
}

/// Errors that can occur in the mesh protocol engine
#[derive(Error, Debug)]
pub enum MeshError {
    /// AES-CCM authentication mismatch on decrypt. The offending PDU is
    /// dropped by the caller; this never surfaces past a diagnostic log.
    #[error("decrypt failed: CCM authentication mismatch")]
    CryptoFailure,

    #[error("malformed PDU: {0}")]
    MalformedPdu(String),

    #[error("no device key stored for source address {0:#06X}")]
    UnknownDeviceKey(u16),

    #[error("sidus codec error: {0}")]
    Sidus(#[from] SidusError),

    #[error("provisioning step timed out")]
    ProvisioningTimeout,

    #[error("device reported provisioning failure (error code {0:#04X})")]
    ProvisioningRemoteFailure(u8),

    #[error("provisioning failed: {0}")]
    ProvisioningLocalFailure(String),

    #[error("configuration step {step} failed: {cause}")]
    ConfigFailure {
        step: &'static str,
        cause: ConfigFailureCause,
    },

    #[error("transport error: {0}")]
    Transport(String),

    /// The 24-bit sequence number space is about to wrap. Recovering
    /// requires a key refresh, which this engine does not perform.
    #[error("sequence number space exhausted, key refresh required")]
    CounterExhausted,
}
