//! Cryptographic primitives for the mesh protocol engine
//!
//! This module provides the AES building blocks (single-block ECB, CMAC,
//! CCM with mesh-sized nonces and MICs), the mesh key derivation functions
//! (s1, k1, k2, k3, k4), and the P-256 ECDH operations used during
//! provisioning.

mod aes;
mod ecdh;
mod kdf;

pub use self::aes::{aes_ccm_decrypt, aes_ccm_encrypt, aes_cmac, aes_ecb_encrypt, MicSize};
pub use self::ecdh::EphemeralKeyPair;
pub use self::kdf::{k1, k2, k3, k4, s1};
