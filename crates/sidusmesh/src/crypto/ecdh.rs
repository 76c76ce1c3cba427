//! P-256 key agreement for the provisioning handshake
//!
//! The provisioner generates a fresh ephemeral keypair per provisioning
//! attempt, exchanges uncompressed public points (64-byte X‖Y, no SEC1
//! prefix on the wire) and keeps only the X coordinate of the shared
//! point as the ECDH secret.

use crate::error::{MeshError, MeshResult};
use p256::ecdh::EphemeralSecret;
use p256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use p256::{EncodedPoint, PublicKey};
use rand::rngs::OsRng;

/// Ephemeral P-256 keypair owned by one provisioning session
pub struct EphemeralKeyPair {
    secret: EphemeralSecret,
}

impl EphemeralKeyPair {
    /// Generate a fresh keypair from the system RNG
    pub fn generate() -> Self {
        Self {
            secret: EphemeralSecret::random(&mut OsRng),
        }
    }

    /// The public point as 64 bytes of X‖Y, big-endian coordinates
    pub fn public_bytes(&self) -> [u8; 64] {
        let point = self.secret.public_key().to_encoded_point(false);

        // Uncompressed SEC1 encoding is 0x04 || X || Y.
        let mut out = [0u8; 64];
        out.copy_from_slice(&point.as_bytes()[1..65]);
        out
    }

    /// Compute the shared secret with a peer's 64-byte X‖Y public point
    ///
    /// Rejects points that are not on the curve; the result is the
    /// 32-byte X coordinate of the shared point.
    pub fn diffie_hellman(&self, peer: &[u8; 64]) -> MeshResult<[u8; 32]> {
        let point = EncodedPoint::from_affine_coordinates(
            peer[..32].into(),
            peer[32..].into(),
            false,
        );

        let peer_key = Option::<PublicKey>::from(PublicKey::from_encoded_point(&point)).ok_or(
            MeshError::ProvisioningLocalFailure("device public key is not on the curve".into()),
        )?;

        let shared = self.secret.diffie_hellman(&peer_key);

        let mut out = [0u8; 32];
        out.copy_from_slice(shared.raw_secret_bytes());
        Ok(out)
    }
}

impl std::fmt::Debug for EphemeralKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The secret scalar stays out of Debug output.
        f.debug_struct("EphemeralKeyPair").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_sides_derive_the_same_secret() {
        let ours = EphemeralKeyPair::generate();
        let theirs = EphemeralKeyPair::generate();

        let a = ours.diffie_hellman(&theirs.public_bytes()).unwrap();
        let b = theirs.diffie_hellman(&ours.public_bytes()).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_off_curve_point_is_rejected() {
        let ours = EphemeralKeyPair::generate();
        let bogus = [0u8; 64];

        assert!(ours.diffie_hellman(&bogus).is_err());
    }
}
