//! AES-128 primitives: single-block ECB, CMAC (RFC 4493) and CCM
//!
//! CCM is parameterised for L=2: a 13-byte nonce, lengths up to 65535
//! bytes, and no associated data, with either a 4- or 8-byte MIC. These
//! are the only shapes the mesh network, transport and provisioning
//! layers use.

use crate::error::{MeshError, MeshResult};
use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::Aes128;
use ccm::consts::{U13, U4, U8};
use ccm::{AeadInPlace, Ccm};
use cmac::{Cmac, Mac};

type Aes128Ccm4 = Ccm<Aes128, U4, U13>;
type Aes128Ccm8 = Ccm<Aes128, U8, U13>;

/// MIC length selector for AES-CCM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicSize {
    /// 4-byte MIC (access payloads, CTL=0 network PDUs)
    Four,
    /// 8-byte MIC (CTL=1 network PDUs, provisioning data)
    Eight,
}

impl MicSize {
    /// MIC length in bytes
    pub fn len(&self) -> usize {
        match self {
            MicSize::Four => 4,
            MicSize::Eight => 8,
        }
    }
}

/// Encrypt a single 16-byte block with AES-128, no padding
pub fn aes_ecb_encrypt(key: &[u8; 16], block: &[u8; 16]) -> [u8; 16] {
    let cipher = Aes128::new(GenericArray::from_slice(key));

    let mut out = GenericArray::clone_from_slice(block);
    cipher.encrypt_block(&mut out);

    out.into()
}

/// AES-CMAC over an arbitrary-length message (RFC 4493)
pub fn aes_cmac(key: &[u8; 16], message: &[u8]) -> [u8; 16] {
    let mut mac = <Cmac<Aes128> as Mac>::new(GenericArray::from_slice(key));
    mac.update(message);

    mac.finalize().into_bytes().into()
}

/// Encrypt with AES-CCM and append the MIC
///
/// Returns `ciphertext || mic`. Fails only when the plaintext exceeds the
/// 65535-byte limit of the 2-byte length field.
pub fn aes_ccm_encrypt(
    key: &[u8; 16],
    nonce: &[u8; 13],
    plaintext: &[u8],
    mic_size: MicSize,
) -> MeshResult<Vec<u8>> {
    let mut buf = plaintext.to_vec();
    let nonce = GenericArray::from_slice(nonce);

    match mic_size {
        MicSize::Four => {
            let cipher = Aes128Ccm4::new(GenericArray::from_slice(key));
            let tag = cipher
                .encrypt_in_place_detached(nonce, b"", &mut buf)
                .map_err(|_| MeshError::MalformedPdu("plaintext too long for CCM".into()))?;
            buf.extend_from_slice(&tag);
        }
        MicSize::Eight => {
            let cipher = Aes128Ccm8::new(GenericArray::from_slice(key));
            let tag = cipher
                .encrypt_in_place_detached(nonce, b"", &mut buf)
                .map_err(|_| MeshError::MalformedPdu("plaintext too long for CCM".into()))?;
            buf.extend_from_slice(&tag);
        }
    }

    Ok(buf)
}

/// Decrypt AES-CCM `ciphertext || mic` and verify the MIC
///
/// The tag comparison is constant-time. Any mismatch yields
/// [`MeshError::CryptoFailure`] and no plaintext.
pub fn aes_ccm_decrypt(
    key: &[u8; 16],
    nonce: &[u8; 13],
    data: &[u8],
    mic_size: MicSize,
) -> MeshResult<Vec<u8>> {
    let mic_len = mic_size.len();
    if data.len() < mic_len {
        return Err(MeshError::MalformedPdu(
            "CCM payload shorter than its MIC".into(),
        ));
    }

    let (ciphertext, tag) = data.split_at(data.len() - mic_len);
    let mut buf = ciphertext.to_vec();
    let nonce = GenericArray::from_slice(nonce);

    let verified = match mic_size {
        MicSize::Four => {
            let cipher = Aes128Ccm4::new(GenericArray::from_slice(key));
            cipher.decrypt_in_place_detached(nonce, b"", &mut buf, GenericArray::from_slice(tag))
        }
        MicSize::Eight => {
            let cipher = Aes128Ccm8::new(GenericArray::from_slice(key));
            cipher.decrypt_in_place_detached(nonce, b"", &mut buf, GenericArray::from_slice(tag))
        }
    };

    match verified {
        Ok(()) => Ok(buf),
        Err(_) => Err(MeshError::CryptoFailure),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unhex(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }

    fn key16(s: &str) -> [u8; 16] {
        unhex(s).try_into().unwrap()
    }

    #[test]
    fn test_aes_ecb_nist_vector() {
        // NIST SP 800-38A, F.1.1
        let key = key16("2b7e151628aed2a6abf7158809cf4f3c");
        let plaintext = key16("6bc1bee22e409f96e93d7e117393172a");
        let expected = key16("3ad77bb40d7a3660a89ecaf32466ef97");

        assert_eq!(aes_ecb_encrypt(&key, &plaintext), expected);
    }

    #[test]
    fn test_aes_cmac_rfc4493_vectors() {
        // RFC 4493, examples 1-4
        let key = key16("2b7e151628aed2a6abf7158809cf4f3c");

        assert_eq!(
            aes_cmac(&key, &[]),
            key16("bb1d6929e95937287fa37d129b756746")
        );
        assert_eq!(
            aes_cmac(&key, &unhex("6bc1bee22e409f96e93d7e117393172a")),
            key16("070a16b46b4d4144f79bdd9dd04a287c")
        );
        assert_eq!(
            aes_cmac(
                &key,
                &unhex(
                    "6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c\
                     9eb76fac45af8e5130c81c46a35ce411"
                )
            ),
            key16("dfa66747de9ae63030ca32611497c827")
        );
        assert_eq!(
            aes_cmac(
                &key,
                &unhex(
                    "6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c\
                     9eb76fac45af8e5130c81c46a35ce411e5fbc1191a0a52ef\
                     f69f2445df4f9b17ad2b417be66c3710"
                )
            ),
            key16("51f0bebf7e3b9d92fc49741779363cfe")
        );
    }

    #[test]
    fn test_ccm_round_trip_both_mic_sizes() {
        let key = key16("0953fa93e7caac9638f58820220a398e");
        let nonce: [u8; 13] = unhex("000307080d1234000012345677").try_into().unwrap();
        let plaintext = unhex("0000070405000000");

        for mic in [MicSize::Four, MicSize::Eight] {
            let sealed = aes_ccm_encrypt(&key, &nonce, &plaintext, mic).unwrap();
            assert_eq!(sealed.len(), plaintext.len() + mic.len());

            let opened = aes_ccm_decrypt(&key, &nonce, &sealed, mic).unwrap();
            assert_eq!(opened, plaintext);
        }
    }

    #[test]
    fn test_ccm_rejects_any_flipped_bit() {
        let key = key16("0953fa93e7caac9638f58820220a398e");
        let nonce: [u8; 13] = unhex("000307080d1234000012345677").try_into().unwrap();
        let plaintext = unhex("00000704050000");

        let sealed = aes_ccm_encrypt(&key, &nonce, &plaintext, MicSize::Four).unwrap();

        for byte in 0..sealed.len() {
            for bit in 0..8 {
                let mut corrupt = sealed.clone();
                corrupt[byte] ^= 1 << bit;
                assert!(
                    matches!(
                        aes_ccm_decrypt(&key, &nonce, &corrupt, MicSize::Four),
                        Err(MeshError::CryptoFailure)
                    ),
                    "flip of byte {} bit {} was accepted",
                    byte,
                    bit
                );
            }
        }
    }

    #[test]
    fn test_ccm_rejects_truncated_input() {
        let key = [0u8; 16];
        let nonce = [0u8; 13];

        assert!(matches!(
            aes_ccm_decrypt(&key, &nonce, &[0x01, 0x02], MicSize::Four),
            Err(MeshError::MalformedPdu(_))
        ));
    }
}
