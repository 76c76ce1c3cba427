//! Network-layer PDU sealing and opening
//!
//! A network PDU is `(ivi<<7 | nid) || obfuscated_header(6) ||
//! encrypted(dst || lower_transport) || NetMIC`. The 6-byte header
//! (CTL/TTL, SEQ, SRC) is XORed with a PECB derived from the PrivacyKey,
//! the IV index and the first 7 bytes of the encrypted payload, so the
//! same transform both obfuscates and deobfuscates.

use super::nonce::network_nonce;
use crate::crypto::{aes_ccm_decrypt, aes_ccm_encrypt, aes_ecb_encrypt, MicSize};
use crate::error::{MeshError, MeshResult};
use crate::keys::DerivedKeys;
use byteorder::{BigEndian, ByteOrder};
use log::warn;

/// One network PDU in the clear
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkPdu {
    /// Control flag; selects the 8-byte NetMIC and the control transport
    pub ctl: bool,
    pub ttl: u8,
    pub seq: u32,
    pub src: u16,
    pub dst: u16,
    /// Lower transport PDU carried behind the destination
    pub transport_pdu: Vec<u8>,
}

impl NetworkPdu {
    /// Encrypt and obfuscate into wire bytes
    pub fn seal(&self, keys: &DerivedKeys, iv_index: u32) -> MeshResult<Vec<u8>> {
        let mic = if self.ctl {
            MicSize::Eight
        } else {
            MicSize::Four
        };
        let nonce = network_nonce(self.ctl, self.ttl, self.seq, self.src, iv_index);

        let mut plain = Vec::with_capacity(2 + self.transport_pdu.len());
        plain.extend_from_slice(&self.dst.to_be_bytes());
        plain.extend_from_slice(&self.transport_pdu);
        let encrypted = aes_ccm_encrypt(&keys.encryption_key, &nonce, &plain, mic)?;

        let mut header = [0u8; 6];
        header[0] = u8::from(self.ctl) << 7 | self.ttl & 0x7F;
        header[1..4].copy_from_slice(&self.seq.to_be_bytes()[1..4]);
        header[4..6].copy_from_slice(&self.src.to_be_bytes());
        let obfuscated = obfuscate_header(&header, &keys.privacy_key, iv_index, &encrypted);

        let ivi = (iv_index & 1) as u8;
        let mut pdu = Vec::with_capacity(7 + encrypted.len());
        pdu.push(ivi << 7 | keys.nid & 0x7F);
        pdu.extend_from_slice(&obfuscated);
        pdu.extend_from_slice(&encrypted);

        Ok(pdu)
    }

    /// Deobfuscate and decrypt wire bytes
    ///
    /// A NID mismatch is logged and decryption still attempted; a failed
    /// NetMIC is a hard [`MeshError::CryptoFailure`].
    pub fn open(data: &[u8], keys: &DerivedKeys, iv_index: u32) -> MeshResult<Self> {
        if data.len() < 14 {
            return Err(MeshError::MalformedPdu(format!(
                "network PDU too short: {} bytes",
                data.len()
            )));
        }

        let nid = data[0] & 0x7F;
        if nid != keys.nid {
            warn!(
                "inbound NID {:#04X} does not match derived NID {:#04X}, attempting decrypt anyway",
                nid, keys.nid
            );
        }

        let obfuscated: [u8; 6] = data[1..7].try_into().unwrap();
        let encrypted = &data[7..];
        let header = obfuscate_header(&obfuscated, &keys.privacy_key, iv_index, encrypted);

        let ctl = header[0] & 0x80 != 0;
        let ttl = header[0] & 0x7F;
        let seq = u32::from(header[1]) << 16 | u32::from(header[2]) << 8 | u32::from(header[3]);
        let src = u16::from_be_bytes([header[4], header[5]]);

        let mic = if ctl { MicSize::Eight } else { MicSize::Four };
        let nonce = network_nonce(ctl, ttl, seq, src, iv_index);
        let plain = aes_ccm_decrypt(&keys.encryption_key, &nonce, encrypted, mic)?;

        if plain.len() < 3 {
            return Err(MeshError::MalformedPdu(
                "decrypted network payload carries no transport PDU".into(),
            ));
        }

        let dst = BigEndian::read_u16(&plain[..2]);

        Ok(Self {
            ctl,
            ttl,
            seq,
            src,
            dst,
            transport_pdu: plain[2..].to_vec(),
        })
    }
}

/// XOR the 6-byte network header with the PECB
///
/// `PECB = AES-ECB(PrivacyKey, 0x0000000000 || ivIndex || privacyRandom)`
/// where the privacy random is the first 7 encrypted payload bytes. The
/// transform is its own inverse.
pub fn obfuscate_header(
    header: &[u8; 6],
    privacy_key: &[u8; 16],
    iv_index: u32,
    encrypted: &[u8],
) -> [u8; 6] {
    let mut block = [0u8; 16];
    block[5..9].copy_from_slice(&iv_index.to_be_bytes());
    block[9..16].copy_from_slice(&encrypted[..7]);
    let pecb = aes_ecb_encrypt(privacy_key, &block);

    let mut out = [0u8; 6];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = header[i] ^ pecb[i];
    }
    out
}
