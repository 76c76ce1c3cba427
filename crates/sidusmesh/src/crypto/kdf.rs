//! Mesh key derivation functions (Mesh Profile 3.8.2)
//!
//! All derivations bottom out in AES-CMAC. The string salts ("smk2",
//! "smk3", "smk4", "id6", "id64") are ASCII literals with no trailing NUL.

use super::aes::aes_cmac;

const ZERO_KEY: [u8; 16] = [0u8; 16];

/// s1 salt generation: `AES-CMAC(0^16, m)`
pub fn s1(m: &[u8]) -> [u8; 16] {
    aes_cmac(&ZERO_KEY, m)
}

/// k1 derivation: `AES-CMAC(AES-CMAC(salt, n), p)`
///
/// Used for the provisioning confirmation key ("prck"), session key
/// ("prsk"), session nonce ("prsn") and device key ("prdk").
pub fn k1(n: &[u8], salt: &[u8; 16], p: &[u8]) -> [u8; 16] {
    let t = aes_cmac(salt, n);
    aes_cmac(&t, p)
}

/// k2 network derivation: `(NID, EncryptionKey, PrivacyKey)`
///
/// The master credentials use `p = [0x00]`. NID is 7 bits wide; the top
/// bit of the returned byte is always clear.
pub fn k2(n: &[u8; 16], p: &[u8]) -> (u8, [u8; 16], [u8; 16]) {
    let salt = s1(b"smk2");
    let t = aes_cmac(&salt, n);

    let t1 = aes_cmac(&t, &[p, &[0x01]].concat());
    let t2 = aes_cmac(&t, &[&t1[..], p, &[0x02]].concat());
    let t3 = aes_cmac(&t, &[&t2[..], p, &[0x03]].concat());

    (t1[15] & 0x7F, t2, t3)
}

/// k3 derivation: the 64-bit Network ID advertised by provisioned nodes
pub fn k3(n: &[u8; 16]) -> [u8; 8] {
    let salt = s1(b"smk3");
    let t = aes_cmac(&salt, n);
    let out = aes_cmac(&t, b"id64\x01");

    out[8..16].try_into().unwrap()
}

/// k4 derivation: the 6-bit application key identifier (AID)
pub fn k4(n: &[u8; 16]) -> u8 {
    let salt = s1(b"smk4");
    let t = aes_cmac(&salt, n);
    let out = aes_cmac(&t, b"id6\x01");

    out[15] & 0x3F
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key16(s: &str) -> [u8; 16] {
        hex::decode(s).unwrap().try_into().unwrap()
    }

    #[test]
    fn test_s1_sample_vector() {
        // Mesh Profile 8.1.1
        assert_eq!(s1(b"test"), key16("b73cefbd641ef2ea598c2b6efb62f79c"));
    }

    #[test]
    fn test_k1_sample_vector() {
        // Mesh Profile 8.1.3
        let n = hex::decode("3216d1509884b533248541792b877f98").unwrap();
        let salt = key16("2ba14ffa0df84a2831938d57d276cab4");
        let p = hex::decode("5a09d60797eeb4478aada59db3352a0d").unwrap();

        assert_eq!(k1(&n, &salt, &p), key16("f6ed15a8934afbe7d83e8dcb57fcf5d7"));
    }

    #[test]
    fn test_k2_master_sample_vector() {
        // Mesh Profile 8.1.4: master security credentials
        let n = key16("f7a2a44f8e8a8029064f173ddc1e2b00");
        let (nid, enc, priv_key) = k2(&n, &[0x00]);

        assert_eq!(nid, 0x7F);
        assert_eq!(enc, key16("9f589181a0f50de73c8070c7a6d27f46"));
        assert_eq!(priv_key, key16("4c715bd4a64b938f99b453351653124f"));
    }

    #[test]
    fn test_k2_is_deterministic_with_clear_high_bit() {
        let n = key16("7dd7364cd842ad18c17c7465746c696e");

        let first = k2(&n, &[0x00]);
        let second = k2(&n, &[0x00]);

        assert_eq!(first, second);
        assert_eq!(first.0 & 0x80, 0);
    }

    #[test]
    fn test_k3_sample_vector() {
        // Mesh Profile 8.1.5
        let n = key16("f7a2a44f8e8a8029064f173ddc1e2b00");
        assert_eq!(k3(&n), hex::decode("ff046958233db014").unwrap()[..]);
    }

    #[test]
    fn test_k4_sample_vector() {
        // Mesh Profile 8.1.6
        let n = key16("3216d1509884b533248541792b877f98");
        assert_eq!(k4(&n), 0x38);
    }
}
