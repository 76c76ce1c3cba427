//! Nonce construction for the three CCM contexts
//!
//! All nonces are exactly 13 bytes; multi-byte fields are big-endian.

use byteorder::{BigEndian, WriteBytesExt};
use std::io::Cursor;

const NONCE_TYPE_NETWORK: u8 = 0x00;
const NONCE_TYPE_APPLICATION: u8 = 0x01;
const NONCE_TYPE_DEVICE: u8 = 0x02;

/// Application nonce: AppKey access-layer encryption
pub fn application_nonce(seq: u32, src: u16, dst: u16, iv_index: u32) -> [u8; 13] {
    access_nonce(NONCE_TYPE_APPLICATION, seq, src, dst, iv_index)
}

/// Device nonce: DeviceKey access-layer encryption
pub fn device_nonce(seq: u32, src: u16, dst: u16, iv_index: u32) -> [u8; 13] {
    access_nonce(NONCE_TYPE_DEVICE, seq, src, dst, iv_index)
}

/// Network nonce: network-layer encryption; carries CTL/TTL instead of a
/// destination
pub fn network_nonce(ctl: bool, ttl: u8, seq: u32, src: u16, iv_index: u32) -> [u8; 13] {
    let mut nonce = [0u8; 13];
    let mut cursor = Cursor::new(&mut nonce[..]);

    cursor.write_u8(NONCE_TYPE_NETWORK).unwrap();
    cursor
        .write_u8((u8::from(ctl)) << 7 | (ttl & 0x7F))
        .unwrap();
    cursor.write_u24::<BigEndian>(seq & 0xFF_FFFF).unwrap();
    cursor.write_u16::<BigEndian>(src).unwrap();
    cursor.write_u16::<BigEndian>(0x0000).unwrap();
    cursor.write_u32::<BigEndian>(iv_index).unwrap();

    nonce
}

fn access_nonce(nonce_type: u8, seq: u32, src: u16, dst: u16, iv_index: u32) -> [u8; 13] {
    let mut nonce = [0u8; 13];
    let mut cursor = Cursor::new(&mut nonce[..]);

    cursor.write_u8(nonce_type).unwrap();
    cursor.write_u8(0x00).unwrap(); // ASZMIC and padding
    cursor.write_u24::<BigEndian>(seq & 0xFF_FFFF).unwrap();
    cursor.write_u16::<BigEndian>(src).unwrap();
    cursor.write_u16::<BigEndian>(dst).unwrap();
    cursor.write_u32::<BigEndian>(iv_index).unwrap();

    nonce
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_nonce_layout() {
        let nonce = application_nonce(0x010203, 0x0001, 0xC000, 0x1234_5678);

        assert_eq!(
            nonce,
            [0x01, 0x00, 0x01, 0x02, 0x03, 0x00, 0x01, 0xC0, 0x00, 0x12, 0x34, 0x56, 0x78]
        );
    }

    #[test]
    fn test_device_nonce_differs_only_in_type() {
        let app = application_nonce(7, 1, 2, 3);
        let dev = device_nonce(7, 1, 2, 3);

        assert_eq!(app[1..], dev[1..]);
        assert_eq!(app[0], 0x01);
        assert_eq!(dev[0], 0x02);
    }

    #[test]
    fn test_network_nonce_layout() {
        let nonce = network_nonce(true, 0, 0x000001, 0x0001, 0);

        assert_eq!(nonce[0], 0x00);
        assert_eq!(nonce[1], 0x80); // CTL set, TTL 0
        assert_eq!(nonce[7..9], [0x00, 0x00]); // padding, not DST
    }
}
