//! GATT proxy PDU framing
//!
//! Every buffer exchanged over the proxy characteristics is
//! `header(1) || payload` where the header packs the SAR field and the
//! message type. This engine emits SAR=complete only; inbound PDUs are
//! expected complete as well (the field MTUs comfortably hold every PDU
//! this protocol produces).

use super::constants::*;
use crate::error::{MeshError, MeshResult};

/// Parsed proxy PDU envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyPdu {
    pub sar: u8,
    pub message_type: u8,
    pub payload: Vec<u8>,
}

impl ProxyPdu {
    /// Frame a complete payload of the given message type
    pub fn frame(message_type: u8, payload: &[u8]) -> Vec<u8> {
        let mut pdu = Vec::with_capacity(1 + payload.len());
        pdu.push(PROXY_SAR_COMPLETE << 6 | message_type & 0x3F);
        pdu.extend_from_slice(payload);
        pdu
    }

    /// Split a received buffer into its envelope
    pub fn parse(data: &[u8]) -> MeshResult<Self> {
        if data.len() < 2 {
            return Err(MeshError::MalformedPdu(format!(
                "proxy PDU too short: {} bytes",
                data.len()
            )));
        }

        Ok(Self {
            sar: data[0] >> 6,
            message_type: data[0] & 0x3F,
            payload: data[1..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_and_parse() {
        let framed = ProxyPdu::frame(PROXY_TYPE_PROXY_CONFIG, &[0xAB, 0xCD]);
        assert_eq!(framed[0], 0x02);

        let parsed = ProxyPdu::parse(&framed).unwrap();
        assert_eq!(parsed.sar, PROXY_SAR_COMPLETE);
        assert_eq!(parsed.message_type, PROXY_TYPE_PROXY_CONFIG);
        assert_eq!(parsed.payload, vec![0xAB, 0xCD]);
    }

    #[test]
    fn test_short_buffer_rejected() {
        assert!(ProxyPdu::parse(&[0x00]).is_err());
    }
}
