//! Provisioning PDU codecs
//!
//! A provisioning PDU is `type(1) || parameters`, carried inside a proxy
//! PDU of type Provisioning over the 2ADB/2ADC characteristics.

use super::constants::*;
use crate::error::{MeshError, MeshResult};
use bitflags::bitflags;
use byteorder::{BigEndian, ReadBytesExt};
use std::io::Cursor;

bitflags! {
    /// Algorithms bitmap of the Capabilities PDU
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Algorithms: u16 {
        const FIPS_P256 = 0x0001;
    }
}

bitflags! {
    /// Static OOB bitmap of the Capabilities PDU
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StaticOobType: u8 {
        const STATIC_OOB_AVAILABLE = 0x01;
    }
}

/// Parsed Capabilities PDU parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub num_elements: u8,
    pub algorithms: Algorithms,
    pub public_key_type: u8,
    pub static_oob_type: StaticOobType,
    pub output_oob_size: u8,
    pub output_oob_action: u16,
    pub input_oob_size: u8,
    pub input_oob_action: u16,
}

impl Capabilities {
    /// Parse the 11 parameter bytes of a Capabilities PDU
    pub fn parse(params: &[u8]) -> MeshResult<Self> {
        if params.len() < CAPABILITIES_PARAMS_LEN {
            return Err(MeshError::MalformedPdu(format!(
                "capabilities PDU carries {} parameter bytes",
                params.len()
            )));
        }

        let mut cursor = Cursor::new(params);
        let num_elements = cursor.read_u8().unwrap();
        let algorithms = Algorithms::from_bits_retain(cursor.read_u16::<BigEndian>().unwrap());
        let public_key_type = cursor.read_u8().unwrap();
        let static_oob_type = StaticOobType::from_bits_retain(cursor.read_u8().unwrap());
        let output_oob_size = cursor.read_u8().unwrap();
        let output_oob_action = cursor.read_u16::<BigEndian>().unwrap();
        let input_oob_size = cursor.read_u8().unwrap();
        let input_oob_action = cursor.read_u16::<BigEndian>().unwrap();

        Ok(Self {
            num_elements,
            algorithms,
            public_key_type,
            static_oob_type,
            output_oob_size,
            output_oob_action,
            input_oob_size,
            input_oob_action,
        })
    }

    /// Whether the device can run the FIPS P-256 flow at all
    pub fn supports_p256(&self) -> bool {
        self.algorithms.contains(Algorithms::FIPS_P256)
    }
}

/// A parsed inbound provisioning PDU
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningPdu {
    /// Capabilities with both the parsed view and the raw parameter
    /// bytes (the raw form feeds the confirmation inputs)
    Capabilities {
        capabilities: Capabilities,
        raw_params: [u8; CAPABILITIES_PARAMS_LEN],
    },
    PublicKey {
        key: [u8; 64],
    },
    InputComplete,
    Confirmation {
        value: [u8; 16],
    },
    Random {
        value: [u8; 16],
    },
    Complete,
    Failed {
        error_code: u8,
    },
}

impl ProvisioningPdu {
    /// Parse an unframed provisioning PDU (`type || parameters`)
    pub fn parse(data: &[u8]) -> MeshResult<Self> {
        if data.is_empty() {
            return Err(MeshError::MalformedPdu("empty provisioning PDU".into()));
        }
        let params = &data[1..];

        match data[0] {
            PROVISIONING_PDU_CAPABILITIES => {
                let capabilities = Capabilities::parse(params)?;
                let raw_params: [u8; CAPABILITIES_PARAMS_LEN] =
                    params[..CAPABILITIES_PARAMS_LEN].try_into().unwrap();
                Ok(ProvisioningPdu::Capabilities {
                    capabilities,
                    raw_params,
                })
            }
            PROVISIONING_PDU_PUBLIC_KEY => {
                let key: [u8; 64] = params.try_into().map_err(|_| {
                    MeshError::MalformedPdu(format!(
                        "public key PDU carries {} parameter bytes",
                        params.len()
                    ))
                })?;
                Ok(ProvisioningPdu::PublicKey { key })
            }
            PROVISIONING_PDU_INPUT_COMPLETE => Ok(ProvisioningPdu::InputComplete),
            PROVISIONING_PDU_CONFIRMATION => {
                let value: [u8; 16] = params.try_into().map_err(|_| {
                    MeshError::MalformedPdu("confirmation PDU must carry 16 bytes".into())
                })?;
                Ok(ProvisioningPdu::Confirmation { value })
            }
            PROVISIONING_PDU_RANDOM => {
                let value: [u8; 16] = params.try_into().map_err(|_| {
                    MeshError::MalformedPdu("random PDU must carry 16 bytes".into())
                })?;
                Ok(ProvisioningPdu::Random { value })
            }
            PROVISIONING_PDU_COMPLETE => Ok(ProvisioningPdu::Complete),
            PROVISIONING_PDU_FAILED => {
                let error_code = params.first().copied().unwrap_or(0);
                Ok(ProvisioningPdu::Failed { error_code })
            }
            other => Err(MeshError::MalformedPdu(format!(
                "unknown provisioning PDU type {:#04X}",
                other
            ))),
        }
    }
}

/// Serialize an Invite PDU
pub fn invite_pdu(attention_duration: u8) -> Vec<u8> {
    vec![PROVISIONING_PDU_INVITE, attention_duration]
}

/// Serialize a Start PDU for the no-OOB P-256 flow
pub fn start_pdu() -> Vec<u8> {
    vec![
        PROVISIONING_PDU_START,
        START_ALGORITHM_P256,
        START_PUBLIC_KEY_NO_OOB,
        START_AUTH_METHOD_NO_OOB,
        0x00, // auth action
        0x00, // auth size
    ]
}

/// Serialize a PublicKey PDU
pub fn public_key_pdu(key: &[u8; 64]) -> Vec<u8> {
    let mut pdu = Vec::with_capacity(65);
    pdu.push(PROVISIONING_PDU_PUBLIC_KEY);
    pdu.extend_from_slice(key);
    pdu
}

/// Serialize a Confirmation PDU
pub fn confirmation_pdu(value: &[u8; 16]) -> Vec<u8> {
    let mut pdu = Vec::with_capacity(17);
    pdu.push(PROVISIONING_PDU_CONFIRMATION);
    pdu.extend_from_slice(value);
    pdu
}

/// Serialize a Random PDU
pub fn random_pdu(value: &[u8; 16]) -> Vec<u8> {
    let mut pdu = Vec::with_capacity(17);
    pdu.push(PROVISIONING_PDU_RANDOM);
    pdu.extend_from_slice(value);
    pdu
}

/// Serialize a Data PDU from the encrypted provisioning data
pub fn data_pdu(encrypted: &[u8]) -> Vec<u8> {
    let mut pdu = Vec::with_capacity(1 + encrypted.len());
    pdu.push(PROVISIONING_PDU_DATA);
    pdu.extend_from_slice(encrypted);
    pdu
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_parse() {
        let params = [0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let capabilities = Capabilities::parse(&params).unwrap();

        assert_eq!(capabilities.num_elements, 1);
        assert!(capabilities.supports_p256());
        assert_eq!(capabilities.public_key_type, 0);
        assert!(capabilities.static_oob_type.is_empty());
    }

    #[test]
    fn test_capabilities_without_p256() {
        let params = [0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert!(!Capabilities::parse(&params).unwrap().supports_p256());
    }

    #[test]
    fn test_short_capabilities_rejected() {
        assert!(Capabilities::parse(&[0x01, 0x00]).is_err());
    }

    #[test]
    fn test_pdu_parse_shapes() {
        assert_eq!(
            ProvisioningPdu::parse(&[PROVISIONING_PDU_COMPLETE]).unwrap(),
            ProvisioningPdu::Complete
        );
        assert_eq!(
            ProvisioningPdu::parse(&[PROVISIONING_PDU_FAILED, 0x07]).unwrap(),
            ProvisioningPdu::Failed { error_code: 0x07 }
        );

        let mut random = vec![PROVISIONING_PDU_RANDOM];
        random.extend_from_slice(&[0xAB; 16]);
        assert_eq!(
            ProvisioningPdu::parse(&random).unwrap(),
            ProvisioningPdu::Random { value: [0xAB; 16] }
        );

        assert!(ProvisioningPdu::parse(&[PROVISIONING_PDU_RANDOM, 0x01]).is_err());
        assert!(ProvisioningPdu::parse(&[]).is_err());
        assert!(ProvisioningPdu::parse(&[0x7F]).is_err());
    }

    #[test]
    fn test_outbound_pdu_shapes() {
        assert_eq!(invite_pdu(0x00), vec![0x00, 0x00]);
        assert_eq!(start_pdu(), vec![0x02, 0x00, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(public_key_pdu(&[0x11; 64]).len(), 65);
        assert_eq!(confirmation_pdu(&[0x22; 16])[0], 0x05);
        assert_eq!(random_pdu(&[0x33; 16])[0], 0x06);
        assert_eq!(data_pdu(&[0x44; 33]).len(), 34);
    }
}
