//! Configuration model message codecs
//!
//! Device-key encrypted messages of the Configuration Server model:
//! AppKey Add, Model App Bind, Model Publication Set, and the status
//! answers each of them elicits. Key indices travel as two 12-bit values
//! packed into 3 octets; element addresses, key indices and model
//! identifiers are little-endian.

use super::constants::*;
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Cursor;

/// SIG or vendor model identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelId {
    /// 2-byte SIG model
    Sig(u16),
    /// 4-byte vendor model: company identifier then model identifier
    Vendor { company: u16, model: u16 },
}

impl ModelId {
    /// The Sidus vendor light model
    pub fn sidus() -> Self {
        ModelId::Vendor {
            company: SIDUS_COMPANY_ID,
            model: SIDUS_VENDOR_MODEL_ID,
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        match *self {
            ModelId::Sig(model) => out.extend_from_slice(&model.to_le_bytes()),
            ModelId::Vendor { company, model } => {
                out.extend_from_slice(&company.to_le_bytes());
                out.extend_from_slice(&model.to_le_bytes());
            }
        }
    }

    fn parse(data: &[u8]) -> Option<Self> {
        match data.len() {
            2 => Some(ModelId::Sig(u16::from_le_bytes([data[0], data[1]]))),
            4 => Some(ModelId::Vendor {
                company: u16::from_le_bytes([data[0], data[1]]),
                model: u16::from_le_bytes([data[2], data[3]]),
            }),
            _ => None,
        }
    }
}

/// Pack a NetKeyIndex and an AppKeyIndex into the 3-octet wire form
///
/// The 24-bit value is `app << 12 | net`, little-endian on the wire.
pub fn pack_key_indices(net_key_index: u16, app_key_index: u16) -> [u8; 3] {
    [
        (net_key_index & 0xFF) as u8,
        ((net_key_index >> 8) & 0x0F) as u8 | ((app_key_index & 0x0F) << 4) as u8,
        (app_key_index >> 4) as u8,
    ]
}

/// Inverse of [`pack_key_indices`]
pub fn unpack_key_indices(data: &[u8; 3]) -> (u16, u16) {
    let net = u16::from(data[0]) | (u16::from(data[1]) & 0x0F) << 8;
    let app = u16::from(data[1]) >> 4 | u16::from(data[2]) << 4;
    (net, app)
}

/// Config AppKey Add (opcode 0x00)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigAppKeyAdd {
    pub net_key_index: u16,
    pub app_key_index: u16,
    pub app_key: [u8; 16],
}

impl ConfigAppKeyAdd {
    /// Serialize into an access payload
    pub fn to_access_payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(20);
        out.push(CONFIG_APPKEY_ADD_OPCODE);
        out.extend_from_slice(&pack_key_indices(self.net_key_index, self.app_key_index));
        out.extend_from_slice(&self.app_key);
        out
    }
}

/// Config Model App Bind (opcode 0x80 0x3D)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigModelAppBind {
    /// Element address; for single-element lights this equals the node's
    /// unicast address
    pub element_address: u16,
    pub app_key_index: u16,
    pub model: ModelId,
}

impl ConfigModelAppBind {
    /// Serialize into an access payload
    pub fn to_access_payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(10);
        out.extend_from_slice(&CONFIG_MODEL_APP_BIND_OPCODE);

        let mut fields = [0u8; 4];
        let mut cursor = Cursor::new(&mut fields[..]);
        cursor.write_u16::<LittleEndian>(self.element_address).unwrap();
        cursor.write_u16::<LittleEndian>(self.app_key_index).unwrap();
        out.extend_from_slice(&fields);

        self.model.write(&mut out);
        out
    }
}

/// Config Model Publication Set (opcode 0x03)
///
/// Used to point the vendor model's status publications back at the
/// controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigModelPublicationSet {
    pub element_address: u16,
    pub publish_address: u16,
    pub app_key_index: u16,
    pub publish_ttl: u8,
    pub publish_period: u8,
    pub retransmit: u8,
    pub model: ModelId,
}

impl ConfigModelPublicationSet {
    /// Serialize into an access payload
    pub fn to_access_payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(14);
        out.push(CONFIG_MODEL_PUBLICATION_SET_OPCODE);

        let mut fields = [0u8; 6];
        let mut cursor = Cursor::new(&mut fields[..]);
        cursor.write_u16::<LittleEndian>(self.element_address).unwrap();
        cursor.write_u16::<LittleEndian>(self.publish_address).unwrap();
        // AppKeyIndex in the low 12 bits, CredentialFlag and RFU clear.
        cursor
            .write_u16::<LittleEndian>(self.app_key_index & 0x0FFF)
            .unwrap();
        out.extend_from_slice(&fields);

        out.push(self.publish_ttl);
        out.push(self.publish_period);
        out.push(self.retransmit);
        self.model.write(&mut out);
        out
    }
}

/// A parsed Config Status answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigStatusMessage {
    /// AppKey Status (opcode 0x80 0x03)
    AppKey {
        status: u8,
        net_key_index: u16,
        app_key_index: u16,
    },
    /// Model App Status (opcode 0x80 0x3E)
    ModelApp {
        status: u8,
        element_address: u16,
        app_key_index: u16,
        model: ModelId,
    },
    /// Model Publication Status (opcode 0x80 0x19)
    ModelPublication {
        status: u8,
        element_address: u16,
        publish_address: u16,
    },
}

impl ConfigStatusMessage {
    /// Parse an inbound device-key access payload as a status answer
    ///
    /// Returns `None` for payloads that are no status message at all, so
    /// callers can ignore unrelated traffic.
    pub fn parse(access: &[u8]) -> Option<Self> {
        if access.len() < 2 {
            return None;
        }

        if access[..2] == CONFIG_APPKEY_STATUS_OPCODE {
            let params = &access[2..];
            if params.len() < 4 {
                return None;
            }
            let packed: [u8; 3] = params[1..4].try_into().unwrap();
            let (net_key_index, app_key_index) = unpack_key_indices(&packed);
            return Some(ConfigStatusMessage::AppKey {
                status: params[0],
                net_key_index,
                app_key_index,
            });
        }

        if access[..2] == CONFIG_MODEL_APP_STATUS_OPCODE {
            let params = &access[2..];
            if params.len() < 7 {
                return None;
            }
            let model = ModelId::parse(&params[5..])?;
            return Some(ConfigStatusMessage::ModelApp {
                status: params[0],
                element_address: u16::from_le_bytes([params[1], params[2]]),
                app_key_index: u16::from_le_bytes([params[3], params[4]]),
                model,
            });
        }

        if access[..2] == CONFIG_MODEL_PUBLICATION_STATUS_OPCODE {
            let params = &access[2..];
            if params.len() < 5 {
                return None;
            }
            return Some(ConfigStatusMessage::ModelPublication {
                status: params[0],
                element_address: u16::from_le_bytes([params[1], params[2]]),
                publish_address: u16::from_le_bytes([params[3], params[4]]),
            });
        }

        None
    }

    /// The status code the device answered with
    pub fn status(&self) -> u8 {
        match *self {
            ConfigStatusMessage::AppKey { status, .. }
            | ConfigStatusMessage::ModelApp { status, .. }
            | ConfigStatusMessage::ModelPublication { status, .. } => status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_index_packing_round_trip() {
        for (net, app) in [(0, 0), (0x123, 0x456), (0xFFF, 0xFFF), (1, 0x800)] {
            let packed = pack_key_indices(net, app);
            assert_eq!(unpack_key_indices(&packed), (net, app));
        }
    }

    #[test]
    fn test_appkey_add_payload_shape() {
        let message = ConfigAppKeyAdd {
            net_key_index: 0,
            app_key_index: 0,
            app_key: [0x63; 16],
        };
        let payload = message.to_access_payload();

        assert_eq!(payload.len(), 20);
        assert_eq!(payload[0], CONFIG_APPKEY_ADD_OPCODE);
        assert_eq!(payload[1..4], [0x00, 0x00, 0x00]);
        assert_eq!(payload[4..], [0x63; 16]);
    }

    #[test]
    fn test_model_app_bind_vendor_payload_shape() {
        let message = ConfigModelAppBind {
            element_address: 0x0002,
            app_key_index: 0,
            model: ModelId::sidus(),
        };
        let payload = message.to_access_payload();

        assert_eq!(payload.len(), 10);
        assert_eq!(payload[..2], CONFIG_MODEL_APP_BIND_OPCODE);
        assert_eq!(payload[2..4], [0x02, 0x00]); // element, LE
        assert_eq!(payload[6..8], [0x11, 0x02]); // company 0x0211, LE
        assert_eq!(payload[8..10], [0xC0, 0x00]); // model 0x00C0, LE
    }

    #[test]
    fn test_status_parse_round_trip() {
        let mut appkey_status = CONFIG_APPKEY_STATUS_OPCODE.to_vec();
        appkey_status.push(0x00);
        appkey_status.extend_from_slice(&pack_key_indices(0x001, 0x002));
        assert_eq!(
            ConfigStatusMessage::parse(&appkey_status),
            Some(ConfigStatusMessage::AppKey {
                status: 0x00,
                net_key_index: 0x001,
                app_key_index: 0x002,
            })
        );

        let mut bind_status = CONFIG_MODEL_APP_STATUS_OPCODE.to_vec();
        bind_status.push(0x00);
        bind_status.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x11, 0x02, 0xC0, 0x00]);
        assert_eq!(
            ConfigStatusMessage::parse(&bind_status),
            Some(ConfigStatusMessage::ModelApp {
                status: 0x00,
                element_address: 0x0002,
                app_key_index: 0x0000,
                model: ModelId::sidus(),
            })
        );

        assert_eq!(ConfigStatusMessage::parse(&[0x82, 0x04, 0x00]), None);
        assert_eq!(ConfigStatusMessage::parse(&[0x80]), None);
    }
}
