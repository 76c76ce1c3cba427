//! The mesh PDU pipeline
//!
//! [`MeshProtocol`] owns the derived-key cache and the outbound sequence
//! counter and turns commands into complete proxy PDUs (and inbound proxy
//! PDUs back into access messages). It holds no transport state: every
//! outbound call returns the buffers to hand to the bearer, and inbound
//! notifications are pushed through [`MeshProtocol::process_proxy_pdu`].

use super::constants::*;
use super::network::NetworkPdu;
use super::nonce::{application_nonce, device_nonce};
use super::proxy::ProxyPdu;
use super::transport::{
    segmented_access_header, split_segments, unsegmented_access_header, LowerTransportPdu,
};
use crate::crypto::{aes_ccm_decrypt, aes_ccm_encrypt, MicSize};
use crate::error::{MeshError, MeshResult};
use crate::keys::{DerivedKeys, KeyStoreHandle, NetworkCredentials};
use crate::sidus::{SidusCommand, SIDUS_VENDOR_OPCODE};
use log::{debug, trace, warn};

/// A message recovered from an inbound proxy PDU
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// Decrypted access message; `akf` tells whether the AppKey (true)
    /// or the sender's DeviceKey (false) opened it
    Access {
        src: u16,
        dst: u16,
        payload: Vec<u8>,
        akf: bool,
    },
    /// CTL=1 control message, e.g. a Filter Status
    Control {
        src: u16,
        opcode: u8,
        parameters: Vec<u8>,
    },
}

/// The mesh protocol engine
///
/// Single-threaded by design: all state mutation (sequence counter,
/// derived keys) happens on whichever task owns the value.
pub struct MeshProtocol {
    key_store: KeyStoreHandle,
    credentials: NetworkCredentials,
    keys: DerivedKeys,
    sequence: u32,
    source_address: u16,
    default_ttl: u8,
}

impl MeshProtocol {
    /// Build a pipeline over the credentials currently in the store
    pub fn new(key_store: KeyStoreHandle) -> Self {
        let credentials = key_store.credentials();
        let keys = DerivedKeys::derive(&credentials);

        Self {
            key_store,
            credentials,
            keys,
            sequence: INITIAL_SEQUENCE,
            source_address: CONTROLLER_ADDRESS,
            default_ttl: DEFAULT_TTL,
        }
    }

    /// The cached derived keys
    pub fn derived_keys(&self) -> &DerivedKeys {
        &self.keys
    }

    /// The credential snapshot the pipeline is running on
    pub fn credentials(&self) -> &NetworkCredentials {
        &self.credentials
    }

    /// The controller's source address (0x0001 unless reassigned)
    pub fn source_address(&self) -> u16 {
        self.source_address
    }

    pub fn set_source_address(&mut self, address: u16) {
        self.source_address = address;
    }

    /// Next sequence number the pipeline would issue
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    #[cfg(test)]
    pub(crate) fn set_sequence(&mut self, sequence: u32) {
        self.sequence = sequence;
    }

    /// Re-read the credential store and rebuild the derived keys if the
    /// credentials changed
    pub fn refresh_credentials(&mut self) {
        let credentials = self.key_store.credentials();
        if credentials != self.credentials {
            debug!("credentials changed, rederiving network keys");
            self.credentials = credentials;
            self.keys = DerivedKeys::derive(&credentials);
        }
    }

    /// Reserve `count` consecutive sequence numbers, returning the first
    ///
    /// The block is committed atomically relative to any other outbound
    /// message; a would-be 24-bit wrap fails hard instead.
    fn allocate_sequence(&mut self, count: u32) -> MeshResult<u32> {
        let first = self.sequence;
        let last = first
            .checked_add(count - 1)
            .filter(|last| *last <= SEQUENCE_MAX)
            .ok_or(MeshError::CounterExhausted)?;
        self.sequence = last + 1;
        Ok(first)
    }

    /// Build the proxy PDU for one Sidus command
    ///
    /// The access message carries the full 3-byte vendor opcode plus the
    /// Sidus sub-opcode ahead of the 10-byte payload.
    pub fn sidus_command_pdu(&mut self, dst: u16, command: &SidusCommand) -> MeshResult<Vec<u8>> {
        let mut access = SIDUS_VENDOR_OPCODE.to_vec();
        access.extend_from_slice(&command.encode());

        self.application_access_pdu(dst, self.default_ttl, &access)
    }

    /// Build the proxy PDU for a standard SIG-model message
    ///
    /// The access message (opcode plus parameters) must fit an
    /// unsegmented application-key PDU.
    pub fn sig_message_pdu(
        &mut self,
        dst: u16,
        ttl: u8,
        opcode: &[u8],
        parameters: &[u8],
    ) -> MeshResult<Vec<u8>> {
        if opcode.is_empty() || opcode.len() > 3 {
            return Err(MeshError::MalformedPdu(
                "SIG opcode must be 1 to 3 bytes".into(),
            ));
        }

        let mut access = opcode.to_vec();
        access.extend_from_slice(parameters);
        if access.len() > MAX_UNSEGMENTED_SIG_ACCESS {
            return Err(MeshError::MalformedPdu(format!(
                "{}-byte access message does not fit an unsegmented PDU",
                access.len()
            )));
        }

        self.application_access_pdu(dst, ttl, &access)
    }

    fn application_access_pdu(
        &mut self,
        dst: u16,
        ttl: u8,
        access: &[u8],
    ) -> MeshResult<Vec<u8>> {
        let seq = self.allocate_sequence(1)?;
        let nonce = application_nonce(seq, self.source_address, dst, self.credentials.iv_index);
        let upper = aes_ccm_encrypt(&self.credentials.app_key, &nonce, access, MicSize::Four)?;

        let mut transport = Vec::with_capacity(1 + upper.len());
        transport.push(unsegmented_access_header(true, self.keys.aid));
        transport.extend_from_slice(&upper);

        let network = NetworkPdu {
            ctl: false,
            ttl,
            seq,
            src: self.source_address,
            dst,
            transport_pdu: transport,
        }
        .seal(&self.keys, self.credentials.iv_index)?;

        trace!("outbound access pdu: {}", hex::encode(&network));
        Ok(ProxyPdu::frame(PROXY_TYPE_NETWORK_PDU, &network))
    }

    /// Build the proxy PDUs for a device-key (configuration) message
    ///
    /// Short messages go out unsegmented; anything whose encrypted access
    /// payload exceeds 15 bytes is split into 12-byte segments, each a
    /// complete proxy PDU consuming its own sequence number. The access
    /// layer is encrypted against the first sequence number of the block
    /// (SZMIC=0).
    pub fn device_key_message_pdus(&mut self, dst: u16, access: &[u8]) -> MeshResult<Vec<Vec<u8>>> {
        let device_key = self
            .key_store
            .device_key(dst)
            .ok_or(MeshError::UnknownDeviceKey(dst))?;
        let iv_index = self.credentials.iv_index;

        let encrypted_len = access.len() + MicSize::Four.len();
        if encrypted_len <= MAX_UNSEGMENTED_DEVICE_PAYLOAD {
            let seq = self.allocate_sequence(1)?;
            let nonce = device_nonce(seq, self.source_address, dst, iv_index);
            let upper = aes_ccm_encrypt(&device_key, &nonce, access, MicSize::Four)?;

            let mut transport = Vec::with_capacity(1 + upper.len());
            transport.push(unsegmented_access_header(false, 0));
            transport.extend_from_slice(&upper);

            let network = NetworkPdu {
                ctl: false,
                ttl: self.default_ttl,
                seq,
                src: self.source_address,
                dst,
                transport_pdu: transport,
            }
            .seal(&self.keys, iv_index)?;

            return Ok(vec![ProxyPdu::frame(PROXY_TYPE_NETWORK_PDU, &network)]);
        }

        let segment_count = (encrypted_len + SEGMENT_SIZE - 1) / SEGMENT_SIZE;
        let first_seq = self.allocate_sequence(segment_count as u32)?;

        let nonce = device_nonce(first_seq, self.source_address, dst, iv_index);
        let upper = aes_ccm_encrypt(&device_key, &nonce, access, MicSize::Four)?;

        let seq_zero = (first_seq & 0x1FFF) as u16;
        let segments = split_segments(&upper);
        let seg_n = (segments.len() - 1) as u8;

        let mut pdus = Vec::with_capacity(segments.len());
        for (seg_o, segment) in segments.iter().enumerate() {
            let header =
                segmented_access_header(false, 0, false, seq_zero, seg_o as u8, seg_n);

            let mut transport = header.to_vec();
            transport.extend_from_slice(segment);

            let network = NetworkPdu {
                ctl: false,
                ttl: self.default_ttl,
                seq: first_seq + seg_o as u32,
                src: self.source_address,
                dst,
                transport_pdu: transport,
            }
            .seal(&self.keys, iv_index)?;

            pdus.push(ProxyPdu::frame(PROXY_TYPE_NETWORK_PDU, &network));
        }

        debug!(
            "segmented device-key message to {:#06X}: {} segments from seq {:#08X}",
            dst,
            pdus.len(),
            first_seq
        );
        Ok(pdus)
    }

    /// Build the proxy filter setup PDU for a fresh proxy session
    ///
    /// Sets the filter to blacklist (accept-all) so the peer forwards
    /// traffic; must be written before any access-layer command, since
    /// the default empty whitelist drops everything.
    pub fn proxy_filter_setup_pdu(&mut self) -> MeshResult<Vec<u8>> {
        let seq = self.allocate_sequence(1)?;

        let network = NetworkPdu {
            ctl: true,
            ttl: 0,
            seq,
            src: self.source_address,
            dst: UNASSIGNED_ADDRESS,
            transport_pdu: vec![FILTER_SET_TYPE_OPCODE, FILTER_TYPE_BLACKLIST],
        }
        .seal(&self.keys, self.credentials.iv_index)?;

        Ok(ProxyPdu::frame(PROXY_TYPE_PROXY_CONFIG, &network))
    }

    /// Deobfuscate, decrypt and dispatch one inbound proxy PDU
    pub fn process_proxy_pdu(&mut self, data: &[u8]) -> MeshResult<InboundMessage> {
        if data.len() < MIN_PROXY_NETWORK_PDU {
            return Err(MeshError::MalformedPdu(format!(
                "inbound proxy PDU too short: {} bytes",
                data.len()
            )));
        }

        let proxy = ProxyPdu::parse(data)?;
        match proxy.message_type {
            // 0x00 is normative; 0x01 and filter responses under 0x02 are
            // seen in the field and carry network PDUs all the same.
            PROXY_TYPE_NETWORK_PDU | PROXY_TYPE_MESH_BEACON | PROXY_TYPE_PROXY_CONFIG => {}
            other => {
                return Err(MeshError::MalformedPdu(format!(
                    "unsupported proxy message type {:#04X}",
                    other
                )));
            }
        }

        let iv_index = self.credentials.iv_index;
        let network = NetworkPdu::open(&proxy.payload, &self.keys, iv_index)?;

        match LowerTransportPdu::parse(network.ctl, &network.transport_pdu)? {
            LowerTransportPdu::Control { opcode, parameters } => {
                debug!(
                    "control message from {:#06X}: opcode {:#04X} {}",
                    network.src,
                    opcode,
                    hex::encode(&parameters)
                );
                Ok(InboundMessage::Control {
                    src: network.src,
                    opcode,
                    parameters,
                })
            }
            LowerTransportPdu::SegmentedAccess { seg_o, seg_n, .. } => {
                Err(MeshError::MalformedPdu(format!(
                    "segmented inbound access message ({}/{}) is not supported",
                    seg_o, seg_n
                )))
            }
            LowerTransportPdu::UnsegmentedAccess {
                akf: true,
                aid,
                upper_transport,
            } => {
                if aid != self.keys.aid {
                    warn!(
                        "inbound AID {:#04X} does not match derived AID {:#04X}",
                        aid, self.keys.aid
                    );
                }
                let nonce =
                    application_nonce(network.seq, network.src, network.dst, iv_index);
                let payload =
                    aes_ccm_decrypt(&self.credentials.app_key, &nonce, &upper_transport, MicSize::Four)?;

                Ok(InboundMessage::Access {
                    src: network.src,
                    dst: network.dst,
                    payload,
                    akf: true,
                })
            }
            LowerTransportPdu::UnsegmentedAccess {
                akf: false,
                upper_transport,
                ..
            } => {
                let device_key = self
                    .key_store
                    .device_key(network.src)
                    .ok_or(MeshError::UnknownDeviceKey(network.src))?;
                let nonce = device_nonce(network.seq, network.src, network.dst, iv_index);
                let payload =
                    aes_ccm_decrypt(&device_key, &nonce, &upper_transport, MicSize::Four)?;

                Ok(InboundMessage::Access {
                    src: network.src,
                    dst: network.dst,
                    payload,
                    akf: false,
                })
            }
        }
    }
}
