//! Per-connection session driver
//!
//! A [`Session`] owns one GATT proxy bearer and the per-session state:
//! whether the proxy filter has been set up, and the configuration client
//! for a freshly connected node. It enforces the ordering rule that the
//! filter setup is written before any access-layer message, and applies
//! the recovery policy for inbound traffic: bad MICs, malformed PDUs and
//! unknown device keys are dropped with a diagnostic, while transport
//! errors propagate to the caller.

use crate::bearer::ProxyBearer;
use crate::config::{ConfigAction, ConfigClient};
use crate::error::{ConfigFailureCause, MeshError, MeshResult};
use crate::mesh::{InboundMessage, MeshProtocol};
use crate::sidus::SidusCommand;
use log::{debug, warn};
use std::time::Duration;

/// Something the session needs its host to act on or know about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A decrypted access message arrived
    Access {
        src: u16,
        dst: u16,
        payload: Vec<u8>,
        akf: bool,
    },
    /// A control message arrived (e.g. Filter Status)
    Control {
        src: u16,
        opcode: u8,
        parameters: Vec<u8>,
    },
    /// Arm the configuration response timer
    ConfigTimer(Duration),
    /// Disarm the configuration response timer
    ConfigCancelTimer,
    /// The configuration sequence finished successfully
    ConfigCompleted,
    /// A configuration step failed; commands may still work
    ConfigFailed {
        step: &'static str,
        cause: ConfigFailureCause,
    },
}

/// One open proxy session to a provisioned node
pub struct Session<B: ProxyBearer> {
    bearer: B,
    filter_sent: bool,
    config: Option<ConfigClient>,
}

impl<B: ProxyBearer> Session<B> {
    /// Wrap a freshly opened bearer
    pub fn new(bearer: B) -> Self {
        Self {
            bearer,
            filter_sent: false,
            config: None,
        }
    }

    /// Whether the proxy filter setup has been written on this session
    pub fn filter_sent(&self) -> bool {
        self.filter_sent
    }

    /// Write the filter setup if this session has not done so yet
    ///
    /// Called implicitly before the first access-layer write; the peer's
    /// default empty accept list would drop everything otherwise.
    pub fn ensure_filter(&mut self, protocol: &mut MeshProtocol) -> MeshResult<()> {
        if self.filter_sent {
            return Ok(());
        }
        let pdu = protocol.proxy_filter_setup_pdu()?;
        self.bearer.write(&pdu)?;
        self.filter_sent = true;
        Ok(())
    }

    /// Send one Sidus command to `dst`
    pub fn send_command(
        &mut self,
        protocol: &mut MeshProtocol,
        dst: u16,
        command: &SidusCommand,
    ) -> MeshResult<()> {
        self.ensure_filter(protocol)?;
        let pdu = protocol.sidus_command_pdu(dst, command)?;
        self.bearer.write(&pdu)
    }

    /// Send a SIG-model message to `dst`
    pub fn send_sig_message(
        &mut self,
        protocol: &mut MeshProtocol,
        dst: u16,
        ttl: u8,
        opcode: &[u8],
        parameters: &[u8],
    ) -> MeshResult<()> {
        self.ensure_filter(protocol)?;
        let pdu = protocol.sig_message_pdu(dst, ttl, opcode, parameters)?;
        self.bearer.write(&pdu)
    }

    /// Start the configuration sequence for the node at `target`
    ///
    /// With `publish_to` set, the vendor model is also pointed at that
    /// address for status publications.
    pub fn start_configuration(
        &mut self,
        protocol: &mut MeshProtocol,
        target: u16,
        publish_to: Option<u16>,
    ) -> MeshResult<Vec<SessionEvent>> {
        self.ensure_filter(protocol)?;

        let mut client = ConfigClient::new(target);
        if let Some(address) = publish_to {
            client = client.with_publication(address);
        }
        let actions = client.start(protocol)?;
        self.config = Some(client);
        self.apply_config_actions(actions)
    }

    /// The configuration response timer fired
    pub fn config_timeout(&mut self, protocol: &mut MeshProtocol) -> MeshResult<Vec<SessionEvent>> {
        let actions = match self.config.as_mut() {
            Some(client) => client.handle_timeout(protocol)?,
            None => Vec::new(),
        };
        self.apply_config_actions(actions)
    }

    /// Process one notification from the proxy Data Out characteristic
    ///
    /// In-band protocol errors are consumed here: the PDU is dropped and
    /// logged, and an empty event list returned. Device-key messages are
    /// offered to the running configuration client before being surfaced.
    pub fn process_notification(
        &mut self,
        protocol: &mut MeshProtocol,
        data: &[u8],
    ) -> MeshResult<Vec<SessionEvent>> {
        let inbound = match protocol.process_proxy_pdu(data) {
            Ok(inbound) => inbound,
            Err(MeshError::CryptoFailure) => {
                debug!("decrypt failed, dropping PDU");
                return Ok(Vec::new());
            }
            Err(MeshError::MalformedPdu(reason)) => {
                debug!("dropping malformed PDU: {}", reason);
                return Ok(Vec::new());
            }
            Err(MeshError::UnknownDeviceKey(src)) => {
                warn!("dropping device-key PDU from unknown source {:#06X}", src);
                return Ok(Vec::new());
            }
            Err(error) => return Err(error),
        };

        match inbound {
            InboundMessage::Access {
                src,
                dst,
                payload,
                akf,
            } => {
                let mut events = Vec::new();
                if !akf {
                    let actions = match self.config.as_mut() {
                        Some(client) => client.handle_access_message(protocol, src, &payload)?,
                        None => Vec::new(),
                    };
                    events = self.apply_config_actions(actions)?;
                }
                events.push(SessionEvent::Access {
                    src,
                    dst,
                    payload,
                    akf,
                });
                Ok(events)
            }
            InboundMessage::Control {
                src,
                opcode,
                parameters,
            } => Ok(vec![SessionEvent::Control {
                src,
                opcode,
                parameters,
            }]),
        }
    }

    /// Tear down the bearer; per-session state dies with it
    pub fn close(&mut self) {
        self.bearer.close();
        self.filter_sent = false;
        self.config = None;
    }

    fn apply_config_actions(
        &mut self,
        actions: Vec<ConfigAction>,
    ) -> MeshResult<Vec<SessionEvent>> {
        let mut events = Vec::new();

        for action in actions {
            match action {
                ConfigAction::SendPdus(pdus) => {
                    for pdu in pdus {
                        self.bearer.write(&pdu)?;
                    }
                }
                ConfigAction::StartTimer(duration) => {
                    events.push(SessionEvent::ConfigTimer(duration));
                }
                ConfigAction::CancelTimer => events.push(SessionEvent::ConfigCancelTimer),
                ConfigAction::Completed => {
                    self.config = None;
                    events.push(SessionEvent::ConfigCompleted);
                }
                ConfigAction::StepFailed { step, cause } => {
                    self.config = None;
                    events.push(SessionEvent::ConfigFailed { step, cause });
                }
            }
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{KeyStore, MemoryKeyStore, NetworkCredentials};
    use std::sync::Arc;

    /// Bearer that records every write
    struct RecordingBearer {
        written: Vec<Vec<u8>>,
        closed: bool,
    }

    impl RecordingBearer {
        fn new() -> Self {
            Self {
                written: Vec::new(),
                closed: false,
            }
        }
    }

    impl ProxyBearer for RecordingBearer {
        fn write(&mut self, pdu: &[u8]) -> MeshResult<()> {
            self.written.push(pdu.to_vec());
            Ok(())
        }

        fn close(&mut self) {
            self.closed = true;
        }
    }

    fn protocol() -> MeshProtocol {
        let store = Arc::new(MemoryKeyStore::new(NetworkCredentials {
            network_key: [0x11; 16],
            app_key: [0x22; 16],
            iv_index: 0,
            net_key_index: 0,
            app_key_index: 0,
        }));
        store.store_device_key(0x0002, [0x5A; 16]);
        MeshProtocol::new(store)
    }

    #[test]
    fn test_filter_setup_precedes_first_command() {
        let mut protocol = protocol();
        let mut session = Session::new(RecordingBearer::new());

        session
            .send_command(
                &mut protocol,
                0xC000,
                &SidusCommand::Sleep { sleep_mode: true },
            )
            .unwrap();

        // Two writes: the proxy configuration PDU, then the command.
        assert_eq!(session.bearer.written.len(), 2);
        assert_eq!(session.bearer.written[0][0], 0x02);
        assert_eq!(session.bearer.written[1][0], 0x00);
        assert!(session.filter_sent());

        // The filter is per-session, not per-command.
        session
            .send_command(
                &mut protocol,
                0xC000,
                &SidusCommand::Sleep { sleep_mode: false },
            )
            .unwrap();
        assert_eq!(session.bearer.written.len(), 3);
    }

    #[test]
    fn test_configuration_runs_over_the_bearer() {
        let mut protocol = protocol();
        let mut session = Session::new(RecordingBearer::new());

        let events = session
            .start_configuration(&mut protocol, 0x0002, None)
            .unwrap();
        assert!(events
            .iter()
            .any(|event| matches!(event, SessionEvent::ConfigTimer(_))));
        // Filter setup plus two AppKey Add segments.
        assert_eq!(session.bearer.written.len(), 3);

        // Device answers AppKey Status success through the session.
        let device_store = Arc::new(MemoryKeyStore::new(NetworkCredentials {
            network_key: [0x11; 16],
            app_key: [0x22; 16],
            iv_index: 0,
            net_key_index: 0,
            app_key_index: 0,
        }));
        device_store.store_device_key(0x0001, [0x5A; 16]);
        let mut device = MeshProtocol::new(device_store);
        device.set_source_address(0x0002);
        let status = device
            .device_key_message_pdus(0x0001, &[0x80, 0x03, 0x00, 0x00, 0x00, 0x00])
            .unwrap()
            .remove(0);

        let events = session.process_notification(&mut protocol, &status).unwrap();
        assert!(events
            .iter()
            .any(|event| matches!(event, SessionEvent::ConfigCancelTimer)));
        // The Model App Bind went out.
        assert_eq!(session.bearer.written.len(), 4);
    }

    #[test]
    fn test_inbound_protocol_errors_are_swallowed() {
        let mut protocol = protocol();
        let mut session = Session::new(RecordingBearer::new());

        // Too short: dropped, not an error.
        assert!(session
            .process_notification(&mut protocol, &[0x00; 10])
            .unwrap()
            .is_empty());

        // Unsupported proxy message type: dropped.
        assert!(session
            .process_notification(&mut protocol, &[0xA5; 30])
            .unwrap()
            .is_empty());

        // Well-formed envelope over garbage: decrypt fails, dropped.
        let mut junk = vec![0x00];
        junk.extend_from_slice(&[0xA5; 29]);
        assert!(session
            .process_notification(&mut protocol, &junk)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_close_resets_session_state() {
        let mut protocol = protocol();
        let mut session = Session::new(RecordingBearer::new());

        session
            .send_command(
                &mut protocol,
                0xC000,
                &SidusCommand::Sleep { sleep_mode: true },
            )
            .unwrap();
        assert!(session.filter_sent());

        session.close();
        assert!(session.bearer.closed);
        assert!(!session.filter_sent());
    }
}
