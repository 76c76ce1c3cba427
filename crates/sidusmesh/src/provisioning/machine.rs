//! Provisioning state machine
//!
//! The provisioner side of the no-OOB FIPS P-256 flow:
//! Invite → Capabilities → Start → PublicKey exchange → Confirmation
//! exchange → Random exchange → encrypted ProvisioningData → Complete.
//! Transitions are pure: every entry point returns the list of actions
//! (PDUs to write, timers to arm, results to deliver) for the caller to
//! apply, so the whole flow is drivable from a scripted peer in tests.

use super::constants::*;
use super::pdu::{self, ProvisioningPdu};
use crate::crypto::{aes_ccm_encrypt, aes_cmac, k1, s1, EphemeralKeyPair, MicSize};
use crate::error::MeshError;
use crate::keys::NetworkCredentials;
use crate::mesh::{ProxyPdu, PROXY_TYPE_PROVISIONING};
use log::{debug, warn};
use std::time::Duration;

/// States of one provisioning attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningState {
    Idle,
    Connecting,
    DiscoveringServices,
    Ready,
    InviteSent,
    CapabilitiesReceived,
    StartSent,
    PublicKeySent,
    PublicKeyReceived,
    ConfirmationSent,
    ConfirmationReceived,
    RandomSent,
    RandomReceived,
    DataSent,
    Complete,
    Failed,
}

impl ProvisioningState {
    fn is_terminal(&self) -> bool {
        matches!(self, ProvisioningState::Complete | ProvisioningState::Failed)
    }
}

/// Outcome of a successful provisioning run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisioningResult {
    /// Unicast address assigned to the new node
    pub unicast_address: u16,
    /// DeviceKey derived for the node; the caller stores it under the
    /// unicast address
    pub device_key: [u8; 16],
}

/// Instructions the machine hands back to its driver
#[derive(Debug)]
pub enum ProvisionerAction {
    /// Write this proxy-framed provisioning PDU to the bearer
    SendPdu(Vec<u8>),
    /// Arm the single step timer
    StartTimer(Duration),
    /// Disarm the step timer
    CancelTimer,
    /// Tear down the GATT session
    CloseBearer,
    /// Provisioning succeeded
    Complete(ProvisioningResult),
    /// Provisioning ended; reported exactly once
    Failed(MeshError),
}

/// Provisioner for one device
///
/// One-shot: a `Provisioner` runs a single attempt and is discarded on
/// its terminal state. All session key material lives inside and is
/// dropped when the attempt ends.
pub struct Provisioner {
    credentials: NetworkCredentials,
    unicast_address: u16,
    state: ProvisioningState,
    invite_params: [u8; 1],
    capabilities_params: Option<[u8; CAPABILITIES_PARAMS_LEN]>,
    keypair: Option<EphemeralKeyPair>,
    public_key: [u8; 64],
    shared_secret: Option<[u8; 32]>,
    confirmation_salt: Option<[u8; 16]>,
    confirmation_key: Option<[u8; 16]>,
    provisioner_random: [u8; 16],
    device_confirmation: Option<[u8; 16]>,
    device_key: Option<[u8; 16]>,
}

impl Provisioner {
    /// Create a provisioner that will assign `unicast_address`
    pub fn new(credentials: NetworkCredentials, unicast_address: u16) -> Self {
        Self {
            credentials,
            unicast_address,
            state: ProvisioningState::Idle,
            invite_params: [0x00],
            capabilities_params: None,
            keypair: None,
            public_key: [0u8; 64],
            shared_secret: None,
            confirmation_salt: None,
            confirmation_key: None,
            provisioner_random: random_16(),
            device_confirmation: None,
            device_key: None,
        }
    }

    pub fn state(&self) -> ProvisioningState {
        self.state
    }

    /// The adapter started opening the GATT session
    pub fn session_opening(&mut self) {
        if self.state == ProvisioningState::Idle {
            self.state = ProvisioningState::Connecting;
        }
    }

    /// The adapter is discovering the provisioning characteristics
    pub fn discovering_services(&mut self) {
        if self.state == ProvisioningState::Connecting {
            self.state = ProvisioningState::DiscoveringServices;
        }
    }

    /// The adapter finished discovery; the bearer is writable
    pub fn session_ready(&mut self) {
        if matches!(
            self.state,
            ProvisioningState::Idle
                | ProvisioningState::Connecting
                | ProvisioningState::DiscoveringServices
        ) {
            self.state = ProvisioningState::Ready;
        }
    }

    /// Send the Invite and start the flow
    pub fn start(&mut self) -> Vec<ProvisionerAction> {
        match self.state {
            ProvisioningState::Idle | ProvisioningState::Ready => {}
            state => {
                warn!("start() ignored in state {:?}", state);
                return Vec::new();
            }
        }

        debug!("provisioning {:#06X}: sending invite", self.unicast_address);
        self.state = ProvisioningState::InviteSent;

        vec![
            send(pdu::invite_pdu(self.invite_params[0])),
            ProvisionerAction::StartTimer(PROVISIONING_STEP_TIMEOUT),
        ]
    }

    /// Feed one inbound notification from the provisioning bearer
    pub fn process_pdu(&mut self, data: &[u8]) -> Vec<ProvisionerAction> {
        if self.state.is_terminal() {
            debug!("dropping provisioning PDU after terminal state");
            return Vec::new();
        }

        let proxy = match ProxyPdu::parse(data) {
            Ok(proxy) => proxy,
            Err(error) => {
                debug!("dropping unparseable proxy PDU: {}", error);
                return Vec::new();
            }
        };
        if proxy.message_type != PROXY_TYPE_PROVISIONING {
            debug!(
                "dropping proxy message type {:#04X} on provisioning bearer",
                proxy.message_type
            );
            return Vec::new();
        }

        let pdu = match ProvisioningPdu::parse(&proxy.payload) {
            Ok(pdu) => pdu,
            Err(error) => {
                debug!("dropping malformed provisioning PDU: {}", error);
                return Vec::new();
            }
        };

        match (self.state, pdu) {
            (
                ProvisioningState::InviteSent,
                ProvisioningPdu::Capabilities {
                    capabilities,
                    raw_params,
                },
            ) => self.on_capabilities(capabilities, raw_params),
            (ProvisioningState::PublicKeySent, ProvisioningPdu::PublicKey { key }) => {
                self.on_device_public_key(key)
            }
            (ProvisioningState::ConfirmationSent, ProvisioningPdu::Confirmation { value }) => {
                self.on_device_confirmation(value)
            }
            (ProvisioningState::RandomSent, ProvisioningPdu::Random { value }) => {
                self.on_device_random(value)
            }
            (ProvisioningState::DataSent, ProvisioningPdu::Complete) => self.on_complete(),
            (_, ProvisioningPdu::Failed { error_code }) => {
                self.fail(MeshError::ProvisioningRemoteFailure(error_code))
            }
            (state, pdu) => {
                warn!("ignoring out-of-order {:?} in state {:?}", pdu, state);
                Vec::new()
            }
        }
    }

    /// The step timer expired
    pub fn timeout(&mut self) -> Vec<ProvisionerAction> {
        if self.state.is_terminal() {
            return Vec::new();
        }
        warn!(
            "provisioning {:#06X} timed out in state {:?}",
            self.unicast_address, self.state
        );
        self.fail(MeshError::ProvisioningTimeout)
    }

    /// Abort the attempt; reports the failure exactly once
    pub fn cancel(&mut self) -> Vec<ProvisionerAction> {
        if self.state.is_terminal() {
            return Vec::new();
        }
        self.fail(MeshError::ProvisioningLocalFailure("cancelled".into()))
    }

    fn on_capabilities(
        &mut self,
        capabilities: pdu::Capabilities,
        raw_params: [u8; CAPABILITIES_PARAMS_LEN],
    ) -> Vec<ProvisionerAction> {
        debug!(
            "capabilities: {} element(s), algorithms {:?}",
            capabilities.num_elements, capabilities.algorithms
        );
        self.capabilities_params = Some(raw_params);
        self.state = ProvisioningState::CapabilitiesReceived;

        if !capabilities.supports_p256() {
            return self.fail(MeshError::ProvisioningLocalFailure(
                "device does not support FIPS P-256".into(),
            ));
        }

        let keypair = EphemeralKeyPair::generate();
        self.public_key = keypair.public_bytes();
        self.keypair = Some(keypair);

        let mut actions = vec![ProvisionerAction::CancelTimer];
        self.state = ProvisioningState::StartSent;
        actions.push(send(pdu::start_pdu()));
        self.state = ProvisioningState::PublicKeySent;
        actions.push(send(pdu::public_key_pdu(&self.public_key)));
        actions.push(ProvisionerAction::StartTimer(PROVISIONING_STEP_TIMEOUT));
        actions
    }

    fn on_device_public_key(&mut self, device_key: [u8; 64]) -> Vec<ProvisionerAction> {
        self.state = ProvisioningState::PublicKeyReceived;

        let capabilities = match self.capabilities_params {
            Some(params) => params,
            None => {
                return self.fail(MeshError::ProvisioningLocalFailure(
                    "no capabilities recorded".into(),
                ));
            }
        };
        let keypair = match self.keypair.as_ref() {
            Some(keypair) => keypair,
            None => {
                return self.fail(MeshError::ProvisioningLocalFailure(
                    "no ephemeral keypair".into(),
                ));
            }
        };

        let shared_secret = match keypair.diffie_hellman(&device_key) {
            Ok(secret) => secret,
            Err(error) => return self.fail(error),
        };

        // ConfirmationInputs = invite || capabilities || start ||
        // provisioner public key || device public key (145 bytes).
        let mut inputs = Vec::with_capacity(145);
        inputs.extend_from_slice(&self.invite_params);
        inputs.extend_from_slice(&capabilities);
        inputs.extend_from_slice(&pdu::start_pdu()[1..]);
        inputs.extend_from_slice(&self.public_key);
        inputs.extend_from_slice(&device_key);

        let confirmation_salt = s1(&inputs);
        let confirmation_key = k1(&shared_secret, &confirmation_salt, b"prck");

        let mut message = [0u8; 32];
        message[..16].copy_from_slice(&self.provisioner_random);
        message[16..].copy_from_slice(&NO_OOB_AUTH_VALUE);
        let confirmation = aes_cmac(&confirmation_key, &message);

        self.shared_secret = Some(shared_secret);
        self.confirmation_salt = Some(confirmation_salt);
        self.confirmation_key = Some(confirmation_key);
        self.state = ProvisioningState::ConfirmationSent;

        vec![
            ProvisionerAction::CancelTimer,
            send(pdu::confirmation_pdu(&confirmation)),
            ProvisionerAction::StartTimer(PROVISIONING_STEP_TIMEOUT),
        ]
    }

    fn on_device_confirmation(&mut self, value: [u8; 16]) -> Vec<ProvisionerAction> {
        self.device_confirmation = Some(value);
        self.state = ProvisioningState::ConfirmationReceived;

        self.state = ProvisioningState::RandomSent;
        vec![
            ProvisionerAction::CancelTimer,
            send(pdu::random_pdu(&self.provisioner_random)),
            ProvisionerAction::StartTimer(PROVISIONING_STEP_TIMEOUT),
        ]
    }

    fn on_device_random(&mut self, device_random: [u8; 16]) -> Vec<ProvisionerAction> {
        self.state = ProvisioningState::RandomReceived;

        let (shared_secret, confirmation_salt, confirmation_key) = match (
            self.shared_secret,
            self.confirmation_salt,
            self.confirmation_key,
        ) {
            (Some(secret), Some(salt), Some(key)) => (secret, salt, key),
            _ => {
                return self.fail(MeshError::ProvisioningLocalFailure(
                    "confirmation material missing".into(),
                ));
            }
        };

        // Check the device confirmation now that its random is known;
        // a mismatch is logged but the flow continues so the downstream
        // failure stays observable.
        if let Some(device_confirmation) = self.device_confirmation {
            let mut message = [0u8; 32];
            message[..16].copy_from_slice(&device_random);
            message[16..].copy_from_slice(&NO_OOB_AUTH_VALUE);
            if aes_cmac(&confirmation_key, &message) != device_confirmation {
                warn!("device confirmation does not match its random, continuing");
            }
        }

        let mut salt_input = Vec::with_capacity(48);
        salt_input.extend_from_slice(&confirmation_salt);
        salt_input.extend_from_slice(&self.provisioner_random);
        salt_input.extend_from_slice(&device_random);
        let provisioning_salt = s1(&salt_input);

        let session_key = k1(&shared_secret, &provisioning_salt, b"prsk");
        let session_nonce: [u8; 13] = k1(&shared_secret, &provisioning_salt, b"prsn")[3..16]
            .try_into()
            .unwrap();
        let device_key = k1(&shared_secret, &provisioning_salt, b"prdk");
        self.device_key = Some(device_key);

        let mut data = Vec::with_capacity(PROVISIONING_DATA_LEN);
        data.extend_from_slice(&self.credentials.network_key);
        data.extend_from_slice(&self.credentials.net_key_index.to_be_bytes());
        data.push(0x00); // flags: no key refresh, no IV update
        data.extend_from_slice(&self.credentials.iv_index.to_be_bytes());
        data.extend_from_slice(&self.unicast_address.to_be_bytes());

        let encrypted = match aes_ccm_encrypt(&session_key, &session_nonce, &data, MicSize::Eight)
        {
            Ok(encrypted) => encrypted,
            Err(error) => return self.fail(error),
        };

        self.state = ProvisioningState::DataSent;
        vec![
            ProvisionerAction::CancelTimer,
            send(pdu::data_pdu(&encrypted)),
            ProvisionerAction::StartTimer(PROVISIONING_STEP_TIMEOUT),
        ]
    }

    fn on_complete(&mut self) -> Vec<ProvisionerAction> {
        let device_key = match self.device_key {
            Some(key) => key,
            None => {
                return self.fail(MeshError::ProvisioningLocalFailure(
                    "no device key derived".into(),
                ));
            }
        };

        debug!("provisioning {:#06X} complete", self.unicast_address);
        self.state = ProvisioningState::Complete;
        let result = ProvisioningResult {
            unicast_address: self.unicast_address,
            device_key,
        };
        self.clear_session();

        vec![
            ProvisionerAction::CancelTimer,
            ProvisionerAction::Complete(result),
        ]
    }

    fn fail(&mut self, error: MeshError) -> Vec<ProvisionerAction> {
        self.state = ProvisioningState::Failed;
        self.clear_session();

        vec![
            ProvisionerAction::CancelTimer,
            ProvisionerAction::CloseBearer,
            ProvisionerAction::Failed(error),
        ]
    }

    fn clear_session(&mut self) {
        self.capabilities_params = None;
        self.keypair = None;
        self.shared_secret = None;
        self.confirmation_salt = None;
        self.confirmation_key = None;
        self.device_confirmation = None;
        self.device_key = None;
        self.provisioner_random = [0u8; 16];
    }
}

fn send(pdu: Vec<u8>) -> ProvisionerAction {
    ProvisionerAction::SendPdu(ProxyPdu::frame(PROXY_TYPE_PROVISIONING, &pdu))
}

fn random_16() -> [u8; 16] {
    let mut value = [0u8; 16];
    for byte in value.iter_mut() {
        *byte = rand::random::<u8>();
    }
    value
}
