//! Post-provisioning configuration client
//!
//! Runs once per fresh proxy session to a node we hold a DeviceKey for,
//! after the proxy filter setup has been written: AppKey Add, then Model
//! App Bind on the Sidus vendor model, then (optionally) Model
//! Publication Set so the light publishes status back to the controller.
//! Each step waits for its status answer with a short timeout and at most
//! two retries; a failed step is reported as a warning and the session
//! stays usable, since some lights answer commands regardless.

use super::constants::*;
use super::messages::{
    ConfigAppKeyAdd, ConfigModelAppBind, ConfigModelPublicationSet, ConfigStatusMessage, ModelId,
};
use crate::error::{ConfigFailureCause, MeshResult};
use crate::mesh::{MeshProtocol, DEFAULT_TTL};
use log::{debug, warn};
use std::time::Duration;

/// One step of the configuration sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigStep {
    AppKeyAdd,
    ModelAppBind,
    PublicationSet,
}

impl ConfigStep {
    /// Step name used in diagnostics and failure reports
    pub fn name(&self) -> &'static str {
        match self {
            ConfigStep::AppKeyAdd => "AppKey Add",
            ConfigStep::ModelAppBind => "Model App Bind",
            ConfigStep::PublicationSet => "Model Publication Set",
        }
    }
}

/// Instructions the client hands back to its driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Write these proxy PDUs to the bearer, in order
    SendPdus(Vec<Vec<u8>>),
    /// Arm the single response timer
    StartTimer(Duration),
    /// Disarm the response timer
    CancelTimer,
    /// The whole sequence succeeded
    Completed,
    /// A step failed; the session remains usable for commands
    StepFailed {
        step: &'static str,
        cause: ConfigFailureCause,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigState {
    Idle,
    AwaitingStatus(ConfigStep),
    Done,
    Failed,
}

/// Configuration sequence driver for one target node
#[derive(Debug)]
pub struct ConfigClient {
    target: u16,
    state: ConfigState,
    retries: u8,
    publish_address: Option<u16>,
}

impl ConfigClient {
    /// Create a client for the node at `target`
    pub fn new(target: u16) -> Self {
        Self {
            target,
            state: ConfigState::Idle,
            retries: 0,
            publish_address: None,
        }
    }

    /// Also configure the vendor model to publish status to `address`
    pub fn with_publication(mut self, address: u16) -> Self {
        self.publish_address = Some(address);
        self
    }

    /// Whether the sequence has reached a terminal state
    pub fn is_finished(&self) -> bool {
        matches!(self.state, ConfigState::Done | ConfigState::Failed)
    }

    /// Kick off the sequence with the AppKey Add step
    pub fn start(&mut self, protocol: &mut MeshProtocol) -> MeshResult<Vec<ConfigAction>> {
        self.enter_step(protocol, ConfigStep::AppKeyAdd)
    }

    /// Feed an inbound device-key access message from the target
    pub fn handle_access_message(
        &mut self,
        protocol: &mut MeshProtocol,
        src: u16,
        access: &[u8],
    ) -> MeshResult<Vec<ConfigAction>> {
        let step = match self.state {
            ConfigState::AwaitingStatus(step) => step,
            _ => return Ok(Vec::new()),
        };
        if src != self.target {
            return Ok(Vec::new());
        }

        let status = match ConfigStatusMessage::parse(access) {
            Some(status) => status,
            None => {
                debug!("ignoring non-status access message from {:#06X}", src);
                return Ok(Vec::new());
            }
        };

        let expected = matches!(
            (step, &status),
            (ConfigStep::AppKeyAdd, ConfigStatusMessage::AppKey { .. })
                | (ConfigStep::ModelAppBind, ConfigStatusMessage::ModelApp { .. })
                | (
                    ConfigStep::PublicationSet,
                    ConfigStatusMessage::ModelPublication { .. }
                )
        );
        if !expected {
            debug!(
                "ignoring out-of-step status {:?} while waiting on {}",
                status,
                step.name()
            );
            return Ok(Vec::new());
        }

        if status.status() != CONFIG_STATUS_SUCCESS {
            warn!(
                "{} rejected by {:#06X} with status {:#04X}",
                step.name(),
                self.target,
                status.status()
            );
            self.state = ConfigState::Failed;
            return Ok(vec![
                ConfigAction::CancelTimer,
                ConfigAction::StepFailed {
                    step: step.name(),
                    cause: ConfigFailureCause::Status(status.status()),
                },
            ]);
        }

        debug!("{} acknowledged by {:#06X}", step.name(), self.target);
        let mut actions = vec![ConfigAction::CancelTimer];
        match self.next_step(step) {
            Some(next) => actions.extend(self.enter_step(protocol, next)?),
            None => {
                self.state = ConfigState::Done;
                actions.push(ConfigAction::Completed);
            }
        }
        Ok(actions)
    }

    /// The response timer for the current step expired
    pub fn handle_timeout(&mut self, protocol: &mut MeshProtocol) -> MeshResult<Vec<ConfigAction>> {
        let step = match self.state {
            ConfigState::AwaitingStatus(step) => step,
            _ => return Ok(Vec::new()),
        };

        if self.retries < CONFIG_MAX_RETRIES {
            self.retries += 1;
            debug!(
                "{} timed out, retry {}/{}",
                step.name(),
                self.retries,
                CONFIG_MAX_RETRIES
            );
            return Ok(vec![
                ConfigAction::SendPdus(self.step_pdus(protocol, step)?),
                ConfigAction::StartTimer(CONFIG_RESPONSE_TIMEOUT),
            ]);
        }

        warn!(
            "{} to {:#06X} got no answer after {} retries",
            step.name(),
            self.target,
            CONFIG_MAX_RETRIES
        );
        self.state = ConfigState::Failed;
        Ok(vec![ConfigAction::StepFailed {
            step: step.name(),
            cause: ConfigFailureCause::Timeout,
        }])
    }

    fn next_step(&self, step: ConfigStep) -> Option<ConfigStep> {
        match step {
            ConfigStep::AppKeyAdd => Some(ConfigStep::ModelAppBind),
            ConfigStep::ModelAppBind => self
                .publish_address
                .map(|_| ConfigStep::PublicationSet),
            ConfigStep::PublicationSet => None,
        }
    }

    fn enter_step(
        &mut self,
        protocol: &mut MeshProtocol,
        step: ConfigStep,
    ) -> MeshResult<Vec<ConfigAction>> {
        self.state = ConfigState::AwaitingStatus(step);
        self.retries = 0;

        Ok(vec![
            ConfigAction::SendPdus(self.step_pdus(protocol, step)?),
            ConfigAction::StartTimer(CONFIG_RESPONSE_TIMEOUT),
        ])
    }

    fn step_pdus(
        &self,
        protocol: &mut MeshProtocol,
        step: ConfigStep,
    ) -> MeshResult<Vec<Vec<u8>>> {
        let credentials = *protocol.credentials();

        let access = match step {
            ConfigStep::AppKeyAdd => ConfigAppKeyAdd {
                net_key_index: credentials.net_key_index,
                app_key_index: credentials.app_key_index,
                app_key: credentials.app_key,
            }
            .to_access_payload(),
            ConfigStep::ModelAppBind => ConfigModelAppBind {
                element_address: self.target,
                app_key_index: credentials.app_key_index,
                model: ModelId::sidus(),
            }
            .to_access_payload(),
            ConfigStep::PublicationSet => ConfigModelPublicationSet {
                element_address: self.target,
                publish_address: self.publish_address.unwrap_or_default(),
                app_key_index: credentials.app_key_index,
                publish_ttl: DEFAULT_TTL,
                publish_period: 0,
                retransmit: 0,
                model: ModelId::sidus(),
            }
            .to_access_payload(),
        };

        protocol.device_key_message_pdus(self.target, &access)
    }
}
