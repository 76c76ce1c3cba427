//! Tests for the configuration client

use super::*;
use crate::error::ConfigFailureCause;
use crate::keys::{KeyStore, MemoryKeyStore, NetworkCredentials};
use crate::mesh::MeshProtocol;
use std::sync::Arc;

const TARGET: u16 = 0x0002;

fn protocol() -> MeshProtocol {
    let store = Arc::new(MemoryKeyStore::new(NetworkCredentials {
        network_key: [0x11; 16],
        app_key: [0x22; 16],
        iv_index: 0,
        net_key_index: 0,
        app_key_index: 0,
    }));
    store.store_device_key(TARGET, [0x5A; 16]);
    MeshProtocol::new(store)
}

fn appkey_status(status: u8) -> Vec<u8> {
    let mut access = CONFIG_APPKEY_STATUS_OPCODE.to_vec();
    access.push(status);
    access.extend_from_slice(&pack_key_indices(0, 0));
    access
}

fn bind_status(status: u8) -> Vec<u8> {
    let mut access = CONFIG_MODEL_APP_STATUS_OPCODE.to_vec();
    access.push(status);
    access.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x11, 0x02, 0xC0, 0x00]);
    access
}

fn publication_status(status: u8) -> Vec<u8> {
    let mut access = CONFIG_MODEL_PUBLICATION_STATUS_OPCODE.to_vec();
    access.push(status);
    access.extend_from_slice(&[0x02, 0x00, 0x01, 0x00]);
    access
}

fn sent_pdu_count(actions: &[ConfigAction]) -> usize {
    actions
        .iter()
        .find_map(|action| match action {
            ConfigAction::SendPdus(pdus) => Some(pdus.len()),
            _ => None,
        })
        .unwrap_or(0)
}

#[test]
fn test_appkey_add_goes_out_segmented_with_timer() {
    let mut protocol = protocol();
    let mut client = ConfigClient::new(TARGET);

    let actions = client.start(&mut protocol).unwrap();

    // 20 access bytes encrypt to 24: exactly two segments.
    assert_eq!(sent_pdu_count(&actions), 2);
    assert!(actions
        .iter()
        .any(|a| matches!(a, ConfigAction::StartTimer(d) if *d == CONFIG_RESPONSE_TIMEOUT)));
}

#[test]
fn test_happy_path_without_publication() {
    let mut protocol = protocol();
    let mut client = ConfigClient::new(TARGET);
    client.start(&mut protocol).unwrap();

    let actions = client
        .handle_access_message(&mut protocol, TARGET, &appkey_status(0x00))
        .unwrap();
    assert!(actions.contains(&ConfigAction::CancelTimer));
    assert_eq!(sent_pdu_count(&actions), 1); // bind fits unsegmented
    assert!(!client.is_finished());

    let actions = client
        .handle_access_message(&mut protocol, TARGET, &bind_status(0x00))
        .unwrap();
    assert!(actions.contains(&ConfigAction::Completed));
    assert!(client.is_finished());
}

#[test]
fn test_happy_path_with_publication() {
    let mut protocol = protocol();
    let mut client = ConfigClient::new(TARGET).with_publication(0x0001);
    client.start(&mut protocol).unwrap();

    client
        .handle_access_message(&mut protocol, TARGET, &appkey_status(0x00))
        .unwrap();
    let actions = client
        .handle_access_message(&mut protocol, TARGET, &bind_status(0x00))
        .unwrap();

    // Publication Set goes out instead of completing.
    assert!(sent_pdu_count(&actions) > 0);
    assert!(!actions.contains(&ConfigAction::Completed));

    let actions = client
        .handle_access_message(&mut protocol, TARGET, &publication_status(0x00))
        .unwrap();
    assert!(actions.contains(&ConfigAction::Completed));
    assert!(client.is_finished());
}

#[test]
fn test_non_zero_status_fails_the_step() {
    let mut protocol = protocol();
    let mut client = ConfigClient::new(TARGET);
    client.start(&mut protocol).unwrap();

    let actions = client
        .handle_access_message(&mut protocol, TARGET, &appkey_status(0x05))
        .unwrap();

    assert!(actions.contains(&ConfigAction::CancelTimer));
    assert!(actions.contains(&ConfigAction::StepFailed {
        step: "AppKey Add",
        cause: ConfigFailureCause::Status(0x05),
    }));
    assert!(client.is_finished());
}

#[test]
fn test_timeouts_retry_then_fail() {
    let mut protocol = protocol();
    let mut client = ConfigClient::new(TARGET);
    client.start(&mut protocol).unwrap();

    for _ in 0..CONFIG_MAX_RETRIES {
        let actions = client.handle_timeout(&mut protocol).unwrap();
        assert!(sent_pdu_count(&actions) > 0);
        assert!(actions
            .iter()
            .any(|a| matches!(a, ConfigAction::StartTimer(_))));
    }

    let actions = client.handle_timeout(&mut protocol).unwrap();
    assert!(actions.contains(&ConfigAction::StepFailed {
        step: "AppKey Add",
        cause: ConfigFailureCause::Timeout,
    }));
    assert!(client.is_finished());

    // Further timeouts are inert.
    assert!(client.handle_timeout(&mut protocol).unwrap().is_empty());
}

#[test]
fn test_unrelated_messages_are_ignored() {
    let mut protocol = protocol();
    let mut client = ConfigClient::new(TARGET);
    client.start(&mut protocol).unwrap();

    // Not a status message.
    assert!(client
        .handle_access_message(&mut protocol, TARGET, &[0x82, 0x04, 0x01])
        .unwrap()
        .is_empty());

    // Right message, wrong source.
    assert!(client
        .handle_access_message(&mut protocol, 0x0009, &appkey_status(0x00))
        .unwrap()
        .is_empty());

    // Out-of-step status while AppKey Add is pending.
    assert!(client
        .handle_access_message(&mut protocol, TARGET, &bind_status(0x00))
        .unwrap()
        .is_empty());

    assert!(!client.is_finished());
}
