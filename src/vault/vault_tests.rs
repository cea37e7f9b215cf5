//! Tests for the vault.

use super::*;
use super::memory_vault::DEFAULT_PURGE_INTERVAL;
use std::sync::Arc;
use std::thread;

#[test]
fn test_store_and_retrieve() {
    let vault = MemoryVault::new();
    vault.store("<PERSON_3fa91c>", "Jane Roe").unwrap();
    assert_eq!(vault.retrieve("<PERSON_3fa91c>").unwrap(), Some("Jane Roe".to_string()));
    assert_eq!(vault.retrieve("<PERSON_000000>").unwrap(), None);
    assert_eq!(vault.ttl(), DEFAULT_TTL);
}

#[test]
fn test_entry_expires_after_ttl() {
    let vault = MemoryVault::with_ttl(Duration::from_millis(30));
    vault.store("<EMAIL_ADDRESS_a1b2c3>", "jane@example.com").unwrap();
    assert!(vault.retrieve("<EMAIL_ADDRESS_a1b2c3>").unwrap().is_some());

    thread::sleep(Duration::from_millis(60));
    assert_eq!(vault.retrieve("<EMAIL_ADDRESS_a1b2c3>").unwrap(), None);
    assert!(vault.is_empty());
}

#[test]
fn test_purge_expired() {
    let vault = MemoryVault::with_ttl(Duration::from_millis(20));
    vault.store("<LINK_aaaaaa>", "https://a.example").unwrap();
    vault.store("<LINK_bbbbbb>", "https://b.example").unwrap();
    thread::sleep(Duration::from_millis(40));
    assert_eq!(vault.purge_expired(), 2);
    assert_eq!(vault.len(), 0);
}

#[test]
fn test_store_never_overwrites_live_token() {
    let vault = MemoryVault::new();
    vault.store("<EMAIL_ADDRESS_1>", "amy@example.com").unwrap();
    let err = vault.store("<EMAIL_ADDRESS_1>", "bob@example.com").unwrap_err();
    assert_eq!(err, VaultError::Occupied("<EMAIL_ADDRESS_1>".into()));
    assert_eq!(vault.retrieve("<EMAIL_ADDRESS_1>").unwrap(), Some("amy@example.com".to_string()));
    assert_eq!(vault.len(), 1);
}

#[test]
fn test_expired_token_can_be_written_again() {
    let vault = MemoryVault::with_ttl(Duration::from_millis(20));
    vault.store("<PERSON_1>", "old").unwrap();
    thread::sleep(Duration::from_millis(40));
    vault.store("<PERSON_1>", "new").unwrap();
    assert_eq!(vault.retrieve("<PERSON_1>").unwrap(), Some("new".to_string()));
}

#[test]
fn test_store_mapping_is_all_or_nothing() {
    let vault = MemoryVault::new();
    vault.store("<PERSON_2c2c2c>", "someone else").unwrap();

    let mut mapping = Mapping::new();
    mapping.insert("<LINK_1a1a1a>", "https://a.example").unwrap();
    mapping.insert("<PERSON_2c2c2c>", "Jane").unwrap();
    let err = vault.store_mapping(&mapping).unwrap_err();

    assert!(matches!(err, VaultError::Occupied(ref token) if token == "<PERSON_2c2c2c>"));
    assert_eq!(vault.retrieve("<LINK_1a1a1a>").unwrap(), None);
    assert_eq!(vault.retrieve("<PERSON_2c2c2c>").unwrap(), Some("someone else".to_string()));
}

#[test]
fn test_writes_sweep_expired_entries() {
    let vault = MemoryVault::with_ttl(Duration::from_millis(20)).with_purge_interval(4);
    for i in 0..3 {
        vault.store(&format!("<PERSON_00000{}>", i), "stale").unwrap();
    }
    assert_eq!(vault.len(), 3);

    thread::sleep(Duration::from_millis(40));
    vault.store("<PERSON_ffffff>", "fresh").unwrap();
    assert_eq!(vault.len(), 1);
    assert_eq!(vault.retrieve("<PERSON_ffffff>").unwrap(), Some("fresh".to_string()));
}

#[test]
fn test_unread_entries_do_not_accumulate() {
    let vault = MemoryVault::with_ttl(Duration::from_millis(1));
    for i in 0..500 {
        vault.store(&format!("<EMAIL_ADDRESS_{:06x}>", i), "x@example.com").unwrap();
    }
    thread::sleep(Duration::from_millis(20));
    for i in 500..(500 + DEFAULT_PURGE_INTERVAL) {
        vault.store(&format!("<EMAIL_ADDRESS_{:06x}>", i), "x@example.com").unwrap();
    }
    assert!(vault.len() < 500, "entries held after expiry: {}", vault.len());
}

#[test]
fn test_remove() {
    let vault = MemoryVault::new();
    vault.store("<LINK_abcdef>", "https://a.example").unwrap();
    vault.remove("<LINK_abcdef>").unwrap();
    vault.remove("<LINK_abcdef>").unwrap();
    assert!(vault.is_empty());
}

#[test]
fn test_concurrent_writers_keep_values_separate() {
    let vault = Arc::new(MemoryVault::new());
    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let vault = vault.clone();
            thread::spawn(move || {
                for i in 0..200 {
                    let token = format!("<PERSON_{:02x}{:04x}>", worker, i);
                    vault.store(&token, &format!("value-{}-{}", worker, i)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(vault.len(), 8 * 200);
    for worker in 0..8 {
        for i in (0..200).step_by(37) {
            let token = format!("<PERSON_{:02x}{:04x}>", worker, i);
            assert_eq!(vault.retrieve(&token).unwrap(), Some(format!("value-{}-{}", worker, i)));
        }
    }
}

#[test]
fn test_store_mapping_and_recover() {
    let vault = MemoryVault::new();
    let mut mapping = Mapping::new();
    mapping.insert("<CONFIDENTIAL_0a0a0a>", "Chimera").unwrap();
    mapping.insert("<PERSON_1b1b1b>", "Jane").unwrap();
    vault.store_mapping(&mapping).unwrap();

    let recovered = recover_mapping(&vault, "Hi <PERSON_1b1b1b>, no <LINK_ffffff>").unwrap();
    assert_eq!(recovered.len(), 1);
    assert_eq!(recovered.get("<PERSON_1b1b1b>"), Some("Jane"));
}

#[test]
fn test_recover_follows_nested_placeholders() {
    use crate::redaction::Restorer;

    let vault = MemoryVault::new();
    vault.store("<CONFIDENTIAL_0a0a0a>", "Chimera").unwrap();
    vault.store("<PERSON_1b1b1b>", "Dr <CONFIDENTIAL_0a0a0a>").unwrap();

    let text = "Ask <PERSON_1b1b1b> or <CONFIDENTIAL_0a0a0a>";
    let recovered = recover_mapping(&vault, text).unwrap();
    assert_eq!(recovered.len(), 2);
    assert_eq!(Restorer::default().restore(text, &recovered), "Ask Dr Chimera or Chimera");
}
