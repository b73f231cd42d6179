//! Device registry integration tests

use std::sync::Arc;
use std::thread;

use lanwake::{Bootstrap, Device, DeviceRegistry, DeviceUpdate, Error, db};

mod common;
use common::setup_test_db;

fn names(registry: &DeviceRegistry) -> Vec<String> {
    registry
        .list()
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect()
}

#[test]
fn test_duplicate_name_keeps_first() {
    let registry = DeviceRegistry::new(setup_test_db());
    let first = Device::new("Media", "00:11:22:33:44:55");

    registry.add(&first).unwrap();
    let err = registry
        .add(&Device::new("media", "66:77:88:99:AA:BB"))
        .unwrap_err();

    assert!(matches!(err, Error::DuplicateName(_)));
    assert_eq!(registry.list().unwrap(), vec![first]);
}

#[test]
fn test_duplicate_macs_are_allowed() {
    let registry = DeviceRegistry::new(setup_test_db());
    registry.add(&Device::new("a", "00:11:22:33:44:55")).unwrap();
    registry.add(&Device::new("b", "00:11:22:33:44:55")).unwrap();

    assert_eq!(names(&registry), ["a", "b"]);
}

#[test]
fn test_get_is_case_insensitive() {
    let registry = DeviceRegistry::new(setup_test_db());
    registry
        .add(&Device::new("Living-Room-TV", "AA-BB-CC-DD-EE-FF").with_ip("10.0.0.5"))
        .unwrap();

    let lower = registry.get("living-room-tv").unwrap();
    let upper = registry.get("LIVING-ROOM-TV").unwrap();

    assert!(lower.is_some());
    assert_eq!(lower, upper);
}

#[test]
fn test_list_stays_sorted_through_mutations() {
    let registry = DeviceRegistry::new(setup_test_db());
    for name in ["zeta", "Beta", "alpha", "Omega"] {
        registry.add(&Device::new(name, "00:11:22:33:44:55")).unwrap();
    }
    assert_eq!(names(&registry), ["alpha", "Beta", "Omega", "zeta"]);

    assert!(registry.remove("BETA").unwrap());
    let rename = DeviceUpdate {
        name: Some("Aardvark".to_string()),
        ..DeviceUpdate::default()
    };
    assert!(registry.update("zeta", &rename).unwrap());

    assert_eq!(names(&registry), ["Aardvark", "alpha", "Omega"]);
}

#[test]
fn test_empty_update_is_noop() {
    let registry = DeviceRegistry::new(setup_test_db());
    registry.add(&Device::example()).unwrap();

    assert!(registry.update("Example-Device", &DeviceUpdate::default()).unwrap());
    assert_eq!(registry.list().unwrap(), vec![Device::example()]);
}

#[test]
fn test_update_missing_returns_false() {
    let registry = DeviceRegistry::new(setup_test_db());
    let update = DeviceUpdate {
        mac: Some("00:11:22:33:44:55".to_string()),
        ..DeviceUpdate::default()
    };
    assert!(!registry.update("ghost", &update).unwrap());
}

#[test]
fn test_update_collision_leaves_both_records() {
    let registry = DeviceRegistry::new(setup_test_db());
    registry.add(&Device::new("nas", "00:11:22:33:44:55")).unwrap();
    registry.add(&Device::new("desktop", "00:11:22:33:44:66")).unwrap();

    let rename = DeviceUpdate {
        name: Some("NAS".to_string()),
        mac: Some("00:00:00:00:00:00".to_string()),
        ..DeviceUpdate::default()
    };
    let err = registry.update("desktop", &rename).unwrap_err();

    assert!(matches!(err, Error::DuplicateName(_)));
    assert_eq!(registry.get("desktop").unwrap().unwrap().mac, "00:11:22:33:44:66");
    assert_eq!(registry.get("nas").unwrap().unwrap().mac, "00:11:22:33:44:55");
}

#[test]
fn test_update_clears_optional_fields() {
    let registry = DeviceRegistry::new(setup_test_db());
    registry.add(&Device::example()).unwrap();

    let update: DeviceUpdate = serde_json::from_str(r#"{"ip": null, "broadcast": ""}"#).unwrap();
    assert!(registry.update("example-device", &update).unwrap());

    let device = registry.get("example-device").unwrap().unwrap();
    assert_eq!(device.ip, None);
    assert_eq!(device.broadcast, None);
    assert_eq!(device.mac, "00:11:22:33:44:55");
}

#[test]
fn test_remove_missing_is_not_an_error() {
    let registry = DeviceRegistry::new(setup_test_db());
    assert!(!registry.remove("ghost").unwrap());
}

#[test]
fn test_bootstrap_from_legacy_file_runs_once() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = dir.path().join("devices.json");
    std::fs::write(&legacy, r#"[{"name":"nas","mac":"00:11:22:33:44:55"}]"#).unwrap();

    let pool = db::init(dir.path().join("devices.db")).unwrap();
    let registry = DeviceRegistry::new(pool);

    assert_eq!(
        registry.load_devices(Some(&legacy)).unwrap(),
        Bootstrap::Migrated(1)
    );
    assert_eq!(names(&registry), ["nas"]);

    assert_eq!(
        registry.load_devices(Some(&legacy)).unwrap(),
        Bootstrap::Existing
    );
    assert_eq!(names(&registry), ["nas"]);
}

#[test]
fn test_bootstrap_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("devices.db");
    let legacy = dir.path().join("devices.json");

    {
        let registry = DeviceRegistry::new(db::init(&db_path).unwrap());
        assert_eq!(registry.load_devices(Some(&legacy)).unwrap(), Bootstrap::Seeded);
    }

    // Legacy file appears later; the store is authoritative now
    std::fs::write(&legacy, r#"[{"name":"nas","mac":"00:11:22:33:44:55"}]"#).unwrap();
    let registry = DeviceRegistry::new(db::init(&db_path).unwrap());

    assert_eq!(
        registry.load_devices(Some(&legacy)).unwrap(),
        Bootstrap::Existing
    );
    assert_eq!(names(&registry), ["example-device"]);
}

#[test]
fn test_bootstrap_malformed_legacy_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = dir.path().join("devices.json");
    std::fs::write(&legacy, "{ not json").unwrap();

    let registry = DeviceRegistry::new(setup_test_db());

    assert_eq!(
        registry.load_devices(Some(&legacy)).unwrap(),
        Bootstrap::Skipped
    );
    assert!(registry.list().unwrap().is_empty());
}

#[test]
fn test_bootstrap_skips_duplicate_legacy_entries() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = dir.path().join("devices.json");
    std::fs::write(
        &legacy,
        r#"[
            {"name":"nas","mac":"00:11:22:33:44:55","broadcast":"192.168.1.255"},
            {"name":"NAS","mac":"00:11:22:33:44:66"},
            {"name":"desktop","mac":"aa-bb-cc-dd-ee-ff","ip":"192.168.1.20"}
        ]"#,
    )
    .unwrap();

    let registry = DeviceRegistry::new(setup_test_db());

    assert_eq!(
        registry.load_devices(Some(&legacy)).unwrap(),
        Bootstrap::Migrated(2)
    );
    assert_eq!(names(&registry), ["desktop", "nas"]);
    assert_eq!(
        registry.get("nas").unwrap().unwrap().broadcast.as_deref(),
        Some("192.168.1.255")
    );
}

#[test]
fn test_concurrent_adds_yield_one_success() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(DeviceRegistry::new(
        db::init(dir.path().join("devices.db")).unwrap(),
    ));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let name = if i % 2 == 0 { "race" } else { "RACE" };
                registry.add(&Device::new(name, "00:11:22:33:44:55"))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(Error::DuplicateName(_))))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(duplicates, 7);
    assert_eq!(registry.list().unwrap().len(), 1);
}

#[test]
fn test_non_ascii_names_ignore_case() {
    let registry = DeviceRegistry::new(setup_test_db());
    registry.add(&Device::new("ÉCRAN", "00:11:22:33:44:55")).unwrap();

    let err = registry
        .add(&Device::new("écran", "00:11:22:33:44:66"))
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateName(_)));

    let lower = registry.get("écran").unwrap();
    assert_eq!(lower.as_ref().map(|d| d.name.as_str()), Some("ÉCRAN"));
    assert_eq!(lower, registry.get("ÉCRAN").unwrap());
    assert_eq!(registry.list().unwrap().len(), 1);

    let new_mac = DeviceUpdate {
        mac: Some("AA:BB:CC:DD:EE:FF".to_string()),
        ..DeviceUpdate::default()
    };
    assert!(registry.update("Écran", &new_mac).unwrap());
    assert!(registry.remove("écran").unwrap());
    assert!(registry.list().unwrap().is_empty());
}

#[test]
fn test_bootstrap_does_not_reseed_emptied_store() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("devices.db");
    let legacy = dir.path().join("devices.json");

    {
        let registry = DeviceRegistry::new(db::init(&db_path).unwrap());
        assert_eq!(registry.load_devices(Some(&legacy)).unwrap(), Bootstrap::Seeded);
        assert!(registry.remove("example-device").unwrap());
    }

    std::fs::write(&legacy, r#"[{"name":"nas","mac":"00:11:22:33:44:55"}]"#).unwrap();
    let registry = DeviceRegistry::new(db::init(&db_path).unwrap());

    assert_eq!(
        registry.load_devices(Some(&legacy)).unwrap(),
        Bootstrap::Existing
    );
    assert!(registry.list().unwrap().is_empty());
}

#[test]
fn test_concurrent_bootstrap_seeds_once() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("devices.db");
    db::init(&db_path).unwrap();

    // Separate pools stand in for separate processes
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = DeviceRegistry::new(db::init(&db_path).unwrap());
            thread::spawn(move || registry.load_devices(None))
        })
        .collect();

    let outcomes: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();

    let seeded = outcomes.iter().filter(|o| **o == Bootstrap::Seeded).count();
    let existing = outcomes
        .iter()
        .filter(|o| **o == Bootstrap::Existing)
        .count();
    assert_eq!(seeded, 1);
    assert_eq!(existing, 3);

    let registry = DeviceRegistry::new(db::init(&db_path).unwrap());
    assert_eq!(registry.list().unwrap(), vec![Device::example()]);
}
