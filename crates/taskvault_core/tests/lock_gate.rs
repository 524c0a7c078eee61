use std::cell::Cell;
use taskvault_core::db::{open_db, open_db_in_memory};
use taskvault_core::{
    auto_lock, LockGate, LockSignal, LockState, ManualClock, SignalHub, SqliteSessionStore,
    SESSION_DURATION_MS,
};

#[test]
fn setup_pin_unlocks_until_session_is_cleared() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(1_700_000_000_000);
    let gate = LockGate::new(SqliteSessionStore::new(&conn), &clock);

    gate.setup_pin("1234").unwrap();
    assert!(gate.has_pin().unwrap());
    assert!(!gate.needs_unlock().unwrap());

    gate.clear_session().unwrap();
    assert!(gate.needs_unlock().unwrap());
    assert_eq!(gate.state().unwrap(), LockState::Locked);
}

#[test]
fn pin_and_session_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskvault.sqlite3");
    let clock = ManualClock::new(0);

    {
        let conn = open_db(&path).unwrap();
        LockGate::new(SqliteSessionStore::new(&conn), &clock)
            .setup_pin("2468")
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let gate = LockGate::new(SqliteSessionStore::new(&conn), &clock);
    assert_eq!(gate.state().unwrap(), LockState::Unlocked);
    assert_eq!(gate.session_expiry().unwrap(), Some(SESSION_DURATION_MS));

    clock.advance(SESSION_DURATION_MS);
    assert!(gate.needs_unlock().unwrap());
    assert!(gate.verify_pin("2468").unwrap());
    assert_eq!(
        gate.session_expiry().unwrap(),
        Some(2 * SESSION_DURATION_MS)
    );
}

#[test]
fn hidden_signal_relocks_through_subscription() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(0);
    let gate = LockGate::new(SqliteSessionStore::new(&conn), &clock);
    let relocks = Cell::new(0);
    let hub = SignalHub::new();

    gate.setup_pin("1234").unwrap();
    let subscription = auto_lock(&hub, &gate, || relocks.set(relocks.get() + 1));

    hub.dispatch(LockSignal::Hidden);
    assert_eq!(relocks.get(), 1);
    assert!(gate.needs_unlock().unwrap());

    assert!(gate.verify_pin("1234").unwrap());
    hub.dispatch(LockSignal::Unloading);
    assert_eq!(relocks.get(), 1);
    assert!(gate.needs_unlock().unwrap());

    drop(subscription);
    assert!(gate.verify_pin("1234").unwrap());
    hub.dispatch(LockSignal::Hidden);
    assert!(!gate.needs_unlock().unwrap());
}

#[test]
fn hidden_signal_without_pin_does_not_relock() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(0);
    let gate = LockGate::new(SqliteSessionStore::new(&conn), &clock);
    let relocks = Cell::new(0);
    let hub = SignalHub::new();
    let _subscription = auto_lock(&hub, &gate, || relocks.set(relocks.get() + 1));

    hub.dispatch(LockSignal::Hidden);
    assert_eq!(relocks.get(), 0);
    assert_eq!(gate.state().unwrap(), LockState::NoPinConfigured);
}
