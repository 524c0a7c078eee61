//! PIN lock gate and time-boxed sessions.
//!
//! # Responsibility
//! - Gate app entry behind an optional PIN.
//! - Issue 30-minute sessions on PIN setup or successful verification.
//! - Drop the session on explicit lock or host auto-lock signals.
//!
//! # Invariants
//! - Only a SHA-256 digest of the PIN is stored, in a single slot.
//! - Lock state is always derived from the session store, never cached.
//! - Session expiry is absolute; activity does not extend it.
//! - `needs_unlock()` is the only predicate that decides app entry.

pub mod clock;
pub mod pin;
pub mod signal;

use crate::repo::session_store::SessionStore;
use crate::repo::task_repo::RepoResult;
use clock::Clock;
use log::{info, warn};
use pin::{digests_match, hash_pin};
use signal::LockSignal;

pub const PIN_KEY: &str = "taskapp_pin_hash";
pub const SESSION_KEY: &str = "taskapp_session";
/// Session lifetime after setup or unlock.
pub const SESSION_DURATION_MS: i64 = 30 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    NoPinConfigured,
    Locked,
    Unlocked,
}

/// PIN/session gate over an injected session store and clock.
pub struct LockGate<S: SessionStore, C: Clock> {
    store: S,
    clock: C,
}

impl<S: SessionStore, C: Clock> LockGate<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Stores the digest of `pin` and opens a fresh session.
    ///
    /// Length and confirmation rules belong to the caller; see
    /// [`pin::validate_new_pin`].
    pub fn setup_pin(&self, pin: &str) -> RepoResult<()> {
        self.store.set(PIN_KEY, &hash_pin(pin))?;
        self.create_session()?;
        info!("event=pin_setup module=auth status=ok");
        Ok(())
    }

    /// Returns whether `pin` matches the stored digest. A match opens a
    /// fresh session; no stored PIN never matches.
    pub fn verify_pin(&self, pin: &str) -> RepoResult<bool> {
        let Some(stored) = self.store.get(PIN_KEY)? else {
            return Ok(false);
        };
        if !digests_match(&stored, &hash_pin(pin)) {
            warn!("event=pin_verify module=auth status=rejected");
            return Ok(false);
        }
        self.create_session()?;
        info!("event=pin_verify module=auth status=ok");
        Ok(true)
    }

    pub fn has_pin(&self) -> RepoResult<bool> {
        Ok(self.store.get(PIN_KEY)?.is_some())
    }

    /// Clears the PIN digest and any active session.
    pub fn remove_pin(&self) -> RepoResult<()> {
        self.store.remove(PIN_KEY)?;
        self.store.remove(SESSION_KEY)?;
        info!("event=pin_remove module=auth status=ok");
        Ok(())
    }

    /// Removes the PIN only after re-verifying `current_pin`.
    ///
    /// Returns `false` and changes nothing when the PIN does not match.
    pub fn remove_pin_verified(&self, current_pin: &str) -> RepoResult<bool> {
        if !self.verify_pin(current_pin)? {
            return Ok(false);
        }
        self.remove_pin()?;
        Ok(true)
    }

    pub fn is_session_valid(&self) -> RepoResult<bool> {
        Ok(self
            .session_expiry()?
            .is_some_and(|expiry| self.clock.now_ms() < expiry))
    }

    /// True iff a PIN is configured and no valid session exists.
    pub fn needs_unlock(&self) -> RepoResult<bool> {
        Ok(self.has_pin()? && !self.is_session_valid()?)
    }

    pub fn state(&self) -> RepoResult<LockState> {
        if !self.has_pin()? {
            return Ok(LockState::NoPinConfigured);
        }
        if self.is_session_valid()? {
            Ok(LockState::Unlocked)
        } else {
            Ok(LockState::Locked)
        }
    }

    /// Returns the absolute session expiry in epoch ms, if a session exists.
    pub fn session_expiry(&self) -> RepoResult<Option<i64>> {
        let Some(raw) = self.store.get(SESSION_KEY)? else {
            return Ok(None);
        };
        match raw.trim().parse::<i64>() {
            Ok(expiry) => Ok(Some(expiry)),
            Err(_) => {
                warn!("event=session_read module=auth status=invalid value_len={}", raw.len());
                Ok(None)
            }
        }
    }

    pub fn clear_session(&self) -> RepoResult<()> {
        self.store.remove(SESSION_KEY)
    }

    /// Explicit lock action.
    pub fn lock(&self) -> RepoResult<()> {
        self.clear_session()?;
        info!("event=lock module=auth status=ok reason=explicit");
        Ok(())
    }

    /// Applies a host signal. With a PIN configured the session is cleared;
    /// returns `true` when the caller must re-lock immediately (`Hidden`).
    pub fn handle_signal(&self, signal: LockSignal) -> RepoResult<bool> {
        if !self.has_pin()? {
            return Ok(false);
        }
        self.clear_session()?;
        Ok(signal == LockSignal::Hidden)
    }

    fn create_session(&self) -> RepoResult<()> {
        let expiry = self.clock.now_ms() + SESSION_DURATION_MS;
        self.store.set(SESSION_KEY, &expiry.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::clock::ManualClock;
    use super::signal::LockSignal;
    use super::{LockGate, LockState, SESSION_DURATION_MS};
    use crate::repo::session_store::MemorySessionStore;

    fn gate(clock: &ManualClock) -> LockGate<MemorySessionStore, &ManualClock> {
        LockGate::new(MemorySessionStore::new(), clock)
    }

    #[test]
    fn fresh_gate_has_no_pin_and_needs_no_unlock() {
        let clock = ManualClock::new(0);
        let gate = gate(&clock);
        assert_eq!(gate.state().unwrap(), LockState::NoPinConfigured);
        assert!(!gate.needs_unlock().unwrap());
        assert!(!gate.verify_pin("1234").unwrap());
    }

    #[test]
    fn session_expires_after_thirty_minutes_without_sliding() {
        let clock = ManualClock::new(1_000);
        let gate = gate(&clock);
        gate.setup_pin("1234").unwrap();

        clock.advance(SESSION_DURATION_MS - 1);
        assert!(gate.is_session_valid().unwrap());
        assert_eq!(gate.state().unwrap(), LockState::Unlocked);

        clock.advance(1);
        assert!(!gate.is_session_valid().unwrap());
        assert_eq!(gate.state().unwrap(), LockState::Locked);
    }

    #[test]
    fn failed_verify_keeps_gate_locked() {
        let clock = ManualClock::new(0);
        let gate = gate(&clock);
        gate.setup_pin("1234").unwrap();
        gate.lock().unwrap();

        assert!(!gate.verify_pin("0000").unwrap());
        assert!(gate.needs_unlock().unwrap());
        assert!(gate.verify_pin("1234").unwrap());
        assert!(!gate.needs_unlock().unwrap());
    }

    #[test]
    fn unloading_clears_session_without_relock_notice() {
        let clock = ManualClock::new(0);
        let gate = gate(&clock);
        gate.setup_pin("1234").unwrap();

        assert!(!gate.handle_signal(LockSignal::Unloading).unwrap());
        assert!(gate.needs_unlock().unwrap());
    }

    #[test]
    fn signals_are_ignored_without_pin() {
        let clock = ManualClock::new(0);
        let gate = gate(&clock);
        assert!(!gate.handle_signal(LockSignal::Hidden).unwrap());
    }

    #[test]
    fn remove_pin_verified_requires_current_pin() {
        let clock = ManualClock::new(0);
        let gate = gate(&clock);
        gate.setup_pin("1234").unwrap();

        assert!(!gate.remove_pin_verified("9999").unwrap());
        assert!(gate.has_pin().unwrap());
        assert!(gate.remove_pin_verified("1234").unwrap());
        assert_eq!(gate.state().unwrap(), LockState::NoPinConfigured);
        assert_eq!(gate.session_expiry().unwrap(), None);
    }
}
