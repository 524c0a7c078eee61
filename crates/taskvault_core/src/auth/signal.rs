//! Environment signals that force an auto-lock.
//!
//! # Responsibility
//! - Fan out `LockSignal`s from the host (window hidden, process exiting)
//!   to registered observers.
//! - Tie each registration to a `Subscription` guard that unregisters on drop.
//!
//! # Invariants
//! - Observers must not subscribe or drop subscriptions from inside a
//!   dispatch callback.

use super::clock::Clock;
use super::LockGate;
use crate::repo::session_store::SessionStore;
use log::{error, info};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Host event that may end the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockSignal {
    /// The app is no longer visible (tab hidden, terminal detached).
    Hidden,
    /// The app is about to exit.
    Unloading,
}

impl LockSignal {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::Unloading => "unloading",
        }
    }
}

type Observer<'a> = Box<dyn FnMut(LockSignal) + 'a>;
type ObserverList<'a> = RefCell<Vec<(u64, Observer<'a>)>>;

/// Single-threaded observer registry for [`LockSignal`]s.
#[derive(Default)]
pub struct SignalHub<'a> {
    observers: Rc<ObserverList<'a>>,
    next_id: Cell<u64>,
}

impl<'a> SignalHub<'a> {
    pub fn new() -> Self {
        Self {
            observers: Rc::new(RefCell::new(Vec::new())),
            next_id: Cell::new(0),
        }
    }

    /// Registers `observer` until the returned guard is dropped.
    #[must_use = "dropping the subscription unregisters the observer"]
    pub fn subscribe(&self, observer: impl FnMut(LockSignal) + 'a) -> Subscription<'a> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.observers.borrow_mut().push((id, Box::new(observer)));
        Subscription {
            id,
            observers: Rc::downgrade(&self.observers),
        }
    }

    /// Delivers `signal` to every live observer in registration order.
    pub fn dispatch(&self, signal: LockSignal) {
        for (_, observer) in self.observers.borrow_mut().iter_mut() {
            observer(signal);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }
}

/// Registration guard returned by [`SignalHub::subscribe`].
pub struct Subscription<'a> {
    id: u64,
    observers: Weak<ObserverList<'a>>,
}

impl Drop for Subscription<'_> {
    fn drop(&mut self) {
        if let Some(observers) = self.observers.upgrade() {
            observers.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}

/// Wires `gate` to `hub`: every signal clears the session when a PIN is
/// configured, and `on_lock` runs when the app must show the lock screen now.
pub fn auto_lock<'a, S, C>(
    hub: &SignalHub<'a>,
    gate: &'a LockGate<S, C>,
    mut on_lock: impl FnMut() + 'a,
) -> Subscription<'a>
where
    S: SessionStore,
    C: Clock,
{
    hub.subscribe(move |signal| match gate.handle_signal(signal) {
        Ok(true) => {
            info!(
                "event=auto_lock module=auth status=ok signal={}",
                signal.as_str()
            );
            on_lock();
        }
        Ok(false) => {}
        Err(err) => error!(
            "event=auto_lock module=auth status=error signal={} error={}",
            signal.as_str(),
            err
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::{LockSignal, SignalHub};
    use std::cell::RefCell;

    #[test]
    fn dropping_subscription_unregisters_observer() {
        let seen = RefCell::new(Vec::new());
        let hub = SignalHub::new();
        let subscription = hub.subscribe(|signal| seen.borrow_mut().push(signal));

        hub.dispatch(LockSignal::Hidden);
        drop(subscription);
        hub.dispatch(LockSignal::Unloading);

        assert_eq!(*seen.borrow(), vec![LockSignal::Hidden]);
        assert_eq!(hub.observer_count(), 0);
    }

    #[test]
    fn subscription_outliving_hub_drops_cleanly() {
        let hub = SignalHub::new();
        let subscription = hub.subscribe(|_| {});
        drop(hub);
        drop(subscription);
    }
}
