//! Persistence store and session slot.
//!
//! # Responsibility
//! - Isolate SQLite query details from the controller and lock gate.
//! - Return semantic errors (`DuplicateKey`, `NotFound`) alongside storage
//!   failures.
//!
//! # Invariants
//! - Every write validates the record before touching SQL.
//! - Composite moves are transactional.

pub mod session_store;
pub mod task_repo;
