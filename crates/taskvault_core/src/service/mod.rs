//! Use-case layer between the front end and the store.
//!
//! # Responsibility
//! - Orchestrate store calls into task/category lifecycle operations.
//! - Keep the CLI decoupled from SQLite details.

pub mod task_service;
