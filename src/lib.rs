//! LeafLink: track houseplants and their watering schedules.
//!
//! The core is a dual-backend plant store (a Supabase-style remote
//! datastore or a local JSON file), a pure schedule evaluator, and a
//! garden controller that applies optimistic updates with rollback.
//! The binary in `main.rs` wraps this in a CLI and an interactive shell.

pub mod advice;
pub mod clock;
pub mod config;
pub mod garden;
pub mod logging;
pub mod notify;
pub mod notify_email;
pub mod plant;
pub mod schedule;
pub mod session;
pub mod storage;
pub mod store;
