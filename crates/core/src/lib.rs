//! RePlate Core - Shared types library.
//!
//! This crate provides the domain model used by every RePlate component:
//! - `portal` - JSON service hosting the role dashboards
//! - `integration-tests` - Cross-crate scenario tests
//!
//! # Architecture
//!
//! The core crate contains only types and state machines - no I/O, no
//! backend access, no async runtime. Everything here is deterministic and
//! testable without a server.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs and emails, roles, statuses, donations
//! - [`session`] - Session model (identity + auth prompt state)
//! - [`dashboard`] - Role to dashboard routing and admin tabs
//! - [`notice`] - User-facing toast notices
//! - [`time`] - Relative time formatting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod dashboard;
pub mod notice;
pub mod session;
pub mod time;
pub mod types;

pub use session::{Session, SessionError, SessionView};
pub use types::*;
