//! Business logic services.
//!
//! - [`auth`] - Login and signup flows behind the auth prompt
//! - [`task`] - Cancellable round trips, in-flight markers and retries

pub mod auth;
pub mod task;
