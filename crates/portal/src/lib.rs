//! RePlate Portal library.
//!
//! Hosts the role dashboards behind a JSON API. The library half holds the
//! workflow services and backend contract so they can be exercised without
//! a listening socket.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use routes::app;
