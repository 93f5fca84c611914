//! Per-client portal state.

pub mod portal;

pub use portal::{
    AuthOutcome, LandingView, NavView, Portal, PortalContext, PortalRegistry, session_keys,
};
