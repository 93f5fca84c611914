//! Application state shared across handlers.

use std::sync::Arc;

use chrono::Utc;

use crate::backend::{InMemoryBackend, SharedDonationBackend, SharedIdentityBackend};
use crate::config::PortalConfig;
use crate::middleware::SESSION_IDLE_TIMEOUT;
use crate::models::{PortalContext, PortalRegistry};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration and every client's portal.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PortalConfig,
    portals: PortalRegistry,
}

impl AppState {
    /// Create a new application state around the given backends.
    #[must_use]
    pub fn new(
        config: PortalConfig,
        donations: SharedDonationBackend,
        identities: SharedIdentityBackend,
    ) -> Self {
        let portals = PortalRegistry::new(
            PortalContext {
                donations,
                identities,
                settings: config.task_settings(),
            },
            config.max_portals,
            SESSION_IDLE_TIMEOUT,
        );
        Self {
            inner: Arc::new(AppStateInner { config, portals }),
        }
    }

    /// Create the state with an in-memory backend, seeded with the demo
    /// dataset when `seed_demo` is set.
    #[must_use]
    pub fn from_config(config: PortalConfig) -> Self {
        let backend = Arc::new(if config.seed_demo {
            InMemoryBackend::seeded(Utc::now())
        } else {
            InMemoryBackend::new()
        });
        Self::new(config, Arc::clone(&backend) as SharedDonationBackend, backend)
    }

    /// Get a reference to the portal configuration.
    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    /// Get a reference to the per-client portals.
    #[must_use]
    pub fn portals(&self) -> &PortalRegistry {
        &self.inner.portals
    }
}
