//! Client portal extractor.
//!
//! Resolves the [`Portal`] of the requesting client from the id kept in its
//! cookie session, assigning a fresh id on the first request.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Portal, session_keys};
use crate::state::AppState;

/// Extractor for the requesting client's portal.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(ClientPortal(portal): ClientPortal) -> impl IntoResponse {
///     Json(portal.landing())
/// }
/// ```
pub struct ClientPortal(pub Arc<Portal>);

impl FromRequestParts<AppState> for ClientPortal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let stored: Option<Uuid> = session
            .get(session_keys::CLIENT_ID)
            .await
            .map_err(|e| AppError::Internal(format!("session read failed: {e}")))?;

        let client_id = match stored {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4();
                session
                    .insert(session_keys::CLIENT_ID, id)
                    .await
                    .map_err(|e| AppError::Internal(format!("session write failed: {e}")))?;
                tracing::debug!(client_id = %id, "New client session");
                id
            }
        };

        Ok(Self(state.portals().get_or_create(client_id)))
    }
}
