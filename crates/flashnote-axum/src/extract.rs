//! Request extractor for the per-session flash store.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};

use flashnote_core::FlashStore;

/// Extractor handing handlers the request's session-scoped [`FlashStore`].
///
/// Requires the [`attach_flash`](crate::attach_flash) middleware on the
/// router; without it the extractor rejects with 500.
#[derive(Clone)]
pub struct Flash(pub Arc<FlashStore>);

impl std::ops::Deref for Flash {
    type Target = FlashStore;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Arc<FlashStore>>()
            .cloned()
            .map(Flash)
            .ok_or_else(|| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "flash middleware not installed; layer attach_flash onto the router"
                        .to_string(),
                )
            })
    }
}
