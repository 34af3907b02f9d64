//! Axum integration for flashnote.
//!
//! Attaches a per-session [`FlashStore`] to every request: the
//! [`attach_flash`] middleware resolves the session id from a cookie
//! (issuing one when missing), scopes the shared session backend to that
//! id, and stores the flash handle in request extensions for the
//! [`Flash`] extractor.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use axum::{middleware, routing::get, Router};
//! use flashnote_axum::{attach_flash, Flash, FlashPlugin};
//! use flashnote_core::{FlashConfig, MemoryStore};
//!
//! let plugin = Arc::new(
//!     FlashPlugin::new(FlashConfig::default(), Arc::new(MemoryStore::new()))?,
//! );
//! let app: Router = Router::new()
//!     .route("/", get(|flash: Flash| async move { "ok" }))
//!     .layer(middleware::from_fn_with_state(plugin, attach_flash));
//! ```

pub mod cookie;
pub mod extract;

pub use extract::Flash;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header::SET_COOKIE, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

use flashnote_core::{ConfigError, FlashConfig, FlashStore, SessionError, SessionStore};
use serde_json::Value;

/// Shared plugin state: the validated configuration plus the backing
/// session store all per-session views are carved out of.
pub struct FlashPlugin {
    config: FlashConfig,
    backend: Arc<dyn SessionStore>,
    cookie_name: String,
}

impl FlashPlugin {
    /// Default session-id cookie name.
    pub const DEFAULT_COOKIE: &'static str = "flashnote.sid";

    /// Build the plugin, validating `config` up front. Fails startup on an
    /// invalid configuration.
    pub fn new(config: FlashConfig, backend: Arc<dyn SessionStore>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            backend,
            cookie_name: Self::DEFAULT_COOKIE.to_string(),
        })
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Build the flash store for one session id.
    pub fn store_for(&self, session_id: &str) -> Result<FlashStore, ConfigError> {
        let scoped = ScopedStore::new(Arc::clone(&self.backend), session_id);
        FlashStore::new(self.config.clone(), Arc::new(scoped))
    }
}

/// Session backend view namespaced by session id.
///
/// Keys are prefixed with the session id so one process-wide backend
/// serves every session without collisions.
pub struct ScopedStore {
    inner: Arc<dyn SessionStore>,
    prefix: String,
}

impl ScopedStore {
    pub fn new(inner: Arc<dyn SessionStore>, session_id: &str) -> Self {
        Self {
            inner,
            prefix: session_id.to_string(),
        }
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }
}

impl SessionStore for ScopedStore {
    fn get(&self, key: &str) -> Result<Option<Value>, SessionError> {
        self.inner.get(&self.scoped(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), SessionError> {
        self.inner.set(&self.scoped(key), value)
    }

    fn remove(&self, key: &str) -> Result<Option<Value>, SessionError> {
        self.inner.remove(&self.scoped(key))
    }
}

/// Middleware attaching a session-scoped [`FlashStore`] to the request.
///
/// Wire it with `axum::middleware::from_fn_with_state(plugin, attach_flash)`.
/// Issues a session-id cookie on the response when the request carried none.
pub async fn attach_flash(
    State(plugin): State<Arc<FlashPlugin>>,
    mut request: Request,
    next: Next,
) -> Response {
    let (session_id, issued) = match cookie::read_cookie(request.headers(), &plugin.cookie_name) {
        Some(id) => (id, false),
        None => (cookie::new_session_id(), true),
    };

    match plugin.store_for(&session_id) {
        Ok(store) => {
            request.extensions_mut().insert(Arc::new(store));
        }
        // Unreachable after construction-time validation; keep the request
        // flowing and let the extractor reject with 500.
        Err(err) => tracing::error!("flash configuration rejected at request time: {err}"),
    }

    let mut response = next.run(request).await;

    if issued {
        tracing::debug!(session_id = %session_id, "issued flash session cookie");
        let raw = cookie::set_cookie_value(&plugin.cookie_name, &session_id);
        if let Ok(value) = HeaderValue::from_str(&raw) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header::COOKIE, Request as HttpRequest, StatusCode};
    use axum::middleware;
    use axum::routing::get;
    use axum::Router;
    use flashnote_core::{FlashToken, MemoryStore, RenderContext};
    use serde_json::json;
    use tower::ServiceExt;

    fn plugin() -> Arc<FlashPlugin> {
        Arc::new(
            FlashPlugin::new(FlashConfig::default(), Arc::new(MemoryStore::new())).unwrap(),
        )
    }

    async fn queue_message(flash: Flash) -> &'static str {
        flash.enqueue(&[json!("ping")]).unwrap();
        "queued"
    }

    async fn render_messages(flash: Flash) -> String {
        let mut ctx = RenderContext::new();
        flash.prepare_for_render(&mut ctx).unwrap();
        match ctx.get("flash") {
            Some(FlashToken::Lazy(accessor)) => accessor
                .resolve()
                .unwrap()
                .map(|value| value.to_string())
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    fn app(plugin: Arc<FlashPlugin>) -> Router {
        Router::new()
            .route("/queue", get(queue_message))
            .route("/render", get(render_messages))
            .layer(middleware::from_fn_with_state(plugin, attach_flash))
    }

    #[test]
    fn scoped_store_isolates_sessions() {
        let backend: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
        let first = ScopedStore::new(Arc::clone(&backend), "session-1");
        let second = ScopedStore::new(Arc::clone(&backend), "session-2");

        first.set("_flash", json!("one")).unwrap();
        second.set("_flash", json!("two")).unwrap();
        assert_eq!(first.get("_flash").unwrap(), Some(json!("one")));
        assert_eq!(second.get("_flash").unwrap(), Some(json!("two")));

        first.remove("_flash").unwrap();
        assert_eq!(second.get("_flash").unwrap(), Some(json!("two")));
    }

    #[tokio::test]
    async fn middleware_issues_session_cookie_once() {
        let app = app(plugin());

        let response = app
            .clone()
            .oneshot(HttpRequest::get("/queue").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = response
            .headers()
            .get(SET_COOKIE)
            .expect("new session gets a cookie")
            .to_str()
            .unwrap();
        assert!(set_cookie.starts_with("flashnote.sid="));

        // Replaying the cookie reuses the session; no new cookie is issued.
        let pair = set_cookie.split(';').next().unwrap().to_string();
        let response = app
            .oneshot(
                HttpRequest::get("/queue")
                    .header(COOKIE, &pair)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn flash_survives_to_the_next_request() {
        let app = app(plugin());

        let response = app
            .clone()
            .oneshot(HttpRequest::get("/queue").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let pair = response
            .headers()
            .get(SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();

        let response = app
            .oneshot(
                HttpRequest::get("/render")
                    .header(COOKIE, &pair)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), br#"["ping"]"#);
    }

    #[tokio::test]
    async fn missing_middleware_rejects_with_500() {
        let app = Router::new().route("/queue", get(queue_message));
        let response = app
            .oneshot(HttpRequest::get("/queue").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
