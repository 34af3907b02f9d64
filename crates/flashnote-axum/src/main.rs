//! Flashnote demo server.
//!
//! Queue a message with `/set?msg=...`, follow the redirect to `/show`, and
//! watch the message render exactly once.

use std::sync::Arc;

use axum::extract::Query;
use axum::response::{Html, Redirect};
use axum::routing::get;
use axum::{middleware, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use flashnote_axum::{attach_flash, Flash, FlashPlugin};
use flashnote_core::{FlashConfig, FlashToken, MemoryStore, RenderContext};

#[derive(Deserialize)]
struct SetParams {
    msg: String,
}

async fn set_message(flash: Flash, Query(params): Query<SetParams>) -> Redirect {
    if let Err(err) = flash.enqueue(&[json!(params.msg)]) {
        tracing::warn!("failed to queue flash message: {err}");
    }
    Redirect::to("/show")
}

async fn show_messages(flash: Flash) -> Html<String> {
    let mut ctx = RenderContext::new();
    if let Err(err) = flash.prepare_for_render(&mut ctx) {
        tracing::warn!("failed to prepare render context: {err}");
    }

    let rendered = match ctx.get(&flash.config().token_name) {
        Some(FlashToken::Lazy(accessor)) => accessor.resolve().ok().flatten(),
        Some(FlashToken::Eager(value)) => value.clone(),
        _ => None,
    };

    match rendered {
        Some(value) => Html(format!("<p>flash: {value}</p>")),
        None => Html("<p>no messages</p>".to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let plugin = Arc::new(FlashPlugin::new(
        FlashConfig::default(),
        Arc::new(MemoryStore::new()),
    )?);

    let app = Router::new()
        .route("/set", get(set_message))
        .route("/show", get(show_messages))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&plugin),
            attach_flash,
        ))
        .layer(TraceLayer::new_for_http());

    let addr = std::env::var("FLASHNOTE_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("flashnote demo listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
