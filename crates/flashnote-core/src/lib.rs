//! flashnote-core: session-backed flash notification messages.
//!
//! Flash messages are values shown exactly once: queued during one request,
//! stored in the user's session, and consumed while rendering a later
//! response. A [`FlashStore`] is configured at startup with a queueing style
//! (how enqueued values accumulate), an argument style (how one call's
//! values collapse into a payload), and a dequeue style (when stored values
//! leave the session relative to render time).
//!
//! The session backend is an injected [`SessionStore`] collaborator; this
//! crate ships [`MemoryStore`] as the in-process reference implementation
//! and test double.
//!
//! # Quick start
//! ```
//! use std::sync::Arc;
//! use flashnote_core::{FlashConfig, FlashStore, FlashToken, MemoryStore, RenderContext};
//! use serde_json::json;
//!
//! let session = Arc::new(MemoryStore::new());
//! let flash = FlashStore::new(FlashConfig::default(), session).unwrap();
//! flash.enqueue(&[json!("profile saved")]).unwrap();
//!
//! // Before the view runs, the host pipeline prepares the render context.
//! let mut ctx = RenderContext::new();
//! flash.prepare_for_render(&mut ctx).unwrap();
//! if let Some(FlashToken::Lazy(accessor)) = ctx.get("flash") {
//!     assert_eq!(accessor.resolve().unwrap(), Some(json!(["profile saved"])));
//! }
//! ```

pub mod config;
pub mod flash;
pub mod reduce;
pub mod render;
pub mod store;

pub use config::*;
pub use flash::*;
pub use reduce::*;
pub use render::*;
pub use store::*;
