//! # streamchat - Streaming chat client for a local inference server
//!
//! A small, pragmatic Rust library that drives a conversation against a
//! locally running Ollama-compatible inference server and surfaces the
//! streamed response incrementally.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - In-memory transcript owned by one session object (no globals)
//! - Newline-delimited JSON (NDJSON) stream decoding that is safe against
//!   lines and multi-byte characters split across network chunks
//! - Health probe and model listing against the server's tags endpoint
//!
//! ## Architecture
//!
//! The crate has one core component, [`ChatSession`]:
//!
//! 1. **`send_turn`** appends the user message, issues one streaming chat
//!    request, feeds the caller's sink as content fragments decode, and
//!    appends the final assistant text on completion.
//! 2. **`check_availability`** / **`list_models`** probe the server.
//!
//! Lower layers ([`ndjson`], [`http`], [`model`], [`options`]) are public
//! for callers that want raw line streams or custom wiring.
//!
//! ## Example
//! ```no_run
//! use streamchat::options::{ModelOptions, TransportOptions};
//! use streamchat::session::{Availability, ChatSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = ChatSession::new(
//!         ModelOptions::new().with_model("qwen2.5:7b".to_string()),
//!         TransportOptions::new(),
//!     );
//!
//!     if session.check_availability().await == Availability::Unavailable {
//!         eprintln!("inference server is not running");
//!         return Ok(());
//!     }
//!
//!     let reply = session
//!         .send_turn("Hello!", Some("Answer briefly."), |partial| {
//!             print!("\r{partial}");
//!         })
//!         .await?;
//!     println!("\nassistant: {reply}");
//!     Ok(())
//! }
//! ```

pub mod http;
pub mod model;
pub mod ndjson;
pub mod options;
pub mod session;

// Re-exports for convenience
pub use model::{Message, Role};
pub use ndjson::{LineDecoder, NdjsonResponseExt};
pub use options::{ModelOptions, TransportOptions};
pub use session::{Availability, ChatError, ChatSession, SessionState};
