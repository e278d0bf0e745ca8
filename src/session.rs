//! The streaming chat session: transcript ownership and turn-by-turn
//! request/response handling.

use futures::StreamExt;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, warn};

use crate::http::build_http_client;
use crate::model::{ChatRequest, ChatStreamRecord, Message, ModelTags};
use crate::ndjson::NdjsonResponseExt;
use crate::options::{ModelOptions, TransportOptions};

/// Errors that can occur during a chat turn or probe.
///
/// None of these are fatal to the session: it returns to a usable state
/// and the next turn may succeed.
#[derive(Error, Debug)]
pub enum ChatError {
    /// The endpoint could not be reached at all.
    #[error("cannot reach inference server: {0}")]
    Connectivity(#[source] reqwest::Error),

    /// The endpoint answered with a non-success status code.
    #[error("server returned HTTP {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },

    /// The response body failed mid-stream, or a fully read body could
    /// not be decoded (the tags listing).
    #[error("failed to read response body: {0}")]
    StreamRead(#[source] reqwest::Error),
}

/// Lifecycle state of a session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No turn in flight; ready for the next one.
    Idle,
    /// A request/stream cycle is running.
    AwaitingResponse,
    /// The last turn failed. The next `send_turn` proceeds normally.
    Error,
}

/// Result of probing the inference server.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable,
}

/// A chat session against a locally running inference server.
///
/// The session owns the conversation transcript. Each [`send_turn`] call
/// appends the user message, streams the assistant response through the
/// caller's sink, and appends the fully accumulated assistant text once
/// the stream completes. Failed turns never append partial assistant
/// text.
///
/// At most one turn is in flight per session; `send_turn` takes
/// `&mut self`, so overlapping turns are ruled out at compile time.
///
/// [`send_turn`]: ChatSession::send_turn
///
/// # Example
/// ```no_run
/// use streamchat::options::{ModelOptions, TransportOptions};
/// use streamchat::session::ChatSession;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut session = ChatSession::new(ModelOptions::new(), TransportOptions::new());
///
///     let reply = session
///         .send_turn("Hello!", None, |partial| print!("\r{partial}"))
///         .await?;
///     println!("\nassistant: {reply}");
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct ChatSession {
    model_options: ModelOptions,
    transport_options: TransportOptions,
    transcript: Vec<Message>,
    state: SessionState,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(ModelOptions::new(), TransportOptions::new())
    }
}

impl ChatSession {
    /// Create a session with an empty transcript.
    pub fn new(model_options: ModelOptions, transport_options: TransportOptions) -> Self {
        Self {
            model_options,
            transport_options,
            transcript: Vec::new(),
            state: SessionState::Idle,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The conversation so far, in insertion order.
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Clear the transcript and return to [`SessionState::Idle`].
    /// No network call is made.
    pub fn reset(&mut self) {
        self.transcript.clear();
        self.state = SessionState::Idle;
    }

    /// Probe the server's tags endpoint.
    ///
    /// Returns [`Availability::Available`] iff the probe answers with a
    /// success status. Never returns an error: network failures and bad
    /// statuses both collapse into `Unavailable`.
    pub async fn check_availability(&self) -> Availability {
        match self.fetch_tags().await {
            Ok(_) => Availability::Available,
            Err(e) => {
                debug!(error = %e, "availability probe failed");
                Availability::Unavailable
            }
        }
    }

    /// List the models installed on the server, by name.
    pub async fn list_models(&self) -> Result<Vec<String>, ChatError> {
        let response = self.fetch_tags().await?;
        let tags: ModelTags = response.json().await.map_err(ChatError::StreamRead)?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Run one turn: send `user_text` (with the full prior transcript and
    /// an optional system prompt) and stream the assistant response.
    ///
    /// `on_token` is invoked with the running accumulated text each time
    /// a new content fragment is decoded. On success the final text is
    /// appended to the transcript and returned. On failure nothing is
    /// appended for the assistant side; the user message stays.
    ///
    /// `user_text` must be non-empty after trimming; blank input is the
    /// caller's responsibility to filter out.
    pub async fn send_turn(
        &mut self,
        user_text: &str,
        system_prompt: Option<&str>,
        mut on_token: impl FnMut(&str),
    ) -> Result<String, ChatError> {
        let user_text = user_text.trim();
        debug_assert!(!user_text.is_empty(), "send_turn requires non-blank input");

        self.state = SessionState::AwaitingResponse;
        self.transcript.push(Message::user(user_text));

        match self.run_turn(system_prompt, &mut on_token).await {
            Ok(text) => {
                self.transcript.push(Message::assistant(text.clone()));
                self.state = SessionState::Idle;
                Ok(text)
            }
            Err(e) => {
                self.state = SessionState::Error;
                Err(e)
            }
        }
    }

    /// Issue the chat request and consume the NDJSON stream. Transcript
    /// updates happen in `send_turn`, not here.
    async fn run_turn(
        &self,
        system_prompt: Option<&str>,
        on_token: &mut impl FnMut(&str),
    ) -> Result<String, ChatError> {
        let mut messages = Vec::with_capacity(self.transcript.len() + 1);
        if let Some(prompt) = system_prompt.map(str::trim).filter(|p| !p.is_empty()) {
            messages.push(Message::system(prompt));
        }
        messages.extend(self.transcript.iter().cloned());

        let request = ChatRequest {
            model: self.model_options.model.clone(),
            stream: true,
            messages,
            options: self.model_options.sampling_params(),
        };

        let client = build_http_client(&self.transport_options).map_err(ChatError::Connectivity)?;
        let url = self.transport_options.chat_url();
        debug!(%url, model = %request.model, messages = request.messages.len(), "sending chat request");

        let response = client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(ChatError::Connectivity)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::HttpStatus { status, body });
        }

        let mut accumulator = String::new();
        let mut lines = std::pin::pin!(response.ndjson_lines());

        while let Some(line) = lines.next().await {
            let line = line?;

            let record: ChatStreamRecord = match serde_json::from_str(&line) {
                Ok(record) => record,
                Err(e) => {
                    // Malformed server output is tolerated, not surfaced.
                    warn!(error = %e, "skipping unparseable stream line");
                    continue;
                }
            };

            if let Some(content) = record.message.and_then(|m| m.content) {
                if !content.is_empty() {
                    accumulator.push_str(&content);
                    on_token(&accumulator);
                }
            }
        }

        debug!(chars = accumulator.len(), "stream complete");
        Ok(accumulator)
    }

    /// GET the tags endpoint, mapping failures into the error taxonomy.
    async fn fetch_tags(&self) -> Result<reqwest::Response, ChatError> {
        let client = build_http_client(&self.transport_options).map_err(ChatError::Connectivity)?;
        let response = client
            .get(self.transport_options.tags_url())
            .send()
            .await
            .map_err(ChatError::Connectivity)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::HttpStatus { status, body });
        }
        Ok(response)
    }
}
