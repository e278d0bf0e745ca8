//! Options structures for model and transport configuration.

use std::time::Duration;

use crate::model::SamplingParams;

/// Base URL of a locally running inference server.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "qwen2.5:7b";

/// Model behavior options: which model to run and how it should sample.
///
/// # Example
/// ```rust
/// use streamchat::options::ModelOptions;
///
/// let options = ModelOptions::new()
///     .with_model("llama3.2".to_string())
///     .with_temperature(0.7);
/// ```
#[derive(Debug, Clone)]
pub struct ModelOptions {
    /// Model identifier (e.g., "qwen2.5:7b", "llama3.2")
    pub model: String,

    /// Temperature for sampling (0.0 - 2.0)
    pub temperature: Option<f32>,

    /// Top-p (nucleus) sampling parameter
    pub top_p: Option<f32>,

    /// Maximum tokens to generate
    pub num_predict: Option<u32>,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelOptions {
    /// Create model options with the default model and no sampling overrides.
    pub fn new() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            top_p: None,
            num_predict: None,
        }
    }

    /// Set the model identifier.
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set top-p sampling parameter.
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set maximum tokens to generate.
    pub fn with_num_predict(mut self, num_predict: u32) -> Self {
        self.num_predict = Some(num_predict);
        self
    }

    /// Collect the sampling overrides into the wire `options` object,
    /// or `None` when every field is unset.
    pub fn sampling_params(&self) -> Option<SamplingParams> {
        let params = SamplingParams {
            temperature: self.temperature,
            top_p: self.top_p,
            num_predict: self.num_predict,
        };
        (!params.is_empty()).then_some(params)
    }
}

/// Transport options: where the server lives and how long to wait for it.
///
/// # Example
/// ```rust
/// use streamchat::options::TransportOptions;
/// use std::time::Duration;
///
/// let options = TransportOptions::new()
///     .with_base_url("http://127.0.0.1:11434".to_string())
///     .with_timeout(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Base URL for API endpoints
    pub base_url: String,

    /// Request timeout; unset means no client-side limit, which is the
    /// right default for long streamed generations.
    pub timeout: Option<Duration>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportOptions {
    /// Create transport options pointing at the default local endpoint.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Endpoint URL for the chat completion request.
    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }

    /// Endpoint URL for the health probe / model listing.
    pub fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoints() {
        let options = TransportOptions::new();
        assert_eq!(options.chat_url(), "http://127.0.0.1:11434/api/chat");
        assert_eq!(options.tags_url(), "http://127.0.0.1:11434/api/tags");
    }

    #[test]
    fn trailing_slash_does_not_double_up() {
        let options = TransportOptions::new().with_base_url("http://localhost:11434/".to_string());
        assert_eq!(options.chat_url(), "http://localhost:11434/api/chat");
    }

    #[test]
    fn sampling_params_none_when_unset() {
        assert!(ModelOptions::new().sampling_params().is_none());
    }

    #[test]
    fn sampling_params_present_when_set() {
        let params = ModelOptions::new()
            .with_temperature(0.7)
            .sampling_params()
            .unwrap();
        assert_eq!(params.temperature, Some(0.7));
        assert!(params.top_p.is_none());
    }
}
