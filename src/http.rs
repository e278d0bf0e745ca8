//! HTTP client construction for talking to the inference server.

use reqwest::Client;

use crate::options::TransportOptions;

/// Build a configured HTTP client from transport options.
///
/// Applies the request timeout when one is set. Streamed generations can
/// legitimately run for minutes, so no timeout is imposed by default.
pub fn build_http_client(transport_options: &TransportOptions) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder();

    if let Some(timeout) = transport_options.timeout {
        builder = builder.timeout(timeout);
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_build_http_client() {
        let transport_options = TransportOptions::new().with_timeout(Duration::from_secs(30));
        let client = build_http_client(&transport_options);
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_http_client_without_timeout() {
        let client = build_http_client(&TransportOptions::new());
        assert!(client.is_ok());
    }
}
