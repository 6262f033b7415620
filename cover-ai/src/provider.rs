//! The provider seam and helpers shared by HTTP clients.

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::error::{GenerationError, GenerationResult};
use crate::request::GenerationRequest;

/// User agent sent with every provider request.
pub(crate) const USER_AGENT: &str = concat!("cover-ai/", env!("CARGO_PKG_VERSION"));

/// Something that turns a request into generated images.
///
/// Results are `data:` URLs, one per image, in provider order.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &'static str;

    /// Whether credentials are present. Sessions refuse to dispatch otherwise.
    fn is_configured(&self) -> bool;

    /// Run the request.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Provider`] when the provider reports a
    /// failure and [`GenerationError::Format`] when the response carries no
    /// images.
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult<Vec<String>>;
}

/// Parse an endpoint base, dropping any trailing slash.
pub(crate) fn parse_endpoint(endpoint: &str) -> GenerationResult<Url> {
    let trimmed = endpoint.trim_end_matches('/');
    Url::parse(trimmed).map_err(|e| GenerationError::InvalidUrl(e.to_string()))
}

/// Append a path below the endpoint base.
pub(crate) fn join_path(base: &Url, path: &str) -> GenerationResult<Url> {
    let joined = format!("{}/{}", base.as_str().trim_end_matches('/'), path);
    Url::parse(&joined).map_err(|e| GenerationError::InvalidUrl(e.to_string()))
}

/// Read a response body as JSON and surface provider-reported failures.
///
/// `error.message` wins over the status code; a failed status without a
/// message reports `HTTP <status>`.
pub(crate) async fn read_body(response: reqwest::Response) -> GenerationResult<Value> {
    let status = response.status();
    let text = response.text().await?;
    let body: Value = match serde_json::from_str(&text) {
        Ok(body) => body,
        Err(_) if !status.is_success() => {
            return Err(GenerationError::Provider(format!("HTTP {}", status.as_u16())));
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(message) = body
        .get("error")
        .and_then(|err| err.get("message"))
        .and_then(Value::as_str)
    {
        return Err(GenerationError::Provider(message.to_string()));
    }
    if !status.is_success() {
        return Err(GenerationError::Provider(format!("HTTP {}", status.as_u16())));
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint_trims_slash() {
        let url = parse_endpoint("https://example.com/v1/").expect("parse");
        let joined = join_path(&url, "images/generations").expect("join");
        assert_eq!(joined.as_str(), "https://example.com/v1/images/generations");
    }

    #[test]
    fn test_parse_endpoint_invalid() {
        assert!(matches!(
            parse_endpoint("not a url"),
            Err(GenerationError::InvalidUrl(_))
        ));
    }
}
