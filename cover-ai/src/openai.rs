//! OpenAI Images client.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use crate::error::{GenerationError, GenerationResult};
use crate::provider::{join_path, parse_endpoint, read_body, ImageGenerator, USER_AGENT};
use crate::request::{split_data_url, to_data_url, GenerationMode, GenerationRequest};

/// Size used when the aspect ratio has no dedicated size.
const FALLBACK_SIZE: &str = "1024x1024";

/// The edits endpoint only accepts square output.
const EDIT_SIZE: &str = "1024x1024";

/// Models that have no edits endpoint; edits are sent as creations.
const CREATE_ONLY_MODEL: &str = "dall-e-3";

/// Map an aspect ratio label to an OpenAI size string.
#[must_use]
pub fn size_for_aspect_ratio(aspect_ratio: &str) -> &'static str {
    match aspect_ratio {
        "16:9" => "1792x1024",
        "9:16" => "1024x1792",
        _ => FALLBACK_SIZE,
    }
}

/// Client for the OpenAI Images API.
#[derive(Clone)]
pub struct OpenAiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    /// Create a client for `endpoint` (e.g. `https://api.openai.com/v1`).
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a URL or the HTTP client
    /// cannot be built.
    pub fn new(
        endpoint: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> GenerationResult<Self> {
        let endpoint = parse_endpoint(endpoint)?;
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                endpoint,
                api_key: api_key.into(),
                model: model.into(),
            }),
        })
    }

    /// Configured model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.model
    }

    async fn create(&self, request: &GenerationRequest) -> GenerationResult<Vec<String>> {
        let body = json!({
            "model": self.inner.model,
            "prompt": request.prompt,
            "n": 1,
            "size": size_for_aspect_ratio(&request.options.aspect_ratio),
            "response_format": "b64_json",
        });
        let url = join_path(&self.inner.endpoint, "images/generations")?;
        let response = self
            .inner
            .http
            .post(url)
            .bearer_auth(&self.inner.api_key)
            .json(&body)
            .send()
            .await?;
        extract_images(&read_body(response).await?)
    }

    async fn edit(&self, request: &GenerationRequest, source: &str) -> GenerationResult<Vec<String>> {
        let (_, data) = split_data_url(source);
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| GenerationError::Provider(format!("Source image is not base64: {e}")))?;

        let image = Part::bytes(bytes)
            .file_name("image.png")
            .mime_str("image/png")?;
        // The edits endpoint takes no model field.
        let form = Form::new()
            .part("image", image)
            .text("prompt", request.prompt.clone())
            .text("n", "1")
            .text("size", EDIT_SIZE)
            .text("response_format", "b64_json");

        let url = join_path(&self.inner.endpoint, "images/edits")?;
        let response = self
            .inner
            .http
            .post(url)
            .bearer_auth(&self.inner.api_key)
            .multipart(form)
            .send()
            .await?;
        extract_images(&read_body(response).await?)
    }
}

/// Pull `data[].b64_json` images out of a response body.
pub(crate) fn extract_images(body: &Value) -> GenerationResult<Vec<String>> {
    let data = body
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| GenerationError::Format("missing data array".to_string()))?;

    let images: Vec<String> = data
        .iter()
        .filter_map(|item| item.get("b64_json").and_then(Value::as_str))
        .map(|b64| to_data_url("image/png", b64))
        .collect();

    if images.is_empty() {
        return Err(GenerationError::Format(
            "response contained no images".to_string(),
        ));
    }
    Ok(images)
}

#[async_trait]
impl ImageGenerator for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn is_configured(&self) -> bool {
        !self.inner.api_key.trim().is_empty()
    }

    async fn generate(&self, request: &GenerationRequest) -> GenerationResult<Vec<String>> {
        debug!(model = %self.inner.model, mode = ?request.mode, "Sending OpenAI request");
        match (request.mode, request.source_image.as_deref()) {
            (GenerationMode::Edit, Some(source))
                if !self.inner.model.contains(CREATE_ONLY_MODEL) =>
            {
                self.edit(request, source).await
            }
            _ => self.create(request).await,
        }
    }
}
