//! Gemini `generateContent` client.
//!
//! Images come back as `inlineData` parts on the first candidate.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};
use tracing::debug;
use url::Url;

use crate::error::{GenerationError, GenerationResult};
use crate::provider::{join_path, parse_endpoint, read_body, ImageGenerator, USER_AGENT};
use crate::request::{
    split_data_url, to_data_url, GenerationMode, GenerationRequest, DEFAULT_ASPECT_RATIO,
    DEFAULT_IMAGE_SIZE,
};

/// Only this model family accepts an explicit size tier.
const SIZED_MODEL_MARKER: &str = "gemini-3";

/// Client for the Gemini image models.
#[derive(Clone)]
pub struct GeminiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Create a client for `endpoint` (e.g. `https://generativelanguage.googleapis.com/v1beta`).
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

    fn url(&self) -> GenerationResult<Url> {
        let mut url = join_path(
            &self.inner.endpoint,
            &format!("models/{}:generateContent", self.inner.model),
        )?;
        url.query_pairs_mut().append_pair("key", &self.inner.api_key);
        Ok(url)
    }
}

/// Build the `generateContent` body.
pub(crate) fn request_body(model: &str, request: &GenerationRequest) -> Value {
    let mut parts = Vec::new();
    if request.mode == GenerationMode::Edit {
        if let Some(source) = &request.source_image {
            let (mime, data) = split_data_url(source);
            parts.push(json!({ "inline_data": { "mime_type": mime, "data": data } }));
        }
    }
    parts.push(json!({ "text": request.prompt }));

    let mut generation_config = json!({ "responseModalities": ["TEXT", "IMAGE"] });
    let opts = &request.options;
    let sized = opts.image_size != DEFAULT_IMAGE_SIZE && model.contains(SIZED_MODEL_MARKER);
    let mut image_config = Map::new();
    if opts.aspect_ratio != DEFAULT_ASPECT_RATIO {
        image_config.insert("aspectRatio".to_string(), json!(opts.aspect_ratio));
    }
    if sized {
        image_config.insert("imageSize".to_string(), json!(opts.image_size));
    }
    if !image_config.is_empty() {
        generation_config["imageConfig"] = Value::Object(image_config);
    }

    let mut body = json!({
        "contents": [{ "parts": parts }],
        "generationConfig": generation_config,
    });
    if request.mode == GenerationMode::Create && opts.web_search {
        body["tools"] = json!([{ "googleSearch": {} }]);
    }
    body
}

/// Pull `inlineData` images out of a response body.
pub(crate) fn extract_images(body: &Value) -> GenerationResult<Vec<String>> {
    let parts = body
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| GenerationError::Format("missing candidate parts".to_string()))?;

    let images: Vec<String> = parts
        .iter()
        .filter_map(|part| part.get("inlineData"))
        .filter_map(|inline| {
            let mime = inline.get("mimeType").and_then(Value::as_str)?;
            let data = inline.get("data").and_then(Value::as_str)?;
            Some(to_data_url(mime, data))
        })
        .collect();

    if images.is_empty() {
        return Err(GenerationError::Format(
            "response contained no images".to_string(),
        ));
    }
    Ok(images)
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn is_configured(&self) -> bool {
        !self.inner.api_key.trim().is_empty()
    }

    async fn generate(&self, request: &GenerationRequest) -> GenerationResult<Vec<String>> {
        let body = request_body(&self.inner.model, request);
        debug!(model = %self.inner.model, mode = ?request.mode, "Sending Gemini request");

        let response = self.inner.http.post(self.url()?).json(&body).send().await?;
        let body = read_body(response).await?;
        extract_images(&body)
    }
}
