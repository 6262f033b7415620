//! `cover config`: show and edit provider settings.

use std::fmt::Write;

use cover_ai::{AiConfig, Provider};

use crate::SetArgs;

/// Apply `cover config set` flags.
///
/// `--provider` both selects the provider to edit and makes it active;
/// without it the active provider is edited.
pub fn apply_settings(config: &mut AiConfig, args: &SetArgs) {
    if let Some(provider) = args.provider {
        config.active_provider = provider;
    }
    let target = config.provider_mut(config.active_provider);
    if let Some(endpoint) = &args.endpoint {
        target.endpoint.clone_from(endpoint);
    }
    if let Some(key) = &args.api_key {
        target.api_key.clone_from(key);
    }
    if let Some(model) = &args.model {
        target.model.clone_from(model);
    }
    if let Some(ratio) = &args.aspect_ratio {
        config.options.aspect_ratio.clone_from(ratio);
    }
    if let Some(size) = &args.image_size {
        config.options.image_size.clone_from(size);
    }
    if let Some(web_search) = args.web_search {
        config.options.web_search = web_search;
    }
}

/// Human-readable settings with API keys masked.
#[must_use]
pub fn describe_config(config: &AiConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "active provider: {}", config.active_provider.as_str());
    for provider in [Provider::Gemini, Provider::OpenAi] {
        let p = config.provider(provider);
        let key = if p.api_key.is_empty() {
            "(not set)".to_string()
        } else {
            p.masked_key()
        };
        let _ = writeln!(out, "[{}]", provider.as_str());
        let _ = writeln!(out, "  endpoint: {}", p.endpoint);
        let _ = writeln!(out, "  model:    {}", p.model);
        let _ = writeln!(out, "  api key:  {key}");
    }
    let _ = writeln!(out, "aspect ratio: {}", config.options.aspect_ratio);
    let _ = writeln!(out, "image size:   {}", config.options.image_size);
    let _ = writeln!(out, "web search:   {}", config.options.web_search);
    out
}
