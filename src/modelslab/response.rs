use chrono::Utc;
use serde_json::Value;

use crate::{
    config::GenerationDefaults,
    error::{ModelsLabError, Result},
    models::{GenerationMetadata, GenerationParams, GenerationResult, ProviderMeta, ProviderReply},
};

const GENERIC_ERROR: &str = "API returned error status";

/// Classifies a raw provider body. Only the two explicit statuses are
/// accepted; anything else is an unexpected format.
pub fn classify(body: Option<&Value>) -> Result<ProviderReply> {
    let body = match body {
        None | Some(Value::Null) => {
            return Err(ModelsLabError::ProviderError(
                "empty response from ModelsLab API".into(),
            ))
        }
        Some(body) => body,
    };

    match body.get("status").and_then(Value::as_str) {
        Some("error") => {
            // the provider sometimes spells it "messege"
            let message = ["message", "messege"]
                .iter()
                .find_map(|key| body.get(*key).and_then(message_text))
                .unwrap_or_else(|| GENERIC_ERROR.to_string());
            Ok(ProviderReply::Error { message })
        }
        Some("success") => Ok(ProviderReply::Success {
            id: body.get("id").filter(|v| !v.is_null()).cloned(),
            output: string_list(body.get("output")),
            proxy_links: string_list(body.get("proxy_links")),
            generation_time: body.get("generationTime").and_then(as_f64),
            meta: parse_meta(body.get("meta")),
        }),
        other => Err(ModelsLabError::ProviderError(format!(
            "unexpected response format from ModelsLab API (status: {})",
            other.unwrap_or("missing")
        ))),
    }
}

/// Builds a [`GenerationResult`] from classified replies, merging caller
/// parameters with provider-reported values (provider wins).
#[derive(Debug, Clone)]
pub struct ResponseNormalizer {
    defaults: GenerationDefaults,
}

impl ResponseNormalizer {
    pub fn new(defaults: GenerationDefaults) -> Self {
        Self { defaults }
    }

    pub fn normalize(
        &self,
        body: Option<&Value>,
        params: &GenerationParams,
    ) -> Result<GenerationResult> {
        let reply = classify(body)?;
        self.into_result(reply, params)
    }

    pub fn into_result(
        &self,
        reply: ProviderReply,
        params: &GenerationParams,
    ) -> Result<GenerationResult> {
        let (id, output, proxy_links, generation_time, meta) = match reply {
            ProviderReply::Error { message } => {
                return Err(ModelsLabError::ProviderError(message))
            }
            ProviderReply::Success {
                id,
                output,
                proxy_links,
                generation_time,
                meta,
            } => (id, output, proxy_links, generation_time, meta),
        };

        if output.is_empty() {
            return Err(ModelsLabError::ProviderError(
                "no images generated by the API".into(),
            ));
        }

        let defaults = &self.defaults;
        let metadata = GenerationMetadata {
            id,
            prompt: params.prompt.trim().to_string(),
            negative_prompt: params.negative_prompt.clone(),
            width: params.width.unwrap_or(defaults.width as i64),
            height: params.height.unwrap_or(defaults.height as i64),
            samples: params.samples.unwrap_or(defaults.samples as i64),
            seed: meta.seed.or(params.seed),
            guidance_scale: meta
                .guidance_scale
                .or(params.guidance_scale)
                .or(Some(defaults.guidance_scale)),
            steps: meta
                .steps
                .or(params.num_inference_steps)
                .or(Some(defaults.num_inference_steps as i64)),
            timestamp: Utc::now(),
        };

        Ok(GenerationResult {
            success: true,
            generation_time,
            image_urls: output,
            proxy_urls: proxy_links,
            metadata,
        })
    }
}

fn parse_meta(meta: Option<&Value>) -> ProviderMeta {
    let Some(meta) = meta else {
        return ProviderMeta::default();
    };
    ProviderMeta {
        seed: meta.get("seed").and_then(as_i64),
        guidance_scale: meta.get("guidance_scale").and_then(as_f64),
        steps: meta
            .get("steps")
            .and_then(as_i64)
            .or_else(|| meta.get("num_inference_steps").and_then(as_i64)),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// The provider mixes numbers and numeric strings.
fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
