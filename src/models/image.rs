use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Loosely-typed generation parameters as supplied by a caller.
/// Integer fields are signed so out-of-range input reaches validation
/// instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default)]
    pub samples: Option<i64>,
    #[serde(default)]
    pub num_inference_steps: Option<i64>,
    #[serde(default)]
    pub guidance_scale: Option<f64>,
    #[serde(default)]
    pub seed: Option<i64>,
    #[serde(default)]
    pub safety_checker: Option<bool>,
    #[serde(default)]
    pub enhance_prompt: Option<bool>,
    #[serde(default)]
    pub self_attention: Option<bool>,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub vae: Option<String>,
    #[serde(default)]
    pub webhook: Option<String>,
    #[serde(default)]
    pub track_id: Option<String>,
}

impl GenerationParams {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, width: i64, height: i64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_samples(mut self, samples: i64) -> Self {
        self.samples = Some(samples);
        self
    }

    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = Some(negative_prompt.into());
        self
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Body POSTed to the text2img endpoints.
///
/// The provider wants most numbers as strings and flags as `"yes"`/`"no"`.
/// `negative_prompt` and `model_id` are dropped entirely when unset, the
/// remaining optional fields go out as explicit `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireRequest {
    pub key: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    pub width: String,
    pub height: String,
    pub samples: String,
    pub num_inference_steps: String,
    pub safety_checker: String,
    pub enhance_prompt: String,
    pub seed: Option<i64>,
    pub guidance_scale: f64,
    pub self_attention: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    pub vae: Option<String>,
    pub webhook: Option<String>,
    pub track_id: Option<String>,
}

impl WireRequest {
    /// JSON form with the credential masked, for debug logging.
    pub fn redacted(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or_else(|_| json!({}));
        if let Some(obj) = value.as_object_mut() {
            obj.insert("key".to_string(), json!("***"));
        }
        value
    }
}

/// Values the provider echoes back under `meta`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderMeta {
    pub seed: Option<i64>,
    pub guidance_scale: Option<f64>,
    pub steps: Option<i64>,
}

/// Provider reply, classified once on receipt.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderReply {
    Success {
        id: Option<Value>,
        output: Vec<String>,
        proxy_links: Vec<String>,
        generation_time: Option<f64>,
        meta: ProviderMeta,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub id: Option<Value>,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub width: i64,
    pub height: i64,
    pub samples: i64,
    pub seed: Option<i64>,
    pub guidance_scale: Option<f64>,
    pub steps: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub success: bool,
    pub generation_time: Option<f64>,
    pub image_urls: Vec<String>,
    pub proxy_urls: Vec<String>,
    pub metadata: GenerationMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_deserialize_with_missing_fields() {
        let params: GenerationParams =
            serde_json::from_value(json!({"prompt": "a cat", "width": 640})).unwrap();
        assert_eq!(params.prompt, "a cat");
        assert_eq!(params.width, Some(640));
        assert_eq!(params.height, None);
        assert_eq!(params.enhance_prompt, None);
    }

    #[test]
    fn test_wire_request_redacts_key() {
        let wire = WireRequest {
            key: "secret".into(),
            prompt: "a cat".into(),
            negative_prompt: None,
            width: "512".into(),
            height: "512".into(),
            samples: "1".into(),
            num_inference_steps: "30".into(),
            safety_checker: "no".into(),
            enhance_prompt: "yes".into(),
            seed: None,
            guidance_scale: 7.5,
            self_attention: "no".into(),
            model_id: None,
            vae: None,
            webhook: None,
            track_id: None,
        };
        let redacted = wire.redacted();
        assert_eq!(redacted["key"], "***");
        assert!(redacted.get("negative_prompt").is_none());
        assert!(redacted.get("model_id").is_none());
        assert!(redacted["vae"].is_null());
    }
}
