use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, StatusCode,
};
use serde_json::Value;
use uuid::Uuid;

use super::{request::RequestBuilder, response::ResponseNormalizer, traits::DataSourceClient};
use crate::{
    config::{ModelsLabConfig, DEFAULT_USER_AGENT},
    error::{ModelsLabError, Result},
    models::{ConnectionStatus, GenerationParams, GenerationResult, WireRequest},
};

#[derive(Clone)]
pub struct ImageClient {
    http: Client,
    config: ModelsLabConfig,
}

impl ImageClient {
    pub fn new(config: ModelsLabConfig) -> Result<Self> {
        config.require_api_key()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .user_agent(DEFAULT_USER_AGENT)
            .timeout(config.timeout())
            .build()
            .map_err(|e| ModelsLabError::ConfigError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ModelsLabConfig {
        &self.config
    }

    /// A model id routes to the community endpoint, otherwise realtime.
    pub fn endpoint_url(&self, request: &WireRequest) -> String {
        let endpoint = if request.model_id.is_some() {
            &self.config.endpoints.community_text2img
        } else {
            &self.config.endpoints.text2img
        };
        format!("{}/{}", self.config.base_url(), endpoint.trim_start_matches('/'))
    }

    pub async fn generate_image(&self, params: GenerationParams) -> Result<GenerationResult> {
        let request = RequestBuilder::from_config(&self.config)?.build(&params)?;
        let url = self.endpoint_url(&request);
        let request_id = Uuid::new_v4();

        log::info!(
            "[req:{}] Generating image with model: {}",
            request_id,
            request.model_id.as_deref().unwrap_or("realtime")
        );
        log::debug!("[req:{}] POST {} {}", request_id, url, request.redacted());

        let _timer = crate::logger::timer(&format!("image generation {}", request_id));
        let body = self.post(&url, &request).await?;
        log::debug!("[req:{}] Response: {}", request_id, truncate(&body, 2048));

        let payload: Option<Value> = if body.trim().is_empty() {
            None
        } else {
            Some(serde_json::from_str(&body).map_err(|e| {
                ModelsLabError::ProviderError(format!(
                    "unexpected response format from ModelsLab API: {}",
                    e
                ))
            })?)
        };

        let result = ResponseNormalizer::new(self.config.defaults.clone())
            .normalize(payload.as_ref(), &params)
            .map_err(|e| {
                log::error!("[req:{}] {}", request_id, e);
                e
            })?;

        log::info!(
            "[req:{}] Generated {} image(s)",
            request_id,
            result.image_urls.len()
        );
        Ok(result)
    }

    async fn post(&self, url: &str, request: &WireRequest) -> Result<String> {
        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| ModelsLabError::NetworkError(format!("ModelsLab request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ModelsLabError::NetworkError(format!("failed to read ModelsLab response: {}", e))
        })?;

        if !status.is_success() {
            return Err(ModelsLabError::ProviderError(http_error_message(status, &body)));
        }
        Ok(body)
    }
}

#[async_trait]
impl DataSourceClient for ImageClient {
    async fn test_connection(&self) -> ConnectionStatus {
        let sample = GenerationParams {
            samples: Some(1),
            ..GenerationParams::new("test image").with_size(256, 256)
        };
        match self.generate_image(sample).await {
            Ok(_) => ConnectionStatus::connected("ModelsLab API connection successful"),
            Err(e) => {
                log::warn!("ModelsLab connection test failed: {}", e);
                ConnectionStatus::failed(e.to_string())
            }
        }
    }

    async fn query(&self, params: GenerationParams) -> Result<GenerationResult> {
        self.generate_image(params).await
    }
}

fn http_error_message(status: StatusCode, body: &str) -> String {
    let mut message = format!(
        "HTTP {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    )
    .trim_end()
    .to_string();

    let detail = match serde_json::from_str::<Value>(body) {
        Ok(json) => ["message", "error"]
            .iter()
            .find_map(|key| json.get(*key).and_then(Value::as_str))
            .map(str::to_string),
        Err(_) if !body.trim().is_empty() => Some(truncate(body.trim(), 512).to_string()),
        Err(_) => None,
    };
    if let Some(detail) = detail {
        message.push_str(": ");
        message.push_str(&detail);
    }
    message
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConnectionState;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    fn client_for(server: &MockServer) -> ImageClient {
        ImageClient::new(
            ModelsLabConfig::new()
                .with_api_key("test-key")
                .with_base_url(server.url("")),
        )
        .unwrap()
    }

    #[test]
    fn test_new_requires_api_key() {
        assert!(matches!(
            ImageClient::new(ModelsLabConfig::new()),
            Err(ModelsLabError::ConfigError(_))
        ));
    }

    #[test]
    fn test_http_error_message() {
        assert_eq!(
            http_error_message(StatusCode::UNAUTHORIZED, r#"{"message":"bad key"}"#),
            "HTTP 401 Unauthorized: bad key"
        );
        assert_eq!(
            http_error_message(StatusCode::BAD_GATEWAY, "upstream down"),
            "HTTP 502 Bad Gateway: upstream down"
        );
        assert_eq!(
            http_error_message(StatusCode::INTERNAL_SERVER_ERROR, ""),
            "HTTP 500 Internal Server Error"
        );
    }

    #[tokio::test]
    async fn test_generate_posts_wire_request_to_community_endpoint() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/images/text2img")
                    .body_includes("\"key\":\"test-key\"")
                    .body_includes("\"prompt\":\"a cat\"")
                    .body_includes("\"width\":\"512\"")
                    .body_includes("\"samples\":\"1\"")
                    .body_includes("\"enhance_prompt\":\"yes\"")
                    .body_includes("\"model_id\":\"flux\"");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(
                        json!({
                            "status": "success",
                            "generationTime": 2.5,
                            "id": 1,
                            "output": ["https://cdn.example.com/a.png"],
                            "meta": {"seed": 77, "guidance_scale": 7.5, "steps": 30}
                        })
                        .to_string(),
                    );
            })
            .await;

        let result = client_for(&server)
            .generate_image(GenerationParams::new("a cat").with_size(512, 512).with_samples(1))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(result.success);
        assert_eq!(result.image_urls, vec!["https://cdn.example.com/a.png"]);
        assert_eq!(result.metadata.seed, Some(77));
    }

    #[tokio::test]
    async fn test_realtime_endpoint_without_model() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/realtime/text2img");
                then.status(200).body(
                    json!({"status": "success", "output": ["https://cdn.example.com/r.png"]})
                        .to_string(),
                );
            })
            .await;

        let mut config = ModelsLabConfig::new()
            .with_api_key("test-key")
            .with_base_url(server.url(""));
        config.defaults.model_id = None;
        let client = ImageClient::new(config).unwrap();

        let result = client.generate_image(GenerationParams::new("a cat")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.image_urls.len(), 1);
    }

    #[tokio::test]
    async fn test_http_failure_is_provider_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/images/text2img");
                then.status(401)
                    .body(json!({"message": "Invalid API key"}).to_string());
            })
            .await;

        let err = client_for(&server)
            .generate_image(GenerationParams::new("a cat"))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelsLabError::ProviderError(_)));
        assert!(err.to_string().contains("HTTP 401"));
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_validation_happens_before_network() {
        // nothing listens on port 1, so reaching the network would be a NetworkError
        let client = ImageClient::new(
            ModelsLabConfig::new()
                .with_api_key("test-key")
                .with_base_url("http://127.0.0.1:1"),
        )
        .unwrap();

        let err = client
            .generate_image(GenerationParams::new("a cat").with_size(2048, 512))
            .await
            .unwrap_err();

        assert_eq!(err.field(), Some("width"));
    }

    #[tokio::test]
    async fn test_connection_reports_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/images/text2img");
                then.status(200)
                    .body(json!({"status": "error", "message": "no credits"}).to_string());
            })
            .await;

        let status = client_for(&server).test_connection().await;
        assert_eq!(status.status, ConnectionState::Failed);
        assert!(status.error.unwrap().contains("no credits"));
    }
}
