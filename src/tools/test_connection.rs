use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{format_response, Tool};
use crate::{
    config::DEFAULT_USER_AGENT,
    error::{ModelsLabError, Result},
};

pub const TOOL_NAME: &str = "test_connection";
pub const DEFAULT_URL: &str = "https://httpbin.org/get";

/// Plain HTTP reachability check against any URL.
pub struct TestConnectionTool {
    client: Client,
}

impl TestConnectionTool {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| ModelsLabError::ConfigError(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Tool for TestConnectionTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn schema(&self) -> Value {
        json!({
            "name": TOOL_NAME,
            "description": "Test HTTP connectivity to an external URL",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "URL to request",
                        "default": DEFAULT_URL
                    }
                }
            }
        })
    }

    async fn execute(&self, args: Value) -> Value {
        let url = args
            .get("url")
            .and_then(Value::as_str)
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(DEFAULT_URL);

        log::info!("🌐 Testing connection to {}", url);
        let data = match self.client.get(url).send().await {
            Ok(response) => json!({
                "url": url,
                "status": "success",
                "http_status": response.status().as_u16(),
            }),
            Err(e) => {
                log::warn!("Connection to {} failed: {}", url, e);
                json!({
                    "url": url,
                    "status": "failed",
                    "error": e.to_string(),
                })
            }
        };

        format_response(TOOL_NAME, json!({ "data": data }), Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};

    #[tokio::test]
    async fn test_reports_http_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/ping");
                then.status(204);
            })
            .await;

        let payload = TestConnectionTool::new()
            .unwrap()
            .execute(json!({"url": server.url("/ping")}))
            .await;

        assert_eq!(payload["success"], true);
        assert_eq!(payload["data"]["status"], "success");
        assert_eq!(payload["data"]["http_status"], 204);
        assert_eq!(payload["metadata"]["tool"], TOOL_NAME);
    }

    #[tokio::test]
    async fn test_reports_unreachable_host() {
        let payload = TestConnectionTool::new()
            .unwrap()
            .execute(json!({"url": "http://127.0.0.1:1/"}))
            .await;

        assert_eq!(payload["data"]["status"], "failed");
        assert!(payload["data"]["error"].is_string());
    }
}
