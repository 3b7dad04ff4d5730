pub mod test_connection;
pub mod text2img;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::{
    error::{ModelsLabError, Result},
    modelslab::ModelsLabClient,
};

pub use test_connection::TestConnectionTool;
pub use text2img::{Text2ImgArgs, Text2ImgTool};

/// A named operation exposed to a dispatch layer. `execute` never fails:
/// errors come back as a `{success: false, error}` payload.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn schema(&self) -> Value;

    async fn execute(&self, args: Value) -> Value;
}

#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(client: Arc<ModelsLabClient>) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(Text2ImgTool::new(client)));
        registry.register(Arc::new(TestConnectionTool::new()?));
        Ok(registry)
    }

    /// Registering a name twice replaces the earlier tool.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.retain(|existing| existing.name() != tool.name());
        log::debug!("Registered tool: {}", tool.name());
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn schemas(&self) -> Vec<Value> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    pub async fn execute(&self, name: &str, args: Value) -> Result<Value> {
        let tool = self.get(name).ok_or_else(|| {
            ModelsLabError::validation("tool", format!("unknown tool '{}'", name))
        })?;
        log::info!("🔧 Executing tool: {}", name);
        Ok(tool.execute(args).await)
    }
}

/// Success envelope: `fields` are placed at the top level next to
/// `success: true`, `extra_metadata` is merged under `metadata`.
pub fn format_response(tool: &str, fields: Value, extra_metadata: Value) -> Value {
    let mut metadata = Map::new();
    metadata.insert("tool".into(), json!(tool));
    metadata.insert("timestamp".into(), json!(Utc::now().to_rfc3339()));
    if let Value::Object(extra) = extra_metadata {
        metadata.extend(extra);
    }

    let mut payload = Map::new();
    payload.insert("success".into(), json!(true));
    match fields {
        Value::Object(fields) => payload.extend(fields),
        Value::Null => {}
        other => {
            payload.insert("data".into(), other);
        }
    }
    payload.insert("metadata".into(), Value::Object(metadata));
    Value::Object(payload)
}

pub fn error_payload(tool: &str, error: impl fmt::Display, request_params: &Value) -> Value {
    log::error!("Tool {} failed: {}", tool, error);
    json!({
        "success": false,
        "error": error.to_string(),
        "metadata": {
            "tool": tool,
            "timestamp": Utc::now().to_rfc3339(),
            "requestParams": request_params,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DownloadConfig, ModelsLabConfig};

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn schema(&self) -> Value {
            json!({"name": "echo", "inputSchema": {"type": "object"}})
        }

        async fn execute(&self, args: Value) -> Value {
            format_response("echo", json!({ "data": args }), Value::Null)
        }
    }

    #[test]
    fn test_format_response_merges_metadata() {
        let payload = format_response(
            "t",
            json!({"imageUrls": ["a"]}),
            json!({"imageCount": 1}),
        );
        assert_eq!(payload["success"], true);
        assert_eq!(payload["imageUrls"], json!(["a"]));
        assert_eq!(payload["metadata"]["tool"], "t");
        assert_eq!(payload["metadata"]["imageCount"], 1);
        assert!(payload["metadata"]["timestamp"].is_string());
    }

    #[test]
    fn test_error_payload_keeps_request() {
        let err = ModelsLabError::validation("prompt", "is required and cannot be empty");
        let payload = error_payload("t", &err, &json!({"prompt": ""}));
        assert_eq!(payload["success"], false);
        assert!(payload["error"].as_str().unwrap().contains("prompt"));
        assert_eq!(payload["metadata"]["requestParams"]["prompt"], "");
    }

    #[tokio::test]
    async fn test_registry_dispatch() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(EchoTool));

        assert_eq!(registry.names(), vec!["echo"]);
        assert_eq!(registry.schemas().len(), 1);

        let payload = registry.execute("echo", json!({"x": 1})).await.unwrap();
        assert_eq!(payload["data"]["x"], 1);

        let err = registry.execute("missing", json!({})).await.unwrap_err();
        assert_eq!(err.field(), Some("tool"));
    }

    #[test]
    fn test_defaults_register_both_tools() {
        let client = ModelsLabClient::new(
            ModelsLabConfig::new().with_api_key("test-key"),
            DownloadConfig::new(),
        )
        .unwrap();

        let registry = ToolRegistry::with_defaults(Arc::new(client)).unwrap();

        assert_eq!(registry.names(), vec![text2img::TOOL_NAME, test_connection::TOOL_NAME]);
    }
}
