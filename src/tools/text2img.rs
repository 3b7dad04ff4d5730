use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{error_payload, format_response, Tool};
use crate::{
    download::{ensure_valid_image_path, ensure_valid_name_prefix},
    error::{ModelsLabError, Result},
    models::{DownloadOutcome, DownloadReport, GenerationParams, GenerationResult, OutputFormat},
    modelslab::{GenerationOutput, ModelsLabClient, SaveOptions},
};

pub const TOOL_NAME: &str = "modelslab_text2img";

/// Tool arguments: generation parameters plus optional save settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Text2ImgArgs {
    #[serde(flatten)]
    pub params: GenerationParams,
    #[serde(rename = "outputPath", default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(rename = "namePrefix", default)]
    pub name_prefix: Option<String>,
}

impl Text2ImgArgs {
    pub fn parse(args: &Value) -> Result<Self> {
        serde_json::from_value(args.clone())
            .map_err(|e| ModelsLabError::validation("arguments", e.to_string()))
    }

    /// Resolves the save settings, rejecting a bad format, path or name prefix
    /// up front.
    pub fn save_options(&self) -> Result<Option<SaveOptions>> {
        let format = match self.format.as_deref() {
            Some(token) => token.parse::<OutputFormat>()?,
            None => OutputFormat::Original,
        };

        let Some(output_path) = self.output_path.as_deref().filter(|p| !p.trim().is_empty())
        else {
            return Ok(None);
        };
        ensure_valid_image_path(output_path)?;

        let mut options = SaveOptions::new(PathBuf::from(output_path)).with_format(format);
        if let Some(prefix) = self.name_prefix.as_deref() {
            ensure_valid_name_prefix(prefix)?;
            options = options.with_name_prefix(prefix);
        }
        Ok(Some(options))
    }
}

pub struct Text2ImgTool {
    client: Arc<ModelsLabClient>,
}

impl Text2ImgTool {
    pub fn new(client: Arc<ModelsLabClient>) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Value) -> Result<Value> {
        let args = Text2ImgArgs::parse(args)?;
        let save = args.save_options()?;

        let GenerationOutput { result, download } = self
            .client
            .generate_and_download(args.params.clone(), save.as_ref())
            .await?;

        let metadata = result_metadata(&result, &args.params);
        Ok(match (download, save) {
            (Some(report), Some(save)) => download_payload(report, &save, metadata, &args.params),
            _ => {
                let mut metadata = metadata;
                metadata["imageCount"] = json!(result.image_urls.len());
                format_response(
                    TOOL_NAME,
                    json!({
                        "imageUrls": result.image_urls,
                        "proxyUrls": result.proxy_urls,
                    }),
                    metadata,
                )
            }
        })
    }
}

#[async_trait]
impl Tool for Text2ImgTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn schema(&self) -> Value {
        let limits = &self.client.image().config().limits;
        let defaults = &self.client.image().config().defaults;
        json!({
            "name": TOOL_NAME,
            "description": "Generate images from a text prompt with ModelsLab, optionally saving them locally",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "prompt": {"type": "string", "description": "Text description of the image"},
                    "negative_prompt": {"type": "string", "description": "What to avoid in the image"},
                    "width": {"type": "integer", "minimum": 1, "maximum": limits.max_width, "default": defaults.width},
                    "height": {"type": "integer", "minimum": 1, "maximum": limits.max_height, "default": defaults.height},
                    "samples": {"type": "integer", "minimum": 1, "maximum": limits.max_samples, "default": defaults.samples},
                    "num_inference_steps": {
                        "type": "integer",
                        "minimum": limits.min_inference_steps,
                        "maximum": limits.max_inference_steps,
                        "default": defaults.num_inference_steps
                    },
                    "guidance_scale": {
                        "type": "number",
                        "minimum": limits.min_guidance_scale,
                        "maximum": limits.max_guidance_scale,
                        "default": defaults.guidance_scale
                    },
                    "seed": {"type": "integer", "description": "Seed for reproducible results"},
                    "safety_checker": {"type": "boolean", "default": defaults.safety_checker},
                    "enhance_prompt": {"type": "boolean", "default": defaults.enhance_prompt},
                    "self_attention": {"type": "boolean", "default": defaults.self_attention},
                    "model_id": {"type": "string", "description": "Community model identifier"},
                    "vae": {"type": "string"},
                    "webhook": {"type": "string"},
                    "track_id": {"type": "string"},
                    "outputPath": {"type": "string", "description": "Where to save the image(s)"},
                    "format": {
                        "type": "string",
                        "enum": ["original", "jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff"],
                        "default": "original"
                    },
                    "namePrefix": {"type": "string", "default": "generated_image"}
                },
                "required": ["prompt"]
            }
        })
    }

    async fn execute(&self, args: Value) -> Value {
        match self.run(&args).await {
            Ok(payload) => payload,
            Err(e) => error_payload(TOOL_NAME, &e, &args),
        }
    }
}

fn result_metadata(result: &GenerationResult, params: &GenerationParams) -> Value {
    json!({
        "generationTime": result.generation_time,
        "generationParams": params,
        "apiMetadata": result.metadata,
    })
}

fn download_payload(
    report: DownloadReport,
    save: &SaveOptions,
    metadata: Value,
    params: &GenerationParams,
) -> Value {
    match report {
        DownloadReport::Single(DownloadOutcome::Success(saved)) => format_response(
            TOOL_NAME,
            json!({
                "status": "success",
                "message": format!("Image saved to {}", saved.path.display()),
                "file": saved.path,
                "size": saved.size,
                "bytes": saved.bytes,
                "contentType": saved.content_type,
                "format": save.format,
                "originalUrl": saved.original_url,
                "downloadTime": saved.download_time,
            }),
            metadata,
        ),
        DownloadReport::Single(DownloadOutcome::Failure(failed)) => {
            let request = serde_json::to_value(params).unwrap_or(Value::Null);
            error_payload(
                TOOL_NAME,
                format!("failed to download {}: {}", failed.url, failed.error),
                &request,
            )
        }
        DownloadReport::Batch(batch) => {
            let files: Vec<Value> = batch
                .results
                .iter()
                .map(|s| json!({"path": s.path, "size": s.size}))
                .collect();
            let mut payload = format_response(
                TOOL_NAME,
                json!({
                    "downloaded": batch.succeeded,
                    "failed": batch.failed,
                    "total": batch.total,
                    "files": files,
                    "errors": batch.errors,
                    "format": save.format,
                }),
                metadata,
            );
            payload["success"] = json!(batch.success);
            payload
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DownloadConfig, ModelsLabConfig};
    use httpmock::{
        Method::{GET, POST},
        MockServer,
    };

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 9, 9];

    fn tool_for(base_url: String) -> Text2ImgTool {
        let client = ModelsLabClient::new(
            ModelsLabConfig::new()
                .with_api_key("test-key")
                .with_base_url(base_url),
            DownloadConfig::new(),
        )
        .unwrap();
        Text2ImgTool::new(Arc::new(client))
    }

    fn unreachable_tool() -> Text2ImgTool {
        tool_for("http://127.0.0.1:1".to_string())
    }

    #[test]
    fn test_args_parse_flattened_params() {
        let args = Text2ImgArgs::parse(&json!({
            "prompt": "a cat",
            "width": 640,
            "guidance_scale": 8,
            "outputPath": "out/cat.png",
            "format": "PNG",
            "namePrefix": "cat"
        }))
        .unwrap();
        assert_eq!(args.params.prompt, "a cat");
        assert_eq!(args.params.width, Some(640));
        assert_eq!(args.params.guidance_scale, Some(8.0));

        let save = args.save_options().unwrap().unwrap();
        assert_eq!(save.output_path, PathBuf::from("out/cat.png"));
        assert_eq!(save.format, OutputFormat::Png);
        assert_eq!(save.name_prefix.as_deref(), Some("cat"));
    }

    #[test]
    fn test_args_without_output_path() {
        let args = Text2ImgArgs::parse(&json!({"prompt": "a cat"})).unwrap();
        assert!(args.save_options().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_arguments_are_reported() {
        let payload = unreachable_tool().execute(json!({"width": 512})).await;
        assert_eq!(payload["success"], false);
        assert!(payload["error"].as_str().unwrap().contains("arguments"));
        assert_eq!(payload["metadata"]["requestParams"]["width"], 512);
    }

    #[tokio::test]
    async fn test_bad_inputs_fail_before_network() {
        let cases = [
            (json!({"prompt": "  "}), "prompt"),
            (json!({"prompt": "a cat", "format": "svg"}), "format"),
            (json!({"prompt": "a cat", "outputPath": "../secret.png"}), "Path error"),
            (json!({"prompt": "a cat", "outputPath": "out/image.txt"}), "Path error"),
            (
                json!({"prompt": "a cat", "outputPath": "out/a.png", "namePrefix": "/tmp/stray"}),
                "namePrefix",
            ),
            (
                json!({"prompt": "a cat", "outputPath": "out/a.png", "namePrefix": "../up"}),
                "namePrefix",
            ),
            (
                json!({"prompt": "a cat", "outputPath": "out/a.png", "namePrefix": ""}),
                "namePrefix",
            ),
        ];
        for (args, expected) in cases {
            let payload = unreachable_tool().execute(args).await;
            assert_eq!(payload["success"], false);
            let error = payload["error"].as_str().unwrap();
            assert!(error.contains(expected), "{}", error);
            assert!(!error.contains("Network error"), "{}", error);
        }
    }

    #[tokio::test]
    async fn test_urls_returned_without_output_path() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/images/text2img");
                then.status(200).body(
                    json!({
                        "status": "success",
                        "generationTime": 0.8,
                        "output": ["https://cdn.example.com/a.png", "https://cdn.example.com/b.png"]
                    })
                    .to_string(),
                );
            })
            .await;

        let payload = tool_for(server.url(""))
            .execute(json!({"prompt": "a cat", "samples": 2}))
            .await;

        assert_eq!(payload["success"], true);
        assert_eq!(payload["imageUrls"].as_array().unwrap().len(), 2);
        assert_eq!(payload["metadata"]["imageCount"], 2);
        assert_eq!(payload["metadata"]["generationTime"], 0.8);
        assert_eq!(payload["metadata"]["generationParams"]["samples"], 2);
        assert_eq!(payload["metadata"]["apiMetadata"]["prompt"], "a cat");
    }

    #[tokio::test]
    async fn test_single_file_payload() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/images/text2img");
                then.status(200).body(
                    json!({"status": "success", "output": [server.url("/a")]}).to_string(),
                );
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/a");
                then.status(200).header("content-type", "image/png").body(PNG);
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("cat.jpg");
        let payload = tool_for(server.url(""))
            .execute(json!({
                "prompt": "a cat",
                "outputPath": output.to_string_lossy(),
                "format": "webp"
            }))
            .await;

        assert_eq!(payload["success"], true);
        assert_eq!(payload["status"], "success");
        assert_eq!(payload["format"], "webp");
        assert_eq!(payload["contentType"], "image/png");
        assert_eq!(payload["size"], "10 B");
        let file = dir.path().join("cat.webp");
        assert_eq!(payload["file"], json!(file));
        assert!(file.exists());
    }

    #[tokio::test]
    async fn test_single_download_failure_payload() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/images/text2img");
                then.status(200).body(
                    json!({"status": "success", "output": [server.url("/gone")]}).to_string(),
                );
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/gone");
                then.status(404);
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let payload = tool_for(server.url(""))
            .execute(json!({
                "prompt": "a cat",
                "outputPath": dir.path().join("cat.png").to_string_lossy()
            }))
            .await;

        assert_eq!(payload["success"], false);
        assert!(payload["error"].as_str().unwrap().contains("404"));
        assert_eq!(payload["metadata"]["requestParams"]["prompt"], "a cat");
    }

    #[tokio::test]
    async fn test_batch_payload() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/images/text2img");
                then.status(200).body(
                    json!({
                        "status": "success",
                        "output": [server.url("/one"), server.url("/two")]
                    })
                    .to_string(),
                );
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/one");
                then.status(200).header("content-type", "image/png").body(PNG);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/two");
                then.status(200).header("content-type", "image/png");
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let payload = tool_for(server.url(""))
            .execute(json!({
                "prompt": "a cat",
                "samples": 2,
                "outputPath": dir.path().join("out.png").to_string_lossy()
            }))
            .await;

        assert_eq!(payload["success"], true);
        assert_eq!(payload["downloaded"], 1);
        assert_eq!(payload["failed"], 1);
        assert_eq!(payload["total"], 2);
        assert_eq!(payload["format"], "original");
        assert_eq!(
            payload["files"][0]["path"],
            json!(dir.path().join("generated_image_1.png"))
        );
        assert_eq!(payload["errors"][0]["index"], 1);
        assert!(payload["errors"][0]["error"]
            .as_str()
            .unwrap()
            .contains("empty response data"));
    }
}
