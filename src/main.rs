use std::env;
use std::sync::Arc;

use modelslab::{
    logger::{self, LoggerConfig},
    DownloadConfig, ModelsLabClient, ModelsLabConfig, ToolRegistry,
};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let logger_config = match env::var("MODELSLAB_LOG_FORMAT").as_deref() {
        Ok("json") => LoggerConfig::production(),
        _ => LoggerConfig::development(),
    };
    logger::init_with_config(logger_config)?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let config = ModelsLabConfig::from_env();
    let downloads = DownloadConfig::from_env();
    logger::log_config_info(&config, &downloads);

    let client = match ModelsLabClient::new(config, downloads) {
        Ok(client) => {
            log::info!("✅ ModelsLab client initialized successfully");
            client
        }
        Err(e) => {
            log::error!("❌ Failed to initialize ModelsLab client: {}", e);
            return Err(e.into());
        }
    };
    let registry = ToolRegistry::with_defaults(Arc::new(client))?;

    let mut args = env::args().skip(1);
    let tool = args.next().unwrap_or_else(|| "list".to_string());

    if tool == "list" {
        log::info!("🧰 Available tools: {}", registry.names().join(", "));
        println!(
            "{}",
            serde_json::to_string_pretty(&Value::Array(registry.schemas()))?
        );
        return Ok(());
    }

    let tool_args: Value = match args.next() {
        Some(raw) => serde_json::from_str(&raw)?,
        None => Value::Object(Default::default()),
    };

    let payload = registry.execute(&tool, tool_args).await?;
    if payload["success"] == false {
        log::warn!("⚠️  Tool {} reported a failure", tool);
    }
    println!("{}", serde_json::to_string_pretty(&payload)?);

    Ok(())
}
