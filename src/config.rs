use std::env;
use std::time::Duration;

use crate::error::{ModelsLabError, Result};

pub const DEFAULT_BASE_URL: &str = "https://modelslab.com/api/v6";
pub const DEFAULT_USER_AGENT: &str = "ModelsLab-MCP/1.0";
pub const DEFAULT_NAME_PREFIX: &str = "generated_image";

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub text2img: String,
    pub community_text2img: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            text2img: "realtime/text2img".to_string(),
            community_text2img: "images/text2img".to_string(),
        }
    }
}

/// Values applied by the request builder when the caller leaves a field out.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationDefaults {
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    pub num_inference_steps: u32,
    pub guidance_scale: f64,
    pub safety_checker: bool,
    pub enhance_prompt: bool,
    pub self_attention: bool,
    pub model_id: Option<String>,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        GenerationDefaults {
            width: 512,
            height: 512,
            samples: 1,
            num_inference_steps: 30,
            guidance_scale: 7.5,
            safety_checker: false,
            enhance_prompt: true,
            self_attention: false,
            model_id: Some("flux".to_string()),
        }
    }
}

/// Closed intervals every bounded request field must fall into.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationLimits {
    pub max_width: u32,
    pub max_height: u32,
    pub max_samples: u32,
    pub min_inference_steps: u32,
    pub max_inference_steps: u32,
    pub min_guidance_scale: f64,
    pub max_guidance_scale: f64,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        GenerationLimits {
            max_width: 1024,
            max_height: 1024,
            max_samples: 4,
            min_inference_steps: 1,
            max_inference_steps: 50,
            min_guidance_scale: 1.0,
            max_guidance_scale: 20.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelsLabConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub endpoints: Endpoints,
    pub defaults: GenerationDefaults,
    pub limits: GenerationLimits,
}

impl Default for ModelsLabConfig {
    fn default() -> Self {
        ModelsLabConfig {
            api_key: None,
            base_url: None,
            timeout: None,
            endpoints: Endpoints::default(),
            defaults: GenerationDefaults::default(),
            limits: GenerationLimits::default(),
        }
    }
}

impl ModelsLabConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var("MODELSLAB_API_KEY").ok().filter(|s| !s.is_empty());
        let base_url = env::var("MODELSLAB_BASE_URL").ok().filter(|s| !s.is_empty());
        let timeout = env::var("MODELSLAB_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs);

        ModelsLabConfig {
            api_key,
            base_url,
            timeout,
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_defaults(mut self, defaults: GenerationDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_limits(mut self, limits: GenerationLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(Duration::from_secs(60))
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ModelsLabError::ConfigError(
                    "ModelsLab API key is required (set MODELSLAB_API_KEY)".into(),
                )
            })
    }
}

#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub concurrency: Option<usize>,
    pub timeout: Option<Duration>,
    pub user_agent: Option<String>,
    pub name_prefix: Option<String>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        DownloadConfig {
            concurrency: None,
            timeout: None,
            user_agent: None,
            name_prefix: None,
        }
    }
}

impl DownloadConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let concurrency = env::var("MODELSLAB_DOWNLOAD_CONCURRENCY")
            .ok()
            .and_then(|s| s.parse().ok());
        let timeout = env::var("MODELSLAB_DOWNLOAD_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs);
        let name_prefix = env::var("MODELSLAB_DOWNLOAD_NAME_PREFIX")
            .ok()
            .filter(|s| !s.trim().is_empty());

        DownloadConfig {
            concurrency,
            timeout,
            user_agent: None,
            name_prefix,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    /// Never below one; a zero limit would stall the window loop.
    pub fn concurrency(&self) -> usize {
        self.concurrency.unwrap_or(3).max(1)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(Duration::from_secs(30))
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    pub fn name_prefix(&self) -> &str {
        self.name_prefix.as_deref().unwrap_or(DEFAULT_NAME_PREFIX)
    }
}
