use crate::{
    config::{GenerationDefaults, GenerationLimits, ModelsLabConfig},
    error::{ModelsLabError, Result},
    models::{GenerationParams, WireRequest},
};

/// Turns caller parameters into a fully specified, range-checked
/// [`WireRequest`]. Pure: no I/O happens here.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    api_key: String,
    defaults: GenerationDefaults,
    limits: GenerationLimits,
}

impl RequestBuilder {
    pub fn new(
        api_key: impl Into<String>,
        defaults: GenerationDefaults,
        limits: GenerationLimits,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            defaults,
            limits,
        }
    }

    pub fn from_config(config: &ModelsLabConfig) -> Result<Self> {
        let api_key = config.require_api_key()?;
        Ok(Self::new(
            api_key,
            config.defaults.clone(),
            config.limits.clone(),
        ))
    }

    pub fn build(&self, params: &GenerationParams) -> Result<WireRequest> {
        let prompt = params.prompt.trim();
        if prompt.is_empty() {
            return Err(ModelsLabError::validation(
                "prompt",
                "is required and cannot be empty",
            ));
        }

        let limits = &self.limits;
        let width = params.width.unwrap_or(self.defaults.width as i64);
        check_range("width", width, 1, limits.max_width as i64)?;

        let height = params.height.unwrap_or(self.defaults.height as i64);
        check_range("height", height, 1, limits.max_height as i64)?;

        let samples = params.samples.unwrap_or(self.defaults.samples as i64);
        check_range("samples", samples, 1, limits.max_samples as i64)?;

        let steps = params
            .num_inference_steps
            .unwrap_or(self.defaults.num_inference_steps as i64);
        check_range(
            "num_inference_steps",
            steps,
            limits.min_inference_steps as i64,
            limits.max_inference_steps as i64,
        )?;

        let guidance_scale = params
            .guidance_scale
            .unwrap_or(self.defaults.guidance_scale);
        if !(limits.min_guidance_scale..=limits.max_guidance_scale).contains(&guidance_scale) {
            return Err(ModelsLabError::validation(
                "guidance_scale",
                format!(
                    "must be between {} and {} (got {})",
                    limits.min_guidance_scale, limits.max_guidance_scale, guidance_scale
                ),
            ));
        }

        let model_id = non_empty(&params.model_id).or_else(|| self.defaults.model_id.clone());

        Ok(WireRequest {
            key: self.api_key.clone(),
            prompt: prompt.to_string(),
            negative_prompt: non_empty(&params.negative_prompt),
            width: width.to_string(),
            height: height.to_string(),
            samples: samples.to_string(),
            num_inference_steps: steps.to_string(),
            safety_checker: yes_no(params.safety_checker.unwrap_or(self.defaults.safety_checker)),
            enhance_prompt: yes_no(params.enhance_prompt.unwrap_or(self.defaults.enhance_prompt)),
            seed: params.seed,
            guidance_scale,
            self_attention: yes_no(params.self_attention.unwrap_or(self.defaults.self_attention)),
            model_id,
            vae: non_empty(&params.vae),
            webhook: non_empty(&params.webhook),
            track_id: non_empty(&params.track_id),
        })
    }
}

fn check_range(field: &str, value: i64, min: i64, max: i64) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ModelsLabError::validation(
            field,
            format!("must be between {} and {} (got {})", min, max, value),
        ))
    }
}

fn yes_no(flag: bool) -> String {
    let encoded = if flag { "yes" } else { "no" };
    encoded.to_string()
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
