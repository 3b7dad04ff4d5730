pub mod image_client;
pub mod request;
pub mod response;
pub mod traits;

use std::path::PathBuf;

use crate::{
    config::{DownloadConfig, ModelsLabConfig},
    download::{ensure_valid_image_path, ensure_valid_name_prefix, ImageDownloader},
    error::Result,
    models::{DownloadReport, GenerationParams, GenerationResult, OutputFormat},
};

pub use image_client::ImageClient;
pub use request::RequestBuilder;
pub use response::{classify, ResponseNormalizer};
pub use traits::DataSourceClient;

/// Where and how generated images are written. Without a name prefix the
/// downloader's configured prefix names batch files.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOptions {
    pub output_path: PathBuf,
    pub format: OutputFormat,
    pub name_prefix: Option<String>,
}

impl SaveOptions {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            format: OutputFormat::Original,
            name_prefix: None,
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub result: GenerationResult,
    pub download: Option<DownloadReport>,
}

#[derive(Clone)]
pub struct ModelsLabClient {
    image_client: ImageClient,
    downloader: ImageDownloader,
}

impl ModelsLabClient {
    pub fn new(config: ModelsLabConfig, downloads: DownloadConfig) -> Result<Self> {
        let image_client = ImageClient::new(config)?;
        let downloader = ImageDownloader::new(&downloads)?;
        log::debug!(
            "ModelsLab client ready (download concurrency {})",
            downloader.concurrency()
        );
        Ok(Self::from_parts(image_client, downloader))
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ModelsLabConfig::from_env(), DownloadConfig::from_env())
    }

    pub fn from_parts(image_client: ImageClient, downloader: ImageDownloader) -> Self {
        Self {
            image_client,
            downloader,
        }
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }

    pub fn downloader(&self) -> &ImageDownloader {
        &self.downloader
    }

    /// Generates images and, when `save` is given, downloads them. The
    /// destination and name prefix are checked before the provider is called.
    pub async fn generate_and_download(
        &self,
        params: GenerationParams,
        save: Option<&SaveOptions>,
    ) -> Result<GenerationOutput> {
        if let Some(save) = save {
            ensure_valid_image_path(&save.output_path)?;
            if let Some(prefix) = save.name_prefix.as_deref() {
                ensure_valid_name_prefix(prefix)?;
            }
        }

        let result = self.image_client.generate_image(params).await?;

        let download = match save {
            Some(save) => Some(
                self.downloader
                    .download(
                        &result.image_urls,
                        &save.output_path,
                        save.format,
                        save.name_prefix.as_deref(),
                    )
                    .await?,
            ),
            None => None,
        };

        Ok(GenerationOutput { result, download })
    }
}
