use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;

use super::{
    fetcher::{ArtifactFetcher, HttpFetcher},
    format::{
        apply_extension, extension_for_format, format_file_size, resolve_extension,
        DEFAULT_CONTENT_TYPE, DEFAULT_EXTENSION,
    },
    path::{ensure_valid_image_path, ensure_valid_name_prefix},
};
use crate::{
    config::{DownloadConfig, DEFAULT_NAME_PREFIX},
    error::{ModelsLabError, Result},
    models::{
        BatchReport, DestinationPolicy, DownloadFailure, DownloadOutcome, DownloadReport,
        DownloadSuccess, DownloadTask, OutputFormat,
    },
};

/// Downloads artifacts in fixed windows: every fetch of a window is polled
/// together and the next window starts only once all of them have settled.
#[derive(Clone)]
pub struct ImageDownloader {
    fetcher: Arc<dyn ArtifactFetcher>,
    concurrency: usize,
    name_prefix: String,
}

impl ImageDownloader {
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        ensure_valid_name_prefix(config.name_prefix())?;
        let fetcher = HttpFetcher::new(config)?;
        Ok(Self {
            fetcher: Arc::new(fetcher),
            concurrency: config.concurrency(),
            name_prefix: config.name_prefix().to_string(),
        })
    }

    pub fn with_fetcher(fetcher: Arc<dyn ArtifactFetcher>, concurrency: usize) -> Self {
        Self {
            fetcher,
            concurrency: concurrency.max(1),
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
        }
    }

    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        ensure_valid_name_prefix(&prefix)?;
        self.name_prefix = prefix;
        Ok(self)
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Prefix used for batch file names when the caller gives none.
    pub fn name_prefix(&self) -> &str {
        &self.name_prefix
    }

    /// Builds every task up front so destination names depend only on the
    /// prefix and the index, never on completion order.
    pub fn plan(urls: &[String], policy: &DestinationPolicy) -> Vec<DownloadTask> {
        let extension = extension_for_format(policy.format).unwrap_or(DEFAULT_EXTENSION);
        urls.iter()
            .enumerate()
            .map(|(index, url)| DownloadTask {
                index,
                url: url.clone(),
                path: policy
                    .base_dir
                    .join(format!("{}_{}{}", policy.name_prefix, index + 1, extension)),
                format: policy.format,
            })
            .collect()
    }

    /// Fetches one artifact to a caller-chosen path.
    pub async fn download_one(
        &self,
        url: &str,
        output_path: &Path,
        format: OutputFormat,
    ) -> Result<DownloadSuccess> {
        let task = DownloadTask {
            index: 0,
            url: url.to_string(),
            path: output_path.to_path_buf(),
            format,
        };
        self.execute(&task).await
    }

    pub async fn download_batch(
        &self,
        urls: &[String],
        policy: &DestinationPolicy,
    ) -> Result<BatchReport> {
        self.run(urls, policy, self.concurrency).await
    }

    /// Only an empty URL list or an unsafe name prefix fails; per-item errors
    /// land in the report.
    pub async fn run(
        &self,
        urls: &[String],
        policy: &DestinationPolicy,
        concurrency_limit: usize,
    ) -> Result<BatchReport> {
        if urls.is_empty() {
            return Err(ModelsLabError::validation(
                "imageUrls",
                "must be a non-empty list",
            ));
        }
        ensure_valid_name_prefix(&policy.name_prefix)?;

        let limit = concurrency_limit.max(1);
        let tasks = Self::plan(urls, policy);
        let _timer = crate::logger::timer(&format!("download of {} artifacts", tasks.len()));

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (window_index, window) in tasks.chunks(limit).enumerate() {
            log::debug!(
                "Starting download window {} ({} items)",
                window_index + 1,
                window.len()
            );
            let settled = join_all(window.iter().map(|task| self.settle(task))).await;
            outcomes.extend(settled);
        }

        let report = BatchReport::from_outcomes(tasks.len(), outcomes);
        log::info!(
            "Downloaded {}/{} artifacts ({} failed)",
            report.succeeded,
            report.total,
            report.failed
        );
        Ok(report)
    }

    /// One URL writes straight to `output_path`; several are named from the
    /// prefix inside `output_path`'s parent directory. Without a prefix the
    /// downloader's configured one is used.
    pub async fn download(
        &self,
        urls: &[String],
        output_path: &Path,
        format: OutputFormat,
        name_prefix: Option<&str>,
    ) -> Result<DownloadReport> {
        match urls {
            [] => Err(ModelsLabError::validation(
                "imageUrls",
                "must be a non-empty list",
            )),
            [url] => {
                let task = DownloadTask {
                    index: 0,
                    url: url.clone(),
                    path: output_path.to_path_buf(),
                    format,
                };
                Ok(DownloadReport::Single(self.settle(&task).await))
            }
            _ => {
                let base_dir = output_path.parent().unwrap_or_else(|| Path::new(""));
                let policy = DestinationPolicy::new(base_dir)
                    .with_name_prefix(name_prefix.unwrap_or(&self.name_prefix))
                    .with_format(format);
                Ok(DownloadReport::Batch(self.download_batch(urls, &policy).await?))
            }
        }
    }

    async fn settle(&self, task: &DownloadTask) -> DownloadOutcome {
        match self.execute(task).await {
            Ok(success) => DownloadOutcome::Success(success),
            Err(e) => {
                log::warn!("Download {} ({}) failed: {}", task.index, task.url, e);
                DownloadOutcome::Failure(DownloadFailure {
                    index: task.index,
                    url: task.url.clone(),
                    error: e.to_string(),
                })
            }
        }
    }

    async fn execute(&self, task: &DownloadTask) -> Result<DownloadSuccess> {
        let artifact = self.fetcher.fetch(&task.url).await?;

        let extension = resolve_extension(task.format, artifact.content_type.as_deref());
        let final_path = apply_extension(&task.path, extension);
        ensure_valid_image_path(&final_path)?;

        if let Some(parent) = final_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&final_path, &artifact.bytes).await?;

        let bytes = artifact.bytes.len() as u64;
        log::debug!("Saved {} ({} bytes)", final_path.display(), bytes);

        Ok(DownloadSuccess {
            index: task.index,
            path: final_path,
            size: format_file_size(bytes),
            bytes,
            content_type: artifact
                .content_type
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            original_url: task.url.clone(),
            download_time: Utc::now(),
        })
    }
}
