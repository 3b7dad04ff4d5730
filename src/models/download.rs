use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::common::OutputFormat;
use crate::config::DEFAULT_NAME_PREFIX;

/// One artifact to fetch, with its destination fixed before any fetch starts.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadTask {
    pub index: usize,
    pub url: String,
    pub path: PathBuf,
    pub format: OutputFormat,
}

/// How batch destinations are named: `<base_dir>/<name_prefix>_<index + 1><ext>`.
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationPolicy {
    pub base_dir: PathBuf,
    pub name_prefix: String,
    pub format: OutputFormat,
}

impl DestinationPolicy {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            format: OutputFormat::Original,
        }
    }

    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadSuccess {
    pub index: usize,
    pub path: PathBuf,
    pub size: String,
    pub bytes: u64,
    pub content_type: String,
    pub original_url: String,
    pub download_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadFailure {
    pub index: usize,
    pub url: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadOutcome {
    Success(DownloadSuccess),
    Failure(DownloadFailure),
}

impl DownloadOutcome {
    pub fn index(&self) -> usize {
        match self {
            DownloadOutcome::Success(s) => s.index,
            DownloadOutcome::Failure(f) => f.index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub success: bool,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<DownloadSuccess>,
    pub errors: Vec<DownloadFailure>,
}

impl BatchReport {
    /// Splits outcomes into ordered success and failure lists.
    pub fn from_outcomes(total: usize, mut outcomes: Vec<DownloadOutcome>) -> Self {
        outcomes.sort_by_key(DownloadOutcome::index);

        let mut results = Vec::new();
        let mut errors = Vec::new();
        for outcome in outcomes {
            match outcome {
                DownloadOutcome::Success(s) => results.push(s),
                DownloadOutcome::Failure(f) => errors.push(f),
            }
        }

        BatchReport {
            success: !results.is_empty(),
            total,
            succeeded: results.len(),
            failed: errors.len(),
            results,
            errors,
        }
    }
}

/// A single artifact is reported unwrapped; several become a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadReport {
    Single(DownloadOutcome),
    Batch(BatchReport),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(index: usize) -> DownloadOutcome {
        DownloadOutcome::Success(DownloadSuccess {
            index,
            path: PathBuf::from(format!("out/img_{}.png", index + 1)),
            size: "1 KB".into(),
            bytes: 1024,
            content_type: "image/png".into(),
            original_url: format!("https://cdn.example.com/{}.png", index),
            download_time: Utc::now(),
        })
    }

    fn failure(index: usize) -> DownloadOutcome {
        DownloadOutcome::Failure(DownloadFailure {
            index,
            url: format!("https://cdn.example.com/{}.png", index),
            error: "timed out".into(),
        })
    }

    #[test]
    fn test_batch_report_orders_by_index() {
        let report =
            BatchReport::from_outcomes(4, vec![failure(3), success(2), failure(1), success(0)]);
        assert!(report.success);
        assert_eq!(report.total, 4);
        assert_eq!(report.succeeded + report.failed, report.total);
        let ok: Vec<usize> = report.results.iter().map(|r| r.index).collect();
        let bad: Vec<usize> = report.errors.iter().map(|e| e.index).collect();
        assert_eq!(ok, vec![0, 2]);
        assert_eq!(bad, vec![1, 3]);
    }

    #[test]
    fn test_batch_report_all_failed() {
        let report = BatchReport::from_outcomes(2, vec![failure(0), failure(1)]);
        assert!(!report.success);
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed, 2);
    }

    #[test]
    fn test_success_record_serializes_camel_case() {
        let DownloadOutcome::Success(record) = success(0) else {
            unreachable!()
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["contentType"], "image/png");
        assert_eq!(value["path"], "out/img_1.png");
        assert!(value.get("originalUrl").is_some());
    }
}
