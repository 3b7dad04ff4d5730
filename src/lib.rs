pub mod config;
pub mod download;
pub mod error;
pub mod logger;
pub mod models;
pub mod modelslab;
pub mod tools;

pub use config::{DownloadConfig, Endpoints, GenerationDefaults, GenerationLimits, ModelsLabConfig};
pub use download::{ArtifactFetcher, HttpFetcher, ImageDownloader};
pub use error::{ModelsLabError, Result};
pub use models::{
    BatchReport, ConnectionState, ConnectionStatus, DestinationPolicy, DownloadFailure,
    DownloadOutcome, DownloadReport, DownloadSuccess, DownloadTask, GenerationMetadata,
    GenerationParams, GenerationResult, OutputFormat, ProviderMeta, ProviderReply, WireRequest,
};
pub use modelslab::{
    DataSourceClient, GenerationOutput, ImageClient, ModelsLabClient, RequestBuilder,
    ResponseNormalizer, SaveOptions,
};
pub use tools::{Tool, ToolRegistry};
