use async_trait::async_trait;

use crate::{
    error::Result,
    models::{ConnectionStatus, GenerationParams, GenerationResult},
};

/// A remote data source that can be health-checked and queried.
#[async_trait]
pub trait DataSourceClient: Send + Sync {
    async fn test_connection(&self) -> ConnectionStatus;

    async fn query(&self, params: GenerationParams) -> Result<GenerationResult>;
}
