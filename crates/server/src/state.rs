use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use metrics_exporter_prometheus::PrometheusHandle;
use nutriscan::{NutriConfig, PipelineContext, PipelineError};
use std::sync::Arc;

/// Pipeline as seen by request handlers.
#[derive(Clone)]
pub enum PipelineHandle {
    Ready(Arc<PipelineContext>),
    /// Startup loading failed; requests fail fast with this reason.
    Unavailable(String),
}

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    pipeline: PipelineHandle,

    metrics: Option<PrometheusHandle>,
}

impl ServerState {
    pub fn new(config: ServerConfig, pipeline: PipelineHandle) -> Self {
        Self {
            config: Arc::new(config),
            pipeline,
            metrics: None,
        }
    }

    /// Loads the pipeline named in `config`. A failure is logged and leaves
    /// the server up in the unavailable state.
    pub async fn load(config: ServerConfig) -> Self {
        let pipeline = match load_pipeline(&config).await {
            Ok(ctx) => PipelineHandle::Ready(Arc::new(ctx)),
            Err(err) => {
                tracing::error!(
                    error = %err,
                    path = %config.pipeline_config.display(),
                    "pipeline failed to load; serving in unavailable state"
                );
                PipelineHandle::Unavailable(err.to_string())
            }
        };
        Self::new(config, pipeline)
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// The loaded pipeline, or `ModelNotLoaded`.
    pub fn pipeline(&self) -> ServerResult<&Arc<PipelineContext>> {
        match &self.pipeline {
            PipelineHandle::Ready(ctx) => Ok(ctx),
            PipelineHandle::Unavailable(reason) => {
                Err(ServerError::Pipeline(PipelineError::ModelNotLoaded(reason.clone())))
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.pipeline, PipelineHandle::Ready(_))
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.pipeline {
            PipelineHandle::Ready(_) => None,
            PipelineHandle::Unavailable(reason) => Some(reason),
        }
    }

    pub fn metrics_handle(&self) -> Option<&PrometheusHandle> {
        self.metrics.as_ref()
    }
}

async fn load_pipeline(config: &ServerConfig) -> Result<PipelineContext, PipelineError> {
    let pipeline_config = NutriConfig::from_file(&config.pipeline_config)?;
    PipelineContext::load(pipeline_config).await
}

/// Server metadata for the info endpoint
#[derive(Debug, serde::Serialize)]
pub struct ServerMetadata {
    pub version: String,
    pub uptime_seconds: u64,
}
