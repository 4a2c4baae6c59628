//! NutriScan Server - HTTP API for nutrition estimates
//!
//! Wraps the `nutriscan` pipeline in an Axum service:
//!
//! - **Photo scans**: regression for in-domain images, nearest-reference
//!   lookup otherwise, `NOT_FOOD` for non-food photos
//! - **Dish calories**: calorie range and allergy warning from a description
//! - **Health & Metrics**: liveness/readiness probes and Prometheus metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe, 503 until the pipeline is loaded
//! - `GET /metrics` - Prometheus metrics
//! - `GET /api/v1/metadata` - Build and uptime info
//! - `POST /api/v1/scan` - Raw image bytes in, nutrition estimate out
//! - `POST /api/v1/dish/calories` - `{"description", "allergy"?}` in,
//!   `{"calories_range", "warning", "dish"?}` out
//!
//! Errors are `{"error": <message>, "code": <CODE>}` with the status mapped
//! from the pipeline error kind.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::{PipelineHandle, ServerState};
