//! photomod server - HTTP API for the photo modification pipeline
//!
//! Exposes [`photomod::Orchestrator`] and the standalone HEIC converter over
//! a small JSON API.
//!
//! # Features
//!
//! - **Middleware**: CORS, compression, request ID tracking, structured logging
//! - **Configuration**: `.env`, optional `server.{toml,yaml,json}` file and
//!   `PHOTOMOD__*` environment variables; `IMGBB_API_KEY` and
//!   `N8N_WEBHOOK_URL` are honoured as fallbacks
//! - **Graceful Shutdown**: SIGTERM and Ctrl+C
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
//! - `GET /ready` - Readiness probe (503 until staging and transform are configured)
//! - `POST /api/modify-photo` - `{image, prompt, format?}` → `ClientResult`
//! - `POST /api/convert-heic` - `{image}` → `{success, converted_image}`

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, init_tracing, start_server};
pub use state::ServerState;
