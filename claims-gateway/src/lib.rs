pub mod config;
pub mod error;
pub mod multipart;
pub mod service;

pub use config::{DecisionMode, GatewayConfig, LogFormat};
pub use error::{ApiError, ApiResult};
pub use service::{AppState, build_router};
