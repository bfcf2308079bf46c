//! Application wiring for the Hearth gateway: configuration loading,
//! telemetry bootstrap, and the serve loop.

mod bootstrap;
mod error;

pub use bootstrap::run_app;
pub use error::{AppError, AppResult};
