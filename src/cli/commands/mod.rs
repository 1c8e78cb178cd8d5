//! CLI command implementations.

mod bundle;
mod clip;
mod config;
mod doctor;
mod fetch;
mod latest;
mod serve;

pub use bundle::run_bundle;
pub use clip::run_clip;
pub use config::run_config;
pub use doctor::run_doctor;
pub use fetch::run_fetch;
pub use latest::run_latest;
pub use serve::run_serve;
