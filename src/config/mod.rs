/// Price table and crypto wallet addresses from config.toml
pub mod pricing;

/// Environment-provided Discord identifiers and full startup configuration
pub mod settings;

pub use settings::{load_app_configuration, AppConfig};
