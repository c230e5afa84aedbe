/// Database connection and table creation
pub mod database;

/// Secrets loaded from environment variables
pub mod secrets;

/// Non-secret settings from sentinel.toml and the environment
pub mod settings;

pub use secrets::Secrets;
pub use settings::Settings;
