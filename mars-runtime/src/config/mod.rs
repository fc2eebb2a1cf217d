mod logger_config;
mod runtime_config;

pub use logger_config::LoggerConfig;
pub use runtime_config::{RuntimeConfig, RuntimeConfigBuilder, CONFIG_FILE_NAME};
