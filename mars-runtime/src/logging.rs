use crate::config::LoggerConfig;

const APP_MODULES: &[&str] = &["mars_core", "mars_events", "mars_runtime", "mars_inspect"];

/// Installs `env_logger` with the configured filters. `RUST_LOG` still overrides them.
///
/// Returns false when a logger was already installed, which is normal when the
/// embedder sets up its own.
pub fn init_logger(config: &LoggerConfig) -> bool {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(config.level_filter);
    for module in APP_MODULES {
        builder.filter_module(module, config.app_level_filter);
    }
    builder.parse_default_env();

    match builder.try_init() {
        Ok(()) => true,
        Err(e) => {
            log::debug!("logger already installed: {}", e);
            false
        }
    }
}
