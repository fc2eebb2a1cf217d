use std::{
    fs::File,
    io::{ErrorKind, Read},
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::config::LoggerConfig;

pub const CONFIG_FILE_NAME: &str = "mars.json";

/// Configuration used by [`crate::RuntimeCore::from_config`].
/// Use [`RuntimeConfigBuilder`] to build one from code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Name of the guest application, only used in logs.
    pub app_name: String,
    /// Installs a logger when set.
    pub logger_config: Option<LoggerConfig>,
    /// Resource container loaded at startup.
    pub resource_path: Option<PathBuf>,
    /// Decode IMAGE records into bitmaps. When off they are kept as raw bytes.
    pub decode_images: bool,
    /// Warn at startup about syscall ids no group binds.
    pub warn_unbound_syscalls: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            app_name: "MARS application".to_string(),
            logger_config: Some(Default::default()),
            resource_path: None,
            decode_images: true,
            warn_unbound_syscalls: true,
        }
    }
}

impl RuntimeConfig {
    /// Reads a json config. Fails when the file is missing.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        let config = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Reads a json config, falling back to the defaults when the file does not exist.
    pub fn read_or_default(path: &Path) -> anyhow::Result<Self> {
        match File::open(path) {
            Ok(_) => Self::load(path),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("{} not found, using default configuration", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("opening {}", path.display())),
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// `RuntimeConfigBuilder` is a convenience builder to create a `RuntimeConfig` from code.
#[derive(Default)]
pub struct RuntimeConfigBuilder {
    config: RuntimeConfig,
}

impl RuntimeConfigBuilder {
    pub fn new() -> Self {
        Self { config: Default::default() }
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.config.app_name = app_name.into();
        self
    }

    pub fn with_logger_config(mut self, logger_config: LoggerConfig) -> Self {
        self.config.logger_config = Some(logger_config);
        self
    }

    /// Leaves logger installation to the embedder.
    pub fn without_logger(mut self) -> Self {
        self.config.logger_config = None;
        self
    }

    pub fn with_resource_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.resource_path = Some(path.into());
        self
    }

    pub fn with_image_decoding(mut self, decode: bool) -> Self {
        self.config.decode_images = decode;
        self
    }

    pub fn with_unbound_warnings(mut self, warn: bool) -> Self {
        self.config.warn_unbound_syscalls = warn;
        self
    }

    /// Retrieves the configuration built
    pub fn get(self) -> RuntimeConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::LevelFilter;
    use pretty_assertions::assert_eq;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mars-runtime-{}-{}", std::process::id(), name))
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = RuntimeConfigBuilder::new()
            .with_app_name("demo")
            .with_resource_path("res.mars")
            .with_image_decoding(false)
            .without_logger()
            .get();

        assert_eq!(config.app_name, "demo");
        assert_eq!(config.resource_path, Some(PathBuf::from("res.mars")));
        assert!(!config.decode_images);
        assert!(config.warn_unbound_syscalls);
        assert_eq!(config.logger_config, None);
    }

    #[test]
    fn partial_json_takes_defaults() {
        let path = scratch_path("partial.json");
        std::fs::write(
            &path,
            br#"{"app_name":"x","logger_config":{"app_level_filter":"Trace","level_filter":"Off"}}"#,
        )
        .unwrap();

        let config = RuntimeConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.app_name, "x");
        assert_eq!(
            config.logger_config,
            Some(LoggerConfig {
                app_level_filter: LevelFilter::Trace,
                level_filter: LevelFilter::Off
            })
        );
        assert!(config.decode_images);
        assert_eq!(config.resource_path, None);
    }

    #[test]
    fn json_round_trip() {
        let config = RuntimeConfigBuilder::new().with_resource_path("a/b.mars").get();
        let path = scratch_path("round.json");
        std::fs::write(&path, config.to_json().unwrap()).unwrap();
        let back = RuntimeConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn missing_file() {
        let path = scratch_path("does-not-exist.json");
        assert!(RuntimeConfig::load(&path).is_err());
        assert_eq!(RuntimeConfig::read_or_default(&path).unwrap(), RuntimeConfig::default());
    }

    #[test]
    fn malformed_file() {
        let path = scratch_path("bad.json");
        std::fs::write(&path, b"{ not json").unwrap();
        let err = RuntimeConfig::read_or_default(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(err.is_err());
    }
}
