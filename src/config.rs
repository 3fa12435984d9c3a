use crate::services::{ClassifierOptions, PlatformCapabilities};
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub capabilities: PlatformCapabilities,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifierConfig {
    pub decay_ms: u64,
    pub target_types: Vec<String>,
    pub touch_prefix: String,
    pub mouse_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        let options = ClassifierOptions::default();
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
            classifier: ClassifierConfig {
                decay_ms: options.decay.as_millis() as u64,
                target_types: vec!["click".to_string()],
                touch_prefix: options.touch_prefix,
                mouse_prefix: options.mouse_prefix,
            },
            capabilities: PlatformCapabilities::all(),
        }
    }
}

impl Config {
    /// Defaults, overridden by the TOML file (if present), overridden by
    /// `TOUCH_ORIGIN_` environment variables (`__` separates sections).
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("TOUCH_ORIGIN_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => anyhow::bail!("Invalid log format: {}", self.logging.format),
        }

        if self.classifier.decay_ms == 0 {
            anyhow::bail!("decay_ms must be greater than 0");
        }

        if self.classifier.target_types.is_empty() {
            anyhow::bail!("At least one target type is required");
        }

        for (i, target_type) in self.classifier.target_types.iter().enumerate() {
            if target_type.trim().is_empty() {
                anyhow::bail!("Empty target type #{}", i + 1);
            }
        }

        if self.classifier.touch_prefix == self.classifier.mouse_prefix {
            anyhow::bail!(
                "touch_prefix and mouse_prefix must differ (both '{}')",
                self.classifier.touch_prefix
            );
        }

        Ok(())
    }

    pub fn classifier_options(&self) -> ClassifierOptions {
        ClassifierOptions {
            decay: Duration::from_millis(self.classifier.decay_ms),
            touch_prefix: self.classifier.touch_prefix.clone(),
            mouse_prefix: self.classifier.mouse_prefix.clone(),
        }
    }
}
