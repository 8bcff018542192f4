//! Configuration Management

use crate::capture::session::DEFAULT_TEXT_SNIPPET_MAX_CHARS;
use crate::codegen::{Framework, SynthesisOptions};
use crate::enhance::EnhanceConfig;
use crate::synthesis::ParameterExtractor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Capture settings
    pub capture: CaptureConfig,
    /// Script synthesis settings
    pub synthesis: SynthesisConfig,
    /// Defaults of the run-time knobs baked into generated scripts
    pub runtime: RuntimeSettings,
    /// Optional AI enhancement
    pub enhance: EnhanceConfig,
}

/// Capture configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Maximum characters kept from a clicked element's text
    pub text_snippet_max_chars: usize,
}

/// Synthesis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Frameworks generated when none are requested explicitly
    pub targets: Vec<Framework>,
    pub selector_timeout_ms: u64,
    /// Pause after a click
    pub click_settle_ms: u64,
    /// Pause after a scroll
    pub scroll_settle_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    pub headless: bool,
    pub timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            text_snippet_max_chars: DEFAULT_TEXT_SNIPPET_MAX_CHARS,
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        let options = SynthesisOptions::default();
        Self {
            targets: Framework::ALL.to_vec(),
            selector_timeout_ms: options.selector_timeout_ms,
            click_settle_ms: options.click_settle_ms,
            scroll_settle_ms: options.scroll_settle_ms,
        }
    }
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        let options = SynthesisOptions::default();
        Self {
            headless: options.headless,
            timeout_ms: options.timeout_ms,
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.capture.text_snippet_max_chars == 0 {
            return Err(crate::Error::Config("text_snippet_max_chars must be > 0".to_string()));
        }
        if self.synthesis.targets.is_empty() {
            return Err(crate::Error::Config("synthesis.targets must name at least one framework".to_string()));
        }
        if self.synthesis.selector_timeout_ms == 0 {
            return Err(crate::Error::Config("selector_timeout_ms must be > 0".to_string()));
        }
        if self.runtime.timeout_ms == 0 {
            return Err(crate::Error::Config("timeout_ms must be > 0".to_string()));
        }
        if self.synthesis.selector_timeout_ms > self.runtime.timeout_ms {
            return Err(crate::Error::Config(format!(
                "selector_timeout_ms ({}) must not exceed timeout_ms ({})",
                self.synthesis.selector_timeout_ms, self.runtime.timeout_ms
            )));
        }
        if self.enhance.model.trim().is_empty() {
            return Err(crate::Error::Config("model must not be empty".to_string()));
        }
        if !(0.0..=1.0).contains(&self.enhance.temperature) {
            return Err(crate::Error::Config(format!(
                "temperature must be in [0, 1], got {}", self.enhance.temperature
            )));
        }
        if url::Url::parse(&self.enhance.endpoint).is_err() {
            return Err(crate::Error::Config(format!(
                "endpoint is not a valid URL: {}", self.enhance.endpoint
            )));
        }
        if self.enhance.timeout_secs == 0 {
            return Err(crate::Error::Config("timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }

    /// Options handed to the script synthesizer
    pub fn synthesis_options(&self) -> SynthesisOptions {
        SynthesisOptions {
            selector_timeout_ms: self.synthesis.selector_timeout_ms,
            click_settle_ms: self.synthesis.click_settle_ms,
            scroll_settle_ms: self.synthesis.scroll_settle_ms,
            headless: self.runtime.headless,
            timeout_ms: self.runtime.timeout_ms,
        }
    }

    /// Extractor whose run-time knob defaults match `[runtime]`
    pub fn parameter_extractor(&self) -> ParameterExtractor {
        ParameterExtractor {
            default_headless: self.runtime.headless,
            default_timeout_ms: self.runtime.timeout_ms,
        }
    }

    /// Load config from file
    pub fn load(path: &Path) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from default location
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<(), crate::Error> {
        let content = self.to_toml()?;

        // Create parent directories
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Save to default location
    pub fn save_default(&self) -> Result<(), crate::Error> {
        self.save(&Self::default_path())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".replay_compiler").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    fn to_table(&self) -> Result<toml::Table, crate::Error> {
        match toml::Value::try_from(self).map_err(|e| crate::Error::Config(e.to_string()))? {
            toml::Value::Table(table) => Ok(table),
            other => Err(crate::Error::Config(format!("config serialized as {}", other.type_str()))),
        }
    }

    /// Value at a dotted key such as `runtime.timeout_ms`
    pub fn get(&self, key: &str) -> Result<toml::Value, crate::Error> {
        let table = self.to_table()?;
        let mut parts = key.split('.');
        let first = parts.next().unwrap_or_default();
        let mut current = table
            .get(first)
            .ok_or_else(|| crate::Error::Config(format!("unknown key '{}'", key)))?;
        for part in parts {
            current = current
                .get(part)
                .ok_or_else(|| crate::Error::Config(format!("unknown key '{}'", key)))?;
        }
        Ok(current.clone())
    }

    /// Set a dotted key from its TOML text, e.g. `("runtime.headless", "false")`.
    /// Bare words that are not valid TOML are taken as strings.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<(), crate::Error> {
        let value = parse_value(raw);
        let mut table = self.to_table()?;

        let parts: Vec<&str> = key.split('.').collect();
        let (leaf, sections) = parts
            .split_last()
            .ok_or_else(|| crate::Error::Config("empty key".to_string()))?;
        let mut current = &mut table;
        for section in sections {
            current = current
                .get_mut(*section)
                .and_then(toml::Value::as_table_mut)
                .ok_or_else(|| crate::Error::Config(format!("unknown section '{}'", section)))?;
        }
        match current.get_mut(*leaf) {
            Some(slot) => *slot = value,
            None => return Err(crate::Error::Config(format!("unknown key '{}'", key))),
        }

        let updated: Config = toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| crate::Error::Config(format!("invalid value for '{}': {}", key, e)))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

fn parse_value(raw: &str) -> toml::Value {
    format!("value = {}", raw)
        .parse::<toml::Table>()
        .ok()
        .and_then(|mut t| t.remove("value"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}
