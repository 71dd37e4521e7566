//! Configuration management
//!
//! Assistant models and tiers, storage location, curriculum source and
//! display settings, stored as `config.toml` in the platform config dir.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::curriculum::Curriculum;
use crate::progress::store::{DEFAULT_DATE_FORMAT, DEFAULT_PROGRESS_KEY};
use crate::types::ModelTier;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub curriculum: CurriculumConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Model used for the fast tier
    #[serde(default = "default_fast_model")]
    pub fast_model: String,
    /// Model used for the deep tier
    #[serde(default = "default_deep_model")]
    pub deep_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Thinking budget sent with deep-tier requests
    #[serde(default = "default_thinking_budget")]
    pub deep_thinking_budget: u32,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Retry once on the other tier after a transport or unclassified failure
    #[serde(default)]
    pub fallback_to_other_tier: bool,
    #[serde(default)]
    pub default_tier: ModelTier,
}

fn default_fast_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_deep_model() -> String {
    "gemini-3-pro-preview".to_string()
}

fn default_temperature() -> f64 {
    0.75
}

fn default_thinking_budget() -> u32 {
    16000
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            fast_model: default_fast_model(),
            deep_model: default_deep_model(),
            temperature: default_temperature(),
            deep_thinking_budget: default_thinking_budget(),
            base_url: default_base_url(),
            fallback_to_other_tier: false,
            default_tier: ModelTier::default(),
        }
    }
}

impl AssistantConfig {
    pub fn model(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast_model,
            ModelTier::Deep => &self.deep_model,
        }
    }

    pub fn set_model(&mut self, tier: ModelTier, model: String) {
        match tier {
            ModelTier::Fast => self.fast_model = model,
            ModelTier::Deep => self.deep_model = model,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Key the progress blob is stored under
    #[serde(default = "default_progress_key")]
    pub progress_key: String,
    /// Overrides the platform data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

fn default_progress_key() -> String {
    DEFAULT_PROGRESS_KEY.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            progress_key: default_progress_key(),
            data_dir: None,
        }
    }
}

impl StorageConfig {
    pub fn resolved_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => data_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurriculumConfig {
    /// Custom curriculum TOML; the built-in one is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl CurriculumConfig {
    pub fn load(&self) -> Result<Curriculum> {
        match &self.path {
            Some(path) => Curriculum::from_path(path)
                .with_context(|| format!("Failed to load curriculum from {}", path.display())),
            None => Curriculum::builtin().context("Built-in curriculum is invalid"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// strftime pattern for insight dates
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
        }
    }
}

impl Config {
    /// Load configuration, writing defaults on first run
    pub fn load() -> Result<Self> {
        let config_path = config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent().context("Config path has no parent")?;
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "axiom-path", "axiom-path")
        .context("Failed to get project directories")
}

pub fn config_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Platform data directory, where the progress blob lives by default
pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// Print the current configuration
pub fn show_config() -> Result<()> {
    let config = Config::load()?;
    let key_status = if crate::assistant::credentials::has_api_key() {
        "stored"
    } else {
        "not stored"
    };

    println!("Assistant");
    println!("  {:<22} {}", "fast model (flash)", config.assistant.fast_model);
    println!("  {:<22} {}", "deep model (pro)", config.assistant.deep_model);
    println!("  {:<22} {}", "default tier", config.assistant.default_tier);
    println!("  {:<22} {}", "temperature", config.assistant.temperature);
    println!("  {:<22} {}", "deep thinking budget", config.assistant.deep_thinking_budget);
    println!(
        "  {:<22} {}",
        "fallback to other tier",
        if config.assistant.fallback_to_other_tier { "on" } else { "off" }
    );
    println!("  {:<22} {}", "API key", key_status);
    println!();
    println!("Storage");
    println!("  {:<22} {}", "progress key", config.storage.progress_key);
    println!("  {:<22} {}", "data dir", config.storage.resolved_data_dir()?.display());
    println!();
    println!("Curriculum");
    match &config.curriculum.path {
        Some(path) => println!("  {:<22} {}", "path", path.display()),
        None => println!("  {:<22} built-in", "path"),
    }
    println!();
    println!("Display");
    println!("  {:<22} {}", "date format", config.display.date_format);
    println!();
    println!("Config file: {}", config_path()?.display());

    Ok(())
}

/// Store the API key in the keyring (or the fallback file)
pub fn set_api_key(key: &str) -> Result<()> {
    let key = key.trim();
    if let Err(e) = crate::assistant::credentials::validate(key) {
        anyhow::bail!("{}\n{}", e, e.remediation());
    }
    match crate::assistant::credentials::set_api_key(key)? {
        crate::assistant::credentials::KeyStorage::Keyring => println!("API key stored securely."),
        crate::assistant::credentials::KeyStorage::File => {
            println!("API key stored (file-based storage, keyring unavailable).")
        }
    }
    Ok(())
}

pub fn clear_api_key() -> Result<()> {
    crate::assistant::credentials::delete_api_key()?;
    println!("API key removed.");
    Ok(())
}

/// Set the model for a tier (`flash`/`fast` or `pro`/`deep`)
pub fn set_model(tier: &str, model: &str) -> Result<()> {
    let tier = ModelTier::parse(tier)
        .with_context(|| format!("Unknown tier '{}'. Available tiers: flash, pro", tier))?;

    let mut config = Config::load()?;
    config.assistant.set_model(tier, model.to_string());
    config.save()?;
    println!("Model for '{}' set to: {}", tier, model);
    Ok(())
}

pub fn set_fallback(enabled: bool) -> Result<()> {
    let mut config = Config::load()?;
    config.assistant.fallback_to_other_tier = enabled;
    config.save()?;
    println!("Fallback to the other tier {}", if enabled { "enabled" } else { "disabled" });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.assistant.fast_model, "gemini-3-flash-preview");
        assert_eq!(config.assistant.deep_model, "gemini-3-pro-preview");
        assert_eq!(config.assistant.temperature, 0.75);
        assert_eq!(config.assistant.deep_thinking_budget, 16000);
        assert!(!config.assistant.fallback_to_other_tier);
        assert_eq!(config.storage.progress_key, "genesis_progress");
        assert_eq!(config.display.date_format, "%d.%m.%Y");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [assistant]
            deep_model = "gemini-custom"
            fallback_to_other_tier = true
            default_tier = "deep"

            [storage]
            data_dir = "/tmp/axioms"
            "#,
        )
        .unwrap();

        assert_eq!(config.assistant.deep_model, "gemini-custom");
        assert_eq!(config.assistant.fast_model, "gemini-3-flash-preview");
        assert!(config.assistant.fallback_to_other_tier);
        assert_eq!(config.assistant.default_tier, ModelTier::Deep);
        assert_eq!(config.storage.progress_key, "genesis_progress");
        assert_eq!(
            config.storage.resolved_data_dir().unwrap(),
            PathBuf::from("/tmp/axioms")
        );
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.assistant.set_model(ModelTier::Fast, "gemini-mini".into());
        config.display.date_format = "%Y-%m-%d".into();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.assistant.model(ModelTier::Fast), "gemini-mini");
    }

    #[test]
    fn test_builtin_curriculum_by_default() {
        let curriculum = CurriculumConfig::default().load().unwrap();
        assert_eq!(curriculum.total_axioms(), 55);
    }
}
