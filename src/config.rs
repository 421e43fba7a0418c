use eyre::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use dealboard::domain::Stage;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub storage: StorageConfig,
    pub stages: Vec<StageConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("dealboard"),
        }
    }
}

/// One pipeline stage as configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    pub id: String,
    pub name: String,
    #[serde(default = "default_stage_color")]
    pub color: String,
    pub order: i32,
}

fn default_stage_color() -> String {
    "white".to_string()
}

impl From<&StageConfig> for Stage {
    fn from(config: &StageConfig) -> Self {
        Stage::new(&config.id, &config.name, &config.color, config.order)
    }
}

/// The five-stage pipeline the board ships with.
fn default_stages() -> Vec<StageConfig> {
    let stage = |id: &str, name: &str, color: &str, order: i32| StageConfig {
        id: id.to_string(),
        name: name.to_string(),
        color: color.to_string(),
        order,
    };

    vec![
        stage("new", "New Leads", "white", 1),
        stage("qualified", "Qualified", "blue", 2),
        stage("viewing", "Viewing", "yellow", 3),
        stage("negotiation", "Negotiation", "magenta", 4),
        stage("won", "Closed Won", "green", 5),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            storage: StorageConfig::default(),
            stages: default_stages(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            let config = Self::load_from_file(path)
                .context(format!("Failed to load config from {}", path.display()))?;
            config.validate()?;
            return Ok(config);
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => {
                        config.validate()?;
                        return Ok(config);
                    }
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => {
                    config.validate()?;
                    return Ok(config);
                }
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Check the configured stage set.
    ///
    /// The board rejects duplicate stage ids itself; duplicate display
    /// orders are a configuration concern and are caught here.
    fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            bail!("Config defines no pipeline stages");
        }

        let mut ids = HashSet::new();
        let mut orders = HashSet::new();
        for stage in &self.stages {
            if !ids.insert(stage.id.as_str()) {
                bail!("Config defines stage id {} more than once", stage.id);
            }
            if !orders.insert(stage.order) {
                bail!("Config defines stage order {} more than once", stage.order);
            }
        }

        Ok(())
    }

    /// The configured stages as board-ready records.
    pub fn stages(&self) -> Vec<Stage> {
        self.stages.iter().map(Stage::from).collect()
    }
}
