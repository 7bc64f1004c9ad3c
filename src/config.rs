use crate::error::{EcoWoodError, Result};
use dialoguer::{Input, Select};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Constants the normalizer asserts on every request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Freight cost at or above this margin makes shipping unprofitable.
    #[serde(default = "default_profit_margin")]
    pub profit_margin: f64,
    #[serde(default = "default_enabled")]
    pub assume_compost_market: bool,
    #[serde(default = "default_enabled")]
    pub assume_gardening_demand: bool,
}

fn default_profit_margin() -> f64 {
    20.0
}

fn default_enabled() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            profit_margin: default_profit_margin(),
            assume_compost_market: true,
            assume_gardening_demand: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WorkerMode {
    /// Fresh blocking task per request, rule base shared read-only.
    #[default]
    Thread,
    /// Fresh child process per request.
    Process,
}

impl WorkerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerMode::Thread => "thread",
            WorkerMode::Process => "process",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostConfig {
    #[serde(default)]
    pub mode: WorkerMode,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Program run in process mode. Defaults to the current executable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_program: Option<PathBuf>,
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl HostConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            mode: WorkerMode::Thread,
            timeout_ms: default_timeout_ms(),
            worker_program: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Loads the YAML config. An explicit path must exist; otherwise the
    /// standard locations are searched and built-in defaults are used when
    /// nothing is found.
    pub fn load(config_override: Option<&PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) if !p.exists() => {
                return Err(EcoWoodError::Config(format!(
                    "Config file not found at {:?}",
                    p
                )));
            }
            Some(p) => p.clone(),
            None => match Self::find_config_path() {
                Some(p) => p,
                None => {
                    tracing::debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        Self::from_path(&config_path)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| EcoWoodError::Config(format!("Failed to read config: {}", e)))?;

        let config_str = Self::substitute_env_vars(&config_str)?;
        Self::parse(&config_str)
    }

    pub fn parse(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| EcoWoodError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.engine.profit_margin.is_finite() || self.engine.profit_margin < 0.0 {
            return Err(EcoWoodError::Config(format!(
                "engine.profit_margin must be a non-negative number, got {}",
                self.engine.profit_margin
            )));
        }
        if self.host.timeout_ms == 0 {
            return Err(EcoWoodError::Config(
                "host.timeout_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Search for config.yaml in standard locations.
    fn find_config_path() -> Option<PathBuf> {
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir()
            .map(|dir| dir.join("ecowood").join("config.yaml"))
            .filter(|p| p.exists())
    }

    /// Default path for writing new config files (~/.config/ecowood/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| EcoWoodError::Config("Cannot determine config directory".into()))?
            .join("ecowood");
        Ok(config_dir.join("config.yaml"))
    }

    /// Run interactive setup prompts and write config to disk.
    pub fn setup_interactive() -> Result<(Self, PathBuf)> {
        println!();
        println!("EcoWood setup");
        println!();

        let profit_margin: f64 = Input::new()
            .with_prompt("  Profit margin per unit (freight at or above it is unprofitable)")
            .default(default_profit_margin())
            .interact_text()
            .map_err(|e| EcoWoodError::Config(format!("Input error: {}", e)))?;

        let modes = [WorkerMode::Thread, WorkerMode::Process];
        let mode_idx = Select::new()
            .with_prompt("  Worker isolation")
            .items(&modes.iter().map(WorkerMode::as_str).collect::<Vec<_>>())
            .default(0)
            .interact()
            .map_err(|e| EcoWoodError::Config(format!("Input error: {}", e)))?;

        let timeout_ms: u64 = Input::new()
            .with_prompt("  Evaluation timeout (ms)")
            .default(default_timeout_ms())
            .interact_text()
            .map_err(|e| EcoWoodError::Config(format!("Input error: {}", e)))?;

        println!();

        let config = Config {
            engine: EngineConfig {
                profit_margin,
                ..EngineConfig::default()
            },
            host: HostConfig {
                mode: modes[mode_idx],
                timeout_ms,
                worker_program: None,
            },
            storage: StorageConfig::default(),
        };
        config.validate()?;

        let config_path = Self::default_config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(&config)?;
        let content = format!(
            "# EcoWood Configuration\n# Generated by `ecowood init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(&config_path, content)?;

        println!("Configuration saved to {}", config_path.display());
        println!();

        Ok((config, config_path))
    }

    fn substitute_env_vars(content: &str) -> Result<String> {
        let mut result = content.to_string();

        let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| EcoWoodError::Config(format!("Invalid substitution pattern: {}", e)))?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        Ok(result)
    }

    pub fn data_dir(&self, data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        // CLI override takes priority
        if let Some(dir) = data_dir_override {
            std::fs::create_dir_all(dir)?;
            return Ok(dir.clone());
        }

        if let Ok(dir) = std::env::var("ECOWOOD_DATA_DIR") {
            let p = PathBuf::from(dir);
            std::fs::create_dir_all(&p)?;
            return Ok(p);
        }

        if let Some(dir) = &self.storage.data_dir {
            std::fs::create_dir_all(dir)?;
            return Ok(dir.clone());
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| EcoWoodError::Config("Cannot determine data directory".into()))?
            .join("ecowood");

        std::fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }

    pub fn db_path(&self, data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        Ok(self.data_dir(data_dir_override)?.join("ecowood.db"))
    }
}
