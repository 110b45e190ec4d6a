use anyhow::Context as _;
use saf_devices::{Ccd, Focuser, SimulatorConfig, simulated::SimulatedDevice};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found at {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read configuration file: {source}")]
    ReadError { source: std::io::Error },

    #[error("Failed to parse configuration: {source}")]
    ParseError { source: toml::de::Error },

    #[error("Failed to serialize configuration: {source}")]
    SerializeError { source: toml::ser::Error },

    #[error("Failed to write configuration file: {source}")]
    WriteError { source: std::io::Error },

    #[error("Configuration validation failed: {message}")]
    ValidationError { message: String },
}

#[derive(Deserialize, Debug, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Used when `RUST_LOG` is not set.
    pub level: String,
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "saf_check.log".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SafConfig {
    /// Filter names that mark a wheel slot without glass.
    pub empty_slot_names: Vec<String>,
    pub focus_default_target: Option<i64>,

    pub logging: LoggingConfig,
    pub focuser: Focuser,
    pub ccd: Ccd,
    pub simulator: SimulatorConfig,
}

impl Default for SafConfig {
    fn default() -> Self {
        let focuser = Focuser::default();
        let ccd = Ccd::default();

        let focuser_device = SimulatedDevice {
            name: focuser.name.clone(),
            properties: BTreeMap::from([
                ("FOC_DEF".to_string(), 0.into()),
                ("foc_min".to_string(), focuser.abs_lower_limit.into()),
                ("foc_max".to_string(), focuser.abs_upper_limit.into()),
            ]),
        };
        let camera_device = SimulatedDevice {
            name: ccd.name.clone(),
            properties: BTreeMap::new(),
        };

        Self {
            empty_slot_names: vec!["empty8".to_string(), "open".to_string()],
            focus_default_target: None,
            logging: LoggingConfig::default(),
            focuser,
            ccd,
            simulator: SimulatorConfig {
                devices: vec![focuser_device, camera_device],
                write_lag_refreshes: 2,
            },
        }
    }
}

impl SafConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::ValidationError { message });
        let focuser = &self.focuser;

        if focuser.name.is_empty() {
            return invalid("focuser name is empty".to_string());
        }
        if self.ccd.name.is_empty() {
            return invalid("ccd name is empty".to_string());
        }
        if focuser.resolution.is_nan() || focuser.resolution <= 0.0 {
            return invalid(format!(
                "focuser {} resolution must be positive, got {}",
                focuser.name, focuser.resolution
            ));
        }
        if focuser.abs_lower_limit > focuser.abs_upper_limit {
            return invalid(format!(
                "focuser {} absolute limits are inverted: {} > {}",
                focuser.name, focuser.abs_lower_limit, focuser.abs_upper_limit
            ));
        }
        if focuser.lower_limit > focuser.upper_limit {
            return invalid(format!(
                "focuser {} limits are inverted: {} > {}",
                focuser.name, focuser.lower_limit, focuser.upper_limit
            ));
        }
        if focuser.settle.max_polls == 0 {
            return invalid(format!("focuser {} settle.max_polls is zero", focuser.name));
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct ConfigOptions {
    pub config_path: PathBuf,
    pub create_if_missing: bool,
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self {
            config_path: Self::default_config_path(),
            create_if_missing: true,
        }
    }
}

impl ConfigOptions {
    pub fn default_config_path() -> PathBuf {
        std::env::var("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("default_config.toml"))
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }
}

#[derive(Debug)]
pub struct ConfigManager {
    options: ConfigOptions,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            options: ConfigOptions::default(),
        }
    }

    pub fn with_options(options: ConfigOptions) -> Self {
        Self { options }
    }

    pub fn load(&self) -> anyhow::Result<SafConfig> {
        let config_path = &self.options.config_path;

        if !config_path.exists() {
            if self.options.create_if_missing {
                let default_config = SafConfig::default();
                self.save(&default_config)
                    .context("Failed to save default config")?;
                return Ok(default_config);
            } else {
                return Err(ConfigError::FileNotFound {
                    path: config_path.clone(),
                }
                .into());
            }
        }

        let content =
            fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError { source: e })?;

        let config: SafConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError { source: e })?;
        config.validate()?;

        Ok(config)
    }

    pub fn save(&self, config: &SafConfig) -> anyhow::Result<()> {
        let config_path = &self.options.config_path;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError { source: e })?;
        }

        let content = toml::to_string_pretty(config)
            .map_err(|e| ConfigError::SerializeError { source: e })?;

        fs::write(config_path, content).map_err(|e| ConfigError::WriteError { source: e })?;

        Ok(())
    }
}

pub fn init_config() -> anyhow::Result<(ConfigManager, SafConfig)> {
    let manager = ConfigManager::new();
    let config = manager.load()?;
    Ok((manager, config))
}

pub fn create_default_config<P: AsRef<Path>>(path: Option<P>) -> anyhow::Result<()> {
    let config_path = path
        .map(|p| p.as_ref().to_path_buf())
        .unwrap_or_else(ConfigOptions::default_config_path);

    let manager = ConfigManager::with_options(ConfigOptions {
        config_path,
        create_if_missing: true,
    });
    manager.save(&SafConfig::default())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use saf_devices::WheelDevice;

    use super::*;

    #[test]
    fn default_config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("saf.toml");

        create_default_config(Some(&path)).unwrap();
        let manager = ConfigManager::with_options(ConfigOptions {
            config_path: path,
            create_if_missing: false,
        });

        assert_eq!(manager.load().unwrap(), SafConfig::default());
    }

    #[test]
    fn missing_file_is_created_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saf.toml");

        let config = ConfigManager::with_options(ConfigOptions::with_path(&path))
            .load()
            .unwrap();

        assert!(path.exists());
        assert_eq!(config.focuser.name, "F0");
    }

    #[test]
    fn missing_file_without_create_fails() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_options(ConfigOptions {
            config_path: dir.path().join("absent.toml"),
            create_if_missing: false,
        });

        let error = manager.load().unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ConfigError>(),
            Some(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    fn parses_hand_written_config() {
        let config: SafConfig = toml::from_str(
            r#"
            empty_slot_names = ["open"]
            focus_default_target = 3500

            [focuser]
            name = "F1"
            resolution = 5.0
            abs_lower_limit = 0
            abs_upper_limit = 7000
            settle = { max_polls = 20 }

            [ccd]
            name = "andor"
            base_exposure = 5.0

            [[ccd.filter_wheels]]
            name = "FAKE_FTW"

            [[ccd.filter_wheels]]
            name = "COLWFLT"
            ccd_filter_offsets = [0, 15]

            [[ccd.filter_wheels.filters]]
            name = "R"
            relative_lower_limit = -200
            relative_upper_limit = 200
            step_size = 25
            exposure_factor = 2.0
            "#,
        )
        .unwrap();

        config.validate().unwrap();
        assert_eq!(config.focus_default_target, Some(3500));
        assert_eq!(config.focuser.settle.max_polls, 20);
        assert_eq!(config.focuser.settle.poll_interval_ms, 10);
        assert_eq!(config.ccd.filter_wheels[0].device, WheelDevice::Absent);
        assert_eq!(config.ccd.filter_wheels[1].name(), "COLWFLT");
        assert_eq!(config.ccd.filter_wheels[1].filters[0].steps().len(), 17);
        assert_eq!(config.ccd.window(), None);
    }

    #[test]
    fn rejects_inverted_limits() {
        let mut config = SafConfig::default();
        config.focuser.abs_lower_limit = 10;
        config.focuser.abs_upper_limit = -10;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn rejects_non_positive_resolution() {
        let mut config = SafConfig::default();
        config.focuser.resolution = 0.0;
        assert!(config.validate().is_err());

        config.focuser.resolution = f64::NAN;
        assert!(config.validate().is_err());
    }
}
