//! Runtime settings
//!
//! Layered as: built-in defaults, then an optional TOML file, then `FIXBOT_*`
//! environment variables.

use std::path::{Path, PathBuf};

use ::config::{Config, Environment, File as ConfigFile};
use serde::Deserialize;

use crate::error::Result;
use crate::index::IdfWeighting;
use crate::matcher::DEFAULT_THRESHOLD;

pub const DEFAULT_CONFIG_FILE: &str = "fixbot.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind: String,
    pub dataset_path: PathBuf,
    pub model_path: PathBuf,
    pub database_path: PathBuf,
    pub threshold: f32,
    pub weighting: IdfWeighting,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            bind: "127.0.0.1:5000".to_string(),
            dataset_path: PathBuf::from("dataset/computer_problems_solutions.csv"),
            model_path: PathBuf::from("model/chatbot_model.bin"),
            database_path: PathBuf::from("users.db"),
            threshold: DEFAULT_THRESHOLD,
            weighting: IdfWeighting::Standard,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings, reading `file` if it exists.
    pub fn load(file: Option<&Path>) -> Result<Settings> {
        let defaults = Settings::default();
        let path = file.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

        let config = Config::builder()
            .set_default("bind", defaults.bind)?
            .set_default("dataset_path", defaults.dataset_path.to_string_lossy().to_string())?
            .set_default("model_path", defaults.model_path.to_string_lossy().to_string())?
            .set_default("database_path", defaults.database_path.to_string_lossy().to_string())?
            .set_default("threshold", defaults.threshold as f64)?
            .set_default("weighting", "standard")?
            .set_default("log_level", defaults.log_level)?
            .add_source(ConfigFile::from(path).required(false))
            .add_source(Environment::with_prefix("FIXBOT"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
