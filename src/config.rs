//! Configuration management for gridscale.
//!
//! This module handles the layered configuration system with the following precedence:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables
//! 3. JSON config file
//! 4. Default values (lowest priority)

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{GridscaleError, Result};
use crate::grid::MAX_LEVEL;

/// Command-line arguments for gridscale
#[derive(Parser, Debug)]
#[command(name = "gridscale")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the parquet file with the coarse cell values
    #[arg(env = "PARQUET_PATH")]
    pub data_file: PathBuf,

    /// Host address to bind to [default: 127.0.0.1]
    #[arg(short = 'H', long, env = "GRIDSCALE_HOST")]
    pub host: Option<String>,

    /// Port to listen on [default: 8000]
    #[arg(short, long, env = "GRIDSCALE_PORT")]
    pub port: Option<u16>,

    /// Number of worker threads
    #[arg(short, long, env = "GRIDSCALE_WORKERS")]
    pub workers: Option<usize>,

    /// Path to JSON configuration file
    #[arg(short, long, env = "GRIDSCALE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error) [default: info]
    #[arg(long, env = "GRIDSCALE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// IDW power parameter
    #[arg(long, env = "IDW_POWER")]
    pub idw_power: Option<f64>,

    /// Number of neighbours used per estimate
    #[arg(long, env = "IDW_NEIGHBORS")]
    pub neighbors: Option<usize>,

    /// Estimation method (idw, nearest)
    #[arg(long, env = "GRIDSCALE_METHOD")]
    pub method: Option<String>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads (None = number of CPU cores)
    #[serde(default)]
    pub workers: Option<usize>,
}

/// Dataset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the parquet file
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Column holding the cell identifier
    #[serde(default = "default_gid_column")]
    pub gid_column: String,

    /// Column holding the measured value
    #[serde(default = "default_value_column")]
    pub value_column: String,
}

/// Interpolation parameters. Fixed for the lifetime of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpolationConfig {
    /// Estimation method (idw or nearest)
    #[serde(default = "default_method")]
    pub method: String,

    /// IDW power; 2.0 is inverse-square weighting
    #[serde(default = "default_power")]
    pub power: f64,

    /// Neighbours fetched per query (8 surrounding cells + center)
    #[serde(default = "default_neighbors")]
    pub neighbors: usize,

    /// Level of the stored cells
    #[serde(default = "default_source_level")]
    pub source_level: u8,

    /// Level of the interpolated cells
    #[serde(default = "default_target_level")]
    pub target_level: u8,

    /// Below this distance the nearest cell's value is returned verbatim
    #[serde(default = "default_direct_hit")]
    pub direct_hit_distance_m: f64,

    /// Decimal places of estimated values
    #[serde(default = "default_precision")]
    pub precision: u32,
}

/// Complete configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Data configuration
    #[serde(default)]
    pub data: DataConfig,

    /// Interpolation configuration
    #[serde(default)]
    pub interpolation: InterpolationConfig,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with proper precedence
    pub fn load() -> Result<(Self, PathBuf)> {
        Self::from_args(Args::parse())
    }

    /// Build the configuration from already parsed arguments
    pub fn from_args(args: Args) -> Result<(Self, PathBuf)> {
        let mut config = Config::default();

        if let Some(config_path) = &args.config {
            let json_config = Self::load_from_file(config_path)?;
            config.merge(json_config);
        }

        if let Some(host) = args.host {
            config.server.host = host;
        }
        if let Some(port) = args.port {
            config.server.port = port;
        }
        if args.workers.is_some() {
            config.server.workers = args.workers;
        }
        if let Some(log_level) = args.log_level {
            config.log_level = log_level;
        }

        if let Some(power) = args.idw_power {
            config.interpolation.power = power;
        }
        if let Some(neighbors) = args.neighbors {
            config.interpolation.neighbors = neighbors;
        }
        if let Some(method) = args.method {
            config.interpolation.method = method;
        }

        // The positional path wins over the one in the JSON file
        let data_path = args.data_file;
        config.data.file_path = Some(data_path.clone());

        Ok((config, data_path))
    }

    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        self.server.host = other.server.host;
        self.server.port = other.server.port;
        if other.server.workers.is_some() {
            self.server.workers = other.server.workers;
        }
        self.data = other.data;
        self.interpolation = other.interpolation;
        self.log_level = other.log_level;
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(config_error("Server host cannot be empty"));
        }

        // 0 is not a valid port for users
        if self.server.port == 0 {
            return Err(config_error("Server port cannot be 0"));
        }

        if self.server.workers == Some(0) {
            return Err(config_error("Worker count cannot be 0"));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(config_error(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.log_level
                )));
            }
        }

        if self.data.gid_column.is_empty() || self.data.value_column.is_empty() {
            return Err(config_error("Data column names cannot be empty"));
        }

        self.interpolation.validate()
    }
}

impl InterpolationConfig {
    /// Validate the interpolation parameters
    pub fn validate(&self) -> Result<()> {
        match self.method.as_str() {
            "idw" | "nearest" => {}
            _ => {
                return Err(config_error(format!(
                    "Invalid interpolation method: {}. Must be one of: idw, nearest",
                    self.method
                )));
            }
        }

        if !self.power.is_finite() || self.power <= 0.0 {
            return Err(config_error(format!(
                "IDW power must be a positive number, got {}",
                self.power
            )));
        }

        if self.neighbors == 0 {
            return Err(config_error("Neighbour count must be at least 1"));
        }

        for (name, level) in [
            ("source_level", self.source_level),
            ("target_level", self.target_level),
        ] {
            if level == 0 || level > MAX_LEVEL {
                return Err(config_error(format!(
                    "{} must be between 1 and {}, got {}",
                    name, MAX_LEVEL, level
                )));
            }
        }

        if self.source_level == self.target_level {
            return Err(config_error("source_level and target_level must differ"));
        }

        if !self.direct_hit_distance_m.is_finite() || self.direct_hit_distance_m <= 0.0 {
            return Err(config_error(format!(
                "Direct hit distance must be positive, got {}",
                self.direct_hit_distance_m
            )));
        }

        if self.precision > 12 {
            return Err(config_error(format!(
                "Precision must be at most 12 decimal places, got {}",
                self.precision
            )));
        }

        Ok(())
    }
}

fn config_error(message: impl Into<String>) -> GridscaleError {
    GridscaleError::Config {
        message: message.into(),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            data: DataConfig::default(),
            interpolation: InterpolationConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            file_path: None,
            gid_column: default_gid_column(),
            value_column: default_value_column(),
        }
    }
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            method: default_method(),
            power: default_power(),
            neighbors: default_neighbors(),
            source_level: default_source_level(),
            target_level: default_target_level(),
            direct_hit_distance_m: default_direct_hit(),
            precision: default_precision(),
        }
    }
}

// Default value functions for serde
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_gid_column() -> String {
    "gid".to_string()
}

fn default_value_column() -> String {
    "value".to_string()
}

fn default_method() -> String {
    "idw".to_string()
}

fn default_power() -> f64 {
    2.0
}

fn default_neighbors() -> usize {
    9
}

fn default_source_level() -> u8 {
    12
}

fn default_target_level() -> u8 {
    14
}

fn default_direct_hit() -> f64 {
    1.0
}

fn default_precision() -> u32 {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}
