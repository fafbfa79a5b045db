//! Configuration (spec §6 "Configuration"), grounded in `assay-core`'s
//! `serde`+`toml` config loading pattern. Flat key-value under `[global]`
//! plus plug-in-scoped sections, mirroring the original's
//! `ConfigParser`-via-ini shape translated into typed TOML.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, ShieldError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMethod {
    Queue,
    Csv,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DashboardContent {
    Hspl,
    Mspl,
    #[serde(other)]
    Both,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalConfig {
    #[serde(rename = "watchedDirectory")]
    pub watched_directory: Option<PathBuf>,
    #[serde(rename = "landscapeFile")]
    pub landscape_file: PathBuf,
    #[serde(rename = "recipeDirectory")]
    pub recipe_directory: PathBuf,
    #[serde(rename = "inputMethod", default = "default_input_method")]
    pub input_method: InputMethod,

    #[serde(rename = "serverAddress")]
    pub server_address: Option<String>,
    #[serde(rename = "serverPort")]
    pub server_port: Option<u16>,
    #[serde(rename = "serverExchange")]
    pub server_exchange: Option<String>,
    #[serde(rename = "serverQueue")]
    pub server_queue: Option<String>,
    #[serde(rename = "serverTopic")]
    pub server_topic: Option<String>,

    #[serde(rename = "dashboardHost")]
    pub dashboard_host: Option<String>,
    #[serde(rename = "dashboardPort")]
    pub dashboard_port: Option<u16>,
    #[serde(rename = "dashboardExchange")]
    pub dashboard_exchange: Option<String>,
    #[serde(rename = "dashboardTopic")]
    pub dashboard_topic: Option<String>,
    #[serde(rename = "dashboardContent", default = "default_dashboard_content")]
    pub dashboard_content: DashboardContent,
    #[serde(rename = "dashboardAttempts", default = "default_dashboard_attempts")]
    pub dashboard_attempts: u32,
    #[serde(rename = "dashboardRetryDelay", default = "default_dashboard_retry_delay")]
    pub dashboard_retry_delay_ms: u64,

    #[serde(rename = "hsplsFile")]
    pub hspls_file: Option<PathBuf>,
    #[serde(rename = "msplsFile")]
    pub mspls_file: Option<PathBuf>,
    #[serde(rename = "dashboardFile")]
    pub dashboard_file: Option<PathBuf>,

    #[serde(rename = "hsplMergeInclusions", default = "default_true")]
    pub hspl_merge_inclusions: bool,
    #[serde(rename = "hsplMergeWithAnyPorts", default = "default_true")]
    pub hspl_merge_with_any_ports: bool,
    #[serde(rename = "hsplMergeWithSubnets", default = "default_true")]
    pub hspl_merge_with_subnets: bool,
    #[serde(rename = "hsplMergingThreshold", default = "default_merging_threshold")]
    pub hspl_merging_threshold: usize,
    #[serde(rename = "hsplMergingMinBits", default = "default_merging_min_bits")]
    pub hspl_merging_min_bits: u8,
    #[serde(rename = "hsplMergingMaxBits", default = "default_merging_max_bits")]
    pub hspl_merging_max_bits: u8,
}

fn default_input_method() -> InputMethod {
    InputMethod::All
}
fn default_dashboard_content() -> DashboardContent {
    DashboardContent::Both
}
fn default_dashboard_attempts() -> u32 {
    3
}
fn default_dashboard_retry_delay() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}
fn default_merging_threshold() -> usize {
    32
}
fn default_merging_min_bits() -> u8 {
    2
}
fn default_merging_max_bits() -> u8 {
    8
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitConfig {
    #[serde(rename = "maxConnections")]
    pub max_connections: Option<u32>,
    #[serde(rename = "rateLimit")]
    pub rate_limit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VnsfoConfig {
    #[serde(rename = "enable_vnsfo_api_call", default)]
    pub enabled: bool,
    pub vnsfo_base_url: Option<String>,
    #[serde(default = "default_vnsfo_timeout")]
    pub vnsfo_timeout: u64,
}

fn default_vnsfo_timeout() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub global: GlobalConfig,
    #[serde(default)]
    pub limit: LimitConfig,
    #[serde(default)]
    pub vnsfo: VnsfoConfig,
}

impl Config {
    pub fn from_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(ShieldError::from)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_str(&text)
    }

    pub fn optimize_config(&self) -> shield_policy::OptimizeConfig {
        shield_policy::OptimizeConfig {
            merging_threshold: self.global.hspl_merging_threshold,
            merging_min_bits: self.global.hspl_merging_min_bits,
            merging_max_bits: self.global.hspl_merging_max_bits,
        }
    }
}
