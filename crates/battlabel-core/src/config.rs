use crate::error::ConfigError;
use crate::types::AcceptanceWindow;
use crate::validate::ValidationPolicy;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub label: LabelConfig,

    #[serde(default)]
    pub printer: Vec<PrinterRouteConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    /// Port to open at startup. Left unset, the operator picks one in the TUI.
    #[serde(default)]
    pub port: Option<String>,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    #[serde(default = "default_frame_timeout_ms")]
    pub frame_timeout_ms: u64,
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
            frame_timeout_ms: default_frame_timeout_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ValidationConfig {
    #[serde(default = "default_min_voltage")]
    pub min_voltage: i32,

    #[serde(default = "default_max_voltage")]
    pub max_voltage: i32,

    /// Selectable product types. Empty means no product selector is shown.
    #[serde(default)]
    pub product_types: Vec<String>,
}

impl ValidationConfig {
    pub fn policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            default_window: AcceptanceWindow {
                min_voltage: self.min_voltage,
                max_voltage: self.max_voltage,
            },
            require_product_type: !self.product_types.is_empty(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_voltage: default_min_voltage(),
            max_voltage: default_max_voltage(),
            product_types: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum QrFormat {
    /// `<identifier>+<lot>`
    #[default]
    Joined,
    /// The full multi-line label description.
    Block,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LabelConfig {
    /// Product-family prefix removed from product names on the label.
    #[serde(default)]
    pub product_prefix: String,

    #[serde(default = "default_qr_size")]
    pub qr_size: u32,

    #[serde(default)]
    pub qr_format: QrFormat,

    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            product_prefix: String::new(),
            qr_size: default_qr_size(),
            qr_format: QrFormat::default(),
            date_format: default_date_format(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PrinterRouteConfig {
    pub plugin: String,

    #[serde(flatten)]
    pub extra: toml::Value,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_read_timeout_ms() -> u64 {
    200
}

fn default_frame_timeout_ms() -> u64 {
    1000
}

fn default_min_voltage() -> i32 {
    AcceptanceWindow::DEFAULT_MIN_VOLTAGE
}

fn default_max_voltage() -> i32 {
    AcceptanceWindow::DEFAULT_MAX_VOLTAGE
}

/// Module count of the smallest QR symbol.
pub const MIN_QR_SIZE: u32 = 21;

fn default_qr_size() -> u32 {
    200
}

fn default_date_format() -> String {
    "%m/%d/%y".to_string()
}

/// Interpolate `${VAR}` patterns with environment variable values.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::Invalid(e.to_string()))?;
    let mut result = input.to_string();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let val = std::env::var(var_name)
            .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
        result = result.replace(&cap[0], &val);
    }

    Ok(result)
}

impl AppConfig {
    /// Load configuration from a TOML file, with environment variable interpolation.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let interpolated = interpolate_env_vars(s)?;
        let config: AppConfig = toml::from_str(&interpolated)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.validation.min_voltage >= self.validation.max_voltage {
            return Err(ConfigError::Invalid(format!(
                "validation.min_voltage ({}) must be below validation.max_voltage ({})",
                self.validation.min_voltage, self.validation.max_voltage
            )));
        }
        if self.serial.frame_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "serial.frame_timeout_ms must be positive".to_string(),
            ));
        }
        if self.label.qr_size < MIN_QR_SIZE {
            return Err(ConfigError::Invalid(format!(
                "label.qr_size ({}) must be at least {} px",
                self.label.qr_size, MIN_QR_SIZE
            )));
        }
        Ok(())
    }
}
