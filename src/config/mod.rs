// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::watermark::loader::CacheConfig;
use crate::watermark::options::{RequestDefaults, DEFAULT_FONT_SIZE, DEFAULT_MAX_SIZE, DEFAULT_QUALITY};
use crate::watermark::position::AnchorStrategy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerConfig {
    /// Directory persisted output images are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Root for `assets/...` and `asset://...` sources
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,

    /// Directory searched for .ttf/.otf files; no fonts are loaded when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fonts_dir: Option<PathBuf>,

    #[serde(default = "default_font_search_depth")]
    pub font_search_depth: usize,

    /// Family used when a text style names none (or an unknown one)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_font: Option<String>,

    /// Distance kept between anchored elements and the canvas edge
    #[serde(default = "default_margin")]
    pub margin: f32,

    #[serde(default)]
    pub anchor_strategy: AnchorStrategy,

    #[serde(default = "default_font_size")]
    pub default_font_size: f32,

    #[serde(default = "default_quality")]
    pub default_quality: u8,

    /// Longest edge of the background after preparation
    #[serde(default = "default_max_size")]
    pub default_max_size: u32,

    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    #[serde(default)]
    pub resource_cache: ResourceCacheConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}

fn default_font_search_depth() -> usize {
    3
}

fn default_margin() -> f32 {
    20.0
}

fn default_font_size() -> f32 {
    DEFAULT_FONT_SIZE
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

fn default_max_size() -> u32 {
    DEFAULT_MAX_SIZE
}

fn default_http_timeout_secs() -> u64 {
    30
}

/// In-memory cache for remote and bundled resources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceCacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    #[serde(default = "default_cache_max_entries")]
    pub max_entries: u64,

    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_max_entries() -> u64 {
    100
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

impl Default for ResourceCacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            max_entries: default_cache_max_entries(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl ResourceCacheConfig {
    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig {
            max_entries: self.max_entries,
            ttl: Duration::from_secs(self.ttl_secs),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,

    /// Default filter directive; `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_log_level(),
        }
    }
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            assets_dir: default_assets_dir(),
            fonts_dir: None,
            font_search_depth: default_font_search_depth(),
            default_font: None,
            margin: default_margin(),
            anchor_strategy: AnchorStrategy::default(),
            default_font_size: default_font_size(),
            default_quality: default_quality(),
            default_max_size: default_max_size(),
            http_timeout_secs: default_http_timeout_secs(),
            resource_cache: ResourceCacheConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl MarkerConfig {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        let mut missing = None;
        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    missing.get_or_insert_with(|| var_name.to_string());
                    String::new()
                }
            }
        });

        if let Some(var_name) = missing {
            return Err(format!(
                "Environment variable '{}' is referenced but not set",
                var_name
            ));
        }

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.output_dir.as_os_str().is_empty() {
            return Err("output_dir cannot be empty".to_string());
        }

        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(format!("margin must be >= 0, got {}", self.margin));
        }

        if !self.default_font_size.is_finite() || self.default_font_size <= 0.0 {
            return Err(format!(
                "default_font_size must be > 0, got {}",
                self.default_font_size
            ));
        }

        if self.default_quality > 100 {
            return Err(format!(
                "default_quality must be between 0 and 100, got {}",
                self.default_quality
            ));
        }

        if self.default_max_size == 0 {
            return Err("default_max_size must be > 0".to_string());
        }

        if self.http_timeout_secs == 0 {
            return Err("http_timeout_secs must be > 0".to_string());
        }

        if self.resource_cache.enabled && self.resource_cache.max_entries == 0 {
            return Err("resource_cache.max_entries must be > 0 when the cache is enabled".to_string());
        }

        if let Some(dir) = &self.fonts_dir {
            if !dir.is_dir() {
                return Err(format!("fonts_dir '{}' is not a directory", dir.display()));
            }
        }

        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn request_defaults(&self) -> RequestDefaults {
        RequestDefaults {
            font_size: self.default_font_size,
            quality: self.default_quality,
            max_size: self.default_max_size,
        }
    }
}
