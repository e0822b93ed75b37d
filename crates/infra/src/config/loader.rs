//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If a required variable is missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `GOLDFISH_DB_PATH`: Database file path (required)
//! - `CANVAS_BASE_URL`: Canvas institution root (required)
//! - `GOLDFISH_DB_POOL_SIZE`: Connection pool size
//! - `GOLDFISH_HOST` / `PORT`: Listener address
//! - `GOLDFISH_ALLOWED_ORIGINS`: Extra CORS origins, comma-separated
//! - `CANVAS_API_TOKEN`: Server-side fallback Canvas token
//! - `GOLDFISH_CLASSROOM_BASE_URL`: Google Classroom API root
//! - `GOLDFISH_PORTAL_BASE_URL` / `GOLDFISH_PORTAL_SERVICE`: Moodle portal
//! - `GOLDFISH_CANVAS_UPCOMING_DAYS`: Window for upcoming Canvas assignments
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.{json,toml}` or `./goldfish.{json,toml}` (current directory)
//! 2. `../config.{json,toml}` and `../../config.{json,toml}`
//! 3. The same names relative to the executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use goldfish_domain::constants::{
    DEFAULT_CLASSROOM_BASE_URL, DEFAULT_HOST, DEFAULT_POOL_SIZE, DEFAULT_PORT,
    DEFAULT_PORTAL_BASE_URL, DEFAULT_PORTAL_SERVICE, DEFAULT_UPCOMING_WINDOW_DAYS,
};
use goldfish_domain::{
    CanvasConfig, ClassroomConfig, Config, DatabaseConfig, GoldfishError, PortalConfig, Result,
    ServerConfig, SyncConfig,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `GoldfishError::Config` if configuration cannot be loaded from
/// either source, the file format is invalid, or required fields are missing.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `GoldfishError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("GOLDFISH_DB_PATH")?;
    let canvas_base_url = env_var("CANVAS_BASE_URL")?;

    let pool_size = env_parse("GOLDFISH_DB_POOL_SIZE", DEFAULT_POOL_SIZE)?;
    let port = env_parse("PORT", DEFAULT_PORT)?;
    let upcoming_window_days =
        env_parse("GOLDFISH_CANVAS_UPCOMING_DAYS", DEFAULT_UPCOMING_WINDOW_DAYS)?;
    if upcoming_window_days < 0 {
        return Err(GoldfishError::Config(
            "GOLDFISH_CANVAS_UPCOMING_DAYS must not be negative".to_string(),
        ));
    }

    Ok(Config {
        database: DatabaseConfig { path: db_path, pool_size },
        server: ServerConfig {
            host: env_or("GOLDFISH_HOST", DEFAULT_HOST),
            port,
            allowed_origins: env_list("GOLDFISH_ALLOWED_ORIGINS"),
        },
        canvas: CanvasConfig {
            base_url: trim_base_url(&canvas_base_url),
            api_token: env_optional("CANVAS_API_TOKEN"),
        },
        classroom: ClassroomConfig {
            base_url: trim_base_url(&env_or(
                "GOLDFISH_CLASSROOM_BASE_URL",
                DEFAULT_CLASSROOM_BASE_URL,
            )),
        },
        portal: PortalConfig {
            base_url: trim_base_url(&env_or("GOLDFISH_PORTAL_BASE_URL", DEFAULT_PORTAL_BASE_URL)),
            service: env_or("GOLDFISH_PORTAL_SERVICE", DEFAULT_PORTAL_SERVICE),
        },
        sync: SyncConfig { upcoming_window_days },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `GoldfishError::Config` if the file is missing, no file is
/// found, the format is invalid or required fields are missing.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(GoldfishError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            GoldfishError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| GoldfishError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, detecting the format by the
/// file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| GoldfishError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| GoldfishError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(GoldfishError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a configuration file.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 8] = [
        "config.json",
        "config.toml",
        "goldfish.json",
        "goldfish.toml",
        "../config.json",
        "../config.toml",
        "../../config.json",
        "../../config.toml",
    ];

    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    env_optional(key).ok_or_else(|| {
        GoldfishError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Non-blank environment variable, if set.
fn env_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_optional(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| GoldfishError::Config(format!("Invalid value for {key}: {e}"))),
        None => Ok(default),
    }
}

/// Comma-separated list; blank entries are dropped.
fn env_list(key: &str) -> Vec<String> {
    env_optional(key)
        .map(|raw| {
            raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
        })
        .unwrap_or_default()
}

fn trim_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
