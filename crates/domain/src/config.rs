//! Application configuration structures

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CLASSROOM_BASE_URL, DEFAULT_HOST, DEFAULT_POOL_SIZE, DEFAULT_PORT,
    DEFAULT_PORTAL_BASE_URL, DEFAULT_PORTAL_SERVICE, DEFAULT_UPCOMING_WINDOW_DAYS,
};

/// Top-level application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub classroom: ClassroomConfig,
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// SQLite storage settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed in addition to the local dev server and `*.vercel.app`.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), allowed_origins: Vec::new() }
    }
}

/// Canvas LMS settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Institution root, e.g. `https://canvas.example.edu`.
    pub base_url: String,
    /// Server-side fallback token used when a proxy request carries none.
    #[serde(default)]
    pub api_token: Option<String>,
}

/// Google Classroom settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassroomConfig {
    #[serde(default = "default_classroom_base_url")]
    pub base_url: String,
}

impl Default for ClassroomConfig {
    fn default() -> Self {
        Self { base_url: default_classroom_base_url() }
    }
}

/// Moodle portal settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default = "default_portal_base_url")]
    pub base_url: String,
    #[serde(default = "default_portal_service")]
    pub service: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self { base_url: default_portal_base_url(), service: default_portal_service() }
    }
}

/// Sync behaviour settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_upcoming_window_days")]
    pub upcoming_window_days: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { upcoming_window_days: default_upcoming_window_days() }
    }
}

fn default_pool_size() -> u32 {
    DEFAULT_POOL_SIZE
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_classroom_base_url() -> String {
    DEFAULT_CLASSROOM_BASE_URL.to_string()
}

fn default_portal_base_url() -> String {
    DEFAULT_PORTAL_BASE_URL.to_string()
}

fn default_portal_service() -> String {
    DEFAULT_PORTAL_SERVICE.to_string()
}

fn default_upcoming_window_days() -> i64 {
    DEFAULT_UPCOMING_WINDOW_DAYS
}
