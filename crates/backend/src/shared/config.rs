use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub marketplace_api: MarketplaceApiConfig,
    #[serde(default)]
    pub order_import: OrderImportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    /// Cron-выражение с секундами: "sec min hour day month weekday"
    #[serde(default = "default_import_orders_cron")]
    pub import_orders_cron: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            import_orders_cron: default_import_orders_cron(),
        }
    }
}

fn default_import_orders_cron() -> String {
    "0 */5 * * * *".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Каталог для backend.log; по умолчанию "logs" рядом с исполняемым файлом
    pub dir: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarketplaceApiConfig {
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_timeout")]
    pub timeout_seconds: u64,
}

impl Default for MarketplaceApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            timeout_seconds: default_api_timeout(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://submit.effectconnect.com".to_string()
}

fn default_api_timeout() -> u64 {
    30
}

/// Настройки импорта заказов уровня платформы
#[derive(Debug, Deserialize, Clone, Default)]
pub struct OrderImportConfig {
    #[serde(default)]
    pub defaults: OrderImportDefaults,
    /// Переопределения для отдельных витрин
    #[serde(default)]
    pub stores: Vec<StoreOrderImportConfig>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct OrderImportDefaults {
    #[serde(default)]
    pub customer_create: bool,
    #[serde(default)]
    pub customer_group_id: u32,
    #[serde(default)]
    pub send_emails: bool,
    #[serde(default)]
    pub shipping_method: String,
    #[serde(default)]
    pub payment_method: String,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct StoreOrderImportConfig {
    pub storeview_id: u32,
    pub customer_create: Option<bool>,
    pub customer_group_id: Option<u32>,
    pub send_emails: Option<bool>,
    pub shipping_method: Option<String>,
    pub payment_method: Option<String>,
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[database]
path = "target/db/app.db"

[scheduler]
import_orders_cron = "0 */5 * * * *"

[order_import.defaults]
customer_create = false
customer_group_id = 1
send_emails = false
shipping_method = "flatrate_flatrate"
payment_method = "checkmo"
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
///
/// Runs before tracing is initialized, so progress goes to stdout.
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                println!("✓ Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                return parse_config(&contents);
            } else {
                println!("ℹ config.toml not found at: {}", config_path.display());
            }
        }
    }

    println!("ℹ Using default embedded configuration");
    parse_config(DEFAULT_CONFIG)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(contents)?;
    Ok(config)
}

/// Resolve a configured path relative to the executable directory
fn resolve_relative_to_exe(path_str: &str) -> PathBuf {
    let path = Path::new(path_str);
    if path.is_absolute() {
        return path.to_path_buf();
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return exe_dir.join(path);
        }
    }

    PathBuf::from(path_str)
}

/// Get the database file path from configuration
pub fn get_database_path(config: &Config) -> anyhow::Result<PathBuf> {
    Ok(resolve_relative_to_exe(&config.database.path))
}

/// Каталог логов: из конфигурации или "logs" рядом с исполняемым файлом
pub fn get_log_dir(config: &Config) -> PathBuf {
    resolve_relative_to_exe(config.logging.dir.as_deref().unwrap_or("logs"))
}
