use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sled_path: String,
    pub backup_dir: String,
    pub backup_name_template: String,
    pub backup_retention: usize,
    pub logging: LoggingConfig,
    /// Print generated passcodes, standing in for email/SMS delivery.
    pub otp_echo: bool,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub file_enabled: bool,
    pub file_path: Option<String>,
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "on" | "yes" => Some(true),
            "0" | "false" | "off" | "no" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

pub fn load_config_from_file(config_path: &str) -> AppConfig {
    // Load .env file if it exists
    let abs_config_path = Path::new(config_path)
        .canonicalize()
        .unwrap_or_else(|_| PathBuf::from(config_path));

    tracing::debug!("About to load .env file from: {}", abs_config_path.display());

    if Path::new(config_path).exists() {
        match dotenvy::from_filename(config_path) {
            Ok(_) => tracing::info!("✓ Loaded .env file from: {}", abs_config_path.display()),
            Err(e) => tracing::warn!("Failed to load .env file from {}: {}", abs_config_path.display(), e),
        }
    } else {
        tracing::warn!(".env file not found at: {} (using defaults)", abs_config_path.display());
    }

    from_env()
}

/// Builds the configuration from process environment only.
pub fn from_env() -> AppConfig {
    let logging = LoggingConfig {
        file_enabled: env_flag("LOG_FILE_ENABLED", false),
        file_path: std::env::var("LOG_FILE_PATH").ok(),
    };

    let db_name = std::env::var("DB_NAME").unwrap_or_else(|_| "loyalty_data".to_string());
    // Use a directory by default to avoid backup errors
    let db_path = std::env::var("DB_PATH").unwrap_or_else(|_| "data".to_string());
    let sled_path = if db_path.ends_with('/') {
        format!("{}{}", db_path, db_name)
    } else {
        format!("{}/{}", db_path, db_name)
    };

    let backup_dir =
        std::env::var("PERIODIC_BACKUP_PATH").unwrap_or_else(|_| "backups".to_string());
    let backup_name_template = std::env::var("PERIODIC_BACKUP_NAME")
        .unwrap_or_else(|_| "loyalty_data_backup_{{timestamp}}".to_string());
    let backup_retention = std::env::var("BACKUP_RETENTION")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);

    AppConfig {
        sled_path,
        backup_dir,
        backup_name_template,
        backup_retention,
        logging,
        otp_echo: env_flag("OTP_ECHO", true),
    }
}

impl AppConfig {
    /// Applies the `--db-path` override from the command line.
    pub fn with_sled_path(mut self, path: Option<&str>) -> Self {
        if let Some(p) = path.filter(|p| !p.is_empty()) {
            self.sled_path = p.to_string();
        }
        self
    }
}
