use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TravelSettings {
    pub api: ApiSettings,
    pub host: HostSettings,
    pub storage: StorageSettings,
    pub messages: MessageSettings,
    pub logging: LoggingSettings,
}

/// Remote endpoints used by the host bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub auth_path: String,
    pub payment_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    /// Scopes requested with the host auth code
    pub auth_scopes: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Directory of the file backend
    pub path: String,
}

/// User-facing notification texts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageSettings {
    pub default_user_name: String,
    pub login_success: String,
    pub logout: String,
    pub payment_success: String,
    pub payment_failed: String,
    pub payment_error: String,
    pub payment_host_only: String,
    pub login_required: String,
    pub scan_failed: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://its.mouamle.space".to_string(),
            auth_path: "/api/auth-with-superQi".to_string(),
            payment_path: "/api/payment".to_string(),
        }
    }
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            auth_scopes: vec!["auth_base".to_string(), "USER_ID".to_string()],
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: ".travelsure".to_string(),
        }
    }
}

impl Default for MessageSettings {
    fn default() -> Self {
        Self {
            default_user_name: "المستخدم".to_string(),
            login_success: "تم تسجيل الدخول بنجاح".to_string(),
            logout: "تم تسجيل الخروج".to_string(),
            payment_success: "تم الدفع بنجاح".to_string(),
            payment_failed: "فشل الدفع".to_string(),
            payment_error: "فشل عملية الدفع".to_string(),
            payment_host_only: "الدفع متاح فقط في تطبيق الميني آب".to_string(),
            login_required: "يجب تسجيل الدخول أولاً".to_string(),
            scan_failed: "تعذر قراءة رمز الدفع".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ApiSettings {
    #[must_use]
    pub fn auth_url(&self) -> String {
        join_url(&self.base_url, &self.auth_path)
    }

    #[must_use]
    pub fn payment_url(&self) -> String {
        join_url(&self.base_url, &self.payment_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

impl TravelSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Logger initialization fails
    /// - Settings file cannot be read or parsed
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_env_file();

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        Self::initialize_logging(&settings.logging)?;
        Ok(settings)
    }

    /// Initialize `env_logger`, `RUST_LOG` taking precedence over the configured level
    fn initialize_logging(logging: &LoggingSettings) -> Result<(), Box<dyn std::error::Error>> {
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(logging.level.as_str()),
        )
        .try_init()?;
        Ok(())
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `TRAVELSURE_CONFIG_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read
    /// - TOML parsing fails
    fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::default();

        let default_config_path = std::path::PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            let toml_content = fs::read_to_string(&default_config_path)?;
            settings = basic_toml::from_str(&toml_content)?;
            println!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(config_dir) = std::env::var("TRAVELSURE_CONFIG_DIR") {
            let config_path = std::path::Path::new(&config_dir).join("Settings.toml");
            if config_path.exists() {
                let toml_content = fs::read_to_string(&config_path)?;
                settings = basic_toml::from_str(&toml_content)?;
                println!("✓ Overriding settings from {}", config_path.display());
            } else {
                println!(
                    "ℹ TRAVELSURE_CONFIG_DIR set but no Settings.toml found at: {}",
                    config_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_api_env_overrides(&mut settings.api);
        Self::apply_storage_env_overrides(&mut settings.storage);
        Self::apply_message_env_overrides(&mut settings.messages);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_api_env_overrides(api_settings: &mut ApiSettings) {
        if let Ok(base_url) = std::env::var("API_BASE_URL") {
            api_settings.base_url = base_url;
        }
        if let Ok(auth_path) = std::env::var("AUTH_PATH") {
            api_settings.auth_path = auth_path;
        }
        if let Ok(payment_path) = std::env::var("PAYMENT_PATH") {
            api_settings.payment_path = payment_path;
        }
    }

    fn apply_storage_env_overrides(storage_settings: &mut StorageSettings) {
        if let Ok(backend) = std::env::var("STORAGE_BACKEND") {
            match backend.to_ascii_lowercase().as_str() {
                "memory" => storage_settings.backend = StorageBackend::Memory,
                "file" => storage_settings.backend = StorageBackend::File,
                other => eprintln!("⚠️  Ignoring unknown STORAGE_BACKEND '{other}'"),
            }
        }
        if let Ok(path) = std::env::var("STORAGE_PATH") {
            storage_settings.path = path;
        }
    }

    fn apply_message_env_overrides(message_settings: &mut MessageSettings) {
        if let Ok(name) = std::env::var("DEFAULT_USER_NAME") {
            if !name.is_empty() {
                message_settings.default_user_name = name;
            }
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                if line.trim_start().starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }
}
