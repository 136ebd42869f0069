use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root application configuration. Loaded from environment variables
/// with the prefix `LEADWIZARD__` and an optional config file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub tenants: TenantsConfig,
    #[serde(default)]
    pub auto_advance: AutoAdvanceConfig,
    #[serde(default)]
    pub contact: ContactDefaults,
}

/// Where per-client tenant files live and which one is the fallback.
#[derive(Debug, Clone, Deserialize)]
pub struct TenantsConfig {
    #[serde(default = "default_configs_dir")]
    pub configs_dir: PathBuf,
    #[serde(default = "default_tenant")]
    pub default_tenant: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutoAdvanceConfig {
    #[serde(default = "default_auto_advance_enabled")]
    pub enabled: bool,
    #[serde(default = "default_auto_advance_delay_ms")]
    pub delay_ms: u64,
}

/// Built-in tenant record used until (or instead of) a tenant file.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactDefaults {
    #[serde(default = "default_contact_name")]
    pub name: String,
    #[serde(default = "default_fallback_number")]
    pub phone_number: String,
    #[serde(default = "default_fallback_number")]
    pub whatsapp_number: String,
    #[serde(default)]
    pub email: String,
}

// Default functions
fn default_configs_dir() -> PathBuf {
    PathBuf::from("configs")
}
fn default_tenant() -> String {
    "roofer_config".to_string()
}
fn default_auto_advance_enabled() -> bool {
    true
}
fn default_auto_advance_delay_ms() -> u64 {
    1000
}
fn default_contact_name() -> String {
    "Roofer".to_string()
}
fn default_fallback_number() -> String {
    "9987412299".to_string()
}

impl Default for TenantsConfig {
    fn default() -> Self {
        Self {
            configs_dir: default_configs_dir(),
            default_tenant: default_tenant(),
        }
    }
}

impl Default for AutoAdvanceConfig {
    fn default() -> Self {
        Self {
            enabled: default_auto_advance_enabled(),
            delay_ms: default_auto_advance_delay_ms(),
        }
    }
}

impl AutoAdvanceConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for ContactDefaults {
    fn default() -> Self {
        Self {
            name: default_contact_name(),
            phone_number: default_fallback_number(),
            whatsapp_number: default_fallback_number(),
            email: String::new(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tenants: TenantsConfig::default(),
            auto_advance: AutoAdvanceConfig::default(),
            contact: ContactDefaults::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and an optional config file.
    /// Environment values win over the file.
    pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("LEADWIZARD")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.tenants.default_tenant, "roofer_config");
        assert_eq!(config.tenants.configs_dir, PathBuf::from("configs"));
        assert!(config.auto_advance.enabled);
        assert_eq!(config.auto_advance.delay(), Duration::from_millis(1000));
        assert_eq!(config.contact.phone_number, "9987412299");
        assert_eq!(config.contact.whatsapp_number, "9987412299");
        assert!(config.contact.email.is_empty());
    }

    #[test]
    fn test_load_from_file_with_partial_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leadwizard.toml");
        std::fs::write(
            &path,
            "[auto_advance]\ndelay_ms = 250\n\n[contact]\nemail = \"quotes@example.com\"\n",
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.auto_advance.delay_ms, 250);
        assert!(config.auto_advance.enabled);
        assert_eq!(config.contact.email, "quotes@example.com");
        assert_eq!(config.contact.name, "Roofer");
        assert_eq!(config.tenants.default_tenant, "roofer_config");
    }

    #[test]
    fn test_missing_file_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.auto_advance.delay_ms, 1000);
    }
}
