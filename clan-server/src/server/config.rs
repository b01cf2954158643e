use clan_shared::domain::{DEFAULT_FAMILY_NAME, DEFAULT_MIN_MEMBERS, DEFAULT_PLACEHOLDER_DOMAIN};
use serde::Deserialize;
use std::{env, fs, path::Path};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub dev_cors_origin: Option<String>,
    pub listen_port: Option<u16>,
    /// bcrypt cost for new password hashes.
    #[serde(default = "default_password_cost")]
    pub password_cost: u32,
    #[serde(default)]
    pub family: FamilyConfig,
}

fn default_password_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

/// Rules applied when families and members are created.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FamilyConfig {
    /// Name given to families created by auto-provisioning.
    pub default_name: String,
    /// Members (including the acting parent) required before onboarding can finish.
    pub min_onboarding_members: usize,
    pub placeholder_email_domain: String,
}

impl Default for FamilyConfig {
    fn default() -> Self {
        Self {
            default_name: DEFAULT_FAMILY_NAME.to_string(),
            min_onboarding_members: DEFAULT_MIN_MEMBERS,
            placeholder_email_domain: DEFAULT_PLACEHOLDER_DOMAIN.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl AppConfig {
    pub fn config_path() -> String {
        env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string())
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(&path)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("jwt_secret must not be empty".into()));
        }
        if !(4..=31).contains(&self.password_cost) {
            return Err(ConfigError::Invalid(
                "password_cost must be between 4 and 31".into(),
            ));
        }
        if self.family.default_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "family.default_name must not be empty".into(),
            ));
        }
        if self.family.min_onboarding_members == 0 {
            return Err(ConfigError::Invalid(
                "family.min_onboarding_members must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
