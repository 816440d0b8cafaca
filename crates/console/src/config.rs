use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const ROOT_ENV: &str = "SETUP_ADMIN_ROOT";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub wizard: WizardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the backend; `graphql` and `upload` are resolved against it.
    pub root: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub session_slot: String,
    /// Token written to the session slot when credential exchange fails.
    /// Unset means the slot is only written after a successful login.
    pub failure_token: Option<String>,
    /// Keep the session in memory only.
    pub ephemeral: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseCodePolicy {
    /// `INVALID` is logged and the wizard moves on.
    #[default]
    Advisory,
    /// `INVALID` blocks the purchase-code step.
    Enforced,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    pub purchase_code_policy: PurchaseCodePolicy,
    pub min_api_key_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root: "http://localhost:3000/".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_slot: setup_admin_remote::session::DEFAULT_SLOT.to_string(),
            failure_token: None,
            ephemeral: false,
        }
    }
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            purchase_code_policy: PurchaseCodePolicy::Advisory,
            min_api_key_len: 10,
        }
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                if path.exists() {
                    tracing::warn!("Falling back to default configuration: {e:#}");
                }
                Self::default()
            }
        }
    }

    /// Applies environment overrides on top of the file values.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(root) = std::env::var(ROOT_ENV) {
            self.server.root = root;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.server.root)
            .with_context(|| format!("server.root is not a valid URL: {}", self.server.root))?;
        anyhow::ensure!(
            self.server.timeout_seconds > 0,
            "server.timeout_seconds must be positive"
        );
        anyhow::ensure!(
            !self.auth.session_slot.is_empty(),
            "auth.session_slot must not be empty"
        );
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("com", "setup-admin", "setup-admin")
        {
            proj_dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("config/default.toml")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [wizard]
            purchase_code_policy = "enforced"
            "#,
        )
        .expect("parse");

        assert_eq!(config.wizard.purchase_code_policy, PurchaseCodePolicy::Enforced);
        assert_eq!(config.wizard.min_api_key_len, 10);
        assert_eq!(config.server.timeout_seconds, 30);
        assert_eq!(config.auth.failure_token, None);
    }

    #[test]
    fn load_rejects_bad_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nroot = \"::nope\"\n").expect("write");

        assert!(Config::load(&path).is_err());
        assert_eq!(Config::load_or_default(&path).server.root, "http://localhost:3000/");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load_or_default(&dir.path().join("absent.toml"));
        assert_eq!(config.wizard.purchase_code_policy, PurchaseCodePolicy::Advisory);
    }
}
