use serde::Deserialize;
use std::{env, fs, path::Path, path::PathBuf};
use voltmap_shared::domain::RewardDefinition;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub jwt_secret: String,
    /// Reward catalog upserted into the database at startup.
    #[serde(default)]
    pub rewards: Vec<RewardDefinition>,
    pub dev_cors_origin: Option<String>,
    pub listen_port: Option<u16>,
    /// Browser client build served for paths outside `/api`.
    pub web_dir: Option<PathBuf>,
    /// bcrypt work factor for new password hashes.
    pub bcrypt_cost: Option<u32>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Yaml(e) => write!(f, "YAML error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(value: serde_yaml::Error) -> Self {
        ConfigError::Yaml(value)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
        Self::load_from_path(path)
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
        if let Some(cost) = self.bcrypt_cost
            && !(4..=31).contains(&cost)
        {
            return Err(ConfigError::Invalid(format!(
                "bcrypt_cost must be between 4 and 31, got {cost}"
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for r in &self.rewards {
            if r.name.trim().is_empty() {
                return Err(ConfigError::Invalid("reward name must not be empty".into()));
            }
            if r.points_required < 0 {
                return Err(ConfigError::Invalid(format!(
                    "reward {} has negative points_required",
                    r.name
                )));
            }
            if !seen.insert(r.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate reward {}", r.name)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let cfg = AppConfig::from_yaml(
            r#"
jwt_secret: s3cret
listen_port: 8080
web_dir: ./web/dist
rewards:
  - name: 10% off
    description: Ten percent off
    points_required: 100
    type: discount
    value: 10
  - name: Free charge
    description: One free session
    points_required: 500
    type: free_charge
    value: 1
"#,
        )
        .unwrap();
        assert_eq!(cfg.listen_port, Some(8080));
        assert_eq!(cfg.rewards.len(), 2);
        assert_eq!(cfg.rewards[1].kind, "free_charge");
        assert_eq!(cfg.web_dir.as_deref(), Some(Path::new("./web/dist")));
        assert!(cfg.dev_cors_origin.is_none());
    }

    #[test]
    fn example_config_is_valid() {
        let cfg = AppConfig::from_yaml(include_str!("../../config.example.yaml")).unwrap();
        assert_eq!(cfg.rewards.len(), 3);
        assert_eq!(cfg.listen_port, Some(5151));
    }

    #[test]
    fn rewards_are_optional() {
        let cfg = AppConfig::from_yaml("jwt_secret: x\n").unwrap();
        assert!(cfg.rewards.is_empty());
        assert!(cfg.bcrypt_cost.is_none());
    }

    #[test]
    fn rejects_empty_secret_and_duplicate_rewards() {
        assert!(matches!(
            AppConfig::from_yaml("jwt_secret: ''\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::from_yaml("jwt_secret: x\nbcrypt_cost: 2\n"),
            Err(ConfigError::Invalid(_))
        ));
        let dup = r#"
jwt_secret: x
rewards:
  - {name: A, description: a, points_required: 1, type: discount, value: 1}
  - {name: A, description: b, points_required: 2, type: discount, value: 2}
"#;
        assert!(matches!(
            AppConfig::from_yaml(dup),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load_from_path(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
