use crate::dashboard::StalePolicy;
use crate::error::DashboardError;
use crate::model::DEFAULT_DOMAIN;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base: Url,
    pub stale_policy: StalePolicy,
    pub domain: String,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    defaults: ConfigDefaults,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigDefaults {
    api_base: Option<String>,
    stale_policy: Option<StalePolicy>,
    domain: Option<String>,
}

impl AppConfig {
    pub fn load(
        api_base: Option<String>,
        stale_policy: Option<StalePolicy>,
    ) -> Result<Self, DashboardError> {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scrape-dashboard");
        let file_config = load_config_file(&config_dir);

        Self::resolve(
            api_base,
            stale_policy,
            std::env::var("SCRAPER_API_BASE").ok(),
            std::env::var("SCRAPER_STALE_POLICY").ok(),
            file_config,
        )
    }

    // Priority: CLI flags → env vars → config file → defaults
    fn resolve(
        api_base: Option<String>,
        stale_policy: Option<StalePolicy>,
        api_base_env: Option<String>,
        stale_policy_env: Option<String>,
        file_config: ConfigFile,
    ) -> Result<Self, DashboardError> {
        let api_base = api_base
            .or(api_base_env)
            .or(file_config.defaults.api_base)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let stale_policy = match (stale_policy, stale_policy_env) {
            (Some(policy), _) => policy,
            (None, Some(env)) => env.parse().map_err(DashboardError::Config)?,
            (None, None) => file_config.defaults.stale_policy.unwrap_or_default(),
        };

        let domain = file_config
            .defaults
            .domain
            .unwrap_or_else(|| DEFAULT_DOMAIN.to_string());

        Ok(AppConfig {
            api_base: Self::parse_api_base(&api_base)?,
            stale_policy,
            domain,
        })
    }

    pub fn parse_api_base(raw: &str) -> Result<Url, DashboardError> {
        let url = Url::parse(raw.trim())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DashboardError::Config(format!(
                "API base must use http or https, got '{}'",
                raw
            )));
        }
        Ok(url)
    }
}

fn load_config_file(config_dir: &Path) -> ConfigFile {
    let config_path = config_dir.join("config.toml");
    if !config_path.exists() {
        return ConfigFile::default();
    }
    match std::fs::read_to_string(&config_path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed {}: {}", config_path.display(), e);
            ConfigFile::default()
        }),
        Err(_) => ConfigFile::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(toml_text: &str) -> ConfigFile {
        toml::from_str(toml_text).unwrap()
    }

    #[test]
    fn defaults_apply_without_any_source() {
        let config =
            AppConfig::resolve(None, None, None, None, ConfigFile::default()).unwrap();
        assert_eq!(config.api_base.as_str(), "http://127.0.0.1:8000/");
        assert_eq!(config.stale_policy, StalePolicy::Apply);
        assert_eq!(config.domain, "amazon.com");
    }

    #[test]
    fn flag_beats_env_beats_file() {
        let toml_text = r#"
            [defaults]
            api_base = "http://file.test:8000"
            stale_policy = "discard"
            domain = "amazon.co.uk"
        "#;

        let from_file =
            AppConfig::resolve(None, None, None, None, file(toml_text)).unwrap();
        assert_eq!(from_file.api_base.host_str(), Some("file.test"));
        assert_eq!(from_file.stale_policy, StalePolicy::Discard);
        assert_eq!(from_file.domain, "amazon.co.uk");

        let from_env = AppConfig::resolve(
            None,
            None,
            Some("http://env.test".into()),
            Some("apply".into()),
            file(toml_text),
        )
        .unwrap();
        assert_eq!(from_env.api_base.host_str(), Some("env.test"));
        assert_eq!(from_env.stale_policy, StalePolicy::Apply);

        let from_flag = AppConfig::resolve(
            Some("https://flag.test".into()),
            Some(StalePolicy::Discard),
            Some("http://env.test".into()),
            Some("apply".into()),
            file(toml_text),
        )
        .unwrap();
        assert_eq!(from_flag.api_base.host_str(), Some("flag.test"));
        assert_eq!(from_flag.stale_policy, StalePolicy::Discard);
    }

    #[test]
    fn rejects_bad_base_and_policy() {
        let bad_base = AppConfig::resolve(
            Some("ftp://example.test".into()),
            None,
            None,
            None,
            ConfigFile::default(),
        );
        assert!(matches!(bad_base, Err(DashboardError::Config(_))));

        let not_a_url = AppConfig::parse_api_base("127.0.0.1 port 8000");
        assert!(matches!(not_a_url, Err(DashboardError::Url(_))));

        let bad_policy = AppConfig::resolve(
            None,
            None,
            None,
            Some("sometimes".into()),
            ConfigFile::default(),
        );
        assert!(matches!(bad_policy, Err(DashboardError::Config(_))));
    }

    #[test]
    fn missing_config_file_falls_back() {
        let dir = std::env::temp_dir().join("scrape-dashboard-no-such-dir");
        let config = load_config_file(&dir);
        assert!(config.defaults.api_base.is_none());
    }
}
