use std::path::PathBuf;

use study_core::content::ContentStore;
use study_core::scheduler::AnimationTiming;

use crate::error::AppError;

const PRODUCTION_BASE_PATH: &str = "/react-study-board";
pub const LOADING_ICON: &str = "iconspawn.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Development,
    Production,
}

impl Profile {
    fn parse(value: &str) -> Result<Self, AppError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(AppError::Config(format!(
                "STUDY_BOARD_PROFILE must be 'development' or 'production', got '{other}'"
            ))),
        }
    }

    fn default_base_path(&self) -> &'static str {
        match self {
            Self::Development => "",
            Self::Production => PRODUCTION_BASE_PATH,
        }
    }
}

/// Application configuration loaded explicitly from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// JSON content file replacing the bundled chapters. `None` uses the bundled set.
    pub content_path: Option<PathBuf>,
    pub profile: Profile,
    /// URL prefix for static assets, "" or "/react-study-board" style.
    pub base_path: String,
    /// Skip every animation delay.
    pub reduced_motion: bool,
    /// Serve MCP over TCP instead of stdio.
    pub tcp_listen_addr: Option<String>,
}

impl Config {
    /// All optional:
    /// - `STUDY_BOARD_CONTENT_PATH`: chapter JSON file (must exist when set)
    /// - `STUDY_BOARD_PROFILE`: `development` (default) or `production`
    /// - `STUDY_BOARD_BASE_PATH`: overrides the profile's asset base path
    /// - `STUDY_BOARD_REDUCED_MOTION`: `1`, `true` or `yes` disables animation delays
    /// - `MCP_TCP_LISTEN_ADDR`: e.g. "127.0.0.1:8090"
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let content_path = match lookup("STUDY_BOARD_CONTENT_PATH") {
            Some(path) if !path.trim().is_empty() => {
                let path = PathBuf::from(path.trim());
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "content file not found: {}",
                        path.display()
                    )));
                }
                Some(path)
            }
            _ => None,
        };

        let profile = match lookup("STUDY_BOARD_PROFILE") {
            Some(value) => Profile::parse(&value)?,
            None => Profile::Development,
        };

        let base_path = match lookup("STUDY_BOARD_BASE_PATH") {
            Some(value) => normalize_base_path(&value),
            None => profile.default_base_path().to_string(),
        };

        let reduced_motion = lookup("STUDY_BOARD_REDUCED_MOTION")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            content_path,
            profile,
            base_path,
            reduced_motion,
            tcp_listen_addr: lookup("MCP_TCP_LISTEN_ADDR").filter(|a| !a.trim().is_empty()),
        })
    }

    pub fn timing(&self) -> AnimationTiming {
        if self.reduced_motion {
            AnimationTiming::reduced()
        } else {
            AnimationTiming::default()
        }
    }

    /// Joins the base path and an asset path, e.g. "/react-study-board/iconspawn.png".
    pub fn asset_path(&self, rel: &str) -> String {
        format!("{}/{}", self.base_path, rel.trim_start_matches('/'))
    }

    pub fn load_content(&self) -> Result<ContentStore, AppError> {
        let store = match &self.content_path {
            Some(path) => ContentStore::load(path)?,
            None => ContentStore::builtin()?,
        };
        Ok(store)
    }
}

fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_vars(vars: &[(&str, &str)]) -> Result<Config, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_development() {
        let config = from_vars(&[]).unwrap();
        assert_eq!(config.profile, Profile::Development);
        assert_eq!(config.base_path, "");
        assert!(config.content_path.is_none());
        assert!(config.tcp_listen_addr.is_none());
        assert_eq!(config.asset_path(LOADING_ICON), "/iconspawn.png");
        assert_eq!(config.timing(), AnimationTiming::default());
    }

    #[test]
    fn production_prefixes_assets() {
        let config = from_vars(&[("STUDY_BOARD_PROFILE", "production")]).unwrap();
        assert_eq!(
            config.asset_path("/iconspawn.png"),
            "/react-study-board/iconspawn.png"
        );
    }

    #[test]
    fn base_path_override_is_normalized() {
        let config = from_vars(&[
            ("STUDY_BOARD_PROFILE", "production"),
            ("STUDY_BOARD_BASE_PATH", "board/"),
        ])
        .unwrap();
        assert_eq!(config.base_path, "/board");
        assert_eq!(config.asset_path("a.png"), "/board/a.png");
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let err = from_vars(&[("STUDY_BOARD_PROFILE", "staging")]).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("staging")));
    }

    #[test]
    fn missing_content_file_is_rejected() {
        let err = from_vars(&[("STUDY_BOARD_CONTENT_PATH", "/definitely/not/here.json")]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn reduced_motion_flag() {
        let config = from_vars(&[("STUDY_BOARD_REDUCED_MOTION", "Yes")]).unwrap();
        assert_eq!(config.timing(), AnimationTiming::reduced());
        let config = from_vars(&[("STUDY_BOARD_REDUCED_MOTION", "0")]).unwrap();
        assert!(!config.reduced_motion);
    }

    #[test]
    fn bundled_content_loads() {
        let store = from_vars(&[]).unwrap().load_content().unwrap();
        assert_eq!(store.len(), 4);
    }
}
