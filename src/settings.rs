//! Backend settings
//!
//! Where scores live and how many rows the leaderboard shows. Loaded from a
//! JSON config block on the page (web) or `ROAD_RUSH_*` variables (native).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Leaderboard backend settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Web API key for anonymous sign-in
    pub api_key: String,
    /// Realtime database root URL (no trailing slash needed)
    pub database_url: String,
    /// Collection holding one record per player
    pub leaderboard_path: String,
    /// Rows shown on the leaderboard
    pub leaderboard_size: usize,
    /// Client storage key for the saved display name
    pub username_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            database_url: String::new(),
            leaderboard_path: "leaderboard".to_string(),
            leaderboard_size: 5,
            username_key: "username".to_string(),
        }
    }
}

impl Settings {
    /// Id of the `<script type="application/json">` element holding settings
    #[allow(dead_code)]
    const CONFIG_ELEMENT_ID: &'static str = "road-rush-config";

    /// Parse settings from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the leaderboard flow cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.leaderboard_size == 0 {
            return Err(Error::Config("leaderboard_size must be at least 1".into()));
        }
        let path = self.leaderboard_path.trim_matches('/');
        if path.is_empty() {
            return Err(Error::Config("leaderboard_path must not be empty".into()));
        }
        if self.username_key.is_empty() {
            return Err(Error::Config("username_key must not be empty".into()));
        }
        Ok(())
    }

    /// Whether a remote backend is configured at all
    pub fn has_remote(&self) -> bool {
        !self.api_key.is_empty() && !self.database_url.is_empty()
    }

    /// Database root URL without a trailing slash
    pub fn database_root(&self) -> &str {
        self.database_url.trim_end_matches('/')
    }

    /// Settings from `ROAD_RUSH_*` environment variables (native only)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Settings from `ROAD_RUSH_*` variables looked up through `var`;
    /// unset variables keep their defaults.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Self::default();
        if let Some(v) = var("ROAD_RUSH_API_KEY") {
            settings.api_key = v;
        }
        if let Some(v) = var("ROAD_RUSH_DATABASE_URL") {
            settings.database_url = v;
        }
        if let Some(v) = var("ROAD_RUSH_LEADERBOARD_PATH") {
            settings.leaderboard_path = v;
        }
        if let Some(v) = var("ROAD_RUSH_LEADERBOARD_SIZE") {
            settings.leaderboard_size = v
                .parse()
                .map_err(|_| Error::Config(format!("bad ROAD_RUSH_LEADERBOARD_SIZE: {v}")))?;
        }
        if let Some(v) = var("ROAD_RUSH_USERNAME_KEY") {
            settings.username_key = v;
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the page's config element (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let json = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(Self::CONFIG_ELEMENT_ID))
            .and_then(|el| el.text_content());

        if let Some(json) = json {
            match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded backend settings");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring backend settings: {}", e),
            }
        }

        log::info!("Using default backend settings");
        Self::default()
    }

    /// Load settings from the environment, falling back to defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        match Self::from_env() {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring backend settings: {}", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.leaderboard_path, "leaderboard");
        assert_eq!(s.leaderboard_size, 5);
        assert_eq!(s.username_key, "username");
        assert!(!s.has_remote());
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let s = Settings::from_json(
            r#"{ "api_key": "k", "database_url": "https://demo.firebaseio.com/" }"#,
        )
        .unwrap();
        assert!(s.has_remote());
        assert_eq!(s.database_root(), "https://demo.firebaseio.com");
        assert_eq!(s.leaderboard_size, 5);
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        assert!(matches!(
            Settings::from_json(r#"{ "leaderboard_size": 0 }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Settings::from_json(r#"{ "leaderboard_path": "//" }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(Settings::from_json("not json"), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_vars_reads_every_setting() {
        use std::collections::HashMap;

        let vars: HashMap<&str, &str> = HashMap::from([
            ("ROAD_RUSH_API_KEY", "k"),
            ("ROAD_RUSH_DATABASE_URL", "https://demo.firebaseio.com"),
            ("ROAD_RUSH_LEADERBOARD_PATH", "scores"),
            ("ROAD_RUSH_LEADERBOARD_SIZE", "10"),
            ("ROAD_RUSH_USERNAME_KEY", "driver"),
        ]);
        let s = Settings::from_vars(|name| vars.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(s.api_key, "k");
        assert_eq!(s.database_url, "https://demo.firebaseio.com");
        assert_eq!(s.leaderboard_path, "scores");
        assert_eq!(s.leaderboard_size, 10);
        assert_eq!(s.username_key, "driver");
    }

    #[test]
    fn test_from_vars_defaults_and_errors() {
        assert_eq!(Settings::from_vars(|_| None).unwrap(), Settings::default());
        assert!(matches!(
            Settings::from_vars(|name| (name == "ROAD_RUSH_LEADERBOARD_SIZE").then(|| "ten".into())),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Settings::from_vars(|name| (name == "ROAD_RUSH_USERNAME_KEY").then(String::new)),
            Err(Error::Config(_))
        ));
    }
}
