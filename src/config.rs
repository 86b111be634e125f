//! Configuration file support for leaflink
//!
//! Config is loaded from `~/.leaflink/config.toml` (or
//! `$LEAFLINK_HOME/config.toml`). Environment variables override config
//! file settings. The loaded `Config` is constructed once in `main` and
//! passed to the store and session-gate constructors; backend selection is
//! fixed for the process lifetime.

use crate::storage::leaflink_dir;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration struct
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Remote datastore + auth (Supabase project)
    pub supabase: SupabaseConfig,

    /// Care advisory service (Gemini)
    pub advisory: AdvisoryConfig,

    /// "Plant added" email notifications (EmailJS)
    pub email: EmailConfig,
}

/// Remote backend configuration. When url and anon_key are both present the
/// store and session gate run against Supabase; otherwise leaflink runs in
/// demo mode with local storage and no sign-in.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SupabaseConfig {
    /// Project URL, e.g. "https://xyzcompany.supabase.co"
    pub url: Option<String>,
    /// Anonymous (public) API key
    pub anon_key: Option<String>,
}

impl SupabaseConfig {
    pub fn is_configured(&self) -> bool {
        matches!((&self.url, &self.anon_key), (Some(u), Some(k)) if !u.is_empty() && !k.is_empty())
    }
}

/// Care advisory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    /// Gemini API key; unset disables advisory lookups
    pub api_key: Option<String>,
    /// Model used for care advice (default: "gemini-2.5-flash")
    pub model: String,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
        }
    }
}

/// EmailJS configuration for best-effort "plant added" emails
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EmailConfig {
    pub service_id: Option<String>,
    pub template_id: Option<String>,
    pub public_key: Option<String>,
}

impl EmailConfig {
    pub fn is_configured(&self) -> bool {
        self.service_id.as_deref().is_some_and(|s| !s.is_empty())
            && self.template_id.as_deref().is_some_and(|s| !s.is_empty())
            && self.public_key.as_deref().is_some_and(|s| !s.is_empty())
    }
}

impl Config {
    /// Get the config file path
    pub fn path() -> Option<PathBuf> {
        leaflink_dir().ok().map(|d| d.join("config.toml"))
    }

    /// Load config from file, with environment variable overrides
    pub fn load() -> Self {
        let mut config = Self::load_from_file().unwrap_or_default();
        config.apply_env_overrides();
        config
    }

    /// Load config from file only (no env overrides)
    fn load_from_file() -> Option<Self> {
        let path = Self::path()?;
        if !path.exists() {
            return None;
        }

        let content = std::fs::read_to_string(&path).ok()?;
        match toml::from_str::<Self>(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                crate::logging::error(&format!("Failed to parse config file: {}", e));
                None
            }
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SUPABASE_URL") {
            self.supabase.url = Some(v);
        }
        if let Ok(v) = std::env::var("SUPABASE_ANON_KEY") {
            self.supabase.anon_key = Some(v);
        }

        if let Ok(v) = std::env::var("GEMINI_API_KEY") {
            self.advisory.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("LEAFLINK_ADVISORY_MODEL") {
            self.advisory.model = v;
        }

        if let Ok(v) = std::env::var("EMAILJS_SERVICE_ID") {
            self.email.service_id = Some(v);
        }
        if let Ok(v) = std::env::var("EMAILJS_TEMPLATE_ID") {
            self.email.template_id = Some(v);
        }
        if let Ok(v) = std::env::var("EMAILJS_PUBLIC_KEY") {
            self.email.public_key = Some(v);
        }
    }

    /// Create a default config file with documented options
    pub fn write_default() -> anyhow::Result<PathBuf> {
        let path =
            Self::path().ok_or_else(|| anyhow::anyhow!("Cannot determine config path"))?;

        if path.exists() {
            anyhow::bail!("Config file already exists: {}", path.display());
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let default_content = r#"# leaflink configuration
# Environment variables override these settings.

[supabase]
# Remote garden storage + sign-in. Leave unset for demo mode
# (plants saved locally, no accounts).
# url = "https://yourproject.supabase.co"   # or SUPABASE_URL
# anon_key = ""                             # or SUPABASE_ANON_KEY

[advisory]
# Care suggestions when adding a plant (optional).
# api_key = ""                # or GEMINI_API_KEY
# model = "gemini-2.5-flash"

[email]
# "Plant added" emails via EmailJS (optional, best-effort).
# service_id = ""   # or EMAILJS_SERVICE_ID
# template_id = ""  # or EMAILJS_TEMPLATE_ID
# public_key = ""   # or EMAILJS_PUBLIC_KEY
"#;

        std::fs::write(&path, default_content)?;
        Ok(path)
    }

    /// Get config as a formatted string for display
    pub fn display_string(&self) -> String {
        let path = Self::path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        format!(
            r#"Configuration ({})

Storage:
- Backend: {}
- Supabase URL: {}

Advisory:
- Care suggestions: {}
- Model: {}

Email:
- Plant-added emails: {}

Edit the config file or set environment variables to customize.
(SUPABASE_URL, SUPABASE_ANON_KEY, GEMINI_API_KEY, EMAILJS_* override file settings.)"#,
            path,
            if self.supabase.is_configured() {
                "remote (Supabase)"
            } else {
                "local (demo mode)"
            },
            self.supabase.url.as_deref().unwrap_or("(unset)"),
            if self.advisory.api_key.is_some() {
                "enabled"
            } else {
                "disabled (no API key)"
            },
            self.advisory.model,
            if self.email.is_configured() {
                "enabled"
            } else {
                "disabled"
            },
        )
    }
}
