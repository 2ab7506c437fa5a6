use std::{collections::HashMap, fs};

use anyhow::{bail, Context};
use shared::domain::Language;
use url::Url;

#[derive(Debug)]
pub struct Settings {
    pub server_url: String,
    pub language: Language,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".into(),
            language: Language::En,
        }
    }
}

/// Defaults, overlaid by `voicecart.toml`, overlaid by environment.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("voicecart.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("server_url") {
                settings.server_url = v.clone();
            }
            if let Some(v) = file_cfg.get("language") {
                if let Some(language) = Language::from_tag(v) {
                    settings.language = language;
                }
            }
        }
    }

    if let Ok(v) = std::env::var("VOICECART_SERVER_URL") {
        settings.server_url = v;
    }
    if let Ok(v) = std::env::var("VOICECART_LANGUAGE") {
        if let Some(language) = Language::from_tag(&v) {
            settings.language = language;
        }
    }

    settings
}

pub fn normalize_server_url(raw: &str) -> anyhow::Result<String> {
    let raw = raw.trim();
    let url = Url::parse(raw).with_context(|| format!("invalid server url '{raw}'"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        bail!("server url must use http or https, got '{raw}'");
    }
    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_trailing_slash_away() {
        assert_eq!(
            normalize_server_url("http://shop.example:8080/").expect("url"),
            "http://shop.example:8080"
        );
    }

    #[test]
    fn rejects_scheme_less_url() {
        assert!(normalize_server_url("shop.example:8080").is_err());
        assert!(normalize_server_url("ftp://shop.example").is_err());
    }

    // Single test: the variables are process-global.
    #[test]
    fn env_overrides_defaults_and_ignores_unknown_language() {
        std::env::set_var("VOICECART_SERVER_URL", "http://env.example");
        std::env::set_var("VOICECART_LANGUAGE", "es");
        let settings = load_settings();
        assert_eq!(settings.server_url, "http://env.example");
        assert_eq!(settings.language, Language::Es);

        std::env::set_var("VOICECART_LANGUAGE", "fr");
        let settings = load_settings();
        assert_eq!(settings.language, Language::En);

        std::env::remove_var("VOICECART_SERVER_URL");
        std::env::remove_var("VOICECART_LANGUAGE");
    }
}
