use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "pii-detector";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_EXTRACTION_MODEL: &str = "mistral-small3.1";
pub const DEFAULT_EXTRACTION_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 8080));
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> String {
    format!("info,{}=debug", env!("CARGO_CRATE_NAME"))
}

/// Per-user rule table picked up when `PII_RULES_PATH` is not set:
/// `<config dir>/pii-detector/rules.json`.
pub fn user_rules_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join("rules.json"))
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    pub ollama_url: String,
    pub extraction_model: String,
    pub chat_model: String,
    pub extraction_timeout_secs: u64,
    pub rules_path: Option<PathBuf>,
    pub bind_addr: SocketAddr,
    pub max_upload_bytes: usize,
    pub deduplicate: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            extraction_model: DEFAULT_EXTRACTION_MODEL.to_string(),
            chat_model: DEFAULT_EXTRACTION_MODEL.to_string(),
            extraction_timeout_secs: DEFAULT_EXTRACTION_TIMEOUT_SECS,
            rules_path: None,
            bind_addr: DEFAULT_BIND_ADDR,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            deduplicate: false,
        }
    }
}

impl DetectorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset or blank keys take the default;
    /// unparsable values warn and take the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let extraction_model = get("PII_EXTRACTION_MODEL").unwrap_or(defaults.extraction_model);
        let chat_model = get("PII_CHAT_MODEL").unwrap_or_else(|| extraction_model.clone());

        Self {
            ollama_url: get("PII_OLLAMA_URL").unwrap_or(defaults.ollama_url),
            extraction_model,
            chat_model,
            extraction_timeout_secs: parse_or(
                "PII_EXTRACTION_TIMEOUT_SECS",
                get("PII_EXTRACTION_TIMEOUT_SECS"),
                defaults.extraction_timeout_secs,
            )
            .max(1),
            rules_path: get("PII_RULES_PATH").map(PathBuf::from),
            bind_addr: parse_or("PII_BIND_ADDR", get("PII_BIND_ADDR"), defaults.bind_addr),
            max_upload_bytes: parse_or(
                "PII_MAX_UPLOAD_BYTES",
                get("PII_MAX_UPLOAD_BYTES"),
                defaults.max_upload_bytes,
            ),
            deduplicate: parse_flag("PII_DEDUPLICATE", get("PII_DEDUPLICATE"), defaults.deduplicate),
        }
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Debug,
{
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = ?default, "Invalid config value, using default");
            default
        }),
    }
}

fn parse_flag(key: &str, raw: Option<String>, default: bool) -> bool {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => default,
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        Some(other) => {
            tracing::warn!(key, value = other, default, "Invalid config flag, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> DetectorConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DetectorConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(config_from(&[]), DetectorConfig::default());
    }

    #[test]
    fn chat_model_follows_extraction_model() {
        let config = config_from(&[("PII_EXTRACTION_MODEL", "llama3.2-vision")]);
        assert_eq!(config.extraction_model, "llama3.2-vision");
        assert_eq!(config.chat_model, "llama3.2-vision");

        let config = config_from(&[
            ("PII_EXTRACTION_MODEL", "llama3.2-vision"),
            ("PII_CHAT_MODEL", "gemma3"),
        ]);
        assert_eq!(config.chat_model, "gemma3");
    }

    #[test]
    fn reads_every_variable() {
        let config = config_from(&[
            ("PII_OLLAMA_URL", "http://gpu-box:11434"),
            ("PII_EXTRACTION_TIMEOUT_SECS", "30"),
            ("PII_RULES_PATH", "/etc/pii/rules.json"),
            ("PII_BIND_ADDR", "0.0.0.0:9000"),
            ("PII_MAX_UPLOAD_BYTES", "1024"),
            ("PII_DEDUPLICATE", "true"),
        ]);
        assert_eq!(config.ollama_url, "http://gpu-box:11434");
        assert_eq!(config.extraction_timeout_secs, 30);
        assert_eq!(config.rules_path, Some(PathBuf::from("/etc/pii/rules.json")));
        assert_eq!(config.bind_addr, "0.0.0.0:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.max_upload_bytes, 1024);
        assert!(config.deduplicate);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = config_from(&[
            ("PII_EXTRACTION_TIMEOUT_SECS", "soon"),
            ("PII_BIND_ADDR", "localhost"),
            ("PII_MAX_UPLOAD_BYTES", "-1"),
            ("PII_DEDUPLICATE", "maybe"),
        ]);
        assert_eq!(config.extraction_timeout_secs, DEFAULT_EXTRACTION_TIMEOUT_SECS);
        assert_eq!(config.bind_addr, DetectorConfig::default().bind_addr);
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert!(!config.deduplicate);
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let config = config_from(&[("PII_EXTRACTION_TIMEOUT_SECS", "0")]);
        assert_eq!(config.extraction_timeout_secs, 1);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config_from(&[("PII_EXTRACTION_MODEL", "  "), ("PII_RULES_PATH", "")]);
        assert_eq!(config.extraction_model, DEFAULT_EXTRACTION_MODEL);
        assert!(config.rules_path.is_none());
    }

    #[test]
    fn default_bind_addr_is_loopback_8080() {
        assert_eq!(DetectorConfig::default().bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(DEFAULT_BIND_ADDR.to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn log_filter_mentions_crate() {
        assert!(default_log_filter().contains("pii_detector"));
    }

    #[test]
    fn user_rules_path_is_app_scoped() {
        if let Some(path) = user_rules_path() {
            assert!(path.ends_with("pii-detector/rules.json"));
        }
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
