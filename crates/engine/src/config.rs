use std::{env, fmt::Display, str::FromStr, time::Duration};

use anyhow::{Context, Result, anyhow};
use tracing::info;

pub const DEFAULT_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_SUGGESTIONS_TABLE: &str = "suggestions";

pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "https://www.justmicho.com",
    "https://justmicho.com",
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:5173",
];

/// Everything the proxy needs from the outside world, resolved once at start-up.
#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub chat: ChatUpstream,
    pub suggestions: SuggestionsUpstream,
    pub allowed_origins: Vec<String>,
    pub upstream_timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct ChatUpstream {
    pub url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Clone, Debug)]
pub struct SuggestionsUpstream {
    pub base_url: String,
    pub api_key: String,
    pub table: String,
}

impl SuggestionsUpstream {
    pub fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), self.table)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup, so tests never touch the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let loader = Loader { lookup };

        let allowed_origins = match loader.optional("ALLOWED_ORIGINS") {
            Some(list) => parse_origins(&list),
            None => DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        Ok(Self {
            host: loader.or_default("HOST", "0.0.0.0".to_string()),
            port: loader.parsed("PORT", 3000)?,
            chat: ChatUpstream {
                url: loader.or_default("OPENAI_API_URL", DEFAULT_CHAT_URL.to_string()),
                api_key: loader.required("OPENAI_API_KEY")?,
                model: loader.or_default("OPENAI_MODEL", DEFAULT_MODEL.to_string()),
            },
            suggestions: SuggestionsUpstream {
                base_url: loader.required("SUPABASE_URL")?,
                api_key: loader.required("SUPABASE_ANON_KEY")?,
                table: loader.or_default("SUPABASE_TABLE", DEFAULT_SUGGESTIONS_TABLE.to_string()),
            },
            allowed_origins,
            upstream_timeout: Duration::from_secs(loader.parsed("UPSTREAM_TIMEOUT_SECS", 60)?),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

struct Loader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Loader<F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.optional(key)
            .ok_or_else(|| anyhow!("Environment variable {key} is required"))
    }

    fn or_default(&self, key: &str, default: String) -> String {
        self.optional(key).unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default
        })
    }

    fn parsed<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr + Display,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.optional(key) {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("Invalid {key} value: {raw}")),
            None => {
                info!("{key} not set, using default: {default}");
                Ok(default)
            }
        }
    }
}

fn parse_origins(list: &str) -> Vec<String> {
    list.split(',')
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("OPENAI_API_KEY", "sk-test"),
        ("SUPABASE_URL", "https://db.example.co/"),
        ("SUPABASE_ANON_KEY", "anon"),
    ];

    #[test]
    fn defaults_apply_when_only_secrets_are_set() {
        let config = Config::from_lookup(lookup(REQUIRED)).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.chat.url, DEFAULT_CHAT_URL);
        assert_eq!(config.chat.model, "gpt-4o-mini");
        assert_eq!(config.suggestions.endpoint(), "https://db.example.co/rest/v1/suggestions");
        assert_eq!(config.allowed_origins.len(), DEFAULT_ALLOWED_ORIGINS.len());
        assert_eq!(config.upstream_timeout, Duration::from_secs(60));
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap_err();
        assert!(err.to_string().contains("SUPABASE_URL"));
    }

    #[test]
    fn bad_port_is_an_error() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "eighty"));

        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(err.to_string().contains("Invalid PORT value"));
    }

    #[test]
    fn origins_override_is_split_and_trimmed() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("ALLOWED_ORIGINS", " https://a.example/ , ,http://b.example:8080"));

        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example".to_string(), "http://b.example:8080".to_string()]
        );
    }
}
