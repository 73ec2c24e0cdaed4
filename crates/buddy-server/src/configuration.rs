use crate::error::{to_env_var, ConfigError};
use buddy::agent::DEFAULT_MAX_TURNS;
use buddy::notifier::PushoverConfig;
use buddy::providers::configs::{
    OpenAiProviderConfig, DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_RETRIES,
    OPENAI_HOST, OPENAI_MODEL,
};
use buddy::registry::UnknownToolPolicy;
use buddy::research::manager::DEFAULT_SEARCH_COUNT;
use config::{Config, Environment};
use serde::Deserialize;
use std::net::{AddrParseError, SocketAddr};

/// Keys that have no default and must be provided
const REQUIRED_FIELDS: &[&str] = &["provider.api_key"];

/// Conventional variables read when the prefixed ones are not set
const FALLBACK_ENV_VARS: &[(&str, &str)] = &[
    ("provider.api_key", "OPENAI_API_KEY"),
    ("notifier.token", "PUSHOVER_TOKEN"),
    ("notifier.user", "PUSHOVER_USER"),
];

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_open_browser")]
    pub open_browser: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            open_browser: default_open_browser(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_openai_host")]
    pub host: String,
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<i32>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

impl ProviderSettings {
    pub fn openai_config(&self) -> OpenAiProviderConfig {
        OpenAiProviderConfig {
            host: self.host.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            max_retries: self.max_retries,
            initial_backoff_ms: self.initial_backoff_ms,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PersonaSettings {
    #[serde(default = "default_persona_name")]
    pub name: String,
    #[serde(default = "default_summary_path")]
    pub summary_path: String,
    #[serde(default = "default_profile_path")]
    pub profile_path: String,
}

impl Default for PersonaSettings {
    fn default() -> Self {
        Self {
            name: default_persona_name(),
            summary_path: default_summary_path(),
            profile_path: default_profile_path(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NotifierSettings {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

impl NotifierSettings {
    /// Pushover credentials, when both halves are configured
    pub fn pushover(&self) -> Option<PushoverConfig> {
        match (&self.token, &self.user) {
            (Some(token), Some(user)) if !token.is_empty() && !user.is_empty() => {
                Some(PushoverConfig::new(token.as_str(), user.as_str()))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    #[serde(default)]
    pub unknown_tool: UnknownToolPolicy,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            unknown_tool: UnknownToolPolicy::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResearchSettings {
    #[serde(default = "default_search_count")]
    pub search_count: usize,
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            search_count: default_search_count(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    #[serde(default)]
    pub persona: PersonaSettings,
    #[serde(default)]
    pub notifier: NotifierSettings,
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub research: ResearchSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("provider.host", default_openai_host())?
            .set_default("provider.model", default_model())?;

        for (key, env_var) in FALLBACK_ENV_VARS {
            if let Ok(value) = std::env::var(env_var) {
                builder = builder.set_default(*key, value)?;
            }
        }

        let config = builder
            .add_source(
                Environment::with_prefix("BUDDY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        match config.try_deserialize::<Self>() {
            Ok(settings) => settings.validate(),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                if let config::ConfigError::NotFound(field) = &err {
                    return Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    });
                }
                match missing_field(&err.to_string()) {
                    Some(field) => Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(&qualify(field)),
                    }),
                    None => Err(ConfigError::Other(err)),
                }
            }
        }
    }

    /// Counts where zero would make every request fail or do nothing
    fn validate(self) -> Result<Self, ConfigError> {
        let counts = [
            ("agent.max_turns", self.agent.max_turns),
            ("research.search_count", self.research.search_count),
        ];
        if let Some((field, _)) = counts.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ZeroNotAllowed {
                env_var: to_env_var(field),
            });
        }
        Ok(self)
    }
}

/// Field name out of a "missing field `name`" message
fn missing_field(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("missing field `")?;
    rest.split('`').next()
}

/// Serde reports missing fields without their section, so find the section from the known
/// required keys
fn qualify(field: &str) -> String {
    if field.contains('.') {
        return field.to_string();
    }
    REQUIRED_FIELDS
        .iter()
        .find(|key| key.rsplit('.').next() == Some(field))
        .map(|key| key.to_string())
        .unwrap_or_else(|| field.to_string())
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7860
}

fn default_open_browser() -> bool {
    true
}

fn default_model() -> String {
    OPENAI_MODEL.to_string()
}

fn default_openai_host() -> String {
    OPENAI_HOST.to_string()
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_initial_backoff_ms() -> u64 {
    DEFAULT_INITIAL_BACKOFF_MS
}

fn default_persona_name() -> String {
    "kapilesh".to_string()
}

fn default_summary_path() -> String {
    "me/summary.txt".to_string()
}

fn default_profile_path() -> String {
    "me/linkedin.pdf".to_string()
}

fn default_max_turns() -> usize {
    DEFAULT_MAX_TURNS
}

fn default_search_count() -> usize {
    DEFAULT_SEARCH_COUNT
}
