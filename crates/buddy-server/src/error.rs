use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration: set the {env_var} environment variable")]
    MissingEnvVar { env_var: String },
    #[error("Invalid configuration: {env_var} must be at least 1")]
    ZeroNotAllowed { env_var: String },
    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Environment variable that sets the configuration key `field`, e.g. `provider.api_key`
pub fn to_env_var(field: &str) -> String {
    format!("BUDDY_{}", field.replace('.', "__").to_uppercase())
}
