use std::collections::HashMap;
use std::net::SocketAddr;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use url::Url;

const APP_NAME: &str = "index_table";

/// Table entities top out at 1 MiB; the search service takes more.
pub const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Variables the functions host exports for the two backing services.
/// They take precedence over the prefixed variables and the config file.
const HOST_SETTINGS: [(&str, &str); 3] = [
    ("storage.connection_string", "AzureWebJobsStorage"),
    ("search.endpoint", "AzureAISearchEndpoint"),
    ("search.api_key", "AzureAISearchApiKey"),
];

#[derive(Debug, Deserialize)]
pub struct Api {
    pub listen: SocketAddr,
    #[serde(default)]
    pub function_key: Option<String>,
    pub max_body_bytes: usize,
}

#[derive(Deserialize)]
pub struct Storage {
    #[serde(default)]
    pub connection_string: String,
    pub table_name: String,
}

#[derive(Deserialize)]
pub struct Search {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    pub index_name: String,
    pub api_version: String,
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub api: Api,
    pub storage: Storage,
    pub search: Search,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(File::with_name("config/default").required(false), None)
    }

    /// Layers defaults, `file`, prefixed environment and host variables.
    /// `env` replaces the process environment when given.
    pub fn load(
        file: File<config::FileSourceFile, config::FileFormat>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let host_env = env.clone().unwrap_or_else(|| std::env::vars().collect());

        let mut builder = Config::builder()
            .set_default("api.listen", "0.0.0.0:7071")?
            .set_default("api.max_body_bytes", DEFAULT_MAX_BODY_BYTES as i64)?
            .set_default("storage.table_name", "dataIndexTable")?
            .set_default("search.index_name", "my-index")?
            .set_default("search.api_version", "2023-11-01")?
            .add_source(file)
            .add_source(
                Environment::with_prefix(APP_NAME)
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            );
        for (key, var) in HOST_SETTINGS {
            builder = builder.set_override_option(key, host_env.get(var).cloned())?;
        }

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require("storage.connection_string", &self.storage.connection_string)?;
        require("search.endpoint", &self.search.endpoint)?;
        require("search.api_key", &self.search.api_key)?;
        require("storage.table_name", &self.storage.table_name)?;
        require("search.index_name", &self.search.index_name)?;

        Url::parse(self.search.endpoint.trim()).map_err(|err| {
            ConfigError::Message(format!("Setting 'search.endpoint' is not a valid URL: {}", err))
        })?;
        Ok(())
    }
}

fn require(key: &str, value: &str) -> Result<(), ConfigError> {
    if !value.trim().is_empty() {
        return Ok(());
    }
    let env_name = format!("{}_{}", APP_NAME, key.replace('.', "__")).to_uppercase();
    let message = match HOST_SETTINGS.iter().find(|(setting, _)| *setting == key) {
        Some((_, host_var)) => format!(
            "Required setting '{}' is missing: set {} or {}",
            key, host_var, env_name
        ),
        None => format!("Required setting '{}' is missing: set {}", key, env_name),
    };
    Err(ConfigError::Message(message))
}

// Secrets stay out of the startup dump.
impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("connection_string", &"<redacted>")
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl std::fmt::Debug for Search {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Search")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("index_name", &self.index_name)
            .field("api_version", &self.api_version)
            .finish()
    }
}
