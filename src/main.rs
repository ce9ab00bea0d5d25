mod api;
mod config;
mod dto;
mod error;
mod search;
mod storage;
#[cfg(test)]
mod test;

use std::sync::Arc;

use anyhow::Context;

use crate::config::AppConfig;
use crate::search::{SearchClient, SearchIndex};
use crate::storage::{StorageAccount, TableClient, TableStore};

pub use crate::error::Error;
pub type Result<T, E = crate::error::Error> = std::result::Result<T, E>;

pub struct AppState {
    pub api: config::Api,
    pub table: Arc<dyn TableStore>,
    pub index: Arc<dyn SearchIndex>,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let AppConfig { api, storage, search } = config;

        let account = StorageAccount::parse(&storage.connection_string)
            .context("Setting 'storage.connection_string' (AzureWebJobsStorage) is unusable")?;
        let table = TableClient::new(account, storage.table_name);
        let index = SearchClient::new(&search.endpoint, search.api_key, search.index_name, search.api_version)
            .context("Setting 'search.endpoint' (AzureAISearchEndpoint) is unusable")?;

        Ok(Self {
            api,
            table: Arc::new(table),
            index: Arc::new(index),
        })
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    let config = AppConfig::new().context("Invalid configuration")?;
    log::debug!("App config:\n{:#?}", &config);
    log::info!("API server at http://{}", config.api.listen);

    let state = AppState::from_config(config)?;
    log::info!(
        "Writing to table '{}', indexing into '{}'",
        state.table.table_name(),
        state.index.index_name()
    );
    api::run_server(state).await?;
    Ok(())
}
