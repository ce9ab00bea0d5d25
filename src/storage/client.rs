use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use reqwest::{header, Client, Method};
use sha2::Sha256;
use url::Url;

use super::{Credentials, StorageAccount, StorageError, TableEntity, TableStore};

type HmacSha256 = Hmac<Sha256>;

const STORAGE_API_VERSION: &str = "2019-02-02";
const JSON_NO_METADATA: &str = "application/json;odata=nometadata";

/// Table storage REST client bound to one table.
#[derive(Clone)]
pub struct TableClient {
    http_client: Client,
    account: StorageAccount,
    table_name: String,
}

impl TableClient {
    pub fn new(account: StorageAccount, table_name: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            account,
            table_name: table_name.into(),
        }
    }

    fn entity_url(&self, entity: &TableEntity) -> Result<Url, StorageError> {
        let mut url = self.account.table_endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| StorageError::InvalidRequest("table endpoint cannot be a base URL".into()))?
            .pop_if_empty()
            .push(&format!("{}({})", self.table_name, entity.key_predicate()));
        if let Credentials::SasToken(sas) = &self.account.credentials {
            url.set_query(Some(sas));
        }
        Ok(url)
    }
}

#[async_trait]
impl TableStore for TableClient {
    async fn insert_or_merge(&self, entity: TableEntity) -> Result<(), StorageError> {
        let url = self.entity_url(&entity)?;
        let method = Method::from_bytes(b"MERGE").map_err(|err| StorageError::InvalidRequest(err.to_string()))?;
        let date = chrono::Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();

        log::debug!("MERGE {}", url.path());

        let mut request = self
            .http_client
            .request(method, url.clone())
            .header("x-ms-date", &date)
            .header("x-ms-version", STORAGE_API_VERSION)
            .header("DataServiceVersion", "3.0;NetFx")
            .header("MaxDataServiceVersion", "3.0;NetFx")
            .header(header::ACCEPT, JSON_NO_METADATA)
            .json(&entity.to_odata());
        if let Credentials::SharedKey { account, key } = &self.account.credentials {
            let signature = sign_shared_key_lite(key, &date, &canonical_resource(account, &url))?;
            request = request.header(header::AUTHORIZATION, format!("SharedKeyLite {}:{}", account, signature));
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(StorageError::Api {
            status: status.as_u16(),
            message: odata_error_message(&body).unwrap_or(body),
        })
    }

    fn table_name(&self) -> &str {
        &self.table_name
    }
}

/// `/{account}{path}`; for path-style endpoints the account appears twice.
fn canonical_resource(account: &str, url: &Url) -> String {
    format!("/{}{}", account, url.path())
}

fn sign_shared_key_lite(key: &[u8], date: &str, resource: &str) -> Result<String, StorageError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|err| StorageError::InvalidRequest(err.to_string()))?;
    mac.update(format!("{}\n{}", date, resource).as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn odata_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let message = value.pointer("/odata.error/message/value")?.as_str()?;
    Some(message.to_string())
}
