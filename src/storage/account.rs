use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine};
use url::Url;

use super::StorageError;

const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_TABLE_ENDPOINT: &str = "http://127.0.0.1:10002/devstoreaccount1";
const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

#[derive(Clone)]
pub enum Credentials {
    SharedKey { account: String, key: Vec<u8> },
    SasToken(String),
}

/// Table endpoint and credentials parsed from a `Key=Value;...` connection string.
#[derive(Clone)]
pub struct StorageAccount {
    pub table_endpoint: Url,
    pub credentials: Credentials,
}

impl StorageAccount {
    pub fn parse(connection_string: &str) -> Result<Self, StorageError> {
        let settings = connection_string
            .split(';')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                pair.split_once('=')
                    .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim()))
                    .ok_or_else(|| invalid(format!("'{}' is not a Key=Value pair", pair)))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        if settings
            .get("usedevelopmentstorage")
            .map_or(false, |v| v.eq_ignore_ascii_case("true"))
        {
            return Self::development();
        }

        let account_name = settings.get("accountname").copied();
        let credentials = match (account_name, settings.get("accountkey"), settings.get("sharedaccesssignature")) {
            (Some(account), Some(key), _) => Credentials::SharedKey {
                account: account.to_string(),
                key: STANDARD
                    .decode(key)
                    .map_err(|err| invalid(format!("AccountKey is not base64: {}", err)))?,
            },
            (_, _, Some(sas)) => Credentials::SasToken(sas.trim_start_matches('?').to_string()),
            _ => return Err(invalid("AccountName/AccountKey or SharedAccessSignature required")),
        };

        let table_endpoint = match (settings.get("tableendpoint"), account_name) {
            (Some(endpoint), _) => parse_endpoint(endpoint)?,
            (None, Some(account)) => {
                let protocol = settings.get("defaultendpointsprotocol").copied().unwrap_or("https");
                let suffix = settings.get("endpointsuffix").copied().unwrap_or(DEFAULT_ENDPOINT_SUFFIX);
                parse_endpoint(&format!("{}://{}.table.{}", protocol, account, suffix))?
            }
            (None, None) => return Err(invalid("TableEndpoint or AccountName required")),
        };

        Ok(Self {
            table_endpoint,
            credentials,
        })
    }

    fn development() -> Result<Self, StorageError> {
        Ok(Self {
            table_endpoint: parse_endpoint(DEV_TABLE_ENDPOINT)?,
            credentials: Credentials::SharedKey {
                account: DEV_ACCOUNT_NAME.to_string(),
                key: STANDARD
                    .decode(DEV_ACCOUNT_KEY)
                    .map_err(|err| invalid(err.to_string()))?,
            },
        })
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, StorageError> {
    let url = Url::parse(endpoint).map_err(|err| invalid(format!("bad endpoint '{}': {}", endpoint, err)))?;
    if url.cannot_be_a_base() {
        return Err(invalid(format!("bad endpoint '{}'", endpoint)));
    }
    Ok(url)
}

fn invalid(msg: impl Into<String>) -> StorageError {
    StorageError::InvalidConnectionString(msg.into())
}
