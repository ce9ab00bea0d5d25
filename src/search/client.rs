use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::{SearchError, SearchIndex};
use crate::dto::{Document, ScoredDocument, SearchReq, SearchResp};

const SCORE_FIELD: &str = "@search.score";
const SEARCH_ANNOTATION_PREFIX: &str = "@search.";

/// REST client for one index of a managed search service.
#[derive(Clone)]
pub struct SearchClient {
    http_client: Client,
    endpoint: Url,
    api_key: String,
    index_name: String,
    api_version: String,
}

#[derive(Serialize)]
struct IndexBatch {
    value: Vec<Document>,
}

#[derive(Deserialize)]
struct IndexBatchResult {
    value: Vec<IndexItemResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexItemResult {
    key: String,
    status: bool,
    error_message: Option<String>,
    status_code: u16,
}

#[derive(Serialize)]
struct SearchApiRequest<'a> {
    search: &'a str,
    top: usize,
    count: bool,
}

#[derive(Deserialize)]
struct SearchApiResponse {
    #[serde(rename = "@odata.count")]
    count: Option<u64>,
    value: Vec<Document>,
}

impl SearchClient {
    pub fn new(
        endpoint: &str,
        api_key: impl Into<String>,
        index_name: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Result<Self, SearchError> {
        let endpoint = Url::parse(endpoint.trim())
            .map_err(|err| SearchError::InvalidConfig(format!("bad endpoint '{}': {}", endpoint, err)))?;
        if endpoint.cannot_be_a_base() {
            return Err(SearchError::InvalidConfig(format!("bad endpoint '{}'", endpoint)));
        }
        Ok(Self {
            http_client: Client::new(),
            endpoint,
            api_key: api_key.into(),
            index_name: index_name.into(),
            api_version: api_version.into(),
        })
    }

    fn docs_url(&self, operation: &str) -> Result<Url, SearchError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| SearchError::InvalidConfig("endpoint cannot be a base URL".into()))?
            .pop_if_empty()
            .extend(["indexes", self.index_name.as_str(), "docs", operation]);
        url.query_pairs_mut().append_pair("api-version", &self.api_version);
        Ok(url)
    }

    async fn post<T: Serialize>(&self, url: Url, body: &T) -> Result<Response, SearchError> {
        log::debug!("POST {}", url);
        let response = self
            .http_client
            .post(url)
            .header("api-key", &self.api_key)
            .json(body)
            .send()
            .await?;
        Ok(response)
    }
}

#[async_trait]
impl SearchIndex for SearchClient {
    async fn upload_documents(&self, docs: Vec<Document>) -> Result<(), SearchError> {
        let value = docs
            .into_iter()
            .map(|doc| {
                let mut action = Document::new();
                action.insert("@search.action".to_string(), Value::from("upload"));
                action.extend(doc);
                action
            })
            .collect();

        let response = self.post(self.docs_url("index")?, &IndexBatch { value }).await?;
        let response = error_for_status(response).await?;

        // 207 Multi-Status still parses; a rejected item is reported per document.
        let result: IndexBatchResult = response
            .json()
            .await
            .map_err(|err| SearchError::InvalidResponse(err.to_string()))?;
        if let Some(failed) = result.value.into_iter().find(|item| !item.status) {
            return Err(SearchError::Rejected {
                key: failed.key,
                status: failed.status_code,
                message: failed.error_message.unwrap_or_default(),
            });
        }
        Ok(())
    }

    async fn search(&self, req: SearchReq) -> Result<SearchResp, SearchError> {
        let body = SearchApiRequest {
            search: &req.query,
            top: req.size,
            count: req.include_total_count,
        };
        let response = self.post(self.docs_url("search")?, &body).await?;
        let response = error_for_status(response).await?;

        let result: SearchApiResponse = response
            .json()
            .await
            .map_err(|err| SearchError::InvalidResponse(err.to_string()))?;

        let docs = result.value.into_iter().map(into_scored).collect::<Vec<_>>();
        log::debug!("Search returned {} of {:?} documents", docs.len(), result.count);

        Ok(SearchResp {
            total_count: result.count,
            docs,
        })
    }

    fn index_name(&self) -> &str {
        &self.index_name
    }
}

/// Splits the service annotations off a hit, keeping only the score.
fn into_scored(mut hit: Document) -> ScoredDocument {
    let score = hit.get(SCORE_FIELD).and_then(Value::as_f64).unwrap_or_default();
    hit.retain(|name, _| !name.starts_with(SEARCH_ANNOTATION_PREFIX));
    ScoredDocument { score, doc: hit }
}

async fn error_for_status(response: Response) -> Result<Response, SearchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);
    Err(SearchError::Api {
        status: status.as_u16(),
        message,
    })
}
