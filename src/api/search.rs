use actix_web::{web, HttpRequest, HttpResponse};

use crate::dto::{SearchReq, SEARCH_PAGE_SIZE};
use crate::error;
use crate::AppState;

/// The whole query string is the search expression, operators included.
pub async fn search_data(state: web::Data<AppState>, req: HttpRequest) -> crate::Result<HttpResponse> {
    log::info!("Received search request.");

    let query = search_expression(req.query_string()).ok_or_else(error::missing_query)?;

    let resp = state
        .index
        .search(SearchReq::first_page(query))
        .await
        .map_err(error::search_failed)?;
    if let Some(total) = resp.total_count {
        log::debug!("{} documents match", total);
    }

    let mut docs = resp.docs;
    docs.truncate(SEARCH_PAGE_SIZE);
    Ok(HttpResponse::Ok().json(docs))
}

/// Percent-escapes are decoded; `+` is left alone since it is a search operator.
fn search_expression(raw: &str) -> Option<String> {
    let raw = raw.trim_start_matches('?');
    let decoded = urlencoding::decode(raw)
        .map(|query| query.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    let query = decoded.trim();
    if query.is_empty() {
        None
    } else {
        Some(query.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::test::{call_service, init_service, read_body, TestRequest};
    use actix_web::{web, App};
    use serde_json::{json, Value};

    use super::search_expression;
    use crate::api::config_routes;
    use crate::dto::SearchReq;
    use crate::test::{doc, make_test_state, RecordingIndex, RecordingTable};

    async fn get_search(index: Arc<RecordingIndex>, uri: &str) -> (StatusCode, Vec<u8>) {
        let state = make_test_state(Arc::new(RecordingTable::default()), index);
        let app = init_service(App::new().app_data(web::Data::new(state)).configure(config_routes)).await;
        let resp = call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        let status = resp.status();
        (status, read_body(resp).await.to_vec())
    }

    #[test]
    fn expression_is_the_raw_query() {
        assert_eq!(search_expression("widget").as_deref(), Some("widget"));
        assert_eq!(search_expression("?widget").as_deref(), Some("widget"));
        assert_eq!(search_expression("red%20widget").as_deref(), Some("red widget"));
        assert_eq!(search_expression("name:widget+-blue").as_deref(), Some("name:widget+-blue"));
        assert_eq!(search_expression("q=widget&x=1").as_deref(), Some("q=widget&x=1"));
        assert_eq!(search_expression("%FF").as_deref(), Some("%FF"));
        assert_eq!(search_expression(""), None);
        assert_eq!(search_expression("%20%20"), None);
    }

    #[actix_rt::test]
    async fn forwards_query_with_page_size_and_count() {
        let index = Arc::new(RecordingIndex::with_hits(vec![doc(json!({"id": "42", "name": "widget"}))]));

        let (status, body) = get_search(index.clone(), "/search?widget").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(index.queries(), vec![SearchReq::first_page("widget".to_string())]);
        assert_eq!(index.queries()[0].size, 10);
        assert!(index.queries()[0].include_total_count);

        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!([{"score": 1.0, "doc": {"id": "42", "name": "widget"}}]));
    }

    #[actix_rt::test]
    async fn returns_at_most_ten_documents() {
        let hits = (0..25).map(|i| doc(json!({"id": i.to_string()}))).collect();
        let index = Arc::new(RecordingIndex::with_hits(hits));

        let (status, body) = get_search(index, "/search?*").await;
        assert_eq!(status, StatusCode::OK);
        let body: Vec<Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.len(), 10);
    }

    #[actix_rt::test]
    async fn no_match_is_an_empty_array() {
        let (status, body) = get_search(Arc::new(RecordingIndex::default()), "/search?nothing").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"[]");
    }

    #[actix_rt::test]
    async fn empty_query_is_bad_request() {
        for uri in ["/search", "/search?", "/search?%20"] {
            let index = Arc::new(RecordingIndex::failing());
            let (status, body) = get_search(index.clone(), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "uri {}", uri);
            assert_eq!(body, b"Query parameter is missing.");
            assert!(index.queries().is_empty());
        }
    }

    #[actix_rt::test]
    async fn service_failure_does_not_leak() {
        let (status, body) = get_search(Arc::new(RecordingIndex::failing()), "/search?widget").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body = String::from_utf8(body).unwrap();
        assert_eq!(body, "An error occurred while performing the search.");
        assert!(!body.contains("search-svc-7f3a"));
    }
}
