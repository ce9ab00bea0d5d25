use std::fmt;

use anyhow::anyhow;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};

const INVALID_PAYLOAD: &str = "Invalid or empty data provided.";
const MISSING_QUERY: &str = "Query parameter is missing.";
const UPDATE_FAILED: &str = "An error occurred while processing your request.";
const SEARCH_FAILED: &str = "An error occurred while performing the search.";

/// Handler error. The caller only ever sees `message`; `err` goes to the log.
#[derive(Debug)]
pub struct Error {
    status_code: StatusCode,
    message: &'static str,
    err: anyhow::Error,
}

impl Error {
    fn internal(message: &'static str, err: anyhow::Error) -> Self {
        Self {
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
            message,
            err,
        }
    }
    fn bad_request(message: &'static str, err: anyhow::Error) -> Self {
        Self {
            status_code: StatusCode::BAD_REQUEST,
            message,
            err,
        }
    }
}

pub fn invalid_payload<E: Into<anyhow::Error>>(err: E) -> Error {
    Error::bad_request(INVALID_PAYLOAD, err.into())
}
pub fn empty_payload() -> Error {
    Error::bad_request(INVALID_PAYLOAD, anyhow!("Request body is empty"))
}
pub fn missing_query() -> Error {
    Error::bad_request(MISSING_QUERY, anyhow!("Search request without a query string"))
}
pub fn update_failed<E: Into<anyhow::Error>>(err: E) -> Error {
    Error::internal(UPDATE_FAILED, err.into())
}
pub fn search_failed<E: Into<anyhow::Error>>(err: E) -> Error {
    Error::internal(SEARCH_FAILED, err.into())
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:#}", self.message, self.err)
    }
}

impl<E: Into<anyhow::Error> + Send> From<E> for Error {
    fn from(err: E) -> Self {
        Self::internal(UPDATE_FAILED, err.into())
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        self.status_code
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            log::error!("An error occurred: {:#}", self.err);
        } else {
            log::warn!("Rejected request: {:#}", self.err);
        }
        HttpResponse::build(status_code)
            .content_type("text/plain; charset=utf-8")
            .body(self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::MessageBody;

    fn body_of(resp: HttpResponse) -> String {
        let bytes = resp.into_body().try_into_bytes().unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn server_errors_hide_details() {
        let err = search_failed(anyhow!("connection refused by 10.0.0.4"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(err.error_response());
        assert_eq!(body, SEARCH_FAILED);
        assert!(!body.contains("10.0.0.4"));
    }

    #[test]
    fn client_errors_are_bad_request() {
        let err = invalid_payload(serde_json::from_str::<serde_json::Value>("{").unwrap_err());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(err.error_response()), INVALID_PAYLOAD);

        assert_eq!(body_of(missing_query().error_response()), MISSING_QUERY);
    }

    #[test]
    fn foreign_errors_become_internal() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, UPDATE_FAILED);
        assert!(err.to_string().contains("disk"));
    }
}
