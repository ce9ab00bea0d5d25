use actix_web::{dev::ServiceRequest, web};
use actix_web_httpauth::extractors::{
    bearer::{BearerAuth, Config},
    AuthenticationError,
};
use subtle::ConstantTimeEq;

use crate::AppState;

pub const FUNCTION_KEY_HEADER: &str = "x-functions-key";

/// Admits a request carrying the configured function key, either in the
/// `x-functions-key` header or as a bearer token.
pub async fn function_key_validator(
    req: ServiceRequest,
    creds: Option<BearerAuth>,
) -> Result<ServiceRequest, (actix_web::Error, ServiceRequest)> {
    let presented = req
        .headers()
        .get(FUNCTION_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .or_else(|| creds.as_ref().map(|creds| creds.token()));

    let valid = match (
        req.app_data::<web::Data<AppState>>()
            .and_then(|state| state.api.function_key.as_deref()),
        presented,
    ) {
        (Some(expected), Some(presented)) if !expected.is_empty() => {
            expected.as_bytes().ct_eq(presented.trim().as_bytes()).into()
        }
        _ => false,
    };

    if valid {
        Ok(req)
    } else {
        log::debug!("Rejected request to {} with a bad function key", req.path());
        let config = req
            .app_data::<Config>()
            .cloned()
            .unwrap_or_default();
        Err((AuthenticationError::from(config).into(), req))
    }
}
