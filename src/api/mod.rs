mod auth;
mod search;
mod update;

use actix_cors::Cors;
use actix_web::middleware::{Condition, Logger};
use actix_web::{web, App, HttpResponse, HttpServer};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde_json::json;

use crate::config::Api;
use crate::AppState;
use auth::function_key_validator;
use search::search_data;
use update::update_data;

pub async fn run_server(state: AppState) -> std::io::Result<()> {
    let state = web::Data::new(state);
    let key_required = state.api.function_key.as_deref().map_or(false, |key| !key.is_empty());
    if !key_required {
        log::warn!("No function key configured, endpoints are open");
    }

    HttpServer::new({
        let state = state.clone();
        move || {
            App::new()
                .wrap(Condition::new(
                    key_required,
                    HttpAuthentication::with_fn(function_key_validator),
                ))
                .wrap(Logger::default())
                .wrap(Cors::permissive())
                .app_data(state.clone())
                .app_data(payload_config(&state.api))
                .configure(config_routes)
        }
    })
    .bind(state.api.listen)?
    .run()
    .await
}

/// Raises the 256 KiB body default; size limits are left to the backing services.
pub(crate) fn payload_config(api: &Api) -> web::PayloadConfig {
    web::PayloadConfig::new(api.max_body_bytes)
}

pub(crate) fn config_routes(conf: &mut web::ServiceConfig) {
    conf.service(web::resource("/").route(web::get().to(status)))
        .service(web::resource("/update").route(web::post().to(update_data)))
        .service(web::resource("/search").route(web::get().to(search_data)));
}

async fn status(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "table": state.table.table_name(),
        "index": state.index.index_name(),
    }))
}
