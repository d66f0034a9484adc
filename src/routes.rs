mod execute;
mod health;

pub use execute::{AuthToken, execute_code_handler};
pub use health::health_handler;

use actix_web::{HttpResponse, web};
use serde::Serialize;

/// Header carrying the shared secret of the calling service
pub const AUTH_REQUEST_HEADER: &str = "auth";

/// Largest accepted request body, in bytes
const PAYLOAD_LIMIT: usize = 1 << 20;

#[derive(Serialize)]
struct ErrorResponse {
    reason: &'static str,
    code: u32,
}

#[derive(Serialize)]
struct ErrorResponseWithMessage {
    reason: &'static str,
    code: u32,
    message: String,
}

fn invalid_argument() -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        reason: "ERR_INVALID_ARGUMENT",
        code: 1,
    })
}

/// Registers every route together with the request body limit
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(PAYLOAD_LIMIT))
        .service(health_handler)
        .service(execute_code_handler);
}
