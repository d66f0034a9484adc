use actix_web::{HttpRequest, HttpResponse, Responder, post, web};

use super::{AUTH_REQUEST_HEADER, ErrorResponse, ErrorResponseWithMessage, invalid_argument};
use crate::sandbox::{CodeSandbox, ExecuteCodeRequest, SandboxError};

/// Expected value of the auth header, `None` disables the check
#[derive(Debug, Clone, Default)]
pub struct AuthToken(pub Option<String>);

impl AuthToken {
    fn accepts(&self, req: &HttpRequest) -> bool {
        let Some(expected) = &self.0 else {
            return true;
        };
        req.headers()
            .get(AUTH_REQUEST_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == expected)
    }
}

/// Runs one submission
///
/// The body is taken as raw bytes and parsed only after the auth header has been
/// checked, so an unauthenticated caller learns nothing about the request shape.
#[post("/executeCode")]
pub async fn execute_code_handler(
    req: HttpRequest,
    sandbox: web::Data<dyn CodeSandbox>,
    auth: web::Data<AuthToken>,
    payload: web::Bytes,
) -> impl Responder {
    if !auth.accepts(&req) {
        log::warn!("Rejected executeCode request with missing or wrong auth header");
        return HttpResponse::Unauthorized().json(ErrorResponse {
            reason: "ERR_UNAUTHORIZED",
            code: 7,
        });
    }

    let body: ExecuteCodeRequest = match serde_json::from_slice(&payload) {
        Ok(body) => body,
        Err(e) => {
            log::info!("Malformed executeCode body: {e}");
            return invalid_argument();
        }
    };

    log::debug!(
        "Executing {} submission with {} inputs",
        body.language,
        body.input_list.len()
    );

    match sandbox.execute_code(&body).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(SandboxError::UnsupportedLanguage(language)) => {
            log::info!("Unsupported language {language}");
            HttpResponse::NotFound().json(ErrorResponse {
                reason: "ERR_NOT_FOUND",
                code: 3,
            })
        }
        Err(e) => {
            log::error!("Sandbox failed to execute submission: {e}");
            HttpResponse::InternalServerError().json(ErrorResponseWithMessage {
                reason: "ERR_INTERNAL",
                code: 6,
                message: e.to_string(),
            })
        }
    }
}
