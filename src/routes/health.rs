use actix_web::{Responder, get};

#[get("/health")]
pub async fn health_handler() -> impl Responder {
    "OK"
}
