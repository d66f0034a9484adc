use std::sync::Arc;

use actix_web::{App, HttpServer, dev::Server, middleware, web};

use crate::config::ServerConfig;
use crate::routes::{AuthToken, configure_routes};
use crate::sandbox::CodeSandbox;

pub fn build_server(
    server_config: ServerConfig,
    sandbox: Arc<dyn CodeSandbox>,
) -> std::io::Result<Server> {
    let ServerConfig {
        bind_address,
        bind_port,
        auth_token,
    } = server_config;

    if auth_token.is_none() {
        log::warn!("No auth token configured, executeCode accepts every caller");
    }

    let sandbox = web::Data::from(sandbox);
    let auth_token = web::Data::new(AuthToken(auth_token));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(sandbox.clone())
            .app_data(auth_token.clone())
            .wrap(middleware::Logger::default())
            .configure(configure_routes)
    })
    .bind((
        bind_address.unwrap_or("127.0.0.1".to_string()),
        bind_port.unwrap_or(12345),
    ))?
    .run();

    Ok(server)
}
