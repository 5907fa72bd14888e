// src/routes.rs

//! Route configuration for the file server.
//! Every request lands on one catch-all service; [`crate::router::dispatch`]
//! decides what answers it.

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    middleware::{from_fn, Logger},
    web, App,
};

use crate::{config::AppConfig, middleware, root_fs::RootFs, router};

/// Configures all routes for the web server.
///
/// # Routes
/// - `/?_/player/<path>` - Player page for a media file
/// - `/?_/<asset>` - Embedded UI assets
/// - `/<dir>/` - Bucket listing of a directory
/// - `/<file>` - Raw file
pub fn setup_routes(cfg: &mut web::ServiceConfig) {
    cfg.default_service(web::to(router::dispatch));
}

/// Builds the application with shared state and the middleware stack.
///
/// Middleware order, outermost first: access log, default headers, CORS,
/// method gate.
pub fn create_app(
    config: web::Data<AppConfig>,
    root: web::Data<RootFs>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let headers = middleware::server_headers(&config);
    App::new()
        .app_data(config)
        .app_data(root)
        .configure(setup_routes)
        .wrap(from_fn(middleware::allowed_methods))
        .wrap(from_fn(middleware::cors))
        .wrap(headers)
        .wrap(Logger::default())
}
