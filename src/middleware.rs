// src/middleware.rs

//! Response header and method middleware.
//!
//! Wrapped around the single catch-all route in [`crate::routes::create_app`].

use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    http::{
        header::{self, HeaderMap, HeaderValue},
        Method,
    },
    middleware::{DefaultHeaders, Next},
    web, Error, HttpResponse,
};
use log::debug;

use crate::config::AppConfig;

pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";
pub const CORS_ALLOWED_HEADERS: &str = "Range, If-Modified-Since";
pub const VARY: &str = "Origin, Range, If-Modified-Since";

/// `Server` and `Vary` on every response.
pub fn server_headers(config: &AppConfig) -> DefaultHeaders {
    DefaultHeaders::new()
        .add((header::SERVER, config.server_header()))
        .add((header::VARY, VARY))
}

/// Echoes CORS headers for allowed origins. `OPTIONS` never reaches the
/// router: it is answered with 204 whether or not the origin was allowed.
pub async fn cors(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let allowed_origin = req
        .app_data::<web::Data<AppConfig>>()
        .and_then(|config| {
            let origin = req.headers().get(header::ORIGIN)?;
            let origin_str = origin.to_str().ok()?;
            config
                .is_allowed_origin(origin_str)
                .then(|| (origin.clone(), config.cors_max_age()))
        });

    if req.method() == Method::OPTIONS {
        debug!("Answering preflight for: {}", req.path());
        let mut res = req.into_response(HttpResponse::NoContent().finish());
        if let Some((origin, max_age)) = allowed_origin {
            apply_cors_headers(res.headers_mut(), origin, max_age);
        }
        return Ok(res);
    }

    let mut res = next.call(req).await?.map_into_boxed_body();
    if let Some((origin, max_age)) = allowed_origin {
        apply_cors_headers(res.headers_mut(), origin, max_age);
    }
    Ok(res)
}

fn apply_cors_headers(headers: &mut HeaderMap, origin: HeaderValue, max_age: &'static str) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOWED_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(max_age),
    );
}

/// Read-only server: anything but GET, HEAD and OPTIONS is refused.
pub async fn allowed_methods(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    match *req.method() {
        Method::GET | Method::HEAD | Method::OPTIONS => {
            Ok(next.call(req).await?.map_into_boxed_body())
        }
        _ => {
            debug!("Refusing {} {}", req.method(), req.path());
            Ok(req.into_response(
                HttpResponse::MethodNotAllowed()
                    .insert_header((header::ALLOW, ALLOWED_METHODS))
                    .finish(),
            ))
        }
    }
}
