// src/error.rs

//! Error types.
//!
//! [`ServerError`] is what request handlers return; it knows how to turn
//! itself into an XML error document. [`ConfigError`] only exists before the
//! server starts and is fatal.

use actix_web::{
    http::{header, StatusCode},
    HttpResponse, ResponseError,
};
use log::error;
use thiserror::Error;

use crate::handlers::types::ErrorResponse;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid url")]
    InvalidRequestPath,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{message}")]
    MethodNotAllowed {
        message: &'static str,
        allow: &'static str,
    },

    #[error("{context}: {detail}")]
    Render {
        context: &'static str,
        detail: String,
    },
}

impl ServerError {
    pub fn render(context: &'static str, detail: impl ToString) -> Self {
        ServerError::Render {
            context,
            detail: detail.to_string(),
        }
    }

    /// Message exposed to the client. Render failures keep their detail in
    /// the log only.
    fn public_message(&self) -> String {
        match self {
            ServerError::Render { context, .. } => format!("{}: server error", context),
            other => other.to_string(),
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::InvalidRequestPath | ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ServerError::Render { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Server error in handler: {}", self);
        }

        let mut builder = HttpResponse::build(status);
        if let ServerError::MethodNotAllowed { allow, .. } = self {
            builder.insert_header((header::ALLOW, *allow));
        }

        match ErrorResponse::new(self.public_message()).to_xml() {
            Ok(body) => builder
                .content_type("application/xml; charset=utf-8")
                .body(body),
            Err(e) => {
                error!("Unable to marshal error response: {}", e);
                builder.finish()
            }
        }
    }
}

/// Startup failures. These abort the process before it serves anything.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("unable to open root path <{path}>: {source}")]
    RootPath {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("root path <{0}> is not a directory")]
    RootNotDirectory(String),
}

impl ConfigError {
    pub fn invalid(key: &'static str, value: &str) -> Self {
        ConfigError::Invalid {
            key,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn invalid_path_is_404_with_xml_body() {
        let response = ServerError::InvalidRequestPath.error_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body()).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("<Message>invalid url</Message>"));
    }

    #[test]
    fn method_not_allowed_sets_allow_header() {
        let response = ServerError::MethodNotAllowed {
            message: "player: method not allowed",
            allow: "GET",
        }
        .error_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "GET");
    }

    #[actix_web::test]
    async fn render_failure_hides_detail() {
        let response = ServerError::render("xml", "template exploded").error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body()).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("<Message>xml: server error</Message>"));
        assert!(!body.contains("exploded"));
    }
}
