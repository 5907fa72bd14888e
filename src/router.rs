// src/router.rs

//! Content routing.
//!
//! A single catch-all service resolves the request path and offers the
//! request to each handler in a fixed order. The first handler that claims
//! the request answers it, whether it succeeds or not:
//!
//! 1. player page (`/?_/player/<path>`)
//! 2. embedded assets (`/?_/<asset>`)
//! 3. directory listing
//! 4. raw file

use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
};

use actix_web::{
    body::{BodySize, MessageBody},
    http::Method,
    web::{self, Bytes},
    HttpRequest, HttpResponse,
};
use log::debug;
use percent_encoding::percent_decode_str;

use crate::{
    config::AppConfig,
    error::ServerError,
    handlers::{asset, file, listing, player},
    root_fs::RootFs,
    url::{self, ResolvedUrl},
};

/// Everything a handler needs to answer one request.
pub struct RequestContext<'a> {
    pub req: &'a HttpRequest,
    pub config: &'a AppConfig,
    pub root: &'a RootFs,
    pub url: &'a ResolvedUrl,
}

/// Answers every request that reaches the app.
///
/// Percent-decodes and resolves the request path, then hands the request to
/// the first handler that claims it. HEAD requests get the same status and
/// headers as GET, without the body.
///
/// # Arguments
/// * `req` - The incoming request
/// * `config` - Shared process configuration
/// * `root` - The served directory tree
///
/// # Returns
/// * `Ok(HttpResponse)` - The response of the handler that claimed the request
/// * `Err(ServerError)` - An unsafe path, or the claiming handler's failure
pub async fn dispatch(
    req: HttpRequest,
    config: web::Data<AppConfig>,
    root: web::Data<RootFs>,
) -> Result<HttpResponse, ServerError> {
    let raw_path = percent_decode_str(req.path())
        .decode_utf8()
        .map_err(|_| ServerError::InvalidRequestPath)?;
    let url = url::resolve(&raw_path);
    if !url.valid {
        return Err(ServerError::InvalidRequestPath);
    }

    let ctx = RequestContext {
        req: &req,
        config: &config,
        root: &root,
        url: &url,
    };

    let response = route(&ctx).await?;
    if req.method() == Method::HEAD {
        return Ok(without_body(response));
    }
    Ok(response)
}

async fn route(ctx: &RequestContext<'_>) -> Result<HttpResponse, ServerError> {
    if let Some(response) = player::handle_player(ctx).await {
        debug!("Request handled by: player");
        return response;
    }

    if let Some(response) = asset::handle_asset(ctx) {
        debug!("Request handled by: vfs");
        return response;
    }

    if let Some(response) = listing::handle_listing(ctx).await {
        debug!("Request handled by: xml");
        return response;
    }

    debug!("Request handled by: file");
    file::handle_file(ctx).await
}

/// Swaps a sized body for one that keeps its length but yields no bytes, so
/// `Content-Length` still describes the GET response.
fn without_body(response: HttpResponse) -> HttpResponse {
    let size = response.body().size();
    match size {
        BodySize::Sized(len) => response.set_body(HeadBody(len)).map_into_boxed_body(),
        _ => response,
    }
}

struct HeadBody(u64);

impl MessageBody for HeadBody {
    type Error = Infallible;

    fn size(&self) -> BodySize {
        BodySize::Sized(self.0)
    }

    fn poll_next(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Bytes, Self::Error>>> {
        Poll::Ready(None)
    }
}
