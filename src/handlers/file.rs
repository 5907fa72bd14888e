// src/handlers/file.rs

//! Raw file handler
//!
//! Last in the routing chain: streams the requested file from the served
//! directory. Conditional and range requests are handled by
//! `actix_files::NamedFile`.

use std::path::Path;

use actix_files::NamedFile;
use actix_web::{
    http::header::{ContentDisposition, DispositionType},
    HttpRequest, HttpResponse,
};
use log::{debug, info};

use crate::{error::ServerError, router::RequestContext};

/// Streams the file at the resolved path.
///
/// # Arguments
/// * `ctx` - The request being routed
///
/// # Returns
/// * `Ok(HttpResponse)` - The file, with range and conditional support
/// * `Err(ServerError)` - 404 when the file cannot be opened
pub async fn handle_file(ctx: &RequestContext<'_>) -> Result<HttpResponse, ServerError> {
    let path = ctx.root.locate(&ctx.url.relative_path);
    let named_file = open_file(&path, &ctx.url.relative_path).await?;
    info!("Serving file: {}", ctx.url.canonical_url);

    Ok(create_file_response(named_file, ctx.req))
}

async fn open_file(path: &Path, relative_path: &str) -> Result<NamedFile, ServerError> {
    NamedFile::open_async(path).await.map_err(|e| {
        debug!("Unable to open file <(wwwroot)/{}>: {}", relative_path, e);
        ServerError::NotFound("file not found")
    })
}

/// Inline disposition so browsers play media instead of downloading it.
fn create_file_response(file: NamedFile, req: &HttpRequest) -> HttpResponse {
    file.use_last_modified(true)
        .use_etag(true)
        .prefer_utf8(true)
        .set_content_disposition(ContentDisposition {
            disposition: DispositionType::Inline,
            parameters: vec![],
        })
        .into_response(req)
}
