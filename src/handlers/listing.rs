// src/handlers/listing.rs

//! Directory listing handler
//!
//! Claims any request whose path is a directory and answers it with an
//! S3-style bucket listing. Directory URLs must end in `/` so that relative
//! links in the rendered page resolve; requests without it are redirected.

use actix_web::{http::header, web, HttpResponse};
use log::{debug, info};

use crate::{
    assets,
    directory_browser::{self, RenderOptions},
    error::ServerError,
    router::RequestContext,
    url,
};

/// Handles requests for directories.
///
/// # Arguments
/// * `ctx` - The request being routed
///
/// # Returns
/// * `None` - The path does not exist or is not a directory
/// * `Some(Ok(HttpResponse))` - A 307 to the trailing-slash URL, or the
///   XML listing
/// * `Some(Err(ServerError))` - The directory could not be listed or rendered
pub async fn handle_listing(ctx: &RequestContext<'_>) -> Option<Result<HttpResponse, ServerError>> {
    let path = ctx.root.locate(&ctx.url.relative_path);
    let metadata = match tokio::fs::metadata(&path).await {
        Ok(metadata) => metadata,
        Err(e) => {
            debug!("Unable to stat <(wwwroot)/{}>: {}", ctx.url.relative_path, e);
            return None;
        }
    };
    if !metadata.is_dir() {
        return None;
    }

    if !ctx.req.path().ends_with('/') {
        let location = directory_url(&ctx.url.canonical_url);
        debug!("Redirecting to trailing slash URL: {} -> {}", ctx.req.path(), location);
        return Some(Ok(HttpResponse::TemporaryRedirect()
            .insert_header((header::LOCATION, location))
            .finish()));
    }

    Some(render_listing(ctx).await)
}

fn directory_url(canonical_url: &str) -> String {
    if canonical_url == "/" {
        return canonical_url.to_string();
    }
    format!("{}/", url::encode_path(canonical_url))
}

async fn render_listing(ctx: &RequestContext<'_>) -> Result<HttpResponse, ServerError> {
    info!("Listing directory: {}", ctx.url.canonical_url);

    let root = ctx.root.clone();
    let bucket_name = ctx.config.server_name.clone();
    let canonical_url = ctx.url.canonical_url.clone();
    let relative_path = ctx.url.relative_path.clone();
    let listing = web::block(move || {
        directory_browser::build_listing(&root, &bucket_name, &canonical_url, &relative_path)
    })
    .await
    .map_err(|e| ServerError::render("xml", e))?
    .map_err(|e| ServerError::render("xml", e))?;

    let stylesheet = if ctx.config.xml_stylesheet {
        Some(assets::listing_stylesheet().map_err(|e| ServerError::render("xml", e))?)
    } else {
        None
    };
    let options = RenderOptions {
        indent: ctx.config.xml_indent,
        stylesheet,
    };
    let body = listing
        .to_xml(&options)
        .map_err(|e| ServerError::render("xml", e))?;

    Ok(HttpResponse::Ok()
        .content_type("application/xml; charset=utf-8")
        .body(body))
}
