// src/handlers/asset.rs

//! Embedded asset handler
//!
//! Serves the bundled UI files under `/?_/<asset>`. The query route keeps the
//! UI independent of wherever the server is mounted, and never touches the
//! served directory tree.

use actix_web::HttpResponse;
use log::debug;
use percent_encoding::percent_decode_str;

use crate::{assets, error::ServerError, router::RequestContext};

pub const ASSET_ROUTE_PREFIX: &str = "_/";

/// Handles embedded asset requests.
///
/// Claims root requests whose query starts with `_/`. The served directory
/// is never consulted, so a real file with the same name cannot shadow an
/// asset.
///
/// # Arguments
/// * `ctx` - The request being routed
///
/// # Returns
/// * `None` - The request is not an asset request
/// * `Some(Ok(HttpResponse))` - The asset, honouring conditional and range
///   headers
/// * `Some(Err(ServerError))` - No asset with that key
pub fn handle_asset(ctx: &RequestContext<'_>) -> Option<Result<HttpResponse, ServerError>> {
    let query = ctx.req.query_string();
    if !ctx.url.is_root() || !query.starts_with(ASSET_ROUTE_PREFIX) {
        return None;
    }

    let key = percent_decode_str(&query[ASSET_ROUTE_PREFIX.len()..]).decode_utf8_lossy();
    Some(match assets::get(&key) {
        Some(asset) => Ok(assets::respond(ctx.req, asset)),
        None => {
            debug!("Unable to open file <(vfs)/{}>", key);
            Err(ServerError::NotFound("vfs: file not found"))
        }
    })
}
