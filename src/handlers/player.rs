// src/handlers/player.rs

//! Player page handler
//!
//! Answers `/?_/player/<media path>` with the player page. The page embeds
//! the companion files (danmaku and subtitles) found next to the media file
//! as inline JSON, so it renders even when nothing was found.

use actix_web::{http::Method, web, HttpResponse};
use log::{debug, info};
use percent_encoding::percent_decode_str;

use crate::{
    assets::{self, PLAYER_TEMPLATE},
    companion::{self, PlayerBundle},
    error::ServerError,
    language::BuiltinLanguages,
    router::RequestContext,
    url,
};

pub const PLAYER_ROUTE_PREFIX: &str = "_/player/";

const PLAYER_DATA_PLACEHOLDER: &str = "{{PLAYER_DATA}}";

/// Handles player page requests.
///
/// Claims root requests whose query starts with `_/player/`. The rest of
/// the query is the media path, percent-encoded.
///
/// # Arguments
/// * `ctx` - The request being routed
///
/// # Returns
/// * `None` - The request is not a player request
/// * `Some(Ok(HttpResponse))` - The rendered player page
/// * `Some(Err(ServerError))` - Wrong method, unsafe media path, or a
///   template failure
pub async fn handle_player(
    ctx: &RequestContext<'_>,
) -> Option<Result<HttpResponse, ServerError>> {
    let query = ctx.req.query_string();
    if !ctx.url.is_root() || !query.starts_with(PLAYER_ROUTE_PREFIX) {
        return None;
    }
    Some(serve_player(ctx, &query[PLAYER_ROUTE_PREFIX.len()..]).await)
}

async fn serve_player(ctx: &RequestContext<'_>, target: &str) -> Result<HttpResponse, ServerError> {
    if ctx.req.method() != Method::GET {
        return Err(ServerError::MethodNotAllowed {
            message: "player: method not allowed",
            allow: "GET",
        });
    }

    let decoded = percent_decode_str(target)
        .decode_utf8()
        .map_err(|_| ServerError::NotFound("player: invalid url"))?;
    let target = url::resolve(&format!("/{}", decoded.trim_matches('/')));
    if !target.valid {
        return Err(ServerError::NotFound("player: invalid url"));
    }
    info!("Serving player for: {}", target.canonical_url);

    let root = ctx.root.clone();
    let bundle = web::block(move || companion::discover(&root, &target, &BuiltinLanguages))
        .await
        .map_err(|e| ServerError::render("player", e))?;
    debug!(
        "Player companions: danmaku={:?}, subtitles={}",
        bundle.danmaku_url,
        bundle.subtitles.len()
    );

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_player_page(&bundle)?))
}

/// Fills the player template with the bundle as inline JSON.
pub fn render_player_page(bundle: &PlayerBundle) -> Result<String, ServerError> {
    let template =
        assets::read_text(PLAYER_TEMPLATE).map_err(|e| ServerError::render("player", e))?;
    let data = serde_json::to_string(bundle).map_err(|e| ServerError::render("player", e))?;
    Ok(template.replace(PLAYER_DATA_PLACEHOLDER, &escape_for_script(&data)))
}

/// JSON is valid JavaScript, but `</script>` inside a string would still end
/// the script element.
fn escape_for_script(json: &str) -> String {
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bundle_renders() {
        let html = render_player_page(&PlayerBundle::default()).unwrap();
        assert!(html.contains(r#"{"danmaku":"","subtitles":[]}"#));
        assert!(!html.contains(PLAYER_DATA_PLACEHOLDER));
    }

    #[test]
    fn script_breakout_is_escaped() {
        let bundle = PlayerBundle {
            danmaku_url: Some("/</script><b>&.xml".to_string()),
            subtitles: Vec::new(),
        };
        let html = render_player_page(&bundle).unwrap();
        assert!(!html.contains("</script><b>"));
        assert!(html.contains("\\u003c/script\\u003e\\u003cb\\u003e\\u0026.xml"));
    }
}
