//! Signaling endpoint resolution

use teleview_core::TeleviewError;
use url::Url;

/// Well-known signaling path on the viewer's host
pub const SIGNALING_PATH: &str = "/ws";

/// Derive the signaling URL for a viewer served from `page_url`.
///
/// A page served over `https` gets `wss`, `http` gets `ws`. Host and port are
/// kept and the path is always [`SIGNALING_PATH`].
pub fn endpoint_for_page(page_url: &str) -> Result<Url, TeleviewError> {
    let page = Url::parse(page_url).map_err(|e| TeleviewError::InvalidEndpoint {
        url: page_url.to_string(),
        reason: e.to_string(),
    })?;

    let scheme = match page.scheme() {
        "https" => "wss",
        "http" => "ws",
        other => {
            return Err(TeleviewError::InvalidEndpoint {
                url: page_url.to_string(),
                reason: format!("unsupported page scheme '{}'", other),
            })
        }
    };

    let host = page.host_str().ok_or_else(|| TeleviewError::InvalidEndpoint {
        url: page_url.to_string(),
        reason: "page URL has no host".to_string(),
    })?;

    let authority = match page.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    parse_signaling_url(&format!("{}://{}{}", scheme, authority, SIGNALING_PATH))
}

/// Parse an explicit signaling URL, accepting only `ws` and `wss`
pub fn parse_signaling_url(url: &str) -> Result<Url, TeleviewError> {
    let parsed = Url::parse(url).map_err(|e| TeleviewError::InvalidEndpoint {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "ws" | "wss" => Ok(parsed),
        other => Err(TeleviewError::InvalidEndpoint {
            url: url.to_string(),
            reason: format!("expected ws or wss scheme, got '{}'", other),
        }),
    }
}
