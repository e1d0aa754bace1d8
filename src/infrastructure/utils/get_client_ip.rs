use actix_web::{http::header::HeaderName, HttpRequest};

const FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Key used for rate limiting and stored with contact submissions. The first
/// `X-Forwarded-For` hop is used only behind a trusted proxy, and an empty
/// hop falls back to the peer address.
pub fn get_client_ip(req: &HttpRequest, trust_x_forwarded_for: bool) -> String {
    let forwarded = trust_x_forwarded_for
        .then(|| req.headers().get(&FORWARDED_FOR))
        .flatten()
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty());

    match forwarded {
        Some(hop) => hop.to_string(),
        None => req
            .peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    }
}
