use axum::http::{header, HeaderMap, HeaderValue};
use time::Duration;

use crate::config::CookieConfig;

const EPOCH: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// HTTP-only cookie carrying a freshly issued session token.
pub fn session_cookie(
    cfg: &CookieConfig,
    token: &str,
    max_age: Duration,
) -> anyhow::Result<HeaderValue> {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        cfg.name,
        token,
        max_age.whole_seconds()
    );
    if cfg.secure {
        cookie.push_str("; Secure");
    }
    Ok(HeaderValue::from_str(&cookie)?)
}

/// Replacement cookie that tells the browser to drop the session.
pub fn cleared_cookie(cfg: &CookieConfig) -> anyhow::Result<HeaderValue> {
    let mut cookie = format!(
        "{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0; Expires={}",
        cfg.name, EPOCH
    );
    if cfg.secure {
        cookie.push_str("; Secure");
    }
    Ok(HeaderValue::from_str(&cookie)?)
}

/// Value of the named cookie from the request's `Cookie` headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}
