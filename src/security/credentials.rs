//! Bearer credential resolution.
//!
//! The session cookie carries the upstream access token. Resolving it is a
//! pure read: no token is not an error, callers decide whether to answer 401
//! or continue to a public endpoint.

use axum::http::{header, HeaderMap, HeaderValue};
use axum_extra::extract::cookie::CookieJar;
use std::fmt;

/// An access token taken from the request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// `None` for blank tokens.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn token(&self) -> &str {
        &self.0
    }

    /// `Bearer <token>`, ready for an `Authorization` header.
    ///
    /// `None` when the token holds bytes a header value cannot carry.
    pub fn header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&format!("Bearer {}", self.0)).ok()
    }
}

// Tokens must never reach logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Resolve the credential for a request.
///
/// The session cookie wins; a `Bearer` authorization header is accepted for
/// API clients that do not carry cookies.
pub fn resolve(headers: &HeaderMap, cookie_name: &str) -> Option<Credential> {
    let jar = CookieJar::from_headers(headers);
    if let Some(credential) = jar
        .get(cookie_name)
        .and_then(|cookie| Credential::new(cookie.value()))
    {
        return Some(credential);
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            let (scheme, token) = v.split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then_some(token)
        })
        .and_then(Credential::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.append(
                header::HeaderName::from_bytes(k.as_bytes()).unwrap(),
                HeaderValue::from_str(v).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_cookie_becomes_bearer_header() {
        let h = headers(&[("cookie", "theme=dark; access_token=abc.def.ghi")]);
        let credential = resolve(&h, "access_token").unwrap();
        assert_eq!(credential.header_value().unwrap(), "Bearer abc.def.ghi");
    }

    #[test]
    fn test_absent_or_blank_cookie_is_none() {
        assert!(resolve(&headers(&[]), "access_token").is_none());
        assert!(resolve(&headers(&[("cookie", "access_token=")]), "access_token").is_none());
        assert!(resolve(&headers(&[("cookie", "other=1")]), "access_token").is_none());
    }

    #[test]
    fn test_custom_cookie_name() {
        let h = headers(&[("cookie", "access-token=xyz")]);
        assert!(resolve(&h, "access_token").is_none());
        assert_eq!(resolve(&h, "access-token").unwrap().token(), "xyz");
    }

    #[test]
    fn test_authorization_header_fallback() {
        let h = headers(&[("authorization", "Bearer header-token")]);
        assert_eq!(resolve(&h, "access_token").unwrap().token(), "header-token");

        let basic = headers(&[("authorization", "Basic dXNlcjpwYXNz")]);
        assert!(resolve(&basic, "access_token").is_none());
    }

    #[test]
    fn test_cookie_wins_over_header() {
        let h = headers(&[
            ("cookie", "access_token=from-cookie"),
            ("authorization", "Bearer from-header"),
        ]);
        assert_eq!(resolve(&h, "access_token").unwrap().token(), "from-cookie");
    }

    #[test]
    fn test_debug_hides_token() {
        let credential = Credential::new("secret").unwrap();
        assert_eq!(format!("{:?}", credential), "Credential(***)");
    }
}
