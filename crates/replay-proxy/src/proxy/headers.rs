//! Header names and sanitization for both directions of a forwarded call.
//!
//! Static names and values avoid runtime `.parse().unwrap()` calls at the
//! insertion sites.

use hyper::header::{
    HeaderName, HeaderValue, ACCEPT_ENCODING, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, CONNECTION, CONTENT_ENCODING,
    CONTENT_LENGTH, HOST, TRANSFER_ENCODING,
};
use hyper::{HeaderMap, Response};

/// Declares the upstream a request is forwarded to.
pub static ORIGIN_HOST: HeaderName = HeaderName::from_static("origin-host");

pub static VALUE_ANY: HeaderValue = HeaderValue::from_static("*");
pub static VALUE_JSON: HeaderValue = HeaderValue::from_static("application/json");
pub static VALUE_PLAIN_TEXT: HeaderValue = HeaderValue::from_static("text/plain; charset=utf-8");
pub static VALUE_METRICS: HeaderValue =
    HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8");
pub static VALUE_INTERCEPTED_METHODS: HeaderValue =
    HeaderValue::from_static("GET, POST, PUT, DELETE, PATCH");
pub static VALUE_ALLOWED_METHODS: HeaderValue =
    HeaderValue::from_static("GET, POST, PUT, DELETE, PATCH, OPTIONS");

/// Response headers that go stale once the body is re-served by this process.
const STALE_RESPONSE_HEADERS: [HeaderName; 4] =
    [CONTENT_LENGTH, TRANSFER_ENCODING, CONNECTION, CONTENT_ENCODING];

/// Prepare inbound headers for the upstream call.
///
/// Drops `Host` and never leaves both framing headers in place:
/// `Transfer-Encoding` wins over `Content-Length`. `Accept-Encoding` is
/// dropped as well, since `Content-Encoding` is stripped on the way back and
/// the caller must receive an identity-encoded payload.
pub fn sanitize_outbound(headers: &mut HeaderMap) {
    headers.remove(HOST);
    headers.remove(&ORIGIN_HOST);
    headers.remove(ACCEPT_ENCODING);

    if headers.contains_key(TRANSFER_ENCODING) {
        headers.remove(CONTENT_LENGTH);
    } else if headers.contains_key(CONTENT_LENGTH) {
        headers.remove(TRANSFER_ENCODING);
    }
}

/// Remove the framing headers an outbound request is re-framed without.
pub fn strip_framing(headers: &mut HeaderMap) {
    headers.remove(CONTENT_LENGTH);
    headers.remove(TRANSFER_ENCODING);
}

/// Remove upstream response headers that no longer describe the body.
pub fn sanitize_response(headers: &mut HeaderMap) {
    for name in &STALE_RESPONSE_HEADERS {
        headers.remove(name);
    }
}

/// Extension trait for the CORS headers every response carries.
pub trait CorsHeadersExt {
    /// `Access-Control-Allow-Origin: *`
    fn allow_any_origin(&mut self);

    /// Full preflight answer.
    fn allow_preflight(&mut self);
}

impl<B> CorsHeadersExt for Response<B> {
    fn allow_any_origin(&mut self) {
        self.headers_mut()
            .insert(ACCESS_CONTROL_ALLOW_ORIGIN, VALUE_ANY.clone());
    }

    fn allow_preflight(&mut self) {
        self.allow_any_origin();
        let headers = self.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, VALUE_ALLOWED_METHODS.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, VALUE_ANY.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use hyper::body::Bytes;
    use hyper::header::CONTENT_TYPE;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        map
    }

    #[test]
    fn test_transfer_encoding_wins_over_content_length() {
        let mut map = headers(&[("transfer-encoding", "chunked"), ("content-length", "10")]);
        sanitize_outbound(&mut map);
        assert_eq!(map.get(TRANSFER_ENCODING).unwrap(), "chunked");
        assert!(map.get(CONTENT_LENGTH).is_none());
    }

    #[test]
    fn test_content_length_alone_is_kept() {
        let mut map = headers(&[("content-length", "10")]);
        sanitize_outbound(&mut map);
        assert_eq!(map.get(CONTENT_LENGTH).unwrap(), "10");
        assert!(map.get(TRANSFER_ENCODING).is_none());
    }

    #[test]
    fn test_outbound_drops_host_and_routing_header() {
        let mut map = headers(&[
            ("host", "localhost:3000"),
            ("origin-host", "https://api.example.com"),
            ("accept-encoding", "gzip"),
            ("authorization", "Bearer t"),
        ]);
        sanitize_outbound(&mut map);
        assert!(map.get(HOST).is_none());
        assert!(map.get(&ORIGIN_HOST).is_none());
        assert!(map.get(ACCEPT_ENCODING).is_none());
        assert_eq!(map.get("authorization").unwrap(), "Bearer t");
    }

    #[test]
    fn test_response_sanitize() {
        let mut map = headers(&[
            ("content-length", "5"),
            ("transfer-encoding", "chunked"),
            ("connection", "keep-alive"),
            ("content-encoding", "gzip"),
            ("content-type", "application/json"),
        ]);
        sanitize_response(&mut map);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn test_allow_any_origin() {
        let mut response = Response::new(Full::new(Bytes::new()));
        response.allow_any_origin();
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[test]
    fn test_allow_preflight() {
        let mut response = Response::new(Full::new(Bytes::new()));
        response.allow_preflight();
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
            "*"
        );
        assert!(response
            .headers()
            .get(ACCESS_CONTROL_ALLOW_METHODS)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("PATCH"));
    }
}
