//! Response headers for a resolved asset.
//!
//! Loaders read these headers from script before deciding whether to
//! decompress a payload themselves, so `Content-Encoding` must be present
//! exactly when the bytes on the wire are the `.gz` object.

use crate::types::ResolvedAsset;
use http::header::{
    ACCEPT_RANGES, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_EXPOSE_HEADERS, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE,
};
use http::{HeaderMap, HeaderValue};

pub const ALLOWED_METHODS: &str = "GET, OPTIONS";
pub const EXPOSED_HEADERS: &str = "Content-Length, Content-Type, Content-Encoding, Accept-Ranges";

/// Cross-origin headers shared by asset responses, errors and preflight.
pub fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(EXPOSED_HEADERS),
    );
    headers
}

/// Full header set for a successful asset response.
///
/// `Accept-Ranges: bytes` is always declared although range requests are
/// answered with the whole object.
pub fn assemble_headers(asset: &ResolvedAsset) -> HeaderMap {
    let mut headers = cors_headers();
    headers.insert(CONTENT_LENGTH, HeaderValue::from(asset.size_bytes()));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(asset.content_type));
    headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    if asset.is_compressed {
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
    }
    headers
}
