//! Shared Key authorization for the Blob service.
//!
//! Only `HEAD` and `GET` without a body or conditional headers are signed,
//! so every standard header line in the string-to-sign is empty.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use reqwest::Url;
use sha2::Sha256;

pub const API_VERSION: &str = "2021-08-06";

/// Date in the RFC 1123 form the service expects in `x-ms-date`.
pub fn ms_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Build the string-to-sign for a body-less request.
///
/// `ms_headers` are the `x-ms-*` headers sent with the request.
pub fn string_to_sign(verb: &str, account: &str, url: &Url, ms_headers: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(256);
    out.push_str(verb);
    out.push('\n');
    // Content-Encoding through Range: eleven empty lines.
    for _ in 0..11 {
        out.push('\n');
    }

    let mut headers: Vec<(String, &str)> = ms_headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.trim()))
        .collect();
    headers.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, value) in headers {
        out.push_str(&name);
        out.push(':');
        out.push_str(value);
        out.push('\n');
    }

    out.push('/');
    out.push_str(account);
    out.push_str(url.path());

    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.to_lowercase(), v.into_owned()))
        .collect();
    params.sort();
    for (name, value) in params {
        out.push('\n');
        out.push_str(&name);
        out.push(':');
        out.push_str(&value);
    }

    out
}

/// Base64 HMAC-SHA256 of `string_to_sign` under the decoded account key.
pub fn sign(key: &[u8], string_to_sign: &str) -> Result<String, InvalidLength> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)?;
    mac.update(string_to_sign.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Value of the `Authorization` header.
pub fn authorization(account: &str, key: &[u8], string_to_sign: &str) -> Result<String, InvalidLength> {
    Ok(format!("SharedKey {}:{}", account, sign(key, string_to_sign)?))
}
