//! AWS Signature Version 4 for single-chunk requests.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::config::AwsCredentials;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Everything that goes into one signature.
pub(crate) struct SigningRequest<'a> {
    pub method: &'a str,
    /// Already percent-encoded path.
    pub canonical_uri: &'a str,
    /// Lowercase names, sorted by name. Must include `host`.
    pub headers: &'a [(&'a str, String)],
    pub payload_hash: &'a str,
    pub region: &'a str,
    pub service: &'a str,
    pub at: DateTime<Utc>,
}

/// `x-amz-date` value for an instant.
pub(crate) fn amz_date(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Percent-encode a key for the request path, keeping `/` separators.
pub(crate) fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// The `Authorization` header value.
pub(crate) fn authorization(credentials: &AwsCredentials, request: &SigningRequest<'_>) -> String {
    let date = request.at.format("%Y%m%d").to_string();
    let scope = format!(
        "{}/{}/{}/aws4_request",
        date, request.region, request.service
    );

    let signed_headers = request
        .headers
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(";");

    let canonical_headers: String = request
        .headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
        .collect();

    let canonical_request = format!(
        "{}\n{}\n\n{}\n{}\n{}",
        request.method,
        request.canonical_uri,
        canonical_headers,
        signed_headers,
        request.payload_hash
    );

    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date(request.at),
        scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let key = signing_key(
        credentials.secret_access_key.as_str(),
        &date,
        request.region,
        request.service,
    );
    let signature = hex::encode(hmac(&key, string_to_sign.as_bytes()));

    format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM, credentials.access_key_id, scope, signed_headers, signature
    )
}

pub(crate) fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac(format!("AWS4{}", secret).as_bytes(), date.as_bytes());
    let k_region = hmac(&k_date, region.as_bytes());
    let k_service = hmac(&k_region, service.as_bytes());
    hmac(&k_service, b"aws4_request")
}

fn hmac(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
