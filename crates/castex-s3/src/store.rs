//! `ObjectStore` over S3 `PUT Object`.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use tracing::{debug, instrument};

use castex_core::error::{TransportError, UploadError};
use castex_core::{Artifact, ObjectKey, ObjectStore, Result};

use crate::config::S3Config;
use crate::sign::{SigningRequest, amz_date, authorization, encode_key, sha256_hex};

/// Canned ACL applied to every artifact.
const PUBLIC_READ: &str = "public-read";

/// Uploads artifacts to one bucket.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: reqwest::Client,
    config: S3Config,
}

/// Resolved request target for one key.
struct Target {
    url: String,
    canonical_uri: String,
    host: String,
}

impl S3Store {
    pub fn new(config: S3Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("castex/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(transport)?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }

    fn virtual_host(&self) -> String {
        format!("{}.s3.{}.amazonaws.com", self.config.bucket, self.config.region)
    }

    fn target(&self, key: &ObjectKey) -> Target {
        match &self.config.endpoint {
            Some(endpoint) => {
                let base_path = endpoint.as_url().path().trim_end_matches('/');
                let canonical_uri = format!(
                    "{}/{}/{}",
                    base_path,
                    urlencoding::encode(&self.config.bucket),
                    encode_key(key.as_str())
                );
                let host = endpoint.authority();
                Target {
                    url: format!("{}://{}{}", endpoint.as_url().scheme(), host, canonical_uri),
                    canonical_uri,
                    host,
                }
            }
            None => {
                let host = self.virtual_host();
                let canonical_uri = format!("/{}", encode_key(key.as_str()));
                Target {
                    url: format!("https://{}{}", host, canonical_uri),
                    canonical_uri,
                    host,
                }
            }
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    #[instrument(skip(self, artifact), fields(bucket = %self.config.bucket, key = %artifact.key))]
    async fn put(&self, artifact: &Artifact) -> Result<()> {
        let at = Utc::now();
        let target = self.target(&artifact.key);
        let payload_hash = sha256_hex(&artifact.body);

        let mut headers = vec![
            ("content-type", artifact.content_type.to_string()),
            ("host", target.host.clone()),
            ("if-none-match", "*".to_string()),
            ("x-amz-acl", PUBLIC_READ.to_string()),
            ("x-amz-content-sha256", payload_hash.clone()),
            ("x-amz-date", amz_date(at)),
        ];
        if let Some(token) = &self.config.credentials.session_token {
            headers.push(("x-amz-security-token", token.as_str().to_string()));
        }

        let signature = authorization(
            &self.config.credentials,
            &SigningRequest {
                method: "PUT",
                canonical_uri: &target.canonical_uri,
                headers: &headers,
                payload_hash: &payload_hash,
                region: &self.config.region,
                service: "s3",
                at,
            },
        );

        debug!(bytes = artifact.body.len(), content_type = artifact.content_type, "Uploading artifact");

        // reqwest derives Host from the URL.
        let mut request = self
            .client
            .put(&target.url)
            .header(AUTHORIZATION, signature)
            .body(artifact.body.clone());
        for (name, value) in headers.iter().filter(|(name, _)| *name != "host") {
            request = request.header(*name, value.as_str());
        }

        let response = request.send().await.map_err(transport)?;
        let status = response.status();

        if status.is_success() {
            debug!("Upload complete");
            return Ok(());
        }

        if status == StatusCode::PRECONDITION_FAILED {
            return Err(UploadError::AlreadyExists {
                key: artifact.key.to_string(),
            }
            .into());
        }

        let body = response.text().await.unwrap_or_default();
        Err(UploadError::Rejected {
            status: status.as_u16(),
            code: xml_element(&body, "Code"),
            message: xml_element(&body, "Message"),
        }
        .into())
    }

    fn public_url(&self, key: &ObjectKey) -> String {
        match &self.config.endpoint {
            Some(_) => self.target(key).url,
            None => format!("https://{}/{}", self.virtual_host(), encode_key(key.as_str())),
        }
    }
}

fn transport(err: reqwest::Error) -> castex_core::Error {
    let inner = if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    UploadError::Transport(inner).into()
}

/// Text of the first `<name>` element in an S3 error document.
fn xml_element(body: &str, name: &str) -> Option<String> {
    let open = format!("<{}>", name);
    let close = format!("</{}>", name);
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    Some(body[start..end].trim().to_string()).filter(|s| !s.is_empty())
}
