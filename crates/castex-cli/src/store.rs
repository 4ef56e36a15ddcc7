//! Store selection for the CLI.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Args, ValueEnum};
use url::Url;

use castex_core::{ApiUrl, Artifact, ObjectKey, ObjectStore};
use castex_file::FileStore;
use castex_s3::{AwsCredentials, S3Config, S3Store};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// An S3 bucket with public-read objects
    S3,
    /// A local directory
    File,
}

/// Bucket settings, usually supplied through the environment.
#[derive(Args, Debug)]
pub struct S3Args {
    /// Bucket name
    #[arg(long, env = "S3_BUCKET")]
    pub bucket: Option<String>,

    /// Bucket region
    #[arg(long, env = "S3_REGION", default_value = "us-east-1")]
    pub region: String,

    /// Access key ID
    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key_id: Option<String>,

    /// Secret access key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: Option<String>,

    /// Session token for temporary credentials
    #[arg(long, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    pub session_token: Option<String>,

    /// Path-style endpoint of an S3-compatible service
    #[arg(long, env = "S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,
}

/// Directory store settings.
#[derive(Args, Debug)]
pub struct FileArgs {
    /// Directory to write exports into (with --store file)
    #[arg(long, default_value = "exports")]
    pub out_dir: PathBuf,

    /// Base URL the directory is served from (with --store file)
    #[arg(long)]
    pub public_base: Option<String>,
}

/// The store picked on the command line.
#[derive(Debug)]
pub enum CliStore {
    S3(S3Store),
    File(FileStore),
}

impl CliStore {
    pub fn s3(args: &S3Args, timeout: std::time::Duration) -> Result<Self> {
        let bucket = args
            .bucket
            .clone()
            .context("S3 bucket not set. Pass --bucket or set S3_BUCKET.")?;
        let access_key_id = args
            .access_key_id
            .clone()
            .context("AWS access key not set. Pass --access-key-id or set AWS_ACCESS_KEY_ID.")?;
        let secret_access_key = args.secret_access_key.clone().context(
            "AWS secret key not set. Pass --secret-access-key or set AWS_SECRET_ACCESS_KEY.",
        )?;

        let mut credentials = AwsCredentials::new(access_key_id, secret_access_key);
        if let Some(token) = &args.session_token {
            credentials = credentials.with_session_token(token);
        }

        let mut config =
            S3Config::new(bucket, args.region.clone(), credentials).with_timeout(timeout);
        if let Some(endpoint) = &args.s3_endpoint {
            config = config.with_endpoint(ApiUrl::new(endpoint).context("Invalid S3 endpoint")?);
        }

        Ok(Self::S3(
            S3Store::new(config).context("Failed to create S3 client")?,
        ))
    }

    pub fn file(args: &FileArgs) -> Result<Self> {
        let mut store = FileStore::new(&args.out_dir).context("Invalid output directory")?;
        if let Some(base) = &args.public_base {
            let base = Url::parse(base).context("Invalid public base URL")?;
            store = store
                .with_public_base(base)
                .context("Invalid public base URL")?;
        }
        Ok(Self::File(store))
    }
}

#[async_trait]
impl ObjectStore for CliStore {
    async fn put(&self, artifact: &Artifact) -> castex_core::Result<()> {
        match self {
            CliStore::S3(store) => store.put(artifact).await,
            CliStore::File(store) => store.put(artifact).await,
        }
    }

    fn public_url(&self, key: &ObjectKey) -> String {
        match self {
            CliStore::S3(store) => store.public_url(key),
            CliStore::File(store) => store.public_url(key),
        }
    }
}
