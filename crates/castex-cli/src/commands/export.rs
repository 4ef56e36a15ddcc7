//! Export command implementation.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use castex_core::fetch::MAX_PAGE_SIZE;
use castex_core::{
    CsvDialect, ExportFormat, ExportOptions, Exporter, FetchOptions, TruncationPolicy,
};

use super::{FeedArgs, parse_fid};
use crate::output;
use crate::store::{CliStore, FileArgs, S3Args, StoreKind};

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Farcaster ID of the account to export
    pub fid: String,

    /// Output format: json or csv
    #[arg(long, default_value = "json")]
    pub format: String,

    /// Leave replies out of the export
    #[arg(long)]
    pub no_replies: bool,

    /// Where to publish the export
    #[arg(long, value_enum, default_value_t = StoreKind::S3)]
    pub store: StoreKind,

    /// Casts requested per page
    #[arg(long, default_value_t = MAX_PAGE_SIZE)]
    pub page_size: u32,

    /// Extra attempts for a page that failed with a retryable error
    #[arg(long, default_value_t = 0)]
    pub page_retries: u32,

    /// Stop after this many pages
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Fail instead of publishing a partial export
    #[arg(long)]
    pub fail_on_truncation: bool,

    /// CSV quoting: legacy or rfc4180
    #[arg(long, default_value = "legacy")]
    pub csv_dialect: String,

    #[command(flatten)]
    pub feed: FeedArgs,

    #[command(flatten)]
    pub s3: S3Args,

    #[command(flatten)]
    pub file: FileArgs,
}

pub async fn run(args: ExportArgs) -> Result<()> {
    let fid = parse_fid(&args.fid)?;
    let format: ExportFormat = args.format.parse().context("Invalid format")?;
    let csv_dialect: CsvDialect = args.csv_dialect.parse().context("Invalid CSV dialect")?;

    let store = match args.store {
        StoreKind::S3 => CliStore::s3(&args.s3, args.feed.timeout())?,
        StoreKind::File => CliStore::file(&args.file)?,
    };

    let options = ExportOptions {
        fetch: FetchOptions {
            page_size: args.page_size,
            page_retries: args.page_retries,
            max_pages: args.max_pages,
            ..FetchOptions::default()
        },
        truncation: if args.fail_on_truncation {
            TruncationPolicy::Fail
        } else {
            TruncationPolicy::Allow
        },
        csv_dialect,
    };

    info!(%fid, %format, store = ?args.store, "Starting export");

    let exporter = Exporter::with_options(args.feed.feed()?, store, options);
    let receipt = exporter
        .export(fid, format, !args.no_replies)
        .await
        .context("Export failed")?;

    output::success("Export published");
    output::field("URL", &receipt.url);
    output::field("Key", receipt.key.as_str());
    output::field("Format", &receipt.format.to_string());
    output::field("Casts", &receipt.count.to_string());

    if receipt.truncated {
        output::warning("Export is truncated; casts past the last fetched page are missing.");
    }

    Ok(())
}
