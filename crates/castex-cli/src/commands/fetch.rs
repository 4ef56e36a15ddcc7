//! Fetch command implementation.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use castex_core::FeedFetcher;

use super::{FeedArgs, parse_fid};
use crate::output;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Farcaster ID of the account to fetch
    pub fid: String,

    /// Leave replies out
    #[arg(long)]
    pub no_replies: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    #[command(flatten)]
    pub feed: FeedArgs,
}

pub async fn run(args: FetchArgs) -> Result<()> {
    let fid = parse_fid(&args.fid)?;
    let fetcher = FeedFetcher::new(args.feed.feed()?);

    let outcome = fetcher.fetch_all(fid, !args.no_replies).await;

    for record in &outcome.records {
        if args.pretty {
            output::json_pretty(record)?;
        } else {
            output::json(record)?;
        }
    }

    eprintln!();
    eprintln!(
        "{}: {} casts in {} pages",
        "Total".dimmed(),
        outcome.records.len(),
        outcome.pages
    );
    if let Some(truncation) = &outcome.truncation {
        output::warning(&format!(
            "Stopped at page {}: {}",
            truncation.page, truncation.reason
        ));
    }

    Ok(())
}
