use std::process::{Command, Output};

use serde_json::{Value, json};

/// Environment the CLI reads; cleared so the host setup cannot leak in.
const CLI_ENV: &[&str] = &[
    "NEYNAR_API_KEY",
    "NEYNAR_API_BASE",
    "S3_BUCKET",
    "S3_REGION",
    "S3_ENDPOINT",
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "RUST_LOG",
];

/// Run the CLI binary with arguments.
pub fn run_cli(args: &[String]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_castex"));
    cmd.args(args);
    for var in CLI_ENV {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI off the async runtime so mock servers keep answering.
pub async fn run_cli_async(args: &[&str]) -> Output {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    tokio::task::spawn_blocking(move || run_cli(&args))
        .await
        .expect("CLI task panicked")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

pub fn cast(hash: &str) -> Value {
    json!({
        "object": "cast",
        "hash": hash,
        "thread_hash": hash,
        "parent_hash": null,
        "author": {"fid": 3, "username": "dwr", "display_name": "Dan Romero"},
        "text": format!("cast {}", hash),
        "timestamp": "2024-05-01T12:00:00.000Z",
        "embeds": [],
        "reactions": {"likes_count": 2, "recasts_count": 1},
        "replies": {"count": 0}
    })
}
