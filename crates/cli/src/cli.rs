use std::path::PathBuf;

use clap::{ArgGroup, Parser};

/// Send one piece of content to a trustbot server and print the verdict.
#[derive(Parser, Debug)]
#[command(name = "trustbot-cli", about = "Demo client for the trustbot analyze API")]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .args(["text", "url", "image", "file"]),
))]
pub struct CliArgs {
    /// Server base URL
    #[arg(long, env = "TRUSTBOT_HOST", default_value = "http://127.0.0.1:8000")]
    pub host: String,

    /// Forwarded message text
    #[arg(long)]
    pub text: Option<String>,

    /// Link to check
    #[arg(long)]
    pub url: Option<String>,

    /// Screenshot or photo to inspect
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Document (PDF or scanned image) to read
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Locale hint forwarded to the server
    #[arg(long)]
    pub locale: Option<String>,
}
