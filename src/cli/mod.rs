// CLI module for genmedia-clients
// Author: kelexine (https://github.com/kelexine)

use clap::Parser;
use std::path::PathBuf;

/// genmedia-clients - acquire and verify Google generative AI client handles
#[derive(Parser, Debug)]
#[command(name = "genmedia-clients", version, about, long_about = None)]
pub struct Args {
    /// Configuration file (defaults to ~/.genmedia/config.toml)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Google Cloud project ID (defaults to the configured project)
    #[arg(long)]
    pub project: Option<String>,

    /// Google Cloud region (defaults to the configured location)
    #[arg(long)]
    pub location: Option<String>,

    /// Model ID (defaults to the configured model)
    #[arg(long)]
    pub model: Option<String>,

    /// Use the public Generative Language API instead of Vertex AI
    #[arg(long)]
    pub public: bool,

    /// Fetch the model resource after acquiring the client
    #[arg(long)]
    pub check: bool,

    /// Print Prometheus metrics before exiting
    #[arg(long)]
    pub metrics: bool,
}
