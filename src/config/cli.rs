//! Command-line flags and their environment fallbacks.

use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments for the memsite binary.
///
/// Every override falls back to the environment variable the site has
/// historically been deployed with.
#[derive(Debug, Default, Parser)]
#[command(name = "memsite", version, about = "Serve a personal site from memory")]
pub struct CliArgs {
    /// Optional path to a TOML configuration file.
    #[arg(long = "config", env = "MEMSITE_CONFIG", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Virtual host content is served under.
    #[arg(long, env = "HOSTNAME")]
    pub host: Option<String>,

    /// TLS certificate (PEM).
    #[arg(long, env = "CERT", value_name = "PATH")]
    pub cert: Option<String>,

    /// TLS private key (PEM).
    #[arg(long, env = "KEY", value_name = "PATH")]
    pub key: Option<String>,

    /// Directory of article files.
    #[arg(long, env = "PAGES", value_name = "DIR")]
    pub pages: Option<String>,

    /// Directory of static assets.
    #[arg(long = "static-dir", env = "STATIC", value_name = "DIR")]
    pub static_dir: Option<String>,

    /// Alias JSON file.
    #[arg(long, env = "ALIAS", value_name = "PATH")]
    pub alias: Option<String>,

    /// Bearer token protecting the metrics endpoint.
    #[arg(long = "metrics-token", env = "METRICS_TOKEN", hide_env_values = true)]
    pub metrics_token: Option<String>,

    /// Listen address.
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,
}
