use std::path::PathBuf;

use clap::Parser;

/// Demo site served by the `waypost` binary.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Config {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:4221")]
    pub addr: String,

    /// Directory served under `/static/`.
    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    /// Index file extensions tried after `index.html`, in order.
    #[arg(long, value_delimiter = ',')]
    pub index_ext: Vec<String>,

    /// Directory of templates served under `/pages/`.
    #[arg(long)]
    pub templates: Option<PathBuf>,

    #[arg(long, default_value = "html")]
    pub template_ext: String,

    /// Gzip encode responses for clients that accept it.
    #[arg(long)]
    pub gzip: bool,

    /// Used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
