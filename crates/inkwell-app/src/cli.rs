use clap::Parser;

/// Inkwell: chat with a writing assistant about your documents.
#[derive(Parser, Debug)]
#[command(name = "inkwell", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Log level override (trace, debug, info, warn, error, or a filter
    /// directive).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Document to open as chat context on startup.
    #[arg(short = 'd', long)]
    pub document: Option<String>,

    /// Chat endpoint override.
    #[arg(long)]
    pub url: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
