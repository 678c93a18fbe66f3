mod cli;
mod render;
mod repl;
mod setup;

use std::path::Path;
use std::sync::Arc;

use inkwell_common::ConfigError;
use inkwell_config::InkwellConfig;
use tracing_subscriber::EnvFilter;

use crate::render::TerminalRenderer;
use crate::repl::Repl;

/// Config from `--config` or the default location, plus the load error if
/// defaults had to be used. Logging is not up yet, so the error is handed
/// back for later.
fn load_config(path: Option<&str>) -> (InkwellConfig, Option<ConfigError>) {
    let loaded = match path {
        Some(path) => inkwell_config::load_config_from(Path::new(path)),
        None => inkwell_config::load_config(),
    };
    match loaded {
        Ok(config) => (config, None),
        Err(e) => (InkwellConfig::default(), Some(e)),
    }
}

fn init_logging(flag: Option<&str>, config: &InkwellConfig) {
    let log_directive = flag.unwrap_or(config.logging.level.as_directive());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| tracing_subscriber::filter::LevelFilter::INFO.into()),
            ),
        )
        .init();
}

#[tokio::main]
async fn main() {
    let args = cli::parse();

    let (config, config_error) = load_config(args.config.as_deref());
    init_logging(args.log_level.as_deref(), &config);

    tracing::info!("Inkwell v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(ref path) = args.config {
        tracing::info!("Using config override: {path}");
    }
    if let Some(e) = config_error {
        tracing::warn!("Config load failed, using defaults: {e}");
    }

    let components = match setup::build(&config, args.url.as_deref()) {
        Ok(components) => components,
        Err(e) => {
            tracing::error!("Startup failed: {e}");
            std::process::exit(1);
        }
    };
    components
        .session
        .subscribe(Arc::new(TerminalRenderer::stdout()));

    let mut repl = Repl::new(components);
    if let Some(ref title) = args.document {
        if let Err(e) = repl.open(title, &mut std::io::stdout()).await {
            tracing::warn!("Could not open '{title}': {e}");
        }
    }

    let code = match repl.run().await {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("Chat loop error: {e}");
            1
        }
    };
    tracing::info!("Shutdown complete");
    // Stdin is read on a blocking thread that cannot be cancelled.
    std::process::exit(code);
}
