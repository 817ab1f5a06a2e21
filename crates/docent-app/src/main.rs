mod app;
mod cli;

use std::process::ExitCode;
use std::time::Duration;

use docent_common::DocentError;
use docent_config::DocentConfig;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "docent=info";

/// Filter directive from `--log-level`, else the config, else the default.
///
/// A bare level applies to every docent crate; anything else is used as a
/// directive as-is.
fn log_directive(cli_level: Option<&str>, config: Option<&DocentConfig>) -> String {
    match cli_level {
        Some(level @ ("trace" | "debug" | "info" | "warn" | "error")) => format!("docent={level}"),
        Some(directive) => directive.to_string(),
        None => config
            .map(|c| c.logging.level.directive())
            .unwrap_or(DEFAULT_DIRECTIVE)
            .to_string(),
    }
}

/// Logs go to stderr so stdout carries only answers.
fn init_logging(directive: &str) {
    let filter = match directive.parse::<Directive>() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::new(DEFAULT_DIRECTIVE),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    // Load .env before anything reads the environment
    let dotenv = docent_config::env::load_dotenv();

    let args = cli::parse();
    let config = docent_config::load_config(args.config.as_deref());
    init_logging(&log_directive(args.log_level.as_deref(), config.as_ref().ok()));

    info!("Docent v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(path) = dotenv {
        debug!(path = %path.display(), "loaded .env");
    }
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load config");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    let result = runtime.block_on(async {
        tokio::spawn(app::signals::cancel_on_signal(cancel.clone()));
        app::run(&args, config, cancel.clone()).await
    });
    // A stdin read may still be parked on a blocking thread.
    runtime.shutdown_timeout(Duration::from_millis(250));

    match result {
        Ok(()) | Err(DocentError::Interrupted) => {
            info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "docent stopped with an error");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_applies_to_all_docent_crates() {
        assert_eq!(log_directive(Some("debug"), None), "docent=debug");
    }

    #[test]
    fn custom_directive_is_kept() {
        assert_eq!(
            log_directive(Some("docent_ai=trace"), None),
            "docent_ai=trace"
        );
    }

    #[test]
    fn falls_back_to_config_then_default() {
        let mut config = DocentConfig::default();
        config.logging.level = docent_config::schema::LogLevel::Warn;
        assert_eq!(log_directive(None, Some(&config)), "docent=warn");
        assert_eq!(log_directive(None, None), DEFAULT_DIRECTIVE);
    }
}
