use std::path::PathBuf;

use clap::Parser;

/// Docent: ask questions about a document from the terminal.
#[derive(Parser, Debug)]
#[command(name = "docent", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Grounding document (overrides the config and DOCENT_DOCUMENT).
    #[arg(short = 'd', long)]
    pub document: Option<PathBuf>,

    /// Model name (overrides the config and DOCENT_MODEL).
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Ask a single question and exit instead of reading stdin.
    #[arg(short = 'q', long)]
    pub query: Option<String>,

    /// Log level or filter directive (debug, info, warn, error, or e.g. docent_ai=trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Do not offer any tools to the model.
    #[arg(long)]
    pub no_tools: bool,
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_flags() {
        let args = Args::try_parse_from([
            "docent",
            "--config",
            "/tmp/c.toml",
            "-d",
            "manual.pdf",
            "--model",
            "gemini-1.5-pro",
            "-q",
            "What is on page 3?",
            "--log-level",
            "debug",
            "--no-tools",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/c.toml")));
        assert_eq!(args.document, Some(PathBuf::from("manual.pdf")));
        assert_eq!(args.model.as_deref(), Some("gemini-1.5-pro"));
        assert_eq!(args.query.as_deref(), Some("What is on page 3?"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.no_tools);
    }

    #[test]
    fn defaults_are_empty() {
        let args = Args::try_parse_from(["docent"]).unwrap();
        assert!(args.config.is_none());
        assert!(args.query.is_none());
        assert!(!args.no_tools);
    }
}
