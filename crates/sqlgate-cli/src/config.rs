//! Effective configuration assembled once at startup.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use sqlgate_core::Allowlist;

use crate::cli::Args;

/// Candidate-generator connection settings.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Base URL of an OpenAI-compatible chat-completions endpoint.
    pub base_url: String,
    /// Bearer token; taken from `SQLGATE_API_KEY`, never from a flag.
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
    pub retries: u32,
    pub temperature: f32,
}

/// Everything the gate needs at runtime. Built once from [`Args`]; the
/// allowlist is immutable for the process lifetime (reload requires
/// restart).
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub allowlist: Arc<Allowlist>,
    pub max_rows: u32,
    pub max_attempts: u32,
    pub generator: Option<GeneratorConfig>,
    #[cfg(feature = "executor")]
    pub database_url: Option<String>,
}

impl GateConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        let allowlist = load_allowlist(args)?;
        if allowlist.is_empty() {
            bail!(
                "no allowlist configured; pass --allowlist, --allowlist-file, \
                 or set SQLGATE_ALLOWLIST"
            );
        }

        let generator = args.generator_url.as_ref().map(|url| GeneratorConfig {
            base_url: url.trim_end_matches('/').to_string(),
            api_key: std::env::var("SQLGATE_API_KEY").ok(),
            model: args.generator_model.clone(),
            timeout: Duration::from_secs(args.generator_timeout_secs),
            retries: args.generator_retries,
            temperature: args.temperature,
        });

        Ok(Self {
            allowlist: Arc::new(allowlist),
            max_rows: args.max_rows,
            max_attempts: args.max_attempts,
            generator,
            #[cfg(feature = "executor")]
            database_url: args.database_url.clone(),
        })
    }
}

fn load_allowlist(args: &Args) -> Result<Allowlist> {
    let mut entries: Vec<String> = Vec::new();

    if let Some(csv) = &args.allowlist {
        entries.extend(csv.split(',').map(str::to_string));
    }

    if let Some(path) = &args.allowlist_file {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read allowlist file {}", path.display()))?;
        entries.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string),
        );
    }

    Ok(Allowlist::new(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn parse(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("sqlgate").chain(argv.iter().copied()))
    }

    #[test]
    fn csv_allowlist_is_loaded() {
        let args = parse(&["--allowlist", "Sales.Customer,Production.Product"]);
        let config = GateConfig::from_args(&args).unwrap();
        assert!(config.allowlist.contains("sales.customer"));
        assert_eq!(config.max_rows, 5000);
        assert_eq!(config.max_attempts, 3);
    }

    #[test]
    fn allowlist_file_supports_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# AdventureWorks subset").unwrap();
        writeln!(file, "Sales.SalesOrderHeader").unwrap();
        writeln!(file, "  Production.Product  ").unwrap();
        writeln!(file).unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let args = parse(&["--allowlist-file", &path]);
        let config = GateConfig::from_args(&args).unwrap();
        assert_eq!(config.allowlist.len(), 2);
        assert!(config.allowlist.contains("production.product"));
    }

    #[test]
    fn missing_allowlist_is_a_config_error() {
        let args = parse(&[]);
        assert!(GateConfig::from_args(&args).is_err());
    }

    #[test]
    fn generator_config_requires_url() {
        let args = parse(&["--allowlist", "Sales.Customer"]);
        let config = GateConfig::from_args(&args).unwrap();
        assert!(config.generator.is_none());

        let args = parse(&[
            "--allowlist",
            "Sales.Customer",
            "--generator-url",
            "http://localhost:8080/v1/",
        ]);
        let config = GateConfig::from_args(&args).unwrap();
        let generator = config.generator.unwrap();
        assert_eq!(generator.base_url, "http://localhost:8080/v1");
        assert_eq!(generator.timeout, Duration::from_secs(30));
    }
}
