//! SQLGate CLI - validated, read-only SQL from natural language

use sqlgate_cli::cli::{Args, OutputFormat};
use sqlgate_cli::config::GateConfig;
use sqlgate_cli::generator::{OpenAiGenerator, SchemaContext};
use sqlgate_cli::orchestrator::{generate_and_validate, FinalResult, RunLimits};
use sqlgate_cli::output::FileValidation;
use sqlgate_cli::{input, output};

use anyhow::{bail, Context, Result};
use clap::Parser;
use is_terminal::IsTerminal;
use sqlgate_core::validate;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Validation failures found or the request was denied.
const EXIT_FAILURE: u8 = 1;
/// Configuration error (e.g. missing allowlist or generator endpoint).
const EXIT_CONFIG_ERROR: u8 = 66;

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing();

    #[cfg(feature = "serve")]
    if args.serve {
        return run_serve_mode(args);
    }

    if args.ask.is_some() {
        return run_ask_mode(args);
    }

    match run_check(args) {
        Ok(has_failures) => {
            if has_failures {
                ExitCode::from(EXIT_FAILURE)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("sqlgate: error: {e:#}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Validate SQL from files or stdin against the configured policy.
fn run_check(args: Args) -> Result<bool> {
    let config = GateConfig::from_args(&args)?;
    let sources = input::read_input(&args.files)?;

    let results: Vec<FileValidation> = sources
        .into_iter()
        .map(|source| FileValidation {
            result: validate(&source.sql, &config.allowlist, config.max_rows),
            name: source.name,
        })
        .collect();

    let text = match args.format {
        OutputFormat::Table => {
            output::format_validation(&results, std::io::stdout().is_terminal())
        }
        OutputFormat::Json => output::format_validation_json(&results, args.compact),
    };
    print!("{text}");

    Ok(results.iter().any(|file| !file.result.ok))
}

/// Run the full question → validated SQL → results flow once.
fn run_ask_mode(args: Args) -> ExitCode {
    match run_ask(args) {
        Ok(passed) => {
            if passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_FAILURE)
            }
        }
        Err(e) => {
            eprintln!("sqlgate: error: {e:#}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

fn run_ask(args: Args) -> Result<bool> {
    let config = GateConfig::from_args(&args)?;
    let question = args.ask.clone().expect("ask mode requires a question");

    let Some(generator_config) = config.generator.clone() else {
        bail!("ask mode needs a generator endpoint; pass --generator-url or set SQLGATE_GENERATOR_URL");
    };

    let schema = load_schema(&args, &config)?;
    let generator = OpenAiGenerator::new(generator_config, schema);

    let runtime = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
    runtime.block_on(async {
        let limits = RunLimits {
            max_attempts: config.max_attempts,
            max_rows: config.max_rows,
        };

        let outcome = generate_and_validate(
            &generator,
            &question,
            args.page,
            args.page_size,
            &config.allowlist,
            limits,
        )
        .await;

        match outcome {
            FinalResult::Validated {
                sql,
                warnings,
                attempts,
                ..
            } => {
                if !args.quiet {
                    for issue in &warnings {
                        eprintln!("sqlgate: warning: {}: {}", issue.code, issue.message);
                    }
                    if !attempts.is_empty() {
                        eprintln!("sqlgate: validated after {} repair attempt(s)", attempts.len());
                    }
                }
                println!("{sql}");

                execute_and_print(&config, &sql).await?;
                Ok(true)
            }
            FinalResult::Rejected { issues, attempts } => {
                eprintln!(
                    "sqlgate: request denied after {} repair attempt(s):",
                    attempts.len()
                );
                for issue in &issues {
                    eprintln!("  {}  {}", issue.code, issue.message);
                }
                Ok(false)
            }
        }
    })
}

#[cfg(feature = "executor")]
async fn execute_and_print(config: &GateConfig, sql: &str) -> Result<()> {
    use sqlgate_cli::exec::{ExecutionBackend, SqlxBackend};
    use std::time::Duration;

    let Some(url) = &config.database_url else {
        return Ok(());
    };

    let backend = SqlxBackend::connect(url, config.max_rows, Duration::from_secs(30))
        .await
        .context("failed to connect to database")?;
    let result = backend.execute(sql).await.context("query execution failed")?;

    println!("{}", output::format_rows(&result));
    if result.has_more {
        eprintln!("sqlgate: result truncated at {} rows", result.row_count);
    }
    Ok(())
}

#[cfg(not(feature = "executor"))]
async fn execute_and_print(_config: &GateConfig, _sql: &str) -> Result<()> {
    Ok(())
}

fn load_schema(args: &Args, config: &GateConfig) -> Result<SchemaContext> {
    let schema = match &args.schema_file {
        Some(path) => SchemaContext::from_file(path)?,
        None => SchemaContext::adventureworks(),
    };
    Ok(schema.restricted_to(&config.allowlist))
}

/// Run the HTTP API server.
#[cfg(feature = "serve")]
fn run_serve_mode(args: Args) -> ExitCode {
    use sqlgate_cli::server::{self, AppState};

    let config = match GateConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("sqlgate: error: {e:#}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let schema = match load_schema(&args, &config) {
        Ok(schema) => schema,
        Err(e) => {
            eprintln!("sqlgate: error: {e:#}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let generator: Option<Arc<dyn sqlgate_cli::generator::CandidateGenerator>> = config
        .generator
        .clone()
        .map(|generator_config| {
            Arc::new(OpenAiGenerator::new(generator_config, schema.clone()))
                as Arc<dyn sqlgate_cli::generator::CandidateGenerator>
        });

    let runtime = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");

    let executor = match runtime.block_on(connect_executor(&config)) {
        Ok(executor) => executor,
        Err(e) => {
            eprintln!("sqlgate: error: {e:#}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let state = Arc::new(AppState::new(config, schema, generator, executor));

    match runtime.block_on(server::run_server(state, args.port)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("sqlgate: error: {e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

#[cfg(all(feature = "serve", feature = "executor"))]
async fn connect_executor(
    config: &GateConfig,
) -> Result<Option<Arc<dyn sqlgate_cli::exec::ExecutionBackend>>> {
    use sqlgate_cli::exec::SqlxBackend;
    use std::time::Duration;

    let Some(url) = &config.database_url else {
        return Ok(None);
    };
    let backend = SqlxBackend::connect(url, config.max_rows, Duration::from_secs(30))
        .await
        .context("failed to connect to database")?;
    Ok(Some(Arc::new(backend)))
}

#[cfg(all(feature = "serve", not(feature = "executor")))]
async fn connect_executor(
    _config: &GateConfig,
) -> Result<Option<Arc<dyn sqlgate_cli::exec::ExecutionBackend>>> {
    Ok(None)
}
