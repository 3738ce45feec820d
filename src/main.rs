use anyhow::{Result, bail};
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use segscribe::cli::{Cli, Commands};
use segscribe::config::Config;
use segscribe::diagnostics::check_dependencies;
use segscribe::output::StderrReporter;
use segscribe::remote::speech::HttpSpeechClient;
use segscribe::remote::store::HttpObjectStore;
use segscribe::source::LocalSourceFetcher;
use segscribe::{PipelineOrchestrator, SystemCommandExecutor, defaults};
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Check) => {
            let config = load_config(cli.config.as_deref());
            if !check_dependencies(&config) {
                std::process::exit(1);
            }
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "segscribe",
                &mut std::io::stdout(),
            );
        }
        None => {
            run_transcription(cli)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Config {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path);
    Config::load_or_default(&path).with_env_overrides()
}

fn run_transcription(cli: Cli) -> Result<()> {
    let Some(source) = cli.source else {
        bail!("no source given; pass a media file path (see --help)");
    };

    let mut config = load_config(cli.config.as_deref());
    if let Some(bucket) = cli.bucket {
        config.staging.bucket = bucket;
    }
    if let Some(language) = cli.language {
        config.recognition.language = language;
    }
    if let Some(segment) = cli.segment {
        config.pipeline.segment_secs = segment;
    }
    if let Some(poll_interval) = cli.poll_interval {
        config.recognition.poll_interval_secs = poll_interval;
    }
    if let Some(max_attempts) = cli.max_attempts {
        config.recognition.max_attempts = max_attempts;
    }
    if let Some(workers) = cli.workers {
        config.pipeline.worker_limit = workers;
    }

    let token = std::env::var(defaults::TOKEN_ENV).unwrap_or_default();
    if token.is_empty() {
        eprintln!(
            "{}",
            format!(
                "warning: {} is not set; remote requests will be unauthenticated",
                defaults::TOKEN_ENV
            )
            .yellow()
        );
    }

    let store = Arc::new(HttpObjectStore::new(&config.staging, token.clone()));
    let backend = Arc::new(HttpSpeechClient::new(&config.recognition, token));
    let reporter = Arc::new(StderrReporter::new(cli.quiet));

    let orchestrator = PipelineOrchestrator::new(
        Box::new(LocalSourceFetcher::new()),
        Arc::new(SystemCommandExecutor::new()),
        store,
        backend,
        config,
    )
    .with_reporter(reporter);

    let report = match orchestrator.run(&source) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.transcript);
        if !report.unfinished_segment_indices.is_empty() {
            eprintln!(
                "{}",
                format!(
                    "unfinished segments: {:?}",
                    report.unfinished_segment_indices
                )
                .yellow()
            );
        }
        if !cli.quiet {
            eprintln!("elapsed: {:.1}s", report.elapsed_seconds);
        }
    }

    Ok(())
}
