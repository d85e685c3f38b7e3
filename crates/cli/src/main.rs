mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sensorsafe_testgen_core::{
    load_config, validate_download, validate_policy, Config, HttpConfig, HttpTransport,
    PolicyInjector, ReqwestTransport, RetrievalDriver, RuleSynthesizer, SanitizedConfig,
};

use cli::{Cli, Command, RulesCommand};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    info!("Loading configuration from {:?}", cli.config);
    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

    let sanitized = serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default();
    info!("Configuration loaded: {}", sanitized);

    match cli.command {
        Command::Download { dry_run } => download(&config, dry_run).await,
        Command::Rules { command } => rules(&config, command).await,
    }
}

fn transport(config: &HttpConfig) -> Result<Arc<dyn HttpTransport>> {
    let transport = ReqwestTransport::new(config).context("Failed to create HTTP client")?;
    Ok(Arc::new(transport))
}

async fn download(config: &Config, dry_run: bool) -> Result<()> {
    let download = config.download()?;
    validate_download(download).context("Configuration validation failed")?;

    let driver = RetrievalDriver::new(download.clone(), transport(&config.http)?);

    if dry_run {
        let requests = driver.enumerate_requests()?;
        for request in &requests {
            let http = driver.build_request(request);
            println!("{}\t{}", request.filename(), http.url);
        }
        info!("{} requests (dry run, nothing sent)", requests.len());
        return Ok(());
    }

    ensure_dir(&download.output_dir).await?;

    let summary = driver.run().await?;
    for failure in &summary.failures {
        error!(
            "{}/{} aborted at {}: {}",
            failure.feed, failure.channel, failure.filename, failure.error
        );
    }

    if !summary.is_success() {
        bail!(
            "{} of {} streams failed ({} downloads completed)",
            summary.failures.len(),
            summary.streams,
            summary.dispatched
        );
    }

    info!(
        "Downloaded {} files from {} streams",
        summary.dispatched, summary.streams
    );
    Ok(())
}

async fn ensure_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("Failed to create output directory {:?}", path))
}

async fn rules(config: &Config, command: RulesCommand) -> Result<()> {
    let policy = config.policy()?;
    validate_policy(policy).context("Configuration validation failed")?;

    let injector = PolicyInjector::from_config(policy, transport(&config.http)?);

    let Some(workflow) = command.workflow() else {
        let rules = injector.list_rules().await?;
        let macros = injector.list_macros().await?;
        let listing = serde_json::json!({
            "rules": rules,
            "macros": macros,
        });
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    };

    let synthesizer = RuleSynthesizer::new(policy.target_streams.clone(), policy.origin)?
        .with_priority(command.priority());
    let steps = workflow.plan(&synthesizer);

    if command.dry_run() {
        for step in &steps {
            match step.json_body()? {
                Some(body) => println!("{}\t{}", step, body),
                None => println!("{}", step),
            }
        }
        info!("{} steps (dry run, nothing sent)", steps.len());
        return Ok(());
    }

    let completed = injector.run(&steps).await?;
    info!("Policy injection complete ({} requests)", completed);
    Ok(())
}
