//! AutoDVIC command-line interface.
//!
//! Drives the fleet portal through a launched or attached Chromium
//! instance: validates configuration, extracts vehicle facts, keeps the
//! action control injected, and runs inspection submissions.

use anyhow::{bail, Context, Result};
use autodvic_core::{report_fields, AppConfig, FieldValue, InspectionSubmission, Message, StateStore};
use autodvic_flow::{extract_vehicle_info, ButtonInjector, FlowOutcome, SubmissionFlow};
use autodvic_portal::{PortalBrowser, SelectorConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "autodvic", version, about = "DVIC submission automation for the fleet portal")]
struct Cli {
    /// Rehearse the flow without clicking the final submit
    #[arg(long, global = true)]
    dev_mode: bool,

    /// Selector registry TOML overriding the built-in defaults
    #[arg(long, global = true, value_name = "FILE")]
    selectors: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate configuration, selector registry, and issue catalog
    Validate,
    /// Extract vehicle info from the current portal page and store it
    Extract,
    /// Run a submission described by a JSON file
    Submit {
        /// Path to the submission JSON
        file: PathBuf,
    },
    /// Keep the action control injected and service clicks until Ctrl-C
    Watch,
    /// Print the report field map for a submission JSON file
    Fields {
        /// Path to the submission JSON
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load_with_env().context("load configuration")?;
    if cli.dev_mode {
        config.general.dev_mode = true;
    }
    config.validate().context("validate configuration")?;

    let selectors = match cli.selectors.as_ref().or(config.general.selectors_file.as_ref()) {
        Some(path) => SelectorConfig::load_from(path).context("load selector registry")?,
        None => SelectorConfig::default(),
    };

    match cli.command {
        Command::Validate => validate(&selectors),
        Command::Extract => extract(&config, &selectors).await,
        Command::Submit { file } => submit(&config, &selectors, &file).await,
        Command::Watch => watch(&config, &selectors).await,
        Command::Fields { file } => fields(&config, &file),
    }
}

fn state_store() -> Result<StateStore> {
    let dir = AppConfig::data_dir().context("determine data directory")?;
    Ok(StateStore::new(dir.join("state.json")))
}

async fn connect(config: &AppConfig) -> Result<autodvic_portal::cdp::CdpPage> {
    let browser = match &config.portal.websocket_url {
        Some(ws_url) => PortalBrowser::connect(ws_url)
            .await
            .context("attach to running browser")?,
        None => PortalBrowser::launch(config.portal.headless)
            .await
            .context("launch browser")?,
    };
    browser
        .portal_page(&config.portal.base_url)
        .await
        .context("locate portal tab")
}

fn validate(selectors: &SelectorConfig) -> Result<()> {
    selectors.validate().context("selector registry")?;
    println!("selector registry: ok");

    match autodvic_issues::validate_catalog() {
        Ok(()) => {
            println!(
                "issue catalog: ok ({} issues, {} form IDs)",
                autodvic_issues::TEXT_BY_ID.len(),
                autodvic_issues::EXPECTED_ISSUE_IDS.len()
            );
            Ok(())
        }
        Err(errors) => {
            for error in &errors {
                eprintln!("  {error}");
            }
            bail!("issue catalog: {} problems", errors.len());
        }
    }
}

async fn extract(config: &AppConfig, selectors: &SelectorConfig) -> Result<()> {
    let page = connect(config).await?;
    let info = extract_vehicle_info(&page, &selectors.vehicle)
        .await
        .context("extract vehicle info")?;

    state_store()?
        .record_vehicle_info(&info)
        .context("persist vehicle info")?;

    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

async fn submit(config: &AppConfig, selectors: &SelectorConfig, file: &PathBuf) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("read {}", file.display()))?;
    let mut submission: InspectionSubmission =
        serde_json::from_str(&contents).context("parse submission JSON")?;

    if submission.dsp.is_empty() {
        submission.dsp.clone_from(&config.identity.dsp_code);
    }
    if submission.station.is_empty() {
        submission.station.clone_from(&config.identity.station_code);
    }
    submission.validate().context("validate submission")?;

    let page = connect(config).await?;
    let (events, mut rx) = mpsc::unbounded_channel();
    let logger = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            log_message(&message);
        }
    });

    let flow = SubmissionFlow::new(&page, selectors, config.general.dev_mode, events);
    let outcome = flow.run(&submission).await.context("submission flow")?;

    match &outcome {
        FlowOutcome::Submitted => {
            state_store()?.record_submission(&submission)?;
            println!("inspection submitted");
        }
        FlowOutcome::SkippedDevMode => {
            state_store()?.record_submission(&submission)?;
            println!("dev mode: flow completed without submitting");
        }
        FlowOutcome::ManualCompletion { unresolved } => {
            println!(
                "{} issue(s) need manual selection; the portal was left on the defects page:",
                unresolved.len()
            );
            for issue in unresolved {
                println!("  - [{} / {}] {}", issue.category, issue.subcategory, issue.text);
            }
        }
    }

    logger.abort();
    Ok(())
}

async fn watch(config: &AppConfig, selectors: &SelectorConfig) -> Result<()> {
    let page = connect(config).await?;
    let store = state_store()?;
    let (events, mut rx) = mpsc::unbounded_channel();
    let logger = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            log_message(&message);
        }
    });

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    println!("watching portal; Ctrl-C to stop");
    let mut injector = ButtonInjector::new(selectors);
    injector
        .watch(&page, &store, &events, &cancel)
        .await
        .context("watch portal")?;

    logger.abort();
    Ok(())
}

fn fields(config: &AppConfig, file: &PathBuf) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("read {}", file.display()))?;
    let mut submission: InspectionSubmission =
        serde_json::from_str(&contents).context("parse submission JSON")?;

    if submission.dsp.is_empty() {
        submission.dsp.clone_from(&config.identity.dsp_code);
    }
    if submission.station.is_empty() {
        submission.station.clone_from(&config.identity.station_code);
    }

    let vehicle = state_store()?
        .load()
        .context("load state")?
        .vehicle_info
        .unwrap_or_default();

    let map = report_fields(&submission, &vehicle).context("build report fields")?;
    let json: serde_json::Map<String, serde_json::Value> = map
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                FieldValue::Text(text) => serde_json::Value::String(text),
                FieldValue::Checked(checked) => serde_json::Value::Bool(checked),
            };
            (key, value)
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&serde_json::Value::Object(json))?);
    println!();
    println!("filename: {}", autodvic_core::report_filename(&submission)?);
    Ok(())
}

fn log_message(message: &Message) {
    match message {
        Message::SubmissionError { error } => tracing::error!(error, "submission error"),
        Message::ShowNotification { title, message } | Message::ShowAlert { title, message } => {
            eprintln!("\n== {title} ==\n{message}\n");
        }
        Message::VehicleInfoUpdated { data } => {
            tracing::info!(lic = %data.lic, vin = %data.vin, "vehicle info updated");
        }
        Message::StartSubmission { .. } => tracing::info!("submission requested"),
        Message::OpenPopupFromPage => tracing::info!("operator form requested from page"),
    }
}
