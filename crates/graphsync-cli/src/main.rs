//! graphsync - synchronise a diagram workspace with its triple store

mod prompt;

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use graphsync_core::prelude::*;
use graphsync_core::context_tokens_from_url;
use graphsync_gateway::HttpGateway;
use prompt::LinePrompt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .short('c')
        .default_value("graphsync.toml")
        .value_parser(value_parser!(PathBuf))
        .help("Path to the configuration file")
}

fn cli() -> Command {
    Command::new("graphsync")
        .version(graphsync_core::VERSION)
        .about("Keep a diagram workspace consistent with its triple store")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("sync")
                .about("Run a full synchronisation")
                .arg(config_arg())
                .arg(
                    Arg::new("vocabulary")
                        .long("vocabulary")
                        .action(ArgAction::Append)
                        .help("Vocabulary context IRI, repeatable"),
                )
                .arg(
                    Arg::new("url")
                        .long("url")
                        .help("Workspace URL carrying vocabulary query parameters"),
                )
                .arg(
                    Arg::new("language")
                        .long("language")
                        .help("Interface language, overriding the configuration"),
                )
                .arg(
                    Arg::new("yes")
                        .long("yes")
                        .action(ArgAction::SetTrue)
                        .help("Delete obsolete diagrams without asking"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output the report as JSON"),
                ),
        )
        .subcommand(
            Command::new("check-config")
                .about("Validate a configuration file")
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("contexts")
                .about("List the context tokens of a workspace URL")
                .arg(Arg::new("url").required(true).help("Workspace URL")),
        )
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(args: &ArgMatches) -> Result<SyncConfig> {
    let path = args
        .get_one::<PathBuf>("config")
        .context("no configuration path")?;
    SyncConfig::load(path).with_context(|| format!("failed to load {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("sync", args)) => {
            let report = sync(args).await?;
            std::process::exit(if report.is_success() { 0 } else { 1 });
        }
        Some(("check-config", args)) => {
            let config = load_config(args)?;
            config.validate()?;

            println!("Configuration OK");
            println!("  Endpoint: {}", config.context_endpoint);
            println!("  Application context: {}", config.application_context);
            println!(
                "  Cache context: {}",
                config.cache_context.as_deref().unwrap_or("(none)")
            );
            println!("  Interface language: {}", config.interface_language);
            println!(
                "  Languages: {}",
                config.languages.keys().cloned().collect::<Vec<_>>().join(", ")
            );
            println!("  Link batch size: {}", config.link_batch_size);
            Ok(())
        }
        Some(("contexts", args)) => {
            let url = args.get_one::<String>("url").context("no URL given")?;
            let tokens = context_tokens_from_url(url);
            if tokens.is_empty() {
                bail!("{url} carries no vocabulary parameter");
            }
            for token in tokens {
                println!("{token}");
            }
            Ok(())
        }
        Some((other, _)) => bail!("unknown command {other}"),
        None => bail!("no command given"),
    }
}

async fn sync(args: &ArgMatches) -> Result<SyncReport> {
    let mut config = load_config(args)?;
    if let Some(language) = args.get_one::<String>("language") {
        config.interface_language.clone_from(language);
    }

    let mut tokens: Vec<String> = args
        .get_many::<String>("vocabulary")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    if let Some(url) = args.get_one::<String>("url") {
        tokens.extend(context_tokens_from_url(url));
    }

    let gateway = HttpGateway::new(Duration::from_secs(config.request_timeout_secs))
        .context("failed to build HTTP client")?;
    let engine = SyncEngine::new(config, Arc::new(gateway))?;
    let mut ws = engine.workspace();

    let prompt: Box<dyn ConfirmationPrompt> = if args.get_flag("yes") {
        Box::new(FixedAnswer(true))
    } else {
        Box::new(LinePrompt::stdin())
    };
    let report = engine.synchronize(&mut ws, &tokens, prompt.as_ref()).await?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report_json(&report, &ws))?);
    } else {
        print_report(&report, &ws);
    }
    Ok(report)
}

fn workspace_name(ws: &Workspace) -> &str {
    ws.settings
        .name
        .get(&ws.settings.interface_language)
        .map_or("(unnamed)", String::as_str)
}

fn print_report(report: &SyncReport, ws: &Workspace) {
    println!("Synchronisation Report:");
    println!("  Workspace: {}", workspace_name(ws));
    println!("  Contexts: {}", report.contexts.len());
    println!("  Diagrams: {}", report.diagrams);
    if let Some(vocabulary) = &report.vocabulary {
        println!("  Vocabularies: {}", vocabulary.vocabularies.len());
        println!("  New terms: {}", vocabulary.terms.new_terms);
    }
    if let Some(data) = &report.context_data {
        println!("  Elements: {}", data.elements);
        println!("  Links: {}", data.links);
        println!("  Deleted elements: {}", data.reconcile.deleted_elements.len());
        println!("  Links added: {}", data.connections.added);
        println!("  Links deactivated: {}", data.connections.deactivated);
    }
    match &report.obsolete {
        Some(ObsoleteOutcome::Deleted { diagrams, .. }) => {
            println!("  Obsolete diagrams deleted: {}", diagrams.len());
        }
        Some(ObsoleteOutcome::Declined { diagrams }) => {
            println!("  Obsolete diagrams kept: {}", diagrams.len());
        }
        Some(ObsoleteOutcome::NoneFound) | None => {}
    }
    match &report.failed {
        None => println!("  Status: COMPLETE"),
        Some((step, error)) => println!("  Status: FAILED at {step}: {error}"),
    }
}

fn report_json(report: &SyncReport, ws: &Workspace) -> serde_json::Value {
    let completed: Vec<String> = report.completed.iter().map(ToString::to_string).collect();
    serde_json::json!({
        "version": graphsync_core::VERSION,
        "workspace": ws.settings.name,
        "contexts": report.contexts.iter().map(|c| c.as_str()).collect::<Vec<_>>(),
        "completed": completed,
        "failed": report.failed.as_ref().map(|(step, error)| {
            serde_json::json!({ "step": step.to_string(), "error": error })
        }),
        "diagrams": report.diagrams,
        "vocabularies": report.vocabulary.as_ref().map_or(0, |v| v.vocabularies.len()),
        "new_terms": report.vocabulary.as_ref().map_or(0, |v| v.terms.new_terms),
        "links_added": report.context_data.as_ref().map_or(0, |d| d.connections.added),
        "links_deactivated": report.context_data.as_ref().map_or(0, |d| d.connections.deactivated),
        "obsolete_deleted": matches!(report.obsolete, Some(ObsoleteOutcome::Deleted { .. })),
    })
}
