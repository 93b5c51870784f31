use bioplan::adapters::AdapterSet;
use bioplan::llm::OpenAiClient;
use bioplan::pipeline::{QueryOutcome, QueryPipeline};
use bioplan::plan::{
    ExecutionReport, ExplanationRenderer, Plan, PlanExecutor, PlanGenerator, PlanValidator, extract_plan_json,
};
use bioplan::prompt::PlanningPrompt;
use bioplan::registry::ToolRegistry;
use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bioplan")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("bioplan.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn load_registry(config: &Config) -> Result<Arc<ToolRegistry>> {
    let registry = match &config.catalog.path {
        Some(path) => ToolRegistry::from_file(path).context(format!("Failed to load catalog from {}", path.display()))?,
        None => ToolRegistry::builtin().context("Failed to load built-in catalog")?,
    };
    info!("Registry loaded with {} tools", registry.len());
    Ok(Arc::new(registry))
}

fn build_executor(registry: Arc<ToolRegistry>, config: &Config) -> Result<PlanExecutor> {
    let adapters = AdapterSet::standard(&config.sources).context("Failed to build data sources")?;
    for tool in registry.describe_tools() {
        if !adapters.has_adapter(&tool.name) {
            warn!("Tool {} has no data source; its steps will fail", tool.name);
        }
    }
    Ok(PlanExecutor::new(registry, adapters).with_step_timeout(config.executor.step_timeout()))
}

fn build_pipeline(registry: Arc<ToolRegistry>, config: &Config) -> Result<QueryPipeline> {
    let llm = OpenAiClient::from_env(&config.llm.api_key_env, config.llm.client_config())
        .context("Failed to create LLM client")?;

    let prompt = match &config.prompt.template_path {
        Some(path) => PlanningPrompt::from_file(&registry, path)?,
        None => PlanningPrompt::build(&registry)?,
    };

    let generator = PlanGenerator::new(Arc::new(llm), prompt, PlanValidator::new(registry.clone()))
        .with_settings(config.llm.generator_settings());
    let executor = build_executor(registry, config)?;
    let renderer = ExplanationRenderer::new(config.explanation.rationales.clone());

    Ok(QueryPipeline::new(generator, executor, renderer))
}

fn read_plan(path: &Path, registry: Arc<ToolRegistry>) -> Result<Plan> {
    let content = fs::read_to_string(path).context(format!("Failed to read plan file {}", path.display()))?;
    let json = extract_plan_json(&content)?;
    let plan = PlanValidator::new(registry).validate(&json)?;
    info!("Read plan with {} steps from {}", plan.len(), path.display());
    Ok(plan)
}

fn print_report(report: &ExecutionReport, verbose: bool) -> Result<()> {
    for step in &report.steps {
        let header = format!("[{}] {}.{}", step.step_index, step.tool_name, step.action);
        match (&step.data, &step.error_message) {
            (Some(data), _) => {
                println!("{} {} ({} ms)", "ok".green(), header.bold(), step.duration_ms);
                if verbose {
                    println!("{}", serde_json::to_string_pretty(data)?);
                }
            }
            (None, Some(message)) => println!("{} {}: {}", "error".red(), header.bold(), message),
            (None, None) => println!("{} {}", "error".red(), header.bold()),
        }
    }
    println!("{}", report.summary().cyan());
    Ok(())
}

fn print_outcome(outcome: &QueryOutcome, verbose: bool) -> Result<()> {
    if let Some(error) = &outcome.error {
        println!("{} {}", "Planning failed:".red(), error);
        if verbose {
            if let Some(raw) = &outcome.raw_response {
                println!("{}\n{}", "Model response:".yellow(), raw);
            }
        }
    }

    println!("{}", outcome.explanation);

    if outcome.has_plan() && !outcome.execution_report.is_empty() {
        println!();
        print_report(&outcome.execution_report, verbose)?;
    }
    Ok(())
}

async fn handle_ask_command(query: &str, json: bool, plan_only: bool, cli: &Cli, config: &Config) -> Result<()> {
    info!("Answering query: {}", query);
    let registry = load_registry(config)?;
    let pipeline = build_pipeline(registry, config)?;

    if !json {
        println!("{} {}", "Planning:".green(), query);
    }

    let outcome = if plan_only {
        pipeline.plan_only(query).await
    } else {
        pipeline.answer(query).await
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome, cli.is_verbose())?;
    }
    Ok(())
}

fn handle_tools_command(config: &Config) -> Result<()> {
    let registry = load_registry(config)?;
    for tool in registry.dependency_order() {
        println!("{} - {}", tool.name.bold(), tool.description);
        if let Some(dependency) = &tool.depends_on {
            println!("  {} {}", "after:".dimmed(), dependency);
        }
        for action in &tool.actions {
            println!("  {}", action.signature().cyan());
            println!("      {}", action.description);
        }
    }
    Ok(())
}

fn handle_explain_command(path: &Path, config: &Config) -> Result<()> {
    let registry = load_registry(config)?;
    let plan = read_plan(path, registry)?;
    let renderer = ExplanationRenderer::new(config.explanation.rationales.clone());
    println!("{}", renderer.render(&plan));
    Ok(())
}

async fn handle_run_command(path: &Path, json: bool, cli: &Cli, config: &Config) -> Result<()> {
    let registry = load_registry(config)?;
    let plan = read_plan(path, registry.clone())?;
    let executor = build_executor(registry, config)?;

    let report = executor.execute(&plan).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, cli.is_verbose())?;
    }
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Ask { query, json, plan_only } => handle_ask_command(query, *json, *plan_only, cli, config).await,
        Commands::Tools => handle_tools_command(config),
        Commands::Explain { plan } => handle_explain_command(plan, config),
        Commands::Run { plan, json } => handle_run_command(plan, *json, cli, config).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
