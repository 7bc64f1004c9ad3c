mod cli;
mod config;
mod db;
mod error;
mod logic;
mod models;

use anyhow::{bail, Context};
use clap::Parser;
use cli::{Cli, Commands, MachineCommand};
use config::Config;
use db::Database;
use logic::host::run_worker;
use logic::normalizer::validate_strict;
use logic::rules::engine::RULE_BASE_VERSION;
use logic::{EvaluationHost, RulesEngine};
use models::{AnalysisRecord, AnalysisRequest, AnalysisResponse, Machine};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logs go to stderr; stdout carries responses and the worker protocol.
    let default_filter = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Worker => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            run_worker(stdin.lock(), stdout.lock())?;
        }
        Commands::Init => {
            Config::setup_interactive()?;
        }
        Commands::Check => run_check(&cli)?,
        Commands::Rules => print_rules(),
        Commands::Analyze {
            ref input,
            json,
            facts,
            strict,
            no_history,
            mode,
        } => {
            let ok = run_analyze(
                &cli,
                AnalyzeOptions {
                    input: input.clone(),
                    json,
                    facts,
                    strict,
                    no_history,
                    mode,
                },
            )
            .await?;
            if !ok {
                std::process::exit(1);
            }
        }
        Commands::Machines { ref action } => run_machines(&cli, action)?,
        Commands::History { limit } => run_history(&cli, limit)?,
    }

    Ok(())
}

struct AnalyzeOptions {
    input: Option<PathBuf>,
    json: bool,
    facts: bool,
    strict: bool,
    no_history: bool,
    mode: Option<config::WorkerMode>,
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    Config::load(cli.config.as_ref()).context("Failed to load configuration")
}

fn open_database(cli: &Cli, config: &Config) -> anyhow::Result<Database> {
    let path = config.db_path(cli.data_dir.as_ref())?;
    Database::open(&path).with_context(|| format!("Failed to open database at {}", path.display()))
}

/// Returns whether the analysis succeeded.
async fn run_analyze(cli: &Cli, opts: AnalyzeOptions) -> anyhow::Result<bool> {
    let mut config = load_config(cli)?;
    if let Some(mode) = opts.mode {
        config.host.mode = mode;
    }

    let raw = match &opts.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            buf
        }
    };

    // The payload is kept as received for the history record.
    let decoded = serde_json::from_str::<serde_json::Value>(&raw).and_then(|payload| {
        serde_json::from_value::<AnalysisRequest>(payload.clone()).map(|request| (payload, request))
    });
    let (payload, request) = match decoded {
        Ok(decoded) => decoded,
        Err(e) => {
            let response = AnalysisResponse::failure(format!("invalid request: {}", e));
            print_response(&response, &opts)?;
            return Ok(false);
        }
    };

    if opts.strict {
        if let Err(e) = validate_strict(&request) {
            print_response(&AnalysisResponse::failure(e.to_string()), &opts)?;
            return Ok(false);
        }
    }

    let db = if opts.no_history && request.machines.is_some() {
        None
    } else {
        Some(open_database(cli, &config)?)
    };

    let machines = match (&db, &request.machines) {
        (Some(db), None) => Some(db.available_machine_types()?),
        _ => None,
    };

    let host = EvaluationHost::new(&config);
    let outcome = host.run(&request, machines.as_ref()).await;
    tracing::debug!(
        state = %outcome.state,
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        "Worker finished"
    );
    let response = outcome.response;

    if let (Some(db), false) = (&db, opts.no_history) {
        if let Some(record) = AnalysisRecord::from_outcome(&payload, &request, &response) {
            let id = db.record_analysis(&record)?;
            tracing::debug!(analysis = id, "Analysis stored");
        }
    }

    print_response(&response, &opts)?;
    Ok(response.is_success())
}

fn print_response(response: &AnalysisResponse, opts: &AnalyzeOptions) -> anyhow::Result<()> {
    if opts.json {
        println!("{}", serde_json::to_string_pretty(response)?);
        return Ok(());
    }

    match response {
        AnalysisResponse::Failure { error, .. } => {
            println!("Analysis failed: {}", error);
        }
        AnalysisResponse::Success {
            recommendations,
            facts,
            ..
        } => {
            match response.headline() {
                Some(headline) => println!("{}", headline.desc),
                None => println!("No rule applies to this lot"),
            }
            println!();
            for rec in recommendations {
                println!(
                    "  {} {:<20} {}",
                    rec.kind.symbol(),
                    rec.kind.label(),
                    rec.desc
                );
            }

            if opts.facts {
                println!();
                println!("Facts:");
                for (predicate, value) in facts.iter() {
                    println!("  {:<26} {}", predicate.as_str(), value);
                }
            }
        }
    }

    Ok(())
}

fn print_rules() {
    let engine = RulesEngine::new();
    println!("Rule base {} ({} rules)", RULE_BASE_VERSION, engine.len());
    println!();
    for rule in engine.list_rules() {
        println!(
            "  {:<5} {:<18} {:<9} {:<32} {}",
            rule.id,
            rule.family.as_str(),
            rule.kind.as_str(),
            rule.conclusion.as_str(),
            rule.name
        );
    }
}

fn run_machines(cli: &Cli, action: &MachineCommand) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    let db = open_database(cli, &config)?;

    match action {
        MachineCommand::List => {
            let machines = db.list_machines()?;
            if machines.is_empty() {
                println!("No machines registered");
            }
            for machine in &machines {
                let class = machine
                    .machine_type
                    .resolve()
                    .map(|t| t.code())
                    .unwrap_or("?");
                println!(
                    "  #{:<4} {:<28} {:<16} {}",
                    machine.id.unwrap_or_default(),
                    machine.name,
                    class,
                    if machine.available { "available" } else { "unavailable" }
                );
            }

            println!();
            println!("Machine types:");
            for machine_type in db.list_machine_types()? {
                println!(
                    "  {:<16} {:<20} {}",
                    machine_type.code.as_deref().unwrap_or("-"),
                    machine_type.name,
                    machine_type.description
                );
            }
        }
        MachineCommand::Add {
            name,
            machine_type,
            unavailable,
        } => {
            let Some(record) = db.find_machine_type(machine_type)? else {
                bail!("Unknown machine type '{}'", machine_type);
            };
            let mut machine = Machine::new(name.as_str(), record);
            machine.available = !unavailable;
            let id = db.create_machine(&machine)?;
            println!("Added machine #{} ({})", id, machine.machine_type.name);
        }
        MachineCommand::SetAvailable { id, available } => {
            db.set_machine_available(*id, *available)?;
            println!(
                "Machine #{} is now {}",
                id,
                if *available { "available" } else { "unavailable" }
            );
        }
        MachineCommand::Remove { id } => {
            db.delete_machine(*id)?;
            println!("Removed machine #{}", id);
        }
    }

    Ok(())
}

fn run_history(cli: &Cli, limit: usize) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    let db = open_database(cli, &config)?;

    let records = db.recent_analyses(limit)?;
    if records.is_empty() {
        println!("No analyses recorded yet");
        return Ok(());
    }

    for record in records {
        println!(
            "#{:<5} {}  {:<18} {:<10} {:>8.1}  {}",
            record.id.unwrap_or_default(),
            record.created_at.format("%Y-%m-%d %H:%M"),
            record.category,
            record.species.as_deref().unwrap_or("-"),
            record.volume,
            record.headline.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

fn run_check(cli: &Cli) -> anyhow::Result<()> {
    println!("EcoWood check");
    println!();

    let config = load_config(cli)?;
    println!("  [OK] Config loaded");
    println!(
        "       engine: profit margin {}, compost market {}, gardening demand {}",
        config.engine.profit_margin,
        config.engine.assume_compost_market,
        config.engine.assume_gardening_demand
    );
    println!(
        "       host: {} mode, timeout {} ms",
        config.host.mode.as_str(),
        config.host.timeout_ms
    );

    if let Some(program) = &config.host.worker_program {
        if program.exists() {
            println!("  [OK] Worker program {}", program.display());
        } else {
            println!("  [!!] Worker program {} not found", program.display());
        }
    }

    let db = open_database(cli, &config)?;
    println!(
        "  [OK] Database {} (schema v{})",
        db.path().display(),
        db.schema_version()?
    );

    let machines = db.list_machines()?;
    let available = db.available_machine_types()?;
    println!(
        "       {} machines, available types: {}",
        machines.len(),
        if available.is_empty() {
            "none".to_string()
        } else {
            available.codes().join(", ")
        }
    );

    let engine = RulesEngine::new();
    println!("  [OK] Rule base {} ({} rules)", RULE_BASE_VERSION, engine.len());

    Ok(())
}
