use crate::config::WorkerMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ecowood", version, about = "Wood byproduct lot classifier")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override SQLite data directory
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze one lot (request JSON from a file, or stdin when omitted)
    Analyze {
        input: Option<PathBuf>,

        /// Print the wire response instead of a summary
        #[arg(long)]
        json: bool,

        /// Include the normalized facts in the summary
        #[arg(long)]
        facts: bool,

        /// Reject numeric fields that are not numbers instead of reading them as zero
        #[arg(long)]
        strict: bool,

        /// Do not store the result in the analysis history
        #[arg(long)]
        no_history: bool,

        /// Worker isolation, overriding the config file
        #[arg(long, value_enum)]
        mode: Option<WorkerMode>,
    },
    /// Evaluate one request from stdin and write the response to stdout
    #[command(hide = true)]
    Worker,
    /// List the rule catalog
    Rules,
    /// Manage the machinery catalog
    Machines {
        #[command(subcommand)]
        action: MachineCommand,
    },
    /// Show recent analyses
    History {
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
    /// Re-run interactive setup
    Init,
    /// Validate config and database
    Check,
}

#[derive(Subcommand)]
pub enum MachineCommand {
    /// List machines and machine types
    List,
    /// Register a machine
    Add {
        name: String,

        /// Machine type code or name (e.g. chipeadora, "Finger Joint")
        #[arg(short = 't', long = "type")]
        machine_type: String,

        /// Register the machine as out of service
        #[arg(long)]
        unavailable: bool,
    },
    /// Mark a machine as available or not
    SetAvailable {
        id: i64,

        #[arg(action = clap::ArgAction::Set, value_parser = clap::builder::BoolishValueParser::new())]
        available: bool,
    },
    /// Remove a machine
    Remove { id: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_analyze_flags() {
        let cli = Cli::try_parse_from([
            "ecowood", "analyze", "lot.json", "--strict", "--mode", "process", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Analyze {
                input,
                strict,
                mode,
                no_history,
                ..
            } => {
                assert_eq!(input, Some(PathBuf::from("lot.json")));
                assert!(strict);
                assert!(!no_history);
                assert_eq!(mode, Some(WorkerMode::Process));
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn parses_machine_availability() {
        let cli = Cli::try_parse_from(["ecowood", "machines", "set-available", "3", "no"]).unwrap();
        match cli.command {
            Commands::Machines {
                action: MachineCommand::SetAvailable { id, available },
            } => {
                assert_eq!(id, 3);
                assert!(!available);
            }
            _ => panic!("expected machines set-available"),
        }
    }
}
