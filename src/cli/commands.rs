//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - board: render the pipeline columns
//! - list: list deals, optionally per stage
//! - move: drag a deal onto a stage or another deal
//! - add: create a new deal
//! - stats / stages / seed: board metrics, stage set, demo data

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Dealboard - a sales pipeline deal board
#[derive(Parser, Debug)]
#[command(name = "dealboard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the pipeline board (default)
    Board,

    /// List deals
    List {
        /// Show only deals in this stage
        #[arg(short, long)]
        stage: Option<String>,
    },

    /// Move a deal onto a stage or onto another deal
    Move {
        /// Deal ID to move
        deal_id: String,

        /// Drop target: a stage id, or a deal id to join that deal's stage
        target: String,
    },

    /// Create a new deal
    Add {
        /// Deal title
        title: String,

        /// Monetary value
        #[arg(long)]
        value: f64,

        /// Stage the deal starts in
        #[arg(long)]
        stage: String,

        /// Close likelihood, 0-100
        #[arg(long, default_value_t = 50)]
        probability: u8,

        /// Associated lead record id
        #[arg(long)]
        lead: Option<String>,

        /// Associated property record id
        #[arg(long)]
        property: Option<String>,

        /// Expected close date (YYYY-MM-DD)
        #[arg(long)]
        close_date: Option<NaiveDate>,

        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Show pipeline statistics
    Stats,

    /// Show the configured stage set
    Stages,

    /// Populate an empty store with demo deals
    Seed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_no_args() {
        // No args should result in None command (board view)
        let cli = Cli::try_parse_from(["dealboard"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["dealboard", "-v"]).unwrap();
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["dealboard", "-c", "/path/to/config.yml"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/config.yml")));
    }

    #[test]
    fn test_board_command() {
        let cli = Cli::try_parse_from(["dealboard", "board"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Board)));
    }

    #[test]
    fn test_list_command() {
        let cli = Cli::try_parse_from(["dealboard", "list"]).unwrap();
        match cli.command {
            Some(Commands::List { stage }) => assert!(stage.is_none()),
            _ => panic!("Expected list command"),
        }
    }

    #[test]
    fn test_list_with_stage_filter() {
        let cli = Cli::try_parse_from(["dealboard", "list", "-s", "won"]).unwrap();
        match cli.command {
            Some(Commands::List { stage }) => assert_eq!(stage, Some("won".to_string())),
            _ => panic!("Expected list command"),
        }
    }

    #[test]
    fn test_move_command() {
        let cli = Cli::try_parse_from(["dealboard", "move", "deal-123", "won"]).unwrap();
        match cli.command {
            Some(Commands::Move { deal_id, target }) => {
                assert_eq!(deal_id, "deal-123");
                assert_eq!(target, "won");
            }
            _ => panic!("Expected move command"),
        }
    }

    #[test]
    fn test_add_command_defaults() {
        let cli = Cli::try_parse_from([
            "dealboard",
            "add",
            "Downtown Condo Sale",
            "--value",
            "450000",
            "--stage",
            "viewing",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Add {
                title,
                value,
                stage,
                probability,
                lead,
                close_date,
                ..
            }) => {
                assert_eq!(title, "Downtown Condo Sale");
                assert_eq!(value, 450000.0);
                assert_eq!(stage, "viewing");
                assert_eq!(probability, 50);
                assert!(lead.is_none());
                assert!(close_date.is_none());
            }
            _ => panic!("Expected add command"),
        }
    }

    #[test]
    fn test_add_command_with_close_date() {
        let cli = Cli::try_parse_from([
            "dealboard",
            "add",
            "Family Home Purchase",
            "--value",
            "680000",
            "--stage",
            "negotiation",
            "--probability",
            "90",
            "--close-date",
            "2024-02-20",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Add {
                probability,
                close_date,
                ..
            }) => {
                assert_eq!(probability, 90);
                assert_eq!(close_date, NaiveDate::from_ymd_opt(2024, 2, 20));
            }
            _ => panic!("Expected add command"),
        }
    }

    #[test]
    fn test_add_command_rejects_bad_date() {
        let result = Cli::try_parse_from([
            "dealboard",
            "add",
            "Deal",
            "--value",
            "1",
            "--stage",
            "new",
            "--close-date",
            "not-a-date",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_stats_command() {
        let cli = Cli::try_parse_from(["dealboard", "stats"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Stats)));
    }

    #[test]
    fn test_stages_command() {
        let cli = Cli::try_parse_from(["dealboard", "stages"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Stages)));
    }

    #[test]
    fn test_seed_command() {
        let cli = Cli::try_parse_from(["dealboard", "seed"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Seed)));
    }

    #[test]
    fn test_help_works() {
        // Verify help doesn't panic
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag() {
        let result = Cli::try_parse_from(["dealboard", "--version"]);
        // Version flag causes early exit with error (expected)
        assert!(result.is_err());
    }
}
