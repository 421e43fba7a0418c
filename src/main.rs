use chrono::NaiveDate;
use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use dealboard::board::{MoveOutcome, PipelineBoard};
use dealboard::domain::Deal;
use dealboard::storage::{DealStore, PipelineStore};

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dealboard")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("dealboard.log");

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

/// Open the store and build the board from config stages plus stored deals.
fn open_board(config: &Config) -> Result<(PipelineBoard<PipelineStore>, Arc<PipelineStore>)> {
    let store = Arc::new(
        PipelineStore::open(&config.storage.data_dir).context("Failed to open deal store")?,
    );
    let deals = store.list_deals().context("Failed to load deals")?;
    let board = PipelineBoard::new(config.stages(), deals, store.clone())
        .context("Failed to build pipeline board")?;
    Ok((board, store))
}

/// Format a monetary amount with thousands separators, no cents.
fn format_currency(amount: f64) -> String {
    let whole = amount.round() as i64;
    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("${}", grouped)
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        // Default: render the board
        None | Some(Commands::Board) => handle_board_command(config),
        Some(Commands::List { stage }) => handle_list_command(stage.as_deref(), config),
        Some(Commands::Move { deal_id, target }) => handle_move_command(deal_id, target, config),
        Some(Commands::Add {
            title,
            value,
            stage,
            probability,
            lead,
            property,
            close_date,
            notes,
        }) => handle_add_command(
            title,
            *value,
            stage,
            *probability,
            lead.as_deref(),
            property.as_deref(),
            *close_date,
            notes.as_deref(),
            config,
        ),
        Some(Commands::Stats) => handle_stats_command(config),
        Some(Commands::Stages) => handle_stages_command(config),
        Some(Commands::Seed) => handle_seed_command(config),
    }
}

fn handle_board_command(config: &Config) -> Result<()> {
    let (board, _store) = open_board(config)?;

    for stage in board.stages() {
        let totals = board.totals_for_stage(&stage.id)?;
        println!(
            "{} ({})  {}",
            stage.name.color(stage.color.as_str()).bold(),
            totals.deal_count,
            format_currency(totals.total_value)
        );

        for deal in board.deals_for_stage(&stage.id)? {
            println!(
                "  {}  {}  {}  {}% likely",
                deal.id.dimmed(),
                deal.title,
                format_currency(deal.value).green(),
                deal.probability
            );
        }
        println!();
    }

    Ok(())
}

fn handle_list_command(stage: Option<&str>, config: &Config) -> Result<()> {
    info!("Listing deals - stage: {:?}", stage);
    let (board, _store) = open_board(config)?;

    let deals = match stage {
        Some(stage_id) => board.deals_for_stage(stage_id)?,
        None => board.deals().iter().collect(),
    };

    if deals.is_empty() {
        println!("{}", "No deals found".yellow());
        return Ok(());
    }

    for deal in deals {
        let stage_name = board
            .stage(&deal.stage_id)
            .map(|s| s.name.as_str())
            .unwrap_or(deal.stage_id.as_str());
        println!(
            "{}  {}  {}  {}  {}% likely",
            deal.id.dimmed(),
            deal.title,
            stage_name.cyan(),
            format_currency(deal.value).green(),
            deal.probability
        );
    }

    Ok(())
}

fn handle_move_command(deal_id: &str, target: &str, config: &Config) -> Result<()> {
    info!("Moving deal {} onto {}", deal_id, target);
    let (mut board, _store) = open_board(config)?;

    board.begin_drag(deal_id)?;
    match board.complete_drag(deal_id, target) {
        Ok(MoveOutcome::Moved {
            from_stage,
            to_stage,
            from_totals,
            to_totals,
        }) => {
            let to_name = board
                .stage(&to_stage)
                .map(|s| s.name.as_str())
                .unwrap_or(to_stage.as_str());
            println!("{} {}", "Deal moved to".green(), to_name.green().bold());
            println!(
                "  {}: {} deals, {}",
                from_stage,
                from_totals.deal_count,
                format_currency(from_totals.total_value)
            );
            println!(
                "  {}: {} deals, {}",
                to_stage,
                to_totals.deal_count,
                format_currency(to_totals.total_value)
            );
            Ok(())
        }
        Ok(MoveOutcome::SameStage) => {
            println!("{}", "Deal is already in that stage; nothing to do".yellow());
            Ok(())
        }
        Ok(MoveOutcome::NoTarget) => {
            println!(
                "{} {}",
                format!("'{}' is neither a stage nor a deal;", target).yellow(),
                "move cancelled".yellow()
            );
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "Failed to move deal:".red(), e);
            println!("{}", "The deal was left in its original stage".red());
            Err(e.into())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_add_command(
    title: &str,
    value: f64,
    stage: &str,
    probability: u8,
    lead: Option<&str>,
    property: Option<&str>,
    close_date: Option<NaiveDate>,
    notes: Option<&str>,
    config: &Config,
) -> Result<()> {
    info!("Creating deal '{}' in stage {}", title, stage);
    let (mut board, store) = open_board(config)?;

    let mut deal = Deal::new(title, stage, value, probability);
    deal.lead_id = lead.map(str::to_string);
    deal.property_id = property.map(str::to_string);
    deal.expected_close_date = close_date;
    deal.notes = notes.map(str::to_string);

    // Board validation first (stage exists, fields in range), then persist
    board.add_deal(deal.clone())?;
    store.create_deal(&deal)?;

    println!(
        "{} {} {} {}",
        "Created".green(),
        deal.id.bold(),
        "in".green(),
        stage.cyan()
    );
    Ok(())
}

fn handle_stats_command(config: &Config) -> Result<()> {
    let (board, _store) = open_board(config)?;
    let stats = board.stats();

    println!("Total Pipeline Value  {}", format_currency(stats.total_value).bold());
    println!("Active Deals          {}", stats.deal_count.to_string().bold());
    println!("Avg. Deal Size        {}", format_currency(stats.average_value).bold());
    println!("Weighted Forecast     {}", format_currency(stats.weighted_value).bold());

    Ok(())
}

fn handle_stages_command(config: &Config) -> Result<()> {
    let (board, _store) = open_board(config)?;

    for stage in board.stages() {
        println!(
            "{}. {} ({})",
            stage.order,
            stage.name.color(stage.color.as_str()).bold(),
            stage.id.dimmed()
        );
    }

    Ok(())
}

fn handle_seed_command(config: &Config) -> Result<()> {
    info!("Seeding demo deals");
    let (mut board, store) = open_board(config)?;

    if !board.deals().is_empty() {
        println!("{}", "Store already contains deals; seed skipped".yellow());
        return Ok(());
    }

    let deals = demo_deals();
    let count = deals.len();
    for deal in deals {
        board.add_deal(deal.clone())?;
        store.create_deal(&deal)?;
    }

    println!("{} {} demo deals", "Seeded".green(), count);
    Ok(())
}

/// Demo data: one deal per persona the sample pipeline ships with.
fn demo_deals() -> Vec<Deal> {
    let mut condo = Deal::new("Downtown Condo Sale", "viewing", 450000.0, 75);
    condo.lead_id = Some("lead-1".to_string());
    condo.property_id = Some("prop-1".to_string());
    condo.expected_close_date = NaiveDate::from_ymd_opt(2024, 2, 15);
    condo.notes = Some("Client very interested, scheduling second viewing".to_string());

    let mut family = Deal::new("Family Home Purchase", "negotiation", 680000.0, 90);
    family.lead_id = Some("lead-2".to_string());
    family.property_id = Some("prop-2".to_string());
    family.expected_close_date = NaiveDate::from_ymd_opt(2024, 2, 20);
    family.notes = Some("Offer submitted, waiting for response".to_string());

    let mut investment = Deal::new("Investment Property", "qualified", 320000.0, 60);
    investment.lead_id = Some("lead-3".to_string());
    investment.property_id = Some("prop-3".to_string());
    investment.expected_close_date = NaiveDate::from_ymd_opt(2024, 3, 1);
    investment.notes = Some("Investor looking for rental properties".to_string());

    let mut penthouse = Deal::new("Luxury Penthouse", "new", 1200000.0, 40);
    penthouse.lead_id = Some("lead-4".to_string());
    penthouse.property_id = Some("prop-4".to_string());
    penthouse.expected_close_date = NaiveDate::from_ymd_opt(2024, 3, 15);
    penthouse.notes = Some("High-end client, needs special attention".to_string());

    let mut starter = Deal::new("Starter Home", "qualified", 280000.0, 70);
    starter.lead_id = Some("lead-5".to_string());
    starter.property_id = Some("prop-5".to_string());
    starter.expected_close_date = NaiveDate::from_ymd_opt(2024, 2, 28);
    starter.notes = Some("First-time buyers, need guidance".to_string());

    vec![condo, family, investment, penthouse, starter]
}

fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
