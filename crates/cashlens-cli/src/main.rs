//! Cashlens CLI - Transaction classifier and spending reports
//!
//! Usage:
//!   cashlens report --file FILE       Full report (text or --json)
//!   cashlens report --file FILE --months 3   Report on the last three months
//!   cashlens classify --file FILE     Category for every transaction
//!   cashlens categories               List the category registry
//!   cashlens rules test "COFFEE"      Show which rules match a description

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let config = commands::load_config(cli.config.as_deref())?;
    let rules = cli.rules.as_deref();

    match cli.command {
        Commands::Report {
            file,
            json,
            top,
            threshold,
            from,
            to,
            months,
        } => {
            let options = commands::ReportOptions {
                top,
                threshold,
                from,
                to,
                months,
            };
            commands::cmd_report(&file, config, rules, json, &options)
        }
        Commands::Classify { file, json } => commands::cmd_classify(&file, &config, rules, json),
        Commands::Categories => commands::cmd_categories(),
        Commands::Rules { action } => match action {
            None | Some(RulesAction::List) => commands::cmd_rules_list(&config, rules),
            Some(RulesAction::Test {
                description,
                raw_type,
                amount,
            }) => commands::cmd_rules_test(
                &config,
                rules,
                &description,
                raw_type.as_deref(),
                amount,
            ),
        },
    }
}
