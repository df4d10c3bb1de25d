//! # equipscope
//!
//! Command-line front end for equipment CSV analysis.
//!
//! ```bash
//! equipscope analyze plant.csv --insights
//! equipscope sample
//! equipscope history
//! equipscope show <SESSION_ID> --insights
//! equipscope key set gemini <API_KEY>
//! ```

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use equipscope::commands::{analysis, config as config_cmd, health, history, keychain};
use equipscope::config::load_settings_or_default;
use equipscope::history::{Session, SessionSummary};
use equipscope::insights::Insight;

/// equipscope - chemical equipment CSV analysis
#[derive(Parser)]
#[command(name = "equipscope")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an equipment CSV, save it to history and print its statistics
    Analyze {
        /// CSV file with a header row (Equipment Name, Type, Flowrate, Pressure, Temperature)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Also request AI insights for the records
        #[arg(long)]
        insights: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Load the built-in sample dataset as a new session
    Sample {
        #[arg(long)]
        insights: bool,

        #[arg(long)]
        json: bool,
    },

    /// List recent sessions, newest first
    History {
        #[arg(long)]
        json: bool,
    },

    /// Reload a past session
    Show {
        #[arg(value_name = "SESSION_ID")]
        id: String,

        /// Request fresh AI insights for the session's records
        #[arg(long)]
        insights: bool,

        #[arg(long)]
        json: bool,
    },

    /// Manage provider API keys in the OS keychain
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Read or change preferences
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Report configuration, history and credential status
    Health {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    /// Store an API key
    Set { provider: String, key: String },
    /// Show whether an API key is stored
    Get { provider: String },
    /// Remove a stored API key
    Delete { provider: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print a preference (ai_provider, ai_model, request_timeout_secs, history_db)
    Get { key: String },
    /// Change a preference; an empty value clears optional keys
    Set { key: String, value: String },
}

/// Session plus the insights requested alongside it.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionOutput<'a> {
    session: &'a Session,
    #[serde(skip_serializing_if = "Option::is_none")]
    insights: Option<&'a [Insight]>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    equipscope::init_tracing(cli.verbose);

    let settings = load_settings_or_default();

    match cli.command {
        Commands::Analyze {
            file,
            insights,
            json,
        } => {
            let store = analysis::open_history(&settings).map_err(|e| anyhow!(e))?;
            let session = analysis::upload_csv(&store, &file).map_err(|e| anyhow!(e))?;
            report_session(&settings, &session, insights, json).await?;
        }
        Commands::Sample { insights, json } => {
            let store = analysis::open_history(&settings).map_err(|e| anyhow!(e))?;
            let session = analysis::load_sample(&store).map_err(|e| anyhow!(e))?;
            report_session(&settings, &session, insights, json).await?;
        }
        Commands::History { json } => {
            let store = analysis::open_history(&settings).map_err(|e| anyhow!(e))?;
            let sessions = history::list_history_sessions(&store);
            if json {
                println!("{}", serde_json::to_string_pretty(&sessions)?);
            } else {
                print_history(&sessions);
            }
        }
        Commands::Show { id, insights, json } => {
            let store = analysis::open_history(&settings).map_err(|e| anyhow!(e))?;
            let session = history::get_history_session(&store, &id).map_err(|e| anyhow!(e))?;
            report_session(&settings, &session, insights, json).await?;
        }
        Commands::Key { action } => match action {
            KeyAction::Set { provider, key } => {
                keychain::set_api_key(&provider, &key).map_err(|e| anyhow!(e))?;
                println!("Stored API key for {}", provider);
            }
            KeyAction::Get { provider } => {
                match keychain::get_api_key(&provider).map_err(|e| anyhow!(e))? {
                    Some(key) => println!("{}: set ({})", provider, mask_key(&key)),
                    None => println!("{}: not set", provider),
                }
            }
            KeyAction::Delete { provider } => {
                keychain::delete_api_key(&provider).map_err(|e| anyhow!(e))?;
                println!("Deleted API key for {}", provider);
            }
        },
        Commands::Config { action } => match action {
            ConfigAction::Get { key } => {
                match config_cmd::get_preference(&key).map_err(|e| anyhow!(e))? {
                    Some(value) => println!("{}", value),
                    None => println!("(unset)"),
                }
            }
            ConfigAction::Set { key, value } => {
                config_cmd::set_preference(&key, &value).map_err(|e| anyhow!(e))?;
                println!("{} = {}", key, value);
            }
        },
        Commands::Health { json } => {
            let report = health::run_health_check(&settings);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Config:   {} ({})", report.config_path, present(report.config_present));
                println!(
                    "History:  {} ({} sessions{})",
                    report.history_db_path,
                    report.history_sessions,
                    if !report.history_db_present {
                        ", not created yet"
                    } else if !report.history_db_accessible {
                        ", not accessible"
                    } else {
                        ""
                    }
                );
                println!("Provider: {} / {}", report.active_provider, report.active_model);
                for p in &report.providers {
                    println!(
                        "  {:<11} {}",
                        p.provider,
                        if p.api_key_set { "key set" } else { "no key" }
                    );
                }
            }
        }
    }

    Ok(())
}

async fn report_session(
    settings: &equipscope::config::Settings,
    session: &Session,
    with_insights: bool,
    json: bool,
) -> Result<()> {
    let insights = if with_insights {
        Some(analysis::generate_insights(settings, &session.records).await)
    } else {
        None
    };

    if json {
        let output = SessionOutput {
            session,
            insights: insights.as_deref(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_session(session);
    if let Some(insights) = insights {
        print_insights(&insights);
    }
    Ok(())
}

fn print_session(session: &Session) {
    let stats = &session.stats;
    println!("Session {} ({})", session.id, session.timestamp);
    println!("File:             {}", session.file_name);
    println!("Equipment count:  {}", stats.total_count);
    println!("Avg flowrate:     {:.1} m³/h", stats.avg_flowrate);
    println!("Avg pressure:     {:.1} bar", stats.avg_pressure);
    println!("Avg temperature:  {:.1} °C", stats.avg_temperature);

    if !stats.type_distribution.is_empty() {
        println!("Type distribution:");
        for (kind, count) in &stats.type_distribution {
            let label = if kind.is_empty() { "(none)" } else { kind.as_str() };
            println!("  {:<16} {}", label, count);
        }
    }

    if !session.records.is_empty() {
        println!();
        println!(
            "{:<24} {:<12} {:>10} {:>10} {:>10}",
            "Name", "Type", "Flowrate", "Pressure", "Temp"
        );
        for r in &session.records {
            println!(
                "{:<24} {:<12} {:>10.1} {:>10.1} {:>10.1}",
                r.name, r.equipment_type, r.flowrate, r.pressure, r.temperature
            );
        }
    }
}

fn print_insights(insights: &[Insight]) {
    println!();
    if insights.is_empty() {
        println!("No AI insights available (see log output with -v for details).");
        return;
    }
    println!("AI insights:");
    for (i, insight) in insights.iter().enumerate() {
        println!("{}. [{} risk] {}", i + 1, insight.risk_level, insight.title);
        println!("   Observation:    {}", insight.observation);
        println!("   Recommendation: {}", insight.recommendation);
    }
}

fn print_history(sessions: &[SessionSummary]) {
    if sessions.is_empty() {
        println!("No sessions yet. Run `equipscope analyze <FILE>` or `equipscope sample`.");
        return;
    }
    for s in sessions {
        println!(
            "{}  {}  {:<28} {:>4} items  flow {:.1}  press {:.1}",
            s.id, s.timestamp, s.file_name, s.total_count, s.avg_flowrate, s.avg_pressure
        );
    }
}

fn present(flag: bool) -> &'static str {
    if flag {
        "present"
    } else {
        "missing, using defaults"
    }
}

fn mask_key(key: &str) -> String {
    let tail: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("...{}", tail)
}
