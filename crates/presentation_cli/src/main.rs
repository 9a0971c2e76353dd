//! formrelay CLI
//!
//! Command-line interface for schema setup, configuration checks and
//! submission follow-up.

#![allow(clippy::print_stdout)]

mod submissions;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use domain::SubmissionStatus;
use infrastructure::{AppConfig, AsyncDatabase, AsyncDatabaseConfig, ConfigValidator};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// formrelay CLI
#[derive(Parser)]
#[command(name = "formrelay-cli")]
#[command(author, version, about = "formrelay website form backend CLI", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (defaults to ./config.toml when present)
    #[arg(short, long, env = "FORMRELAY_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    Migrate,

    /// Load the configuration and report problems
    ///
    /// Prints a redacted summary; secrets are only reported as set or unset.
    CheckConfig,

    /// Inspect and follow up on stored submissions
    Submissions {
        #[command(subcommand)]
        action: SubmissionAction,
    },

    /// Check a running server
    Status {
        /// Server URL
        #[arg(short, long, default_value = "http://localhost:3000")]
        url: String,
    },
}

#[derive(Subcommand)]
enum SubmissionAction {
    /// List the most recent submissions
    List {
        /// Only show rows with this status (unread, read, replied, archived)
        #[arg(short, long)]
        status: Option<SubmissionStatus>,

        /// Maximum number of rows
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },

    /// Change the follow-up status of a submission
    SetStatus {
        /// Row id
        id: i64,

        /// New status (unread, read, replied, archived)
        status: SubmissionStatus,

        /// Replace the operator notes
        #[arg(short, long)]
        notes: Option<String>,
    },
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Format endpoint URL
fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    let path = path.map(|p| p.to_string_lossy().into_owned());
    let mut config = AppConfig::load_from(path.as_deref())?;
    config.apply_env_credentials(|key| std::env::var(key).ok());
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = log_filter_from_verbosity(cli.verbose);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Migrate => {
            let config = load_config(cli.config.as_ref())?;
            let database = AsyncDatabase::new(&AsyncDatabaseConfig::from(&config.database)).await?;
            let applied = database.migrate().await?;
            database.close().await;

            println!("✅ Schema is up to date ({})", config.database.path);
            println!("   Migrations applied: {applied}");
        },

        Commands::CheckConfig => {
            let config = load_config(cli.config.as_ref())?;
            let warnings = ConfigValidator::validate(&config);

            println!("🔧 Configuration:");
            println!("{}", serde_json::to_string_pretty(&config.redacted_summary())?);
            println!();

            if warnings.is_empty() {
                println!("✅ No configuration issues found");
            } else {
                println!("⚠️  {} issue(s):", warnings.len());
                for w in &warnings {
                    println!("   [{}] {} {}", w.severity, w.code, w.message);
                    println!("       → {}", w.recommendation);
                }
            }

            if warnings.iter().any(|w| w.is_critical()) && config.is_production() {
                println!();
                println!("❌ The server will refuse to start with this configuration");
                std::process::exit(1);
            }
        },

        Commands::Submissions { action } => {
            let config = load_config(cli.config.as_ref())?;
            let (database, store) = submissions::open_store(&config.database).await?;

            match action {
                SubmissionAction::List { status, limit } => {
                    let rows = submissions::list(&store, status, limit).await?;
                    println!("{}", submissions::render_table(&rows));
                },
                SubmissionAction::SetStatus { id, status, notes } => {
                    submissions::set_status(&store, id, status, notes).await?;
                    println!("✅ Submission {id} marked as {status}");
                },
            }

            database.close().await;
        },

        Commands::Status { url } => {
            let client = reqwest::Client::new();

            match client.get(endpoint_url(&url, "/health")).send().await {
                Ok(resp) if resp.status().is_success() => {
                    let body = resp.json::<serde_json::Value>().await?;
                    println!("✅ Server is up");
                    println!("{}", serde_json::to_string_pretty(&body)?);
                },
                Ok(resp) => {
                    println!("❌ Unhealthy: HTTP {}", resp.status());
                    std::process::exit(1);
                },
                Err(e) => {
                    println!("❌ Unreachable: {e}");
                    std::process::exit(1);
                },
            }

            if let Ok(resp) = client.get(endpoint_url(&url, "/ready")).send().await {
                let ready = resp.status().is_success();
                let body = resp.json::<serde_json::Value>().await.unwrap_or_default();
                println!();
                println!("{} Readiness:", if ready { "📊" } else { "⚠️ " });
                println!("{}", serde_json::to_string_pretty(&body)?);
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(args)
    }

    #[test]
    fn log_filter_verbosity_levels() {
        assert_eq!(log_filter_from_verbosity(0), "warn");
        assert_eq!(log_filter_from_verbosity(1), "info");
        assert_eq!(log_filter_from_verbosity(2), "debug");
        assert_eq!(log_filter_from_verbosity(10), "trace");
    }

    #[test]
    fn endpoint_url_trims_trailing_slash() {
        assert_eq!(
            endpoint_url("http://example.com/", "/health"),
            "http://example.com/health"
        );
        assert_eq!(
            endpoint_url("http://localhost:3000", "/ready"),
            "http://localhost:3000/ready"
        );
    }

    #[test]
    fn parses_list_with_filter() {
        let cli = parse(&["formrelay-cli", "submissions", "list", "--status", "replied", "-l", "5"])
            .unwrap();
        match cli.command {
            Commands::Submissions {
                action: SubmissionAction::List { status, limit },
            } => {
                assert_eq!(status, Some(SubmissionStatus::Replied));
                assert_eq!(limit, 5);
            },
            _ => panic!("expected submissions list"),
        }
    }

    #[test]
    fn parses_set_status_with_notes() {
        let cli = parse(&[
            "formrelay-cli",
            "submissions",
            "set-status",
            "42",
            "archived",
            "--notes",
            "spam",
        ])
        .unwrap();
        match cli.command {
            Commands::Submissions {
                action: SubmissionAction::SetStatus { id, status, notes },
            } => {
                assert_eq!(id, 42);
                assert_eq!(status, SubmissionStatus::Archived);
                assert_eq!(notes.as_deref(), Some("spam"));
            },
            _ => panic!("expected set-status"),
        }
    }

    #[test]
    fn rejects_unknown_status() {
        assert!(parse(&["formrelay-cli", "submissions", "set-status", "1", "done"]).is_err());
    }

    #[test]
    fn status_defaults_to_localhost() {
        let cli = parse(&["formrelay-cli", "status"]).unwrap();
        match cli.command {
            Commands::Status { url } => assert_eq!(url, "http://localhost:3000"),
            _ => panic!("expected status"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = parse(&["formrelay-cli", "migrate", "--config", "/etc/formrelay.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/formrelay.toml")));
        assert!(matches!(cli.command, Commands::Migrate));
    }
}
