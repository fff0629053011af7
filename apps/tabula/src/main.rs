//! # Tabula - Tableau Reasoner
//!
//! The command-line driver for the `tabula-core` reasoner.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  apps/tabula (THE BINARY)                │
//! │                                                          │
//! │  ┌─────────────┐    ┌──────────────┐    ┌────────────┐   │
//! │  │    CLI      │    │   Document   │    │   Config   │   │
//! │  │   (clap)    │    │ (JSON/TOML)  │    │   (TOML)   │   │
//! │  └──────┬──────┘    └──────┬───────┘    └─────┬──────┘   │
//! │         └──────────────────┼──────────────────┘          │
//! │                            ▼                             │
//! │                    ┌───────────────┐                     │
//! │                    │  tabula-core  │                     │
//! │                    │(THE REASONER) │                     │
//! │                    └───────────────┘                     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! tabula -f family.toml info
//! tabula -f family.toml consistent
//! tabula -f family.toml subsumes Mother Parent
//! tabula -f family.toml --unique-names explain
//! tabula -f family.json --json-mode instances Parent
//! ```

use clap::Parser;
use tabula::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // TABULA_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("TABULA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tabula=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
