//! # Warden - Capability & Workflow Decision CLI
//!
//! The main binary for the Warden decision engine.
//!
//! This application provides:
//! - CLI interface for capability and transition decisions
//! - Snapshot seeding into a redb-backed store
//! - Optimistic phase changes against stored entities
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │              apps/warden (THE BINARY)          │
//! │                                                │
//! │  ┌──────────────┐        ┌─────────────────┐  │
//! │  │   CLI        │        │  Snapshot files │  │
//! │  │  (clap)      │        │  (serde_json)   │  │
//! │  └──────┬───────┘        └────────┬────────┘  │
//! │         │                         │           │
//! │         └────────────┬────────────┘           │
//! │                      ▼                        │
//! │              ┌───────────────┐                │
//! │              │  warden-core  │                │
//! │              │  (THE LOGIC)  │                │
//! │              └───────────────┘                │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! warden init
//! warden seed -f snapshot.json
//! warden show -e 10
//! warden inspect -f snapshot.json -u ana@example.org -e 10
//! warden transition -e 10 -u ana@example.org --expected 64 --target 256
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warden::cli;

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Initialize tracing — WARDEN_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("WARDEN_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "warden=debug,warden_core=debug"
    } else {
        "warden=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Display startup banner
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Warden startup banner.
fn print_banner() {
    println!(
        r#"
  ██╗    ██╗ █████╗ ██████╗ ██████╗ ███████╗███╗   ██╗
  ██║    ██║██╔══██╗██╔══██╗██╔══██╗██╔════╝████╗  ██║
  ██║ █╗ ██║███████║██████╔╝██║  ██║█████╗  ██╔██╗ ██║
  ██║███╗██║██╔══██║██╔══██╗██║  ██║██╔══╝  ██║╚██╗██║
  ╚███╔███╔╝██║  ██║██║  ██║██████╔╝███████╗██║ ╚████║
   ╚══╝╚══╝ ╚═╝  ╚═╝╚═╝  ╚═╝╚═════╝ ╚══════╝╚═╝  ╚═══╝

  Capability & Workflow Decision Engine v{}

  Deterministic • Explicit • Fail-Closed
"#,
        env!("CARGO_PKG_VERSION")
    );
}
