//! # Tally Register
//!
//! Headless register: replays a recorded ticket through a
//! [`CheckoutSession`] against the in-memory sale service and prints what
//! the cashier would have seen.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         tally-register                                  │
//! │                                                                         │
//! │  ticket.json ──► Ticket ──► replay() ──► CheckoutSession ──► commit    │
//! │                     │                         │                 │       │
//! │                     │                         │                 ▼       │
//! │                     └── serverStock ──► InMemorySaleGateway             │
//! │                                                                         │
//! │  register.toml ──► RegisterConfig (store, checkout defaults)           │
//! │                                                                         │
//! │  stdout: outcome { receipt, warnings, error } as JSON, or text         │
//! │  stderr: tracing logs (RUST_LOG)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Exit Codes
//! - `0`: sale committed
//! - `1`: the sale was refused (validation, stock, service)
//! - `2`: the ticket or an explicit register.toml could not be read

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use tally_checkout::{CheckoutSession, ConfigError, ErrorReport, RegisterConfig};

pub mod render;
pub mod ticket;

use crate::render::{write_outcome_json, write_outcome_text};
use crate::ticket::{replay, Ticket};

const USAGE: &str = "usage: tally-register <ticket.json> [register.toml] [--text]";

/// Logs go to stderr so stdout stays machine-readable.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tally_checkout=debug,tally_register=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Command line arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub ticket: PathBuf,
    pub config: Option<PathBuf>,
    pub text: bool,
}

impl Args {
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        let mut text = false;
        let mut positional = Vec::new();

        for arg in args {
            match arg.as_str() {
                "--text" => text = true,
                flag if flag.starts_with("--") => bail!("unknown flag {}\n{}", flag, USAGE),
                path => positional.push(PathBuf::from(path)),
            }
        }

        let mut positional = positional.into_iter();
        let Some(ticket) = positional.next() else {
            bail!("missing ticket path\n{}", USAGE);
        };
        let config = positional.next();
        if positional.next().is_some() {
            bail!("too many arguments\n{}", USAGE);
        }

        Ok(Args {
            ticket,
            config,
            text,
        })
    }
}

/// Explicit config paths must load; without one, fall back to defaults.
pub fn load_config(path: Option<PathBuf>) -> Result<RegisterConfig, ErrorReport> {
    match path {
        Some(path) => {
            let loaded = std::fs::metadata(&path)
                .map_err(ConfigError::from)
                .and_then(|_| RegisterConfig::load(Some(path)));
            loaded.map_err(|e| ErrorReport::from(&e))
        }
        None => Ok(RegisterConfig::load_or_default(None)),
    }
}

pub async fn run(args: &[String]) -> anyhow::Result<ExitCode> {
    let args = Args::parse(args)?;

    let config = match load_config(args.config.clone()) {
        Ok(config) => config,
        Err(report) => {
            error!(code = ?report.code, "{}", report.message);
            let mut out = std::io::stdout().lock();
            serde_json::to_writer_pretty(&mut out, &report)?;
            writeln!(out)?;
            return Ok(ExitCode::from(2));
        }
    };
    debug!(?config, "Register config loaded");

    let contents = std::fs::read_to_string(&args.ticket)
        .with_context(|| format!("failed to read ticket {}", args.ticket.display()))?;
    let ticket: Ticket = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse ticket {}", args.ticket.display()))?;
    info!(
        products = ticket.products.len(),
        actions = ticket.actions.len(),
        "Replaying ticket"
    );

    let gateway = ticket.gateway().await;
    let mut session = CheckoutSession::new(config.checkout.clone());
    let outcome = replay(&ticket, &mut session, &gateway, &config.store).await;

    let mut out = std::io::stdout().lock();
    if args.text {
        write_outcome_text(&mut out, &outcome, config.store.currency_decimals)?;
    } else {
        write_outcome_json(&mut out, &outcome)?;
    }

    Ok(if outcome.receipt.is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_args_parse() {
        let parsed = Args::parse(&args(&["sale.json", "--text", "register.toml"])).unwrap();
        assert_eq!(
            parsed,
            Args {
                ticket: PathBuf::from("sale.json"),
                config: Some(PathBuf::from("register.toml")),
                text: true,
            }
        );

        let parsed = Args::parse(&args(&["sale.json"])).unwrap();
        assert_eq!(parsed.config, None);
        assert!(!parsed.text);
    }

    #[test]
    fn test_args_rejected() {
        assert!(Args::parse(&[]).is_err());
        assert!(Args::parse(&args(&["a.json", "b.toml", "c"])).is_err());
        assert!(Args::parse(&args(&["a.json", "--verbose"])).is_err());
    }

    #[test]
    fn test_explicit_config_must_load() {
        let report = load_config(Some(PathBuf::from("/nonexistent/register.toml"))).unwrap_err();
        assert_eq!(report.code, tally_checkout::ErrorCode::Config);
        assert!(report.message.starts_with("Failed to read config file"));
    }

    #[tokio::test]
    async fn test_missing_ticket_is_an_error() {
        let err = run(&args(&["/nonexistent/ticket.json"])).await.unwrap_err();
        assert!(format!("{:#}", err).contains("failed to read ticket"));
    }
}
