//! # Tally Register Entry Point
//!
//! ## Startup Sequence
//! 1. Initialize tracing (stderr)
//! 2. Load register.toml + `TALLY_*` overrides
//! 3. Replay the ticket against a fresh checkout session
//! 4. Print the receipt, or the error report, to stdout

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    tally_register::init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match tally_register::run(&args).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}
