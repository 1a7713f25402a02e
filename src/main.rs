use anyhow::Context;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use voucher_rollup::payload::OPERATIONS;
use voucher_rollup::{
    Deposit, EngineConfig, ExecutionEngine, Input, Metadata, Output, Rejection, Report,
    RollupState, VoucherRollup,
};

/// Runs the voucher rollup against JSON requests read line by line from stdin,
/// writing one JSON outcome per line to stdout.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Engine config (contract addresses and NFT bytecode)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// State snapshot, loaded on start and rewritten after every accepted input
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// Print the outbound operation table as JSON and exit
    #[arg(long)]
    schema: bool,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum HostRequest {
    Advance {
        metadata: Metadata,
        payload: serde_json::Value,
    },
    Deposit {
        metadata: Metadata,
        deposit: Deposit,
    },
    Inspect {
        payload: serde_json::Value,
    },
}

#[derive(Serialize, Debug)]
#[serde(tag = "status", rename_all = "snake_case")]
enum HostResponse {
    Accept { outputs: Vec<Output> },
    Reject { error: String, reports: Vec<Report> },
}

impl From<Rejection> for HostResponse {
    fn from(rejection: Rejection) -> Self {
        HostResponse::Reject {
            error: rejection.error.to_string(),
            reports: rejection.reports,
        }
    }
}

fn load_state(path: &Path) -> anyhow::Result<RollupState> {
    if !path.exists() {
        return Ok(RollupState::default());
    }
    let raw = std::fs::read(path).with_context(|| format!("reading state {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("parsing state {}", path.display()))
}

fn save_state(path: &Path, state: &RollupState) -> anyhow::Result<()> {
    std::fs::write(path, serde_json::to_vec(state)?)
        .with_context(|| format!("writing state {}", path.display()))
}

fn handle_request(
    rollup: &mut VoucherRollup,
    request: HostRequest,
) -> anyhow::Result<(HostResponse, bool)> {
    let (result, mutating) = match request {
        HostRequest::Advance { metadata, payload } => {
            let bytes = serde_json::to_vec(&payload)?;
            (rollup.advance(metadata, Input::Instruction(bytes.into())), true)
        }
        HostRequest::Deposit { metadata, deposit } => {
            (rollup.advance(metadata, Input::Deposit(deposit)), true)
        }
        HostRequest::Inspect { payload } => {
            let bytes = serde_json::to_vec(&payload)?;
            let result = rollup
                .inspect(&bytes)
                .map(|reports| reports.into_iter().map(Output::Report).collect::<Vec<_>>());
            (result, false)
        }
    };
    Ok(match result {
        Ok(outputs) => (HostResponse::Accept { outputs }, mutating),
        Err(rejection) => (rejection.into(), false),
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.schema {
        println!("{}", serde_json::to_string_pretty(&OPERATIONS)?);
        return Ok(());
    }

    let Some(config_path) = args.config else {
        return Err(anyhow::anyhow!("--config is required"));
    };
    let config = EngineConfig::load(&config_path)?;
    let state = match &args.state {
        Some(path) => load_state(path)?,
        None => RollupState::default(),
    };
    let mut rollup = VoucherRollup::with_state(config, state);
    info!(
        deployments = rollup.state().deployments.len(),
        "voucher rollup started"
    );

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<HostRequest>(&line) {
            Ok(request) => {
                let (response, commit) = handle_request(&mut rollup, request)?;
                if commit {
                    if let Some(path) = &args.state {
                        save_state(path, rollup.state())?;
                    }
                }
                response
            }
            Err(e) => {
                error!("malformed request: {e}");
                HostResponse::Reject {
                    error: format!("malformed request: {e}"),
                    reports: vec![],
                }
            }
        };
        serde_json::to_writer(&mut stdout, &response)?;
        writeln!(stdout)?;
        stdout.flush()?;
    }
    Ok(())
}
