//! AetherOS REPL.
//!
//! Reads one AetherLang command per line and prints one reply per command.
//! `exit`, `vale`, or end of input ends the session.
//!
//! ```text
//! aetheros --seed 42 --size 12 --regulator
//! RUST_LOG=debug aetheros --config session.json
//! ```

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use aether_core::{AetherConfig, Contextus, Regulator, SharedContextus};
use clap::Parser;
use log::{error, info};
use parking_lot::Mutex;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "AetherLang interpreter", long_about = None)]
struct Args {
    /// JSON session configuration. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the session RNG.
    #[arg(long)]
    seed: Option<u64>,

    /// Side length of every new grid.
    #[arg(long)]
    size: Option<usize>,

    /// Run the background regulator.
    #[arg(long, default_value_t = false)]
    regulator: bool,
}

fn load_config(args: &Args) -> Result<AetherConfig, String> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            AetherConfig::from_json(&text).map_err(|e| e.to_string())?
        }
        None => AetherConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(size) = args.size {
        config.grid_size = size;
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn is_farewell(line: &str) -> bool {
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("vale")
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            eprintln!("aetheros: {e}");
            return ExitCode::from(2);
        }
    };
    let ctx = match Contextus::new(config) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("aetheros: {e}");
            return ExitCode::from(2);
        }
    };
    let genesis = ctx.genesis_name().to_string();
    let shared: SharedContextus = Arc::new(Mutex::new(ctx));
    let regulator = args.regulator.then(|| Regulator::spawn(Arc::clone(&shared)));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let _ = writeln!(out, "< AetherOS online. Focus on '{genesis}'. >");

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();
    loop {
        let focus = shared.lock().focus().unwrap_or(&genesis).to_string();
        let _ = write!(out, "aetheros({focus})> ");
        let _ = out.flush();

        line.clear();
        match input.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                error!("stdin: {e}");
                break;
            }
        }
        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if is_farewell(command) {
            break;
        }

        let reply = shared.lock().execute(command);
        let _ = match reply {
            Ok(outcome) => writeln!(out, "< {outcome}"),
            Err(e) => writeln!(out, "< ERRORUM: {e}"),
        };
    }

    let _ = writeln!(out, "< VALE.");
    if let Some(handle) = regulator {
        handle.stop();
    }
    info!("session closed");
    ExitCode::SUCCESS
}
