//! `beam-cli` – the BeamLab command line.
//!
//! 1. Loads `~/.beamlab/config.toml`, running a short first-run wizard when
//!    the file is absent.
//! 2. Loads the scenario named on the command line (or the configured
//!    default) and replays its events.
//! 3. Drops into an interactive REPL (`/help` lists the commands).
//!
//! Ctrl-C exits immediately with status 130.

mod config;
mod repl;
mod scenario;
mod telemetry;

use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

fn main() {
    let _guard = telemetry::init_tracing("beamlab");

    print_banner();

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – exiting BeamLab.".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
        // The REPL is blocked on stdin; leave without waiting for a line.
        std::process::exit(130);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler");
    }

    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!("  Config loaded from {}", config::config_path().display().to_string().bold());
            cfg
        }
        Ok(None) => run_first_run_wizard(),
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::load_or_default()
        }
    };

    let scenario_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| cfg.default_scenario.clone());

    let mut session = repl::Session::new(cfg);
    if let Some(path) = scenario_path {
        session.execute(repl::Command::Load(path));
    }

    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    repl::run(shutdown, session);
}

// ─────────────────────────────────────────────────────────────────────────────
// First-Run Wizard
// ─────────────────────────────────────────────────────────────────────────────

fn run_first_run_wizard() -> config::Config {
    println!();
    println!("{}", "  ╔══════════════════════════════════════╗".bold().cyan());
    println!("{}", "  ║      BeamLab First-Run Wizard        ║".bold().cyan());
    println!("{}", "  ╚══════════════════════════════════════╝".bold().cyan());
    println!();
    println!("  No configuration found.  Let's set up BeamLab.\n");

    let mut cfg = config::Config::default();

    println!("  Which overlap estimator should trackers use?");
    println!("    1) Closed form  (default, fast approximation)");
    println!("    2) Monte Carlo  (sampled, slower)");
    if prompt_line("  Enter choice [1]: ", "1").trim() == "2" {
        cfg.estimator = config::EstimatorKind::MonteCarlo;

        let samples = prompt_line(
            &format!("  Samples per estimate [{}]: ", cfg.monte_carlo_samples),
            &cfg.monte_carlo_samples.to_string(),
        );
        if let Ok(n) = samples.trim().parse::<usize>() {
            cfg.monte_carlo_samples = n;
        }
        let seed = prompt_line(&format!("  RNG seed [{}]: ", cfg.seed), &cfg.seed.to_string());
        if let Ok(s) = seed.trim().parse::<u64>() {
            cfg.seed = s;
        }
    }

    match config::save(&cfg) {
        Ok(()) => println!(
            "\n  {} Config saved to {}\n",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }

    config::apply_env_overrides(&mut cfg);
    cfg
}

fn print_banner() {
    println!();
    println!("{}", r#"   ___                    __        __ "#.bold().cyan());
    println!("{}", r#"  / _ )___ ___ ___ _ ___ / /  ___ _/ / "#.bold().cyan());
    println!("{}", r#" / _  / -_) _ `/  ' \/ // /__/ _ `/ _ \"#.bold().cyan());
    println!("{}", r#"/____/\__/\_,_/_/_/_/_/ /____/\_,_/_.__/"#.bold().cyan());
    println!();
    println!("  {} {}", "BeamLab".bold(), format!("v{}", env!("CARGO_PKG_VERSION")).dimmed());
    println!("  Beam overlap tracking and link budgets");
    println!();
}

fn prompt_line(msg: &str, default: &str) -> String {
    use std::io::{BufRead, Write};
    print!("{}", msg);
    std::io::stdout().flush().ok();
    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(_) => {
            let t = line.trim().to_string();
            if t.is_empty() { default.to_string() } else { t }
        }
        Err(_) => default.to_string(),
    }
}
