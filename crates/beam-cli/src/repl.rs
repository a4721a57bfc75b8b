//! REPL – the interactive BeamLab shell.
//!
//! Supported slash-commands:
//!   /help                  – show this list
//!   /load <file>           – load and replay a scenario
//!   /reports               – collision report for every beam
//!   /report <id> [json]    – one beam's report, optionally as JSON
//!   /records <id>          – per-partner overlap records
//!   /estimate <a> <b>      – compare the estimators on two loaded beams
//!   /fso [file] | /thz [file] – link budget from defaults or a TOML file
//!   /schema                – JSON schema of the scenario format
//!   /config                – show the active configuration
//!   /quit | /exit          – exit the CLI

use colored::Colorize;
use serde::de::DeserializeOwned;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use beam_geometry::{Estimator, bounds_overlap_volume, estimate_overlap_volume};
use beam_link::{FsoParameters, ThzParameters};
use beam_tracker::{BeamScene, VisualSink};
use beam_types::{BeamError, BeamId, VisualState};

use crate::config::{self, Config};
use crate::scenario::Scenario;

/// A parsed slash-command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Load(PathBuf),
    Reports,
    Report { id: BeamId, json: bool },
    Records(BeamId),
    Estimate { a: BeamId, b: BeamId },
    Fso(Option<PathBuf>),
    Thz(Option<PathBuf>),
    Schema,
    Config,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let head = words.next().unwrap_or_default();
        let args: Vec<&str> = words.collect();

        let cmd = match (head, args.as_slice()) {
            ("/help", []) => Command::Help,
            ("/load", [path]) => Command::Load(PathBuf::from(path)),
            ("/reports", []) => Command::Reports,
            ("/report", [id]) => Command::Report { id: (*id).into(), json: false },
            ("/report", [id, "json"]) => Command::Report { id: (*id).into(), json: true },
            ("/records", [id]) => Command::Records((*id).into()),
            ("/estimate", [a, b]) => Command::Estimate { a: (*a).into(), b: (*b).into() },
            ("/fso", []) => Command::Fso(None),
            ("/fso", [path]) => Command::Fso(Some(PathBuf::from(path))),
            ("/thz", []) => Command::Thz(None),
            ("/thz", [path]) => Command::Thz(Some(PathBuf::from(path))),
            ("/schema", []) => Command::Schema,
            ("/config", []) => Command::Config,
            ("/quit" | "/exit", []) => Command::Quit,
            ("/load" | "/report" | "/records" | "/estimate" | "/fso" | "/thz", _) => {
                return Err(format!("Bad arguments for {head}. Type /help for usage."));
            }
            _ => return Err(format!("Unknown command '{head}'. Type /help for available commands.")),
        };
        Ok(cmd)
    }
}

/// Prints color swaps as they happen: blue while a beam overlaps anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalSink;

impl VisualSink for TerminalSink {
    fn visual_state_changed(&mut self, beam: &BeamId, state: VisualState) {
        let label = format!("● {beam}");
        match state {
            VisualState::OverlapActive => println!("  {} overlapping", label.blue().bold()),
            VisualState::Default => println!("  {} clear", label.normal()),
        }
    }
}

/// Shell state: the active config and the currently loaded scene.
pub struct Session {
    config: Config,
    scene: Option<BeamScene<TerminalSink>>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self { config, scene: None }
    }

    #[cfg(test)]
    pub fn scene(&self) -> Option<&BeamScene<TerminalSink>> {
        self.scene.as_ref()
    }

    /// Load a scenario, replacing any scene already loaded.
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub fn load(&mut self, path: &Path) -> Result<usize, BeamError> {
        let scenario = Scenario::load(path)?;
        let mut scene = scenario.build_scene(self.config.estimator(), TerminalSink)?;
        let delivered = scenario.replay(&mut scene);
        self.scene = Some(scene);
        Ok(delivered)
    }

    fn loaded_scene(&self) -> Result<&BeamScene<TerminalSink>, String> {
        self.scene.as_ref().ok_or_else(|| "No scenario loaded. Use /load <file> first.".to_string())
    }

    /// Run one command.  Returns `false` when the shell should exit.
    pub fn execute(&mut self, cmd: Command) -> bool {
        let result = match cmd {
            Command::Help => {
                cmd_help();
                Ok(())
            }
            Command::Load(path) => self.cmd_load(&path),
            Command::Reports => self.cmd_reports(),
            Command::Report { id, json } => self.cmd_report(&id, json),
            Command::Records(id) => self.cmd_records(&id),
            Command::Estimate { a, b } => self.cmd_estimate(&a, &b),
            Command::Fso(path) => load_params::<FsoParameters>(path.as_deref()).map(|p| {
                let budget = p.compute();
                budget.log();
                println!("{budget}");
            }),
            Command::Thz(path) => load_params::<ThzParameters>(path.as_deref()).map(|p| {
                let budget = p.compute();
                budget.log();
                println!("{budget}");
            }),
            Command::Schema => Scenario::schema_json()
                .map(|s| println!("{s}"))
                .map_err(|e| e.to_string()),
            Command::Config => {
                self.cmd_config();
                Ok(())
            }
            Command::Quit => {
                println!("{}", "Goodbye.".green());
                return false;
            }
        };
        if let Err(e) = result {
            println!("{}: {}", "Error".red(), e);
        }
        true
    }

    fn cmd_load(&mut self, path: &Path) -> Result<(), String> {
        let delivered = self.load(path).map_err(|e| e.to_string())?;
        let beams = self.scene.as_ref().map_or(0, |s| s.beam_ids().count());
        println!(
            "{} {} ({} beam(s), {} event(s) delivered)",
            "✓ Loaded".green(),
            path.display().to_string().bold(),
            beams,
            delivered
        );
        Ok(())
    }

    fn cmd_reports(&self) -> Result<(), String> {
        for report in self.loaded_scene()?.reports() {
            println!("{report}\n");
        }
        Ok(())
    }

    fn cmd_report(&self, id: &BeamId, json: bool) -> Result<(), String> {
        let report = self.loaded_scene()?.report(id).map_err(|e| e.to_string())?;
        if json {
            let raw = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
            println!("{raw}");
        } else {
            report.log();
            println!("{report}");
        }
        Ok(())
    }

    fn cmd_records(&self, id: &BeamId) -> Result<(), String> {
        let tracker = self
            .loaded_scene()?
            .tracker(id)
            .ok_or_else(|| BeamError::UnknownBeam(id.clone()).to_string())?;
        println!("{} {}", "Overlap records for".bold(), id.to_string().cyan());
        if tracker.records().is_empty() {
            println!("  {}", "(none)".dimmed());
        }
        for r in tracker.records() {
            println!(
                "  {:<16} {:>10.3}  since {}",
                r.partner_id.to_string().bold(),
                r.estimated_volume,
                r.since.with_timezone(&chrono::Local).format("%H:%M:%S%.3f")
            );
        }
        Ok(())
    }

    fn cmd_estimate(&self, a: &BeamId, b: &BeamId) -> Result<(), String> {
        let scene = self.loaded_scene()?;
        let lookup = |id: &BeamId| scene.geometry(id).ok_or_else(|| BeamError::UnknownBeam(id.clone()).to_string());
        let (ga, gb) = (lookup(a)?, lookup(b)?);
        let mc = Estimator::monte_carlo(self.config.monte_carlo_samples, self.config.seed);

        println!("{} {} ↔ {}", "Overlap estimates".bold(), a.to_string().cyan(), b.to_string().cyan());
        println!("  closed form : {:.3}", estimate_overlap_volume(ga, gb));
        println!(
            "  monte carlo : {:.3}  ({} samples, seed {})",
            mc.estimate(ga, gb),
            self.config.monte_carlo_samples,
            self.config.seed
        );
        println!("  bounds      : {:.3}", bounds_overlap_volume(ga, gb));
        Ok(())
    }

    fn cmd_config(&self) {
        println!("{}", "Configuration".bold().underline());
        println!("  File       : {}", config::config_path().display().to_string().dimmed());
        println!("  Estimator  : {}", self.config.estimator.to_string().yellow());
        println!("  MC samples : {}", self.config.monte_carlo_samples.to_string().yellow());
        println!("  Seed       : {}", self.config.seed.to_string().yellow());
        if let Some(path) = &self.config.default_scenario {
            println!("  Scenario   : {}", path.display().to_string().yellow());
        }
    }
}

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled each iteration; when set the REPL exits cleanly.
pub fn run(shutdown: Arc<AtomicBool>, mut session: Session) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "beamlab>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match Command::parse(line) {
            Ok(cmd) => {
                if !session.execute(cmd) {
                    shutdown.store(true, Ordering::SeqCst);
                    break;
                }
            }
            Err(e) => println!("{}", e.red()),
        }
    }
}

/// Link parameters from a TOML file, or the defaults when `path` is `None`.
pub(crate) fn load_params<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T, String> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let raw = std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    toml::from_str(&raw).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

fn cmd_help() {
    println!();
    println!("{}", "BeamLab Commands".bold().underline());
    println!("  {}        – load and replay a scenario file", "/load <file>".bold().cyan());
    println!("  {}             – collision report for every beam", "/reports".bold().cyan());
    println!("  {} – one beam's report", "/report <id> [json]".bold().cyan());
    println!("  {}        – overlap records of one beam", "/records <id>".bold().cyan());
    println!("  {}    – compare estimators on two beams", "/estimate <a> <b>".bold().cyan());
    println!("  {}  – FSO / THz link budget", "/fso [file]  /thz [file]".bold().cyan());
    println!("  {}              – scenario JSON schema", "/schema".bold().cyan());
    println!("  {}              – show the active configuration", "/config".bold().cyan());
    println!("  {}         – exit the CLI", "/quit  /exit".bold().cyan());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"
[[beams]]
id = "a"
origin = [0.0, 0.0, 0.0]
direction = [0.0, 0.0, 1.0]
radius = 1.0
length = 5.0

[[beams]]
id = "b"
origin = [1.5, 0.0, 0.0]
direction = [0.0, 0.0, 1.0]
radius = 1.0
length = 5.0

[[events]]
kind = "begin"
a = "a"
b = "b"
"#;

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(Command::parse("/help"), Ok(Command::Help));
        assert_eq!(Command::parse("/load demos/x.toml"), Ok(Command::Load("demos/x.toml".into())));
        assert_eq!(
            Command::parse("/report beam_a json"),
            Ok(Command::Report { id: "beam_a".into(), json: true })
        );
        assert_eq!(Command::parse("/fso"), Ok(Command::Fso(None)));
        assert_eq!(Command::parse("/exit"), Ok(Command::Quit));
    }

    #[test]
    fn rejects_bad_arguments_and_unknown_commands() {
        assert!(Command::parse("/load").unwrap_err().contains("Bad arguments"));
        assert!(Command::parse("/estimate a").is_err());
        assert!(Command::parse("/launch").unwrap_err().contains("Unknown command"));
    }

    #[test]
    fn session_load_replays_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.toml");
        std::fs::write(&path, SCENARIO).unwrap();

        let mut session = Session::new(Config::default());
        assert_eq!(session.load(&path).unwrap(), 1);
        let report = session.scene().unwrap().report(&"a".into()).unwrap();
        assert_eq!(report.collision_count, 1);
        assert!(session.execute(Command::Reports));
    }

    #[test]
    fn commands_without_scene_keep_running() {
        let mut session = Session::new(Config::default());
        assert!(session.execute(Command::Reports));
        assert!(session.loaded_scene().is_err());
        assert!(!session.execute(Command::Quit));
    }

    #[test]
    fn load_params_defaults_and_partial_files() {
        let fso: FsoParameters = load_params(None).unwrap();
        assert_eq!(fso, FsoParameters::default());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thz.toml");
        std::fs::write(&path, "distance_m = 10.0\n").unwrap();
        let thz: ThzParameters = load_params(Some(&path)).unwrap();
        assert_eq!(thz.distance_m, 10.0);
        assert_eq!(thz.bandwidth_ghz, 30.0);

        std::fs::write(&path, "distance_m = \"far\"\n").unwrap();
        assert!(load_params::<ThzParameters>(Some(&path)).is_err());
    }
}
