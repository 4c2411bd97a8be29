//! Command line front-end.
//!
//! `netprobe run` performs one run and maps its outcome to the exit code.
//! `netprobe interactive` keeps the controller alive and reads commands from
//! stdin. `list`, `enable` and `disable` work on the stored probe selection.

mod interactive;
pub mod terminal;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::app::{Controller, RunView};
use crate::config::NetprobeConfig;
use crate::db::Database;
use crate::error::Result;
use crate::events::{handlers, EventBus};
use crate::logging;
use crate::platform::SystemNetworkInfo;
use crate::probes::ProbeRegistry;
use crate::services::active_state::ActiveStateStore;
use crate::services::runner::{AbortReason, RunOutcome};

use terminal::TerminalView;

pub const EXIT_OK: u8 = 0;
pub const EXIT_PROBE_FAILED: u8 = 1;
pub const EXIT_ERROR: u8 = 2;
pub const EXIT_STOPPED: u8 = 130;

/// netprobe - sequential network connectivity tester
#[derive(Debug, Parser)]
#[command(name = "netprobe", version)]
#[command(about = "Sequential network connectivity tester", long_about = None)]
pub struct Cli {
    /// Config file (JSONC). Defaults to the user config directory.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Database holding the probe selection.
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Write events as JSON lines to stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run every active probe once (default)
    Run,
    /// Read start/stop and toggle commands from stdin
    Interactive,
    /// Show the probes and whether they are active
    List,
    /// Include a probe in future runs
    Enable { probe: String },
    /// Exclude a probe from future runs
    Disable { probe: String },
}

/// Entry point of the `netprobe` binary.
pub async fn run(cli: Cli) -> ExitCode {
    logging::init(cli.verbose);

    match execute(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("netprobe: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn execute(cli: Cli) -> Result<u8> {
    let config = NetprobeConfig::load(cli.config.as_deref())?;
    let db = Arc::new(Database::open(cli.db.as_deref())?);

    let command = cli.command.clone().unwrap_or(Command::Run);
    let events = Arc::new(EventBus::new());
    let json_handler = streams_events(cli.json, &command)
        .then(|| handlers::json_lines::start_handler(events.subscribe(), std::io::stdout()));

    let view = Arc::new(if cli.json {
        TerminalView::stderr()
    } else {
        TerminalView::stdout()
    });

    let mut controller = Controller::new(
        ProbeRegistry::standard(&config),
        ActiveStateStore::new(db),
        view.clone(),
        Box::new(SystemNetworkInfo),
        events.clone(),
        &config,
    );

    let code = match command {
        Command::Run => run_once(&mut controller).await?,
        Command::Interactive => {
            interactive::run_session(&mut controller, &view, tokio::io::stdin()).await?;
            EXIT_OK
        }
        Command::List => {
            controller.load_active_state()?;
            list(&controller, &view, cli.json)?;
            EXIT_OK
        }
        Command::Enable { probe } => set_active(&controller, &probe, true)?,
        Command::Disable { probe } => set_active(&controller, &probe, false)?,
    };

    // The JSON handler ends once the bus is gone and the backlog is written
    drop(controller);
    drop(events);
    if let Some(handle) = json_handler {
        if let Err(e) = handle.await {
            tracing::warn!("JSON-lines handler ended abnormally: {}", e);
        }
    }

    Ok(code)
}

/// `--json` streams events, except for `list` whose stdout is one JSON array.
fn streams_events(json: bool, command: &Command) -> bool {
    json && *command != Command::List
}

/// One run; Ctrl-C requests a stop.
async fn run_once(controller: &mut Controller) -> Result<u8> {
    controller.on_resume()?;
    controller.setup_views();
    controller.launch()?;

    let outcome = loop {
        tokio::select! {
            message = controller.next_message() => {
                let Some(message) = message else {
                    break None;
                };
                if let Some(outcome) = controller.handle_message(message) {
                    break Some(outcome);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                controller.request_stop();
            }
        }
    };

    controller.on_pause()?;
    Ok(exit_code(outcome.as_ref()))
}

pub(crate) fn exit_code(outcome: Option<&RunOutcome>) -> u8 {
    match outcome {
        Some(RunOutcome::Completed) => EXIT_OK,
        Some(RunOutcome::Failed { .. }) => EXIT_PROBE_FAILED,
        Some(RunOutcome::Aborted {
            reason: AbortReason::StopRequested,
        }) => EXIT_STOPPED,
        Some(RunOutcome::Aborted {
            reason: AbortReason::WorkerLost,
        })
        | None => EXIT_ERROR,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProbeListing {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    active: bool,
}

fn list(controller: &Controller, view: &TerminalView, json: bool) -> Result<()> {
    let listings: Vec<ProbeListing> = controller
        .probes()
        .all()
        .iter()
        .map(|p| {
            let info = p.info();
            ProbeListing {
                id: info.id.as_str(),
                name: info.name,
                description: info.description,
                active: p.is_active(),
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string(&listings)?);
    } else {
        for probe in controller.probes().all() {
            view.add_probe_row(&probe.info(), probe.is_active());
        }
    }
    Ok(())
}

/// Load, change one flag, store.
fn set_active(controller: &Controller, probe: &str, active: bool) -> Result<u8> {
    controller.load_active_state()?;
    controller.set_probe_active(probe, active)?;
    controller.on_pause()?;
    Ok(EXIT_OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::ProbeId;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(Some(&RunOutcome::Completed)), 0);
        assert_eq!(
            exit_code(Some(&RunOutcome::Failed {
                probe: ProbeId::new("real-web"),
                fault: None
            })),
            1
        );
        assert_eq!(
            exit_code(Some(&RunOutcome::Aborted {
                reason: AbortReason::StopRequested
            })),
            130
        );
        assert_eq!(exit_code(None), EXIT_ERROR);
    }

    #[test]
    fn test_default_command_and_global_flags() {
        let cli = Cli::try_parse_from(["netprobe", "--json"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.command, None);

        let cli =
            Cli::try_parse_from(["netprobe", "disable", "download-10kb", "--db", "/tmp/x.db"])
                .unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Disable {
                probe: "download-10kb".to_string()
            })
        );
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
    }

    #[test]
    fn test_json_list_prints_only_the_array() {
        assert!(!streams_events(true, &Command::List));
        assert!(streams_events(true, &Command::Run));
        assert!(streams_events(true, &Command::Interactive));
        assert!(streams_events(
            true,
            &Command::Disable {
                probe: "ping".to_string()
            }
        ));
        assert!(!streams_events(false, &Command::Run));
    }

    #[test]
    fn test_enable_requires_probe() {
        assert!(Cli::try_parse_from(["netprobe", "enable"]).is_err());
    }

    #[tokio::test]
    async fn test_disable_is_stored() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("netprobe.db");
        let config_path = dir.path().join("missing.jsonc");
        let cli = |args: &[&str]| {
            let mut argv = vec!["netprobe", "--db", db_path.to_str().unwrap()];
            argv.extend(["--config", config_path.to_str().unwrap()]);
            argv.extend(args);
            Cli::try_parse_from(argv).unwrap()
        };

        assert_eq!(execute(cli(&["disable", "real-web"])).await.unwrap(), EXIT_OK);

        let store = ActiveStateStore::new(Arc::new(Database::open(Some(&db_path)).unwrap()));
        assert_eq!(store.stored(ProbeId::new("real-web")).unwrap(), Some(false));
        assert_eq!(store.stored(ProbeId::new("tcp-connection")).unwrap(), Some(true));

        assert!(execute(cli(&["enable", "ping"])).await.is_err());
    }
}
