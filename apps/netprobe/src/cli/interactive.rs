//! Line-oriented interactive front-end.
//!
//! Reads one command per line from stdin while pumping run messages, so the
//! start/stop control stays responsive during a run.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::app::{Controller, RunView};
use crate::error::Result;

use super::terminal::TerminalView;

const HELP: &str =
    "Commands: s = start/stop, t <probe> = toggle probe, l = list, n = network, q = quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    StartStop,
    Toggle(String),
    List,
    Network,
    Quit,
}

/// Parse one input line. `None` for blank or unknown input.
pub(crate) fn parse_command(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    let command = match words.next()? {
        "s" | "start" | "stop" => Command::StartStop,
        "t" | "toggle" => Command::Toggle(words.next()?.to_string()),
        "l" | "list" => Command::List,
        "n" | "network" => Command::Network,
        "q" | "quit" | "exit" => Command::Quit,
        _ => return None,
    };
    Some(command)
}

/// One interactive session over `input`: resume, read commands, pause.
///
/// Reading ends on `q`, end of input, a read error, or Ctrl-C while idle.
/// Ctrl-C during a run only requests a stop. A run still in flight when
/// reading ends is stopped and awaited before the selection is stored.
pub(crate) async fn run_session<R>(
    controller: &mut Controller,
    view: &TerminalView,
    input: R,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    controller.on_resume()?;
    controller.setup_views();

    read_commands(controller, view, input).await;

    if controller.is_running() {
        controller.request_stop();
        controller.run_until_idle().await;
    }
    controller.on_pause()?;
    Ok(())
}

async fn read_commands<R>(controller: &mut Controller, view: &TerminalView, input: R)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(input).lines();
    view.print(HELP);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!("Cannot read command input, leaving: {}", e);
                        break;
                    }
                };
                match parse_command(&line) {
                    Some(Command::Quit) => break,
                    Some(command) => execute(controller, view, command),
                    None if line.trim().is_empty() => {}
                    None => view.print(HELP),
                }
            }
            Some(message) = controller.next_message() => {
                controller.handle_message(message);
            }
            _ = tokio::signal::ctrl_c() => {
                if !controller.is_running() {
                    break;
                }
                controller.request_stop();
            }
        }
    }
}

fn execute(controller: &mut Controller, view: &TerminalView, command: Command) {
    let result = match command {
        Command::StartStop => controller.start_stop_pressed(),
        Command::Toggle(id) => {
            let active = controller
                .probes()
                .get(&id)
                .map(|p| !p.is_active())
                .unwrap_or(true);
            controller.set_probe_active(&id, active)
        }
        Command::List => {
            for probe in controller.probes().all() {
                view.add_probe_row(&probe.info(), probe.is_active());
            }
            Ok(())
        }
        Command::Network => {
            controller.update_network_type();
            Ok(())
        }
        Command::Quit => Ok(()),
    };

    if let Err(e) = result {
        view.print(&format!("Error: {}", e));
    }
}
