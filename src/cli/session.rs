//! Interactive session: a line-oriented stand-in for the player window
//!
//! Each stdin line is one command. Marker and playback commands keep working
//! while an export runs in the background.

use std::path::PathBuf;
use std::str::FromStr;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use crate::adapters::toml_config::NudgeConfig;
use crate::adapters::HeadlessPlayer;
use crate::app::controller::ExportController;
use crate::app::export_worker::{ExportHandle, ExportJob};
use crate::domain::model::*;
use crate::error::{ClipmarkError, ClipmarkResult};
use crate::utils::time::{format_seconds_ms, parse_time_ms};

/// Relative playhead movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NudgeStep {
    Forward { fine: bool },
    Back { fine: bool },
    By(i64),
}

impl NudgeStep {
    /// Signed delta using the configured step sizes
    pub fn delta_ms(self, steps: &NudgeConfig) -> i64 {
        let step = |fine: bool| {
            let ms = if fine { steps.small_ms } else { steps.large_ms };
            i64::try_from(ms).unwrap_or(i64::MAX)
        };
        match self {
            NudgeStep::Forward { fine } => step(fine),
            NudgeStep::Back { fine } => -step(fine),
            NudgeStep::By(delta) => delta,
        }
    }
}

/// One parsed session command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Open(PathBuf),
    Play,
    Pause,
    Toggle,
    Seek(u64),
    Nudge(NudgeStep),
    Drag(bool),
    Pos,
    Duration(u64),
    Mark,
    Swap,
    Clear,
    Status,
    Export { name: Option<String>, delete: bool },
    Cancel,
    Delete,
    Help,
    Quit,
}

pub const HELP: &str = "commands: open <path> | play | pause | toggle | seek <time> | \
nudge forward|back [fine] | nudge <+/-ms> | drag on|off | pos | duration <time> | \
mark | swap | clear | status | export [name] [--delete] | cancel | delete | help | quit";

fn invalid(msg: impl Into<String>) -> ClipmarkError {
    ClipmarkError::InvalidCommand(msg.into())
}

fn time_arg(word: &str, arg: Option<&str>) -> ClipmarkResult<u64> {
    let arg = arg.ok_or_else(|| invalid(format!("{} needs a time argument", word)))?;
    parse_time_ms(arg).map_err(|_| ClipmarkError::InvalidTimeFormat {
        time: arg.to_string(),
    })
}

impl FromStr for SessionCommand {
    type Err = ClipmarkError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let arg = (!rest.is_empty()).then_some(rest);

        match word.to_lowercase().as_str() {
            "open" => arg
                .map(|path| SessionCommand::Open(PathBuf::from(path)))
                .ok_or_else(|| invalid("open needs a file path")),
            "play" => Ok(SessionCommand::Play),
            "pause" => Ok(SessionCommand::Pause),
            "toggle" => Ok(SessionCommand::Toggle),
            "seek" => time_arg("seek", arg).map(SessionCommand::Seek),
            "nudge" => parse_nudge(rest).map(SessionCommand::Nudge),
            "drag" => match rest {
                "on" => Ok(SessionCommand::Drag(true)),
                "off" => Ok(SessionCommand::Drag(false)),
                _ => Err(invalid("drag takes on or off")),
            },
            "pos" => Ok(SessionCommand::Pos),
            "duration" => time_arg("duration", arg).map(SessionCommand::Duration),
            "mark" => Ok(SessionCommand::Mark),
            "swap" => Ok(SessionCommand::Swap),
            "clear" => Ok(SessionCommand::Clear),
            "status" => Ok(SessionCommand::Status),
            "export" => Ok(parse_export(rest)),
            "cancel" => Ok(SessionCommand::Cancel),
            "delete" => Ok(SessionCommand::Delete),
            "help" | "?" => Ok(SessionCommand::Help),
            "quit" | "exit" => Ok(SessionCommand::Quit),
            "" => Err(invalid("empty command")),
            other => Err(invalid(format!("unknown command '{}'", other))),
        }
    }
}

fn parse_nudge(rest: &str) -> ClipmarkResult<NudgeStep> {
    let mut words = rest.split_whitespace();
    let direction = words.next().ok_or_else(|| invalid("nudge needs a direction or amount"))?;
    let fine = match words.next() {
        None => false,
        Some("fine") => true,
        Some(other) => return Err(invalid(format!("unexpected '{}' after nudge", other))),
    };
    match direction {
        "forward" | "fwd" | "+" => Ok(NudgeStep::Forward { fine }),
        "back" | "-" => Ok(NudgeStep::Back { fine }),
        amount => amount
            .parse::<i64>()
            .map(NudgeStep::By)
            .map_err(|_| invalid(format!("bad nudge amount '{}'", amount))),
    }
}

const DELETE_FLAG: &str = "--delete";

/// `export [name] [--delete]`; the name is kept as typed, inner spaces included
fn parse_export(rest: &str) -> SessionCommand {
    let (name, delete) = if rest == DELETE_FLAG {
        ("", true)
    } else if let Some(head) = rest
        .strip_suffix(DELETE_FLAG)
        .filter(|head| head.ends_with(char::is_whitespace))
    {
        (head.trim_end(), true)
    } else if let Some(tail) = rest
        .strip_prefix(DELETE_FLAG)
        .filter(|tail| tail.starts_with(char::is_whitespace))
    {
        (tail.trim_start(), true)
    } else {
        (rest, false)
    };
    let name = (!name.is_empty()).then(|| name.to_string());
    SessionCommand::Export { name, delete }
}

struct RunningExport {
    handle: ExportHandle,
    delete_original: bool,
}

async fn next_outcome(running: &mut Option<RunningExport>) -> TranscodeOutcome {
    match running {
        Some(job) => job.handle.finished().await,
        None => std::future::pending().await,
    }
}

/// Command loop over `input` until `quit` or end of input.
///
/// Returns the number of failed exports.
pub async fn run_session<R>(
    controller: &mut ExportController,
    player: &HeadlessPlayer,
    steps: &NudgeConfig,
    input: R,
) -> ClipmarkResult<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut running: Option<RunningExport> = None;
    let mut failed_exports = 0;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("End of input");
                    break;
                };
                if line.trim().is_empty() || line.trim_start().starts_with('#') {
                    continue;
                }
                match line.parse::<SessionCommand>() {
                    Ok(SessionCommand::Quit) => {
                        if let Some(job) = running.as_mut() {
                            job.handle.cancel();
                        }
                        break;
                    }
                    Ok(command) => execute(controller, steps, &mut running, command).await,
                    Err(e) => println!("error: {}", e),
                }
                pump_playback(controller, player);
            }
            outcome = next_outcome(&mut running) => {
                if let Some(job) = running.take() {
                    let result = controller
                        .complete_export(outcome, job.handle.plan(), job.delete_original)
                        .await;
                    if !result.is_exported() {
                        failed_exports += 1;
                    }
                    pump_playback(controller, player);
                }
            }
        }
    }

    // Let a pending export settle so the session never exits mid-write
    if let Some(mut job) = running.take() {
        info!("Waiting for export of {}", job.handle.plan().output_path.display());
        let outcome = job.handle.finished().await;
        let result = controller
            .complete_export(outcome, job.handle.plan(), job.delete_original)
            .await;
        if !result.is_exported() {
            failed_exports += 1;
        }
    }

    Ok(failed_exports)
}

/// Forward queued engine notifications into the controller
pub fn pump_playback(controller: &mut ExportController, player: &HeadlessPlayer) {
    for event in player.drain_events() {
        controller.handle_playback_event(event);
    }
}

async fn execute(
    controller: &mut ExportController,
    steps: &NudgeConfig,
    running: &mut Option<RunningExport>,
    command: SessionCommand,
) {
    match command {
        SessionCommand::Open(path) => {
            if let Err(e) = controller.open(&path) {
                println!("error: {}", e);
            }
        }
        SessionCommand::Play => controller.play(),
        SessionCommand::Pause => controller.pause(),
        SessionCommand::Toggle => {
            let state = if controller.toggle_playback() { "playing" } else { "paused" };
            println!("{}", state);
        }
        SessionCommand::Seek(ms) => {
            let target = controller.seek(i64::try_from(ms).unwrap_or(i64::MAX));
            println!("position {}", format_seconds_ms(target));
        }
        SessionCommand::Nudge(step) => {
            let target = controller.nudge(step.delta_ms(steps));
            println!("position {}", format_seconds_ms(target));
        }
        SessionCommand::Drag(dragging) => controller.set_dragging(dragging),
        SessionCommand::Pos => {
            let clock = &controller.session().clock;
            println!(
                "position {} ({})",
                format_seconds_ms(clock.position_ms()),
                controller.display_time()
            );
        }
        SessionCommand::Duration(ms) => controller.on_duration_known(ms),
        SessionCommand::Mark => {
            controller.set_marker();
        }
        SessionCommand::Swap => {
            controller.toggle_active_marker();
        }
        SessionCommand::Clear => controller.clear_markers(),
        SessionCommand::Status => println!("{}", status_line(controller)),
        SessionCommand::Export { name, delete } => {
            let name = match name.or_else(|| controller.default_output_name()) {
                Some(name) => name,
                None => {
                    println!("error: {}", crate::domain::errors::DomainError::NoSourceLoaded);
                    return;
                }
            };
            match controller.begin_export(&name) {
                Ok(plan) => {
                    let handle = ExportJob::spawn(controller.transcoder(), plan);
                    *running = Some(RunningExport {
                        handle,
                        delete_original: delete,
                    });
                }
                Err(e) => println!("error: {}", e),
            }
        }
        SessionCommand::Cancel => match running.as_mut() {
            Some(job) => {
                if !job.handle.cancel() {
                    println!("cancel already requested");
                }
            }
            None => println!("no export running"),
        },
        SessionCommand::Delete => {
            if let Err(e) = controller.delete_source().await {
                println!("error: {}", e);
            }
        }
        SessionCommand::Help => println!("{}", HELP),
        SessionCommand::Quit => {}
    }
}

/// One-line summary of the session
pub fn status_line(controller: &ExportController) -> String {
    let session = controller.session();
    let source = session
        .source_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    let markers = controller.markers();
    let marker = |ms: Option<u64>| ms.map(format_seconds_ms).unwrap_or_else(|| "-".to_string());
    let time = controller.display_time();

    format!(
        "source={} time={} start={} end={} active={} exporting={}",
        source,
        if time.is_empty() { "-".to_string() } else { time.replace(' ', "") },
        marker(markers.start_ms()),
        marker(markers.end_ms()),
        markers.active().label(),
        if controller.is_exporting() { "yes" } else { "no" }
    )
}
