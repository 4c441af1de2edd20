//! Command implementations

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::BufReader;
use tracing::{info, warn};

use crate::adapters::{AppConfig, HeadlessPlayer};
use crate::app::container::{AppContainer, DefaultAppContainer};
use crate::app::controller::ExportController;
use crate::cli::args::{CutArgs, ExportArgs, PlanArgs, SessionArgs};
use crate::cli::observer::ConsoleObserver;
use crate::cli::session::{pump_playback, run_session};
use crate::domain::errors::DomainError;
use crate::domain::model::*;
use crate::domain::rules::{CutValidator, ExportPlanner};
use crate::error::{ClipmarkError, ClipmarkResult};
use crate::ports::{NullObserver, TranscodePort};
use crate::utils::time::parse_time_ms;

/// JSON report for `export --json`
#[derive(Debug, Serialize)]
struct ExportReport<'a> {
    result: &'a WorkflowResult,
    start_ms: Option<u64>,
    end_ms: Option<u64>,
    finished_at: DateTime<Utc>,
}

/// JSON report for `plan --json`
#[derive(Debug, Serialize)]
struct PlanReport<'a> {
    plan: &'a ExportPlan,
    command: Vec<String>,
}

fn parse_time_arg(value: &str) -> ClipmarkResult<u64> {
    parse_time_ms(value).map_err(|_| ClipmarkError::InvalidTimeFormat {
        time: value.to_string(),
    })
}

fn output_name(cut: &CutArgs) -> String {
    cut.name
        .clone()
        .unwrap_or_else(|| ExportPlanner::default_output_name(&cut.input))
}

/// Quote an argument for display when a shell would split it
fn shell_quote(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=?+,@%".contains(c))
    {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Execute the plan command: validate and print the transcoder command line
pub fn plan(config: &AppConfig, args: PlanArgs) -> Result<()> {
    let start_ms = parse_time_arg(&args.cut.start)?;
    let end_ms = parse_time_arg(&args.cut.end)?;

    let request = CutValidator::validate(Some(args.cut.input.as_path()), Some(start_ms), Some(end_ms))
        .map_err(ClipmarkError::from)?;
    let plan = ExportPlanner::new()
        .plan(&request, &output_name(&args.cut))
        .map_err(ClipmarkError::from)?;

    let container = DefaultAppContainer::new(config);
    let command = container.transcoder().command_line(&plan);

    if args.json {
        let report = PlanReport {
            plan: &plan,
            command,
        };
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize plan")?;
        println!("{}", json);
    } else {
        let line: Vec<String> = command.iter().map(|arg| shell_quote(arg)).collect();
        println!("{}", line.join(" "));
    }
    Ok(())
}

/// Execute the export command: open, mark, transcode and run the workflow
pub async fn export(config: &AppConfig, args: ExportArgs) -> Result<()> {
    let start_ms = parse_time_arg(&args.cut.start)?;
    let end_ms = parse_time_arg(&args.cut.end)?;
    let fallback_duration = args.duration.as_deref().map(parse_time_arg).transpose()?;

    let container = DefaultAppContainer::new(config);
    let player = container.player();
    let mut controller = container.export_controller(Arc::new(NullObserver));

    open_checked(&mut controller, &player, &args.cut.input)?;

    if controller.session().clock.duration_ms() == 0 {
        match fallback_duration {
            Some(duration_ms) => controller.on_duration_known(duration_ms),
            None => {
                return Err(ClipmarkError::from(DomainError::ProbeFailure(format!(
                    "duration of {} is unknown; install ffprobe or pass --duration",
                    args.cut.input.display()
                )))
                .into())
            }
        }
    }

    // Same gestures as the player: seek, mark, swap, seek, mark
    controller.seek(clamp_i64(start_ms));
    controller.set_marker();
    controller.toggle_active_marker();
    controller.seek(clamp_i64(end_ms));
    controller.set_marker();
    let (marked_start, marked_end) = (controller.markers().start_ms(), controller.markers().end_ms());
    if marked_start != Some(start_ms) || marked_end != Some(end_ms) {
        warn!(
            "Markers clamped to media duration: start={:?} end={:?}",
            marked_start, marked_end
        );
    }

    let result = controller
        .confirm_export(&output_name(&args.cut), args.delete_original)
        .await
        .map_err(ClipmarkError::from)?;

    if args.json {
        let report = ExportReport {
            result: &result,
            start_ms: marked_start,
            end_ms: marked_end,
            finished_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize result")?;
        println!("{}", json);
    } else {
        println!("{}", result);
    }

    if !result.is_exported() {
        return Err(ClipmarkError::ExportFailed(result.to_string()).into());
    }
    Ok(())
}

/// Execute the session command: read commands from stdin until quit or EOF
pub async fn session(config: &AppConfig, args: SessionArgs) -> Result<()> {
    let container = DefaultAppContainer::new(config);
    let player = container.player();
    let mut controller = container.export_controller(Arc::new(ConsoleObserver::new(args.json)));

    if let Some(input) = args.input.as_deref() {
        open_checked(&mut controller, &player, input)?;
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let failed = run_session(&mut controller, &player, &config.nudge, stdin)
        .await
        .context("Session input failed")?;

    info!("Session ended");
    if failed > 0 {
        return Err(ClipmarkError::ExportFailed(format!("{} export(s) failed", failed)).into());
    }
    Ok(())
}

fn open_checked(
    controller: &mut ExportController,
    player: &HeadlessPlayer,
    input: &Path,
) -> ClipmarkResult<()> {
    controller.open(input)?;
    pump_playback(controller, player);
    Ok(())
}

fn clamp_i64(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}
