//! Live greenhouse view: re-renders on every synced change until Ctrl-C.

use owo_colors::OwoColorize;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use agroai_core::{
    CacheEntry, Controller, GreenhouseView, Notification, NotificationLevel, QueryKey, Route,
};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::{greenhouses, util};

/// What was last printed, so polls that change nothing stay quiet.
#[derive(Default)]
struct Screen {
    view: Option<GreenhouseView>,
    error: Option<String>,
}

impl Screen {
    fn update(
        &mut self,
        entry: &CacheEntry,
        global: &GlobalOpts,
        color: bool,
    ) -> Result<(), CliError> {
        if let Some(gh) = entry.greenhouse() {
            let view = GreenhouseView::from(gh);
            if self.view.as_ref() != Some(&view) {
                render(&view, global, color)?;
                self.view = Some(view);
            }
        }
        if entry.error != self.error {
            if let Some(ref message) = entry.error {
                eprintln!("{} {message}", paint("sync failed:", NotificationLevel::Error, color));
            }
            self.error.clone_from(&entry.error);
        }
        Ok(())
    }
}

fn render(view: &GreenhouseView, global: &GlobalOpts, color: bool) -> Result<(), CliError> {
    let out = match global.output {
        OutputFormat::Table => format!(
            "── {} ──\n{}\n",
            chrono::Local::now().format("%H:%M:%S"),
            greenhouses::detail(view, color)
        ),
        // One document per update.
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json(view, true)?,
        OutputFormat::Yaml => format!("---\n{}", output::render_yaml(view)?),
        OutputFormat::Plain => {
            let mut lines: Vec<String> = view
                .sensors
                .iter()
                .map(|s| format!("{}={}", s.kind, s.display()))
                .collect();
            lines.extend(view.devices.iter().map(|d| format!("{}={}", d.kind, d.status)));
            lines.push(format!("ai_mode={}", view.ai_mode));
            lines.join(" ")
        }
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

fn paint(text: &str, level: NotificationLevel, color: bool) -> String {
    if !color {
        return text.to_owned();
    }
    match level {
        NotificationLevel::Success => text.green().to_string(),
        NotificationLevel::Info => text.cyan().to_string(),
        NotificationLevel::Error => text.red().bold().to_string(),
    }
}

fn print_notification(note: &Notification, color: bool) {
    eprintln!("{}", paint(&note.message, note.level, color));
}

pub async fn handle(
    controller: &Controller,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::require_session(controller)?;
    controller.start().await;

    let key = QueryKey::Greenhouse(args.greenhouse);
    let color = output::should_color(&global.color);
    let mut notifications = controller.notifications();
    let mut route = controller.route();
    let mut detail = controller.watch(key).await;
    let mut screen = Screen::default();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                debug!(%key, "interrupted");
                break;
            }
            changed = detail.changed() => {
                let Some(entry) = changed else { break };
                screen.update(&entry, global, color)?;
            }
            note = notifications.recv() => match note {
                Ok(note) => print_notification(&note, color),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "notifications lagged"),
                Err(RecvError::Closed) => break,
            },
            Ok(()) = route.changed() => {
                if *route.borrow_and_update() == Route::Login {
                    return Err(CliError::SessionExpired);
                }
            }
        }
    }

    controller.unwatch(&key);
    Ok(())
}
