//! Greenhouse command handlers.

use tabled::Tabled;

use agroai_core::{Controller, Greenhouse, GreenhouseSettings, GreenhouseView, SensorKind};

use crate::cli::{GlobalOpts, GreenhousesArgs, GreenhousesCommand, SettingsArgs};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct GreenhouseRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "AI")]
    ai_mode: &'static str,
    #[tabled(rename = "Temp")]
    temperature: String,
    #[tabled(rename = "Humidity")]
    humidity: String,
    #[tabled(rename = "Soil")]
    soil: String,
    #[tabled(rename = "Sensors")]
    online: String,
}

impl From<&Greenhouse> for GreenhouseRow {
    fn from(gh: &Greenhouse) -> Self {
        let view = GreenhouseView::from(gh);
        let reading = |kind| {
            view.sensor(kind)
                .map_or_else(String::new, agroai_core::SensorReading::display)
        };
        Self {
            id: gh.id,
            name: gh.name.clone(),
            ai_mode: if view.ai_mode { "on" } else { "off" },
            temperature: reading(SensorKind::Temperature),
            humidity: reading(SensorKind::Humidity),
            soil: reading(SensorKind::SoilMoisture),
            online: format!("{}/{}", view.online_sensors(), view.sensors.len()),
        }
    }
}

/// Multi-line detail view shared with `watch`.
pub(crate) fn detail(view: &GreenhouseView, color: bool) -> String {
    let mut lines = vec![
        format!("ID:       {}", view.id),
        format!("Name:     {}", view.name),
        format!("AI mode:  {}", if view.ai_mode { "on" } else { "off" }),
        String::new(),
        "Sensors".to_owned(),
    ];
    for s in &view.sensors {
        lines.push(format!(
            "  {:<14} {:>10}  {}",
            s.kind.label(),
            output::paint_sensor(&s.display(), s.status, color),
            s.status
        ));
    }
    lines.push(String::new());
    lines.push("Devices".to_owned());
    for d in &view.devices {
        let level = d
            .level
            .map_or_else(String::new, |l| format!("  level {l:.0}%"));
        let locked = if d.is_online() && !d.controls_enabled {
            "  (AI controlled)"
        } else {
            ""
        };
        lines.push(format!(
            "  {:<14} {}{level}{locked}",
            d.kind.label(),
            output::paint_device(d.status, color)
        ));
    }
    lines.join("\n")
}

fn settings_update(args: &SettingsArgs) -> GreenhouseSettings {
    GreenhouseSettings {
        temp_min: args.temp_min,
        temp_max: args.temp_max,
        humidity_min: args.humidity_min,
        humidity_max: args.humidity_max,
        soil_moisture_min: args.soil_moisture_min,
        soil_moisture_max: args.soil_moisture_max,
        co2_min: args.co2_min,
        co2_max: args.co2_max,
    }
}

pub async fn handle(
    controller: &Controller,
    args: GreenhousesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::require_session(controller)?;

    match args.command {
        GreenhousesCommand::List => {
            let list = controller.greenhouses().await?;
            let out = output::render_list(
                &global.output,
                &list,
                |gh| GreenhouseRow::from(gh),
                |gh| gh.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GreenhousesCommand::Get { id } => {
            let gh = controller.greenhouse(id).await?;
            let view = GreenhouseView::from(&gh);
            let color = output::should_color(&global.color);
            let out = output::render_single(
                &global.output,
                &view,
                |v| detail(v, color),
                |v| v.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GreenhousesCommand::Create { name } => {
            let gh = controller.create_greenhouse(&name).await?;
            let out = output::render_single(
                &global.output,
                &gh,
                |g| format!("Created greenhouse {} ({})", g.id, g.name),
                |g| g.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GreenhousesCommand::Rename { id, name } => {
            let gh = controller.rename_greenhouse(id, &name).await?;
            output::status(&format!("Greenhouse {id} renamed to \"{}\"", gh.name), global.quiet);
            Ok(())
        }

        GreenhousesCommand::Settings(args) => {
            let settings = settings_update(&args);
            if settings == GreenhouseSettings::default() {
                return Err(CliError::Validation {
                    field: "settings".into(),
                    reason: "pass at least one threshold flag".into(),
                });
            }
            controller.update_settings(args.id, settings).await?;
            output::status(&format!("Greenhouse {} settings updated", args.id), global.quiet);
            Ok(())
        }

        GreenhousesCommand::Delete { id } => {
            if !util::confirm(
                &format!("Delete greenhouse {id} and its plants? This cannot be undone."),
                global.yes,
            )? {
                return Ok(());
            }
            controller.delete_greenhouse(id).await?;
            output::status("Greenhouse deleted", global.quiet);
            Ok(())
        }
    }
}
