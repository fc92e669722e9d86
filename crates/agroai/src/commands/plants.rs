//! Plant command handlers.

use tabled::Tabled;

use agroai_core::{Controller, CreatePlant, Plant, UpdatePlant};

use crate::cli::{GlobalOpts, PlantsArgs, PlantsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct PlantRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    plant_type: String,
    #[tabled(rename = "Variety")]
    variety: String,
}

impl From<&Plant> for PlantRow {
    fn from(p: &Plant) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            plant_type: p.plant_type.clone(),
            variety: p.variety.clone(),
        }
    }
}

#[derive(Tabled)]
struct TypeRow {
    #[tabled(rename = "Type")]
    name: String,
}

fn detail(p: &Plant) -> String {
    [
        format!("ID:      {}", p.id),
        format!("Name:    {}", p.name),
        format!("Type:    {}", p.plant_type),
        format!(
            "Variety: {}",
            if p.variety.is_empty() { "-" } else { &p.variety }
        ),
    ]
    .join("\n")
}

pub async fn handle(
    controller: &Controller,
    args: PlantsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::require_session(controller)?;

    match args.command {
        PlantsCommand::List { greenhouse } => {
            let plants = controller.plants(greenhouse).await?;
            let out = output::render_list(
                &global.output,
                &plants,
                |p| PlantRow::from(p),
                |p| p.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PlantsCommand::Add {
            greenhouse,
            name,
            plant_type,
            variety,
        } => {
            if name.trim().is_empty() || plant_type.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "plant".into(),
                    reason: "name and type are required".into(),
                });
            }
            let plant = controller
                .create_plant(
                    greenhouse,
                    CreatePlant {
                        name: name.trim().to_owned(),
                        plant_type,
                        variety,
                    },
                )
                .await?;
            let out = output::render_single(&global.output, &plant, detail, |p| p.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PlantsCommand::Update {
            greenhouse,
            plant,
            name,
            plant_type,
            variety,
        } => {
            let updated = controller
                .update_plant(
                    greenhouse,
                    plant,
                    UpdatePlant {
                        name,
                        plant_type,
                        variety,
                    },
                )
                .await?;
            let out =
                output::render_single(&global.output, &updated, detail, |p| p.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PlantsCommand::Remove { greenhouse, plant } => {
            if !util::confirm(
                &format!("Remove plant {plant} from greenhouse {greenhouse}?"),
                global.yes,
            )? {
                return Ok(());
            }
            controller.delete_plant(greenhouse, plant).await?;
            output::status("Plant removed", global.quiet);
            Ok(())
        }

        PlantsCommand::Types { greenhouse } => {
            let types = controller.plant_types(greenhouse).await;
            let out = output::render_list(
                &global.output,
                &types,
                |t| TypeRow { name: t.clone() },
                String::clone,
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
