//! Command line interface for `spf-harvest`

use clap::{Args, Parser, Subcommand};
use shared::{parse_weight, validate_create_harvest, CreateHarvestRequest, HarvestAction, WeightField};

use crate::api::HarvestApi;
use crate::controller::HarvestController;
use crate::error::{ClientError, ClientResult};
use crate::render::{render_list, render_page};
use crate::view::PageView;

/// SPFarms harvest workflow client
#[derive(Parser, Debug)]
#[command(name = "spf-harvest", version, about = "Move SPFarms harvests through drying, trimming and curing")]
pub struct Cli {
    /// Print the page state as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// `STRAIN=GRAMS`, e.g. `12=450.5`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrainWeight {
    pub strain_id: i64,
    pub raw: String,
}

fn parse_strain_weight(s: &str) -> Result<StrainWeight, String> {
    let (strain, grams) = s
        .split_once('=')
        .ok_or_else(|| format!("expected STRAIN=GRAMS, got '{}'", s))?;
    let strain_id = strain
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("'{}' is not a strain id", strain.trim()))?;
    parse_weight(grams).map_err(|e| e.to_string())?;
    Ok(StrainWeight {
        strain_id,
        raw: grams.trim().to_string(),
    })
}

fn parse_grams(s: &str) -> Result<String, String> {
    parse_weight(s).map_err(|e| e.to_string())?;
    Ok(s.trim().to_string())
}

#[derive(Args, Debug, Clone, Default)]
pub struct WeightArgs {
    /// Wet weight per strain
    #[arg(long, value_name = "STRAIN=G", value_parser = parse_strain_weight)]
    pub wet: Vec<StrainWeight>,
    /// Dry weight per strain
    #[arg(long, value_name = "STRAIN=G", value_parser = parse_strain_weight)]
    pub dry: Vec<StrainWeight>,
    /// Waste weight per strain
    #[arg(long, value_name = "STRAIN=G", value_parser = parse_strain_weight)]
    pub waste: Vec<StrainWeight>,
    /// Trimmed flower weight per strain
    #[arg(long, value_name = "STRAIN=G", value_parser = parse_strain_weight)]
    pub flower: Vec<StrainWeight>,
    /// Shake weight per strain
    #[arg(long, value_name = "STRAIN=G", value_parser = parse_strain_weight)]
    pub shake: Vec<StrainWeight>,
}

impl WeightArgs {
    fn entries(&self) -> impl Iterator<Item = (WeightField, &StrainWeight)> + '_ {
        [
            (WeightField::Wet, &self.wet),
            (WeightField::Dry, &self.dry),
            (WeightField::Waste, &self.waste),
            (WeightField::Flower, &self.flower),
            (WeightField::Shake, &self.shake),
        ]
        .into_iter()
        .flat_map(|(field, values)| values.iter().map(move |v| (field, v)))
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List harvests
    List,

    /// Show one harvest
    Show { id: i64 },

    /// Create a harvest from plants
    Create {
        #[arg(long)]
        name: String,
        #[arg(long = "plant", value_name = "ID", required = true)]
        plant_ids: Vec<i64>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Record wet weights and move to drying
    StartDrying {
        id: i64,
        #[command(flatten)]
        weights: WeightArgs,
        /// Drying room id
        #[arg(long)]
        room: Option<i64>,
    },

    /// Record dry weights and mark as dried
    FinishDrying {
        id: i64,
        #[command(flatten)]
        weights: WeightArgs,
        /// Harvest-level waste in grams
        #[arg(long, value_name = "G", value_parser = parse_grams)]
        harvest_waste: Option<String>,
    },

    /// Move a dried harvest to trimming
    StartTrimming { id: i64 },

    /// Record flower, shake and waste and move to curing
    FinishTrimming {
        id: i64,
        #[command(flatten)]
        weights: WeightArgs,
    },

    /// Mark curing finished and package
    FinishCuring { id: i64 },

    /// Admin sign-off on a packaged harvest
    Review { id: i64 },

    /// Close a reviewed harvest
    Close { id: i64 },

    /// Add plants to a harvest
    AddPlants {
        id: i64,
        #[arg(required = true)]
        plant_ids: Vec<i64>,
    },

    /// Save one strain's weights without changing stage
    RecordWeight {
        id: i64,
        #[arg(long)]
        strain: i64,
        #[arg(long, value_name = "G", value_parser = parse_grams)]
        wet: Option<String>,
        #[arg(long, value_name = "G", value_parser = parse_grams)]
        dry: Option<String>,
        #[arg(long, value_name = "G", value_parser = parse_grams)]
        waste: Option<String>,
        #[arg(long, value_name = "G", value_parser = parse_grams)]
        flower: Option<String>,
        #[arg(long, value_name = "G", value_parser = parse_grams)]
        shake: Option<String>,
    },
}

impl Command {
    /// Harvest the command operates on
    pub fn harvest_id(&self) -> Option<i64> {
        match self {
            Command::List | Command::Create { .. } => None,
            Command::Show { id }
            | Command::StartDrying { id, .. }
            | Command::FinishDrying { id, .. }
            | Command::StartTrimming { id }
            | Command::FinishTrimming { id, .. }
            | Command::FinishCuring { id }
            | Command::Review { id }
            | Command::Close { id }
            | Command::AddPlants { id, .. }
            | Command::RecordWeight { id, .. } => Some(*id),
        }
    }
}

fn apply_weights<A: HarvestApi>(controller: &mut HarvestController<A>, weights: &WeightArgs) {
    for (field, value) in weights.entries() {
        controller.set_weight(value.strain_id, field, value.raw.clone());
    }
}

async fn transition<A: HarvestApi>(
    controller: &mut HarvestController<A>,
    id: i64,
    action: HarvestAction,
    weights: Option<&WeightArgs>,
) -> ClientResult<()> {
    controller.load(id).await?;
    if let Some(weights) = weights {
        apply_weights(controller, weights);
    }
    controller.submit(action).await?;
    Ok(())
}

fn page_output<A: HarvestApi>(controller: &HarvestController<A>, json: bool) -> ClientResult<String> {
    let page = controller.view();
    if json {
        Ok(serde_json::to_string_pretty(&page)?)
    } else {
        Ok(render_page(&page))
    }
}

/// Run one command and return what should be printed
pub async fn execute<A: HarvestApi>(
    cli: &Cli,
    controller: &mut HarvestController<A>,
) -> ClientResult<String> {
    match &cli.command {
        Command::List => {
            let harvests = controller.api().list_harvests().await?;
            if cli.json {
                return Ok(serde_json::to_string_pretty(&harvests)?);
            }
            return Ok(render_list(&harvests));
        }
        Command::Create {
            name,
            plant_ids,
            notes,
        } => {
            let request = CreateHarvestRequest {
                name: name.clone(),
                plant_ids: plant_ids.clone(),
                harvested_at: Some(chrono::Utc::now().date_naive()),
                notes: notes.clone(),
            };
            validate_create_harvest(&request)
                .map_err(|e| ClientError::Validation(e.to_string()))?;
            let created = controller.api().create_harvest(&request).await?;
            tracing::info!(harvest_id = created.id, "Created harvest");
            controller.load(created.id).await?;
        }
        Command::Show { id } => {
            controller.load(*id).await?;
        }
        Command::StartDrying { id, weights, room } => {
            controller.load(*id).await?;
            apply_weights(controller, weights);
            if room.is_some() {
                controller.set_drying_room(*room);
            }
            controller.submit(HarvestAction::StartDrying).await?;
        }
        Command::FinishDrying {
            id,
            weights,
            harvest_waste,
        } => {
            controller.load(*id).await?;
            apply_weights(controller, weights);
            if let Some(raw) = harvest_waste {
                controller.set_harvest_waste(raw.clone());
            }
            controller.submit(HarvestAction::FinishDrying).await?;
        }
        Command::StartTrimming { id } => {
            transition(controller, *id, HarvestAction::StartTrimming, None).await?;
        }
        Command::FinishTrimming { id, weights } => {
            transition(controller, *id, HarvestAction::FinishTrimming, Some(weights)).await?;
        }
        Command::FinishCuring { id } => {
            transition(controller, *id, HarvestAction::FinishCuring, None).await?;
        }
        Command::Review { id } => {
            transition(controller, *id, HarvestAction::AdminReview, None).await?;
        }
        Command::Close { id } => {
            transition(controller, *id, HarvestAction::Close, None).await?;
        }
        Command::AddPlants { id, plant_ids } => {
            controller.load(*id).await?;
            controller.add_plants(plant_ids.clone()).await?;
        }
        Command::RecordWeight {
            id,
            strain,
            wet,
            dry,
            waste,
            flower,
            shake,
        } => {
            controller.load(*id).await?;
            let typed = [
                (WeightField::Wet, wet),
                (WeightField::Dry, dry),
                (WeightField::Waste, waste),
                (WeightField::Flower, flower),
                (WeightField::Shake, shake),
            ];
            for (field, value) in typed {
                if let Some(raw) = value {
                    controller.set_weight(*strain, field, raw.clone());
                }
            }
            controller.save_strain(*strain).await?;
        }
    }
    page_output(controller, cli.json)
}

/// Page text to show after a failed command.
///
/// This is the error page when the load failed, or the harvest with its
/// inline error. `None` before anything was loaded.
pub fn failure_output<A: HarvestApi>(controller: &HarvestController<A>, json: bool) -> Option<String> {
    if matches!(controller.view(), PageView::Loading) {
        return None;
    }
    page_output(controller, json).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strain_weight() {
        assert_eq!(
            parse_strain_weight("12=450.5"),
            Ok(StrainWeight { strain_id: 12, raw: "450.5".to_string() })
        );
        assert!(parse_strain_weight("12").is_err());
        assert!(parse_strain_weight("x=4").is_err());
        assert!(parse_strain_weight("3=-4").is_err());
    }

    #[test]
    fn test_finish_drying_arguments() {
        let cli = Cli::try_parse_from([
            "spf-harvest",
            "finish-drying",
            "7",
            "--dry",
            "1=100",
            "--dry",
            "2=80",
            "--harvest-waste",
            "12",
        ])
        .unwrap();
        match cli.command {
            Command::FinishDrying {
                id,
                weights,
                harvest_waste,
            } => {
                assert_eq!(id, 7);
                assert_eq!(weights.dry.len(), 2);
                assert_eq!(harvest_waste.as_deref(), Some("12"));
                let entries: Vec<_> = weights.entries().collect();
                assert_eq!(entries[1].0, WeightField::Dry);
                assert_eq!(entries[1].1.strain_id, 2);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_create_requires_plants() {
        assert!(Cli::try_parse_from(["spf-harvest", "create", "--name", "Spring"]).is_err());
        let cli = Cli::try_parse_from([
            "spf-harvest", "--json", "create", "--name", "Spring", "--plant", "1", "--plant", "2",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.command.harvest_id(), None);
    }
}
