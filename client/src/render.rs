//! Plain-text rendering of the harvest page

use std::fmt::Write;

use shared::{format_grams, Harvest, HarvestStatus, Progress, WeightField};

use crate::view::{HarvestView, PageView};

const FILLED: char = '■';
const EMPTY: char = '□';

/// Seven-segment bar followed by the stage names, current one bracketed
pub fn render_progress(progress: &Progress) -> String {
    let bar: String = progress
        .steps
        .iter()
        .map(|s| if s.filled { FILLED } else { EMPTY })
        .collect();
    let labels: Vec<String> = progress
        .steps
        .iter()
        .map(|s| {
            if s.current {
                format!("[{}]", s.label)
            } else {
                s.label.to_string()
            }
        })
        .collect();
    format!("{} {}", bar, labels.join(" > "))
}

pub fn render_page(page: &PageView) -> String {
    match page {
        PageView::Loading => "Loading harvest...".to_string(),
        PageView::Error(message) => format!("Error: {}", message),
        PageView::Ready(view) => render_harvest(view),
    }
}

pub fn render_harvest(view: &HarvestView) -> String {
    let harvest = &view.harvest;
    let mut out = String::new();

    let _ = writeln!(out, "{} (#{})  {}", harvest.name, harvest.id, harvest.status.label());
    let _ = writeln!(out, "{}", render_progress(&view.progress));

    let aggregates = aggregate_line(harvest);
    if !aggregates.is_empty() {
        let _ = writeln!(out, "{}", aggregates);
    }
    if let Some(room) = &harvest.drying_room_name {
        let _ = writeln!(out, "Drying room: {}", room);
    }

    if !harvest.strains_in_harvest.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Weights by strain:");
        for strain in &harvest.strains_in_harvest {
            let mut cells = Vec::new();
            for field in WeightField::ALL {
                let raw = view.sheet.raw(strain.id, field).trim();
                if !raw.is_empty() {
                    cells.push(format!("{} {}g", field, raw));
                }
            }
            let plants = harvest.plant_count(strain.id);
            let _ = writeln!(
                out,
                "  {} ({} plants): {}",
                strain.name,
                plants,
                if cells.is_empty() {
                    "-".to_string()
                } else {
                    cells.join(", ")
                }
            );
        }
    }

    if !view.advisory.is_empty() {
        let _ = writeln!(out);
        for line in &view.advisory {
            let _ = writeln!(out, "{}", line);
        }
    }

    let timeline = timeline_lines(harvest);
    if !timeline.is_empty() {
        let _ = writeln!(out);
        for line in timeline {
            let _ = writeln!(out, "{}", line);
        }
    }

    if !view.audit_events.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Activity:");
        for event in &view.audit_events {
            let actor = event
                .actor
                .as_ref()
                .map(|a| format!(" by {}", a))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "  {} {}{}",
                event.created_at.format("%Y-%m-%d %H:%M"),
                event.action,
                actor
            );
        }
    }

    let _ = writeln!(out);
    match &view.action {
        Some(action) if action.enabled => {
            let _ = writeln!(out, "Next: {}", action.label);
        }
        Some(action) => {
            let _ = writeln!(
                out,
                "Next: {} (disabled: {})",
                action.label,
                action.blocked_reason.as_deref().unwrap_or("not available")
            );
        }
        None if harvest.status.is_terminal() => {
            let _ = writeln!(out, "Harvest closed");
        }
        None => {
            let _ = writeln!(out, "Waiting for an admin");
        }
    }

    if let Some(error) = &view.error {
        let _ = writeln!(out, "Error: {}", error);
    }

    out.trim_end().to_string()
}

fn aggregate_line(harvest: &Harvest) -> String {
    WeightField::ALL
        .iter()
        .filter_map(|field| {
            field
                .aggregate(harvest)
                .map(|value| format!("{} {}", field, format_grams(value)))
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

fn timeline_lines(harvest: &Harvest) -> Vec<String> {
    let mut lines: Vec<String> = HarvestStatus::ALL
        .iter()
        .filter_map(|status| {
            harvest.entered_at(*status).map(|at| {
                format!("{:<10} {}", status.label(), at.format("%Y-%m-%d %H:%M"))
            })
        })
        .collect();
    if let Some(at) = harvest.admin_reviewed_at {
        let by = harvest
            .admin_reviewed_by
            .as_ref()
            .map(|a| format!(" by {}", a))
            .unwrap_or_default();
        lines.push(format!("Reviewed   {}{}", at.format("%Y-%m-%d %H:%M"), by));
    }
    lines
}

/// One line per harvest for listings
pub fn render_list(harvests: &[Harvest]) -> String {
    if harvests.is_empty() {
        return "No harvests".to_string();
    }
    harvests
        .iter()
        .map(|h| {
            format!(
                "#{:<5} {:<30} {:<9} {}",
                h.id,
                h.name,
                h.status.as_str(),
                h.strains_in_harvest.len()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{progress, StrainRef, UserRole, WeightSheet};

    #[test]
    fn test_progress_bar_segments() {
        let line = render_progress(&progress(HarvestStatus::Dried));
        assert!(line.starts_with("■■■□□□□ "));
        assert!(line.contains("[Dried]"));
    }

    #[test]
    fn test_render_drying_page() {
        let mut harvest: Harvest = serde_json::from_value(serde_json::json!({
            "id": 4,
            "name": "Spring",
            "status": "drying",
            "wet_weight_grams": 800,
        }))
        .unwrap();
        harvest.strains_in_harvest = vec![
            StrainRef { id: 1, name: "A".to_string() },
            StrainRef { id: 2, name: "B".to_string() },
        ];
        let mut sheet = WeightSheet::new();
        sheet.set(1, WeightField::Dry, "100");
        sheet.set(2, WeightField::Dry, "80");

        let view = HarvestView::build(&harvest, &sheet, UserRole::Staff, &[], &[], None);
        let text = render_harvest(&view);
        assert!(text.contains("wet 800g"));
        assert!(text.contains("A (0 plants): dry 100g"));
        assert!(text.contains("Total dry: 180g"));
        assert!(text.contains("Water loss: 77.5% from 800g wet"));
        assert!(text.ends_with("Next: Mark as Dried"));
    }

    #[test]
    fn test_render_error_page() {
        assert_eq!(
            render_page(&PageView::Error("Harvest not found".to_string())),
            "Error: Harvest not found"
        );
    }
}
