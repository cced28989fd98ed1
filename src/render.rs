//! Terminal rendering of the occupancy grid.
//!
//! Extension traits that add colored output to staygrid-core types using
//! owo_colors. Every cell is four columns wide: two for the occupancy
//! symbols and two for the cleaning badge.

use owo_colors::OwoColorize;
use staygrid_core::Platform;
use staygrid_core::grid::{
    BlockReason, CellVerdict, CleaningBadge, Grid, GridCell, GridDay, Occupancy, OccupancyPolicy,
};

/// Longest property name before it gets truncated.
const NAME_WIDTH_MAX: usize = 28;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for Occupancy {
    fn render(&self) -> String {
        let symbol = match (self.is_entry, self.is_exit) {
            (true, true) => "◆",
            (true, false) => "▶",
            (false, true) => "◀",
            (false, false) => "■",
        };
        match self.platform {
            Platform::Airbnb => symbol.red().to_string(),
            Platform::Booking => symbol.blue().to_string(),
        }
    }
}

impl Render for CellVerdict {
    fn render(&self) -> String {
        match self {
            CellVerdict::Empty => format!("{} ", "·".dimmed()),
            CellVerdict::Blocked { .. } => match self.block_reason() {
                Some(BlockReason::ManualBlock) => format!("{} ", "✕".yellow()),
                _ => format!("{} ", "░".dimmed()),
            },
            // Departure first, so a turnover reads ◀▶
            CellVerdict::Occupied { occupancies } => {
                let mut ordered: Vec<&Occupancy> = occupancies.iter().collect();
                ordered.sort_by_key(|o| !o.is_exit);
                let symbols: String = ordered.iter().take(2).map(|o| o.render()).collect();
                if ordered.len() == 1 {
                    format!("{symbols} ")
                } else {
                    symbols
                }
            }
        }
    }
}

impl Render for CleaningBadge {
    fn render(&self) -> String {
        self.glyph.to_string()
    }
}

impl Render for GridCell {
    fn render(&self) -> String {
        let badge = match &self.cleaning {
            Some(badge) => badge.render(),
            None => "  ".to_string(),
        };
        format!("{}{}", self.verdict.render(), badge)
    }
}

impl Render for GridDay {
    fn render(&self) -> String {
        let weekday: String = self.weekday.chars().take(2).collect();
        let label = format!("{weekday}{:<2}", self.date.format("%d"));
        if self.is_sunday {
            label.red().bold().to_string()
        } else {
            label.dimmed().to_string()
        }
    }
}

impl Render for OccupancyPolicy {
    fn render(&self) -> String {
        match self {
            OccupancyPolicy::InclusiveCheckout => "checkout day counted".to_string(),
            OccupancyPolicy::ExclusiveCheckout => "checkout day free".to_string(),
        }
    }
}

impl Render for Grid {
    fn render(&self) -> String {
        let name_width = self
            .rows
            .iter()
            .map(|r| r.display_name.chars().count())
            .max()
            .unwrap_or(0)
            .clamp("Property".len(), NAME_WIDTH_MAX);

        let mut lines = Vec::new();
        lines.push(format!(
            "{} → {} {}",
            self.window.start.format("%d %b %Y").bold(),
            self.window.end().format("%d %b %Y").bold(),
            format!("({})", self.policy.render()).dimmed()
        ));
        lines.push(String::new());

        let header: String = self.days.iter().map(|d| d.render()).collect();
        lines.push(format!("{:<name_width$} {}", "Property".bold(), header));

        if self.rows.is_empty() {
            lines.push("   No properties".dimmed().to_string());
        }
        for row in &self.rows {
            let cells: String = row.cells.iter().map(|c| c.render()).collect();
            lines.push(format!(
                "{:<name_width$} {}",
                fit(&row.display_name, name_width),
                cells
            ));
        }

        lines.push(String::new());
        lines.push(legend());
        lines.join("\n")
    }
}

fn legend() -> String {
    format!(
        "{} airbnb  {} booking  {} arrival  {} departure  {} same day  {} blocked  {} held by platform  {} cleaning",
        "■".red(),
        "■".blue(),
        "▶",
        "◀",
        "◆",
        "✕".yellow(),
        "░".dimmed(),
        staygrid_core::grid::GENERIC_CLEANING_GLYPH,
    )
}

/// Truncate to `width` characters, marking the cut with an ellipsis.
fn fit(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        return name.to_string();
    }
    let mut cut: String = name.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Simple pluralization helper
pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use staygrid_core::grid::{DateWindow, project};
    use staygrid_core::{PropertyTimeline, VendorMap};

    #[test]
    fn long_names_are_truncated() {
        assert_eq!(fit("Studio", 10), "Studio");
        assert_eq!(fit("Appartement Vieux Port", 8), "Apparte…");
    }

    #[test]
    fn turnover_shows_both_platforms() {
        let cell = CellVerdict::Occupied {
            occupancies: vec![
                Occupancy {
                    platform: Platform::Airbnb,
                    is_entry: true,
                    is_exit: false,
                },
                Occupancy {
                    platform: Platform::Booking,
                    is_entry: false,
                    is_exit: true,
                },
            ],
        }
        .render();
        let departure = cell.find('◀').unwrap();
        let arrival = cell.find('▶').unwrap();
        assert!(departure < arrival);
    }

    #[test]
    fn grid_lists_every_property() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let timelines = [PropertyTimeline::merge(
            "logement-1",
            "Studio Vieux Port".to_string(),
            Vec::new(),
            &VendorMap::new(),
        )];
        let grid = project(&timelines, DateWindow::new(start, 7), OccupancyPolicy::default());

        let out = grid.render();
        assert!(out.contains("Studio Vieux Port"));
        assert!(out.contains("checkout day counted"));
        assert_eq!(out.matches('·').count(), 7);
    }

    #[test]
    fn pluralizes_counts() {
        assert_eq!(pluralize("feed", 1), "feed");
        assert_eq!(pluralize("event", 3), "events");
    }
}
