use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::info;

use crate::kpi::fmt_average;
use crate::report::Report;

#[derive(Debug, Clone, Copy)]
pub struct ExportSummary {
    pub teams: usize,
    pub players: usize,
    pub venues: usize,
}

/// Writes the report as a workbook with one sheet per summary table, the
/// artifact handed to people who want the season figures outside the
/// dashboard.
pub fn export_report(path: &Path, report: &Report) -> Result<ExportSummary> {
    let mut workbook = Workbook::new();

    let teams = team_rows(report);
    let sheet = workbook.add_worksheet();
    sheet.set_name("Teams").context("name Teams sheet")?;
    write_rows(sheet, &teams)?;

    let players = player_rows(report);
    let sheet = workbook.add_worksheet();
    sheet.set_name("Players").context("name Players sheet")?;
    write_rows(sheet, &players)?;

    let venues = venue_rows(report);
    let sheet = workbook.add_worksheet();
    sheet.set_name("Venues").context("name Venues sheet")?;
    write_rows(sheet, &venues)?;

    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;

    let summary = ExportSummary {
        teams: teams.len().saturating_sub(1),
        players: players.len().saturating_sub(1),
        venues: venues.len().saturating_sub(1),
    };
    info!(
        path = %path.display(),
        teams = summary.teams,
        players = summary.players,
        "report exported"
    );
    Ok(summary)
}

fn team_rows(report: &Report) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Team".to_string(),
        "Matches".to_string(),
        "Wins".to_string(),
        "Win Rate".to_string(),
        "Toss Wins".to_string(),
        "Toss Win Rate".to_string(),
        "Runs Scored".to_string(),
        "Run Rate".to_string(),
        "Wickets Taken".to_string(),
        "Bowling Average".to_string(),
    ]];
    for (team, s) in &report.team_summaries {
        rows.push(vec![
            team.clone(),
            s.total_matches.to_string(),
            s.wins.to_string(),
            format!("{:.3}", s.win_rate),
            s.toss_wins.to_string(),
            format!("{:.3}", s.toss_win_rate),
            s.total_runs_scored.to_string(),
            format!("{:.2}", s.avg_run_rate),
            s.wickets_taken.to_string(),
            fmt_average(s.bowling_average),
        ]);
    }
    rows
}

fn player_rows(report: &Report) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Player".to_string(),
        "Team".to_string(),
        "Runs".to_string(),
        "Balls Faced".to_string(),
        "Batting Average".to_string(),
        "Strike Rate".to_string(),
        "Dismissals".to_string(),
        "Runs Conceded".to_string(),
        "Balls Bowled".to_string(),
        "Wickets".to_string(),
        "Bowling Average".to_string(),
        "Economy".to_string(),
    ]];
    for (player, s) in &report.player_summaries {
        rows.push(vec![
            player.clone(),
            s.team.clone().unwrap_or_default(),
            s.runs_scored.to_string(),
            s.balls_faced.to_string(),
            format!("{:.2}", s.batting_average),
            format!("{:.2}", s.strike_rate),
            s.dismissals.to_string(),
            s.runs_conceded.to_string(),
            s.balls_bowled.to_string(),
            s.wickets_taken.to_string(),
            fmt_average(s.bowling_average),
            format!("{:.2}", s.economy_rate),
        ]);
    }
    rows
}

fn venue_rows(report: &Report) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Venue".to_string(),
        "City".to_string(),
        "Capacity".to_string(),
        "Timezone".to_string(),
    ]];
    for v in &report.venues {
        rows.push(vec![
            v.name.clone(),
            v.city.clone().unwrap_or_default(),
            v.capacity.map(|c| c.to_string()).unwrap_or_default(),
            v.timezone.clone().unwrap_or_default(),
        ]);
    }
    rows
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::generate_report;
    use crate::synthetic::{self, SyntheticConfig};

    #[test]
    fn sentinel_renders_as_placeholder_not_inf() {
        let sets = synthetic::generate(&SyntheticConfig {
            overs_per_innings: 2,
            ..SyntheticConfig::default()
        });
        let cycle = generate_report(
            &sets.matches,
            &sets.deliveries,
            &sets.players,
            Some(&sets.venues),
        )
        .expect("report expected");
        let rows = team_rows(&cycle.report);
        for row in &rows {
            for cell in row {
                assert!(!cell.contains("inf"), "unguarded average in {cell:?}");
            }
        }
    }

    #[test]
    fn sheets_cover_every_summary_row() {
        let sets = synthetic::generate(&SyntheticConfig {
            overs_per_innings: 2,
            ..SyntheticConfig::default()
        });
        let cycle = generate_report(
            &sets.matches,
            &sets.deliveries,
            &sets.players,
            Some(&sets.venues),
        )
        .expect("report expected");
        assert_eq!(
            team_rows(&cycle.report).len(),
            cycle.report.team_summaries.len() + 1
        );
        assert_eq!(
            player_rows(&cycle.report).len(),
            cycle.report.player_summaries.len() + 1
        );
        assert_eq!(venue_rows(&cycle.report).len(), cycle.report.venues.len() + 1);
    }
}
