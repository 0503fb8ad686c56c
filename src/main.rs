use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::error;

use ipl_analytics::kpi::fmt_average;
use ipl_analytics::predictor::MatchQuery;
use ipl_analytics::report::{Analyzer, Report};
use ipl_analytics::report_export;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_logging();

    let db_path = parse_path_arg("--db")
        .or_else(ipl_analytics::store::default_db_path)
        .context("unable to resolve sqlite path")?;

    let mut analyzer = Analyzer::open(&db_path)?;
    let sets = match analyzer.load() {
        Ok(sets) => sets,
        Err(err) => {
            // A storage failure aborts the whole cycle; no partial figures.
            error!(error = %err, "record store load failed");
            println!("Data not available. Run csv_ingest or seed first.");
            return Ok(());
        }
    };

    let Some(report) = analyzer.generate_report(&sets) else {
        println!("Data not available / model not trained.");
        println!("DB: {}", db_path.display());
        return Ok(());
    };

    print_report_summary(&report);

    if let Some(path) = parse_path_arg("--export") {
        let summary = report_export::export_report(&path, &report)?;
        println!(
            "Exported {} teams / {} players to {}",
            summary.teams,
            summary.players,
            path.display()
        );
    }

    if has_flag("--json") {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serialize report")?
        );
        return Ok(());
    }

    if report.model_trained {
        let query = MatchQuery {
            team1: "Mumbai Indians".to_string(),
            team2: "Chennai Super Kings".to_string(),
            toss_winner: "Mumbai Indians".to_string(),
            toss_decision: "bat".to_string(),
            venue: "Wankhede Stadium".to_string(),
        };
        println!("\nExample prediction: {} vs {}", query.team1, query.team2);
        match analyzer.predict(&query) {
            Some(prediction) => {
                println!("  Predicted winner: {}", prediction.predicted_winner);
                println!("  Confidence: {:.1}%", prediction.confidence * 100.0);
            }
            None => println!("  Model not ready."),
        }
    }

    Ok(())
}

fn print_report_summary(report: &Report) {
    println!("Season report v{}", report.version);
    println!("  Matches:    {}", report.total_matches);
    println!("  Deliveries: {}", report.total_deliveries);
    println!("  Players:    {}", report.total_players);
    println!(
        "  Model:      {}",
        if report.model_trained {
            "trained"
        } else {
            "not trained"
        }
    );

    let mut by_win_rate: Vec<_> = report.team_summaries.iter().collect();
    by_win_rate.sort_by(|a, b| {
        b.1.win_rate
            .partial_cmp(&a.1.win_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    println!("\nTop teams by win rate:");
    for (team, s) in by_win_rate.iter().take(5) {
        println!(
            "  {team}: {:.1}% ({} of {}), bowling avg {}",
            s.win_rate * 100.0,
            s.wins,
            s.total_matches,
            fmt_average(s.bowling_average)
        );
    }

    let mut by_runs: Vec<_> = report.player_summaries.iter().collect();
    by_runs.sort_by(|a, b| b.1.runs_scored.cmp(&a.1.runs_scored));
    println!("\nTop batsmen by runs:");
    for (player, s) in by_runs.iter().take(5) {
        println!(
            "  {player}: {} runs, SR {:.1}",
            s.runs_scored, s.strike_rate
        );
    }

    let mut by_wickets: Vec<_> = report.player_summaries.iter().collect();
    by_wickets.sort_by(|a, b| b.1.wickets_taken.cmp(&a.1.wickets_taken));
    println!("\nTop bowlers by wickets:");
    for (player, s) in by_wickets.iter().take(5) {
        println!(
            "  {player}: {} wickets, economy {:.2}",
            s.wickets_taken, s.economy_rate
        );
    }
}

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ipl_analytics=info"));
    fmt().with_env_filter(env_filter).init();
}

fn parse_path_arg(flag: &str) -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&prefix) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}

fn has_flag(flag: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == flag)
}
