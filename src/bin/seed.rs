use std::path::PathBuf;

use anyhow::{Context, Result};

use ipl_analytics::records::RecordKind;
use ipl_analytics::store;
use ipl_analytics::synthetic::{self, SyntheticConfig};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_logging();

    let db_path = parse_path_arg("--db")
        .or_else(store::default_db_path)
        .context("unable to resolve sqlite path")?;

    let cfg = SyntheticConfig {
        season: parse_num_arg("--season").unwrap_or(2025),
        overs_per_innings: parse_num_arg("--overs").unwrap_or(20).clamp(1, 20),
        seed: parse_num_arg("--seed").unwrap_or(42) as u64,
    };

    let sets = synthetic::generate(&cfg);

    let mut conn = store::open_db(&db_path)?;
    store::replace_matches(&mut conn, &sets.matches)?;
    store::replace_deliveries(&mut conn, &sets.deliveries)?;
    store::replace_players(&mut conn, &sets.players)?;
    store::replace_standings(&mut conn, &sets.standings)?;
    store::replace_venues(&mut conn, &sets.venues)?;

    println!("Synthetic season seeded");
    println!("DB: {}", db_path.display());
    println!(
        "Season {} / {} overs per innings / seed {}",
        cfg.season, cfg.overs_per_innings, cfg.seed
    );
    for kind in RecordKind::ALL {
        println!(
            "  {}: {}",
            kind.table(),
            store::count(&conn, kind).unwrap_or_default()
        );
    }

    Ok(())
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

fn parse_num_arg(flag: &str) -> Option<i64> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&prefix) {
            if let Ok(value) = raw.trim().parse::<i64>() {
                return Some(value);
            }
        }
        if arg == flag {
            if let Some(value) = args.get(idx + 1).and_then(|v| v.trim().parse::<i64>().ok()) {
                return Some(value);
            }
        }
    }
    None
}
