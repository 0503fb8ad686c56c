use std::path::PathBuf;

use anyhow::{Context, Result};

use ipl_analytics::ingest;
use ipl_analytics::records::RecordKind;
use ipl_analytics::store;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_logging();

    let data_dir = parse_path_arg("--data-dir").unwrap_or_else(|| PathBuf::from("data/raw"));
    let db_path = parse_path_arg("--db")
        .or_else(store::default_db_path)
        .context("unable to resolve sqlite path")?;

    let mut conn = store::open_db(&db_path)?;
    let report = ingest::run_etl(&mut conn, &data_dir)?;

    println!("CSV ingest complete");
    println!("DB: {}", db_path.display());
    println!("Archive: {}", report.data_dir.display());
    println!("Files: {}/{}", report.files_loaded, report.files_total);
    println!("Rows loaded: {}", report.rows_loaded);
    if !report.errors.is_empty() {
        println!("Errors: {}", report.errors.len());
        for err in report.errors.iter().take(6) {
            println!(" - {err}");
        }
    }

    println!("\nRecord store counts:");
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
