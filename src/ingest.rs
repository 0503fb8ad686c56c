use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use csv::StringRecord;
use rusqlite::{Connection, params};
use tracing::{info, warn};

use crate::records::{Delivery, Match, Player, RecordKind, Standing, Venue};
use crate::store;

const MAX_REPORTED_ERRORS: usize = 20;

#[derive(Debug, Clone)]
pub struct IngestReport {
    pub data_dir: PathBuf,
    pub files_total: usize,
    pub files_loaded: usize,
    pub rows_loaded: usize,
    pub errors: Vec<String>,
}

impl IngestReport {
    /// Every required file made it into the store.
    pub fn complete(&self) -> bool {
        self.files_loaded == self.files_total
    }
}

/// Loads a season archive of CSV files into the record store, one file per
/// record set, replacing previous contents wholesale. A missing optional
/// file is skipped; a missing required file is reported and the rest of the
/// archive still loads.
pub fn run_etl(conn: &mut Connection, data_dir: &Path) -> Result<IngestReport> {
    let started_at = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO ingest_runs(started_at, finished_at, files_total, files_loaded, rows_loaded, errors_json)
         VALUES (?1, NULL, 0, 0, 0, '[]')",
        params![started_at],
    )
    .context("insert ingest run")?;
    let run_id = conn.last_insert_rowid();

    let mut report = IngestReport {
        data_dir: data_dir.to_path_buf(),
        files_total: 0,
        files_loaded: 0,
        rows_loaded: 0,
        errors: Vec::new(),
    };

    for kind in RecordKind::ALL {
        let path = data_dir.join(kind.csv_file());
        if !path.exists() {
            if kind.required() {
                report.files_total += 1;
                report
                    .errors
                    .push(format!("{}: file not found", path.display()));
                warn!(file = %path.display(), "required archive file missing");
            }
            continue;
        }
        report.files_total += 1;

        match load_one(conn, kind, &path) {
            Ok(rows) => {
                info!(file = %path.display(), rows, "record set loaded");
                report.files_loaded += 1;
                report.rows_loaded += rows;
            }
            Err(err) => {
                warn!(file = %path.display(), error = %err, "record set failed to load");
                report.errors.push(format!("{}: {err}", path.display()));
            }
        }
    }

    let finished_at = Utc::now().to_rfc3339();
    let errors_json = serde_json::to_string(&report.errors).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "UPDATE ingest_runs
         SET finished_at = ?1, files_total = ?2, files_loaded = ?3, rows_loaded = ?4, errors_json = ?5
         WHERE run_id = ?6",
        params![
            finished_at,
            report.files_total as i64,
            report.files_loaded as i64,
            report.rows_loaded as i64,
            errors_json,
            run_id
        ],
    )
    .context("update ingest run")?;

    Ok(report)
}

fn load_one(conn: &mut Connection, kind: RecordKind, path: &Path) -> Result<usize> {
    let mut errors = Vec::new();
    let rows = match kind {
        RecordKind::Matches => {
            let rows = parse_file(path, &mut errors, parse_match)?;
            store::replace_matches(conn, &rows)?
        }
        RecordKind::Deliveries => {
            let rows = parse_file(path, &mut errors, parse_delivery)?;
            store::replace_deliveries(conn, &rows)?
        }
        RecordKind::Players => {
            let rows = parse_file(path, &mut errors, parse_player)?;
            store::replace_players(conn, &rows)?
        }
        RecordKind::PointsTable => {
            let rows = parse_file(path, &mut errors, parse_standing)?;
            store::replace_standings(conn, &rows)?
        }
        RecordKind::Venues => {
            let rows = parse_file(path, &mut errors, parse_venue)?;
            store::replace_venues(conn, &rows)?
        }
    };
    for err in errors.iter().take(MAX_REPORTED_ERRORS) {
        warn!(file = %path.display(), error = %err, "row skipped");
    }
    Ok(rows)
}

/// Header-addressed view over one CSV row.
struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_ascii_lowercase(), i))
            .collect();
        Self { index }
    }

    fn text(&self, rec: &StringRecord, name: &str) -> String {
        self.index
            .get(name)
            .and_then(|&i| rec.get(i))
            .unwrap_or_default()
            .trim()
            .to_string()
    }

    fn opt_text(&self, rec: &StringRecord, name: &str) -> Option<String> {
        let raw = self.text(rec, name);
        if raw.is_empty() || raw.eq_ignore_ascii_case("na") || raw.eq_ignore_ascii_case("nan") {
            None
        } else {
            Some(raw)
        }
    }

    fn int(&self, rec: &StringRecord, name: &str) -> i64 {
        self.text(rec, name).parse::<f64>().unwrap_or(0.0) as i64
    }

    fn opt_int(&self, rec: &StringRecord, name: &str) -> Option<i64> {
        self.opt_text(rec, name)?.parse::<f64>().ok().map(|v| v as i64)
    }

    fn float(&self, rec: &StringRecord, name: &str) -> f64 {
        self.text(rec, name).parse::<f64>().unwrap_or(0.0)
    }

    fn require_int(&self, rec: &StringRecord, name: &str) -> Result<i64> {
        self.opt_text(rec, name)
            .ok_or_else(|| anyhow!("missing {name}"))?
            .parse::<i64>()
            .with_context(|| format!("unparseable {name}"))
    }
}

fn parse_file<T>(
    path: &Path,
    errors: &mut Vec<String>,
    parse: fn(&Columns, &StringRecord) -> Result<T>,
) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let columns = Columns::from_headers(
        reader
            .headers()
            .with_context(|| format!("read headers of {}", path.display()))?,
    );

    let mut out = Vec::new();
    for (line, record) in reader.records().enumerate() {
        match record {
            Ok(rec) => match parse(&columns, &rec) {
                Ok(row) => out.push(row),
                Err(err) => errors.push(format!("line {}: {err}", line + 2)),
            },
            Err(err) => errors.push(format!("line {}: {err}", line + 2)),
        }
    }
    Ok(out)
}

fn parse_match(cols: &Columns, rec: &StringRecord) -> Result<Match> {
    Ok(Match {
        id: cols.require_int(rec, "id")?,
        season: cols.int(rec, "season"),
        city: cols.opt_text(rec, "city"),
        date: cols.text(rec, "date"),
        team1: cols.text(rec, "team1"),
        team2: cols.text(rec, "team2"),
        toss_winner: cols.text(rec, "toss_winner"),
        toss_decision: cols.text(rec, "toss_decision"),
        result: cols.opt_text(rec, "result"),
        dl_applied: cols.int(rec, "dl_applied") != 0,
        winner: cols.opt_text(rec, "winner"),
        win_by_runs: cols.int(rec, "win_by_runs"),
        win_by_wickets: cols.int(rec, "win_by_wickets"),
        player_of_match: cols.opt_text(rec, "player_of_match"),
        venue: cols.text(rec, "venue"),
        umpire1: cols.opt_text(rec, "umpire1"),
        umpire2: cols.opt_text(rec, "umpire2"),
        umpire3: cols.opt_text(rec, "umpire3"),
    })
}

fn parse_delivery(cols: &Columns, rec: &StringRecord) -> Result<Delivery> {
    Ok(Delivery {
        id: cols.require_int(rec, "id")?,
        match_id: cols.require_int(rec, "match_id")?,
        inning: cols.int(rec, "inning"),
        batting_team: cols.text(rec, "batting_team"),
        bowling_team: cols.text(rec, "bowling_team"),
        over: cols.int(rec, "over"),
        ball: cols.int(rec, "ball"),
        batsman: cols.text(rec, "batsman"),
        non_striker: cols.text(rec, "non_striker"),
        bowler: cols.text(rec, "bowler"),
        is_super_over: cols.int(rec, "is_super_over") != 0,
        wide_runs: cols.int(rec, "wide_runs"),
        bye_runs: cols.int(rec, "bye_runs"),
        legbye_runs: cols.int(rec, "legbye_runs"),
        noball_runs: cols.int(rec, "noball_runs"),
        penalty_runs: cols.int(rec, "penalty_runs"),
        batsman_runs: cols.int(rec, "batsman_runs"),
        extra_runs: cols.int(rec, "extra_runs"),
        total_runs: cols.int(rec, "total_runs"),
        player_dismissed: cols.opt_text(rec, "player_dismissed"),
        dismissal_kind: cols.opt_text(rec, "dismissal_kind"),
        fielder: cols.opt_text(rec, "fielder"),
    })
}

fn parse_player(cols: &Columns, rec: &StringRecord) -> Result<Player> {
    Ok(Player {
        id: cols.require_int(rec, "id")?,
        player_name: cols.text(rec, "player_name"),
        team: cols.opt_text(rec, "team"),
        role: cols.opt_text(rec, "role"),
        batting_style: cols.opt_text(rec, "batting_style"),
        bowling_style: cols.opt_text(rec, "bowling_style"),
        country: cols.opt_text(rec, "country"),
        born_date: cols.opt_text(rec, "born_date"),
        matches_played: cols.int(rec, "matches_played"),
        runs_scored: cols.int(rec, "runs_scored"),
        wickets_taken: cols.int(rec, "wickets_taken"),
        catches: cols.int(rec, "catches"),
        stumpings: cols.int(rec, "stumpings"),
    })
}

fn parse_standing(cols: &Columns, rec: &StringRecord) -> Result<Standing> {
    Ok(Standing {
        id: cols.require_int(rec, "id")?,
        season: cols.int(rec, "season"),
        team: cols.text(rec, "team"),
        matches_played: cols.int(rec, "matches_played"),
        won: cols.int(rec, "won"),
        lost: cols.int(rec, "lost"),
        tied: cols.int(rec, "tied"),
        no_result: cols.int(rec, "no_result"),
        points: cols.int(rec, "points"),
        net_run_rate: cols.float(rec, "net_run_rate"),
        for_overs: cols.float(rec, "for_overs"),
        against_overs: cols.float(rec, "against_overs"),
        position: cols.int(rec, "position"),
    })
}

fn parse_venue(cols: &Columns, rec: &StringRecord) -> Result<Venue> {
    Ok(Venue {
        id: cols.require_int(rec, "id")?,
        name: cols.text(rec, "name"),
        city: cols.opt_text(rec, "city"),
        capacity: cols.opt_int(rec, "capacity"),
        timezone: cols.opt_text(rec, "timezone"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns_for(header: &[&str]) -> (Columns, StringRecord) {
        let headers = StringRecord::from(header.to_vec());
        (Columns::from_headers(&headers), headers)
    }

    #[test]
    fn optional_text_treats_na_as_missing() {
        let (cols, _) = columns_for(&["winner"]);
        let rec = StringRecord::from(vec!["NA"]);
        assert_eq!(cols.opt_text(&rec, "winner"), None);
        let rec = StringRecord::from(vec!["Mumbai Indians"]);
        assert_eq!(cols.opt_text(&rec, "winner").as_deref(), Some("Mumbai Indians"));
    }

    #[test]
    fn match_row_parses_with_null_winner() {
        let (cols, _) = columns_for(&[
            "id", "season", "date", "team1", "team2", "toss_winner", "toss_decision",
            "winner", "venue",
        ]);
        let rec = StringRecord::from(vec![
            "7", "2025", "2025-04-07", "MI", "CSK", "MI", "bat", "", "Wankhede Stadium",
        ]);
        let m = parse_match(&cols, &rec).expect("row should parse");
        assert_eq!(m.id, 7);
        assert_eq!(m.winner, None);
        assert_eq!(m.venue, "Wankhede Stadium");
    }

    #[test]
    fn row_without_id_is_rejected() {
        let (cols, _) = columns_for(&["id", "team1"]);
        let rec = StringRecord::from(vec!["", "MI"]);
        assert!(parse_match(&cols, &rec).is_err());
    }

    #[test]
    fn etl_reports_missing_required_files() {
        let dir = std::env::temp_dir().join("ipl_analytics_etl_empty_test");
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let mut conn = Connection::open_in_memory().expect("open sqlite");
        store::init_schema(&conn).expect("schema");

        let report = run_etl(&mut conn, &dir).expect("etl runs");
        assert!(!report.complete());
        // Four required sets; venues is optional and simply skipped.
        assert_eq!(report.files_total, 4);
        assert_eq!(report.files_loaded, 0);
        assert_eq!(report.errors.len(), 4);
        assert_eq!(store::count(&conn, RecordKind::Matches).expect("count"), 0);
    }

    #[test]
    fn etl_loads_a_minimal_archive() {
        let dir = std::env::temp_dir().join("ipl_analytics_etl_load_test");
        std::fs::create_dir_all(&dir).expect("create temp dir");
        std::fs::write(
            dir.join("matches.csv"),
            "id,season,date,team1,team2,toss_winner,toss_decision,winner,venue\n\
             1,2025,2025-04-01,MI,CSK,MI,bat,MI,Wankhede Stadium\n\
             bad-row,,,,,,,,\n",
        )
        .expect("write matches.csv");
        std::fs::write(
            dir.join("deliveries.csv"),
            "id,match_id,inning,batting_team,bowling_team,over,ball,batsman,non_striker,bowler,batsman_runs,extra_runs,total_runs\n\
             1,1,1,MI,CSK,1,1,RG Sharma,I Kishan,DL Chahar,4,0,4\n",
        )
        .expect("write deliveries.csv");
        std::fs::write(
            dir.join("players.csv"),
            "id,player_name,team\n1,RG Sharma,MI\n",
        )
        .expect("write players.csv");
        std::fs::write(
            dir.join("points_table.csv"),
            "id,season,team,matches_played,won,lost,tied,no_result,points,net_run_rate,position\n\
             1,2025,MI,1,1,0,0,0,2,0.50,1\n",
        )
        .expect("write points_table.csv");

        let mut conn = Connection::open_in_memory().expect("open sqlite");
        store::init_schema(&conn).expect("schema");
        let report = run_etl(&mut conn, &dir).expect("etl runs");
        assert!(report.complete());
        assert_eq!(report.files_loaded, 4);
        assert_eq!(report.rows_loaded, 4);

        let sets = store::load(&conn).expect("load");
        assert_eq!(sets.matches.len(), 1);
        assert_eq!(sets.matches[0].winner.as_deref(), Some("MI"));
        assert_eq!(sets.standings[0].net_run_rate, 0.5);
    }
}
