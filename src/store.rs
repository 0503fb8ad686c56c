use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, Row, params};
use tracing::info;

use crate::records::{Delivery, Match, Player, RecordKind, RecordSets, Standing, Venue};

const DATA_DIR: &str = "ipl_analytics";
const DB_FILE: &str = "ipl_season.sqlite";

/// Resolves the SQLite path: `APP_DB_PATH`, then the XDG cache dir,
/// then `~/.cache`.
pub fn default_db_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("APP_DB_PATH") {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path.trim()));
        }
    }
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(DATA_DIR).join(DB_FILE));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".cache")
            .join(DATA_DIR)
            .join(DB_FILE),
    )
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS matches (
            id INTEGER PRIMARY KEY,
            season INTEGER NOT NULL,
            city TEXT NULL,
            date TEXT NOT NULL,
            team1 TEXT NOT NULL,
            team2 TEXT NOT NULL,
            toss_winner TEXT NOT NULL,
            toss_decision TEXT NOT NULL,
            result TEXT NULL,
            dl_applied INTEGER NOT NULL,
            winner TEXT NULL,
            win_by_runs INTEGER NOT NULL,
            win_by_wickets INTEGER NOT NULL,
            player_of_match TEXT NULL,
            venue TEXT NOT NULL,
            umpire1 TEXT NULL,
            umpire2 TEXT NULL,
            umpire3 TEXT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_season ON matches(season);
        CREATE INDEX IF NOT EXISTS idx_matches_venue ON matches(venue);

        CREATE TABLE IF NOT EXISTS deliveries (
            id INTEGER PRIMARY KEY,
            match_id INTEGER NOT NULL,
            inning INTEGER NOT NULL,
            batting_team TEXT NOT NULL,
            bowling_team TEXT NOT NULL,
            over INTEGER NOT NULL,
            ball INTEGER NOT NULL,
            batsman TEXT NOT NULL,
            non_striker TEXT NOT NULL,
            bowler TEXT NOT NULL,
            is_super_over INTEGER NOT NULL,
            wide_runs INTEGER NOT NULL,
            bye_runs INTEGER NOT NULL,
            legbye_runs INTEGER NOT NULL,
            noball_runs INTEGER NOT NULL,
            penalty_runs INTEGER NOT NULL,
            batsman_runs INTEGER NOT NULL,
            extra_runs INTEGER NOT NULL,
            total_runs INTEGER NOT NULL,
            player_dismissed TEXT NULL,
            dismissal_kind TEXT NULL,
            fielder TEXT NULL,
            FOREIGN KEY (match_id) REFERENCES matches (id)
        );
        CREATE INDEX IF NOT EXISTS idx_deliveries_match ON deliveries(match_id);
        CREATE INDEX IF NOT EXISTS idx_deliveries_batting ON deliveries(batting_team);
        CREATE INDEX IF NOT EXISTS idx_deliveries_bowling ON deliveries(bowling_team);

        CREATE TABLE IF NOT EXISTS players (
            id INTEGER PRIMARY KEY,
            player_name TEXT NOT NULL,
            team TEXT NULL,
            role TEXT NULL,
            batting_style TEXT NULL,
            bowling_style TEXT NULL,
            country TEXT NULL,
            born_date TEXT NULL,
            matches_played INTEGER NOT NULL,
            runs_scored INTEGER NOT NULL,
            wickets_taken INTEGER NOT NULL,
            catches INTEGER NOT NULL,
            stumpings INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS points_table (
            id INTEGER PRIMARY KEY,
            season INTEGER NOT NULL,
            team TEXT NOT NULL,
            matches_played INTEGER NOT NULL,
            won INTEGER NOT NULL,
            lost INTEGER NOT NULL,
            tied INTEGER NOT NULL,
            no_result INTEGER NOT NULL,
            points INTEGER NOT NULL,
            net_run_rate REAL NOT NULL,
            for_overs REAL NOT NULL,
            against_overs REAL NOT NULL,
            position INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS venues (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            city TEXT NULL,
            capacity INTEGER NULL,
            timezone TEXT NULL
        );

        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            files_total INTEGER NOT NULL,
            files_loaded INTEGER NOT NULL,
            rows_loaded INTEGER NOT NULL,
            errors_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Reads all five record sets in one pass. Any storage failure aborts the
/// whole load; callers must not start a report cycle on a partial read.
pub fn load(conn: &Connection) -> Result<RecordSets> {
    let sets = RecordSets {
        matches: load_matches(conn)?,
        deliveries: load_deliveries(conn)?,
        players: load_players(conn)?,
        standings: load_standings(conn)?,
        venues: load_venues(conn)?,
    };
    info!(
        matches = sets.matches.len(),
        deliveries = sets.deliveries.len(),
        players = sets.players.len(),
        standings = sets.standings.len(),
        venues = sets.venues.len(),
        "record sets loaded"
    );
    Ok(sets)
}

pub fn count(conn: &Connection, kind: RecordKind) -> Result<i64> {
    conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", kind.table()),
        [],
        |row| row.get(0),
    )
    .with_context(|| format!("count {}", kind.table()))
}

pub fn load_matches(conn: &Connection) -> Result<Vec<Match>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                id, season, city, date, team1, team2, toss_winner, toss_decision,
                result, dl_applied, winner, win_by_runs, win_by_wickets,
                player_of_match, venue, umpire1, umpire2, umpire3
            FROM matches
            ORDER BY date ASC, id ASC
            "#,
        )
        .context("prepare load matches query")?;
    let rows = stmt
        .query_map([], decode_match)
        .context("query load matches")?;
    collect_rows(rows, "match")
}

pub fn load_deliveries(conn: &Connection) -> Result<Vec<Delivery>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                id, match_id, inning, batting_team, bowling_team, over, ball,
                batsman, non_striker, bowler, is_super_over,
                wide_runs, bye_runs, legbye_runs, noball_runs, penalty_runs,
                batsman_runs, extra_runs, total_runs,
                player_dismissed, dismissal_kind, fielder
            FROM deliveries
            ORDER BY match_id ASC, inning ASC, over ASC, ball ASC
            "#,
        )
        .context("prepare load deliveries query")?;
    let rows = stmt
        .query_map([], decode_delivery)
        .context("query load deliveries")?;
    collect_rows(rows, "delivery")
}

pub fn load_players(conn: &Connection) -> Result<Vec<Player>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                id, player_name, team, role, batting_style, bowling_style,
                country, born_date, matches_played, runs_scored, wickets_taken,
                catches, stumpings
            FROM players
            ORDER BY id ASC
            "#,
        )
        .context("prepare load players query")?;
    let rows = stmt
        .query_map([], decode_player)
        .context("query load players")?;
    collect_rows(rows, "player")
}

pub fn load_standings(conn: &Connection) -> Result<Vec<Standing>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                id, season, team, matches_played, won, lost, tied, no_result,
                points, net_run_rate, for_overs, against_overs, position
            FROM points_table
            ORDER BY season ASC, position ASC
            "#,
        )
        .context("prepare load points_table query")?;
    let rows = stmt
        .query_map([], decode_standing)
        .context("query load points_table")?;
    collect_rows(rows, "standing")
}

pub fn load_venues(conn: &Connection) -> Result<Vec<Venue>> {
    let mut stmt = conn
        .prepare("SELECT id, name, city, capacity, timezone FROM venues ORDER BY id ASC")
        .context("prepare load venues query")?;
    let rows = stmt
        .query_map([], decode_venue)
        .context("query load venues")?;
    collect_rows(rows, "venue")
}

fn collect_rows<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
    what: &str,
) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row.with_context(|| format!("decode {what} row"))?);
    }
    Ok(out)
}

fn decode_match(row: &Row<'_>) -> rusqlite::Result<Match> {
    Ok(Match {
        id: row.get(0)?,
        season: row.get(1)?,
        city: row.get(2)?,
        date: row.get(3)?,
        team1: row.get(4)?,
        team2: row.get(5)?,
        toss_winner: row.get(6)?,
        toss_decision: row.get(7)?,
        result: row.get(8)?,
        dl_applied: row.get::<_, i64>(9)? != 0,
        winner: row.get(10)?,
        win_by_runs: row.get(11)?,
        win_by_wickets: row.get(12)?,
        player_of_match: row.get(13)?,
        venue: row.get(14)?,
        umpire1: row.get(15)?,
        umpire2: row.get(16)?,
        umpire3: row.get(17)?,
    })
}

fn decode_delivery(row: &Row<'_>) -> rusqlite::Result<Delivery> {
    Ok(Delivery {
        id: row.get(0)?,
        match_id: row.get(1)?,
        inning: row.get(2)?,
        batting_team: row.get(3)?,
        bowling_team: row.get(4)?,
        over: row.get(5)?,
        ball: row.get(6)?,
        batsman: row.get(7)?,
        non_striker: row.get(8)?,
        bowler: row.get(9)?,
        is_super_over: row.get::<_, i64>(10)? != 0,
        wide_runs: row.get(11)?,
        bye_runs: row.get(12)?,
        legbye_runs: row.get(13)?,
        noball_runs: row.get(14)?,
        penalty_runs: row.get(15)?,
        batsman_runs: row.get(16)?,
        extra_runs: row.get(17)?,
        total_runs: row.get(18)?,
        player_dismissed: row.get(19)?,
        dismissal_kind: row.get(20)?,
        fielder: row.get(21)?,
    })
}

fn decode_player(row: &Row<'_>) -> rusqlite::Result<Player> {
    Ok(Player {
        id: row.get(0)?,
        player_name: row.get(1)?,
        team: row.get(2)?,
        role: row.get(3)?,
        batting_style: row.get(4)?,
        bowling_style: row.get(5)?,
        country: row.get(6)?,
        born_date: row.get(7)?,
        matches_played: row.get(8)?,
        runs_scored: row.get(9)?,
        wickets_taken: row.get(10)?,
        catches: row.get(11)?,
        stumpings: row.get(12)?,
    })
}

fn decode_standing(row: &Row<'_>) -> rusqlite::Result<Standing> {
    Ok(Standing {
        id: row.get(0)?,
        season: row.get(1)?,
        team: row.get(2)?,
        matches_played: row.get(3)?,
        won: row.get(4)?,
        lost: row.get(5)?,
        tied: row.get(6)?,
        no_result: row.get(7)?,
        points: row.get(8)?,
        net_run_rate: row.get(9)?,
        for_overs: row.get(10)?,
        against_overs: row.get(11)?,
        position: row.get(12)?,
    })
}

fn decode_venue(row: &Row<'_>) -> rusqlite::Result<Venue> {
    Ok(Venue {
        id: row.get(0)?,
        name: row.get(1)?,
        city: row.get(2)?,
        capacity: row.get(3)?,
        timezone: row.get(4)?,
    })
}

/// Replaces the whole table contents inside one transaction. Season
/// archives are reloaded wholesale, never patched.
pub fn replace_matches(conn: &mut Connection, rows: &[Match]) -> Result<usize> {
    let tx = conn.transaction().context("begin matches transaction")?;
    tx.execute("DELETE FROM matches", [])
        .context("clear matches")?;
    {
        let mut stmt = tx
            .prepare(
                r#"
                INSERT INTO matches (
                    id, season, city, date, team1, team2, toss_winner, toss_decision,
                    result, dl_applied, winner, win_by_runs, win_by_wickets,
                    player_of_match, venue, umpire1, umpire2, umpire3
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
                "#,
            )
            .context("prepare insert match")?;
        for m in rows {
            stmt.execute(params![
                m.id,
                m.season,
                m.city,
                m.date,
                m.team1,
                m.team2,
                m.toss_winner,
                m.toss_decision,
                m.result,
                bool_to_i64(m.dl_applied),
                m.winner,
                m.win_by_runs,
                m.win_by_wickets,
                m.player_of_match,
                m.venue,
                m.umpire1,
                m.umpire2,
                m.umpire3,
            ])
            .context("insert match")?;
        }
    }
    tx.commit().context("commit matches transaction")?;
    Ok(rows.len())
}

pub fn replace_deliveries(conn: &mut Connection, rows: &[Delivery]) -> Result<usize> {
    let tx = conn.transaction().context("begin deliveries transaction")?;
    tx.execute("DELETE FROM deliveries", [])
        .context("clear deliveries")?;
    {
        let mut stmt = tx
            .prepare(
                r#"
                INSERT INTO deliveries (
                    id, match_id, inning, batting_team, bowling_team, over, ball,
                    batsman, non_striker, bowler, is_super_over,
                    wide_runs, bye_runs, legbye_runs, noball_runs, penalty_runs,
                    batsman_runs, extra_runs, total_runs,
                    player_dismissed, dismissal_kind, fielder
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                          ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)
                "#,
            )
            .context("prepare insert delivery")?;
        for d in rows {
            stmt.execute(params![
                d.id,
                d.match_id,
                d.inning,
                d.batting_team,
                d.bowling_team,
                d.over,
                d.ball,
                d.batsman,
                d.non_striker,
                d.bowler,
                bool_to_i64(d.is_super_over),
                d.wide_runs,
                d.bye_runs,
                d.legbye_runs,
                d.noball_runs,
                d.penalty_runs,
                d.batsman_runs,
                d.extra_runs,
                d.total_runs,
                d.player_dismissed,
                d.dismissal_kind,
                d.fielder,
            ])
            .context("insert delivery")?;
        }
    }
    tx.commit().context("commit deliveries transaction")?;
    Ok(rows.len())
}

pub fn replace_players(conn: &mut Connection, rows: &[Player]) -> Result<usize> {
    let tx = conn.transaction().context("begin players transaction")?;
    tx.execute("DELETE FROM players", [])
        .context("clear players")?;
    {
        let mut stmt = tx
            .prepare(
                r#"
                INSERT INTO players (
                    id, player_name, team, role, batting_style, bowling_style,
                    country, born_date, matches_played, runs_scored, wickets_taken,
                    catches, stumpings
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
            )
            .context("prepare insert player")?;
        for p in rows {
            stmt.execute(params![
                p.id,
                p.player_name,
                p.team,
                p.role,
                p.batting_style,
                p.bowling_style,
                p.country,
                p.born_date,
                p.matches_played,
                p.runs_scored,
                p.wickets_taken,
                p.catches,
                p.stumpings,
            ])
            .context("insert player")?;
        }
    }
    tx.commit().context("commit players transaction")?;
    Ok(rows.len())
}

pub fn replace_standings(conn: &mut Connection, rows: &[Standing]) -> Result<usize> {
    let tx = conn
        .transaction()
        .context("begin points_table transaction")?;
    tx.execute("DELETE FROM points_table", [])
        .context("clear points_table")?;
    {
        let mut stmt = tx
            .prepare(
                r#"
                INSERT INTO points_table (
                    id, season, team, matches_played, won, lost, tied, no_result,
                    points, net_run_rate, for_overs, against_overs, position
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
            )
            .context("prepare insert standing")?;
        for s in rows {
            stmt.execute(params![
                s.id,
                s.season,
                s.team,
                s.matches_played,
                s.won,
                s.lost,
                s.tied,
                s.no_result,
                s.points,
                s.net_run_rate,
                s.for_overs,
                s.against_overs,
                s.position,
            ])
            .context("insert standing")?;
        }
    }
    tx.commit().context("commit points_table transaction")?;
    Ok(rows.len())
}

pub fn replace_venues(conn: &mut Connection, rows: &[Venue]) -> Result<usize> {
    let tx = conn.transaction().context("begin venues transaction")?;
    tx.execute("DELETE FROM venues", []).context("clear venues")?;
    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO venues (id, name, city, capacity, timezone)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .context("prepare insert venue")?;
        for v in rows {
            stmt.execute(params![v.id, v.name, v.city, v.capacity, v.timezone])
                .context("insert venue")?;
        }
    }
    tx.commit().context("commit venues transaction")?;
    Ok(rows.len())
}

fn bool_to_i64(v: bool) -> i64 {
    if v { 1 } else { 0 }
}
