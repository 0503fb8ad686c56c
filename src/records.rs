use serde::{Deserialize, Serialize};

/// One completed fixture. Immutable once ingested.
///
/// `winner` is empty for unresolved or abandoned matches. When set it is
/// always one of `team1`/`team2`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: i64,
    pub season: i64,
    pub city: Option<String>,
    pub date: String,
    pub team1: String,
    pub team2: String,
    pub toss_winner: String,
    pub toss_decision: String,
    pub result: Option<String>,
    pub dl_applied: bool,
    pub winner: Option<String>,
    pub win_by_runs: i64,
    pub win_by_wickets: i64,
    pub player_of_match: Option<String>,
    pub venue: String,
    pub umpire1: Option<String>,
    pub umpire2: Option<String>,
    pub umpire3: Option<String>,
}

impl Match {
    pub fn involves(&self, team: &str) -> bool {
        self.team1 == team || self.team2 == team
    }

    pub fn won_by(&self, team: &str) -> bool {
        self.winner.as_deref() == Some(team)
    }
}

/// One bowled ball, the atomic unit of match data. Many per match,
/// ordered by (inning, over, ball).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: i64,
    pub match_id: i64,
    pub inning: i64,
    pub batting_team: String,
    pub bowling_team: String,
    pub over: i64,
    pub ball: i64,
    pub batsman: String,
    pub non_striker: String,
    pub bowler: String,
    pub is_super_over: bool,
    pub wide_runs: i64,
    pub bye_runs: i64,
    pub legbye_runs: i64,
    pub noball_runs: i64,
    pub penalty_runs: i64,
    pub batsman_runs: i64,
    pub extra_runs: i64,
    pub total_runs: i64,
    pub player_dismissed: Option<String>,
    pub dismissal_kind: Option<String>,
    pub fielder: Option<String>,
}

impl Delivery {
    /// A wide never counts as a ball faced by the striker.
    pub fn is_wide(&self) -> bool {
        self.wide_runs > 0
    }

    pub fn is_wicket(&self) -> bool {
        self.player_dismissed.is_some()
    }
}

/// Season-level roster entry. Only the team affiliation is consumed by the
/// aggregation side; the playing statistics carried here are recomputed
/// from deliveries, never trusted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub player_name: String,
    pub team: Option<String>,
    pub role: Option<String>,
    pub batting_style: Option<String>,
    pub bowling_style: Option<String>,
    pub country: Option<String>,
    pub born_date: Option<String>,
    pub matches_played: i64,
    pub runs_scored: i64,
    pub wickets_taken: i64,
    pub catches: i64,
    pub stumpings: i64,
}

/// Points-table row, passed through to reports unrecomputed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub id: i64,
    pub season: i64,
    pub team: String,
    pub matches_played: i64,
    pub won: i64,
    pub lost: i64,
    pub tied: i64,
    pub no_result: i64,
    pub points: i64,
    pub net_run_rate: f64,
    pub for_overs: f64,
    pub against_overs: f64,
    pub position: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub city: Option<String>,
    pub capacity: Option<i64>,
    pub timezone: Option<String>,
}

/// The five record sets read in full at the start of each report cycle.
#[derive(Debug, Clone, Default)]
pub struct RecordSets {
    pub matches: Vec<Match>,
    pub deliveries: Vec<Delivery>,
    pub players: Vec<Player>,
    pub standings: Vec<Standing>,
    pub venues: Vec<Venue>,
}

/// Closed set of record-set kinds. Ingestion and loading dispatch over
/// this enum with one handler per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Matches,
    Deliveries,
    Players,
    PointsTable,
    Venues,
}

impl RecordKind {
    pub const ALL: [RecordKind; 5] = [
        RecordKind::Matches,
        RecordKind::Deliveries,
        RecordKind::Players,
        RecordKind::PointsTable,
        RecordKind::Venues,
    ];

    pub fn table(self) -> &'static str {
        match self {
            RecordKind::Matches => "matches",
            RecordKind::Deliveries => "deliveries",
            RecordKind::Players => "players",
            RecordKind::PointsTable => "points_table",
            RecordKind::Venues => "venues",
        }
    }

    pub fn csv_file(self) -> &'static str {
        match self {
            RecordKind::Matches => "matches.csv",
            RecordKind::Deliveries => "deliveries.csv",
            RecordKind::Players => "players.csv",
            RecordKind::PointsTable => "points_table.csv",
            RecordKind::Venues => "venues.csv",
        }
    }

    /// Venues may be absent from a season archive; everything else is
    /// required for a report cycle.
    pub fn required(self) -> bool {
        !matches!(self, RecordKind::Venues)
    }
}
