use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn};

use crate::kpi::{self, PlayerSummary, TeamSummary};
use crate::match_dataset::build_training_set;
use crate::predictor::{self, MatchQuery, Prediction, TrainedPredictor};
use crate::records::{Delivery, Match, Player, RecordSets, Venue};
use crate::store;

pub const REPORT_VERSION: u32 = 1;

/// One consistent, versioned snapshot of the season: every figure in it was
/// computed from the same record-set read.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub version: u32,
    pub team_summaries: BTreeMap<String, TeamSummary>,
    pub player_summaries: BTreeMap<String, PlayerSummary>,
    pub venues: Vec<Venue>,
    pub model_trained: bool,
    pub total_matches: usize,
    pub total_deliveries: usize,
    pub total_players: usize,
}

/// Output of one report-generation cycle: the report itself plus the
/// predictor fitted from the same match history (kept separate so the
/// report stays a plain serializable value).
#[derive(Debug)]
pub struct ReportCycle {
    pub report: Report,
    pub predictor: Option<TrainedPredictor>,
}

/// Assembles the full report. Pure orchestration: sequencing and
/// missing-input propagation only, no aggregation logic of its own.
///
/// Returns `None` when matches, deliveries, or players are missing —
/// a partial report is never emitted. Venues are optional.
pub fn generate_report(
    matches: &[Match],
    deliveries: &[Delivery],
    players: &[Player],
    venues: Option<&[Venue]>,
) -> Option<ReportCycle> {
    if matches.is_empty() || deliveries.is_empty() || players.is_empty() {
        warn!(
            matches = matches.len(),
            deliveries = deliveries.len(),
            players = players.len(),
            "missing required record sets, no report generated"
        );
        return None;
    }

    let team_summaries = kpi::calculate_team_summaries(matches, deliveries);
    let player_summaries = kpi::calculate_player_summaries(deliveries, players);

    let dataset = build_training_set(matches);
    let predictor = predictor::train(&dataset);

    let report = Report {
        version: REPORT_VERSION,
        team_summaries,
        player_summaries,
        venues: venues.map(<[Venue]>::to_vec).unwrap_or_default(),
        model_trained: predictor.is_some(),
        total_matches: matches.len(),
        total_deliveries: deliveries.len(),
        total_players: players.len(),
    };
    info!(
        teams = report.team_summaries.len(),
        players = report.player_summaries.len(),
        model_trained = report.model_trained,
        "report assembled"
    );

    Some(ReportCycle { report, predictor })
}

/// Facade consumed by the presentation layer: one `load`, one
/// `generate_report`, one `predict`. The predictor fitted by the latest
/// report cycle is retained here and replaced wholesale on the next cycle.
pub struct Analyzer {
    conn: Connection,
    predictor: Option<TrainedPredictor>,
}

impl Analyzer {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_connection(store::open_db(path)?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            predictor: None,
        }
    }

    /// Reads all five record sets. A storage failure here aborts the whole
    /// report cycle; callers must not render partial figures.
    pub fn load(&self) -> Result<RecordSets> {
        store::load(&self.conn)
    }

    pub fn generate_report(&mut self, sets: &RecordSets) -> Option<Report> {
        let cycle = generate_report(
            &sets.matches,
            &sets.deliveries,
            &sets.players,
            Some(&sets.venues),
        )?;
        self.predictor = cycle.predictor;
        Some(cycle.report)
    }

    /// `None` while the model is not ready; the presentation layer shows a
    /// warning state instead of a stale or partial figure.
    pub fn predict(&mut self, query: &MatchQuery) -> Option<Prediction> {
        match self.predictor.as_mut() {
            Some(model) => Some(model.predict(query)),
            None => {
                warn!("prediction requested before a trained model was available");
                None
            }
        }
    }
}
