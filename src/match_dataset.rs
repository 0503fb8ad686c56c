use crate::records::Match;

/// Innings-score aggregates need a per-venue join against the delivery log,
/// which this builder does not perform. The columns are reserved as
/// explicit zero placeholders so the feature layout stays fixed.
pub const RESERVED_INNINGS_SCORE: f64 = 0.0;

/// Neutral prior for a venue with no toss history.
pub const NEUTRAL_TOSS_BATTING_WIN_RATE: f64 = 0.5;

/// One raw (pre-encoding) training example.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchFeatures {
    pub team1: String,
    pub team2: String,
    pub toss_winner: String,
    pub toss_decision: String,
    pub venue: String,
    pub season: i64,
    pub venue_total_matches: f64,
    pub venue_avg_first_innings_score: f64,
    pub venue_avg_second_innings_score: f64,
    pub venue_toss_batting_win_rate: f64,
}

/// Feature rows paired with winner labels, one per decided match.
#[derive(Debug, Clone, Default)]
pub struct MatchDataset {
    pub features: Vec<MatchFeatures>,
    pub labels: Vec<String>,
}

impl MatchDataset {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Most recent season observed; used as the season value for
    /// single-match inference rows.
    pub fn latest_season(&self) -> Option<i64> {
        self.features.iter().map(|f| f.season).max()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VenueStats {
    pub total_matches: f64,
    pub avg_first_innings_score: f64,
    pub avg_second_innings_score: f64,
    pub toss_batting_win_rate: f64,
}

impl VenueStats {
    /// Defaults for single-match inference, where aggregate venue history
    /// cannot be recomputed inline.
    pub fn neutral() -> Self {
        Self {
            total_matches: 0.0,
            avg_first_innings_score: RESERVED_INNINGS_SCORE,
            avg_second_innings_score: RESERVED_INNINGS_SCORE,
            toss_batting_win_rate: NEUTRAL_TOSS_BATTING_WIN_RATE,
        }
    }
}

/// Builds the supervised training set from match history. Only matches
/// with a resolved winner contribute examples; venue aggregates are
/// computed over the full match set, decided or not.
pub fn build_training_set(matches: &[Match]) -> MatchDataset {
    let mut dataset = MatchDataset::default();
    for m in matches {
        let Some(winner) = m.winner.as_deref() else {
            continue;
        };
        let venue = venue_stats(matches, &m.venue);
        dataset.features.push(MatchFeatures {
            team1: m.team1.clone(),
            team2: m.team2.clone(),
            toss_winner: m.toss_winner.clone(),
            toss_decision: m.toss_decision.clone(),
            venue: m.venue.clone(),
            season: m.season,
            venue_total_matches: venue.total_matches,
            venue_avg_first_innings_score: venue.avg_first_innings_score,
            venue_avg_second_innings_score: venue.avg_second_innings_score,
            venue_toss_batting_win_rate: venue.toss_batting_win_rate,
        });
        dataset.labels.push(winner.to_string());
    }
    dataset
}

/// Venue history across the whole match set: how often the ground has been
/// played, and how often winning the toss and batting first converted into
/// a win there.
pub fn venue_stats(matches: &[Match], venue: &str) -> VenueStats {
    let at_venue: Vec<&Match> = matches.iter().filter(|m| m.venue == venue).collect();
    if at_venue.is_empty() {
        return VenueStats {
            total_matches: 0.0,
            avg_first_innings_score: RESERVED_INNINGS_SCORE,
            avg_second_innings_score: RESERVED_INNINGS_SCORE,
            toss_batting_win_rate: 0.0,
        };
    }

    let toss_batting: Vec<&&Match> = at_venue
        .iter()
        .filter(|m| m.toss_decision == "bat")
        .collect();
    let toss_batting_wins = toss_batting
        .iter()
        .filter(|m| m.winner.as_deref() == Some(m.toss_winner.as_str()))
        .count();
    let toss_batting_win_rate = if toss_batting.is_empty() {
        0.0
    } else {
        toss_batting_wins as f64 / toss_batting.len() as f64
    };

    VenueStats {
        total_matches: at_venue.len() as f64,
        avg_first_innings_score: RESERVED_INNINGS_SCORE,
        avg_second_innings_score: RESERVED_INNINGS_SCORE,
        toss_batting_win_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Match;

    fn match_row(
        id: i64,
        venue: &str,
        toss_winner: &str,
        toss_decision: &str,
        winner: Option<&str>,
    ) -> Match {
        Match {
            id,
            season: 2025,
            date: format!("2025-04-{:02}", id),
            team1: "MI".to_string(),
            team2: "CSK".to_string(),
            toss_winner: toss_winner.to_string(),
            toss_decision: toss_decision.to_string(),
            winner: winner.map(|w| w.to_string()),
            venue: venue.to_string(),
            ..Match::default()
        }
    }

    #[test]
    fn undecided_matches_are_excluded_from_examples() {
        let matches = vec![
            match_row(1, "Wankhede Stadium", "MI", "bat", Some("MI")),
            match_row(2, "Wankhede Stadium", "CSK", "field", None),
        ];
        let dataset = build_training_set(&matches);
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.labels, ["MI"]);
        // Venue history still counts the abandoned fixture.
        assert!((dataset.features[0].venue_total_matches - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn toss_batting_win_rate_counts_only_bat_decisions() {
        let matches = vec![
            match_row(1, "Eden Gardens", "MI", "bat", Some("MI")),
            match_row(2, "Eden Gardens", "CSK", "bat", Some("MI")),
            match_row(3, "Eden Gardens", "MI", "field", Some("MI")),
        ];
        let stats = venue_stats(&matches, "Eden Gardens");
        assert!((stats.total_matches - 3.0).abs() < f64::EPSILON);
        // One of the two bat-first toss winners went on to win.
        assert!((stats.toss_batting_win_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_venue_yields_zeroes() {
        let stats = venue_stats(&[], "Nowhere");
        assert!((stats.total_matches).abs() < f64::EPSILON);
        assert!((stats.toss_batting_win_rate).abs() < f64::EPSILON);
    }

    #[test]
    fn reserved_innings_scores_stay_zero() {
        let matches = vec![match_row(1, "Wankhede Stadium", "MI", "bat", Some("MI"))];
        let dataset = build_training_set(&matches);
        assert_eq!(
            dataset.features[0].venue_avg_first_innings_score,
            RESERVED_INNINGS_SCORE
        );
        assert_eq!(
            dataset.features[0].venue_avg_second_innings_score,
            RESERVED_INNINGS_SCORE
        );
    }

    #[test]
    fn latest_season_tracks_maximum() {
        let mut matches = vec![match_row(1, "V", "MI", "bat", Some("MI"))];
        matches.push(Match {
            season: 2024,
            ..match_row(2, "V", "MI", "bat", Some("CSK"))
        });
        let dataset = build_training_set(&matches);
        assert_eq!(dataset.latest_season(), Some(2025));
        assert_eq!(MatchDataset::default().latest_season(), None);
    }
}
