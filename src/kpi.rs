use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::records::{Delivery, Match, Player};

const BALLS_PER_OVER: f64 = 6.0;

/// Team-level indicators, recomputed from scratch each report cycle.
///
/// `bowling_average` is `None` when the side took no wickets; the ratio is
/// undefined there, not infinite, and formatting must keep it non-numeric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSummary {
    pub total_matches: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub toss_wins: usize,
    pub toss_win_rate: f64,
    pub total_runs_scored: i64,
    pub avg_run_rate: f64,
    pub wickets_taken: usize,
    pub bowling_average: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub team: Option<String>,
    pub runs_scored: i64,
    pub balls_faced: usize,
    pub batting_average: f64,
    pub strike_rate: f64,
    pub dismissals: usize,
    pub runs_conceded: i64,
    pub balls_bowled: usize,
    pub wickets_taken: usize,
    pub bowling_average: Option<f64>,
    pub economy_rate: f64,
}

/// Computes one `TeamSummary` per team appearing in the match list.
///
/// Every ratio is zero-guarded: empty inputs produce zero-valued summaries,
/// never an error. Output ordering is deterministic, so two calls on the
/// same inputs are byte-identical.
pub fn calculate_team_summaries(
    matches: &[Match],
    deliveries: &[Delivery],
) -> BTreeMap<String, TeamSummary> {
    let mut teams = BTreeSet::new();
    for m in matches {
        if !m.team1.is_empty() {
            teams.insert(m.team1.as_str());
        }
        if !m.team2.is_empty() {
            teams.insert(m.team2.as_str());
        }
    }

    let mut out = BTreeMap::new();
    for team in teams {
        let total_matches = matches.iter().filter(|m| m.involves(team)).count();
        let wins = matches.iter().filter(|m| m.won_by(team)).count();
        let toss_wins = matches.iter().filter(|m| m.toss_winner == team).count();

        let mut total_runs_scored = 0i64;
        let mut balls_batted = 0usize;
        let mut wickets_taken = 0usize;
        for d in deliveries {
            if d.batting_team == team {
                total_runs_scored += d.total_runs;
                balls_batted += 1;
            }
            if d.bowling_team == team && d.is_wicket() {
                wickets_taken += 1;
            }
        }

        out.insert(
            team.to_string(),
            TeamSummary {
                total_matches,
                wins,
                win_rate: ratio(wins as f64, total_matches as f64),
                toss_wins,
                toss_win_rate: ratio(toss_wins as f64, total_matches as f64),
                total_runs_scored,
                avg_run_rate: ratio(total_runs_scored as f64, balls_batted as f64)
                    * BALLS_PER_OVER,
                wickets_taken,
                bowling_average: guarded_average(total_runs_scored as f64, wickets_taken),
            },
        );
    }
    out
}

/// Computes one `PlayerSummary` per striker or bowler appearing in the
/// delivery log. The roster is consulted only for team affiliation; every
/// playing figure is recomputed from deliveries.
pub fn calculate_player_summaries(
    deliveries: &[Delivery],
    players: &[Player],
) -> BTreeMap<String, PlayerSummary> {
    let mut names = BTreeSet::new();
    for d in deliveries {
        if !d.batsman.is_empty() {
            names.insert(d.batsman.as_str());
        }
        if !d.bowler.is_empty() {
            names.insert(d.bowler.as_str());
        }
    }

    let mut affiliation = BTreeMap::new();
    for p in players {
        if let Some(team) = &p.team {
            affiliation.insert(p.player_name.as_str(), team.clone());
        }
    }

    let mut out = BTreeMap::new();
    for name in names {
        let mut runs_scored = 0i64;
        let mut balls_faced = 0usize;
        let mut dismissals = 0usize;
        let mut runs_conceded = 0i64;
        let mut balls_bowled = 0usize;
        let mut wickets_taken = 0usize;

        for d in deliveries {
            if d.batsman == name {
                runs_scored += d.batsman_runs;
                // A wide is not a legal ball to the striker.
                if !d.is_wide() {
                    balls_faced += 1;
                }
                if d.player_dismissed.as_deref() == Some(name) {
                    dismissals += 1;
                }
            }
            if d.bowler == name {
                runs_conceded += d.total_runs;
                balls_bowled += 1;
                if d.is_wicket() {
                    wickets_taken += 1;
                }
            }
        }

        // Never-out convention: an undismissed batsman's average is their
        // total, not infinity.
        let batting_average = if dismissals > 0 {
            runs_scored as f64 / dismissals as f64
        } else {
            runs_scored as f64
        };

        out.insert(
            name.to_string(),
            PlayerSummary {
                team: affiliation.get(name).cloned(),
                runs_scored,
                balls_faced,
                batting_average,
                strike_rate: ratio(runs_scored as f64, balls_faced as f64) * 100.0,
                dismissals,
                runs_conceded,
                balls_bowled,
                wickets_taken,
                bowling_average: guarded_average(runs_conceded as f64, wickets_taken),
                economy_rate: ratio(runs_conceded as f64, balls_bowled as f64) * BALLS_PER_OVER,
            },
        );
    }
    out
}

/// Renders an average whose denominator may have been zero. The undefined
/// case is a placeholder, never `inf`.
pub fn fmt_average(avg: Option<f64>) -> String {
    match avg {
        Some(v) => format!("{v:.2}"),
        None => "N/A".to_string(),
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}

fn guarded_average(runs: f64, wickets: usize) -> Option<f64> {
    if wickets > 0 {
        Some(runs / wickets as f64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn match_row(id: i64, team1: &str, team2: &str, toss: &str, winner: Option<&str>) -> Match {
        Match {
            id,
            season: 2025,
            date: format!("2025-04-{:02}", id),
            team1: team1.to_string(),
            team2: team2.to_string(),
            toss_winner: toss.to_string(),
            toss_decision: "bat".to_string(),
            winner: winner.map(|w| w.to_string()),
            venue: "Wankhede Stadium".to_string(),
            ..Match::default()
        }
    }

    fn ball(batting: &str, bowling: &str, batsman: &str, bowler: &str, runs: i64) -> Delivery {
        Delivery {
            batting_team: batting.to_string(),
            bowling_team: bowling.to_string(),
            batsman: batsman.to_string(),
            non_striker: "NS".to_string(),
            bowler: bowler.to_string(),
            batsman_runs: runs,
            total_runs: runs,
            ..Delivery::default()
        }
    }

    #[test]
    fn win_rates_are_bounded_and_exact() {
        let matches = vec![
            match_row(1, "MI", "CSK", "MI", Some("MI")),
            match_row(2, "CSK", "KKR", "CSK", Some("CSK")),
            match_row(3, "KKR", "MI", "KKR", Some("KKR")),
        ];
        let summaries = calculate_team_summaries(&matches, &[]);
        for (team, s) in &summaries {
            assert!(s.win_rate >= 0.0 && s.win_rate <= 1.0, "win_rate for {team}");
            assert_eq!(s.total_matches, 2);
            assert_eq!(s.wins, 1);
            assert!((s.win_rate - 0.5).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn unresolved_match_counts_no_winner() {
        let matches = vec![match_row(1, "MI", "CSK", "MI", None)];
        let summaries = calculate_team_summaries(&matches, &[]);
        assert_eq!(summaries["MI"].wins, 0);
        assert_eq!(summaries["MI"].toss_wins, 1);
        assert_eq!(summaries["CSK"].total_matches, 1);
    }

    #[test]
    fn team_that_never_batted_has_zero_run_rate() {
        let matches = vec![match_row(1, "MI", "CSK", "MI", Some("MI"))];
        let deliveries = vec![ball("MI", "CSK", "RG Sharma", "DL Chahar", 4)];
        let summaries = calculate_team_summaries(&matches, &deliveries);
        assert_eq!(summaries["CSK"].total_runs_scored, 0);
        assert!(summaries["CSK"].avg_run_rate.abs() < f64::EPSILON);
        assert!(summaries["CSK"].avg_run_rate >= 0.0);
        assert!(summaries["MI"].avg_run_rate > 0.0);
    }

    #[test]
    fn zero_wickets_yields_undefined_bowling_average() {
        let matches = vec![match_row(1, "MI", "CSK", "MI", Some("MI"))];
        let deliveries = vec![ball("MI", "CSK", "RG Sharma", "DL Chahar", 4)];
        let summaries = calculate_team_summaries(&matches, &deliveries);
        assert_eq!(summaries["MI"].bowling_average, None);
        assert_eq!(fmt_average(summaries["MI"].bowling_average), "N/A");
    }

    #[test]
    fn empty_inputs_never_panic() {
        assert!(calculate_team_summaries(&[], &[]).is_empty());
        assert!(calculate_player_summaries(&[], &[]).is_empty());
    }

    #[test]
    fn team_summaries_are_idempotent() {
        let matches = vec![
            match_row(1, "MI", "CSK", "MI", Some("MI")),
            match_row(2, "CSK", "KKR", "KKR", None),
        ];
        let deliveries = vec![
            ball("MI", "CSK", "RG Sharma", "DL Chahar", 4),
            ball("CSK", "MI", "RD Gaikwad", "JJ Bumrah", 1),
        ];
        let first = calculate_team_summaries(&matches, &deliveries);
        let second = calculate_team_summaries(&matches, &deliveries);
        let a = serde_json::to_vec(&first).expect("serialize first");
        let b = serde_json::to_vec(&second).expect("serialize second");
        assert_eq!(a, b);
    }

    #[test]
    fn never_out_batting_average_equals_total() {
        let deliveries = vec![
            ball("MI", "CSK", "SA Yadav", "DL Chahar", 30),
            ball("MI", "CSK", "SA Yadav", "DL Chahar", 20),
        ];
        let summaries = calculate_player_summaries(&deliveries, &[]);
        let s = &summaries["SA Yadav"];
        assert_eq!(s.runs_scored, 50);
        assert_eq!(s.dismissals, 0);
        assert!((s.batting_average - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn wides_are_excluded_from_balls_faced() {
        let mut wide = ball("MI", "CSK", "SA Yadav", "DL Chahar", 0);
        wide.wide_runs = 1;
        wide.extra_runs = 1;
        wide.total_runs = 1;
        let deliveries = vec![wide, ball("MI", "CSK", "SA Yadav", "DL Chahar", 2)];
        let summaries = calculate_player_summaries(&deliveries, &[]);
        let s = &summaries["SA Yadav"];
        assert_eq!(s.balls_faced, 1);
        // Bowler still pays for the wide.
        assert_eq!(s.runs_conceded, 0);
        assert_eq!(summaries["DL Chahar"].runs_conceded, 3);
        assert_eq!(summaries["DL Chahar"].balls_bowled, 2);
    }

    #[test]
    fn dismissal_of_non_striker_does_not_count_against_striker() {
        let mut run_out = ball("MI", "CSK", "SA Yadav", "DL Chahar", 1);
        run_out.player_dismissed = Some("NS".to_string());
        run_out.dismissal_kind = Some("run out".to_string());
        let summaries = calculate_player_summaries(&[run_out], &[]);
        assert_eq!(summaries["SA Yadav"].dismissals, 0);
        assert_eq!(summaries["DL Chahar"].wickets_taken, 1);
    }

    #[test]
    fn bowler_economy_and_average_guards() {
        let mut wicket = ball("MI", "CSK", "SA Yadav", "DL Chahar", 0);
        wicket.player_dismissed = Some("SA Yadav".to_string());
        wicket.dismissal_kind = Some("bowled".to_string());
        let summaries = calculate_player_summaries(&[wicket], &[]);
        let bowler = &summaries["DL Chahar"];
        assert_eq!(bowler.wickets_taken, 1);
        assert_eq!(bowler.bowling_average, Some(0.0));
        assert!(bowler.economy_rate.abs() < f64::EPSILON);

        let batsman = &summaries["SA Yadav"];
        assert_eq!(batsman.dismissals, 1);
        assert!(batsman.strike_rate.abs() < f64::EPSILON);
        assert_eq!(batsman.bowling_average, None);
    }

    #[test]
    fn affiliation_joined_from_roster() {
        let deliveries = vec![ball("MI", "CSK", "SA Yadav", "DL Chahar", 1)];
        let players = vec![Player {
            id: 1,
            player_name: "SA Yadav".to_string(),
            team: Some("Mumbai Indians".to_string()),
            ..Player::default()
        }];
        let summaries = calculate_player_summaries(&deliveries, &players);
        assert_eq!(
            summaries["SA Yadav"].team.as_deref(),
            Some("Mumbai Indians")
        );
        assert_eq!(summaries["DL Chahar"].team, None);
    }
}
