use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::records::{Delivery, Match, Player, RecordSets, Standing, Venue};

/// Team name, short code, home ground, city.
const TEAMS: [(&str, &str, &str, &str); 8] = [
    ("Mumbai Indians", "MI", "Wankhede Stadium", "Mumbai"),
    ("Chennai Super Kings", "CSK", "MA Chidambaram Stadium", "Chennai"),
    ("Kolkata Knight Riders", "KKR", "Eden Gardens", "Kolkata"),
    ("Royal Challengers Bengaluru", "RCB", "M Chinnaswamy Stadium", "Bengaluru"),
    ("Delhi Capitals", "DC", "Arun Jaitley Stadium", "Delhi"),
    ("Rajasthan Royals", "RR", "Sawai Mansingh Stadium", "Jaipur"),
    ("Punjab Kings", "PBKS", "Maharaja Yadavindra Singh Stadium", "Mullanpur"),
    ("Sunrisers Hyderabad", "SRH", "Rajiv Gandhi Stadium", "Hyderabad"),
];

const BATTERS_PER_TEAM: usize = 6;
const BOWLERS_PER_TEAM: usize = 5;
const WICKETS_PER_INNINGS: i64 = 10;

#[derive(Debug, Clone, Copy)]
pub struct SyntheticConfig {
    pub season: i64,
    pub overs_per_innings: i64,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            season: 2025,
            overs_per_innings: 20,
            seed: 42,
        }
    }
}

/// Generates a full synthetic season: a single round-robin of fixtures with
/// ball-by-ball logs, squads, standings, and venues. Deterministic for a
/// fixed config, so demos and tests see identical data on every run.
pub fn generate(cfg: &SyntheticConfig) -> RecordSets {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut sets = RecordSets::default();

    for (id, (_, _, ground, city)) in TEAMS.iter().enumerate() {
        sets.venues.push(Venue {
            id: id as i64 + 1,
            name: ground.to_string(),
            city: Some(city.to_string()),
            capacity: Some(rng.gen_range(25_000..70_000)),
            timezone: Some("Asia/Kolkata".to_string()),
        });
    }

    let mut player_id = 1i64;
    for (name, code, _, _) in TEAMS {
        for i in 1..=BATTERS_PER_TEAM {
            sets.players.push(Player {
                id: player_id,
                player_name: format!("{code} Batter {i}"),
                team: Some(name.to_string()),
                role: Some("Batter".to_string()),
                batting_style: Some(if i % 2 == 0 { "Right-hand bat" } else { "Left-hand bat" }.to_string()),
                country: Some("India".to_string()),
                ..Player::default()
            });
            player_id += 1;
        }
        for i in 1..=BOWLERS_PER_TEAM {
            sets.players.push(Player {
                id: player_id,
                player_name: format!("{code} Bowler {i}"),
                team: Some(name.to_string()),
                role: Some("Bowler".to_string()),
                bowling_style: Some(if i % 2 == 0 { "Right-arm fast" } else { "Left-arm orthodox" }.to_string()),
                country: Some("India".to_string()),
                ..Player::default()
            });
            player_id += 1;
        }
    }

    let mut match_id = 1i64;
    let mut delivery_id = 1i64;
    let mut table: Vec<TableEntry> = (0..TEAMS.len()).map(TableEntry::new).collect();

    for home in 0..TEAMS.len() {
        for away in (home + 1)..TEAMS.len() {
            let sim = simulate_match(cfg, match_id, home, away, &mut rng, &mut delivery_id);
            let day = (match_id - 1) % 28 + 1;
            let month = 4 + (match_id - 1) / 28;

            let (winner, result, win_by_runs, win_by_wickets) = match sim.winner {
                Some(w) => (
                    Some(TEAMS[w].0.to_string()),
                    Some("normal".to_string()),
                    sim.win_by_runs,
                    sim.win_by_wickets,
                ),
                None => (None, Some("tie".to_string()), 0, 0),
            };

            sets.matches.push(Match {
                id: match_id,
                season: cfg.season,
                city: Some(TEAMS[home].3.to_string()),
                date: format!("{}-{:02}-{:02}", cfg.season, month, day),
                team1: TEAMS[home].0.to_string(),
                team2: TEAMS[away].0.to_string(),
                toss_winner: TEAMS[sim.toss_winner].0.to_string(),
                toss_decision: sim.toss_decision.to_string(),
                result,
                dl_applied: false,
                winner,
                win_by_runs,
                win_by_wickets,
                player_of_match: Some(sim.player_of_match.clone()),
                venue: TEAMS[home].2.to_string(),
                umpire1: Some("S Ravi".to_string()),
                umpire2: Some("C Shamshuddin".to_string()),
                umpire3: None,
            });
            table[home].record(sim.winner, home, sim.runs[0], sim.overs[0], sim.runs[1], sim.overs[1]);
            table[away].record(sim.winner, away, sim.runs[1], sim.overs[1], sim.runs[0], sim.overs[0]);
            sets.deliveries.extend(sim.deliveries);

            match_id += 1;
        }
    }

    table.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(b.net_run_rate().partial_cmp(&a.net_run_rate()).unwrap_or(std::cmp::Ordering::Equal))
    });
    for (pos, entry) in table.iter().enumerate() {
        sets.standings.push(Standing {
            id: pos as i64 + 1,
            season: cfg.season,
            team: TEAMS[entry.team].0.to_string(),
            matches_played: entry.played,
            won: entry.won,
            lost: entry.lost,
            tied: entry.tied,
            no_result: 0,
            points: entry.points,
            net_run_rate: entry.net_run_rate(),
            for_overs: entry.overs_for,
            against_overs: entry.overs_against,
            position: pos as i64 + 1,
        });
    }

    sets
}

struct TableEntry {
    team: usize,
    played: i64,
    won: i64,
    lost: i64,
    tied: i64,
    points: i64,
    runs_for: i64,
    overs_for: f64,
    runs_against: i64,
    overs_against: f64,
}

impl TableEntry {
    fn new(team: usize) -> Self {
        Self {
            team,
            played: 0,
            won: 0,
            lost: 0,
            tied: 0,
            points: 0,
            runs_for: 0,
            overs_for: 0.0,
            runs_against: 0,
            overs_against: 0.0,
        }
    }

    fn record(
        &mut self,
        winner: Option<usize>,
        team: usize,
        runs_for: i64,
        overs_for: f64,
        runs_against: i64,
        overs_against: f64,
    ) {
        self.played += 1;
        match winner {
            Some(w) if w == team => {
                self.won += 1;
                self.points += 2;
            }
            Some(_) => self.lost += 1,
            None => {
                self.tied += 1;
                self.points += 1;
            }
        }
        self.runs_for += runs_for;
        self.overs_for += overs_for;
        self.runs_against += runs_against;
        self.overs_against += overs_against;
    }

    fn net_run_rate(&self) -> f64 {
        let scored = self.runs_for as f64 / self.overs_for.max(0.1);
        let conceded = self.runs_against as f64 / self.overs_against.max(0.1);
        scored - conceded
    }
}

struct SimulatedMatch {
    toss_winner: usize,
    toss_decision: &'static str,
    winner: Option<usize>,
    win_by_runs: i64,
    win_by_wickets: i64,
    player_of_match: String,
    deliveries: Vec<Delivery>,
    runs: [i64; 2],
    overs: [f64; 2],
}

fn simulate_match(
    cfg: &SyntheticConfig,
    match_id: i64,
    home: usize,
    away: usize,
    rng: &mut StdRng,
    delivery_id: &mut i64,
) -> SimulatedMatch {
    let toss_winner = if rng.gen_bool(0.5) { home } else { away };
    let toss_decision = if rng.gen_bool(0.5) { "bat" } else { "field" };
    let first_batting = if toss_decision == "bat" {
        toss_winner
    } else if toss_winner == home {
        away
    } else {
        home
    };
    let second_batting = if first_batting == home { away } else { home };

    let mut deliveries = Vec::new();
    let first = simulate_innings(cfg, match_id, 1, first_batting, second_batting, None, rng, delivery_id, &mut deliveries);
    let second = simulate_innings(
        cfg,
        match_id,
        2,
        second_batting,
        first_batting,
        Some(first.runs),
        rng,
        delivery_id,
        &mut deliveries,
    );

    let (winner, win_by_runs, win_by_wickets) = if first.runs > second.runs {
        (Some(first_batting), first.runs - second.runs, 0)
    } else if second.runs > first.runs {
        (Some(second_batting), 0, WICKETS_PER_INNINGS - second.wickets)
    } else {
        (None, 0, 0)
    };

    let top_scorer = if first.top_runs >= second.top_runs {
        first.top_scorer.clone()
    } else {
        second.top_scorer.clone()
    };

    SimulatedMatch {
        toss_winner,
        toss_decision,
        winner,
        win_by_runs,
        win_by_wickets,
        player_of_match: top_scorer,
        deliveries,
        runs: if first_batting == home {
            [first.runs, second.runs]
        } else {
            [second.runs, first.runs]
        },
        overs: if first_batting == home {
            [first.overs, second.overs]
        } else {
            [second.overs, first.overs]
        },
    }
}

struct InningsResult {
    runs: i64,
    wickets: i64,
    overs: f64,
    top_scorer: String,
    top_runs: i64,
}

#[allow(clippy::too_many_arguments)]
fn simulate_innings(
    cfg: &SyntheticConfig,
    match_id: i64,
    inning: i64,
    batting: usize,
    bowling: usize,
    target: Option<i64>,
    rng: &mut StdRng,
    delivery_id: &mut i64,
    out: &mut Vec<Delivery>,
) -> InningsResult {
    let bat_code = TEAMS[batting].1;
    let bowl_code = TEAMS[bowling].1;
    let mut scores = vec![0i64; BATTERS_PER_TEAM];

    let mut runs = 0i64;
    let mut wickets = 0i64;
    let mut striker = 0usize;
    let mut non_striker = 1usize;
    let mut next_batter = 2usize;
    let mut balls = 0i64;

    'overs: for over in 1..=cfg.overs_per_innings {
        let bowler = format!("{bowl_code} Bowler {}", (over as usize % BOWLERS_PER_TEAM) + 1);
        for ball in 1..=6i64 {
            let roll = rng.gen_range(0..100);
            let (batsman_runs, wide_runs, dismissed) = match roll {
                0..=34 => (0, 0, false),
                35..=59 => (1, 0, false),
                60..=69 => (2, 0, false),
                70..=79 => (4, 0, false),
                80..=84 => (6, 0, false),
                85..=89 => (0, 1, false),
                _ => (0, 0, true),
            };
            let extra_runs = wide_runs;
            let total = batsman_runs + extra_runs;
            let batter_idx = striker % BATTERS_PER_TEAM;
            let batsman = format!("{bat_code} Batter {}", batter_idx + 1);

            out.push(Delivery {
                id: *delivery_id,
                match_id,
                inning,
                batting_team: TEAMS[batting].0.to_string(),
                bowling_team: TEAMS[bowling].0.to_string(),
                over,
                ball,
                batsman: batsman.clone(),
                non_striker: format!("{bat_code} Batter {}", (non_striker % BATTERS_PER_TEAM) + 1),
                bowler: bowler.clone(),
                wide_runs,
                batsman_runs,
                extra_runs,
                total_runs: total,
                player_dismissed: dismissed.then(|| batsman.clone()),
                dismissal_kind: dismissed.then(|| "bowled".to_string()),
                ..Delivery::default()
            });
            *delivery_id += 1;
            balls += 1;
            runs += total;
            scores[batter_idx] += batsman_runs;

            if dismissed {
                wickets += 1;
                if wickets >= WICKETS_PER_INNINGS {
                    break 'overs;
                }
                striker = next_batter;
                next_batter += 1;
            } else if batsman_runs % 2 == 1 {
                std::mem::swap(&mut striker, &mut non_striker);
            }
            if let Some(target) = target {
                if runs > target {
                    break 'overs;
                }
            }
        }
        std::mem::swap(&mut striker, &mut non_striker);
    }

    let (top_idx, top_runs) = scores
        .iter()
        .enumerate()
        .max_by_key(|(_, r)| **r)
        .map(|(i, r)| (i, *r))
        .unwrap_or((0, 0));

    InningsResult {
        runs,
        wickets,
        overs: balls as f64 / 6.0,
        top_scorer: format!("{bat_code} Batter {}", top_idx + 1),
        top_runs,
    }
}
