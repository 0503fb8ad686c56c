use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{info, warn};

use crate::encoder::LabelEncoder;
use crate::forest::{ForestConfig, RandomForest, argmax};
use crate::match_dataset::{MatchDataset, MatchFeatures, VenueStats};

const SPLIT_SEED: u64 = 42;
const HOLDOUT_FRACTION: f64 = 0.2;

/// A single-match prediction request from the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchQuery {
    pub team1: String,
    pub team2: String,
    pub toss_winner: String,
    pub toss_decision: String,
    pub venue: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub predicted_winner: String,
    pub confidence: f64,
    pub probabilities: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default)]
struct FeatureEncoders {
    team1: LabelEncoder,
    team2: LabelEncoder,
    toss_winner: LabelEncoder,
    toss_decision: LabelEncoder,
    venue: LabelEncoder,
}

impl FeatureEncoders {
    fn fit(features: &[MatchFeatures]) -> Self {
        Self {
            team1: LabelEncoder::fit(features.iter().map(|f| f.team1.as_str())),
            team2: LabelEncoder::fit(features.iter().map(|f| f.team2.as_str())),
            toss_winner: LabelEncoder::fit(features.iter().map(|f| f.toss_winner.as_str())),
            toss_decision: LabelEncoder::fit(features.iter().map(|f| f.toss_decision.as_str())),
            venue: LabelEncoder::fit(features.iter().map(|f| f.venue.as_str())),
        }
    }

    fn encode_row(&mut self, f: &MatchFeatures) -> Vec<f64> {
        vec![
            self.team1.encode(&f.team1) as f64,
            self.team2.encode(&f.team2) as f64,
            self.toss_winner.encode(&f.toss_winner) as f64,
            self.toss_decision.encode(&f.toss_decision) as f64,
            self.venue.encode(&f.venue) as f64,
            f.season as f64,
            f.venue_total_matches,
            f.venue_avg_first_innings_score,
            f.venue_avg_second_innings_score,
            f.venue_toss_batting_win_rate,
        ]
    }
}

/// A fitted classifier plus the encoders that produced its training matrix.
///
/// The value is rebuilt once per report cycle and discarded on the next;
/// `predict` may extend the feature encoders' vocabularies, so an instance
/// must not be shared across concurrent predictions.
#[derive(Debug, Clone)]
pub struct TrainedPredictor {
    forest: RandomForest,
    encoders: FeatureEncoders,
    target: LabelEncoder,
    season: i64,
    holdout_accuracy: Option<f64>,
}

/// Fits the winner classifier. Returns `None` — a normal, handled outcome,
/// not an error — when the dataset is empty or too small to split.
pub fn train(dataset: &MatchDataset) -> Option<TrainedPredictor> {
    if dataset.is_empty() {
        warn!("no decided matches available, predictor not trained");
        return None;
    }

    let mut encoders = FeatureEncoders::fit(&dataset.features);
    let target = LabelEncoder::fit(dataset.labels.iter().map(|l| l.as_str()));
    let rows: Vec<Vec<f64>> = dataset
        .features
        .iter()
        .map(|f| encoders.encode_row(f))
        .collect();
    let labels: Vec<usize> = dataset
        .labels
        .iter()
        .filter_map(|l| target.lookup(l))
        .collect();

    let n = rows.len();
    let n_test = ((n as f64) * HOLDOUT_FRACTION).ceil() as usize;
    let n_train = n - n_test;
    if n_train == 0 {
        warn!(samples = n, "too few examples to split, predictor not trained");
        return None;
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(SPLIT_SEED));
    let (train_idx, test_idx) = indices.split_at(n_train);

    let train_rows: Vec<Vec<f64>> = train_idx.iter().map(|&i| rows[i].clone()).collect();
    let train_labels: Vec<usize> = train_idx.iter().map(|&i| labels[i]).collect();

    let forest = RandomForest::fit(
        &train_rows,
        &train_labels,
        target.len(),
        ForestConfig::default(),
    );

    // Held-out accuracy is a diagnostic only; the model is kept either way.
    let holdout_accuracy = if test_idx.is_empty() {
        None
    } else {
        let correct = test_idx
            .iter()
            .filter(|&&i| forest.predict(&rows[i]) == labels[i])
            .count();
        Some(correct as f64 / test_idx.len() as f64)
    };
    match holdout_accuracy {
        Some(acc) => info!(
            samples = n,
            holdout = test_idx.len(),
            accuracy = acc,
            "predictor trained"
        ),
        None => info!(samples = n, "predictor trained without holdout"),
    }

    let season = dataset.latest_season().unwrap_or_default();
    Some(TrainedPredictor {
        forest,
        encoders,
        target,
        season,
        holdout_accuracy,
    })
}

impl TrainedPredictor {
    pub fn holdout_accuracy(&self) -> Option<f64> {
        self.holdout_accuracy
    }

    /// Class labels the model can predict, in encoder order.
    pub fn known_teams(&self) -> &[String] {
        self.target.classes()
    }

    /// Scores one fixture. Venue-derived aggregates are defaulted to
    /// neutral values because single-match inference cannot recompute
    /// venue history inline. Unseen categorical values extend the
    /// encoders' vocabularies instead of failing.
    pub fn predict(&mut self, query: &MatchQuery) -> Prediction {
        let neutral = VenueStats::neutral();
        let row = self.encoders.encode_row(&MatchFeatures {
            team1: query.team1.clone(),
            team2: query.team2.clone(),
            toss_winner: query.toss_winner.clone(),
            toss_decision: query.toss_decision.clone(),
            venue: query.venue.clone(),
            season: self.season,
            venue_total_matches: neutral.total_matches,
            venue_avg_first_innings_score: neutral.avg_first_innings_score,
            venue_avg_second_innings_score: neutral.avg_second_innings_score,
            venue_toss_batting_win_rate: neutral.toss_batting_win_rate,
        });

        let probs = self.forest.predict_proba(&row);
        let best = argmax(&probs);
        let predicted_winner = self
            .target
            .decode(best)
            .unwrap_or_default()
            .to_string();

        let probabilities: BTreeMap<String, f64> = self
            .target
            .classes()
            .iter()
            .zip(&probs)
            .map(|(team, p)| (team.clone(), *p))
            .collect();

        Prediction {
            predicted_winner,
            confidence: probs.get(best).copied().unwrap_or_default(),
            probabilities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_dataset::build_training_set;
    use crate::records::Match;

    fn season_matches() -> Vec<Match> {
        let teams = [
            ("Mumbai Indians", "Chennai Super Kings"),
            ("Chennai Super Kings", "Kolkata Knight Riders"),
            ("Kolkata Knight Riders", "Mumbai Indians"),
        ];
        let mut out = Vec::new();
        for round in 0..6 {
            for (i, (team1, team2)) in teams.iter().enumerate() {
                let id = (round * teams.len() + i + 1) as i64;
                out.push(Match {
                    id,
                    season: 2025,
                    date: format!("2025-04-{:02}", (id % 28) + 1),
                    team1: team1.to_string(),
                    team2: team2.to_string(),
                    toss_winner: if id % 2 == 0 { team1 } else { team2 }.to_string(),
                    toss_decision: if id % 2 == 0 { "bat" } else { "field" }.to_string(),
                    winner: Some(if id % 3 == 0 { team2 } else { team1 }.to_string()),
                    venue: if i == 0 {
                        "Wankhede Stadium"
                    } else {
                        "Eden Gardens"
                    }
                    .to_string(),
                    ..Match::default()
                });
            }
        }
        out
    }

    #[test]
    fn empty_dataset_is_not_trained() {
        assert!(train(&MatchDataset::default()).is_none());
    }

    #[test]
    fn single_example_cannot_split() {
        let matches = vec![Match {
            id: 1,
            season: 2025,
            date: "2025-04-01".to_string(),
            team1: "MI".to_string(),
            team2: "CSK".to_string(),
            toss_winner: "MI".to_string(),
            toss_decision: "bat".to_string(),
            winner: Some("MI".to_string()),
            venue: "V".to_string(),
            ..Match::default()
        }];
        assert!(train(&build_training_set(&matches)).is_none());
    }

    #[test]
    fn prediction_probabilities_sum_to_one() {
        let dataset = build_training_set(&season_matches());
        let mut model = train(&dataset).expect("model should train");
        let prediction = model.predict(&MatchQuery {
            team1: "Mumbai Indians".to_string(),
            team2: "Chennai Super Kings".to_string(),
            toss_winner: "Mumbai Indians".to_string(),
            toss_decision: "bat".to_string(),
            venue: "Wankhede Stadium".to_string(),
        });
        let sum: f64 = prediction.probabilities.values().sum();
        assert!((sum - 1.0).abs() < 1e-6, "sum = {sum}");
        assert!(prediction.confidence > 0.0 && prediction.confidence <= 1.0);
        assert!(
            model
                .known_teams()
                .contains(&prediction.predicted_winner)
        );
    }

    #[test]
    fn unseen_venue_still_predicts() {
        let dataset = build_training_set(&season_matches());
        let mut model = train(&dataset).expect("model should train");
        let prediction = model.predict(&MatchQuery {
            team1: "Mumbai Indians".to_string(),
            team2: "Chennai Super Kings".to_string(),
            toss_winner: "Chennai Super Kings".to_string(),
            toss_decision: "field".to_string(),
            venue: "Never Seen Ground".to_string(),
        });
        assert!(!prediction.predicted_winner.is_empty());
        let sum: f64 = prediction.probabilities.values().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn holdout_accuracy_is_a_probability() {
        let dataset = build_training_set(&season_matches());
        let model = train(&dataset).expect("model should train");
        let acc = model.holdout_accuracy().expect("holdout present");
        assert!((0.0..=1.0).contains(&acc));
    }
}
