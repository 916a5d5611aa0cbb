//! Statistical attribution of an anonymous weight to a user profile.
//!
//! Each profile is scored by how far the candidate weight lies from its past
//! weights. With enough samples and a non-degenerate spread the score is a
//! z-score; otherwise it is the absolute distance to the mean over a fallback
//! spread proportional to that mean. A profile with no history at all is
//! measured against `default_mean_kg` the same way, so a new household still
//! gets its first readings attributed. The lowest score wins if it is within
//! the acceptance threshold.
//!
//! Every spread is either observed or relative to a mean, so multiplying all
//! weights (and the default mean) by the same factor never changes the choice.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::history::WeightHistory;
use crate::id::ProfileId;
use crate::profile::UserProfile;
use crate::time::Timestamp;

/// Tunables for [`identify`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributionConfig {
    /// Maximum score still attributed to a profile.
    pub acceptance_threshold: f64,
    /// Samples needed before a standard deviation is trusted.
    pub min_history: usize,
    /// Reference weight for profiles without any history, kg.
    pub default_mean_kg: f64,
    /// Fallback spread as a fraction of the reference mean.
    pub fallback_spread_ratio: f64,
    /// Standard deviations below this fraction of the mean are degenerate.
    pub min_relative_std_dev: f64,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: 3.0,
            min_history: 3,
            default_mean_kg: 70.0,
            // 5 kg and 0.1 kg at the default mean.
            fallback_spread_ratio: 5.0 / 70.0,
            min_relative_std_dev: 0.1 / 70.0,
        }
    }
}

/// Outcome of attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "profile_id")]
pub enum Attribution {
    Profile(ProfileId),
    /// No profile within the acceptance threshold; stored for manual review.
    Unknown,
}

impl Attribution {
    #[must_use]
    pub fn profile_id(self) -> Option<ProfileId> {
        match self {
            Self::Profile(id) => Some(id),
            Self::Unknown => None,
        }
    }
}

/// How a profile's score was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMethod {
    ZScore,
    /// Too few samples or a standard deviation under the floor.
    AbsoluteDistance,
    /// No history; distance to `default_mean_kg`.
    DefaultMean,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileScore {
    pub profile_id: ProfileId,
    pub score: f64,
    pub method: ScoreMethod,
    pub last_active: Option<Timestamp>,
}

/// Attribution together with every computed score, for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct Identification {
    pub attribution: Attribution,
    pub scores: Vec<ProfileScore>,
}

/// Score every profile and pick the closest one.
///
/// Histories of profiles missing from `profiles` are ignored. Ties on the
/// score go to the most recently active profile.
#[must_use]
pub fn identify(
    candidate_weight_kg: f64,
    histories: &HashMap<ProfileId, WeightHistory>,
    profiles: &[UserProfile],
    config: &AttributionConfig,
) -> Identification {
    let scores: Vec<ProfileScore> = profiles
        .iter()
        .map(|profile| {
            let history = histories.get(&profile.id);
            let (score, method) = score(candidate_weight_kg, history, config);
            ProfileScore {
                profile_id: profile.id,
                score,
                method,
                last_active: history.and_then(WeightHistory::last_active),
            }
        })
        .collect();

    let best = scores.iter().min_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| b.last_active.cmp(&a.last_active))
    });

    let attribution = match best {
        Some(best) if best.score <= config.acceptance_threshold => {
            Attribution::Profile(best.profile_id)
        }
        _ => Attribution::Unknown,
    };

    Identification {
        attribution,
        scores,
    }
}

fn score(
    weight_kg: f64,
    history: Option<&WeightHistory>,
    config: &AttributionConfig,
) -> (f64, ScoreMethod) {
    let Some(stats) = history.and_then(WeightHistory::stats) else {
        return (
            relative_distance(weight_kg, config.default_mean_kg, config),
            ScoreMethod::DefaultMean,
        );
    };
    let floor = stats.mean * config.min_relative_std_dev;
    if stats.count >= config.min_history && stats.std_dev >= floor {
        ((weight_kg - stats.mean).abs() / stats.std_dev, ScoreMethod::ZScore)
    } else {
        (
            relative_distance(weight_kg, stats.mean, config),
            ScoreMethod::AbsoluteDistance,
        )
    }
}

fn relative_distance(weight_kg: f64, mean_kg: f64, config: &AttributionConfig) -> f64 {
    (weight_kg - mean_kg).abs() / (mean_kg * config.fallback_spread_ratio)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::history::WeightSample;
    use crate::profile::Sex;

    fn profile(name: &str) -> UserProfile {
        UserProfile::builder()
            .username(name)
            .height_cm(175.0)
            .birthdate(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap())
            .sex(Sex::Male)
            .build()
            .unwrap()
    }

    fn history_at(profile: &UserProfile, weights: &[f64], last_day: i64) -> WeightHistory {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 7, 0, 0).unwrap();
        let offset = last_day + 1 - i64::try_from(weights.len()).unwrap();
        let samples = weights
            .iter()
            .zip(offset..)
            .map(|(w, day)| WeightSample {
                weight_kg: *w,
                recorded_at: start + Duration::days(day),
            })
            .collect();
        WeightHistory::new(profile.id, samples)
    }

    /// Samples with exactly the requested mean and sample standard deviation.
    fn spread(mean: f64, sd: f64) -> Vec<f64> {
        vec![mean - sd, mean, mean + sd]
    }

    fn histories(entries: Vec<WeightHistory>) -> HashMap<ProfileId, WeightHistory> {
        entries.into_iter().map(|h| (h.profile_id, h)).collect()
    }

    #[test]
    fn should_select_profile_with_closest_distribution() {
        let first = profile("first");
        let second = profile("second");
        let map = histories(vec![
            history_at(&first, &spread(67.5, 1.2), 10),
            history_at(&second, &spread(80.0, 3.0), 10),
        ]);

        let result = identify(
            68.0,
            &map,
            &[first.clone(), second],
            &AttributionConfig::default(),
        );

        assert_eq!(result.attribution, Attribution::Profile(first.id));
        assert_eq!(result.scores.len(), 2);
        assert!(result.scores.iter().all(|s| s.method == ScoreMethod::ZScore));
    }

    #[test]
    fn should_not_change_selection_when_all_weights_are_scaled() {
        let first = profile("first");
        let second = profile("second");
        let profiles = [first.clone(), second.clone()];
        let config = AttributionConfig {
            acceptance_threshold: f64::INFINITY,
            ..AttributionConfig::default()
        };

        for factor in [0.5, 1.0, 1.7, 2.5] {
            let scaled =
                |values: Vec<f64>| values.into_iter().map(|w| w * factor).collect::<Vec<_>>();
            let map = histories(vec![
                history_at(&first, &scaled(vec![60.0, 62.0, 61.0, 63.5]), 5),
                history_at(&second, &scaled(vec![70.0, 74.0, 71.0, 73.0]), 5),
            ]);
            let result = identify(66.0 * factor, &map, &profiles, &config);
            assert_eq!(
                result.attribution,
                Attribution::Profile(first.id),
                "factor {factor}"
            );
        }
    }

    #[test]
    fn should_not_change_selection_when_scaling_mixes_score_methods() {
        let steady = profile("steady");
        let short = profile("short");
        let flat = profile("flat");
        let fresh = profile("fresh");
        let profiles = [steady.clone(), short.clone(), flat.clone(), fresh.clone()];
        let base = AttributionConfig {
            acceptance_threshold: f64::INFINITY,
            ..AttributionConfig::default()
        };

        for (candidate, expected) in [
            (61.0, steady.id),
            (79.5, short.id),
            (90.2, flat.id),
            (68.0, fresh.id),
        ] {
            let mut reference: Option<Vec<(ProfileId, f64, ScoreMethod)>> = None;
            for factor in [0.5, 1.0, 1.7, 2.5] {
                let scaled =
                    |values: &[f64]| values.iter().map(|w| w * factor).collect::<Vec<_>>();
                let map = histories(vec![
                    history_at(&steady, &scaled(&[60.0, 62.0, 61.0, 63.5]), 5),
                    history_at(&short, &scaled(&[80.0, 82.0]), 5),
                    history_at(&flat, &scaled(&[90.0, 90.0, 90.0]), 5),
                ]);
                let config = AttributionConfig {
                    default_mean_kg: base.default_mean_kg * factor,
                    ..base
                };
                let result = identify(candidate * factor, &map, &profiles, &config);
                assert_eq!(
                    result.attribution,
                    Attribution::Profile(expected),
                    "candidate {candidate} factor {factor}"
                );

                let summary: Vec<_> = result
                    .scores
                    .iter()
                    .map(|s| (s.profile_id, s.score, s.method))
                    .collect();
                match &reference {
                    None => reference = Some(summary),
                    Some(reference) => {
                        for (a, b) in reference.iter().zip(&summary) {
                            assert_eq!(a.0, b.0);
                            assert_eq!(a.2, b.2, "method changed at factor {factor}");
                            assert!((a.1 - b.1).abs() < 1e-9, "score changed at factor {factor}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn should_return_unknown_when_no_profile_within_threshold() {
        let first = profile("first");
        let map = histories(vec![history_at(&first, &spread(60.0, 1.0), 3)]);
        let result = identify(95.0, &map, &[first], &AttributionConfig::default());
        assert_eq!(result.attribution, Attribution::Unknown);
        assert_eq!(result.attribution.profile_id(), None);
    }

    #[test]
    fn should_attribute_to_only_profile_without_history_near_default_mean() {
        let first = profile("first");
        let map = histories(vec![WeightHistory::new(first.id, vec![])]);
        let result = identify(70.0, &map, &[first.clone()], &AttributionConfig::default());

        assert_eq!(result.attribution, Attribution::Profile(first.id));
        assert_eq!(result.scores.len(), 1);
        assert_eq!(result.scores[0].method, ScoreMethod::DefaultMean);
        assert!(result.scores[0].score.abs() < 1e-12);
        assert_eq!(result.scores[0].last_active, None);
    }

    #[test]
    fn should_score_profile_missing_from_histories_against_default_mean() {
        let first = profile("first");
        let result = identify(73.0, &HashMap::new(), &[first.clone()], &AttributionConfig::default());

        assert_eq!(result.attribution, Attribution::Profile(first.id));
        assert!((result.scores[0].score - 3.0 / 5.0).abs() < 1e-9);
    }

    #[test]
    fn should_return_unknown_when_far_from_default_mean_without_history() {
        let first = profile("first");
        let result = identify(100.0, &HashMap::new(), &[first], &AttributionConfig::default());
        assert_eq!(result.attribution, Attribution::Unknown);
        assert_eq!(result.scores.len(), 1);
    }

    #[test]
    fn should_prefer_profile_with_history_over_default_mean() {
        let known = profile("known");
        let fresh = profile("fresh");
        let map = histories(vec![history_at(&known, &spread(82.0, 1.0), 4)]);
        let result = identify(
            82.5,
            &map,
            &[known.clone(), fresh],
            &AttributionConfig::default(),
        );
        assert_eq!(result.attribution, Attribution::Profile(known.id));
    }

    #[test]
    fn should_fall_back_to_absolute_distance_when_history_is_short() {
        let first = profile("first");
        let map = histories(vec![history_at(&first, &[70.0, 72.0], 1)]);
        let config = AttributionConfig::default();
        let result = identify(73.0, &map, &[first.clone()], &config);

        assert_eq!(result.attribution, Attribution::Profile(first.id));
        let score = result.scores[0];
        assert_eq!(score.method, ScoreMethod::AbsoluteDistance);
        let spread_kg = 71.0 * config.fallback_spread_ratio;
        assert!((score.score - 2.0 / spread_kg).abs() < 1e-12);
    }

    #[test]
    fn should_fall_back_to_absolute_distance_when_spread_is_degenerate() {
        let first = profile("first");
        let map = histories(vec![history_at(&first, &[70.0, 70.0, 70.0, 70.0], 3)]);
        let result = identify(70.5, &map, &[first], &AttributionConfig::default());

        let score = result.scores[0];
        assert_eq!(score.method, ScoreMethod::AbsoluteDistance);
        assert!(score.score.is_finite());
        assert!((score.score - 0.1).abs() < 1e-9);
    }

    #[test]
    fn should_break_ties_by_most_recent_activity() {
        let stale = profile("stale");
        let recent = profile("recent");
        let map = histories(vec![
            history_at(&stale, &spread(70.0, 2.0), 5),
            history_at(&recent, &spread(70.0, 2.0), 9),
        ]);
        let result = identify(
            71.0,
            &map,
            &[stale, recent.clone()],
            &AttributionConfig::default(),
        );
        assert_eq!(result.attribution, Attribution::Profile(recent.id));
    }

    #[test]
    fn should_ignore_histories_of_unknown_profiles() {
        let first = profile("first");
        let ghost = profile("ghost");
        let map = histories(vec![history_at(&ghost, &spread(68.0, 1.0), 3)]);
        let result = identify(68.0, &map, &[first.clone()], &AttributionConfig::default());

        assert_eq!(result.scores.len(), 1);
        assert_eq!(result.scores[0].profile_id, first.id);
        assert_eq!(result.scores[0].method, ScoreMethod::DefaultMean);
        assert!((result.scores[0].score - 2.0 / 5.0).abs() < 1e-9);
    }
}
