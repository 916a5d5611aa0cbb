//! Per-profile weight history used for attribution.

use serde::{Deserialize, Serialize};

use crate::id::ProfileId;
use crate::time::Timestamp;

/// One past accepted weight of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightSample {
    pub weight_kg: f64,
    pub recorded_at: Timestamp,
}

/// Mean and sample standard deviation of a history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightStats {
    pub count: usize,
    pub mean: f64,
    /// Bessel-corrected; `0.0` with fewer than two samples.
    pub std_dev: f64,
}

/// Ordered past weights of one profile, oldest first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeightHistory {
    pub profile_id: ProfileId,
    pub samples: Vec<WeightSample>,
}

impl WeightHistory {
    #[must_use]
    pub fn new(profile_id: ProfileId, samples: Vec<WeightSample>) -> Self {
        Self {
            profile_id,
            samples,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Statistics over the history, `None` when it is empty.
    #[must_use]
    pub fn stats(&self) -> Option<WeightStats> {
        if self.samples.is_empty() {
            return None;
        }
        let count = self.samples.len();
        #[allow(clippy::cast_precision_loss)]
        let n = count as f64;
        let mean = self.samples.iter().map(|s| s.weight_kg).sum::<f64>() / n;
        let std_dev = if count < 2 {
            0.0
        } else {
            let var = self
                .samples
                .iter()
                .map(|s| (s.weight_kg - mean).powi(2))
                .sum::<f64>()
                / (n - 1.0);
            var.sqrt()
        };
        Some(WeightStats {
            count,
            mean,
            std_dev,
        })
    }

    /// Time of the most recent sample.
    #[must_use]
    pub fn last_active(&self) -> Option<Timestamp> {
        self.samples.iter().map(|s| s.recorded_at).max()
    }
}
