//! Historical trend classification

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt;

/// Direction of demand over the most recent weeks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
    InsufficientData,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
            Trend::InsufficientData => "insufficient_data",
        };
        f.write_str(label)
    }
}

/// Compares the mean of the last `window` weeks with the mean of the
/// `window` weeks before it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendRule {
    window: usize,
    threshold: f64,
}

impl Default for TrendRule {
    fn default() -> Self {
        Self {
            window: 4,
            threshold: 0.05,
        }
    }
}

impl TrendRule {
    /// Create a rule with a window length and a relative-change threshold
    pub fn new(window: usize, threshold: f64) -> Result<Self> {
        if window == 0 {
            return Err(ForecastError::InvalidArgument(
                "Trend window must be at least 1".to_string(),
            ));
        }
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ForecastError::InvalidArgument(format!(
                "Trend threshold must be a non-negative number, got {}",
                threshold
            )));
        }
        Ok(Self { window, threshold })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Classify an ascending weekly series
    ///
    /// A relative change of at least the threshold counts as a move. If the
    /// prior window averages zero, any recent demand is an increase.
    pub fn classify(&self, values: &[f64]) -> Trend {
        if values.len() < 2 * self.window {
            return Trend::InsufficientData;
        }

        let split = values.len() - self.window;
        let recent = Statistics::mean(values[split..].iter());
        let prior = Statistics::mean(values[split - self.window..split].iter());

        if prior == 0.0 {
            return if recent > 0.0 {
                Trend::Increasing
            } else {
                Trend::Stable
            };
        }

        let change = (recent - prior) / prior;
        if change >= self.threshold {
            Trend::Increasing
        } else if change <= -self.threshold {
            Trend::Decreasing
        } else {
            Trend::Stable
        }
    }
}

/// Classify with the default 4-week window and 5% threshold
pub fn classify_trend(values: &[f64]) -> Trend {
    TrendRule::default().classify(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_up_is_increasing() {
        let values = [10.0, 10.0, 10.0, 10.0, 20.0, 20.0, 20.0, 20.0];
        assert_eq!(classify_trend(&values), Trend::Increasing);
    }

    #[test]
    fn test_step_down_is_decreasing() {
        let values = [20.0, 20.0, 20.0, 20.0, 10.0, 10.0, 10.0, 10.0];
        assert_eq!(classify_trend(&values), Trend::Decreasing);
    }

    #[test]
    fn test_flat_is_stable() {
        assert_eq!(classify_trend(&[10.0; 8]), Trend::Stable);
        assert_eq!(classify_trend(&[0.0; 8]), Trend::Stable);
    }

    #[test]
    fn test_short_series() {
        assert_eq!(classify_trend(&[1.0, 2.0, 3.0]), Trend::InsufficientData);
        assert_eq!(classify_trend(&[1.0; 7]), Trend::InsufficientData);
    }

    #[test]
    fn test_only_last_two_windows_count() {
        // An early spike outside both windows is ignored
        let values = [100.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0];
        assert_eq!(classify_trend(&values), Trend::Stable);
    }

    #[test]
    fn test_small_changes_are_stable() {
        let values = [100.0, 100.0, 100.0, 100.0, 102.0, 102.0, 102.0, 102.0];
        assert_eq!(classify_trend(&values), Trend::Stable);
    }

    #[test]
    fn test_growth_from_zero() {
        let values = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0];
        assert_eq!(classify_trend(&values), Trend::Increasing);
    }

    #[test]
    fn test_custom_rule() {
        let rule = TrendRule::new(2, 0.5).unwrap();
        assert_eq!(rule.classify(&[10.0, 10.0, 12.0, 12.0]), Trend::Stable);
        assert_eq!(rule.classify(&[10.0, 10.0, 20.0, 20.0]), Trend::Increasing);
        assert!(TrendRule::new(0, 0.1).is_err());
        assert!(TrendRule::new(4, -0.1).is_err());
        assert!(TrendRule::new(4, f64::NAN).is_err());
    }

    #[test]
    fn test_serialized_label() {
        assert_eq!(
            serde_json::to_string(&Trend::InsufficientData).unwrap(),
            "\"insufficient_data\""
        );
        assert_eq!(Trend::Increasing.to_string(), "increasing");
    }
}
