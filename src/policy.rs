//! Decision policy: probability to binary classification.

/// Default classification threshold. Probabilities strictly above it are
/// classified fraud.
pub const DEFAULT_FRAUD_THRESHOLD: f64 = 0.5;

/// Classification of a scored transaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub is_fraud: bool,
    pub score: f64,
}

/// Single global threshold, fixed at construction. No hysteresis, no
/// per-account calibration.
#[derive(Debug, Clone, Copy)]
pub struct DecisionPolicy {
    threshold: f64,
}

impl DecisionPolicy {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// `probability > threshold` classifies as fraud.
    pub fn classify(&self, probability: f64) -> Classification {
        Classification {
            is_fraud: probability > self.threshold,
            score: probability,
        }
    }
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_FRAUD_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_exclusive() {
        let policy = DecisionPolicy::default();

        assert!(!policy.classify(0.5).is_fraud);
        assert!(policy.classify(0.500001).is_fraud);
        assert!(!policy.classify(0.1).is_fraud);
        assert!(policy.classify(0.8).is_fraud);
    }

    #[test]
    fn test_score_carried_through() {
        let classification = DecisionPolicy::default().classify(0.8);
        assert_eq!(classification.score, 0.8);
        assert!(classification.is_fraud);
    }
}
