//! Signal fusion: collapse every signal into risk, confidence and a verdict.
//!
//! - risk = unweighted mean of scores (0.5 when there are none)
//! - ambiguity = 1 - 2|risk - 0.5|, so 1 at the midpoint and 0 at either pole
//! - confidence = clamp(1 - w_a * ambiguity - w_q * quality_penalty)
//!
//! The verdict rule is ordered: low confidence wins over any risk level.

use trustbot_core::config::FusionConfig;
use trustbot_core::{FusionResult, Signal, Verdict};

#[derive(Debug, Clone, Copy, Default)]
pub struct FusionEngine {
    config: FusionConfig,
}

impl FusionEngine {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Mean signal score. Summed in sorted order so any permutation of the
    /// same signals yields the same bits.
    pub fn risk(signals: &[Signal]) -> f64 {
        if signals.is_empty() {
            return 0.5;
        }
        let mut scores: Vec<f64> = signals.iter().map(|s| s.score).collect();
        scores.sort_by(f64::total_cmp);
        scores.iter().sum::<f64>() / scores.len() as f64
    }

    pub fn ambiguity(risk: f64) -> f64 {
        1.0 - 2.0 * (risk - 0.5).abs()
    }

    pub fn confidence(&self, risk: f64, quality_penalty: f64) -> f64 {
        let penalty = if quality_penalty.is_nan() { 1.0 } else { quality_penalty.clamp(0.0, 1.0) };
        let c = 1.0
            - self.config.ambiguity_weight * Self::ambiguity(risk)
            - self.config.quality_weight * penalty;
        c.clamp(0.0, 1.0)
    }

    pub fn verdict(&self, risk: f64, confidence: f64) -> Verdict {
        if confidence < self.config.unsure_below {
            Verdict::Unsure
        } else if risk >= self.config.risky_at {
            Verdict::Risky
        } else if risk <= self.config.safe_at {
            Verdict::Safe
        } else {
            Verdict::Unsure
        }
    }

    pub fn fuse(&self, signals: &[Signal], quality_penalty: f64) -> FusionResult {
        let risk = Self::risk(signals);
        let confidence = self.confidence(risk, quality_penalty);
        FusionResult {
            risk,
            confidence,
            verdict: self.verdict(risk, confidence),
        }
    }
}

/// Fuse with the default calibration.
pub fn fuse(signals: &[Signal], quality_penalty: f64) -> FusionResult {
    FusionEngine::default().fuse(signals, quality_penalty)
}
