//! Scoring configuration.
//!
//! Thresholds are an explicit structure handed to the scorer at
//! construction rather than process-wide constants, so alternative
//! policies (e.g. the stricter `r_threshold = -0.1` mode) are a config
//! edit, not a code edit.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Maximum two-sided p-value for a correlation to count as evidence.
    #[serde(default = "default_p_value_threshold")]
    pub p_value_threshold: f64,
    /// The correlation coefficient must fall strictly below this value.
    /// miRNAs suppress their targets, so only inverse correlation
    /// qualifies; 0.0 keeps every significant negative r, -0.1 is the
    /// stricter variant.
    #[serde(default = "default_r_threshold")]
    pub r_threshold: f64,
    /// Additive weight bonus for experimentally validated pairs,
    /// capped so the final weight never exceeds 1.0.
    #[serde(default = "default_validated_bonus")]
    pub validated_bonus: f64,
}

fn default_p_value_threshold() -> f64 { 0.05 }
fn default_r_threshold()       -> f64 { 0.0 }
fn default_validated_bonus()   -> f64 { 0.1 }

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            p_value_threshold: default_p_value_threshold(),
            r_threshold:       default_r_threshold(),
            validated_bonus:   default_validated_bonus(),
        }
    }
}
