//! Correlation-based edge scoring.
//!
//! One resolved pair yields zero or one edge candidate: the pair is kept
//! only when the precursor and gene expression vectors are significantly
//! inversely correlated across the common samples. Skipped pairs are
//! tallied per reason so data loss stays observable; nothing here aborts
//! the run.

use mirnyx_common::ScoringConfig;
use mirnyx_ingestion::ExpressionMatrix;
use rayon::prelude::*;
use tracing::info;

use crate::edges::Edge;
use crate::resolve::ResolvedPair;
use crate::stats::pearson;

/// Why a resolved pair produced no edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Either expression vector is constant across samples.
    ZeroVariance,
    /// Correlation failed the significance or direction filter.
    NotSignificant,
}

/// Aggregate scoring outcomes for one run.
#[derive(Debug, Default, Clone)]
pub struct ScoreStats {
    pub scored: usize,
    pub kept: usize,
    pub zero_variance: usize,
    pub not_significant: usize,
}

impl ScoreStats {
    pub fn log_summary(&self) {
        info!(
            "Scoring: {} pairs scored, {} edges kept, {} zero-variance, {} not significant",
            self.scored, self.kept, self.zero_variance, self.not_significant
        );
    }
}

enum ScoreOutcome {
    Edge(Edge),
    Skip(SkipReason),
}

/// Score every resolved pair against the aligned matrices.
///
/// Pairs are independent, so the loop fans out over rayon; the matrices
/// are only read. Output order is not meaningful — the collision
/// resolver sorts.
pub fn score_pairs(
    pairs: &[ResolvedPair],
    gene_matrix: &ExpressionMatrix,
    mirna_matrix: &ExpressionMatrix,
    config: &ScoringConfig,
) -> (Vec<Edge>, ScoreStats) {
    let outcomes: Vec<ScoreOutcome> = pairs
        .par_iter()
        .filter_map(|pair| score_pair(pair, gene_matrix, mirna_matrix, config))
        .collect();

    let mut stats = ScoreStats { scored: pairs.len(), ..Default::default() };
    let mut edges = Vec::new();
    for outcome in outcomes {
        match outcome {
            ScoreOutcome::Edge(edge) => {
                stats.kept += 1;
                edges.push(edge);
            }
            ScoreOutcome::Skip(SkipReason::ZeroVariance) => stats.zero_variance += 1,
            ScoreOutcome::Skip(SkipReason::NotSignificant) => stats.not_significant += 1,
        }
    }
    stats.log_summary();
    (edges, stats)
}

fn score_pair(
    pair: &ResolvedPair,
    gene_matrix: &ExpressionMatrix,
    mirna_matrix: &ExpressionMatrix,
    config: &ScoringConfig,
) -> Option<ScoreOutcome> {
    // Resolution guarantees both rows exist; a missing row here would be
    // a caller passing unaligned matrices, which has no meaningful score.
    let mirna_vec = mirna_matrix.row(&pair.precursor_id)?;
    let gene_vec = gene_matrix.row(&pair.gene_id)?;

    let Some((r, p)) = pearson(mirna_vec, gene_vec) else {
        return Some(ScoreOutcome::Skip(SkipReason::ZeroVariance));
    };

    if p >= config.p_value_threshold || r >= config.r_threshold {
        return Some(ScoreOutcome::Skip(SkipReason::NotSignificant));
    }

    let mut weight = r.abs();
    if pair.validated {
        weight = (weight + config.validated_bonus).min(1.0);
    }

    Some(ScoreOutcome::Edge(Edge {
        mirna_id: pair.precursor_id.clone(),
        gene_id: pair.gene_id.clone(),
        weight,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(precursor: &str, gene: &str, validated: bool) -> ResolvedPair {
        ResolvedPair {
            precursor_id: precursor.to_string(),
            gene_id: gene.to_string(),
            validated,
        }
    }

    fn matrices() -> (ExpressionMatrix, ExpressionMatrix) {
        let samples: Vec<String> =
            vec!["P1".into(), "P2".into(), "P3".into(), "P4".into(), "P5".into()];
        let mirna = ExpressionMatrix::from_rows(
            samples.clone(),
            vec![
                ("hsa-miR-21".into(), vec![1.0, 2.0, 3.0, 4.0, 5.0]),
                ("hsa-miR-flat".into(), vec![2.0, 2.0, 2.0, 2.0, 2.0]),
            ],
        );
        let gene = ExpressionMatrix::from_rows(
            samples,
            vec![
                // Perfectly anti-correlated with hsa-miR-21.
                ("TP53".into(), vec![5.0, 4.0, 3.0, 2.0, 1.0]),
                // Perfectly positively correlated with hsa-miR-21.
                ("KRAS".into(), vec![1.0, 2.0, 3.0, 4.0, 5.0]),
            ],
        );
        (mirna, gene)
    }

    #[test]
    fn test_anticorrelated_validated_pair_caps_at_one() {
        let (mirna, gene) = matrices();
        let pairs = vec![pair("hsa-miR-21", "TP53", true)];
        let (edges, stats) = score_pairs(&pairs, &gene, &mirna, &ScoringConfig::default());
        assert_eq!(stats.kept, 1);
        assert_eq!(edges[0].mirna_id, "hsa-miR-21");
        assert_eq!(edges[0].gene_id, "TP53");
        // |r| = 1.0 plus the validated bonus, capped.
        assert_eq!(edges[0].weight, 1.0);
    }

    #[test]
    fn test_positive_correlation_rejected() {
        let (mirna, gene) = matrices();
        let pairs = vec![pair("hsa-miR-21", "KRAS", true)];
        let (edges, stats) = score_pairs(&pairs, &gene, &mirna, &ScoringConfig::default());
        assert!(edges.is_empty());
        assert_eq!(stats.not_significant, 1);
    }

    #[test]
    fn test_zero_variance_skipped() {
        let (mirna, gene) = matrices();
        let pairs = vec![pair("hsa-miR-flat", "TP53", false)];
        let (edges, stats) = score_pairs(&pairs, &gene, &mirna, &ScoringConfig::default());
        assert!(edges.is_empty());
        assert_eq!(stats.zero_variance, 1);
    }

    #[test]
    fn test_unvalidated_weight_gets_no_bonus() {
        let (mirna, gene) = matrices();
        let pairs = vec![pair("hsa-miR-21", "TP53", false)];
        let (edges, _) = score_pairs(&pairs, &gene, &mirna, &ScoringConfig::default());
        assert_eq!(edges[0].weight, 1.0); // |r| alone is already 1.0
    }

    #[test]
    fn test_stricter_r_threshold_filters_weak_inverse() {
        let samples: Vec<String> = vec!["P1".into(), "P2".into(), "P3".into()];
        // r ≈ -0.058: inverse but weaker than the -0.1 cut.
        let mirna = ExpressionMatrix::from_rows(
            samples.clone(),
            vec![("hsa-miR-21".into(), vec![1.0, 2.0, 3.0])],
        );
        let gene = ExpressionMatrix::from_rows(
            samples,
            vec![("TP53".into(), vec![1.1, -2.0, 0.9])],
        );
        let pairs = vec![pair("hsa-miR-21", "TP53", false)];

        let lenient = ScoringConfig { p_value_threshold: 1.0, ..Default::default() };
        let (edges, _) = score_pairs(&pairs, &gene, &mirna, &lenient);
        assert_eq!(edges.len(), 1);
        assert!(edges[0].weight < 0.1);

        let strict = ScoringConfig { p_value_threshold: 1.0, r_threshold: -0.1, ..Default::default() };
        let (edges, stats) = score_pairs(&pairs, &gene, &mirna, &strict);
        assert!(edges.is_empty());
        assert_eq!(stats.not_significant, 1);
    }

    #[test]
    fn test_weights_bounded() {
        let (mirna, gene) = matrices();
        let pairs = vec![
            pair("hsa-miR-21", "TP53", true),
            pair("hsa-miR-21", "TP53", false),
        ];
        let (edges, _) = score_pairs(&pairs, &gene, &mirna, &ScoringConfig::default());
        for edge in &edges {
            assert!(edge.weight > 0.0 && edge.weight <= 1.0);
        }
    }
}
