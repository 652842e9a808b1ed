//! Mature-to-precursor accession resolution.
//!
//! Interaction databases reference mature arms (`hsa-miR-21-5p`) while
//! the expression matrix is indexed by precursor (`hsa-miR-21`). The two
//! vocabularies share only the `mir-###`/`let-###` stem, so resolution is
//! a fuzzy join on that stem. The matching rule sits behind a trait so it
//! can be swapped for an exhaustive lookup table without touching the
//! scoring pipeline.

use std::collections::HashMap;

use mirnyx_ingestion::{CandidateInteraction, ExpressionMatrix};
use regex::Regex;
use tracing::{debug, info};

/// A candidate whose mature accession resolved to an expression-matrix
/// precursor row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPair {
    pub precursor_id: String,
    pub gene_id: String,
    pub validated: bool,
}

/// Per-candidate outcomes of a resolution pass.
#[derive(Debug, Default, Clone)]
pub struct ResolveStats {
    pub resolved: usize,
    /// No stem match, or stem absent from the expression matrix.
    pub unresolved_mirna: usize,
    /// Gene symbol absent from the gene expression matrix.
    pub unknown_gene: usize,
}

impl ResolveStats {
    pub fn log_summary(&self) {
        info!(
            "Resolution: {} resolved, {} without precursor expression, {} without gene expression",
            self.resolved, self.unresolved_mirna, self.unknown_gene
        );
    }
}

/// Maps an external miRNA accession to its stem key.
pub trait StemMatcher: Send + Sync {
    /// Extract the lowercased stem (`mir-21`, `let-7a`) from an
    /// accession, or `None` when the accession has no recognisable stem.
    fn stem(&self, id: &str) -> Option<String>;
}

/// Pattern-based stem extraction: case-insensitive `mir`/`let`, optional
/// hyphen, then an alphanumeric core starting with a digit.
pub struct RegexStemMatcher {
    pattern: Regex,
}

impl RegexStemMatcher {
    pub fn new() -> Self {
        Self {
            // mir-122, miR-21, let-7a, MIR21 all carry a stem.
            pattern: Regex::new(r"(?i)(?:mir|let)-?[0-9][0-9a-z]*").unwrap(),
        }
    }
}

impl Default for RegexStemMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl StemMatcher for RegexStemMatcher {
    fn stem(&self, id: &str) -> Option<String> {
        self.pattern.find(id).map(|m| m.as_str().to_lowercase())
    }
}

/// Stem → precursor row label lookup over a miRNA expression matrix.
#[derive(Debug, Clone, Default)]
pub struct PrecursorIndex {
    stems: HashMap<String, String>,
}

impl PrecursorIndex {
    /// Scan every row label of the miRNA matrix and index it by stem.
    /// When two rows share a stem the first one wins; after row
    /// normalisation that does not happen in practice.
    pub fn build(matrix: &ExpressionMatrix, matcher: &dyn StemMatcher) -> Self {
        let mut stems = HashMap::new();
        for label in matrix.row_labels() {
            if let Some(stem) = matcher.stem(label) {
                stems.entry(stem).or_insert_with(|| label.clone());
            } else {
                debug!("miRNA matrix row '{}' has no recognisable stem", label);
            }
        }
        info!("Precursor index: {} stems over {} matrix rows", stems.len(), matrix.n_rows());
        Self { stems }
    }

    pub fn lookup(&self, stem: &str) -> Option<&str> {
        self.stems.get(stem).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.stems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stems.is_empty()
    }
}

/// Resolve every candidate against the precursor index and the gene
/// matrix rows. Unresolvable candidates are dropped and tallied, never
/// fatal. Multiple mature arms legitimately collapse onto one precursor
/// here; the collision resolver downstream keeps the best-scoring edge.
pub fn resolve_candidates(
    candidates: &[CandidateInteraction],
    index: &PrecursorIndex,
    matcher: &dyn StemMatcher,
    gene_matrix: &ExpressionMatrix,
) -> (Vec<ResolvedPair>, ResolveStats) {
    let mut stats = ResolveStats::default();
    let mut resolved = Vec::new();

    for candidate in candidates {
        let precursor = matcher
            .stem(&candidate.mirna_id)
            .and_then(|stem| index.lookup(&stem));
        let Some(precursor) = precursor else {
            stats.unresolved_mirna += 1;
            continue;
        };
        if !gene_matrix.contains_row(&candidate.gene_id) {
            stats.unknown_gene += 1;
            continue;
        }
        resolved.push(ResolvedPair {
            precursor_id: precursor.to_string(),
            gene_id: candidate.gene_id.clone(),
            validated: candidate.validated,
        });
        stats.resolved += 1;
    }

    stats.log_summary();
    (resolved, stats)
}
