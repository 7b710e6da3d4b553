use crate::error::{PipelineError, PipelineResult};

pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.75;

/// Primary tagger decision with its confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredLabel {
    pub boundary: bool,
    pub confidence: f64,
}

/// Boundary budget for smart combination: the training boundary rate
/// applied to the hypothesis length.
pub fn smart_budget(training: &[bool], hypothesis_length: usize) -> usize {
    if training.is_empty() {
        return 0;
    }
    let boundaries = training.iter().filter(|b| **b).count();
    (boundaries as f64 * hypothesis_length as f64 / training.len() as f64).floor() as usize
}

/// Merges a confidence-scored primary sequence with a secondary boolean
/// sequence. Secondary boundaries score 1.0, primary boundaries score their
/// confidence. Candidates scoring at least `min_confidence` are ranked by
/// score, ties kept in sequence order, and the best `max_boundaries` (all
/// when `None`) become boundaries.
pub fn combine(
    primary: &[ScoredLabel],
    secondary: &[bool],
    max_boundaries: Option<usize>,
    min_confidence: f64,
) -> PipelineResult<Vec<bool>> {
    if primary.len() != secondary.len() {
        return Err(PipelineError::LengthMismatch {
            reference: secondary.len(),
            hypothesis: primary.len(),
        });
    }

    let mut candidates: Vec<(usize, f64)> = primary
        .iter()
        .zip(secondary)
        .enumerate()
        .filter_map(|(index, (label, marked))| {
            let score = if *marked {
                1.0
            } else if label.boundary {
                label.confidence
            } else {
                0.0
            };
            (score > 0.0 && score >= min_confidence).then_some((index, score))
        })
        .collect();
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

    let keep = max_boundaries.unwrap_or(candidates.len());
    let mut combined = vec![false; primary.len()];
    for (index, _) in candidates.into_iter().take(keep) {
        combined[index] = true;
    }
    Ok(combined)
}
