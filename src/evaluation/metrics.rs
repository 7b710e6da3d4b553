use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

pub const GHD_INSERTION_COST: f64 = 2.0;
pub const GHD_DELETION_COST: f64 = 2.0;
pub const GHD_SHIFT_COEFFICIENT: f64 = 1.0;

fn ensure_same_length(reference: &[bool], hypothesis: &[bool]) -> PipelineResult<()> {
    if reference.len() != hypothesis.len() {
        return Err(PipelineError::LengthMismatch {
            reference: reference.len(),
            hypothesis: hypothesis.len(),
        });
    }
    Ok(())
}

fn boundaries(sequence: &[bool]) -> usize {
    sequence.iter().filter(|boundary| **boundary).count()
}

/// Average reference segment length, `len / (boundaries + 1)`.
pub fn average_segment_length(sequence: &[bool]) -> f64 {
    sequence.len() as f64 / (boundaries(sequence) + 1) as f64
}

/// WindowDiff window: half the average reference segment, at least 1.
pub fn window_size(reference: &[bool]) -> usize {
    ((average_segment_length(reference) / 2.0).floor() as usize).max(1)
}

/// Share of windows whose boundary counts differ, over the reference length.
pub fn window_diff(reference: &[bool], hypothesis: &[bool], k: usize) -> PipelineResult<f64> {
    ensure_same_length(reference, hypothesis)?;
    let k = k.max(1);
    if reference.is_empty() || k > reference.len() {
        return Ok(0.0);
    }

    let differing = reference
        .windows(k)
        .zip(hypothesis.windows(k))
        .filter(|(r, h)| boundaries(r) != boundaries(h))
        .count();
    Ok(differing as f64 / reference.len() as f64)
}

/// Default Pk window: half the average segment length, rounded.
pub fn pk_window(reference: &[bool]) -> usize {
    let count = boundaries(reference);
    let k = if count == 0 {
        reference.len() as f64 / 2.0
    } else {
        (reference.len() as f64 / (2.0 * count as f64)).round()
    };
    (k as usize).max(1)
}

/// Probability that a window disagrees on containing a boundary.
pub fn pk(reference: &[bool], hypothesis: &[bool], k: Option<usize>) -> PipelineResult<f64> {
    ensure_same_length(reference, hypothesis)?;
    let k = k.unwrap_or_else(|| pk_window(reference)).max(1);
    if reference.is_empty() || k > reference.len() {
        return Ok(0.0);
    }

    let windows = reference.len() - k + 1;
    let errors = reference
        .windows(k)
        .zip(hypothesis.windows(k))
        .filter(|(r, h)| r.contains(&true) != h.contains(&true))
        .count();
    Ok(errors as f64 / windows as f64)
}

/// Generalized Hamming distance, normalized by the reference length.
pub fn ghd(reference: &[bool], hypothesis: &[bool]) -> PipelineResult<f64> {
    ensure_same_length(reference, hypothesis)?;
    if reference.is_empty() {
        return Ok(0.0);
    }
    Ok(raw_ghd(reference, hypothesis) / reference.len() as f64)
}

fn raw_ghd(reference: &[bool], hypothesis: &[bool]) -> f64 {
    let positions = |sequence: &[bool]| -> Vec<usize> {
        sequence
            .iter()
            .enumerate()
            .filter_map(|(index, boundary)| boundary.then_some(index))
            .collect()
    };
    let ref_idx = positions(reference);
    let hyp_idx = positions(hypothesis);

    match (ref_idx.len(), hyp_idx.len()) {
        (0, 0) => return 0.0,
        (n, 0) => return n as f64 * GHD_INSERTION_COST,
        (0, n) => return n as f64 * GHD_DELETION_COST,
        _ => {}
    }

    let cols = ref_idx.len() + 1;
    let mut mat = vec![vec![0.0_f64; cols]; hyp_idx.len() + 1];
    for (j, cell) in mat[0].iter_mut().enumerate() {
        *cell = GHD_INSERTION_COST * j as f64;
    }
    for (i, row) in mat.iter_mut().enumerate() {
        row[0] = GHD_DELETION_COST * i as f64;
    }

    for (i, &row_pos) in hyp_idx.iter().enumerate() {
        for (j, &col_pos) in ref_idx.iter().enumerate() {
            let shift = GHD_SHIFT_COEFFICIENT * row_pos.abs_diff(col_pos) as f64 + mat[i][j];
            let transition = if row_pos == col_pos {
                mat[i][j]
            } else if row_pos > col_pos {
                GHD_DELETION_COST + mat[i][j + 1]
            } else {
                GHD_INSERTION_COST + mat[i + 1][j]
            };
            mat[i + 1][j + 1] = transition.min(shift);
        }
    }

    mat[hyp_idx.len()][ref_idx.len()]
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Confusion {
    pub true_positive: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_negative: usize,
}

impl Confusion {
    pub fn of(reference: &[bool], hypothesis: &[bool]) -> PipelineResult<Self> {
        ensure_same_length(reference, hypothesis)?;
        let mut confusion = Self::default();
        for (r, h) in reference.iter().zip(hypothesis) {
            match (r, h) {
                (true, true) => confusion.true_positive += 1,
                (false, true) => confusion.false_positive += 1,
                (true, false) => confusion.false_negative += 1,
                (false, false) => confusion.true_negative += 1,
            }
        }
        Ok(confusion)
    }

    fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.false_negative + self.true_negative
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.true_positive + self.true_negative) as f64 / total as f64
    }

    pub fn precision(&self) -> Option<f64> {
        let predicted = self.true_positive + self.false_positive;
        (predicted > 0).then(|| self.true_positive as f64 / predicted as f64)
    }

    pub fn recall(&self) -> Option<f64> {
        let actual = self.true_positive + self.false_negative;
        (actual > 0).then(|| self.true_positive as f64 / actual as f64)
    }

    pub fn f1(&self) -> Option<f64> {
        let precision = self.precision()?;
        let recall = self.recall()?;
        let sum = precision + recall;
        (sum > 0.0).then(|| 2.0 * precision * recall / sum)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationScores {
    pub window_diff: f64,
    pub pk: f64,
    pub ghd: f64,
    pub accuracy: f64,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1: Option<f64>,
    /// Boundaries in the scored hypothesis.
    pub boundaries: f64,
}

impl SegmentationScores {
    pub fn compute(reference: &[bool], hypothesis: &[bool]) -> PipelineResult<Self> {
        let confusion = Confusion::of(reference, hypothesis)?;
        Ok(Self {
            window_diff: window_diff(reference, hypothesis, window_size(reference))?,
            pk: pk(reference, hypothesis, None)?,
            ghd: ghd(reference, hypothesis)?,
            accuracy: confusion.accuracy(),
            precision: confusion.precision(),
            recall: confusion.recall(),
            f1: confusion.f1(),
            boundaries: boundaries(hypothesis) as f64,
        })
    }

    /// Field-wise arithmetic mean. Optional fields average over the folds
    /// where they are defined.
    pub fn mean<'a>(scores: impl IntoIterator<Item = &'a SegmentationScores>) -> Option<Self> {
        let scores: Vec<&SegmentationScores> = scores.into_iter().collect();
        if scores.is_empty() {
            return None;
        }
        let n = scores.len() as f64;
        let mean = |field: fn(&SegmentationScores) -> f64| {
            scores.iter().map(|s| field(s)).sum::<f64>() / n
        };
        let mean_defined = |field: fn(&SegmentationScores) -> Option<f64>| {
            let defined: Vec<f64> = scores.iter().filter_map(|s| field(s)).collect();
            (!defined.is_empty()).then(|| defined.iter().sum::<f64>() / defined.len() as f64)
        };

        Some(Self {
            window_diff: mean(|s| s.window_diff),
            pk: mean(|s| s.pk),
            ghd: mean(|s| s.ghd),
            accuracy: mean(|s| s.accuracy),
            precision: mean_defined(|s| s.precision),
            recall: mean_defined(|s| s.recall),
            f1: mean_defined(|s| s.f1),
            boundaries: mean(|s| s.boundaries),
        })
    }
}
