use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::baseline::{baseline_period, naive_baseline};
use super::combine::ScoredLabel;
use super::metrics::SegmentationScores;
use crate::corpus::COMMENT_MARKER;
use crate::error::{PipelineError, PipelineResult};

/// Sequence score lines written by the engine, `# <score>...`. Data rows
/// never start with `#` because the tagger writer escapes it.
fn is_score_line(row: &str) -> bool {
    let Some(rest) = row.strip_prefix(COMMENT_MARKER) else {
        return false;
    };
    let mut fields = rest.split_whitespace().peekable();
    fields.peek().is_some() && fields.all(|field| field.parse::<f64>().is_ok())
}

/// Reads one label per non-empty row of a tagger file, taking the column
/// `from_end` places from the end (1 is the last column). Engine score lines
/// are skipped. At most `limit` labels are read.
pub fn read_label_column(
    path: &Path,
    from_end: usize,
    limit: Option<usize>,
) -> PipelineResult<Vec<String>> {
    let raw = fs::read_to_string(path).map_err(|source| PipelineError::FileUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let mut labels = Vec::new();
    for (index, row) in raw.lines().enumerate() {
        if limit.is_some_and(|limit| labels.len() >= limit) {
            break;
        }
        let row = row.trim();
        if row.is_empty() || is_score_line(row) {
            continue;
        }
        let columns: Vec<&str> = row.split_whitespace().collect();
        let Some(column) = columns.len().checked_sub(from_end.max(1)) else {
            return Err(PipelineError::MalformedLine {
                path: path.to_path_buf(),
                line_number: index + 1,
                reason: format!("expected at least {from_end} columns, found {}", columns.len()),
            });
        };
        labels.push(columns[column].to_string());
    }
    Ok(labels)
}

/// `T` and `S` mark boundaries, `F` and `O` do not. A `/confidence` suffix
/// is ignored.
pub fn parse_boundary(symbol: &str) -> Option<bool> {
    let label = symbol.split('/').next().unwrap_or(symbol);
    match label {
        "T" | "S" => Some(true),
        "F" | "O" => Some(false),
        _ => None,
    }
}

/// Parses `LABEL` or `LABEL/confidence`; a bare label has confidence 1.
pub fn parse_scored(symbol: &str) -> Option<ScoredLabel> {
    let boundary = parse_boundary(symbol)?;
    let confidence = match symbol.split_once('/') {
        Some((_, score)) => score.parse::<f64>().ok()?,
        None => 1.0,
    };
    Some(ScoredLabel {
        boundary,
        confidence,
    })
}

pub fn read_boundaries(path: &Path, from_end: usize, limit: Option<usize>) -> PipelineResult<Vec<bool>> {
    read_label_column(path, from_end, limit)?
        .iter()
        .enumerate()
        .map(|(index, symbol)| {
            parse_boundary(symbol).ok_or_else(|| PipelineError::MalformedLine {
                path: path.to_path_buf(),
                line_number: index + 1,
                reason: format!("unknown boundary label `{symbol}`"),
            })
        })
        .collect()
}

pub fn read_scored(path: &Path, limit: Option<usize>) -> PipelineResult<Vec<ScoredLabel>> {
    read_label_column(path, 1, limit)?
        .iter()
        .enumerate()
        .map(|(index, symbol)| {
            parse_scored(symbol).ok_or_else(|| PipelineError::MalformedLine {
                path: path.to_path_buf(),
                line_number: index + 1,
                reason: format!("unparsable scored label `{symbol}`"),
            })
        })
        .collect()
}

/// Label sequences of one fold.
#[derive(Debug, Clone, Default)]
pub struct FoldInputs {
    pub reference: Vec<bool>,
    pub hypothesis: Vec<bool>,
    pub training: Vec<bool>,
    pub thematic: Option<Vec<bool>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldEvaluation {
    pub fold: usize,
    pub reference_length: usize,
    pub reference_boundaries: usize,
    pub hypothesis: SegmentationScores,
    pub naive: SegmentationScores,
    pub thematic: Option<SegmentationScores>,
}

pub fn evaluate_fold(fold: usize, inputs: &FoldInputs) -> PipelineResult<FoldEvaluation> {
    let reference = &inputs.reference;
    let naive = naive_baseline(reference.len(), baseline_period(&inputs.training));

    Ok(FoldEvaluation {
        fold,
        reference_length: reference.len(),
        reference_boundaries: reference.iter().filter(|b| **b).count(),
        hypothesis: SegmentationScores::compute(reference, &inputs.hypothesis)?,
        naive: SegmentationScores::compute(reference, &naive)?,
        thematic: inputs
            .thematic
            .as_ref()
            .map(|thematic| SegmentationScores::compute(reference, thematic))
            .transpose()?,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanEvaluation {
    pub reference_boundaries: f64,
    pub hypothesis: SegmentationScores,
    pub naive: SegmentationScores,
    pub thematic: Option<SegmentationScores>,
}

impl MeanEvaluation {
    pub fn of(folds: &[FoldEvaluation]) -> Option<Self> {
        if folds.is_empty() {
            return None;
        }
        let reference_boundaries = folds
            .iter()
            .map(|fold| fold.reference_boundaries as f64)
            .sum::<f64>()
            / folds.len() as f64;

        Some(Self {
            reference_boundaries,
            hypothesis: SegmentationScores::mean(folds.iter().map(|fold| &fold.hypothesis))?,
            naive: SegmentationScores::mean(folds.iter().map(|fold| &fold.naive))?,
            thematic: SegmentationScores::mean(folds.iter().filter_map(|fold| fold.thematic.as_ref())),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub experiment: String,
    pub generated_at: String,
    pub combined: bool,
    pub folds: Vec<FoldEvaluation>,
    pub mean: Option<MeanEvaluation>,
}

fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn optional_percent(value: Option<f64>) -> String {
    value.map(percent).unwrap_or_else(|| "n/a".to_string())
}

fn difference(a: Option<f64>, b: Option<f64>) -> String {
    match (a, b) {
        (Some(a), Some(b)) => percent(a - b),
        _ => "n/a".to_string(),
    }
}

/// Human-readable table of the mean scores: hypothesis, naive baseline and
/// thematic baseline, with differences against each baseline.
pub fn render_table(mean: &MeanEvaluation) -> String {
    type Field = fn(&SegmentationScores) -> Option<f64>;
    let rows: [(&str, Field); 7] = [
        ("WindowDiff", |s| Some(s.window_diff)),
        ("Pk", |s| Some(s.pk)),
        ("GHD", |s| Some(s.ghd)),
        ("accuracy", |s| Some(s.accuracy)),
        ("precision", |s| s.precision),
        ("recall", |s| s.recall),
        ("F1", |s| s.f1),
    ];

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<14}{:>10}{:>10}{:>10}{:>10}{:>10}",
        "", "result", "naive", "diff", "thematic", "diff"
    );
    for (name, field) in rows {
        let result = field(&mean.hypothesis);
        let naive = field(&mean.naive);
        let thematic = mean.thematic.as_ref().and_then(field);
        let _ = writeln!(
            out,
            "{:<14}{:>10}{:>10}{:>10}{:>10}{:>10}",
            name,
            optional_percent(result),
            optional_percent(naive),
            difference(result, naive),
            optional_percent(thematic),
            difference(result, thematic),
        );
    }

    let ratio = |boundaries: f64| {
        (mean.reference_boundaries > 0.0).then(|| boundaries / mean.reference_boundaries)
    };
    let _ = writeln!(
        out,
        "{:<14}{:>10}{:>10}{:>10}{:>10}",
        "seg. ratio",
        optional_percent(ratio(mean.hypothesis.boundaries)),
        optional_percent(ratio(mean.naive.boundaries)),
        "",
        optional_percent(mean.thematic.as_ref().and_then(|t| ratio(t.boundaries))),
    );
    out
}
