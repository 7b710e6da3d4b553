mod baseline;
mod combine;
mod folds;
mod metrics;
mod report;

pub use combine::{DEFAULT_MIN_CONFIDENCE, combine, smart_budget};
pub use folds::{Fold, split};
pub use metrics::SegmentationScores;
pub use report::{
    EvaluationReport, FoldInputs, MeanEvaluation, evaluate_fold, read_boundaries, read_scored,
    render_table,
};
