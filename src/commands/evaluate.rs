use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::Utc;
use tracing::info;

use crate::cli::EvaluateArgs;
use crate::corpus::BOUNDARY;
use crate::error::PipelineError;
use crate::evaluation::{
    EvaluationReport, FoldInputs, MeanEvaluation, combine, evaluate_fold, read_boundaries,
    read_scored, render_table, smart_budget,
};
use crate::model::{ExperimentLayout, FoldFiles, LAYOUT_FILE};
use crate::store::{DEFAULT_LEDGER_FILE, ExperimentRecord, ExperimentStore};
use crate::util::{ensure_writable, now_utc_string, read_json, write_json_pretty};

pub fn run(args: EvaluateArgs) -> Result<()> {
    let layout: ExperimentLayout = read_json(&args.experiment_dir.join(LAYOUT_FILE))?;
    let secondary = args
        .combine_with
        .as_ref()
        .map(|dir| read_json::<ExperimentLayout>(&dir.join(LAYOUT_FILE)).map(|l| (dir, l)))
        .transpose()?;

    let report_path = args.report_path.clone().unwrap_or_else(|| {
        let file = if secondary.is_some() {
            "evaluation_combined.json"
        } else {
            "evaluation.json"
        };
        args.experiment_dir.join(file)
    });
    let ledger_path = args
        .ledger_path
        .clone()
        .unwrap_or_else(|| default_ledger_path(&args.experiment_dir));
    ensure_writable(&report_path)?;
    ensure_writable(&ledger_path)?;

    if layout.files.is_empty() {
        bail!("experiment {} has no folds to evaluate", layout.name);
    }

    let mut folds = Vec::with_capacity(layout.files.len());
    for files in &layout.files {
        let secondary_files = match &secondary {
            Some((dir, other)) => {
                let Some(other_files) = other.files.iter().find(|f| f.index == files.index) else {
                    bail!("{} has no fold {}", dir.display(), files.index);
                };
                Some(dir.join(&other_files.result))
            }
            None => None,
        };
        let inputs = fold_inputs(&args, &layout, files, secondary_files.as_deref())?;
        let evaluation = evaluate_fold(files.index, &inputs)?;
        info!(
            fold = files.index,
            lines = evaluation.reference_length,
            boundaries = evaluation.reference_boundaries,
            window_diff = evaluation.hypothesis.window_diff,
            naive_window_diff = evaluation.naive.window_diff,
            "fold evaluated"
        );
        folds.push(evaluation);
    }

    let experiment = match &secondary {
        Some((_, other)) => format!("{}+{}", layout.name, other.name),
        None => layout.name.clone(),
    };
    let report = EvaluationReport {
        experiment: experiment.clone(),
        generated_at: now_utc_string(),
        combined: secondary.is_some(),
        mean: MeanEvaluation::of(&folds),
        folds,
    };

    if let Some(mean) = &report.mean {
        info!("mean scores for {experiment}\n{}", render_table(mean));
    }
    write_json_pretty(&report_path, &report)?;

    let mut store = ExperimentStore::open(&ledger_path)?;
    let families = layout.families.describe();
    store.record_evaluation(
        &ExperimentRecord {
            experiment_id: &experiment,
            directory: &args.experiment_dir,
            families: &families,
            evaluated_at: Utc::now(),
        },
        &report,
    )?;

    info!(
        experiment = %experiment,
        folds = report.folds.len(),
        report = %report_path.display(),
        ledger = %ledger_path.display(),
        "evaluation completed"
    );
    Ok(())
}

fn fold_inputs(
    args: &EvaluateArgs,
    layout: &ExperimentLayout,
    files: &FoldFiles,
    secondary_result: Option<&Path>,
) -> Result<FoldInputs> {
    let gold = args.experiment_dir.join(&files.gold);
    let reference = read_boundaries(&gold, 1, args.limit)?;
    let thematic = if layout.has_thematic_column() {
        Some(read_boundaries(&gold, 2, args.limit)?)
    } else {
        None
    };
    let training = read_training_labels(&args.experiment_dir.join(&files.train_labels))?;

    let scored = read_scored(&args.experiment_dir.join(&files.result), args.limit)?;
    let hypothesis = match secondary_result {
        Some(path) => {
            let secondary = read_boundaries(path, 1, args.limit)?;
            let budget = args
                .smart_combine
                .then(|| smart_budget(&training, scored.len()));
            combine(&scored, &secondary, budget, args.min_confidence)?
        }
        None => scored.iter().map(|label| label.boundary).collect(),
    };

    Ok(FoldInputs {
        reference,
        hypothesis,
        training,
        thematic,
    })
}

/// One boundary string per training document, concatenated.
fn read_training_labels(path: &Path) -> Result<Vec<bool>> {
    let raw = fs::read_to_string(path).map_err(|source| PipelineError::FileUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(raw
        .lines()
        .flat_map(|line| line.trim().chars())
        .map(|symbol| symbol.to_string() == BOUNDARY)
        .collect())
}

/// The ledger sits next to the experiment directories.
pub(crate) fn default_ledger_path(experiment_dir: &Path) -> PathBuf {
    experiment_dir
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(|parent| parent.join(DEFAULT_LEDGER_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_FILE))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use super::{default_ledger_path, read_training_labels};

    #[test]
    fn training_labels_concatenate_documents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("train_labels.txt");
        fs::write(&path, "TFF\nTF\n").expect("write labels");
        let labels = read_training_labels(&path).expect("read labels");
        assert_eq!(labels, vec![true, false, false, true, false]);
    }

    #[test]
    fn ledger_defaults_to_experiments_root() {
        assert_eq!(
            default_ledger_path(Path::new("experiments/run-a")),
            PathBuf::from("experiments/experiments.sqlite")
        );
        assert_eq!(
            default_ledger_path(Path::new("run-a")),
            PathBuf::from("experiments.sqlite")
        );
    }
}
