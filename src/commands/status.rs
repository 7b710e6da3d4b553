use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::{ExperimentLayout, LAYOUT_FILE};
use crate::store::{DEFAULT_LEDGER_FILE, ExperimentStore};
use crate::util::read_json;

pub fn run(args: StatusArgs) -> Result<()> {
    let ledger_path = args
        .ledger_path
        .clone()
        .unwrap_or_else(|| args.experiments_root.join(DEFAULT_LEDGER_FILE));

    info!(experiments_root = %args.experiments_root.display(), "status requested");

    if args.experiments_root.is_dir() {
        let layouts = discover_layouts(&args.experiments_root)?;
        if layouts.is_empty() {
            warn!(path = %args.experiments_root.display(), "no built experiments found");
        }
        for path in layouts {
            let layout: ExperimentLayout = read_json(&path)?;
            let documents = layout
                .files
                .first()
                .map(|files| files.train_documents + files.test_documents)
                .unwrap_or(0);
            info!(
                name = %layout.name,
                created_at = %layout.created_at,
                families = %layout.families.describe(),
                lexical_mode = ?layout.lexical_mode,
                folds = layout.files.len(),
                columns = layout.columns.len(),
                documents,
                "built experiment"
            );
        }
    } else {
        warn!(path = %args.experiments_root.display(), "experiments root missing");
    }

    if ledger_path.exists() {
        let store = ExperimentStore::open(&ledger_path)?;
        let experiments = store.list_experiments()?;
        info!(
            path = %ledger_path.display(),
            schema_version = %store.schema_version()?.unwrap_or_default(),
            experiments = experiments.len(),
            "ledger status"
        );
        for experiment in experiments {
            let scores = store.fold_scores(&experiment.experiment_id)?;
            let systems = scores
                .iter()
                .map(|stored| stored.system.as_str())
                .collect::<BTreeSet<_>>();
            info!(
                experiment = %experiment.experiment_id,
                name = %experiment.name,
                directory = %experiment.directory,
                families = %experiment.families,
                folds = experiment.folds,
                combined = experiment.combined,
                evaluated_at = %experiment.evaluated_at.to_rfc3339(),
                mean_window_diff = ?experiment.mean_window_diff,
                scored_rows = scores.len(),
                systems = ?systems,
                "evaluated experiment"
            );
        }
    } else {
        warn!(path = %ledger_path.display(), "ledger missing");
    }

    Ok(())
}

/// Layout manifests of the immediate subdirectories of `root`, sorted by path.
fn discover_layouts(root: &Path) -> Result<Vec<PathBuf>> {
    let mut layouts = Vec::new();
    for entry in
        fs::read_dir(root).with_context(|| format!("failed to read {}", root.display()))?
    {
        let entry = entry.with_context(|| format!("failed to read {}", root.display()))?;
        let candidate = entry.path().join(LAYOUT_FILE);
        if candidate.is_file() {
            layouts.push(candidate);
        }
    }
    layouts.sort();
    Ok(layouts)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::discover_layouts;

    #[test]
    fn finds_layouts_one_level_down() {
        let root = tempfile::tempdir().expect("tempdir");
        for name in ["b", "a", "empty"] {
            fs::create_dir_all(root.path().join(name)).expect("mkdir");
        }
        fs::write(root.path().join("a/layout.json"), "{}").expect("write a");
        fs::write(root.path().join("b/layout.json"), "{}").expect("write b");
        fs::write(root.path().join("experiments.sqlite"), "").expect("write ledger");

        let found = discover_layouts(root.path()).expect("discover");
        assert_eq!(found.len(), 2);
        assert!(found[0].ends_with("a/layout.json"));
        assert!(found[1].ends_with("b/layout.json"));
    }
}
