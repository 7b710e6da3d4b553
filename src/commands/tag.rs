use std::path::Path;

use anyhow::{Result, bail};
use tracing::info;

use crate::cli::TagArgs;
use crate::engine::{SequenceTagger, WapitiEngine};
use crate::model::{ExperimentLayout, FoldFiles, LAYOUT_FILE};
use crate::util::read_json;

pub fn run(args: TagArgs) -> Result<()> {
    let layout: ExperimentLayout = read_json(&args.experiment_dir.join(LAYOUT_FILE))?;
    let engine = WapitiEngine::new(&args.engine_bin);

    let selected: Vec<&FoldFiles> = layout
        .files
        .iter()
        .filter(|files| args.fold.is_none_or(|fold| fold == files.index))
        .collect();
    if selected.is_empty() {
        bail!(
            "no fold to tag in {} (requested {:?})",
            args.experiment_dir.display(),
            args.fold
        );
    }

    for files in &selected {
        tag_fold(&engine, &args.experiment_dir, files)?;
    }

    info!(
        experiment = %layout.name,
        engine = %engine.binary().display(),
        folds = selected.len(),
        "tagging completed"
    );
    Ok(())
}

/// Trains on the fold's training file and labels its test file.
pub fn tag_fold(
    tagger: &dyn SequenceTagger,
    experiment_dir: &Path,
    files: &FoldFiles,
) -> Result<()> {
    let patterns = experiment_dir.join(&files.patterns);
    let train = experiment_dir.join(&files.train);
    let model = experiment_dir.join(&files.model);
    let test = experiment_dir.join(&files.test);
    let result = experiment_dir.join(&files.result);

    tagger.train(&patterns, &train, &model)?;
    tagger.label(&model, &test, &result)?;
    info!(fold = files.index, result = %result.display(), "fold tagged");
    Ok(())
}
