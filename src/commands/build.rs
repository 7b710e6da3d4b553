use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rayon::ThreadPoolBuilder;
use tracing::{info, warn};

use crate::cli::BuildArgs;
use crate::corpus::{Document, load_corpus};
use crate::dataset::{
    BlockKind, Dataset, assemble, document_labels, extract_family, write_arff, write_patterns,
    write_tagger_file,
};
use crate::evaluation::split;
use crate::features::{FamilySet, FeatureExtractor, LexiconTagger, Statistics};
use crate::model::{
    BuildCounts, BuildPaths, BuildRunManifest, ExperimentLayout, FoldFiles, LAYOUT_FILE,
};
use crate::tfidf::{TfIdfSelector, read_ngram_file, write_ngram_file};
use crate::util::{ensure_directory, now_utc_string, utc_compact_string, write_json_pretty};

const LAYOUT_MANIFEST_VERSION: u32 = 1;
const BUILD_MANIFEST_VERSION: u32 = 1;

pub fn run(args: BuildArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("build-{}", utc_compact_string(started_ts));

    let experiment_dir = args.experiment_dir.clone();
    let manifest_dir = experiment_dir.join("manifests");
    ensure_directory(&manifest_dir)?;

    let families = FamilySet::from_selection(&args.families);
    let imposed = args
        .ngram_file
        .as_deref()
        .map(read_ngram_file)
        .transpose()?;
    if imposed.is_some() && !families.lexical {
        warn!("n-gram file given but the lexical family is disabled; ignoring it");
    }

    let corpus = load_corpus(&args.corpus.corpus_dir, &args.corpus.load_options())?;
    if corpus.is_empty() {
        bail!(
            "no documents selected from {}",
            args.corpus.corpus_dir.display()
        );
    }

    info!(
        run_id = %run_id,
        documents = corpus.len(),
        lines = corpus.line_count(),
        folds = args.folds,
        families = %families.describe(),
        "build started"
    );

    let pool = ThreadPoolBuilder::new()
        .num_threads(args.jobs.unwrap_or(0))
        .build()
        .context("failed to build extraction thread pool")?;
    let tagger = LexiconTagger::new()?;
    let selector = TfIdfSelector::new(args.selection.max_n);
    let selection = args.selection.selection();
    let thin_training = !args.keep_interior;

    let folds = split(corpus.len(), args.folds);
    let mut counts = BuildCounts {
        documents: corpus.len(),
        lines: corpus.line_count(),
        folds: folds.len(),
        ..BuildCounts::default()
    };
    let mut warnings = Vec::new();
    let mut files = Vec::with_capacity(folds.len());
    let mut columns = Vec::new();

    for fold in &folds {
        let train_documents = corpus.select(&fold.train);
        let test_documents = corpus.select(&fold.test);
        if train_documents.is_empty() && test_documents.is_empty() {
            warnings.push(format!("fold {} is empty; nothing written", fold.index));
            continue;
        }
        if train_documents.is_empty() || test_documents.is_empty() {
            warnings.push(format!(
                "fold {} has {} training and {} test documents",
                fold.index,
                train_documents.len(),
                test_documents.len()
            ));
        }

        let training_lines = || {
            train_documents
                .iter()
                .flat_map(|document| document.lines.iter())
        };
        let statistics = Statistics::from_training(training_lines(), args.occurrence_quotient);
        let ngrams = match (&imposed, families.lexical) {
            (_, false) => Vec::new(),
            (Some(terms), true) => selector.impose(terms, training_lines()),
            (None, true) => selector.select(training_lines(), selection),
        };
        counts.selected_ngrams = counts.selected_ngrams.max(ngrams.len());

        let extractor =
            FeatureExtractor::new(&statistics, &ngrams, args.lexical_mode, &tagger, families);
        let (train, test) = pool.install(|| -> Result<(Dataset, Dataset)> {
            let train = build_dataset(&extractor, &train_documents, thin_training)?;
            let test = build_dataset(&extractor, &test_documents, false)?;
            Ok((train, test))
        })?;

        let mut fold_files = FoldFiles::for_fold(fold.index, args.arff);
        fold_files.train_documents = train_documents.len();
        fold_files.test_documents = test_documents.len();
        ensure_directory(&experiment_dir.join(format!("fold_{}", fold.index)))?;

        let train_rows = write_tagger_file(
            &experiment_dir.join(&fold_files.train),
            &train,
            BlockKind::Labeled,
        )?;
        let test_rows = write_tagger_file(
            &experiment_dir.join(&fold_files.test),
            &test,
            BlockKind::Unlabeled,
        )?;
        write_tagger_file(&experiment_dir.join(&fold_files.gold), &test, BlockKind::Labeled)?;
        write_tagger_file(&experiment_dir.join(&fold_files.origin), &test, BlockKind::Origin)?;
        write_training_labels(&experiment_dir.join(&fold_files.train_labels), &train_documents)?;
        write_patterns(&experiment_dir.join(&fold_files.patterns), &train.schema, args.window)?;
        write_ngram_file(&experiment_dir.join(&fold_files.ngrams), &ngrams)?;

        if let (Some(train_arff), Some(test_arff)) = (&fold_files.train_arff, &fold_files.test_arff)
        {
            let relation = format!("mailseg_fold_{}", fold.index);
            write_arff(&experiment_dir.join(train_arff), &train, &relation, true)?;
            write_arff(&experiment_dir.join(test_arff), &test, &relation, false)?;
        }

        if columns.is_empty() {
            columns = extractor.schema().into_iter().map(|attribute| attribute.name).collect();
        }
        counts.train_instances += train_rows;
        counts.test_instances += test_rows;

        info!(
            fold = fold.index,
            train_documents = fold_files.train_documents,
            test_documents = fold_files.test_documents,
            train_rows,
            test_rows,
            ngrams = ngrams.len(),
            "fold written"
        );
        files.push(fold_files);
    }

    if files.is_empty() {
        warnings.push("no fold produced datasets".to_string());
    }

    let layout = ExperimentLayout {
        manifest_version: LAYOUT_MANIFEST_VERSION,
        name: experiment_name(&experiment_dir),
        created_at: started_at.clone(),
        corpus_dir: args.corpus.corpus_dir.display().to_string(),
        families,
        lexical_mode: args.lexical_mode,
        selection,
        imposed_ngrams: args.ngram_file.as_ref().map(|path| path.display().to_string()),
        window: args.window,
        columns,
        folds: folds.clone(),
        files,
    };
    let layout_path = experiment_dir.join(LAYOUT_FILE);
    write_json_pretty(&layout_path, &layout)?;

    for warning in &warnings {
        warn!(warning = %warning, "build warning");
    }

    let manifest = BuildRunManifest {
        manifest_version: BUILD_MANIFEST_VERSION,
        run_id: run_id.clone(),
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: "build".to_string(),
        paths: BuildPaths {
            corpus_dir: args.corpus.corpus_dir.display().to_string(),
            experiment_dir: experiment_dir.display().to_string(),
            layout_path: layout_path.display().to_string(),
        },
        counts: counts.clone(),
        warnings,
    };
    let manifest_path = manifest_dir.join(format!(
        "build_run_{}.json",
        utc_compact_string(started_ts)
    ));
    write_json_pretty(&manifest_path, &manifest)?;

    info!(
        run_id = %run_id,
        folds = counts.folds,
        train_instances = counts.train_instances,
        test_instances = counts.test_instances,
        layout = %layout_path.display(),
        manifest = %manifest_path.display(),
        "build completed"
    );
    Ok(())
}

fn build_dataset(
    extractor: &FeatureExtractor<'_>,
    documents: &[&Document],
    thin_interior: bool,
) -> Result<Dataset> {
    let labels = document_labels(documents, thin_interior);
    let rows = extractor
        .families()
        .enabled()
        .into_iter()
        .map(|family| extract_family(extractor, family, documents, thin_interior))
        .collect();
    Ok(assemble(labels, rows)?)
}

fn write_training_labels(path: &Path, documents: &[&Document]) -> Result<()> {
    let mut body = String::new();
    for document in documents {
        body.push_str(&document.boundary_string());
        body.push('\n');
    }
    fs::write(path, body)
        .with_context(|| format!("failed to write training labels: {}", path.display()))
}

fn experiment_name(experiment_dir: &Path) -> String {
    experiment_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| experiment_dir.display().to_string())
}
