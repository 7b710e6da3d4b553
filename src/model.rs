use serde::{Deserialize, Serialize};

use crate::evaluation::Fold;
use crate::features::{FamilySet, LexicalMode};
use crate::tfidf::Selection;

pub const LAYOUT_FILE: &str = "layout.json";

/// Files of one fold, relative to the experiment directory. `train_labels`
/// holds the unthinned boundary string of each training document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldFiles {
    pub index: usize,
    pub train_documents: usize,
    pub test_documents: usize,
    pub train: String,
    pub train_labels: String,
    pub test: String,
    pub gold: String,
    pub origin: String,
    pub patterns: String,
    pub model: String,
    pub result: String,
    pub ngrams: String,
    pub train_arff: Option<String>,
    pub test_arff: Option<String>,
}

impl FoldFiles {
    pub fn for_fold(index: usize, arff: bool) -> Self {
        let name = |stem: &str, ext: &str| format!("fold_{index}/{stem}.{ext}");
        Self {
            index,
            train_documents: 0,
            test_documents: 0,
            train: name("train", "tsv"),
            train_labels: name("train_labels", "txt"),
            test: name("test", "tsv"),
            gold: name("gold", "tsv"),
            origin: name("origin", "tsv"),
            patterns: name("patterns", "txt"),
            model: name("model", "wapiti"),
            result: name("result", "tsv"),
            ngrams: name("ngrams", "txt"),
            train_arff: arff.then(|| name("train", "arff")),
            test_arff: arff.then(|| name("test", "arff")),
        }
    }
}

/// Manifest written by `build` and read by `tag` and `evaluate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentLayout {
    pub manifest_version: u32,
    pub name: String,
    pub created_at: String,
    pub corpus_dir: String,
    pub families: FamilySet,
    pub lexical_mode: LexicalMode,
    pub selection: Selection,
    pub imposed_ngrams: Option<String>,
    pub window: usize,
    pub columns: Vec<String>,
    pub folds: Vec<Fold>,
    pub files: Vec<FoldFiles>,
}

impl ExperimentLayout {
    pub fn has_thematic_column(&self) -> bool {
        self.families.thematic
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildPaths {
    pub corpus_dir: String,
    pub experiment_dir: String,
    pub layout_path: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildCounts {
    pub documents: usize,
    pub lines: usize,
    pub folds: usize,
    pub train_instances: usize,
    pub test_instances: usize,
    pub selected_ngrams: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub paths: BuildPaths,
    pub counts: BuildCounts,
    pub warnings: Vec<String>,
}
