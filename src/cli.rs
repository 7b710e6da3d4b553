use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::corpus::LoadOptions;
use crate::evaluation::DEFAULT_MIN_CONFIDENCE;
use crate::features::{FeatureFamily, LexicalMode};
use crate::tfidf::Selection;

#[derive(Parser, Debug)]
#[command(
    name = "mailseg",
    version,
    about = "Email line segmentation datasets and cross-validated evaluation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    SelectNgrams(SelectNgramsArgs),
    Build(BuildArgs),
    Tag(TagArgs),
    Evaluate(EvaluateArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CorpusArgs {
    /// Directory of line-tagged email files
    #[arg(long)]
    pub corpus_dir: PathBuf,

    /// Keep only initial messages of a thread
    #[arg(long, default_value_t = false)]
    pub only_initial: bool,

    #[arg(long, default_value_t = false)]
    pub only_utf8: bool,

    #[arg(long, default_value_t = false)]
    pub only_text_plain: bool,

    /// Drop messages longer than mean + standard deviation
    #[arg(long, default_value_t = false)]
    pub skip_long_messages: bool,

    #[arg(long)]
    pub limit: Option<usize>,

    /// Directory of per-message unsupervised boundary labels
    #[arg(long)]
    pub thematic_dir: Option<PathBuf>,
}

impl CorpusArgs {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            only_initial: self.only_initial,
            only_utf8: self.only_utf8,
            only_text_plain: self.only_text_plain,
            skip_long_messages: self.skip_long_messages,
            limit: self.limit,
            thematic_dir: self.thematic_dir.clone(),
        }
    }
}

const DEFAULT_SELECTION_THRESHOLD: f64 = 0.0;
const DEFAULT_SELECTION_COUNT: usize = 1000;
const DEFAULT_SELECTION_FRACTION: f64 = 0.001;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum SelectionMode {
    Threshold,
    TopK,
    TopFraction,
}

#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    #[arg(long, value_enum, default_value_t = SelectionMode::TopK)]
    pub selection: SelectionMode,

    /// Threshold, count or fraction depending on `--selection`; defaults to
    /// 0.0, 1000 and 0.001 respectively
    #[arg(long)]
    pub selection_value: Option<f64>,

    #[arg(long, default_value_t = 3)]
    pub max_n: usize,
}

impl SelectionArgs {
    pub fn selection(&self) -> Selection {
        let value = self.selection_value;
        match self.selection {
            SelectionMode::Threshold => {
                Selection::Threshold(value.unwrap_or(DEFAULT_SELECTION_THRESHOLD))
            }
            SelectionMode::TopK => Selection::TopK(
                value.map_or(DEFAULT_SELECTION_COUNT, |count| count.max(0.0) as usize),
            ),
            SelectionMode::TopFraction => {
                Selection::TopFraction(value.unwrap_or(DEFAULT_SELECTION_FRACTION))
            }
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SelectNgramsArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,

    #[arg(long)]
    pub output: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,

    #[arg(long, default_value = "experiments/default")]
    pub experiment_dir: PathBuf,

    /// Number of cross-validation folds; 1 is a 90/10 split, 0 builds nothing
    #[arg(long, default_value_t = 10)]
    pub folds: usize,

    /// Feature families to export; all when omitted
    #[arg(long = "family", value_enum)]
    pub families: Vec<FeatureFamily>,

    #[arg(long, value_enum, default_value_t = LexicalMode::Presence)]
    pub lexical_mode: LexicalMode,

    /// Fixed n-gram vocabulary used instead of per-fold selection
    #[arg(long)]
    pub ngram_file: Option<PathBuf>,

    #[arg(long, default_value_t = 0.075 / 150.0)]
    pub occurrence_quotient: f64,

    /// Keep interior lines of long segments in training data
    #[arg(long, default_value_t = false)]
    pub keep_interior: bool,

    /// Sequence window of the generated pattern file
    #[arg(long, default_value_t = 5)]
    pub window: usize,

    #[arg(long, default_value_t = false)]
    pub arff: bool,

    /// Worker threads for feature extraction; rayon default when omitted
    #[arg(long)]
    pub jobs: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct TagArgs {
    #[arg(long, default_value = "experiments/default")]
    pub experiment_dir: PathBuf,

    #[arg(long, default_value = "wapiti")]
    pub engine_bin: PathBuf,

    /// Only run this fold
    #[arg(long)]
    pub fold: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    #[arg(long, default_value = "experiments/default")]
    pub experiment_dir: PathBuf,

    /// Experiment whose results act as secondary boundaries
    #[arg(long)]
    pub combine_with: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub smart_combine: bool,

    #[arg(long, default_value_t = DEFAULT_MIN_CONFIDENCE)]
    pub min_confidence: f64,

    /// Only score the first N lines of each fold
    #[arg(long)]
    pub limit: Option<usize>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,

    #[arg(long)]
    pub ledger_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "experiments")]
    pub experiments_root: PathBuf,

    #[arg(long)]
    pub ledger_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Commands};
    use crate::tfidf::Selection;

    fn selection_of(extra: &[&str]) -> Selection {
        let args = ["mailseg", "select-ngrams", "--corpus-dir", "c", "--output", "o"];
        let cli = Cli::try_parse_from(args.iter().chain(extra)).expect("parse");
        match cli.command {
            Commands::SelectNgrams(args) => args.selection.selection(),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn selection_value_defaults_per_mode() {
        assert_eq!(selection_of(&[]), Selection::TopK(1000));
        assert_eq!(selection_of(&["--selection", "top-k"]), Selection::TopK(1000));
        assert_eq!(
            selection_of(&["--selection", "top-fraction"]),
            Selection::TopFraction(0.001)
        );
        assert_eq!(selection_of(&["--selection", "threshold"]), Selection::Threshold(0.0));
    }

    #[test]
    fn explicit_selection_value_wins() {
        assert_eq!(
            selection_of(&["--selection", "top-fraction", "--selection-value", "0.25"]),
            Selection::TopFraction(0.25)
        );
        assert_eq!(
            selection_of(&["--selection", "top-k", "--selection-value", "20"]),
            Selection::TopK(20)
        );
    }
}
