use anyhow::{Result, bail};
use tracing::info;

use crate::cli::SelectNgramsArgs;
use crate::corpus::load_corpus;
use crate::tfidf::{TfIdfSelector, write_ngram_file};
use crate::util::ensure_writable;

pub fn run(args: SelectNgramsArgs) -> Result<()> {
    ensure_writable(&args.output)?;

    let corpus = load_corpus(&args.corpus.corpus_dir, &args.corpus.load_options())?;
    if corpus.is_empty() {
        bail!(
            "no documents selected from {}",
            args.corpus.corpus_dir.display()
        );
    }

    let selector = TfIdfSelector::new(args.selection.max_n);
    let selection = args.selection.selection();
    let lines = corpus
        .documents
        .iter()
        .flat_map(|document| document.lines.iter());
    let ngrams = selector.select(lines, selection);

    write_ngram_file(&args.output, &ngrams)?;

    info!(
        documents = corpus.len(),
        lines = corpus.line_count(),
        max_n = selector.max_n(),
        selection = ?selection,
        selected = ngrams.len(),
        output = %args.output.display(),
        "n-gram selection complete"
    );
    Ok(())
}
